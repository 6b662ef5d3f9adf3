//! Stats command handler.
//!
//! Prints the same numbers the dashboard shows.

use anyhow::Result;
use cachewatch_core::{AggregationQuery, AggregationReport, ServiceBytes};
use chrono::Utc;

use crate::bootstrap::CliContext;
use crate::presentation::{format_bytes, print_separator, truncate_string};

/// Execute the stats command.
///
/// `days == 0` means all time. Excluded addresses are filtered unless
/// `include_all` is set.
pub async fn execute(ctx: &CliContext, days: u32, include_all: bool) -> Result<()> {
    let query = AggregationQuery::last_days(days, !include_all, Utc::now());
    let report = ctx.app().aggregation().report(&query).await?;
    print_report(&report, days, include_all);
    Ok(())
}

/// Hit ratio in percent, or `None` with no traffic.
#[allow(clippy::cast_precision_loss)]
fn hit_ratio(report: &AggregationReport) -> Option<f64> {
    let total = report.hit_miss.total();
    (total > 0).then(|| report.hit_miss.total_hit_bytes as f64 * 100.0 / total as f64)
}

fn bytes_for(list: &[ServiceBytes], service: &str) -> u64 {
    list.iter()
        .find(|entry| entry.service == service)
        .map_or(0, |entry| entry.total_bytes)
}

fn print_report(report: &AggregationReport, days: u32, include_all: bool) {
    let window = if days == 0 {
        "all time".to_string()
    } else {
        format!("last {days} day(s)")
    };
    let scope = if include_all {
        "all clients"
    } else {
        "excluded IPs filtered"
    };
    println!("Cache usage, {window} ({scope})\n");

    println!("  Hit:   {}", format_bytes(report.hit_miss.total_hit_bytes));
    println!("  Miss:  {}", format_bytes(report.hit_miss.total_miss_bytes));
    match hit_ratio(report) {
        Some(ratio) => println!("  Ratio: {ratio:.1}% served from cache\n"),
        None => {
            println!("\nNo downloads recorded in this window.");
            return;
        }
    }

    println!("{:<24} {:>12} {:>12} {:>12}", "Service", "Total", "Hit", "Miss");
    print_separator(63);
    for entry in &report.bytes_by_service {
        println!(
            "{:<24} {:>12} {:>12} {:>12}",
            truncate_string(&entry.service, 23),
            format_bytes(entry.total_bytes),
            format_bytes(bytes_for(&report.hit_bytes_by_service, &entry.service)),
            format_bytes(bytes_for(&report.miss_bytes_by_service, &entry.service)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{CliConfig, bootstrap};
    use cachewatch_core::HitMissTotals;

    #[test]
    fn test_hit_ratio() {
        let mut report = AggregationReport::default();
        assert!(hit_ratio(&report).is_none());

        report.hit_miss = HitMissTotals {
            total_hit_bytes: 300,
            total_miss_bytes: 100,
        };
        assert!((hit_ratio(&report).unwrap() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bytes_for_missing_service_is_zero() {
        let list = vec![ServiceBytes {
            service: "steam".into(),
            total_bytes: 5,
        }];
        assert_eq!(bytes_for(&list, "steam"), 5);
        assert_eq!(bytes_for(&list, "wsus"), 0);
    }

    #[tokio::test]
    async fn test_stats_on_recorded_events() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = bootstrap(CliConfig {
            database_path: Some(dir.path().join("cw.db")),
        })
        .await
        .unwrap();

        crate::handlers::record::execute(&ctx, "steam", 2048, 1024, "10.0.0.1")
            .await
            .unwrap();
        execute(&ctx, 0, false).await.unwrap();
        execute(&ctx, 7, true).await.unwrap();
    }
}
