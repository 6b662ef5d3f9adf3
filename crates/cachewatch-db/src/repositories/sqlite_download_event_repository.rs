//! `SQLite` implementation of the download event store.

use async_trait::async_trait;
use cachewatch_core::{
    DownloadEvent, DownloadEventRepository, NewDownloadEvent, RepositoryError, ServiceIpTotals,
    TimeWindow,
};
use sqlx::SqlitePool;

use super::row_mappers::{
    EVENT_SELECT_COLUMNS, bytes_to_sql, millis_to_datetime, row_to_event, row_to_totals, storage,
};

// SQLite's SUM() errors on i64 overflow. Summing the 32-bit halves
// separately cannot overflow; `row_to_totals` recombines them saturating.
const TOTALS_ALL_TIME: &str = "SELECT service_name, source_ip, \
     SUM(bytes_hit >> 32) AS hit_hi, SUM(bytes_hit & 4294967295) AS hit_lo, \
     SUM(bytes_miss >> 32) AS miss_hi, SUM(bytes_miss & 4294967295) AS miss_lo \
     FROM download_events \
     GROUP BY service_name, source_ip";

const TOTALS_BETWEEN: &str = "SELECT service_name, source_ip, \
     SUM(bytes_hit >> 32) AS hit_hi, SUM(bytes_hit & 4294967295) AS hit_lo, \
     SUM(bytes_miss >> 32) AS miss_hi, SUM(bytes_miss & 4294967295) AS miss_lo \
     FROM download_events \
     WHERE timestamp_ms >= ? AND timestamp_ms < ? \
     GROUP BY service_name, source_ip";

/// `SQLite` implementation of the `DownloadEventRepository` trait.
pub struct SqliteDownloadEventRepository {
    pool: SqlitePool,
}

impl SqliteDownloadEventRepository {
    /// Create a new `SQLite` download event repository.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DownloadEventRepository for SqliteDownloadEventRepository {
    async fn insert(&self, event: &NewDownloadEvent) -> Result<DownloadEvent, RepositoryError> {
        let timestamp_ms = event.timestamp.timestamp_millis();

        let result = sqlx::query(
            "INSERT INTO download_events \
             (service_name, bytes_hit, bytes_miss, source_ip, timestamp_ms) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&event.service_name)
        .bind(bytes_to_sql(event.bytes_hit)?)
        .bind(bytes_to_sql(event.bytes_miss)?)
        .bind(&event.source_ip)
        .bind(timestamp_ms)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        // Stored precision is milliseconds; hand back what a read would see
        Ok(DownloadEvent {
            id: result.last_insert_rowid(),
            service_name: event.service_name.clone(),
            bytes_hit: event.bytes_hit,
            bytes_miss: event.bytes_miss,
            source_ip: event.source_ip.clone(),
            timestamp: millis_to_datetime(timestamp_ms)?,
        })
    }

    async fn totals_by_service_and_ip(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<ServiceIpTotals>, RepositoryError> {
        let rows = match window {
            TimeWindow::AllTime => {
                sqlx::query(TOTALS_ALL_TIME)
                    .fetch_all(&self.pool)
                    .await
            }
            TimeWindow::Between { start, end } => {
                sqlx::query(TOTALS_BETWEEN)
                    .bind(start.timestamp_millis())
                    .bind(end.timestamp_millis())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(storage)?;

        rows.iter().map(row_to_totals).collect()
    }

    async fn recent(&self, limit: u32) -> Result<Vec<DownloadEvent>, RepositoryError> {
        let sql = format!(
            "SELECT {EVENT_SELECT_COLUMNS} FROM download_events \
             ORDER BY timestamp_ms DESC, id DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        rows.iter().map(row_to_event).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;
    use chrono::{Duration, TimeZone, Utc};

    async fn repo() -> SqliteDownloadEventRepository {
        SqliteDownloadEventRepository::new(setup_test_database().await.unwrap())
    }

    fn sorted(mut rows: Vec<ServiceIpTotals>) -> Vec<ServiceIpTotals> {
        rows.sort_by(|a, b| {
            (&a.service_name, &a.source_ip).cmp(&(&b.service_name, &b.source_ip))
        });
        rows
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let repo = repo().await;

        let first = repo
            .insert(&NewDownloadEvent::now("steam", 10, 5, "10.0.0.1"))
            .await
            .unwrap();
        let second = repo
            .insert(&NewDownloadEvent::now("steam", 1, 1, "10.0.0.1"))
            .await
            .unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.bytes_hit, 10);
    }

    #[tokio::test]
    async fn test_totals_group_by_service_and_ip() {
        let repo = repo().await;
        for event in [
            NewDownloadEvent::now("steam", 100, 50, "10.0.0.1"),
            NewDownloadEvent::now("steam", 100, 0, "10.0.0.1"),
            NewDownloadEvent::now("steam", 0, 20, "10.0.0.2"),
            NewDownloadEvent::now("wsus", 7, 3, "10.0.0.1"),
        ] {
            repo.insert(&event).await.unwrap();
        }

        let totals = sorted(
            repo.totals_by_service_and_ip(&TimeWindow::AllTime)
                .await
                .unwrap(),
        );

        assert_eq!(
            totals,
            vec![
                ServiceIpTotals::new("steam", "10.0.0.1", 200, 50),
                ServiceIpTotals::new("steam", "10.0.0.2", 0, 20),
                ServiceIpTotals::new("wsus", "10.0.0.1", 7, 3),
            ]
        );
    }

    #[tokio::test]
    async fn test_window_is_half_open() {
        let repo = repo().await;
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(1);

        for (ts, hit) in [
            (start - Duration::milliseconds(1), 1),
            (start, 10),
            (end - Duration::milliseconds(1), 100),
            (end, 1000),
        ] {
            repo.insert(&NewDownloadEvent::now("epicgames", hit, 0, "10.0.0.1").at(ts))
                .await
                .unwrap();
        }

        let totals = repo
            .totals_by_service_and_ip(&TimeWindow::Between { start, end })
            .await
            .unwrap();

        assert_eq!(totals, vec![ServiceIpTotals::new("epicgames", "10.0.0.1", 110, 0)]);
    }

    #[tokio::test]
    async fn test_totals_beyond_i64_are_exact_then_saturate() {
        let repo = repo().await;
        let max = u64::try_from(i64::MAX).unwrap();
        for _ in 0..2 {
            repo.insert(&NewDownloadEvent::now("steam", max, 1, "10.0.0.1"))
                .await
                .unwrap();
        }

        let totals = repo
            .totals_by_service_and_ip(&TimeWindow::AllTime)
            .await
            .unwrap();
        assert_eq!(totals, vec![ServiceIpTotals::new("steam", "10.0.0.1", u64::MAX - 1, 2)]);

        repo.insert(&NewDownloadEvent::now("steam", max, 1, "10.0.0.1"))
            .await
            .unwrap();
        let totals = repo
            .totals_by_service_and_ip(&TimeWindow::AllTime)
            .await
            .unwrap();
        assert_eq!(totals, vec![ServiceIpTotals::new("steam", "10.0.0.1", u64::MAX, 3)]);
    }

    #[tokio::test]
    async fn test_empty_store_has_no_totals() {
        let repo = repo().await;
        let totals = repo
            .totals_by_service_and_ip(&TimeWindow::AllTime)
            .await
            .unwrap();
        assert!(totals.is_empty());
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_limited() {
        let repo = repo().await;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for minutes in 0..5 {
            repo.insert(
                &NewDownloadEvent::now("steam", 1, 0, "10.0.0.1")
                    .at(base + Duration::minutes(minutes)),
            )
            .await
            .unwrap();
        }

        let recent = repo.recent(3).await.unwrap();

        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].timestamp, base + Duration::minutes(4));
        assert!(recent[0].timestamp > recent[2].timestamp);
    }

    #[tokio::test]
    async fn test_oversized_byte_count_is_rejected() {
        let repo = repo().await;
        let err = repo
            .insert(&NewDownloadEvent::now("steam", u64::MAX, 0, "10.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Constraint(_)));
    }
}
