//! Aggregation queries and results.
//!
//! `aggregate` is the pure part of the aggregation engine: given the
//! per-`(service, ip)` totals for a window and the exclusion set captured at
//! query time, it produces every result shape in one pass.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::download_event::ServiceIpTotals;

/// Time range an aggregation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimeWindow {
    /// No bound on either side.
    #[default]
    AllTime,
    /// Half-open `[start, end)`.
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl TimeWindow {
    /// Window covering the `days` days before `now`; `0` means all time.
    ///
    /// A start earlier than the representable range also means all time.
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Self {
        if days == 0 {
            return Self::AllTime;
        }
        match now.checked_sub_signed(TimeDelta::days(i64::from(days))) {
            Some(start) => Self::Between { start, end: now },
            None => Self::AllTime,
        }
    }

    /// Whether a bounded window ends before it starts.
    pub fn is_inverted(&self) -> bool {
        matches!(self, Self::Between { start, end } if end < start)
    }

    /// Whether `timestamp` falls inside the window.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        match self {
            Self::AllTime => true,
            Self::Between { start, end } => *start <= timestamp && timestamp < *end,
        }
    }
}

/// What to aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationQuery {
    pub window: TimeWindow,
    /// Apply the exclusion registry.
    pub exclude_ips: bool,
}

impl AggregationQuery {
    pub const fn new(window: TimeWindow, exclude_ips: bool) -> Self {
        Self {
            window,
            exclude_ips,
        }
    }

    /// All-time query.
    pub const fn all_time(exclude_ips: bool) -> Self {
        Self::new(TimeWindow::AllTime, exclude_ips)
    }

    /// Query for the `days` days before `now` (`0` = all time).
    pub fn last_days(days: u32, exclude_ips: bool, now: DateTime<Utc>) -> Self {
        Self::new(TimeWindow::last_days(days, now), exclude_ips)
    }
}

/// Total hit and miss bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitMissTotals {
    pub total_hit_bytes: u64,
    pub total_miss_bytes: u64,
}

impl HitMissTotals {
    pub const fn total(&self) -> u64 {
        self.total_hit_bytes.saturating_add(self.total_miss_bytes)
    }
}

/// Bytes attributed to one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBytes {
    pub service: String,
    pub total_bytes: u64,
}

/// Every aggregation shape, computed from one store read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    pub hit_miss: HitMissTotals,
    /// Hit + miss bytes per service.
    pub bytes_by_service: Vec<ServiceBytes>,
    pub miss_bytes_by_service: Vec<ServiceBytes>,
    pub hit_bytes_by_service: Vec<ServiceBytes>,
}

#[derive(Default)]
struct ServiceSums {
    hit: u64,
    miss: u64,
}

/// Fold window totals into a report, dropping rows whose source IP is in
/// `excluded`.
///
/// A service whose value in a given list is zero is left out of that list.
/// Lists are ordered by bytes descending, then service name.
pub fn aggregate<'a, I>(rows: I, excluded: &HashSet<String>) -> AggregationReport
where
    I: IntoIterator<Item = &'a ServiceIpTotals>,
{
    let mut totals = HitMissTotals::default();
    let mut by_service: BTreeMap<&str, ServiceSums> = BTreeMap::new();

    for row in rows {
        if excluded.contains(&row.source_ip) {
            continue;
        }
        totals.total_hit_bytes = totals.total_hit_bytes.saturating_add(row.bytes_hit);
        totals.total_miss_bytes = totals.total_miss_bytes.saturating_add(row.bytes_miss);

        let sums = by_service.entry(row.service_name.as_str()).or_default();
        sums.hit = sums.hit.saturating_add(row.bytes_hit);
        sums.miss = sums.miss.saturating_add(row.bytes_miss);
    }

    let list_by = |pick: fn(&ServiceSums) -> u64| {
        let mut list: Vec<ServiceBytes> = by_service
            .iter()
            .filter_map(|(service, sums)| {
                let total_bytes = pick(sums);
                (total_bytes > 0).then(|| ServiceBytes {
                    service: (*service).to_string(),
                    total_bytes,
                })
            })
            .collect();
        // BTreeMap iteration is name-ordered and the sort is stable
        list.sort_by_key(|entry| Reverse(entry.total_bytes));
        list
    };

    AggregationReport {
        hit_miss: totals,
        bytes_by_service: list_by(|s| s.hit.saturating_add(s.miss)),
        miss_bytes_by_service: list_by(|s| s.miss),
        hit_bytes_by_service: list_by(|s| s.hit),
    }
}
