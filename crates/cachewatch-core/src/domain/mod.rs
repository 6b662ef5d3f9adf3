//! Domain types for cache statistics.
//!
//! These types are storage-agnostic. Repositories map rows to and from them,
//! and the HTTP adapter serializes them directly.

mod aggregation;
mod download_event;
mod exclusion;

pub use aggregation::{
    AggregationQuery, AggregationReport, HitMissTotals, ServiceBytes, TimeWindow, aggregate,
};
pub use download_event::{DownloadEvent, NewDownloadEvent, ServiceIpTotals};
pub use exclusion::{ExcludedIp, IpFormatError, normalize_source_ip};
