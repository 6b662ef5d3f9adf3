//! Recorded cache downloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single request served by the cache, attributed to a service.
///
/// Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadEvent {
    /// Store-assigned identifier.
    pub id: i64,
    /// Originating service (e.g. `steam`, `epicgames`, `wsus`).
    pub service_name: String,
    /// Bytes served from the local cache.
    pub bytes_hit: u64,
    /// Bytes fetched from origin.
    pub bytes_miss: u64,
    /// Client address, normalized when it parses as an IP.
    pub source_ip: String,
    /// When the request was served.
    pub timestamp: DateTime<Utc>,
}

/// A download event that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDownloadEvent {
    pub service_name: String,
    pub bytes_hit: u64,
    pub bytes_miss: u64,
    pub source_ip: String,
    pub timestamp: DateTime<Utc>,
}

impl NewDownloadEvent {
    /// Build an event stamped with the current time.
    pub fn now(
        service_name: impl Into<String>,
        bytes_hit: u64,
        bytes_miss: u64,
        source_ip: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            bytes_hit,
            bytes_miss,
            source_ip: source_ip.into(),
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp.
    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Byte totals for one `(service, source ip)` pair within a time window.
///
/// This is the shape repositories hand to the aggregation engine: the store
/// pre-sums inside the window, and the engine applies exclusions and folds
/// pairs into per-service results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIpTotals {
    pub service_name: String,
    pub source_ip: String,
    pub bytes_hit: u64,
    pub bytes_miss: u64,
}

impl ServiceIpTotals {
    pub fn new(
        service_name: impl Into<String>,
        source_ip: impl Into<String>,
        bytes_hit: u64,
        bytes_miss: u64,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            source_ip: source_ip.into(),
            bytes_hit,
            bytes_miss,
        }
    }
}
