//! Row mapping helpers for `SQLite` queries.

use cachewatch_core::{DownloadEvent, RepositoryError, ServiceIpTotals};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::Row;

/// Shared SELECT column list for download event queries.
pub const EVENT_SELECT_COLUMNS: &str =
    "id, service_name, bytes_hit, bytes_miss, source_ip, timestamp_ms";

pub fn storage(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

/// Byte counts are `u64` in the domain but `INTEGER` (signed) in `SQLite`.
pub fn bytes_to_sql(value: u64) -> Result<i64, RepositoryError> {
    i64::try_from(value)
        .map_err(|_| RepositoryError::Constraint(format!("byte count {value} exceeds storage range")))
}

pub fn bytes_from_sql(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| storage(format!("negative byte count {value} in store")))
}

pub fn millis_to_datetime(ms: i64) -> Result<DateTime<Utc>, RepositoryError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| storage(format!("timestamp {ms} out of range")))
}

/// Parse a database row into a `DownloadEvent`.
pub fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<DownloadEvent, RepositoryError> {
    Ok(DownloadEvent {
        id: row.try_get("id").map_err(storage)?,
        service_name: row.try_get("service_name").map_err(storage)?,
        bytes_hit: bytes_from_sql(row.try_get("bytes_hit").map_err(storage)?)?,
        bytes_miss: bytes_from_sql(row.try_get("bytes_miss").map_err(storage)?)?,
        source_ip: row.try_get("source_ip").map_err(storage)?,
        timestamp: millis_to_datetime(row.try_get("timestamp_ms").map_err(storage)?)?,
    })
}

/// Recombine separately summed high and low 32-bit halves, saturating at
/// `u64::MAX`.
pub fn sum_from_halves(high: i64, low: i64) -> Result<u64, RepositoryError> {
    let high = bytes_from_sql(high)?;
    let low = bytes_from_sql(low)?;
    Ok(high.saturating_mul(1 << 32).saturating_add(low))
}

/// Parse a grouped totals row.
pub fn row_to_totals(row: &sqlx::sqlite::SqliteRow) -> Result<ServiceIpTotals, RepositoryError> {
    Ok(ServiceIpTotals {
        service_name: row.try_get("service_name").map_err(storage)?,
        source_ip: row.try_get("source_ip").map_err(storage)?,
        bytes_hit: sum_from_halves(
            row.try_get("hit_hi").map_err(storage)?,
            row.try_get("hit_lo").map_err(storage)?,
        )?,
        bytes_miss: sum_from_halves(
            row.try_get("miss_hi").map_err(storage)?,
            row.try_get("miss_lo").map_err(storage)?,
        )?,
    })
}
