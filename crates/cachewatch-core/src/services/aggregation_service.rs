//! Aggregation engine service.
//!
//! Reads the exclusion set first and the window totals second. An exclusion
//! acknowledged before a query starts is therefore always applied, and one
//! that completes while the query runs never is.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    AggregationQuery, AggregationReport, ExcludedIp, HitMissTotals, ServiceBytes, TimeWindow,
    aggregate,
};
use crate::ports::{DownloadEventRepository, ExclusionRepository, RepositoryError};

/// Errors from aggregation queries.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The bounded window ends before it starts.
    #[error("Invalid range: end {end} is before start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Computes hit/miss statistics over recorded downloads.
pub struct AggregationService {
    events: Arc<dyn DownloadEventRepository>,
    exclusions: Arc<dyn ExclusionRepository>,
}

impl AggregationService {
    /// Create a new aggregation service.
    pub fn new(
        events: Arc<dyn DownloadEventRepository>,
        exclusions: Arc<dyn ExclusionRepository>,
    ) -> Self {
        Self { events, exclusions }
    }

    /// Compute every result shape for `query`.
    pub async fn report(
        &self,
        query: &AggregationQuery,
    ) -> Result<AggregationReport, AggregationError> {
        if let TimeWindow::Between { start, end } = query.window {
            if query.window.is_inverted() {
                return Err(AggregationError::InvalidRange { start, end });
            }
        }

        let excluded: HashSet<String> = if query.exclude_ips {
            self.exclusions
                .list()
                .await?
                .into_iter()
                .map(ExcludedIp::into_string)
                .collect()
        } else {
            HashSet::new()
        };

        let rows = self.events.totals_by_service_and_ip(&query.window).await?;
        let report = aggregate(&rows, &excluded);

        debug!(
            window = ?query.window,
            exclude_ips = query.exclude_ips,
            excluded = excluded.len(),
            pairs = rows.len(),
            services = report.bytes_by_service.len(),
            "Aggregated download events"
        );

        Ok(report)
    }

    /// Total hit and miss bytes.
    pub async fn hit_miss(
        &self,
        query: &AggregationQuery,
    ) -> Result<HitMissTotals, AggregationError> {
        Ok(self.report(query).await?.hit_miss)
    }

    /// Hit + miss bytes per service.
    pub async fn bytes_by_service(
        &self,
        query: &AggregationQuery,
    ) -> Result<Vec<ServiceBytes>, AggregationError> {
        Ok(self.report(query).await?.bytes_by_service)
    }

    /// Miss bytes per service.
    pub async fn miss_bytes_by_service(
        &self,
        query: &AggregationQuery,
    ) -> Result<Vec<ServiceBytes>, AggregationError> {
        Ok(self.report(query).await?.miss_bytes_by_service)
    }

    /// Hit bytes per service.
    pub async fn hit_bytes_by_service(
        &self,
        query: &AggregationQuery,
    ) -> Result<Vec<ServiceBytes>, AggregationError> {
        Ok(self.report(query).await?.hit_bytes_by_service)
    }
}
