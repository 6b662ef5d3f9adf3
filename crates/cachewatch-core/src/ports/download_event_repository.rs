//! Download event storage port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{DownloadEvent, NewDownloadEvent, ServiceIpTotals, TimeWindow};

/// Persistence for recorded downloads.
#[async_trait]
pub trait DownloadEventRepository: Send + Sync {
    /// Store a new event and return it with its assigned id.
    async fn insert(&self, event: &NewDownloadEvent) -> Result<DownloadEvent, RepositoryError>;

    /// Hit/miss sums per `(service, source ip)` pair for events inside
    /// `window`.
    ///
    /// Pairs with no events in the window are absent.
    async fn totals_by_service_and_ip(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<ServiceIpTotals>, RepositoryError>;

    /// Most recent events, newest first.
    async fn recent(&self, limit: u32) -> Result<Vec<DownloadEvent>, RepositoryError>;
}
