//! Download event recording service.
//!
//! This is the producer side of the refresh loop: every stored event bumps
//! the change counter, and the refresh coordinator turns bursts of bumps
//! into one dashboard notification.

use std::sync::Arc;

use tracing::debug;

use crate::change::ChangeCounter;
use crate::domain::{DownloadEvent, NewDownloadEvent, normalize_source_ip};
use crate::ports::{CoreError, DownloadEventRepository};

/// Maximum number of events returned by `recent`.
pub const MAX_RECENT_EVENTS: u32 = 500;

/// Service for recording cache downloads.
pub struct DownloadEventService {
    repo: Arc<dyn DownloadEventRepository>,
    changes: Arc<ChangeCounter>,
}

impl DownloadEventService {
    /// Create a new download event service.
    pub fn new(repo: Arc<dyn DownloadEventRepository>, changes: Arc<ChangeCounter>) -> Self {
        Self { repo, changes }
    }

    /// Validate, normalize and store an event, then signal a change.
    pub async fn record(&self, event: NewDownloadEvent) -> Result<DownloadEvent, CoreError> {
        let service_name = event.service_name.trim();
        if service_name.is_empty() {
            return Err(CoreError::Validation("service name is required".to_string()));
        }

        let normalized = NewDownloadEvent {
            service_name: service_name.to_string(),
            source_ip: normalize_source_ip(&event.source_ip),
            ..event
        };

        let stored = self.repo.insert(&normalized).await?;
        let generation = self.changes.bump();

        debug!(
            id = stored.id,
            service = %stored.service_name,
            bytes_hit = stored.bytes_hit,
            bytes_miss = stored.bytes_miss,
            source_ip = %stored.source_ip,
            generation,
            "Recorded download event"
        );

        Ok(stored)
    }

    /// Most recent events, newest first. `limit` is capped at
    /// [`MAX_RECENT_EVENTS`].
    pub async fn recent(&self, limit: u32) -> Result<Vec<DownloadEvent>, CoreError> {
        Ok(self.repo.recent(limit.min(MAX_RECENT_EVENTS)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryDownloadEvents;

    fn service() -> (DownloadEventService, Arc<ChangeCounter>) {
        let changes = Arc::new(ChangeCounter::new());
        let service = DownloadEventService::new(
            Arc::new(InMemoryDownloadEvents::default()),
            Arc::clone(&changes),
        );
        (service, changes)
    }

    #[tokio::test]
    async fn record_normalizes_and_bumps() {
        let (service, changes) = service();

        let stored = service
            .record(NewDownloadEvent::now(" steam ", 10, 5, " ::0001 "))
            .await
            .unwrap();

        assert_eq!(stored.service_name, "steam");
        assert_eq!(stored.source_ip, "::1");
        assert_eq!(changes.current(), 1);
    }

    #[tokio::test]
    async fn record_rejects_blank_service() {
        let (service, changes) = service();

        let err = service
            .record(NewDownloadEvent::now("  ", 10, 5, "10.0.0.1"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(changes.current(), 0);
    }

    #[tokio::test]
    async fn each_record_is_one_generation() {
        let (service, changes) = service();
        for i in 0..5 {
            service
                .record(NewDownloadEvent::now("epic", i, 0, "10.0.0.1"))
                .await
                .unwrap();
        }
        assert_eq!(changes.current(), 5);
        assert_eq!(service.recent(3).await.unwrap().len(), 3);
    }
}
