//! `AppCore` - the primary application facade.
//!
//! Adapters (CLI, web) receive an `AppCore` instance and use it to access all
//! functionality.

use std::sync::Arc;

use crate::change::ChangeCounter;
use crate::ports::Repos;

use super::{AggregationService, DownloadEventService, ExclusionService};

/// The core application facade.
///
/// Constructed at the adapter's composition root with concrete repositories
/// and the process-wide change counter.
///
/// # Example
///
/// ```ignore
/// let repos = CoreFactory::build_repos(pool);
/// let changes = Arc::new(ChangeCounter::new());
/// let core = AppCore::new(repos, changes);
///
/// let report = core.aggregation().report(&AggregationQuery::all_time(true)).await?;
/// ```
pub struct AppCore {
    exclusions: ExclusionService,
    aggregation: AggregationService,
    downloads: DownloadEventService,
    changes: Arc<ChangeCounter>,
}

impl AppCore {
    /// Create a new `AppCore` from repositories and the shared change counter.
    pub fn new(repos: Repos, changes: Arc<ChangeCounter>) -> Self {
        Self {
            exclusions: ExclusionService::new(repos.excluded_ips.clone(), Arc::clone(&changes)),
            aggregation: AggregationService::new(
                repos.download_events.clone(),
                repos.excluded_ips,
            ),
            downloads: DownloadEventService::new(repos.download_events, Arc::clone(&changes)),
            changes,
        }
    }

    /// Access the exclusion registry.
    pub const fn exclusions(&self) -> &ExclusionService {
        &self.exclusions
    }

    /// Access the aggregation engine.
    pub const fn aggregation(&self) -> &AggregationService {
        &self.aggregation
    }

    /// Access the download event recorder.
    pub const fn downloads(&self) -> &DownloadEventService {
        &self.downloads
    }

    /// The change counter shared with the refresh coordinator.
    pub fn changes(&self) -> Arc<ChangeCounter> {
        Arc::clone(&self.changes)
    }
}
