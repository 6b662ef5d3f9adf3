//! Coalescing refresh coordinator.
//!
//! Mutations bump the shared [`ChangeCounter`] and return immediately. This
//! loop samples the counter on a fixed interval and, when it moved, emits a
//! single [`AppEvent::DownloadEventsUpdated`] no matter how many bumps
//! happened in between.

use std::sync::Arc;
use std::time::Duration;

use cachewatch_core::{AppEvent, AppEventEmitter, ChangeCounter};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default sampling interval.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// `tokio::time::interval` panics on a zero period.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the refresh coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    /// How often the change counter is sampled.
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl RefreshConfig {
    /// Set the sampling interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_REFRESH_INTERVAL);
        self
    }

    /// Build a config from a millisecond count, as given on the command line.
    pub fn from_millis(ms: u64) -> Self {
        Self::default().with_interval(Duration::from_millis(ms))
    }
}

/// Samples the change counter and broadcasts refresh hints.
///
/// Late subscribers are not notified of earlier changes; the hint carries
/// no data, so a viewer simply re-queries when it arrives.
pub struct RefreshCoordinator {
    changes: Arc<ChangeCounter>,
    emitter: Arc<dyn AppEventEmitter>,
    config: RefreshConfig,
    last_seen: u64,
}

impl RefreshCoordinator {
    /// Create a coordinator. Changes made before this call are not reported.
    pub fn new(
        changes: Arc<ChangeCounter>,
        emitter: Arc<dyn AppEventEmitter>,
        config: RefreshConfig,
    ) -> Self {
        let last_seen = changes.current();
        Self {
            changes,
            emitter,
            config,
            last_seen,
        }
    }

    /// The generation last reported to subscribers.
    pub const fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Run a single tick. Returns `true` if a hint was emitted.
    pub fn poll_once(&mut self) -> bool {
        let current = self.changes.current();
        if current == self.last_seen {
            return false;
        }

        debug!(
            previous = self.last_seen,
            current,
            coalesced = current.wrapping_sub(self.last_seen),
            "Emitting refresh hint"
        );
        self.last_seen = current;
        self.emitter.emit(AppEvent::DownloadEventsUpdated);
        true
    }

    /// Tick until `cancel` fires.
    ///
    /// Cancellation is checked before the ticker so a shutdown never
    /// produces one last broadcast.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_ms = u64::try_from(self.config.interval.as_millis()).unwrap_or(u64::MAX),
            generation = self.last_seen,
            "Refresh coordinator started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Refresh coordinator cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_once();
                }
            }
        }
    }

    /// Run on a new tokio task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct CountingEmitter {
        emitted: Arc<AtomicUsize>,
    }

    impl CountingEmitter {
        fn count(&self) -> usize {
            self.emitted.load(Ordering::SeqCst)
        }
    }

    impl AppEventEmitter for CountingEmitter {
        fn emit(&self, event: AppEvent) {
            assert_eq!(event, AppEvent::DownloadEventsUpdated);
            self.emitted.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn coordinator(changes: &Arc<ChangeCounter>) -> (RefreshCoordinator, CountingEmitter) {
        let emitter = CountingEmitter::default();
        let coordinator = RefreshCoordinator::new(
            Arc::clone(changes),
            Arc::new(emitter.clone()),
            RefreshConfig::default(),
        );
        (coordinator, emitter)
    }

    #[test]
    fn test_config_defaults_and_clamps() {
        assert_eq!(RefreshConfig::default().interval, Duration::from_secs(1));
        assert_eq!(
            RefreshConfig::from_millis(250).interval,
            Duration::from_millis(250)
        );
        assert_eq!(RefreshConfig::from_millis(0).interval, MIN_REFRESH_INTERVAL);
    }

    #[test]
    fn test_unchanged_counter_emits_nothing() {
        let changes = Arc::new(ChangeCounter::new());
        let (mut coordinator, emitter) = coordinator(&changes);

        assert!(!coordinator.poll_once());
        assert!(!coordinator.poll_once());
        assert_eq!(emitter.count(), 0);
    }

    #[test]
    fn test_many_bumps_coalesce_into_one_emit() {
        let changes = Arc::new(ChangeCounter::new());
        let (mut coordinator, emitter) = coordinator(&changes);

        for _ in 0..25 {
            changes.bump();
        }

        assert!(coordinator.poll_once());
        assert!(!coordinator.poll_once());
        assert_eq!(emitter.count(), 1);
        assert_eq!(coordinator.last_seen(), 25);
    }

    #[test]
    fn test_changes_before_start_are_not_reported() {
        let changes = Arc::new(ChangeCounter::new());
        changes.bump();
        changes.bump();

        let (mut coordinator, emitter) = coordinator(&changes);

        assert!(!coordinator.poll_once());
        assert_eq!(emitter.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_one_interval_broadcasts_once() {
        let changes = Arc::new(ChangeCounter::new());
        let (coordinator, emitter) = coordinator(&changes);
        let cancel = CancellationToken::new();
        let handle = coordinator.spawn(cancel.clone());

        // Let the immediate first tick pass
        tokio::time::sleep(Duration::from_millis(10)).await;
        for _ in 0..7 {
            changes.bump();
        }

        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(emitter.count(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_bumps_in_separate_intervals_broadcast_separately() {
        let changes = Arc::new(ChangeCounter::new());
        let (coordinator, emitter) = coordinator(&changes);
        let cancel = CancellationToken::new();
        let handle = coordinator.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        changes.bump();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(emitter.count(), 1);

        changes.bump();
        changes.bump();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(emitter.count(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_exits_without_final_broadcast() {
        let changes = Arc::new(ChangeCounter::new());
        let (coordinator, emitter) = coordinator(&changes);
        let cancel = CancellationToken::new();
        let handle = coordinator.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        changes.bump();
        cancel.cancel();

        tokio::time::timeout(Duration::from_millis(100), handle)
            .await
            .expect("coordinator did not stop")
            .unwrap();
        assert_eq!(emitter.count(), 0);
    }
}
