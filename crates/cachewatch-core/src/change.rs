//! Process-wide change generation counter.
//!
//! Every producer of a change that could affect aggregated results (a newly
//! recorded download, an exclusion add/remove) bumps the counter. The refresh
//! coordinator compares the current value against the last value it
//! broadcast for, which is how bursts of changes collapse into a single
//! notification.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic change generation shared between producers and the refresh
/// coordinator.
///
/// Created once by the composition root and handed out as
/// `Arc<ChangeCounter>`. Starts at 0 and is never decremented.
#[derive(Debug, Default)]
pub struct ChangeCounter {
    generation: AtomicU64,
}

impl ChangeCounter {
    /// Create a counter at generation 0.
    pub const fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
        }
    }

    /// Record a change and return the new generation.
    ///
    /// Fire-and-forget from the producer's point of view: nothing here waits
    /// for subscribers.
    pub fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Current generation.
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_at_zero() {
        let counter = ChangeCounter::new();
        assert_eq!(counter.current(), 0);
    }

    #[test]
    fn bump_returns_new_generation() {
        let counter = ChangeCounter::new();
        assert_eq!(counter.bump(), 1);
        assert_eq!(counter.bump(), 2);
        assert_eq!(counter.current(), 2);
    }

    #[test]
    fn concurrent_bumps_are_not_lost() {
        let counter = Arc::new(ChangeCounter::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..1_000 {
                        let observed = counter.bump();
                        // Each producer sees its own bumps strictly increasing
                        assert!(observed > last);
                        last = observed;
                    }
                })
            })
            .collect();

        for handle in threads {
            handle.join().unwrap();
        }

        assert_eq!(counter.current(), 8_000);
    }

    #[test]
    fn observed_value_never_decreases() {
        let counter = Arc::new(ChangeCounter::new());
        let writer = {
            let counter = Arc::clone(&counter);
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    counter.bump();
                }
            })
        };

        let mut previous = counter.current();
        while !writer.is_finished() {
            let now = counter.current();
            assert!(now >= previous);
            previous = now;
        }
        writer.join().unwrap();
        assert_eq!(counter.current(), 10_000);
    }
}
