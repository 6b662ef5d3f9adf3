//! In-memory port implementations for tests.
//!
//! Enabled for this crate's own tests and, through the `test-utils` feature,
//! for adapter crates that need a core without a database.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{DownloadEvent, ExcludedIp, NewDownloadEvent, ServiceIpTotals, TimeWindow};
use crate::ports::{DownloadEventRepository, ExclusionRepository, RepositoryError};

/// Exclusion registry backed by a `BTreeSet`.
#[derive(Debug, Default)]
pub struct InMemoryExclusions {
    ips: Mutex<BTreeSet<ExcludedIp>>,
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Storage("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl ExclusionRepository for InMemoryExclusions {
    async fn list(&self) -> Result<Vec<ExcludedIp>, RepositoryError> {
        Ok(self.ips.lock().map_err(poisoned)?.iter().cloned().collect())
    }

    async fn contains(&self, ip: &ExcludedIp) -> Result<bool, RepositoryError> {
        Ok(self.ips.lock().map_err(poisoned)?.contains(ip))
    }

    async fn insert(&self, ip: &ExcludedIp) -> Result<(), RepositoryError> {
        if self.ips.lock().map_err(poisoned)?.insert(ip.clone()) {
            Ok(())
        } else {
            Err(RepositoryError::AlreadyExists(ip.to_string()))
        }
    }

    async fn delete(&self, ip: &ExcludedIp) -> Result<(), RepositoryError> {
        if self.ips.lock().map_err(poisoned)?.remove(ip) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(ip.to_string()))
        }
    }
}

/// Download event store backed by a `Vec`.
#[derive(Debug, Default)]
pub struct InMemoryDownloadEvents {
    events: Mutex<Vec<DownloadEvent>>,
}

#[async_trait]
impl DownloadEventRepository for InMemoryDownloadEvents {
    async fn insert(&self, event: &NewDownloadEvent) -> Result<DownloadEvent, RepositoryError> {
        let mut events = self.events.lock().map_err(poisoned)?;
        let id = i64::try_from(events.len())
            .map_err(|e| RepositoryError::Storage(e.to_string()))?
            + 1;
        let stored = DownloadEvent {
            id,
            service_name: event.service_name.clone(),
            bytes_hit: event.bytes_hit,
            bytes_miss: event.bytes_miss,
            source_ip: event.source_ip.clone(),
            timestamp: event.timestamp,
        };
        events.push(stored.clone());
        Ok(stored)
    }

    async fn totals_by_service_and_ip(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<ServiceIpTotals>, RepositoryError> {
        let events = self.events.lock().map_err(poisoned)?;
        let mut sums: BTreeMap<(&str, &str), (u64, u64)> = BTreeMap::new();
        for event in events.iter().filter(|e| window.contains(e.timestamp)) {
            let entry = sums
                .entry((event.service_name.as_str(), event.source_ip.as_str()))
                .or_default();
            entry.0 = entry.0.saturating_add(event.bytes_hit);
            entry.1 = entry.1.saturating_add(event.bytes_miss);
        }
        Ok(sums
            .into_iter()
            .map(|((service, ip), (hit, miss))| ServiceIpTotals::new(service, ip, hit, miss))
            .collect())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<DownloadEvent>, RepositoryError> {
        let events = self.events.lock().map_err(poisoned)?;
        let mut sorted: Vec<DownloadEvent> = events.clone();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        sorted.truncate(limit as usize);
        Ok(sorted)
    }
}
