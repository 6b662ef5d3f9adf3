//! Exclusion registry service.
//!
//! Validates and normalizes addresses before they reach the store, and bumps
//! the change counter after every successful mutation so dashboards refresh.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::change::ChangeCounter;
use crate::domain::{ExcludedIp, IpFormatError};
use crate::ports::{ExclusionRepository, RepositoryError};

/// Errors from exclusion registry operations.
#[derive(Debug, Error)]
pub enum ExclusionError {
    /// The supplied address is blank or not an IP address.
    #[error("Invalid IP address: {0}")]
    InvalidFormat(#[from] IpFormatError),

    /// The address is already excluded. Nothing changed.
    #[error("IP address {0} is already excluded")]
    AlreadyExists(ExcludedIp),

    /// The address is not in the registry. Nothing changed.
    #[error("IP address {0} is not in the exclusion list")]
    NotFound(ExcludedIp),

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ExclusionError {
    /// Conflict outcomes leave state untouched and are not worth retrying.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyExists(_) | Self::NotFound(_))
    }
}

/// Service for the administrator-controlled exclusion set.
pub struct ExclusionService {
    repo: Arc<dyn ExclusionRepository>,
    changes: Arc<ChangeCounter>,
}

impl ExclusionService {
    /// Create a new exclusion service.
    pub fn new(repo: Arc<dyn ExclusionRepository>, changes: Arc<ChangeCounter>) -> Self {
        Self { repo, changes }
    }

    /// Current exclusion set, sorted for stable output.
    pub async fn list(&self) -> Result<Vec<ExcludedIp>, ExclusionError> {
        let mut ips = self.repo.list().await?;
        ips.sort();
        Ok(ips)
    }

    /// Add an address to the exclusion set.
    pub async fn add(&self, raw: &str) -> Result<ExcludedIp, ExclusionError> {
        let ip = ExcludedIp::parse(raw)?;

        if self.repo.contains(&ip).await? {
            return Err(ExclusionError::AlreadyExists(ip));
        }

        match self.repo.insert(&ip).await {
            Ok(()) => {}
            // Lost a race with a concurrent add of the same address
            Err(RepositoryError::AlreadyExists(_)) => return Err(ExclusionError::AlreadyExists(ip)),
            Err(e) => return Err(e.into()),
        }

        let generation = self.changes.bump();
        info!(ip = %ip, generation, "Added excluded IP");
        Ok(ip)
    }

    /// Remove an address from the exclusion set.
    pub async fn remove(&self, raw: &str) -> Result<ExcludedIp, ExclusionError> {
        let ip = ExcludedIp::parse(raw)?;

        match self.repo.delete(&ip).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound(_)) => return Err(ExclusionError::NotFound(ip)),
            Err(e) => return Err(e.into()),
        }

        let generation = self.changes.bump();
        info!(ip = %ip, generation, "Removed excluded IP");
        Ok(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryExclusions;

    fn service() -> (ExclusionService, Arc<ChangeCounter>) {
        let changes = Arc::new(ChangeCounter::new());
        let service = ExclusionService::new(
            Arc::new(InMemoryExclusions::default()),
            Arc::clone(&changes),
        );
        (service, changes)
    }

    #[tokio::test]
    async fn add_normalizes_and_signals_change() {
        let (service, changes) = service();

        let ip = service.add(" ::0001 ").await.unwrap();
        assert_eq!(ip.as_str(), "::1");
        assert_eq!(changes.current(), 1);
        assert_eq!(service.list().await.unwrap(), vec![ip]);
    }

    #[tokio::test]
    async fn add_rejects_invalid_input_without_mutation() {
        let (service, changes) = service();

        let err = service.add("   ").await.unwrap_err();
        assert!(matches!(err, ExclusionError::InvalidFormat(IpFormatError::Blank)));

        let err = service.add("not-an-ip").await.unwrap_err();
        assert!(matches!(
            err,
            ExclusionError::InvalidFormat(IpFormatError::Malformed(_))
        ));

        assert!(service.list().await.unwrap().is_empty());
        assert_eq!(changes.current(), 0);
    }

    #[tokio::test]
    async fn duplicate_add_is_a_conflict() {
        let (service, changes) = service();
        service.add("10.0.0.5").await.unwrap();

        let err = service.add("10.0.0.5").await.unwrap_err();
        assert!(matches!(err, ExclusionError::AlreadyExists(_)));
        assert!(err.is_conflict());
        assert_eq!(service.list().await.unwrap().len(), 1);
        assert_eq!(changes.current(), 1);
    }

    #[tokio::test]
    async fn removing_absent_ip_is_not_found_and_leaves_list_unchanged() {
        let (service, changes) = service();
        service.add("10.0.0.5").await.unwrap();
        let before = service.list().await.unwrap();

        let err = service.remove("10.0.0.6").await.unwrap_err();
        assert!(matches!(err, ExclusionError::NotFound(_)));

        assert_eq!(service.list().await.unwrap(), before);
        assert_eq!(changes.current(), 1);
    }

    #[tokio::test]
    async fn remove_signals_change() {
        let (service, changes) = service();
        service.add("10.0.0.5").await.unwrap();

        let removed = service.remove("10.0.0.5").await.unwrap();
        assert_eq!(removed.as_str(), "10.0.0.5");
        assert!(service.list().await.unwrap().is_empty());
        assert_eq!(changes.current(), 2);
    }

    #[tokio::test]
    async fn list_is_sorted() {
        let (service, _) = service();
        for ip in ["10.0.0.9", "10.0.0.1", "10.0.0.5"] {
            service.add(ip).await.unwrap();
        }
        let listed: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(ExcludedIp::into_string)
            .collect();
        assert_eq!(listed, vec!["10.0.0.1", "10.0.0.5", "10.0.0.9"]);
    }
}
