//! Exclusion registry storage port.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::ExcludedIp;

/// Persistence for the set of excluded source addresses.
///
/// Values arrive already normalized. Implementations must enforce uniqueness
/// themselves so that two concurrent adds of the same address cannot both
/// succeed.
#[async_trait]
pub trait ExclusionRepository: Send + Sync {
    /// All entries, in no particular order.
    async fn list(&self) -> Result<Vec<ExcludedIp>, RepositoryError>;

    /// Whether `ip` is present.
    async fn contains(&self, ip: &ExcludedIp) -> Result<bool, RepositoryError>;

    /// Insert `ip`.
    ///
    /// Returns `RepositoryError::AlreadyExists` if it is already present.
    async fn insert(&self, ip: &ExcludedIp) -> Result<(), RepositoryError>;

    /// Delete `ip`.
    ///
    /// Returns `RepositoryError::NotFound` if it was not present.
    async fn delete(&self, ip: &ExcludedIp) -> Result<(), RepositoryError>;
}
