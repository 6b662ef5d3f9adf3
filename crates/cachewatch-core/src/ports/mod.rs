//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` types in any signature
//! - Traits are minimal and CRUD-focused for repositories
//! - Serialization of concurrent mutations is the store's job

pub mod download_event_repository;
pub mod event_emitter;
pub mod exclusion_repository;

use std::sync::Arc;
use thiserror::Error;

pub use download_event_repository::DownloadEventRepository;
pub use event_emitter::AppEventEmitter;
pub use exclusion_repository::ExclusionRepository;

/// Container for all repository trait objects.
///
/// Lives in the core so `AppCore` can accept it without depending on
/// `cachewatch-db`.
#[derive(Clone)]
pub struct Repos {
    /// Recorded downloads.
    pub download_events: Arc<dyn DownloadEventRepository>,
    /// Exclusion registry storage.
    pub excluded_ips: Arc<dyn ExclusionRepository>,
}

impl Repos {
    /// Create a new Repos container.
    pub fn new(
        download_events: Arc<dyn DownloadEventRepository>,
        excluded_ips: Arc<dyn ExclusionRepository>,
    ) -> Self {
        Self {
            download_events,
            excluded_ips,
        }
    }
}

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and provides a clean interface for services to handle storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entity with the same identifier already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// A constraint was violated (e.g., a CHECK constraint).
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Core error type for semantic domain errors.
///
/// Adapters map this to their own error types (HTTP status codes, CLI exit
/// codes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Validation error (invalid input).
    #[error("Validation error: {0}")]
    Validation(String),
}
