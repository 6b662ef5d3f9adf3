//! `SQLite` storage for cachewatch.
//!
//! Implements the core's repository ports with `sqlx`. The pool never leaves
//! this crate except through [`CoreFactory`] and [`setup_database`].

#![deny(unsafe_code)]

pub mod factory;
pub mod repositories;
pub mod setup;

// Re-export factory for convenient access
pub use factory::CoreFactory;

// Re-export TestDb for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub use factory::TestDb;

// Re-export repository implementations
pub use repositories::{SqliteDownloadEventRepository, SqliteExclusionRepository};

// Re-export setup functions for convenient access
pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
