//! Composition utilities for building `AppCore` with `SQLite` backends.
//!
//! This module provides factory functions for wiring up the application
//! with `SQLite` repositories. It is focused purely on construction and
//! should not contain any domain logic.

use sqlx::SqlitePool;
use std::sync::Arc;

use cachewatch_core::{AppCore, ChangeCounter, Repos};

use crate::repositories::{SqliteDownloadEventRepository, SqliteExclusionRepository};

/// Factory for creating repository instances with `SQLite` backends.
pub struct CoreFactory;

impl CoreFactory {
    /// Build all `SQLite` repositories from a pool.
    ///
    /// This is the recommended way for adapters to obtain repositories.
    pub fn build_repos(pool: SqlitePool) -> Repos {
        Repos::new(
            Arc::new(SqliteDownloadEventRepository::new(pool.clone())),
            Arc::new(SqliteExclusionRepository::new(pool)),
        )
    }

    /// Build a complete `AppCore` from a pool and a shared change counter.
    ///
    /// The counter is the one the refresh coordinator polls, so callers
    /// keep their own clone of the `Arc`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use cachewatch_db::{CoreFactory, setup_database};
    ///
    /// let pool = setup_database(&db_path).await?;
    /// let changes = Arc::new(ChangeCounter::new());
    /// let core = CoreFactory::build_app_core(pool, Arc::clone(&changes));
    /// ```
    pub fn build_app_core(pool: SqlitePool, changes: Arc<ChangeCounter>) -> AppCore {
        AppCore::new(Self::build_repos(pool), changes)
    }
}

/// Test database helper for integration tests.
///
/// Provides an in-memory `SQLite` database with full schema already applied.
/// Matches the production schema to ensure test parity.
#[cfg(any(test, feature = "test-utils"))]
pub struct TestDb {
    pool: SqlitePool,
}

#[cfg(any(test, feature = "test-utils"))]
impl TestDb {
    /// Create a new in-memory test database with full schema.
    pub async fn new() -> anyhow::Result<Self> {
        let pool = crate::setup::setup_test_database().await?;
        Ok(Self { pool })
    }

    /// Build a full `AppCore` over this database.
    pub fn app_core(&self, changes: Arc<ChangeCounter>) -> AppCore {
        CoreFactory::build_app_core(self.pool.clone(), changes)
    }
}
