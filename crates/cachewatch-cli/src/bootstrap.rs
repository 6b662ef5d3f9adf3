//! CLI bootstrap - the composition root for one-shot commands.
//!
//! `serve` has its own composition root in `cachewatch-axum`; every other
//! command gets a [`CliContext`] from here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use cachewatch_core::{AppCore, ChangeCounter, database_path};
use cachewatch_db::{CoreFactory, setup_database};

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Database file; the platform default when `None`.
    pub database_path: Option<PathBuf>,
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    /// The core application facade.
    pub app: AppCore,
}

impl CliContext {
    /// Access the `AppCore`.
    pub const fn app(&self) -> &AppCore {
        &self.app
    }
}

/// Open the database and compose the core.
///
/// One-shot commands have no refresh coordinator; a running server picks up
/// their writes on its next query.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let db_path = match config.database_path {
        Some(path) => path,
        None => database_path()?,
    };
    tracing::debug!(database_path = %db_path.display(), "Opening database");

    let pool = setup_database(&db_path).await?;
    let app = CoreFactory::build_app_core(pool, Arc::new(ChangeCounter::new()));
    Ok(CliContext { app })
}
