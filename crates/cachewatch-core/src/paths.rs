//! Data directory and database path resolution.

use std::env;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CACHEWATCH_DATA_DIR";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the system data directory.
    #[error("Cannot determine system data directory")]
    NoDataDir,

    /// Failed to create a directory.
    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },
}

/// Get the root directory for application data.
///
/// Resolution order:
/// 1. `CACHEWATCH_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/cachewatch`)
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("cachewatch"))
}

/// Get the path to the cachewatch database file.
///
/// The `data/` subdirectory is created if it doesn't exist.
pub fn database_path() -> Result<PathBuf, PathError> {
    database_path_in(data_root()?)
}

/// Database path under an explicit data root, creating `data/` if needed.
pub fn database_path_in(root: impl Into<PathBuf>) -> Result<PathBuf, PathError> {
    let data_dir = root.into().join("data");

    fs::create_dir_all(&data_dir).map_err(|e| PathError::CreateFailed {
        path: data_dir.clone(),
        reason: e.to_string(),
    })?;

    Ok(data_dir.join("cachewatch.db"))
}
