//! Serve command handler.

use std::path::PathBuf;

use anyhow::Result;
use cachewatch_axum::{ProviderSettings, ServerConfig, start_server};
use cachewatch_runtime::RefreshConfig;

/// Options for the serve command, resolved from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    pub port: u16,
    pub refresh_interval_ms: u64,
    pub allowed_origins: Vec<String>,
    pub database_path: Option<PathBuf>,
    pub provider: Option<ProviderSettings>,
}

impl ServeOptions {
    /// Translate into the server's configuration.
    pub fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default()
            .with_port(self.port)
            .with_refresh(RefreshConfig::from_millis(self.refresh_interval_ms))
            .with_allowed_origins(self.allowed_origins);
        if let Some(path) = self.database_path {
            config = config.with_database_path(path);
        }
        if let Some(provider) = self.provider {
            config = config.with_provider(provider);
        }
        config
    }
}

/// Run the server until Ctrl-C.
pub async fn execute(options: ServeOptions) -> Result<()> {
    start_server(options.into_config()).await
}
