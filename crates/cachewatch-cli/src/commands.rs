//! Main commands enum and subcommands.

use anyhow::{Result, bail};
use cachewatch_axum::ProviderSettings;
use cachewatch_metadata::{Credentials, ProviderConfig};
use clap::{Args, Subcommand};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API, SSE stream and refresh coordinator
    Serve {
        /// Port to listen on
        #[arg(long, env = "CACHEWATCH_PORT", default_value_t = 9887)]
        port: u16,
        /// How often to check for changes and notify dashboards
        #[arg(long, env = "CACHEWATCH_REFRESH_INTERVAL_MS", default_value_t = 1000)]
        refresh_interval_ms: u64,
        /// Allowed CORS origin (repeatable; any origin when omitted)
        #[arg(long)]
        allowed_origin: Vec<String>,
    },

    /// Manage the excluded client addresses
    Exclude {
        #[command(subcommand)]
        command: ExcludeCommand,
    },

    /// Print hit/miss totals and per-service usage
    Stats {
        /// Only the last N days (0 = all time)
        #[arg(long, default_value_t = 0)]
        days: u32,
        /// Include traffic from excluded addresses
        #[arg(long)]
        include_all: bool,
    },

    /// Record a single download event
    Record {
        /// Service name (e.g. steam, epicgames, wsus)
        #[arg(long)]
        service: String,
        /// Bytes served from cache
        #[arg(long)]
        hit: u64,
        /// Bytes fetched from origin
        #[arg(long)]
        miss: u64,
        /// Client address
        #[arg(long)]
        ip: String,
    },

    /// Query the metadata provider
    Metadata {
        #[command(subcommand)]
        command: MetadataCommand,
    },
}

/// Exclusion registry subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ExcludeCommand {
    /// List excluded addresses
    List,
    /// Exclude an address from statistics
    Add { ip: String },
    /// Stop excluding an address
    Remove { ip: String },
}

/// Metadata provider subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MetadataCommand {
    /// Connect (and log in, when credentials are given) and report the state
    Status,
    /// Look up an app by its numeric id
    Lookup { id: u32 },
}

/// Metadata provider connection options, shared by `serve` and `metadata`.
#[derive(Args, Clone, Default)]
pub struct ProviderArgs {
    /// Metadata provider base URL; without it no session is attempted
    #[arg(long = "provider-url", env = "CACHEWATCH_PROVIDER_URL", global = true)]
    pub url: Option<String>,

    /// Provider login name
    #[arg(long = "provider-user", env = "CACHEWATCH_PROVIDER_USER", global = true)]
    pub user: Option<String>,

    /// Provider password
    #[arg(
        long = "provider-password",
        env = "CACHEWATCH_PROVIDER_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    pub password: Option<String>,

    /// Two-factor code, when the account requires one
    #[arg(
        long = "provider-auth-code",
        env = "CACHEWATCH_PROVIDER_AUTH_CODE",
        hide_env_values = true,
        global = true
    )]
    pub auth_code: Option<String>,
}

impl ProviderArgs {
    /// Resolve into server settings. `None` when no URL is configured.
    pub fn settings(&self) -> Result<Option<ProviderSettings>> {
        let Some(url) = &self.url else {
            return Ok(None);
        };

        let mut settings = ProviderSettings::new(ProviderConfig::new(url));
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => {
                let mut credentials = Credentials::new(user, password);
                if let Some(code) = &self.auth_code {
                    credentials = credentials.with_auth_code(code);
                }
                settings = settings.with_credentials(credentials);
            }
            (None, None) => {}
            _ => bail!("--provider-user and --provider-password must be given together"),
        }
        Ok(Some(settings))
    }
}
