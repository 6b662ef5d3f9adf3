//! Server composition root.
//!
//! Wires storage, core services, the refresh coordinator, the SSE
//! broadcaster and the optional metadata session, then serves the router
//! until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use cachewatch_core::{AppCore, AppEventEmitter, ChangeCounter, database_path};
use cachewatch_db::{CoreFactory, setup_database};
use cachewatch_metadata::{
    BackoffPolicy, Credentials, HttpProviderTransport, ProviderConfig, SessionManager,
};
use cachewatch_runtime::{RefreshConfig, RefreshCoordinator};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::sse::SseBroadcaster;

/// CORS policy for the API routes.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Any origin. Suitable for a LAN appliance.
    #[default]
    AllowAll,
    /// Only the listed origins.
    AllowOrigins(Vec<String>),
}

/// How to reach and log in to the metadata provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub config: ProviderConfig,
    /// When absent the session connects but never authenticates.
    pub credentials: Option<Credentials>,
    pub backoff: BackoffPolicy,
}

impl ProviderSettings {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            credentials: None,
            backoff: BackoffPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub const fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    pub refresh: RefreshConfig,
    pub cors: CorsConfig,
    pub provider: Option<ProviderSettings>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 9887,
            database_path: None,
            refresh: RefreshConfig::default(),
            cors: CorsConfig::default(),
            provider: None,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_refresh(mut self, refresh: RefreshConfig) -> Self {
        self.refresh = refresh;
        self
    }

    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        if !origins.is_empty() {
            self.cors = CorsConfig::AllowOrigins(origins);
        }
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider: ProviderSettings) -> Self {
        self.provider = Some(provider);
        self
    }
}

/// Everything handlers need.
pub struct AxumContext {
    pub core: Arc<AppCore>,
    pub sse: Arc<SseBroadcaster>,
    /// Present when a provider is configured.
    pub session: Option<Arc<SessionManager>>,
    pub provider: Option<ProviderSettings>,
}

impl AxumContext {
    /// Context without a metadata provider.
    pub fn new(core: Arc<AppCore>, sse: Arc<SseBroadcaster>) -> Self {
        Self {
            core,
            sse,
            session: None,
            provider: None,
        }
    }

    /// Attach a metadata session.
    #[must_use]
    pub fn with_session(mut self, session: Arc<SessionManager>, provider: ProviderSettings) -> Self {
        self.session = Some(session);
        self.provider = Some(provider);
        self
    }
}

/// Open storage and compose services.
pub async fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    let db_path = match &config.database_path {
        Some(path) => path.clone(),
        None => database_path()?,
    };

    tracing::info!(
        target: "cachewatch.paths",
        database_path = %db_path.display(),
        "Axum bootstrap resolved paths"
    );

    let pool = setup_database(&db_path).await?;
    let changes = Arc::new(ChangeCounter::new());
    let core = Arc::new(CoreFactory::build_app_core(pool, changes));
    let sse = Arc::new(SseBroadcaster::with_defaults());

    let mut ctx = AxumContext::new(core, sse);
    if let Some(provider) = &config.provider {
        let transport = HttpProviderTransport::new(&provider.config)?;
        let session = Arc::new(SessionManager::new(Arc::new(transport)));
        info!(
            provider = provider.config.base_url(),
            authenticated = provider.credentials.is_some(),
            "Metadata provider configured"
        );
        ctx = ctx.with_session(session, provider.clone());
    }

    Ok(ctx)
}

/// Establish the metadata session in the background.
///
/// Transient failures are retried per the configured backoff; a login
/// rejection is logged and left for an operator.
fn spawn_session_establish(
    session: Arc<SessionManager>,
    provider: ProviderSettings,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let attempt = async {
            match &provider.credentials {
                Some(credentials) => {
                    session
                        .connect_with_backoff(provider.backoff, credentials)
                        .await
                }
                None => session.connect().await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {}
            result = attempt => match result {
                Ok(state) => info!(state = ?state, "Metadata session established"),
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Metadata provider unreachable; use /api/metadata/reconnect to retry");
                }
                Err(e) => warn!(error = %e, "Metadata provider rejected the session"),
            },
        }
    });
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                cancel.cancelled().await;
            }
        },
        () = cancel.cancelled() => {}
    }
    cancel.cancel();
}

/// Run the server until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let ctx = bootstrap(&config).await?;
    let cancel = CancellationToken::new();

    let emitter: Arc<dyn AppEventEmitter> = ctx.sse.clone();
    let coordinator =
        RefreshCoordinator::new(ctx.core.changes(), emitter, config.refresh).spawn(cancel.clone());

    if let (Some(session), Some(provider)) = (&ctx.session, &ctx.provider) {
        spawn_session_establish(Arc::clone(session), provider.clone(), cancel.clone());
    }

    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("cachewatch listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    if let Err(e) = coordinator.await {
        warn!(error = %e, "Refresh coordinator task failed");
    }
    info!("cachewatch stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 9887);
        assert!(config.provider.is_none());
        assert!(matches!(config.cors, CorsConfig::AllowAll));
    }

    #[test]
    fn test_empty_origin_list_keeps_allow_all() {
        let config = ServerConfig::default().with_allowed_origins(Vec::new());
        assert!(matches!(config.cors, CorsConfig::AllowAll));

        let config = ServerConfig::default().with_allowed_origins(vec!["http://lan".into()]);
        assert!(matches!(config.cors, CorsConfig::AllowOrigins(ref o) if o.len() == 1));
    }

    #[tokio::test]
    async fn test_bootstrap_with_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            ServerConfig::default().with_database_path(dir.path().join("data").join("cachewatch.db"));

        let ctx = bootstrap(&config).await.unwrap();

        assert!(ctx.session.is_none());
        assert!(ctx.core.exclusions().list().await.unwrap().is_empty());
    }
}
