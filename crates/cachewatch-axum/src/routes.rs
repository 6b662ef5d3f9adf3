//! Route definitions and router construction.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// Build all API routes without `/api` prefix (for nesting under /api).
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        // Exclusion settings
        .route(
            "/settings/excluded-ips",
            get(handlers::settings::list_excluded_ips)
                .post(handlers::settings::add_excluded_ip)
                .delete(handlers::settings::remove_excluded_ip),
        )
        // Aggregation queries
        .route("/data/hit-miss", get(handlers::data::hit_miss))
        .route("/data/bytes-by-service", get(handlers::data::bytes_by_service))
        .route(
            "/data/miss-bytes-by-service",
            get(handlers::data::miss_bytes_by_service),
        )
        .route(
            "/data/hit-bytes-by-service",
            get(handlers::data::hit_bytes_by_service),
        )
        .route("/data/report", get(handlers::data::report))
        // Ingestion
        .route(
            "/download-events",
            get(handlers::download_events::recent).post(handlers::download_events::record),
        )
        // Events (SSE)
        .route("/events", get(handlers::events::stream))
        // Metadata provider
        .route("/metadata/status", get(handlers::metadata::status))
        .route("/metadata/reconnect", post(handlers::metadata::reconnect))
        .route("/metadata/apps/{id}", get(handlers::metadata::lookup_app))
}

/// Create the main Axum router with all API routes.
///
/// # Path Parameter Syntax
/// Axum 0.8 uses brace syntax for path parameters: `{id}`
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes().with_state(state).layer(cors))
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint.
pub(crate) async fn health_check() -> &'static str {
    "OK"
}
