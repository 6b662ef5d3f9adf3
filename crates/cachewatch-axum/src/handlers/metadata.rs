//! Metadata provider session handlers.

use axum::Json;
use axum::extract::{Path, State};
use cachewatch_metadata::{AppMetadata, BackoffPolicy, SessionState};
use serde::Serialize;

use crate::error::HttpError;
use crate::state::AppState;

/// Session status as reported to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStatus {
    /// Whether a provider URL is configured at all.
    pub configured: bool,
    #[serde(flatten)]
    pub session: SessionState,
}

/// Current session state.
pub async fn status(State(state): State<AppState>) -> Json<MetadataStatus> {
    let status = state.session.as_ref().map_or(
        MetadataStatus {
            configured: false,
            session: SessionState::Disconnected,
        },
        |session| MetadataStatus {
            configured: true,
            session: session.state(),
        },
    );
    Json(status)
}

/// Look up metadata for an app id on the authenticated session.
pub async fn lookup_app(
    State(state): State<AppState>,
    Path(app_id): Path<u32>,
) -> Result<Json<AppMetadata>, HttpError> {
    let session = state
        .session
        .as_ref()
        .ok_or_else(|| HttpError::Conflict("No metadata provider configured".to_string()))?;

    if !session.state().is_authenticated() {
        return Err(HttpError::Conflict(
            "Metadata session is not established".to_string(),
        ));
    }

    session
        .lookup(app_id)
        .await?
        .map(Json)
        .ok_or_else(|| HttpError::NotFound(format!("No metadata for app {app_id}")))
}

/// Explicitly (re)establish the session, e.g. after a fault.
///
/// Uses the configured credentials; a single attempt, since the caller is
/// waiting on the response.
pub async fn reconnect(State(state): State<AppState>) -> Result<Json<SessionState>, HttpError> {
    let (Some(session), Some(provider)) = (state.session.as_ref(), state.provider.as_ref()) else {
        return Err(HttpError::Conflict(
            "No metadata provider configured".to_string(),
        ));
    };

    let next = match &provider.credentials {
        Some(credentials) => {
            session
                .connect_with_backoff(BackoffPolicy::new().with_max_attempts(1), credentials)
                .await?
        }
        None => session.connect().await?,
    };
    Ok(Json(next))
}
