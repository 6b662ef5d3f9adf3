//! Excluded IP settings handlers.

use axum::Json;
use axum::extract::State;
use cachewatch_core::ExcludedIp;

use crate::dto::{IpRequest, MessageResponse};
use crate::error::HttpError;
use crate::state::AppState;

/// List excluded addresses.
pub async fn list_excluded_ips(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExcludedIp>>, HttpError> {
    Ok(Json(state.core.exclusions().list().await?))
}

/// Add an excluded address. `409` if already present.
pub async fn add_excluded_ip(
    State(state): State<AppState>,
    Json(req): Json<IpRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let ip = state.core.exclusions().add(&req.ip).await?;
    Ok(Json(MessageResponse::new(format!(
        "Added {ip} to excluded IPs"
    ))))
}

/// Remove an excluded address. `404` if absent.
pub async fn remove_excluded_ip(
    State(state): State<AppState>,
    Json(req): Json<IpRequest>,
) -> Result<Json<MessageResponse>, HttpError> {
    let ip = state.core.exclusions().remove(&req.ip).await?;
    Ok(Json(MessageResponse::new(format!(
        "Removed {ip} from excluded IPs"
    ))))
}
