//! Download event ingestion handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use cachewatch_core::DownloadEvent;
use chrono::Utc;

use crate::dto::{RecentParams, RecordDownloadRequest};
use crate::error::HttpError;
use crate::state::AppState;

/// Record one served request.
pub async fn record(
    State(state): State<AppState>,
    Json(req): Json<RecordDownloadRequest>,
) -> Result<(StatusCode, Json<DownloadEvent>), HttpError> {
    let event = state
        .core
        .downloads()
        .record(req.into_event(Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Most recent events, newest first.
pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<DownloadEvent>>, HttpError> {
    Ok(Json(state.core.downloads().recent(params.limit).await?))
}
