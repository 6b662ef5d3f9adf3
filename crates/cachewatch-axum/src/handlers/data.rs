//! Aggregation query handlers.
//!
//! All accept `?days=<n>&excludeIps=<bool>`; see [`QueryParams`].

use axum::Json;
use axum::extract::{Query, State};
use cachewatch_core::{AggregationReport, HitMissTotals, ServiceBytes};
use chrono::Utc;

use crate::dto::QueryParams;
use crate::error::HttpError;
use crate::state::AppState;

/// Total hit and miss bytes.
pub async fn hit_miss(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<HitMissTotals>, HttpError> {
    let query = params.into_query(Utc::now());
    Ok(Json(state.core.aggregation().hit_miss(&query).await?))
}

/// Hit + miss bytes per service, largest first.
pub async fn bytes_by_service(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<ServiceBytes>>, HttpError> {
    let query = params.into_query(Utc::now());
    Ok(Json(state.core.aggregation().bytes_by_service(&query).await?))
}

/// Miss bytes per service, largest first.
pub async fn miss_bytes_by_service(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<ServiceBytes>>, HttpError> {
    let query = params.into_query(Utc::now());
    Ok(Json(
        state.core.aggregation().miss_bytes_by_service(&query).await?,
    ))
}

/// Hit bytes per service, largest first.
pub async fn hit_bytes_by_service(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<ServiceBytes>>, HttpError> {
    let query = params.into_query(Utc::now());
    Ok(Json(
        state.core.aggregation().hit_bytes_by_service(&query).await?,
    ))
}

/// Every shape from one consistent read.
pub async fn report(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<AggregationReport>, HttpError> {
    let query = params.into_query(Utc::now());
    Ok(Json(state.core.aggregation().report(&query).await?))
}
