//! SSE events handler - refresh hints.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures_util::stream::Stream;

use crate::state::AppState;

/// SSE events stream endpoint.
///
/// Clients receive an `UpdateDownloadEvents` event whenever recorded
/// downloads or exclusion settings changed, at most once per refresh
/// interval. Clients re-query the data endpoints on receipt.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    state.sse.clone().subscribe()
}
