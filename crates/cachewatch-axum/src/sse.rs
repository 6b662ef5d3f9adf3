//! SSE broadcaster for refresh hints.
//!
//! Implements the core `AppEventEmitter` port on top of a
//! `tokio::sync::broadcast` channel. Each connected client gets its own
//! receiver, so a slow or departed client never affects the others.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use cachewatch_core::{AppEvent, AppEventEmitter};
use futures_util::stream::Stream;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// SSE broadcaster that implements the event emitter port.
#[derive(Debug, Clone)]
pub struct SseBroadcaster {
    sender: broadcast::Sender<AppEvent>,
}

impl SseBroadcaster {
    /// Create a new SSE broadcaster with the specified channel capacity.
    ///
    /// Hints carry no data, so a lagging client that skips some loses
    /// nothing: the next one it sees triggers the same re-query.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new SSE broadcaster with default capacity (64 events).
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(64)
    }

    /// Raw receiver, for in-process consumers and tests.
    pub fn receiver(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Create an SSE stream for a new client connection.
    ///
    /// Each hint becomes an event named after [`AppEvent::event_name`] with
    /// an empty payload. A keep-alive comment goes out every 30 seconds.
    pub fn subscribe(
        self: Arc<Self>,
    ) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
        Sse::new(hint_stream(self.sender.subscribe())).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("ping"),
        )
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Turn a receiver into SSE frames, skipping over lag.
fn hint_stream(
    receiver: broadcast::Receiver<AppEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => Some(Ok(Event::default().event(event.event_name()).data(""))),
        Err(e) => {
            // Lagged: skip, the next hint is equivalent
            tracing::debug!("SSE stream error: {}", e);
            None
        }
    })
}

impl AppEventEmitter for SseBroadcaster {
    fn emit(&self, event: AppEvent) {
        // No subscribers is fine
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(event = event.event_name(), delivered, "Broadcast refresh hint");
    }
}
