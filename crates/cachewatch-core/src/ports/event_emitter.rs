//! Event emitter trait for broadcasting refresh hints.
//!
//! Implementations handle transport details (broadcast channels, SSE).

use crate::events::AppEvent;

/// Trait for emitting application events.
///
/// This abstraction keeps channel types out of the public API surface of the
/// runtime crate. `SseBroadcaster` in `cachewatch-axum` is the production
/// implementation.
pub trait AppEventEmitter: Send + Sync {
    /// Emit an application event to every current subscriber.
    ///
    /// Must not block, and must not fail because one subscriber went away.
    fn emit(&self, event: AppEvent);
}
