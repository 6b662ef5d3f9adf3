//! Events pushed to connected dashboards.
//!
//! There is one logical event: "aggregated data may have changed, query
//! again". It carries no payload; subscribers re-read current state instead.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "download_events_updated" }
//! ```

use serde::{Deserialize, Serialize};

/// Events emitted to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// Recorded downloads or exclusion settings changed since the last
    /// notification.
    DownloadEventsUpdated,
}

impl AppEvent {
    /// Get the event name for wire protocols.
    ///
    /// Dashboards subscribe to this name on the SSE stream.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::DownloadEventsUpdated => "UpdateDownloadEvents",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&AppEvent::DownloadEventsUpdated).unwrap();
        assert_eq!(json, r#"{"type":"download_events_updated"}"#);
    }

    /// Dashboards listen for this exact name; renaming it silently breaks
    /// live refresh.
    #[test]
    fn event_name_is_stable() {
        assert_eq!(
            AppEvent::DownloadEventsUpdated.event_name(),
            "UpdateDownloadEvents"
        );
    }
}
