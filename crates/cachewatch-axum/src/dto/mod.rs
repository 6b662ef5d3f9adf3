//! Request and response bodies that exist only at the HTTP boundary.

use cachewatch_core::{AggregationQuery, NewDownloadEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `?days=<n>&excludeIps=<bool>` on every query endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    /// Trailing window length in days; 0 means all time.
    #[serde(default)]
    pub days: u32,
    /// The dashboard spells this `excludeIPs`.
    #[serde(default = "default_exclude_ips", alias = "excludeIPs")]
    pub exclude_ips: bool,
}

const fn default_exclude_ips() -> bool {
    true
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            days: 0,
            exclude_ips: true,
        }
    }
}

impl QueryParams {
    /// Resolve to a concrete query relative to `now`.
    pub fn into_query(self, now: DateTime<Utc>) -> AggregationQuery {
        AggregationQuery::last_days(self.days, self.exclude_ips, now)
    }
}

/// Body of the exclusion add and remove endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct IpRequest {
    pub ip: String,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `POST /api/download-events`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDownloadRequest {
    pub service_name: String,
    pub bytes_hit: u64,
    pub bytes_miss: u64,
    pub source_ip: String,
    /// Defaults to the time the request is handled.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RecordDownloadRequest {
    pub fn into_event(self, now: DateTime<Utc>) -> NewDownloadEvent {
        NewDownloadEvent::now(
            self.service_name,
            self.bytes_hit,
            self.bytes_miss,
            self.source_ip,
        )
        .at(self.timestamp.unwrap_or(now))
    }
}

/// `?limit=<n>` on the recent events listing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RecentParams {
    #[serde(default = "default_recent_limit")]
    pub limit: u32,
}

const fn default_recent_limit() -> u32 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachewatch_core::TimeWindow;

    #[test]
    fn test_query_params_defaults() {
        let params: QueryParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.days, 0);
        assert!(params.exclude_ips);

        let query = params.into_query(Utc::now());
        assert_eq!(query.window, TimeWindow::AllTime);
    }

    #[test]
    fn test_query_params_accept_both_exclude_spellings() {
        let params: QueryParams = serde_json::from_str(r#"{"excludeIPs":false}"#).unwrap();
        assert!(!params.exclude_ips);

        let params: QueryParams = serde_json::from_str(r#"{"excludeIps":false}"#).unwrap();
        assert!(!params.exclude_ips);
    }

    #[test]
    fn test_record_request_without_timestamp_uses_now() {
        let now = Utc::now();
        let req: RecordDownloadRequest = serde_json::from_str(
            r#"{"serviceName":"steam","bytesHit":10,"bytesMiss":2,"sourceIp":"10.0.0.1"}"#,
        )
        .unwrap();

        let event = req.into_event(now);
        assert_eq!(event.timestamp, now);
        assert_eq!(event.service_name, "steam");
    }
}
