//! Excluded IP addresses.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons an address cannot be used as an exclusion entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpFormatError {
    /// Input was empty or whitespace only.
    #[error("IP address is required")]
    Blank,

    /// Input is not a valid IPv4 or IPv6 address.
    #[error("'{0}' is not a valid IP address")]
    Malformed(String),
}

/// A normalized IP address in the exclusion registry.
///
/// Normalization goes through `IpAddr`, so `::0001` and `::1` refer to the
/// same entry and surrounding whitespace is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExcludedIp(String);

impl ExcludedIp {
    /// Parse and normalize a user-supplied address.
    pub fn parse(raw: &str) -> Result<Self, IpFormatError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IpFormatError::Blank);
        }
        trimmed
            .parse::<IpAddr>()
            .map(|ip| Self(ip.to_string()))
            .map_err(|_| IpFormatError::Malformed(trimmed.to_string()))
    }

    /// Rebuild an entry from a value that was normalized before it was stored.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the normalized string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ExcludedIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize the source address of a recorded download.
///
/// Addresses that parse are stored in canonical form so they compare equal to
/// exclusion entries. Anything else (hostnames, log garbage) is kept trimmed
/// as-is; it can never match an exclusion entry.
pub fn normalize_source_ip(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .parse::<IpAddr>()
        .map_or_else(|_| trimmed.to_string(), |ip| ip.to_string())
}
