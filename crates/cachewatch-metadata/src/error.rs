//! Error types for provider sessions.
//!
//! Exactly two external failure kinds plus an internal catch-all. The split
//! drives retry policy: only [`ConnectionError`] is ever retried.

use thiserror::Error;

/// The provider could not be reached or did not complete the handshake.
///
/// Transient: retrying later with backoff is expected to help.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// DNS, refused connection, reset, or any other transport failure.
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    /// Connected, but the provider did not accept the handshake.
    #[error("Provider handshake failed: {0}")]
    Handshake(String),

    /// No answer within the configured timeout.
    #[error("Provider request timed out")]
    Timeout,

    /// The provider answered with a server error.
    #[error("Provider unavailable (HTTP {status})")]
    Unavailable {
        /// HTTP status code
        status: u16,
    },
}

/// The provider refused the credentials.
///
/// Permanent: never retried automatically. Needs operator action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Invalid provider credentials")]
    InvalidCredentials,

    #[error("Provider credentials or session expired")]
    Expired,

    #[error("Provider login requires a two-factor code")]
    TwoFactorRequired,

    /// Rejected for a reason this client does not recognize.
    #[error("Provider login rejected: {0}")]
    Rejected(String),
}

impl LoginError {
    /// Map the provider's `reason` field.
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            "invalid_credentials" => Self::InvalidCredentials,
            "expired" => Self::Expired,
            "two_factor_required" => Self::TwoFactorRequired,
            other => Self::Rejected(other.to_string()),
        }
    }
}

/// Errors returned by [`SessionManager`](crate::SessionManager) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Login(#[from] LoginError),

    /// Anything that is neither a network nor a credentials problem, such as
    /// calling an operation in the wrong state or an unparseable response.
    #[error("Internal session error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Whether backing off and retrying may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
