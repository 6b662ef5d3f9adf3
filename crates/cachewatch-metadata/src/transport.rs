//! Provider transport abstraction.
//!
//! The session manager owns the state machine; a transport only performs
//! single requests and classifies their failures.

use async_trait::async_trait;

use crate::error::{ConnectionError, SessionError};
use crate::models::{AppMetadata, Credentials, SessionToken};

/// One round trip to the metadata provider per method.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// Check that the provider is reachable and speaking our protocol.
    async fn handshake(&self) -> Result<(), ConnectionError>;

    /// Exchange credentials for a session token.
    ///
    /// Fails with `SessionError::Login` when the provider rejects them and
    /// `SessionError::Connection` when the request itself fails.
    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, SessionError>;

    /// Fetch metadata for `app_id`. `Ok(None)` when the provider has no such id.
    async fn fetch_app(
        &self,
        token: &SessionToken,
        app_id: u32,
    ) -> Result<Option<AppMetadata>, SessionError>;
}
