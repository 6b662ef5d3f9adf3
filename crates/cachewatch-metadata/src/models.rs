//! Session data types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConnectionError, LoginError, SessionError};

/// Provider login credentials.
///
/// Supplied by the caller on every authentication and never stored by the
/// session manager. `Debug` redacts the password and auth code.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Out-of-band confirmation code (two-factor), when the account needs one.
    pub auth_code: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            auth_code: None,
        }
    }

    #[must_use]
    pub fn with_auth_code(mut self, code: impl Into<String>) -> Self {
        self.auth_code = Some(code.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_code", &self.auth_code.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Bearer token returned by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Enriched metadata for one external id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    pub app_id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Which class of failure put the session in [`SessionState::Faulted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    Connection,
    Login,
    Internal,
}

/// Why the session is faulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFault {
    pub kind: FaultKind,
    pub message: String,
}

impl From<&SessionError> for SessionFault {
    fn from(err: &SessionError) -> Self {
        let kind = match err {
            SessionError::Connection(_) => FaultKind::Connection,
            SessionError::Login(_) => FaultKind::Login,
            SessionError::Internal(_) => FaultKind::Internal,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<&ConnectionError> for SessionFault {
    fn from(err: &ConnectionError) -> Self {
        Self {
            kind: FaultKind::Connection,
            message: err.to_string(),
        }
    }
}

impl From<&LoginError> for SessionFault {
    fn from(err: &LoginError) -> Self {
        Self {
            kind: FaultKind::Login,
            message: err.to_string(),
        }
    }
}

/// Observable session state.
///
/// `Disconnected -> Connecting -> Connected | Faulted`. Leaving `Faulted`
/// takes an explicit `connect()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Connecting,
    #[serde(rename_all = "camelCase")]
    Connected {
        /// Set once `authenticate` succeeds.
        authenticated_as: Option<String>,
    },
    Faulted(SessionFault),
}

impl SessionState {
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub const fn is_authenticated(&self) -> bool {
        matches!(
            self,
            Self::Connected {
                authenticated_as: Some(_)
            }
        )
    }
}
