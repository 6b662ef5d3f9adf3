//! Session with the external metadata provider.
//!
//! The provider enriches raw service statistics with human-readable names
//! (an app or depot name keyed by a numeric id). Reaching it can fail in two
//! distinct ways, and callers treat them differently:
//!
//! - [`ConnectionError`] is transient: back off and try again.
//! - [`LoginError`] is permanent until an operator fixes the credentials.
//!
//! Everything else is [`SessionError::Internal`].

#![deny(unsafe_code)]

pub mod backoff;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod session;
pub mod transport;

pub use backoff::BackoffPolicy;
pub use config::ProviderConfig;
pub use error::{ConnectionError, LoginError, SessionError};
pub use http::HttpProviderTransport;
pub use models::{AppMetadata, Credentials, FaultKind, SessionFault, SessionState, SessionToken};
pub use session::SessionManager;
pub use transport::ProviderTransport;
