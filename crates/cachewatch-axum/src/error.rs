//! Axum-specific error types and mappings.
//!
//! Maps core and session errors to HTTP status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cachewatch_core::{AggregationError, CoreError, ExclusionError, RepositoryError};
use cachewatch_metadata::SessionError;
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict (resource already exists, or wrong session state).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The metadata provider could not be reached. Retry later.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The metadata provider refused our credentials. Needs an operator.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
    /// Stable error type discriminant for client-side handling
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    error_type: Option<&'static str>,
    /// Optional additional metadata for specific error types
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<serde_json::Value>,
}

impl HttpError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn error_type(&self) -> Option<&'static str> {
        match self {
            Self::ServiceUnavailable(_) => Some("CONNECTION_ERROR"),
            Self::BadGateway(_) => Some("LOGIN_ERROR"),
            _ => None,
        }
    }

    fn message(self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::ServiceUnavailable(msg)
            | Self::BadGateway(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = self.error_type();
        let metadata = error_type.map(|_| {
            serde_json::json!({ "retryable": status == StatusCode::SERVICE_UNAVAILABLE })
        });

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.message(),
            status: status.as_u16(),
            error_type,
            metadata,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Repository(repo_err) => repo_err.into(),
            CoreError::Validation(msg) => Self::BadRequest(msg),
        }
    }
}

impl From<RepositoryError> for HttpError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => Self::NotFound(msg),
            RepositoryError::AlreadyExists(msg) => Self::Conflict(msg),
            RepositoryError::Storage(msg) => Self::Internal(format!("Storage: {msg}")),
            RepositoryError::Constraint(msg) => Self::BadRequest(msg),
        }
    }
}

impl From<ExclusionError> for HttpError {
    fn from(err: ExclusionError) -> Self {
        match err {
            ExclusionError::InvalidFormat(_) => Self::BadRequest(err.to_string()),
            ExclusionError::AlreadyExists(_) => Self::Conflict(err.to_string()),
            ExclusionError::NotFound(_) => Self::NotFound(err.to_string()),
            ExclusionError::Repository(repo_err) => repo_err.into(),
        }
    }
}

impl From<AggregationError> for HttpError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::InvalidRange { .. } => Self::BadRequest(err.to_string()),
            AggregationError::Repository(repo_err) => repo_err.into(),
        }
    }
}

impl From<SessionError> for HttpError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Connection(_) => Self::ServiceUnavailable(err.to_string()),
            SessionError::Login(_) => Self::BadGateway(err.to_string()),
            SessionError::Internal(msg) => Self::Internal(msg),
        }
    }
}
