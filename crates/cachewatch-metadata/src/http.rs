//! HTTP transport for the metadata provider.
//!
//! Wire protocol:
//!
//! - `GET {base}/status` - handshake; any 2xx is accepted
//! - `POST {base}/login` - JSON credentials in, `{"token"}` out; rejections
//!   are `401`/`403` with `{"reason"}`
//! - `GET {base}/apps/{id}` - bearer token; `404` for unknown ids

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ConnectionError, LoginError, SessionError};
use crate::models::{AppMetadata, Credentials, SessionToken};
use crate::transport::ProviderTransport;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_code: Option<&'a str>,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize, Default)]
struct RejectionBody {
    #[serde(default)]
    reason: Option<String>,
}

/// Production transport over reqwest.
pub struct HttpProviderTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProviderTransport {
    /// Build a transport from `config`.
    pub fn new(config: &ProviderConfig) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SessionError::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Classify a failed send. Everything reqwest reports before a response
/// arrives is a connectivity problem.
fn classify_send_error(err: &reqwest::Error) -> ConnectionError {
    if err.is_timeout() {
        ConnectionError::Timeout
    } else {
        ConnectionError::Unreachable(err.to_string())
    }
}

/// Map a login or lookup rejection body to a `LoginError`.
async fn login_rejection(response: reqwest::Response, fallback: LoginError) -> LoginError {
    let body: RejectionBody = response.json().await.unwrap_or_default();
    body.reason
        .as_deref()
        .map_or(fallback, LoginError::from_reason)
}

#[async_trait]
impl ProviderTransport for HttpProviderTransport {
    async fn handshake(&self) -> Result<(), ConnectionError> {
        let url = self.url("/status");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "Provider handshake response");

        if status.is_success() {
            Ok(())
        } else {
            Err(ConnectionError::Handshake(format!(
                "{url} answered HTTP {}",
                status.as_u16()
            )))
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<SessionToken, SessionError> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
                auth_code: credentials.auth_code.as_deref(),
            })
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let status = response.status();
        match status {
            s if s.is_success() => {
                let body: LoginResponse = response.json().await.map_err(|e| {
                    SessionError::internal(format!("invalid login response: {e}"))
                })?;
                Ok(SessionToken::new(body.token))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(login_rejection(response, LoginError::InvalidCredentials)
                    .await
                    .into())
            }
            s if s.is_server_error() => Err(ConnectionError::Unavailable {
                status: s.as_u16(),
            }
            .into()),
            s => Err(SessionError::internal(format!(
                "unexpected login status {}",
                s.as_u16()
            ))),
        }
    }

    async fn fetch_app(
        &self,
        token: &SessionToken,
        app_id: u32,
    ) -> Result<Option<AppMetadata>, SessionError> {
        let response = self
            .client
            .get(self.url(&format!("/apps/{app_id}")))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let status = response.status();
        match status {
            s if s.is_success() => {
                let metadata = response.json().await.map_err(|e| {
                    SessionError::internal(format!("invalid metadata for app {app_id}: {e}"))
                })?;
                Ok(Some(metadata))
            }
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(login_rejection(response, LoginError::Expired).await.into())
            }
            s if s.is_server_error() => Err(ConnectionError::Unavailable {
                status: s.as_u16(),
            }
            .into()),
            s => Err(SessionError::internal(format!(
                "unexpected lookup status {} for app {app_id}",
                s.as_u16()
            ))),
        }
    }
}
