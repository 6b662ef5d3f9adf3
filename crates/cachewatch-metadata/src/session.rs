//! Session state machine.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::error::SessionError;
use crate::models::{AppMetadata, Credentials, SessionFault, SessionState, SessionToken};
use crate::transport::ProviderTransport;

/// Owns the connection to the metadata provider.
///
/// Transitions are serialized by an async mutex; the current state is
/// published on a `watch` channel so [`state`](Self::state) never waits on
/// an in-flight connect. There is no implicit reconnect: after a fault the
/// caller decides whether to `connect()` again.
pub struct SessionManager {
    transport: Arc<dyn ProviderTransport>,
    token: Mutex<Option<SessionToken>>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn ProviderTransport>) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            transport,
            token: Mutex::new(None),
            state,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: SessionState) {
        debug!(state = ?next, "Session state changed");
        self.state.send_replace(next);
    }

    fn fault(&self, token: &mut Option<SessionToken>, err: &SessionError) {
        *token = None;
        self.set_state(SessionState::Faulted(SessionFault::from(err)));
    }

    /// Reach the provider and complete the handshake.
    ///
    /// A no-op when already connected.
    pub async fn connect(&self) -> Result<SessionState, SessionError> {
        let mut token = self.token.lock().await;
        if self.state.borrow().is_connected() {
            return Ok(self.state());
        }

        self.set_state(SessionState::Connecting);
        match self.transport.handshake().await {
            Ok(()) => {
                *token = None;
                self.set_state(SessionState::Connected {
                    authenticated_as: None,
                });
                info!("Connected to metadata provider");
                Ok(self.state())
            }
            Err(e) => {
                let err = SessionError::Connection(e);
                warn!(error = %err, "Metadata provider connection failed");
                self.fault(&mut token, &err);
                Err(err)
            }
        }
    }

    /// Log in on an established connection.
    ///
    /// The credentials are used for this call only.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<SessionState, SessionError> {
        let mut token = self.token.lock().await;
        if !self.state.borrow().is_connected() {
            return Err(SessionError::internal("not connected"));
        }

        match self.transport.login(credentials).await {
            Ok(issued) => {
                *token = Some(issued);
                self.set_state(SessionState::Connected {
                    authenticated_as: Some(credentials.username.clone()),
                });
                info!(username = %credentials.username, "Authenticated with metadata provider");
                Ok(self.state())
            }
            Err(err) => {
                warn!(username = %credentials.username, error = %err, "Metadata provider login failed");
                self.fault(&mut token, &err);
                Err(err)
            }
        }
    }

    /// Drop the connection and any login token.
    pub async fn disconnect(&self) {
        let mut token = self.token.lock().await;
        *token = None;
        self.set_state(SessionState::Disconnected);
    }

    /// Look up metadata for `app_id` on the authenticated session.
    ///
    /// External failures fault the session, same as during connect.
    pub async fn lookup(&self, app_id: u32) -> Result<Option<AppMetadata>, SessionError> {
        let mut token = self.token.lock().await;
        let Some(current) = token.clone() else {
            return Err(SessionError::internal("not authenticated"));
        };

        match self.transport.fetch_app(&current, app_id).await {
            Ok(found) => Ok(found),
            Err(err) => {
                if !matches!(err, SessionError::Internal(_)) {
                    self.fault(&mut token, &err);
                }
                Err(err)
            }
        }
    }

    /// Connect and authenticate, retrying transient failures.
    ///
    /// `ConnectionError` at either step is retried per `policy`. A
    /// `LoginError` ends the attempt immediately.
    pub async fn connect_with_backoff(
        &self,
        policy: BackoffPolicy,
        credentials: &Credentials,
    ) -> Result<SessionState, SessionError> {
        let mut attempt = 1;
        loop {
            let result = match self.connect().await {
                Ok(_) => self.authenticate(credentials).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(state) => return Ok(state),
                Err(err) if err.is_transient() && attempt < policy.max_attempts() => {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Retrying metadata provider connection"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectionError, LoginError};
    use crate::models::FaultKind;
    use crate::transport::MockProviderTransport;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn creds() -> Credentials {
        Credentials::new("operator", "hunter2")
    }

    fn manager(mock: MockProviderTransport) -> SessionManager {
        SessionManager::new(Arc::new(mock))
    }

    fn connected_mock() -> MockProviderTransport {
        let mut mock = MockProviderTransport::new();
        mock.expect_handshake().returning(|| Ok(()));
        mock
    }

    #[tokio::test]
    async fn test_starts_disconnected() {
        let session = manager(MockProviderTransport::new());
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_success() {
        let session = manager(connected_mock());

        let state = session.connect().await.unwrap();

        assert_eq!(
            state,
            SessionState::Connected {
                authenticated_as: None
            }
        );
    }

    #[tokio::test]
    async fn test_connect_failure_faults_with_connection_error() {
        let mut mock = MockProviderTransport::new();
        mock.expect_handshake()
            .returning(|| Err(ConnectionError::Unreachable("connection refused".into())));
        let session = manager(mock);

        let err = session.connect().await.unwrap_err();

        assert!(matches!(err, SessionError::Connection(_)));
        assert!(err.is_transient());
        match session.state() {
            SessionState::Faulted(fault) => assert_eq!(fault.kind, FaultKind::Connection),
            other => panic!("expected Faulted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_requires_connection() {
        let session = manager(MockProviderTransport::new());

        let err = session.authenticate(&creds()).await.unwrap_err();

        assert!(matches!(err, SessionError::Internal(_)));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_rejected_login_faults_with_login_error() {
        let mut mock = connected_mock();
        mock.expect_login()
            .returning(|_| Err(LoginError::InvalidCredentials.into()));
        let session = manager(mock);

        session.connect().await.unwrap();
        let err = session.authenticate(&creds()).await.unwrap_err();

        assert_eq!(err, SessionError::Login(LoginError::InvalidCredentials));
        assert!(!err.is_transient());
        match session.state() {
            SessionState::Faulted(fault) => assert_eq!(fault.kind, FaultKind::Login),
            other => panic!("expected Faulted, got {other:?}"),
        }

        // Faulted requires a fresh connect
        let err = session.authenticate(&creds()).await.unwrap_err();
        assert!(matches!(err, SessionError::Internal(_)));
    }

    #[tokio::test]
    async fn test_lookup_requires_authentication() {
        let session = manager(connected_mock());
        session.connect().await.unwrap();

        let err = session.lookup(440).await.unwrap_err();
        assert!(matches!(err, SessionError::Internal(_)));
    }

    #[tokio::test]
    async fn test_lookup_uses_issued_token() {
        let mut mock = connected_mock();
        mock.expect_login()
            .returning(|_| Ok(SessionToken::new("tok-1")));
        mock.expect_fetch_app().returning(|token, app_id| {
            assert_eq!(token.as_str(), "tok-1");
            Ok(Some(AppMetadata {
                app_id,
                name: "Team Fortress 2".to_string(),
                kind: None,
            }))
        });
        let session = manager(mock);

        session.connect().await.unwrap();
        let state = session.authenticate(&creds()).await.unwrap();
        assert!(state.is_authenticated());

        let found = session.lookup(440).await.unwrap().unwrap();
        assert_eq!(found.name, "Team Fortress 2");
    }

    #[tokio::test]
    async fn test_expired_token_during_lookup_faults_session() {
        let mut mock = connected_mock();
        mock.expect_login()
            .returning(|_| Ok(SessionToken::new("tok-1")));
        mock.expect_fetch_app()
            .returning(|_, _| Err(LoginError::Expired.into()));
        let session = manager(mock);

        session.connect().await.unwrap();
        session.authenticate(&creds()).await.unwrap();
        let err = session.lookup(10).await.unwrap_err();

        assert_eq!(err, SessionError::Login(LoginError::Expired));
        assert!(matches!(session.state(), SessionState::Faulted(_)));
        assert!(matches!(
            session.lookup(10).await,
            Err(SessionError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_disconnect_drops_token() {
        let mut mock = connected_mock();
        mock.expect_login()
            .returning(|_| Ok(SessionToken::new("tok-1")));
        let session = manager(mock);

        session.connect().await.unwrap();
        session.authenticate(&creds()).await.unwrap();
        session.disconnect().await;

        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(matches!(
            session.lookup(1).await,
            Err(SessionError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let session = manager(connected_mock());
        let mut rx = session.subscribe();

        session.connect().await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_retries_connection_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut mock = MockProviderTransport::new();
        let seen = Arc::clone(&calls);
        mock.expect_handshake().returning(move || {
            if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ConnectionError::Timeout)
            } else {
                Ok(())
            }
        });
        mock.expect_login()
            .times(1)
            .returning(|_| Ok(SessionToken::new("tok-1")));
        let session = manager(mock);

        let policy = BackoffPolicy::new()
            .with_max_attempts(5)
            .with_base_delay(Duration::from_millis(100));
        let state = session
            .connect_with_backoff(policy, &creds())
            .await
            .unwrap();

        assert!(state.is_authenticated());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let mut mock = MockProviderTransport::new();
        let seen = Arc::clone(&calls);
        mock.expect_handshake().returning(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            Err(ConnectionError::Unreachable("no route to host".into()))
        });
        let session = manager(mock);

        let err = session
            .connect_with_backoff(BackoffPolicy::new().with_max_attempts(3), &creds())
            .await
            .unwrap_err();

        assert!(err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_stops_on_login_error() {
        let mut mock = MockProviderTransport::new();
        mock.expect_handshake().times(1).returning(|| Ok(()));
        mock.expect_login()
            .times(1)
            .returning(|_| Err(LoginError::TwoFactorRequired.into()));
        let session = manager(mock);

        let err = session
            .connect_with_backoff(BackoffPolicy::new(), &creds())
            .await
            .unwrap_err();

        assert_eq!(err, SessionError::Login(LoginError::TwoFactorRequired));
    }
}
