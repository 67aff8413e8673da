//! Refresh Coordinator
//!
//! Single-flight renewal of the access credential. The first caller to
//! observe session expiry starts exactly one refresh call; every concurrent
//! caller becomes a waiter on its outcome. On success all waiters receive
//! the new credential (persisted before release); on failure every waiter is
//! rejected, both stored credentials are cleared, and the session notifier
//! fires exactly once.
//!
//! The caller protocol is two-phase: `wait_for_refresh()` resolves to the
//! renewed credential, then the caller rebuilds and replays its own request.
//! Replay logic stays out of the coordinator.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::core::{CredentialStore, HttpTransport, SessionNotifier};
use crate::pipeline::RequestPipeline;
use crate::types::{ClientConfig, RefreshResponse, RequestDescriptor, SessionCredentials};

/// Outcome of a failed refresh attempt. Internal to the refresh cycle;
/// callers surface their original session-expiry error instead.
#[derive(Clone, Error, Debug)]
pub enum RefreshError {
    #[error("no refresh credential available")]
    MissingRefreshCredential,

    #[error("refresh call failed: {message}")]
    RefreshCallFailed { message: String },

    #[error("refresh response carried no usable access credential")]
    InvalidAccessCredential,

    #[error("renewed credential could not be persisted: {message}")]
    PersistFailed { message: String },

    #[error("refresh settled without an outcome")]
    Interrupted,
}

type Waiter = oneshot::Sender<Result<String, RefreshError>>;

struct RefreshState {
    refreshing: bool,
    waiters: Vec<Waiter>,
}

/// Single-flight refresh coordinator. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    pipeline: Arc<RequestPipeline>,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn SessionNotifier>,
    refresh_path: String,
    min_token_len: usize,
    timeout: std::time::Duration,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    /// Create a coordinator.
    pub fn new(
        config: &ClientConfig,
        pipeline: Arc<RequestPipeline>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                pipeline,
                transport,
                store,
                notifier,
                refresh_path: config.refresh_path.clone(),
                min_token_len: config.min_token_len,
                timeout: config.timeout,
                state: Mutex::new(RefreshState {
                    refreshing: false,
                    waiters: Vec::new(),
                }),
            }),
        }
    }

    /// Wait for a renewed access credential.
    ///
    /// The first caller while idle starts the refresh; everyone else joins
    /// the waiter queue. The check-and-set happens under a single lock
    /// acquisition with no suspension point in between, so exactly one
    /// refresh call is ever in flight. The refresh itself runs on a spawned
    /// task: a caller that is cancelled mid-wait cannot abandon the queue.
    pub async fn wait_for_refresh(&self) -> Result<String, RefreshError> {
        let rx = {
            let mut state = self.inner.state.lock().await;
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            if !state.refreshing {
                state.refreshing = true;
                debug!("starting single-flight session refresh");
                tokio::spawn(Arc::clone(&self.inner).run());
            }
            rx
        };

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(RefreshError::Interrupted),
        }
    }
}

impl Inner {
    async fn run(self: Arc<Self>) {
        let outcome = self.attempt().await;

        match &outcome {
            Ok(_) => info!("session refresh succeeded"),
            Err(err) => {
                warn!(error = %err, "session refresh failed; invalidating session");
                if let Err(store_err) = self.store.clear().await {
                    warn!(error = %store_err, "failed to clear credentials after refresh failure");
                }
                self.notifier.session_invalidated();
            }
        }

        self.settle(outcome).await;
    }

    async fn attempt(&self) -> Result<String, RefreshError> {
        // Fast path: without a refresh credential there is nothing to call.
        let refresh_token = match self.store.refresh_token().await {
            Ok(Some(token)) => token,
            Ok(None) => return Err(RefreshError::MissingRefreshCredential),
            Err(err) => {
                warn!(error = %err, "refresh credential read failed");
                return Err(RefreshError::MissingRefreshCredential);
            }
        };

        // The refresh call is exempt: it must not carry the stale access
        // credential, and its failures never re-enter the expiry path.
        let descriptor = RequestDescriptor::post(self.refresh_path.clone())
            .with_body(serde_json::json!({ "refreshToken": refresh_token }))
            .with_timeout(self.timeout)
            .exempt();

        let request = self
            .pipeline
            .build(&descriptor)
            .await
            .map_err(|err| RefreshError::RefreshCallFailed {
                message: err.to_string(),
            })?;

        let response =
            self.transport
                .send(request)
                .await
                .map_err(|err| RefreshError::RefreshCallFailed {
                    message: err.to_string(),
                })?;

        if response.status != 200 {
            return Err(RefreshError::RefreshCallFailed {
                message: format!("HTTP {}", response.status),
            });
        }

        let parsed: RefreshResponse = serde_json::from_str(&response.body)
            .map_err(|_| RefreshError::InvalidAccessCredential)?;

        let token = parsed.access.token;
        if token.len() < self.min_token_len {
            return Err(RefreshError::InvalidAccessCredential);
        }

        // Persist before releasing any waiter, so a replay can only observe
        // the renewed credential.
        self.store
            .store(SessionCredentials::new(token.clone(), refresh_token))
            .await
            .map_err(|err| RefreshError::PersistFailed {
                message: err.to_string(),
            })?;

        Ok(token)
    }

    /// Drain the waiter queue exactly once, in FIFO order, and return to
    /// idle. Every waiter gets the same outcome.
    async fn settle(&self, outcome: Result<String, RefreshError>) {
        let waiters = {
            let mut state = self.state.lock().await;
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        debug!(waiters = waiters.len(), "settling refresh waiters");
        for waiter in waiters {
            // A waiter may have gone away; the rest still get their outcome.
            let _ = waiter.send(outcome.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        ClientInfo, HttpRequest, HttpResponse, MockCredentialStore, MockHttpTransport,
        StaticDeviceInfo, TransportError, TransportOutcome,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    use crate::core::CountingSessionNotifier;

    fn refresh_body(token: &str) -> serde_json::Value {
        serde_json::json!({ "access": { "token": token, "expires": "2026-12-31T00:00:00Z" } })
    }

    fn config() -> ClientConfig {
        ClientConfig {
            base_url: "https://api.example.com".to_string(),
            ..ClientConfig::default()
        }
    }

    fn device() -> Arc<StaticDeviceInfo> {
        Arc::new(StaticDeviceInfo::new(
            "device-1",
            ClientInfo {
                platform: "ios".to_string(),
                app_version: "1.0.0".to_string(),
                bundle_id: "com.example.app".to_string(),
            },
        ))
    }

    struct Fixture {
        coordinator: RefreshCoordinator,
        store: Arc<MockCredentialStore>,
        notifier: Arc<CountingSessionNotifier>,
    }

    fn fixture(transport: Arc<dyn HttpTransport>, store: MockCredentialStore) -> Fixture {
        let config = config();
        let store = Arc::new(store);
        let notifier = Arc::new(CountingSessionNotifier::new());
        let pipeline = Arc::new(
            RequestPipeline::new(&config, store.clone() as Arc<dyn CredentialStore>, device())
                .unwrap(),
        );
        let coordinator = RefreshCoordinator::new(
            &config,
            pipeline,
            transport,
            store.clone(),
            notifier.clone(),
        );
        Fixture {
            coordinator,
            store,
            notifier,
        }
    }

    /// Transport that blocks every call until released, tracking how many
    /// calls were started.
    struct GatedTransport {
        gate: Notify,
        released: std::sync::atomic::AtomicBool,
        calls: AtomicUsize,
        outcome: std::sync::Mutex<Option<TransportOutcome>>,
    }

    impl GatedTransport {
        fn new(outcome: TransportOutcome) -> Self {
            Self {
                gate: Notify::new(),
                released: std::sync::atomic::AtomicBool::new(false),
                calls: AtomicUsize::new(0),
                outcome: std::sync::Mutex::new(Some(outcome)),
            }
        }

        fn release(&self) {
            self.released.store(true, Ordering::SeqCst);
            self.gate.notify_waiters();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for GatedTransport {
        async fn send(&self, _request: HttpRequest) -> TransportOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            while !self.released.load(Ordering::SeqCst) {
                let notified = self.gate.notified();
                if self.released.load(Ordering::SeqCst) {
                    break;
                }
                notified.await;
            }
            self.outcome
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(TransportError::ConnectionFailed {
                    message: "gated transport already consumed".to_string(),
                }))
        }
    }

    #[tokio::test]
    async fn test_single_flight_many_waiters_one_call() {
        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: refresh_body("renewed-access-token-1").to_string(),
        };
        let transport = Arc::new(GatedTransport::new(Ok(response)));
        let fx = fixture(
            transport.clone(),
            MockCredentialStore::with_credentials(SessionCredentials::new(
                "stale-access-token-1",
                "refresh-token-1",
            )),
        );

        let mut handles = Vec::new();
        for _ in 0..5 {
            let coordinator = fx.coordinator.clone();
            handles.push(tokio::spawn(
                async move { coordinator.wait_for_refresh().await },
            ));
        }

        // Let every waiter enqueue while the refresh call is held open.
        tokio::task::yield_now().await;
        transport.release();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token, "renewed-access-token-1");
        }

        assert_eq!(transport.calls(), 1);
        assert_eq!(
            fx.store.access_token().await.unwrap().as_deref(),
            Some("renewed-access-token-1")
        );
        // The refresh credential survives a successful renewal.
        assert_eq!(
            fx.store.refresh_token().await.unwrap().as_deref(),
            Some("refresh-token-1")
        );
        assert_eq!(fx.notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_failure_fans_out_clears_credentials_notifies_once() {
        let transport = Arc::new(GatedTransport::new(Err(TransportError::ConnectionFailed {
            message: "connection reset".to_string(),
        })));
        let fx = fixture(
            transport.clone(),
            MockCredentialStore::with_credentials(SessionCredentials::new(
                "stale-access-token-1",
                "refresh-token-1",
            )),
        );

        let mut handles = Vec::new();
        for _ in 0..3 {
            let coordinator = fx.coordinator.clone();
            handles.push(tokio::spawn(
                async move { coordinator.wait_for_refresh().await },
            ));
        }

        tokio::task::yield_now().await;
        transport.release();

        for handle in handles {
            let outcome = handle.await.unwrap();
            assert!(matches!(
                outcome,
                Err(RefreshError::RefreshCallFailed { .. })
            ));
        }

        assert!(fx.store.access_token().await.unwrap().is_none());
        assert!(fx.store.refresh_token().await.unwrap().is_none());
        assert_eq!(fx.notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_missing_refresh_credential_skips_transport() {
        let transport = Arc::new(MockHttpTransport::new());
        let fx = fixture(transport.clone(), MockCredentialStore::new());

        let outcome = fx.coordinator.wait_for_refresh().await;
        assert!(matches!(
            outcome,
            Err(RefreshError::MissingRefreshCredential)
        ));

        // Fast path: no call to the refresh endpoint.
        assert!(transport.get_requests().is_empty());
        assert_eq!(fx.notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_short_token_is_refresh_failure() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &refresh_body("tiny"));
        let fx = fixture(
            transport,
            MockCredentialStore::with_credentials(SessionCredentials::new(
                "stale-access-token-1",
                "refresh-token-1",
            )),
        );

        let outcome = fx.coordinator.wait_for_refresh().await;
        assert!(matches!(
            outcome,
            Err(RefreshError::InvalidAccessCredential)
        ));
        assert!(fx.store.access_token().await.unwrap().is_none());
        assert_eq!(fx.notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_call_is_exempt_and_carries_refresh_token() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &refresh_body("renewed-access-token-2"));
        let fx = fixture(
            transport.clone(),
            MockCredentialStore::with_credentials(SessionCredentials::new(
                "stale-access-token-1",
                "refresh-token-1",
            )),
        );

        fx.coordinator.wait_for_refresh().await.unwrap();

        let request = transport.get_last_request().unwrap();
        assert!(request.url.ends_with("/api/v1/auth/refresh-token"));
        assert!(!request.headers.contains_key("authorization"));
        assert!(request.body.unwrap().contains("refresh-token-1"));
    }

    #[tokio::test]
    async fn test_sequential_expiries_refresh_again() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(200, &refresh_body("renewed-access-token-3"));
        transport.queue_json_response(200, &refresh_body("renewed-access-token-4"));
        let fx = fixture(
            transport.clone(),
            MockCredentialStore::with_credentials(SessionCredentials::new(
                "stale-access-token-1",
                "refresh-token-1",
            )),
        );

        let first = fx.coordinator.wait_for_refresh().await.unwrap();
        let second = fx.coordinator.wait_for_refresh().await.unwrap();

        assert_eq!(first, "renewed-access-token-3");
        assert_eq!(second, "renewed-access-token-4");
        assert_eq!(transport.get_requests().len(), 2);
    }
}
