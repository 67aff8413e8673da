//! End-to-end tests of the full client stack over real HTTP, using the
//! reqwest transport against a wiremock server.

use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mobile_api_client::{
    client_config, ApiClient, ApiClientError, ClientInfo, CountingSessionNotifier,
    InMemoryCredentialStore, CredentialStore, SessionCredentials, StaticDeviceInfo,
};

const STALE_TOKEN: &str = "stale-access-token-0001";
const RENEWED_TOKEN: &str = "renewed-access-token-0001";

async fn build_client(
    server: &MockServer,
    store: Arc<InMemoryCredentialStore>,
    notifier: Arc<CountingSessionNotifier>,
) -> ApiClient {
    let config = client_config().base_url(server.uri()).build().unwrap();

    ApiClient::with_default_transport(
        config,
        store,
        Arc::new(StaticDeviceInfo::new(
            "device-1",
            ClientInfo {
                platform: "android".to_string(),
                app_version: "2.0.0".to_string(),
                bundle_id: "com.example.app".to_string(),
            },
        )),
        notifier,
    )
    .unwrap()
}

#[derive(Debug, serde::Deserialize)]
struct Profile {
    name: String,
}

#[tokio::test]
async fn get_attaches_credential_and_metadata_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/profile"))
        .and(header("authorization", format!("Bearer {STALE_TOKEN}").as_str()))
        .and(header("x-device-id", "device-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Ada"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::with_credentials(
        SessionCredentials::new(STALE_TOKEN, "refresh-token-0001"),
    ));
    let notifier = Arc::new(CountingSessionNotifier::new());
    let client = build_client(&server, store, notifier).await;

    let profile: Option<Profile> = client.get("/profile", &[]).await.unwrap();
    assert_eq!(profile.unwrap().name, "Ada");
}

#[tokio::test]
async fn expired_credential_refreshes_and_replays_over_http() {
    let server = MockServer::start().await;

    // The stale credential is rejected; the renewed one is accepted. Header
    // matching keeps this order-independent.
    Mock::given(method("GET"))
        .and(path("/api/v1/profile"))
        .and(header("authorization", format!("Bearer {STALE_TOKEN}").as_str()))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"code": "TOKEN_EXPIRED"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/profile"))
        .and(header("authorization", format!("Bearer {RENEWED_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Ada"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh-token"))
        .and(body_json(serde_json::json!({"refreshToken": "refresh-token-0001"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": {"token": RENEWED_TOKEN, "expires": "2026-12-31T00:00:00Z"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::with_credentials(
        SessionCredentials::new(STALE_TOKEN, "refresh-token-0001"),
    ));
    let notifier = Arc::new(CountingSessionNotifier::new());
    let client = build_client(&server, store.clone(), notifier.clone()).await;

    let profile: Option<Profile> = client.get("/profile", &[]).await.unwrap();
    assert_eq!(profile.unwrap().name, "Ada");

    assert_eq!(
        store.access_token().await.unwrap().as_deref(),
        Some(RENEWED_TOKEN)
    );
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn server_failure_passes_application_code_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/transfers"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "code": "INSUFFICIENT_FUNDS",
            "message": "balance too low"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::with_credentials(
        SessionCredentials::new(STALE_TOKEN, "refresh-token-0001"),
    ));
    let notifier = Arc::new(CountingSessionNotifier::new());
    let client = build_client(&server, store, notifier).await;

    let err = client
        .post::<Profile, _>("/transfers", Some(&serde_json::json!({"amount": 100})))
        .await
        .unwrap_err();

    match err {
        ApiClientError::Server(server_err) => {
            assert_eq!(server_err.status, 422);
            assert_eq!(server_err.code.as_deref(), Some("INSUFFICIENT_FUNDS"));
            assert_eq!(server_err.message.as_deref(), Some("balance too low"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
}
