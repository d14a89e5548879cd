//! Cross-crate round-trip flows.
//!
//! These tests wire the full data path together: the client completes a
//! login against a mock authorization server that issues real signed
//! tokens, and the resource server validates what the client stored -
//! including the forced-expiry corruption round trip and the 401-driven
//! redirect cycle against a live in-process API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::extract::Extension;
use axum::routing::get;
use axum::{Json, Router};
use common::secret::ExposeSecret;
use jsonwebtoken::Algorithm;
use rs_service::auth::{ClaimsPrincipal, JwksKeyProvider, TokenValidator};
use rs_service::config::OAuthConfig;
use rs_service::errors::ApiError;
use rs_test_utils::{mount_jwks_endpoint, test_signing_key, TestSigningKey, TestTokenBuilder};
use spa_client::api::ApiRequestExecutor;
use spa_client::config::OAuthClientConfig;
use spa_client::session::{Navigator, SessionManager};
use spa_client::storage::{MemoryStore, SessionStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISSUER: &str = "https://login.example.com";
const KID: &str = "round-trip-key";

#[derive(Default)]
struct FakeNavigator {
    navigations: Mutex<Vec<String>>,
}

impl FakeNavigator {
    fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

impl Navigator for FakeNavigator {
    fn current_location(&self) -> String {
        "#/companies".to_string()
    }

    fn navigate(&self, url: &str) {
        self.navigations.lock().unwrap().push(url.to_string());
    }

    fn replace_url(&self, _location: &str) {}
}

/// Mount an authorization server that issues a real signed JWT.
async fn mount_authorization_server(server: &MockServer, key: &TestSigningKey) -> String {
    let access_token = TestTokenBuilder::new()
        .for_user("alice")
        .with_scope("openid profile transactions_read")
        .with_issuer(ISSUER)
        .with_client_id("spa-client")
        .sign(KID, key)
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;

    access_token
}

fn client_session(authority: &str, api_base_url: &str) -> (Arc<SessionManager>, Arc<FakeNavigator>) {
    let config = OAuthClientConfig {
        authority: authority.to_string(),
        client_id: "spa-client".to_string(),
        redirect_uri: "https://app.example.com/".to_string(),
        scope: "openid profile transactions_read".to_string(),
        api_base_url: api_base_url.to_string(),
        http_timeout: Duration::from_millis(500),
    };
    let navigator = Arc::new(FakeNavigator::default());
    let manager = SessionManager::new(
        config,
        Arc::new(MemoryStore::new()) as Arc<dyn SessionStore>,
        Arc::clone(&navigator) as Arc<dyn Navigator>,
    )
    .unwrap();
    (Arc::new(manager), navigator)
}

fn server_validator(jwks_endpoint: &str) -> TokenValidator {
    let config = OAuthConfig {
        jwks_endpoint: jwks_endpoint.to_string(),
        issuer: ISSUER.to_string(),
        audience: None,
        algorithms: vec![Algorithm::EdDSA],
        outbound_proxy: None,
        jwks_timeout: Duration::from_millis(500),
        jwks_refresh_window: Duration::from_secs(10),
    };
    let provider = Arc::new(JwksKeyProvider::new(&config).unwrap());
    TokenValidator::new(config, provider)
}

/// Drive the client through a complete login against the mock server.
async fn complete_login(session: &SessionManager, navigator: &FakeNavigator) {
    let sentinel = session.start_login("#/companies", None);
    assert!(sentinel.is_login_required());

    let authorize_url = navigator.navigations().pop().unwrap();
    let state = state_param(&authorize_url);

    session
        .handle_login_response(&format!(
            "https://app.example.com/?code=auth-code&state={state}"
        ))
        .await
        .expect("login should complete");
}

fn state_param(url: &str) -> String {
    url.split("state=")
        .nth(1)
        .unwrap()
        .split('&')
        .next()
        .unwrap()
        .to_string()
}

async fn whoami(Extension(principal): Extension<ClaimsPrincipal>) -> Json<ClaimsPrincipal> {
    Json(principal)
}

/// Serve a bearer-protected API on an ephemeral local port.
async fn spawn_protected_api(jwks_endpoint: &str) -> String {
    let validator = Arc::new(server_validator(jwks_endpoint));
    let app = rs_service::routes::protect(Router::new().route("/companies", get(whoami)), validator);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_client_login_token_validates_on_server() {
    let mock_server = MockServer::start().await;
    let key = test_signing_key(40).unwrap();
    mount_jwks_endpoint(&mock_server, &[(KID, &key)], 1).await;
    mount_authorization_server(&mock_server, &key).await;

    let (session, navigator) = client_session(&mock_server.uri(), "https://api.example.com");
    complete_login(&session, &navigator).await;

    // What the client stored is exactly what the server can verify
    let token = session.get_access_token().unwrap();
    let validator = server_validator(&format!("{}/.well-known/jwks.json", mock_server.uri()));

    let principal = validator
        .validate(Some(&format!("Bearer {}", token.expose_secret())))
        .await
        .expect("stored token should validate");

    assert_eq!(principal.subject(), "alice");
    assert_eq!(
        principal.scopes(),
        ["openid", "profile", "transactions_read"]
    );
    assert_eq!(principal.client_id(), Some("spa-client"));
}

#[tokio::test]
async fn test_expired_token_fails_validation_with_401() {
    let mock_server = MockServer::start().await;
    let key = test_signing_key(41).unwrap();
    mount_jwks_endpoint(&mock_server, &[(KID, &key)], 1).await;
    mount_authorization_server(&mock_server, &key).await;

    let (session, navigator) = client_session(&mock_server.uri(), "https://api.example.com");
    complete_login(&session, &navigator).await;

    // Corrupt the signature bytes without clearing local session state
    session.expire_access_token().unwrap();
    assert!(session.is_logged_in());

    let token = session.get_access_token().unwrap();
    let validator = server_validator(&format!("{}/.well-known/jwks.json", mock_server.uri()));

    match validator
        .validate(Some(&format!("Bearer {}", token.expose_secret())))
        .await
    {
        Err(ApiError::Client(e)) => assert_eq!(e.status().as_u16(), 401),
        Err(ApiError::Server(_)) => panic!("corrupted token must be a 401, not a 500"),
        Ok(_) => panic!("corrupted token must not validate"),
    }
}

#[tokio::test]
async fn test_full_cycle_against_live_api() {
    let mock_server = MockServer::start().await;
    let key = test_signing_key(42).unwrap();
    mount_jwks_endpoint(&mock_server, &[(KID, &key)], 1).await;
    mount_authorization_server(&mock_server, &key).await;

    let api_base_url =
        spawn_protected_api(&format!("{}/.well-known/jwks.json", mock_server.uri())).await;

    let (session, navigator) = client_session(&mock_server.uri(), &api_base_url);
    complete_login(&session, &navigator).await;

    let executor = ApiRequestExecutor::new(
        &api_base_url,
        Duration::from_millis(500),
        Arc::clone(&session),
    )
    .unwrap();

    // Authenticated call flows through middleware to the handler
    let body = executor.get("companies").await.unwrap();
    assert_eq!(body["subject"], "alice");

    // Let the 250ms post-login loop-guard window lapse so the 401 below is
    // treated as a genuine session expiry, not a redirect storm
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Forced expiry: the next call earns a 401 from the real validator and
    // the executor reacts by starting a login redirect
    session.expire_access_token().unwrap();
    let navigations_before = navigator.navigations().len();

    let error = executor.get("companies").await.unwrap_err();
    assert!(error.is_login_required());
    assert_eq!(navigator.navigations().len(), navigations_before + 1);
}

#[tokio::test]
async fn test_api_500_surfaces_correlation_id_to_client() {
    // JWKS endpoint is unreachable: the API must answer 500 with a
    // correlation id, and the client must adopt it rather than redirect
    let api_base_url = spawn_protected_api("http://127.0.0.1:1/.well-known/jwks.json").await;

    let mock_server = MockServer::start().await;
    let key = test_signing_key(43).unwrap();
    mount_authorization_server(&mock_server, &key).await;

    let (session, navigator) = client_session(&mock_server.uri(), &api_base_url);
    complete_login(&session, &navigator).await;

    let executor = ApiRequestExecutor::new(
        &api_base_url,
        Duration::from_millis(500),
        Arc::clone(&session),
    )
    .unwrap();

    let error = executor.get("companies").await.unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert_eq!(error.code(), "jwks_download_error");
    assert!(error.correlation_id().is_some());
    // Server faults never trigger a redirect
    assert_eq!(navigator.navigations().len(), 1); // only the original login
}
