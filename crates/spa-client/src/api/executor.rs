//! API request execution with bearer tokens and 401 handling.
//!
//! The executor attaches the stored access token to outgoing calls. With no
//! token it returns the login-required sentinel without touching the
//! network; on a 401 it delegates to the session manager's `start_login`
//! exactly once, which by contract navigates away (or, in the loop-guard
//! case, hands the original error back).

use crate::errors::UiError;
use crate::session::SessionManager;
use common::secret::ExposeSecret;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Connect timeout for the API HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Executes API calls on behalf of the UI.
pub struct ApiRequestExecutor {
    api_base_url: String,
    session: Arc<SessionManager>,
    http_client: reqwest::Client,
}

impl ApiRequestExecutor {
    /// Create an executor for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns a `UiError` if the HTTP client cannot be built.
    pub fn new(
        api_base_url: &str,
        http_timeout: Duration,
        session: Arc<SessionManager>,
    ) -> Result<Self, UiError> {
        let http_client = reqwest::Client::builder()
            .timeout(http_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                UiError::unexpected("web api", format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            session,
            http_client,
        })
    }

    /// GET a JSON document from the API.
    ///
    /// # Errors
    ///
    /// See [`ApiRequestExecutor::call`].
    pub async fn get(&self, path: &str) -> Result<Value, UiError> {
        self.call(Method::GET, path, None).await
    }

    /// Execute an API call with the stored access token attached.
    ///
    /// # Errors
    ///
    /// - The login-required sentinel when no token is stored (no network
    ///   call is made) or after a 401 has started a login redirect
    /// - The original classified 401 error in the loop-guard case
    /// - A classified `UiError` for any other failure
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, UiError> {
        // No token: a login is either already pending or must be started by
        // the caller. Signalled without any network call.
        let Some(token) = self.session.get_access_token() else {
            tracing::debug!(target: "spa.api", "No access token; signalling login required");
            return Err(UiError::login_required());
        };

        let url = format!("{}/{}", self.api_base_url, path.trim_start_matches('/'));

        match self.send(method, &url, body, token.expose_secret()).await {
            Ok(value) => Ok(value),
            Err(error) if error.status() == Some(401) => {
                tracing::info!(
                    target: "spa.api",
                    "API rejected the access token; delegating to login"
                );
                // By contract this navigates away and returns the sentinel,
                // except in the loop-guard case where the original error
                // comes back
                Err(self
                    .session
                    .start_login(&self.session.current_location(), Some(error)))
            }
            Err(error) => Err(error),
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        access_token: &str,
    ) -> Result<Value, UiError> {
        let mut request = self
            .http_client
            .request(method, url)
            .bearer_auth(access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(target: "spa.api", error = %e, "API request failed to send");
            UiError::from_network_error(url, e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| {
                UiError::from_network_error(url, format!("Invalid JSON response: {e}"))
            });
        }

        let error_body: Value = response.json().await.unwrap_or(Value::Null);
        Err(UiError::from_api_response(status.as_u16(), &error_body, url))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::OAuthClientConfig;
    use crate::session::Navigator;
    use crate::storage::{MemoryStore, SessionStore};
    use std::sync::Mutex;
    use wiremock::matchers::{header, method as http_method, path as http_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct FakeNavigator {
        navigations: Mutex<Vec<String>>,
    }

    impl FakeNavigator {
        fn navigation_count(&self) -> usize {
            self.navigations.lock().unwrap().len()
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

    struct Harness {
        executor: ApiRequestExecutor,
        navigator: Arc<FakeNavigator>,
        store: Arc<MemoryStore>,
    }

    fn harness(api_base_url: &str) -> Harness {
        let config = OAuthClientConfig {
            authority: "https://login.example.com".to_string(),
            client_id: "spa-client".to_string(),
            redirect_uri: "https://app.example.com/".to_string(),
            scope: "openid profile".to_string(),
            api_base_url: api_base_url.to_string(),
            http_timeout: Duration::from_millis(500),
        };
        let store = Arc::new(MemoryStore::new());
        let navigator = Arc::new(FakeNavigator::default());
        let session = Arc::new(
            SessionManager::new(
                config,
                Arc::clone(&store) as Arc<dyn SessionStore>,
                Arc::clone(&navigator) as Arc<dyn Navigator>,
            )
            .unwrap(),
        );
        let executor =
            ApiRequestExecutor::new(api_base_url, Duration::from_millis(500), session).unwrap();

        Harness {
            executor,
            navigator,
            store,
        }
    }

    fn store_session(h: &Harness, token: &str) {
        h.store
            .put("spa.session", &format!(r#"{{"access_token":"{token}"}}"#))
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_token_signals_login_required_without_network() {
        let mock_server = MockServer::start().await;
        // Any request reaching the server would violate the expect(0)
        Mock::given(http_method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let h = harness(&mock_server.uri());

        let error = h.executor.get("companies").await.unwrap_err();
        assert!(error.is_login_required());
    }

    #[tokio::test]
    async fn test_success_attaches_bearer_and_returns_json() {
        let mock_server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(http_path("/companies"))
            .and(header("authorization", "Bearer stored-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 1}])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let h = harness(&mock_server.uri());
        store_session(&h, "stored-token");

        let body = h.executor.get("companies").await.unwrap();
        assert_eq!(body[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_401_delegates_to_start_login_once() {
        let mock_server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(http_path("/companies"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": "invalid_token",
                "message": "Missing, invalid or expired access token"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let h = harness(&mock_server.uri());
        store_session(&h, "expired-token");

        let error = h.executor.get("companies").await.unwrap_err();

        // The redirect started (sentinel returned, navigation recorded);
        // the call was made exactly once, never silently retried
        assert!(error.is_login_required());
        assert_eq!(h.navigator.navigation_count(), 1);
    }

    #[tokio::test]
    async fn test_non_401_failure_is_classified_and_returned() {
        let mock_server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(http_path("/companies"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "code": "server_error",
                "message": "An unexpected exception occurred in the API",
                "correlationId": "b2c1d3e4-aaaa-bbbb-cccc-121314151617",
                "utcTime": "2025-03-01T10:30:00+00:00"
            })))
            .mount(&mock_server)
            .await;

        let h = harness(&mock_server.uri());
        store_session(&h, "stored-token");

        let error = h.executor.get("companies").await.unwrap_err();

        assert_eq!(error.code(), "server_error");
        assert_eq!(error.status(), Some(500));
        assert_eq!(
            error.correlation_id(),
            Some("b2c1d3e4-aaaa-bbbb-cccc-121314151617")
        );
        // No redirect for server faults
        assert_eq!(h.navigator.navigation_count(), 0);
    }

    #[tokio::test]
    async fn test_404_is_classified_with_api_code() {
        let mock_server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(http_path("/companies/999"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "code": "request_not_found",
                "message": "An API request was sent to a route that does not exist"
            })))
            .mount(&mock_server)
            .await;

        let h = harness(&mock_server.uri());
        store_session(&h, "stored-token");

        let error = h.executor.get("companies/999").await.unwrap_err();
        assert_eq!(error.code(), "request_not_found");
        assert_eq!(error.status(), Some(404));
    }

    #[tokio::test]
    async fn test_network_failure_is_classified() {
        // Nothing is listening on this port
        let h = harness("http://127.0.0.1:1");
        store_session(&h, "stored-token");

        let error = h.executor.get("companies").await.unwrap_err();
        assert_eq!(error.code(), "api_network_error");
        assert_eq!(error.status(), None);
    }

    #[tokio::test]
    async fn test_loop_guard_returns_original_error() {
        let mock_server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(http_path("/companies"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": "invalid_token",
                "message": "Missing, invalid or expired access token"
            })))
            .mount(&mock_server)
            .await;
        Mock::given(http_method("POST"))
            .and(http_path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-but-still-rejected",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&mock_server)
            .await;

        // Authority and API share the mock server so the login completion
        // can run against /token
        let config = OAuthClientConfig {
            authority: mock_server.uri(),
            client_id: "spa-client".to_string(),
            redirect_uri: "https://app.example.com/".to_string(),
            scope: "openid profile".to_string(),
            api_base_url: mock_server.uri(),
            http_timeout: Duration::from_millis(500),
        };
        let store = Arc::new(MemoryStore::new());
        let navigator = Arc::new(FakeNavigator::default());
        let session = Arc::new(
            SessionManager::new(
                config,
                Arc::clone(&store) as Arc<dyn SessionStore>,
                Arc::clone(&navigator) as Arc<dyn Navigator>,
            )
            .unwrap(),
        );
        let executor = ApiRequestExecutor::new(
            &mock_server.uri(),
            Duration::from_millis(500),
            Arc::clone(&session),
        )
        .unwrap();

        // Complete a login so the loop guard window is active
        session.start_login("#/companies", None);
        let authorize_url = navigator.navigations.lock().unwrap().pop().unwrap();
        let state = reqwest::Url::parse(&authorize_url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        session
            .handle_login_response(&format!(
                "https://app.example.com/?code=auth-code&state={state}"
            ))
            .await
            .unwrap();

        // The API 401s immediately after the completed login: the original
        // classified error is rethrown instead of redirecting again
        let error = executor.get("companies").await.unwrap_err();
        assert_eq!(error.code(), "invalid_token");
        assert!(!error.is_login_required());
        assert_eq!(navigator.navigation_count(), 1); // only the first redirect
    }
}
