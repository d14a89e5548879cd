//! Session lifecycle management for the authorization-code login flow.
//!
//! The manager owns three operations with real protocol weight:
//! - `start_login` - persist correlation state, build the PKCE redirect URL
//!   and navigate away (with a loop guard against redirect storms)
//! - `handle_login_response` - complete a callback after the full page
//!   reload, exchange the code for tokens, and always scrub the code/state
//!   from the visible URL
//! - `get_access_token` - hand the stored token to the API executor without
//!   ever triggering navigation itself
//!
//! Browser effects go through the [`Navigator`] trait; persistence goes
//! through the [`SessionStore`] trait. Both are injected so the state
//! machine is testable and the pending state survives a page reload.

use crate::config::OAuthClientConfig;
use crate::errors::UiError;
use crate::session::pkce;
use crate::session::redirect_state::{PendingLoginState, RedirectStateStore};
use crate::storage::{SessionStore, StoreError};
use chrono::Utc;
use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Store key for the current session document.
const SESSION_KEY: &str = "spa.session";

/// Window after a completed login during which a triggering 401 is treated
/// as systemic misconfiguration rather than a reason to redirect again.
const LOGIN_LOOP_GUARD: Duration = Duration::from_millis(250);

/// Where to send the user when the stored return location is unusable.
const DEFAULT_RETURN_LOCATION: &str = "#";

/// Connect timeout for the token-endpoint HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Browser Seam
// =============================================================================

/// The browser effects the session manager needs, and nothing more.
///
/// Production wires this to real navigation; tests record calls.
pub trait Navigator: Send + Sync {
    /// The app's current location (hash/path), used as the post-login
    /// return location.
    fn current_location(&self) -> String;

    /// Perform a full-page navigation away from the app.
    fn navigate(&self, url: &str);

    /// Replace the visible URL without navigating (history replacement).
    fn replace_url(&self, location: &str);
}

// =============================================================================
// Session Documents
// =============================================================================

/// User-display claims cached at login time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDisplayClaims {
    pub given_name: String,
    pub family_name: String,
}

/// The stored session document; absent means "not logged in".
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// The current access token.
    pub access_token: String,

    /// Display claims captured from the user info endpoint, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_claims: Option<UserDisplayClaims>,
}

impl fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSession")
            .field("access_token", &"[REDACTED]")
            .field("user_claims", &self.user_claims)
            .finish()
    }
}

/// Token endpoint response for the authorization-code grant.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
    #[allow(dead_code)]
    #[serde(default)]
    expires_in: Option<u64>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

// =============================================================================
// Session Manager
// =============================================================================

/// Orchestrates login redirects, callback completion and token storage.
pub struct SessionManager {
    config: OAuthClientConfig,
    store: Arc<dyn SessionStore>,
    redirect_state: RedirectStateStore,
    navigator: Arc<dyn Navigator>,
    http_client: reqwest::Client,
    last_login_completed: Mutex<Option<Instant>>,
}

impl SessionManager {
    /// Create a manager over injected storage and browser seams.
    ///
    /// # Errors
    ///
    /// Returns a `UiError` if the HTTP client cannot be built.
    pub fn new(
        config: OAuthClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, UiError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                UiError::unexpected("login", format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            redirect_state: RedirectStateStore::new(Arc::clone(&store)),
            store,
            navigator,
            http_client,
            last_login_completed: Mutex::new(None),
        })
    }

    /// The app's current location, for callers that need to start a login.
    #[must_use]
    pub fn current_location(&self) -> String {
        self.navigator.current_location()
    }

    /// Return the stored access token, if any.
    ///
    /// This call never triggers navigation; callers holding no token decide
    /// for themselves whether to start a login.
    #[must_use]
    pub fn get_access_token(&self) -> Option<SecretString> {
        match self.read_session() {
            Ok(Some(session)) => Some(SecretString::from(session.access_token)),
            Ok(None) => None,
            Err(e) => {
                // A corrupt store reads as "not logged in"; the next login
                // overwrites it
                tracing::warn!(target: "spa.session", error = %e, "Failed to read stored session");
                None
            }
        }
    }

    /// Whether a session document exists.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        matches!(self.read_session(), Ok(Some(_)))
    }

    /// User-display claims captured at login, when available.
    #[must_use]
    pub fn user_info(&self) -> Option<UserDisplayClaims> {
        self.read_session().ok().flatten().and_then(|s| s.user_claims)
    }

    /// Start an interactive login redirect.
    ///
    /// On the success path this navigates the browser away and returns the
    /// login-required sentinel, because page execution does not meaningfully
    /// continue past a full-page redirect.
    ///
    /// Loop guard: when a login completed within the last 250ms and this
    /// call was triggered by an API 401, the triggering error is returned
    /// instead of navigating. A fresh token that instantly earns a 401 means
    /// something is systemically wrong, and redirecting again would loop
    /// forever.
    pub fn start_login(
        &self,
        return_location: &str,
        triggering_error: Option<UiError>,
    ) -> UiError {
        if let Some(error) = triggering_error {
            if self.login_completed_within(LOGIN_LOOP_GUARD) {
                tracing::warn!(
                    target: "spa.session",
                    "API returned 401 immediately after a completed login; not redirecting again"
                );
                return error;
            }
        }

        match self.begin_redirect(return_location) {
            Ok(()) => UiError::login_required(),
            Err(e) => e,
        }
    }

    fn begin_redirect(&self, return_location: &str) -> Result<(), UiError> {
        let state = Uuid::new_v4().simple().to_string();
        let code_verifier = pkce::generate_verifier();
        let code_challenge = pkce::challenge_s256(&code_verifier);

        self.redirect_state
            .save(PendingLoginState {
                state: state.clone(),
                code_verifier,
                return_location: return_location.to_string(),
                created_at: Utc::now(),
            })
            .map_err(|e| {
                UiError::login_request_failed(format!("Failed to persist login state: {e}"))
            })?;

        let authorize_url = reqwest::Url::parse_with_params(
            &self.config.authorize_endpoint(),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.config.scope.as_str()),
                ("state", state.as_str()),
                ("code_challenge", code_challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| UiError::login_request_failed(format!("Invalid authorize URL: {e}")))?;

        tracing::info!(target: "spa.session", "Starting login redirect");
        self.navigator.navigate(authorize_url.as_str());
        Ok(())
    }

    /// Process a potential login callback. Invoked on every page load.
    ///
    /// A URL without a `state` query parameter is not a login response and
    /// returns immediately. An unrecognized `state` (foreign or replayed
    /// callback) is ignored silently. For a recognized `state` the code is
    /// exchanged for tokens, and - success or failure - the code/state are
    /// scrubbed from the visible URL so back navigation cannot replay them.
    ///
    /// # Errors
    ///
    /// Returns `login_response_failed` when the exchange fails; the URL
    /// cleanup has already run by then.
    pub async fn handle_login_response(&self, current_url: &str) -> Result<(), UiError> {
        let url = reqwest::Url::parse(current_url)
            .map_err(|e| UiError::login_response_failed(format!("Unparseable page URL: {e}")))?;

        let mut state = None;
        let mut code = None;
        let mut provider_error = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "state" => state = Some(value.into_owned()),
                "code" => code = Some(value.into_owned()),
                "error" => provider_error = Some(value.into_owned()),
                _ => {}
            }
        }

        // Not a login response
        let Some(state) = state else {
            return Ok(());
        };

        // Unknown state: a foreign or replayed callback. Leave the page alone.
        let consumed = self
            .redirect_state
            .consume(&state)
            .map_err(|e| UiError::login_response_failed(format!("Login state lookup failed: {e}")))?;
        let Some(entry) = consumed else {
            tracing::debug!(
                target: "spa.session",
                "Ignoring login callback with unrecognized state"
            );
            return Ok(());
        };

        let outcome = match (provider_error, code) {
            (Some(error), _) => Err(UiError::login_response_failed(format!(
                "Authorization server returned error {error}"
            ))),
            (None, None) => Err(UiError::login_response_failed(
                "Login callback carried no authorization code",
            )),
            (None, Some(code)) => self.complete_login(&code, &entry.code_verifier).await,
        };

        // Cleanup runs whether the exchange succeeded or failed: the code
        // and state must not remain in the address bar or browser history
        let restored_location = match &outcome {
            Ok(()) if !entry.return_location.is_empty() => entry.return_location.as_str(),
            _ => DEFAULT_RETURN_LOCATION,
        };
        self.navigator.replace_url(restored_location);

        outcome
    }

    async fn complete_login(&self, code: &str, code_verifier: &str) -> Result<(), UiError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http_client
            .post(self.config.token_endpoint())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                UiError::login_response_failed(format!("Token request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            // Body detail stays at trace level so grant errors can't leak
            // into ordinary logs
            tracing::trace!(target: "spa.session", body = %body, "Token endpoint error body");
            return Err(UiError::login_response_failed(format!(
                "Token endpoint returned status {status}"
            )));
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| {
            UiError::login_response_failed(format!("Invalid token response: {e}"))
        })?;

        // Display claims are a nicety; their absence never fails the login
        let user_claims = self.fetch_user_info(&tokens.access_token).await;

        self.write_session(&StoredSession {
            access_token: tokens.access_token,
            user_claims,
        })
        .map_err(|e| UiError::login_response_failed(format!("Failed to store session: {e}")))?;

        if let Ok(mut completed) = self.last_login_completed.lock() {
            *completed = Some(Instant::now());
        }

        tracing::info!(target: "spa.session", "Login completed");
        Ok(())
    }

    async fn fetch_user_info(&self, access_token: &str) -> Option<UserDisplayClaims> {
        let response = self
            .http_client
            .get(self.config.userinfo_endpoint())
            .bearer_auth(access_token)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            tracing::debug!(
                target: "spa.session",
                status = %response.status(),
                "User info request rejected"
            );
            return None;
        }

        let claims: serde_json::Value = response.json().await.ok()?;
        match (
            claims.get("given_name").and_then(|v| v.as_str()),
            claims.get("family_name").and_then(|v| v.as_str()),
        ) {
            (Some(given_name), Some(family_name)) => Some(UserDisplayClaims {
                given_name: given_name.to_string(),
                family_name: family_name.to_string(),
            }),
            _ => None,
        }
    }

    /// Remove the stored session, returning to the logged-out state.
    ///
    /// # Errors
    ///
    /// Returns a `UiError` if the store cannot be written.
    pub fn clear_session(&self) -> Result<(), UiError> {
        self.store
            .remove(SESSION_KEY)
            .map_err(|e| UiError::unexpected("login", format!("Failed to clear session: {e}")))
    }

    /// Test tooling: corrupt the stored token's signature bytes so the next
    /// server-side validation fails with a 401, without clearing local
    /// session state.
    ///
    /// # Errors
    ///
    /// Returns a `UiError` if the store cannot be read or written.
    pub fn expire_access_token(&self) -> Result<(), UiError> {
        let session = self
            .read_session()
            .map_err(|e| UiError::unexpected("login", format!("Failed to read session: {e}")))?;

        if let Some(mut session) = session {
            session.access_token.push('x');
            self.write_session(&session).map_err(|e| {
                UiError::unexpected("login", format!("Failed to store session: {e}"))
            })?;
        }

        Ok(())
    }

    fn login_completed_within(&self, window: Duration) -> bool {
        self.last_login_completed
            .lock()
            .ok()
            .and_then(|completed| *completed)
            .is_some_and(|at| at.elapsed() < window)
    }

    fn read_session(&self) -> Result<Option<StoredSession>, StoreError> {
        match self.store.get(SESSION_KEY)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
        }
    }

    fn write_session(&self, session: &StoredSession) -> Result<(), StoreError> {
        let raw = serde_json::to_string(session)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.put(SESSION_KEY, &raw)
    }
}

// =============================================================================
// Tests
// =============================================================================
