//! JWKS key provider with a single-flight refresh cache.
//!
//! Signing keys are fetched from the authorization server's JWKS endpoint on
//! first reference and cached by key id. A cache miss triggers at most one
//! refresh per unseen key id per fetch window; concurrent misses collapse to
//! a single in-flight download.
//!
//! Failure classification matters downstream: a key id that is still absent
//! after a refresh is a *token* problem ([`JwksError::UnknownKey`], a 401),
//! while network failures, timeouts and malformed documents are *download*
//! problems ([`JwksError::Download`], a 500).

use crate::config::OAuthConfig;
use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::{JwkSet, KeyAlgorithm};
use jsonwebtoken::DecodingKey;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Connect timeout for the JWKS HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors produced by key resolution.
#[derive(Error, Debug, Clone)]
pub enum JwksError {
    /// The JWKS document could not be downloaded or parsed.
    #[error("JWKS download failed: {0}")]
    Download(String),

    /// The JWKS document downloaded fine but does not publish this key id.
    #[error("Token signing key {0} was not found in the JWKS document")]
    UnknownKey(String),

    /// The HTTP client could not be constructed.
    #[error("JWKS client configuration error: {0}")]
    Configuration(String),
}

/// A signing key resolved from the JWKS document.
#[derive(Clone)]
pub struct CachedKey {
    /// Parsed public key material ready for signature verification.
    pub decoding_key: DecodingKey,

    /// The algorithm the JWKS document declares for this key, when present.
    pub algorithm: Option<KeyAlgorithm>,

    /// When this entry was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Tracks refresh completion so unknown key ids cannot force repeated
/// downloads within the fetch window.
struct RefreshState {
    last_completed: Option<Instant>,
}

/// Fetches and caches signing keys from a remote JWKS endpoint.
///
/// Reads are lock-free with respect to fetching: the key cache is behind a
/// `RwLock` for unlimited concurrent readers, and a separate mutex
/// serializes refreshes so concurrent misses await one in-flight download.
pub struct JwksKeyProvider {
    jwks_endpoint: String,
    refresh_window: Duration,
    http_client: reqwest::Client,
    keys: RwLock<HashMap<String, CachedKey>>,
    refresh: Mutex<RefreshState>,
}

impl JwksKeyProvider {
    /// Build a provider from OAuth configuration.
    ///
    /// The HTTP client carries the configured request timeout and, when
    /// configured, routes downloads through the outbound proxy.
    ///
    /// # Errors
    ///
    /// Returns `JwksError::Configuration` if the proxy URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &OAuthConfig) -> Result<Self, JwksError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.jwks_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT);

        if let Some(proxy_url) = &config.outbound_proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| JwksError::Configuration(format!("Invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let http_client = builder
            .build()
            .map_err(|e| JwksError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            jwks_endpoint: config.jwks_endpoint.clone(),
            refresh_window: config.jwks_refresh_window,
            http_client,
            keys: RwLock::new(HashMap::new()),
            refresh: Mutex::new(RefreshState {
                last_completed: None,
            }),
        })
    }

    /// Resolve the signing key for a key id.
    ///
    /// Cached key ids return immediately without network I/O. A miss
    /// performs exactly one JWKS refresh; if the key id is still absent
    /// afterwards the token referenced a key the authorization server does
    /// not publish.
    ///
    /// # Errors
    ///
    /// - `UnknownKey` - the key id is absent from a freshly-fetched document
    /// - `Download` - the document could not be fetched or parsed
    pub async fn get_key(&self, kid: &str) -> Result<CachedKey, JwksError> {
        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        // Serialize refreshes. Everyone who missed while a download was in
        // flight queues here and re-checks the cache before fetching again.
        let mut refresh = self.refresh.lock().await;

        if let Some(key) = self.keys.read().await.get(kid) {
            return Ok(key.clone());
        }

        // A refresh that completed within the window and still did not
        // produce this kid will not produce it now either; fail as an
        // unknown key instead of hammering the endpoint.
        if let Some(completed) = refresh.last_completed {
            if completed.elapsed() < self.refresh_window {
                tracing::debug!(
                    target: "rs.auth.jwks",
                    kid,
                    "Key id still unknown after recent refresh"
                );
                return Err(JwksError::UnknownKey(kid.to_string()));
            }
        }

        self.refresh_keys().await?;
        refresh.last_completed = Some(Instant::now());
        drop(refresh);

        match self.keys.read().await.get(kid) {
            Some(key) => Ok(key.clone()),
            None => {
                tracing::debug!(
                    target: "rs.auth.jwks",
                    kid,
                    "Key id not present in refreshed JWKS document"
                );
                Err(JwksError::UnknownKey(kid.to_string()))
            }
        }
    }

    /// Download the JWKS document and replace the cache contents with it.
    async fn refresh_keys(&self) -> Result<(), JwksError> {
        tracing::debug!(
            target: "rs.auth.jwks",
            endpoint = %self.jwks_endpoint,
            "Downloading JWKS document"
        );

        let response = self
            .http_client
            .get(&self.jwks_endpoint)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(target: "rs.auth.jwks", error = %e, "JWKS request failed");
                JwksError::Download(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                target: "rs.auth.jwks",
                status = %status,
                "JWKS endpoint returned an error status"
            );
            return Err(JwksError::Download(format!(
                "JWKS endpoint returned status {status}"
            )));
        }

        let jwk_set: JwkSet = response.json().await.map_err(|e| {
            tracing::warn!(target: "rs.auth.jwks", error = %e, "Failed to parse JWKS document");
            JwksError::Download(format!("Malformed JWKS document: {e}"))
        })?;

        let fetched_at = Utc::now();
        let mut fresh = HashMap::new();

        for jwk in &jwk_set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };

            match DecodingKey::from_jwk(jwk) {
                Ok(decoding_key) => {
                    fresh.insert(
                        kid,
                        CachedKey {
                            decoding_key,
                            algorithm: jwk.common.key_algorithm,
                            fetched_at,
                        },
                    );
                }
                Err(e) => {
                    // Documents may publish keys for other purposes; skip
                    // anything that is not usable for verification
                    tracing::debug!(
                        target: "rs.auth.jwks",
                        kid = %kid,
                        error = %e,
                        "Skipping unusable JWKS entry"
                    );
                }
            }
        }

        tracing::debug!(
            target: "rs.auth.jwks",
            key_count = fresh.len(),
            "JWKS cache refreshed"
        );

        *self.keys.write().await = fresh;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
