use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default timeout for token-endpoint and API requests.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default scope requested at login.
const DEFAULT_SCOPE: &str = "openid profile";

/// OAuth configuration for the client application.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    /// Base URL of the authorization server.
    pub authority: String,

    /// OAuth client id.
    pub client_id: String,

    /// Redirect URI registered for the authorization-code flow.
    pub redirect_uri: String,

    /// Space-separated scope string requested at login.
    pub scope: String,

    /// Base URL of the protected API.
    pub api_base_url: String,

    /// Timeout applied to token-endpoint and API requests.
    pub http_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid duration value for {0}")]
    InvalidDuration(String),
}

impl OAuthClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let authority = require(vars, "SPA_AUTHORITY")?;
        let client_id = require(vars, "SPA_CLIENT_ID")?;
        let redirect_uri = require(vars, "SPA_REDIRECT_URI")?;
        let api_base_url = require(vars, "SPA_API_BASE_URL")?;

        let scope = vars
            .get("SPA_SCOPE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        let http_timeout = match vars.get("SPA_HTTP_TIMEOUT_SECONDS") {
            None => DEFAULT_HTTP_TIMEOUT,
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidDuration("SPA_HTTP_TIMEOUT_SECONDS".to_string()))?,
        };

        Ok(OAuthClientConfig {
            authority,
            client_id,
            redirect_uri,
            scope,
            api_base_url,
            http_timeout,
        })
    }

    /// The authorization endpoint used for login redirects.
    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/authorize", self.authority.trim_end_matches('/'))
    }

    /// The token endpoint used for the authorization-code exchange.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.authority.trim_end_matches('/'))
    }

    /// The user info endpoint queried after login for display claims.
    #[must_use]
    pub fn userinfo_endpoint(&self) -> String {
        format!("{}/userinfo", self.authority.trim_end_matches('/'))
    }
}

fn require(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}
