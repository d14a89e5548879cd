use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default timeout for JWKS download requests.
const DEFAULT_JWKS_TIMEOUT: Duration = Duration::from_secs(10);

/// Default window during which a completed JWKS refresh suppresses further
/// refreshes for key ids that are still unknown.
const DEFAULT_JWKS_REFRESH_WINDOW: Duration = Duration::from_secs(10);

/// OAuth configuration for the resource server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// URL of the authorization server's JWKS document.
    pub jwks_endpoint: String,

    /// Expected `iss` claim value (exact match).
    pub issuer: String,

    /// Expected `aud` claim value; audience validation is skipped when unset.
    pub audience: Option<String>,

    /// Signing algorithms accepted during verification.
    pub algorithms: Vec<Algorithm>,

    /// Optional outbound proxy URL for JWKS downloads.
    pub outbound_proxy: Option<String>,

    /// Timeout applied to each JWKS download request.
    pub jwks_timeout: Duration,

    /// See [`DEFAULT_JWKS_REFRESH_WINDOW`].
    pub jwks_refresh_window: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported signing algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("Invalid duration value for {0}")]
    InvalidDuration(String),
}

impl OAuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwks_endpoint = vars
            .get("OAUTH_JWKS_ENDPOINT")
            .ok_or_else(|| ConfigError::MissingEnvVar("OAUTH_JWKS_ENDPOINT".to_string()))?
            .clone();

        let issuer = vars
            .get("OAUTH_ISSUER")
            .ok_or_else(|| ConfigError::MissingEnvVar("OAUTH_ISSUER".to_string()))?
            .clone();

        let audience = vars.get("OAUTH_AUDIENCE").cloned().filter(|a| !a.is_empty());

        let algorithms = vars
            .get("OAUTH_ALGORITHMS")
            .ok_or_else(|| ConfigError::MissingEnvVar("OAUTH_ALGORITHMS".to_string()))?
            .split_whitespace()
            .map(|name| {
                Algorithm::from_str(name).map_err(|_| ConfigError::InvalidAlgorithm(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if algorithms.is_empty() {
            return Err(ConfigError::InvalidAlgorithm("<empty>".to_string()));
        }

        let outbound_proxy = vars.get("OAUTH_OUTBOUND_PROXY").cloned();

        let jwks_timeout = parse_secs(vars, "OAUTH_JWKS_TIMEOUT_SECONDS", DEFAULT_JWKS_TIMEOUT)?;
        let jwks_refresh_window = parse_secs(
            vars,
            "OAUTH_JWKS_REFRESH_WINDOW_SECONDS",
            DEFAULT_JWKS_REFRESH_WINDOW,
        )?;

        Ok(OAuthConfig {
            jwks_endpoint,
            issuer,
            audience,
            algorithms,
            outbound_proxy,
            jwks_timeout,
            jwks_refresh_window,
        })
    }
}

fn parse_secs(
    vars: &HashMap<String, String>,
    name: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidDuration(name.to_string())),
    }
}
