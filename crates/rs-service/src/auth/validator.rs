//! JWT validation using keys resolved through the JWKS provider.

use crate::auth::claims::ClaimsPrincipal;
use crate::auth::jwks::{JwksError, JwksKeyProvider};
use crate::config::OAuthConfig;
use crate::errors::{ApiError, ClientError, ServerError};
use common::jwt::TokenClaims;
use jsonwebtoken::Validation;
use std::sync::Arc;

/// Validates bearer tokens and produces claims principals.
///
/// No state is retained between calls; a single validator is safe for
/// unlimited concurrent use.
pub struct TokenValidator {
    config: OAuthConfig,
    key_provider: Arc<JwksKeyProvider>,
}

impl TokenValidator {
    /// Create a validator over the shared key provider.
    #[must_use]
    pub fn new(config: OAuthConfig, key_provider: Arc<JwksKeyProvider>) -> Self {
        Self {
            config,
            key_provider,
        }
    }

    /// Validate the raw `Authorization` header and produce a principal.
    ///
    /// # Errors
    ///
    /// - 401 `invalid_token` for a missing/malformed header, bad signature,
    ///   disallowed algorithm, wrong issuer/audience, expiry, unresolved key
    ///   id, or an empty required claim
    /// - 500 `jwks_download_error` when the signing keys cannot be fetched
    pub async fn validate(
        &self,
        authorization_header: Option<&str>,
    ) -> Result<ClaimsPrincipal, ApiError> {
        let token = authorization_header
            .and_then(read_bearer_token)
            .ok_or_else(ClientError::missing_token)?;

        // Size check + unverified kid read happen before any crypto
        let kid = common::jwt::extract_kid(token)
            .map_err(|e| ClientError::invalid_token(format!("Header parse failed: {e:?}")))?;

        let key = self.key_provider.get_key(&kid).await.map_err(|e| match e {
            JwksError::UnknownKey(kid) => ApiError::Client(ClientError::invalid_token(format!(
                "Token signed with unknown key id {kid}"
            ))),
            JwksError::Download(cause) | JwksError::Configuration(cause) => {
                ApiError::Server(ServerError::jwks_download_error(cause))
            }
        })?;

        let mut validation = Validation::new(
            self.config
                .algorithms
                .first()
                .copied()
                .unwrap_or(jsonwebtoken::Algorithm::EdDSA),
        );
        validation.algorithms = self.config.algorithms.clone();
        validation.set_issuer(&[self.config.issuer.as_str()]);
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }

        let token_data = jsonwebtoken::decode::<TokenClaims>(token, &key.decoding_key, &validation)
            .map_err(|e| {
                ClientError::invalid_token(format!("Token verification failed: {e}"))
            })?;
        let claims = token_data.claims;

        // Sanity-check required claims now rather than failing later with a
        // cryptic error downstream
        if claims.sub.is_empty() {
            return Err(ClientError::missing_claim("sub").into());
        }
        if claims.scope.is_empty() {
            return Err(ClientError::missing_claim("scope").into());
        }

        tracing::debug!(
            target: "rs.auth.validator",
            scope = %claims.scope,
            "Access token validated"
        );

        let scopes = claims.scope.split(' ').map(ToString::to_string).collect();
        Ok(ClaimsPrincipal::new(claims.sub, scopes, claims.client_id))
    }
}

/// Read the token from a `Bearer <token>` header value.
///
/// The scheme match is case-insensitive; anything else yields `None`.
fn read_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

// =============================================================================
// Tests
// =============================================================================
