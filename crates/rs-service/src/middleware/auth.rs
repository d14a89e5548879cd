//! Authentication middleware for protected routes.
//!
//! Extracts the bearer token from the Authorization header, validates it
//! against the JWKS-backed validator, and injects the resulting
//! [`ClaimsPrincipal`] into request extensions for downstream handlers.
//!
//! # Response
//!
//! - 401 Unauthorized (with a `WWW-Authenticate` bearer challenge) if the
//!   token is missing or invalid
//! - 500 Internal Server Error if the signing keys cannot be downloaded
//! - Continues to the next handler with `ClaimsPrincipal` in extensions
//!   when validation succeeds

use crate::auth::{ClaimsPrincipal, TokenValidator};
use crate::errors::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// JWT validator with its JWKS key provider.
    pub validator: Arc<TokenValidator>,
}

/// Authentication middleware for bearer-protected endpoints.
#[instrument(skip_all, name = "rs.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let authorization = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let principal = state.validator.validate(authorization).await?;

    // Store the principal in request extensions for downstream handlers
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Extension trait for extracting the authenticated principal from a request.
pub trait ClaimsExt {
    /// Get the authenticated claims principal from request extensions.
    ///
    /// Returns `None` if the auth middleware was not applied to this request.
    fn claims_principal(&self) -> Option<&ClaimsPrincipal>;
}

impl<B> ClaimsExt for axum::extract::Request<B> {
    fn claims_principal(&self) -> Option<&ClaimsPrincipal> {
        self.extensions().get::<ClaimsPrincipal>()
    }
}
