//! Route composition for hosts embedding the resource server.
//!
//! The API's endpoints belong to the host application; this module wraps
//! them with the layers every protected surface needs.

use crate::auth::TokenValidator;
use crate::middleware::{require_auth, AuthState};
use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Upper bound on request handling; no operation blocks indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wrap the host's API routes with bearer-token protection.
///
/// Applied layers, outermost first:
/// - TraceLayer for request logging
/// - 30 second request timeout
/// - Authentication middleware (validated `ClaimsPrincipal` in extensions)
#[must_use]
pub fn protect(api_routes: Router, validator: Arc<TokenValidator>) -> Router {
    let auth_state = Arc::new(AuthState { validator });

    api_routes
        .layer(middleware::from_fn_with_state(auth_state, require_auth))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}
