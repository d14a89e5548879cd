//! Middleware for the resource server.

pub mod auth;

pub use auth::{require_auth, AuthState, ClaimsExt};
