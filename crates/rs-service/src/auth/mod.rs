//! Authentication module for the resource server.
//!
//! This module turns a raw `Authorization` header into a verified claims
//! principal.
//!
//! # Components
//!
//! - `jwks` - Key provider that fetches and caches signing keys from the
//!   authorization server's JWKS endpoint
//! - `validator` - JWT validation using the cached keys
//! - `claims` - The claims principal handed to downstream handlers

pub mod claims;
pub mod jwks;
pub mod validator;

pub use claims::ClaimsPrincipal;
pub use jwks::JwksKeyProvider;
pub use validator::TokenValidator;
