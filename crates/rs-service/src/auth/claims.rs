//! The validated, typed representation of a token's subject and scopes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The claims principal produced by successful token validation.
///
/// A `ClaimsPrincipal` can only be constructed inside this crate, after full
/// signature, issuer, audience and algorithm validation; handlers receiving
/// one through request extensions can rely on every field being verified.
///
/// # Security
///
/// The subject is redacted in Debug output to prevent accidental logging of
/// user identifiers.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClaimsPrincipal {
    subject: String,
    scopes: Vec<String>,
    client_id: Option<String>,
}

impl ClaimsPrincipal {
    /// Assemble a principal from verified claims. Crate-private: the token
    /// validator is the only construction site.
    pub(crate) fn new(subject: String, scopes: Vec<String>, client_id: Option<String>) -> Self {
        Self {
            subject,
            scopes,
            client_id,
        }
    }

    /// The token's `sub` claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The token's scopes, in claim order.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The OAuth client the token was issued to, when present.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Check whether the principal holds a specific scope.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

impl fmt::Debug for ClaimsPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimsPrincipal")
            .field("subject", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("client_id", &self.client_id)
            .finish()
    }
}
