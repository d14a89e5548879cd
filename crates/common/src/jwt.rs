//! JWT utilities shared between the resource server and its tests.
//!
//! This module provides the pieces of token handling that happen before any
//! cryptographic verification:
//! - Size limits for DoS prevention
//! - Key ID extraction from JWT headers
//! - The typed claims structure tokens decode into
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - `extract_kid` does NOT verify the signature; the token MUST still be
//!   verified after the key lookup
//! - The `sub` field in `TokenClaims` is redacted in Debug output

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical access tokens are a few hundred bytes; anything past this limit is
/// rejected before base64 decoding or signature verification so oversized
/// tokens cannot waste CPU or memory.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading a token's unverified header.
///
/// Note: Display output is intentionally generic to prevent information
/// leakage. Detail is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtParseError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token is missing required `kid` header.
    #[error("The access token is invalid or expired")]
    MissingKid,
}

// =============================================================================
// Claims Types
// =============================================================================

/// The claims payload an access token decodes into.
///
/// Required claims (`sub`, `scope`) default to empty strings when absent so
/// that the validator can report exactly which claim was missing instead of
/// surfacing a cryptic deserialization error.
///
/// # Security
///
/// The `sub` field is redacted in Debug output to prevent accidental logging
/// of user identifiers.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user identifier) - redacted in Debug output.
    #[serde(default)]
    pub sub: String,

    /// Space-separated scopes granted to this token.
    #[serde(default)]
    pub scope: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Optional OAuth client the token was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("sub", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("exp", &self.exp)
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl TokenClaims {
    /// Check if the token has a specific scope.
    ///
    /// Scopes are space-separated in the JWT claims.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.split_whitespace().any(|s| s == scope)
    }

    /// Get all scopes as a vector, in claim order.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split_whitespace().collect()
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the `kid` (key ID) from a JWT header without verifying the
/// signature.
///
/// The `kid` is used to look up the correct signing key when multiple keys
/// may be valid (e.g., during key rotation). The value should only be used
/// for key lookup in a trusted JWKS.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Token is not valid JWT format
/// - `MissingKid` - Token header doesn't contain a non-empty `kid` string
pub fn extract_kid(token: &str) -> Result<String, JwtParseError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtParseError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtParseError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtParseError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtParseError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtParseError::MalformedToken
    })?;

    // Reject empty kid values so cache lookups never key on ""
    let kid = header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtParseError::MissingKid)?;

    Ok(kid)
}

// =============================================================================
// Tests
// =============================================================================
