//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use them for all
//! sensitive values: access tokens, authorization codes, PKCE verifiers.
//!
//! `SecretString` implements `Debug` with redaction, so any struct that
//! derives `Debug` while holding one gets safe logging behavior for free,
//! and the inner value is zeroized on drop. Reading the value requires an
//! explicit [`ExposeSecret::expose_secret`] call at the use site.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct StoredSession {
//!     subject: String,
//!     access_token: SecretString,  // Safe: Debug shows "[REDACTED]"
//! }
//!
//! let session = StoredSession {
//!     subject: "alice".to_string(),
//!     access_token: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! // Safe - the token is redacted
//! println!("{:?}", session);
//!
//! // Access requires an explicit call
//! let header = format!("Bearer {}", session.access_token.expose_secret());
//! ```
//!
//! With the `serde` feature enabled, secrets deserialize from JSON, which is
//! how the client-side session store round-trips tokens to disk.

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("opaque-access-token");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("opaque-access-token"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("token-value");
        assert_eq!(secret.expose_secret(), "token-value");
    }

    #[test]
    fn test_struct_with_secret_is_safe() {
        #[allow(dead_code)]
        #[derive(Debug)]
        struct Session {
            subject: String,
            access_token: SecretString,
        }

        let session = Session {
            subject: "alice".to_string(),
            access_token: SecretString::from("super-secret"),
        };

        let debug_str = format!("{session:?}");

        // Subject should be visible
        assert!(debug_str.contains("alice"));
        // Token should be redacted
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super-secret"));
    }

    #[test]
    fn test_deserialize() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct Stored {
            subject: String,
            access_token: SecretString,
        }

        let json = r#"{"subject": "bob", "access_token": "stored-token-value"}"#;
        let stored: Stored = serde_json::from_str(json).expect("deserialize");

        assert_eq!(stored.access_token.expose_secret(), "stored-token-value");

        let debug = format!("{stored:?}");
        assert!(!debug.contains("stored-token-value"));
        assert!(debug.contains("REDACTED"));
    }
}
