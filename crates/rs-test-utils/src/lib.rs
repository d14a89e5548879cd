//! # RS Test Utilities
//!
//! Shared test utilities for the resource server and the client crates.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (seeded Ed25519 keys for reproducible tests)
//! - A token builder that signs real JWTs (`TestTokenBuilder`)
//! - JWKS document builders and a wiremock endpoint harness
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rs_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let mock_server = wiremock::MockServer::start().await;
//!     let key = test_signing_key(1).unwrap();
//!     mount_jwks_endpoint(&mock_server, &[("key-1", &key)], 1).await;
//!
//!     let token = TestTokenBuilder::new()
//!         .for_user("alice")
//!         .with_scope("openid transactions_read")
//!         .with_issuer("https://login.example.com")
//!         .sign("key-1", &key)
//!         .unwrap();
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_harness::*;
pub use token_builders::*;
