//! Builder patterns for test data construction
//!
//! Provides a fluent API for creating signed test tokens.

use crate::crypto_fixtures::TestSigningKey;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, Header};
use serde_json::{json, Value};

/// Builder for creating test JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_scope("openid transactions_read")
///     .with_issuer("https://login.example.com")
///     .sign("key-1", &key)?;
/// ```
pub struct TestTokenBuilder {
    sub: String,
    scope: String,
    iss: Option<String>,
    aud: Option<String>,
    client_id: Option<String>,
    exp: i64,
    iat: i64,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            scope: String::new(),
            iss: None,
            aud: None,
            client_id: None,
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the scope (space-separated)
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    /// Set the issuer claim
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = Some(issuer.to_string());
        self
    }

    /// Set the audience claim
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = Some(audience.to_string());
        self
    }

    /// Set the client_id claim
    pub fn with_client_id(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    /// Set expiration in seconds from now (negative for an already-expired
    /// token)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = json!({
            "sub": self.sub,
            "scope": self.scope,
            "exp": self.exp,
            "iat": self.iat,
        });

        if let Some(iss) = self.iss {
            claims["iss"] = json!(iss);
        }
        if let Some(aud) = self.aud {
            claims["aud"] = json!(aud);
        }
        if let Some(client_id) = self.client_id {
            claims["client_id"] = json!(client_id);
        }

        claims
    }

    /// Sign the claims into a JWT with the given key id in the header
    pub fn sign(
        self,
        kid: &str,
        key: &TestSigningKey,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(kid.to_string());

        let claims = self.build();
        jsonwebtoken::encode(&header, &claims, &key.encoding_key())
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
