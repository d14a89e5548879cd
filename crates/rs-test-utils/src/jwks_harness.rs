//! JWKS document builders and a wiremock endpoint harness.
//!
//! Tests publish fixture keys the same way an authorization server would:
//! as an OKP JWK set served from `/.well-known/jwks.json`.

use crate::crypto_fixtures::TestSigningKey;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the harness serves the key set from.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Build a JWKS document publishing the given `(kid, key)` pairs.
pub fn jwks_json(keys: &[(&str, &TestSigningKey)]) -> Value {
    let entries: Vec<Value> = keys
        .iter()
        .map(|(kid, key)| {
            json!({
                "kty": "OKP",
                "crv": "Ed25519",
                "use": "sig",
                "alg": "EdDSA",
                "kid": kid,
                "x": key.jwk_x(),
            })
        })
        .collect();

    json!({ "keys": entries })
}

/// Mount a JWKS endpoint on the mock server.
///
/// `expected_fetches` is enforced by wiremock when the server drops, which
/// is how the single-flight tests prove exactly one download happened.
pub async fn mount_jwks_endpoint(
    server: &MockServer,
    keys: &[(&str, &TestSigningKey)],
    expected_fetches: u64,
) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(keys)))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_fixtures::test_signing_key;

    #[test]
    fn test_jwks_json_shape() {
        let key = test_signing_key(1).unwrap();
        let doc = jwks_json(&[("key-1", &key)]);

        let keys = doc["keys"].as_array().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0]["kty"], "OKP");
        assert_eq!(keys[0]["crv"], "Ed25519");
        assert_eq!(keys[0]["kid"], "key-1");
        assert_eq!(keys[0]["x"], key.jwk_x());
    }

    #[test]
    fn test_jwks_json_parses_as_jwk_set() {
        let key = test_signing_key(1).unwrap();
        let doc = jwks_json(&[("key-1", &key), ("key-2", &key)]);

        let set: jsonwebtoken::jwk::JwkSet = serde_json::from_value(doc).unwrap();
        assert_eq!(set.keys.len(), 2);
        assert!(set.find("key-1").is_some());
    }

    #[tokio::test]
    async fn test_mount_serves_document() {
        let server = MockServer::start().await;
        let key = test_signing_key(1).unwrap();
        mount_jwks_endpoint(&server, &[("key-1", &key)], 1).await;

        let body: Value = reqwest::get(format!("{}{JWKS_PATH}", server.uri()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["keys"][0]["kid"], "key-1");
    }
}
