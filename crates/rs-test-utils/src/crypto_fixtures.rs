//! Deterministic cryptographic fixtures for testing
//!
//! Provides reproducible Ed25519 keypairs for signing test tokens and
//! publishing matching JWKS documents. All fixtures are deterministic based
//! on seed values.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::signature::{Ed25519KeyPair, KeyPair};
use thiserror::Error;

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// A deterministic Ed25519 keypair for tests.
///
/// The public half feeds JWKS documents (`jwk_x`); the private half signs
/// test tokens (`encoding_key`).
pub struct TestSigningKey {
    public_key: Vec<u8>,
    pkcs8: Vec<u8>,
}

impl TestSigningKey {
    /// The raw public key as the base64url `x` member of an OKP JWK.
    pub fn jwk_x(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.public_key)
    }

    /// An encoding key for signing test JWTs with `jsonwebtoken`.
    pub fn encoding_key(&self) -> jsonwebtoken::EncodingKey {
        jsonwebtoken::EncodingKey::from_ed_der(&self.pkcs8)
    }
}

/// Generate a deterministic Ed25519 signing key for testing.
///
/// The same seed always produces the same keypair, ensuring test
/// reproducibility.
///
/// # Example
/// ```rust,ignore
/// let key = test_signing_key(1)?;
/// let key2 = test_signing_key(1)?;
/// assert_eq!(key.jwk_x(), key2.jwk_x());
/// ```
pub fn test_signing_key(seed: u8) -> Result<TestSigningKey, FixtureError> {
    // Create deterministic 32-byte seed from input
    let mut seed_bytes = [0u8; 32];
    seed_bytes[0] = seed;
    // Fill rest with deterministic pattern
    for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
        *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
    }

    // Generate keypair from seed using ring's from_seed_unchecked
    // Note: This is deterministic and suitable for testing only
    let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
        .map_err(|e| FixtureError::Crypto(format!("Failed to generate test keypair: {:?}", e)))?;

    let public_key = key_pair.public_key().as_ref().to_vec();
    let pkcs8 = build_pkcs8_from_seed(&seed_bytes);

    Ok(TestSigningKey { public_key, pkcs8 })
}

/// Build a PKCS#8 v1 document from an Ed25519 seed
///
/// Ring doesn't expose a method to get PKCS#8 from an existing
/// `Ed25519KeyPair`, so we assemble the DER structure ourselves. Test-only;
/// production keys must come from a real CSPRNG.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    // PKCS#8 v1 format for Ed25519 (RFC 5208):
    // SEQUENCE {
    //   version         INTEGER (0),
    //   algorithm       AlgorithmIdentifier,
    //   privateKey      OCTET STRING
    // }
    // Where privateKey for Ed25519 is:
    // OCTET STRING containing OCTET STRING with 32-byte seed

    let mut pkcs8 = Vec::new();

    // Outer SEQUENCE tag
    pkcs8.push(0x30);
    pkcs8.push(0x2e); // Length: 46 bytes

    // Version: INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);

    // Algorithm Identifier: SEQUENCE
    pkcs8.push(0x30);
    pkcs8.push(0x05); // Length: 5 bytes
                      // OID for Ed25519: 1.3.101.112
    pkcs8.extend_from_slice(&[0x06, 0x03, 0x2b, 0x65, 0x70]);

    // Private Key: OCTET STRING
    pkcs8.push(0x04);
    pkcs8.push(0x22); // Length: 34 bytes
                      // Inner OCTET STRING with seed
    pkcs8.push(0x04);
    pkcs8.push(0x20); // Length: 32 bytes
    pkcs8.extend_from_slice(seed);

    pkcs8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_is_deterministic() {
        let a = test_signing_key(7).unwrap();
        let b = test_signing_key(7).unwrap();

        assert_eq!(a.jwk_x(), b.jwk_x());
        assert_eq!(a.pkcs8, b.pkcs8);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = test_signing_key(1).unwrap();
        let b = test_signing_key(2).unwrap();

        assert_ne!(a.jwk_x(), b.jwk_x());
    }

    #[test]
    fn test_jwk_x_is_32_bytes_base64url() {
        let key = test_signing_key(1).unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(key.jwk_x()).unwrap();

        assert_eq!(decoded.len(), 32); // Ed25519 public key is 32 bytes
    }

    #[test]
    fn test_pkcs8_structure() {
        let key = test_signing_key(1).unwrap();

        assert_eq!(key.pkcs8.len(), 48); // 2-byte header + 46 bytes
        assert_eq!(key.pkcs8[0], 0x30); // DER SEQUENCE
    }
}
