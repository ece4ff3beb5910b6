//! Webhook signature verification and moderator authorization.
//!
//! Moderator identity itself lives in an external service; this module
//! only defines the seam (`ModeratorVerifier`) and a shared-secret
//! implementation for deployments without one.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook body against its signature header.
///
/// The signature is the lowercase hex HMAC-SHA256 of the raw request body
/// under the shared secret.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    constant_time_eq(expected.as_bytes(), signature_hex.trim().as_bytes())
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Seam for moderator-level authorization.
///
/// Production deployments back this with the external identity service;
/// `StaticTokenVerifier` covers single-operator setups and tests.
#[async_trait]
pub trait ModeratorVerifier: Send + Sync {
    /// Whether the presented bearer token belongs to a moderator.
    async fn verify(&self, bearer_token: &str) -> bool;
}

/// Shared-secret moderator verification.
pub struct StaticTokenVerifier {
    token: String,
}

impl StaticTokenVerifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl ModeratorVerifier for StaticTokenVerifier {
    async fn verify(&self, bearer_token: &str) -> bool {
        constant_time_eq(self.token.as_bytes(), bearer_token.as_bytes())
    }
}
