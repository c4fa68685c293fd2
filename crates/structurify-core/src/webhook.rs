//! Webhook signature generation and verification.
//!
//! Structurify signs each webhook body with HMAC-SHA256 over the raw bytes
//! and sends the result in the [`SIGNATURE_HEADER`] header as
//! `sha256=<64 lowercase hex chars>`.
//!
//! ```
//! use structurify_core::webhook::{compute_signature, verify_signature};
//!
//! let body = br#"{"event":"extraction.completed"}"#;
//! let signature = compute_signature(body, "whsec_test");
//! assert!(verify_signature(body, &signature, "whsec_test"));
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature on inbound webhooks.
pub const SIGNATURE_HEADER: &str = "X-Structurify-Signature";

/// Scheme tag prepended to every signature.
pub const SIGNATURE_PREFIX: &str = "sha256=";

const DIGEST_LEN: usize = 32;

fn hmac_digest(payload: &[u8], secret: &str) -> [u8; DIGEST_LEN] {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take any size key");
    mac.update(payload);
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&mac.finalize().into_bytes());
    digest
}

/// Compute the signature for `payload` (`sha256=` + 64 hex chars).
///
/// String payloads are signed as their UTF-8 bytes; byte payloads as-is.
pub fn compute_signature(payload: impl AsRef<[u8]>, secret: &str) -> String {
    let digest = hmac_digest(payload.as_ref(), secret);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(digest))
}

/// Verify a webhook signature in constant time.
///
/// Accepts the signature with or without the `sha256=` prefix. Malformed
/// signatures (not hex, or the wrong length) return `false`.
pub fn verify_signature(payload: impl AsRef<[u8]>, signature: &str, secret: &str) -> bool {
    let signature = signature
        .strip_prefix(SIGNATURE_PREFIX)
        .unwrap_or(signature);

    let provided = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    if provided.len() != DIGEST_LEN {
        return false;
    }

    let expected = hmac_digest(payload.as_ref(), secret);
    expected.as_slice().ct_eq(provided.as_slice()).into()
}
