//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! The signature arrives in `X-Hub-Signature-256` as `sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Decode a `sha256=<hex>` header into raw bytes
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    hex::decode(header.strip_prefix("sha256=")?).ok()
}

/// Header value GitHub would send for `payload` signed with `secret`
pub fn sign_payload(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a webhook signature in constant time
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
