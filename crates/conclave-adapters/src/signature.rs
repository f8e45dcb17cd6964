//! HMAC-SHA256 webhook signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verify `signature_header` (e.g. `"sha256=<hex>"`) against an HMAC-SHA256
/// of `raw_body` keyed by `secret`, using a constant-time comparison.
///
/// An empty `secret` means "do not verify" and always returns `true` — the
/// deployment has chosen not to configure a webhook secret.
#[must_use]
pub fn verify_signature(raw_body: &[u8], signature_header: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return true;
    }
    let Some(hex_digest) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    let computed = mac.finalize().into_bytes();

    bool::from(computed.as_slice().ct_eq(&expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(body: &[u8], secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn empty_secret_always_verifies() {
        assert!(verify_signature(b"anything", "garbage", ""));
    }

    #[test]
    fn a_correct_signature_verifies() {
        let body = b"{\"hello\":\"world\"}";
        let header = sign(body, "s3cr3t");
        assert!(verify_signature(body, &header, "s3cr3t"));
    }

    #[test]
    fn a_tampered_body_fails_verification() {
        let body = b"{\"hello\":\"world\"}";
        let header = sign(body, "s3cr3t");
        assert!(!verify_signature(b"{\"hello\":\"mallory\"}", &header, "s3cr3t"));
    }

    #[test]
    fn a_missing_prefix_fails_verification() {
        let body = b"payload";
        assert!(!verify_signature(body, "not-a-valid-header", "s3cr3t"));
    }

    #[test]
    fn a_wrong_secret_fails_verification() {
        let body = b"payload";
        let header = sign(body, "correct-secret");
        assert!(!verify_signature(body, &header, "wrong-secret"));
    }
}
