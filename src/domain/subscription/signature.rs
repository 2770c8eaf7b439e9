//! HMAC-SHA256 signatures used by the payment gateway.
//!
//! Two schemes share this code:
//! - checkout confirmation: `hex(HMAC(key_secret, "<order_id>|<payment_id>"))`
//! - webhooks: `hex(HMAC(webhook_secret, raw_body))`
//!
//! Comparison is constant-time over the decoded bytes and reports a single
//! boolean, never which part differed.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Computes the raw HMAC-SHA256 of `message` under `secret`.
fn mac_bytes(secret: &[u8], message: &[u8]) -> Vec<u8> {
    match HmacSha256::new_from_slice(secret) {
        Ok(mut mac) => {
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}

/// Hex-encoded HMAC-SHA256 of `message` under `secret`.
pub fn sign_hex(secret: &str, message: &[u8]) -> String {
    hex::encode(mac_bytes(secret.as_bytes(), message))
}

/// Message signed by the gateway when a checkout completes.
pub fn payment_message(order_id: &str, payment_id: &str) -> String {
    format!("{}|{}", order_id, payment_id)
}

/// Checks a hex signature over `message`.
///
/// Malformed hex is just a mismatch.
pub fn verify_hex(secret: &str, message: &[u8], provided_hex: &str) -> bool {
    let provided = match hex::decode(provided_hex.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let expected = mac_bytes(secret.as_bytes(), message);
    if expected.is_empty() {
        return false;
    }
    constant_time_compare(&expected, &provided)
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret_12345";

    #[test]
    fn known_vector_matches() {
        // RFC 4231 test case 2
        let sig = sign_hex("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verify_accepts_own_signature() {
        let body = br#"{"event":"subscription.charged"}"#;
        let sig = sign_hex(SECRET, body);
        assert!(verify_hex(SECRET, body, &sig));
    }

    #[test]
    fn verify_accepts_uppercase_hex() {
        let body = b"payload";
        let sig = sign_hex(SECRET, body).to_uppercase();
        assert!(verify_hex(SECRET, body, &sig));
    }

    #[test]
    fn verify_rejects_tampered_body() {
        let sig = sign_hex(SECRET, b"amount=100");
        assert!(!verify_hex(SECRET, b"amount=999", &sig));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let sig = sign_hex("other_secret", b"payload");
        assert!(!verify_hex(SECRET, b"payload", &sig));
    }

    #[test]
    fn verify_rejects_truncated_and_non_hex() {
        let sig = sign_hex(SECRET, b"payload");
        assert!(!verify_hex(SECRET, b"payload", &sig[..sig.len() - 2]));
        assert!(!verify_hex(SECRET, b"payload", "not-hex"));
        assert!(!verify_hex(SECRET, b"payload", ""));
    }

    #[test]
    fn payment_message_joins_with_pipe() {
        assert_eq!(payment_message("order_1", "pay_2"), "order_1|pay_2");
    }

    #[test]
    fn constant_time_compare_checks_length() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
        assert!(!constant_time_compare(b"abc", b"abd"));
    }
}
