//! HMAC-SHA256 signature checks for checkout callbacks and webhooks.
//! All comparisons go through `Mac::verify_slice`, which is constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::payments::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Stripe's default replay window.
pub const STRIPE_TOLERANCE_SECS: i64 = 300;

fn verify_hex(secret: &[u8], message: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

/// Razorpay Checkout handler signature: HMAC of `"{order_id}|{payment_id}"`
/// keyed with the API key secret.
pub fn verify_razorpay_checkout(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    key_secret: &str,
) -> bool {
    let message = format!("{order_id}|{payment_id}");
    verify_hex(key_secret.as_bytes(), message.as_bytes(), signature)
}

/// `X-Razorpay-Signature`: HMAC of the raw body keyed with the webhook secret.
pub fn verify_razorpay_webhook(body: &[u8], signature: &str, webhook_secret: &str) -> bool {
    verify_hex(webhook_secret.as_bytes(), body, signature)
}

#[derive(Debug, PartialEq, Eq)]
struct StripeSignature {
    timestamp: i64,
    v1: Vec<String>,
}

/// `Stripe-Signature: t=1700000000,v1=abc...,v1=def...`
fn parse_stripe_signature(header: &str) -> Option<StripeSignature> {
    let mut timestamp = None;
    let mut v1 = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => v1.push(value.to_string()),
            _ => {}
        }
    }
    Some(StripeSignature {
        timestamp: timestamp?,
        v1,
    })
    .filter(|s| !s.v1.is_empty())
}

/// Verifies a Stripe webhook: any `v1` entry must equal HMAC of
/// `"{t}.{body}"`, and `t` must lie within `tolerance_secs` of `now`.
pub fn verify_stripe_webhook(
    body: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), PaymentError> {
    let parsed = parse_stripe_signature(header).ok_or(PaymentError::InvalidSignature)?;
    // `t` comes from the sender; `abs_diff` cannot overflow on i64::MIN.
    if now.abs_diff(parsed.timestamp) > tolerance_secs.unsigned_abs() {
        return Err(PaymentError::InvalidSignature);
    }

    let mut signed = format!("{}.", parsed.timestamp).into_bytes();
    signed.extend_from_slice(body);

    if parsed
        .v1
        .iter()
        .any(|sig| verify_hex(secret.as_bytes(), &signed, sig))
    {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
        mac.update(message);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_hmac_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_razorpay_checkout_signature() {
        let signature = hmac_sha256_hex(b"key_secret", b"order_123|pay_456");
        assert!(verify_razorpay_checkout("order_123", "pay_456", &signature, "key_secret"));
        assert!(!verify_razorpay_checkout("order_123", "pay_999", &signature, "key_secret"));
        assert!(!verify_razorpay_checkout("order_123", "pay_456", "not-hex", "key_secret"));
    }

    #[test]
    fn test_razorpay_webhook_signature() {
        let body = br#"{"event":"payment.captured"}"#;
        let signature = hmac_sha256_hex(SECRET.as_bytes(), body);
        assert!(verify_razorpay_webhook(body, &signature, SECRET));
        assert!(!verify_razorpay_webhook(b"{}", &signature, SECRET));
    }

    fn stripe_header(timestamp: i64, body: &[u8]) -> String {
        let mut signed = format!("{timestamp}.").into_bytes();
        signed.extend_from_slice(body);
        format!("t={timestamp},v1={}", hmac_sha256_hex(SECRET.as_bytes(), &signed))
    }

    #[test]
    fn test_stripe_signature_accepts_fresh_valid_header() {
        let body = br#"{"type":"payment_intent.succeeded"}"#;
        let header = stripe_header(1_700_000_000, body);
        assert!(verify_stripe_webhook(body, &header, SECRET, 1_700_000_100, STRIPE_TOLERANCE_SECS).is_ok());
    }

    #[test]
    fn test_stripe_signature_rejects_stale_timestamp() {
        let body = b"{}";
        let header = stripe_header(1_700_000_000, body);
        assert!(verify_stripe_webhook(body, &header, SECRET, 1_700_000_301, STRIPE_TOLERANCE_SECS).is_err());
    }

    #[test]
    fn test_stripe_signature_rejects_extreme_timestamps() {
        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={t},v1=00");
            assert!(matches!(
                verify_stripe_webhook(b"{}", &header, SECRET, 1_700_000_000, STRIPE_TOLERANCE_SECS),
                Err(PaymentError::InvalidSignature)
            ));
        }
    }

    #[test]
    fn test_stripe_signature_rejects_tampered_body() {
        let header = stripe_header(1_700_000_000, b"{\"amount\":999}");
        assert!(verify_stripe_webhook(b"{\"amount\":1}", &header, SECRET, 1_700_000_000, STRIPE_TOLERANCE_SECS).is_err());
    }

    #[test]
    fn test_stripe_signature_accepts_any_matching_v1() {
        let body = b"{}";
        let valid = stripe_header(1_700_000_000, body);
        let header = format!("{},v1=deadbeef", valid.replace(",v1=", ",v1=00,v1="));
        assert!(verify_stripe_webhook(body, &header, SECRET, 1_700_000_000, STRIPE_TOLERANCE_SECS).is_ok());
    }

    #[test]
    fn test_parse_stripe_signature() {
        assert_eq!(
            parse_stripe_signature("t=12,v1=ab,v0=zz,v1=cd"),
            Some(StripeSignature {
                timestamp: 12,
                v1: vec!["ab".to_string(), "cd".to_string()],
            })
        );
        assert_eq!(parse_stripe_signature("v1=ab"), None);
        assert_eq!(parse_stripe_signature("t=12"), None);
    }
}
