//! Vendor webhook payloads reduced to what billing cares about.

use serde::Deserialize;

use crate::payments::error::{decode, PaymentError};
use crate::payments::gateway::GatewayKind;
use crate::payments::razorpay::RazorpayPayment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Succeeded {
        gateway: GatewayKind,
        gateway_order_id: String,
        gateway_payment_id: String,
    },
    Failed {
        gateway: GatewayKind,
        gateway_order_id: String,
        reason: String,
    },
    /// Event types we do not act on; acknowledged so the vendor stops retrying.
    Ignored(String),
}

// ── Stripe ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeEventObject,
}

#[derive(Debug, Deserialize)]
struct StripeEventObject {
    id: String,
    latest_charge: Option<String>,
    last_payment_error: Option<StripeEventError>,
}

#[derive(Debug, Deserialize)]
struct StripeEventError {
    message: Option<String>,
}

pub fn parse_stripe_event(body: &[u8]) -> Result<WebhookOutcome, PaymentError> {
    let text = String::from_utf8_lossy(body);
    let event: StripeEvent = decode("stripe", &text)?;
    let object = event.data.object;

    Ok(match event.event_type.as_str() {
        "payment_intent.succeeded" => WebhookOutcome::Succeeded {
            gateway: GatewayKind::Stripe,
            gateway_payment_id: object.latest_charge.unwrap_or_else(|| object.id.clone()),
            gateway_order_id: object.id,
        },
        "payment_intent.payment_failed" | "payment_intent.canceled" => WebhookOutcome::Failed {
            gateway: GatewayKind::Stripe,
            gateway_order_id: object.id,
            reason: object
                .last_payment_error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Payment failed".to_string()),
        },
        other => WebhookOutcome::Ignored(other.to_string()),
    })
}

// ── Razorpay ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RazorpayEvent {
    event: String,
    payload: RazorpayPayload,
}

#[derive(Debug, Deserialize)]
struct RazorpayPayload {
    payment: Option<RazorpayEntity<RazorpayPayment>>,
}

#[derive(Debug, Deserialize)]
struct RazorpayEntity<T> {
    entity: T,
}

pub fn parse_razorpay_event(body: &[u8]) -> Result<WebhookOutcome, PaymentError> {
    let text = String::from_utf8_lossy(body);
    let event: RazorpayEvent = decode("razorpay", &text)?;

    let payment = match event.event.as_str() {
        "payment.captured" | "order.paid" | "payment.failed" => event
            .payload
            .payment
            .map(|p| p.entity)
            .ok_or_else(|| PaymentError::Decode {
                gateway: "razorpay",
                message: format!("{} without payment entity", event.event),
            })?,
        other => return Ok(WebhookOutcome::Ignored(other.to_string())),
    };
    let order_id = payment.order_id.ok_or_else(|| PaymentError::Decode {
        gateway: "razorpay",
        message: "payment without order_id".to_string(),
    })?;

    Ok(if event.event == "payment.failed" {
        WebhookOutcome::Failed {
            gateway: GatewayKind::Razorpay,
            gateway_order_id: order_id,
            reason: payment
                .error_description
                .unwrap_or_else(|| "Payment failed".to_string()),
        }
    } else {
        WebhookOutcome::Succeeded {
            gateway: GatewayKind::Razorpay,
            gateway_order_id: order_id,
            gateway_payment_id: payment.id,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe_succeeded_event() {
        let body = br#"{
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_1", "latest_charge": "ch_1", "amount": 999}}
        }"#;
        assert_eq!(
            parse_stripe_event(body).unwrap(),
            WebhookOutcome::Succeeded {
                gateway: GatewayKind::Stripe,
                gateway_order_id: "pi_1".to_string(),
                gateway_payment_id: "ch_1".to_string(),
            }
        );
    }

    #[test]
    fn test_stripe_failed_event_carries_reason() {
        let body = br#"{
            "type": "payment_intent.payment_failed",
            "data": {"object": {"id": "pi_2", "last_payment_error": {"message": "Your card has insufficient funds."}}}
        }"#;
        match parse_stripe_event(body).unwrap() {
            WebhookOutcome::Failed { reason, gateway_order_id, .. } => {
                assert_eq!(gateway_order_id, "pi_2");
                assert_eq!(reason, "Your card has insufficient funds.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_stripe_unrelated_event_is_ignored() {
        let body = br#"{"type": "customer.created", "data": {"object": {"id": "cus_1"}}}"#;
        assert_eq!(
            parse_stripe_event(body).unwrap(),
            WebhookOutcome::Ignored("customer.created".to_string())
        );
    }

    #[test]
    fn test_razorpay_captured_event() {
        let body = br#"{
            "event": "payment.captured",
            "payload": {"payment": {"entity": {
                "id": "pay_1", "order_id": "order_1", "status": "captured",
                "amount": 49900, "currency": "INR"
            }}}
        }"#;
        assert_eq!(
            parse_razorpay_event(body).unwrap(),
            WebhookOutcome::Succeeded {
                gateway: GatewayKind::Razorpay,
                gateway_order_id: "order_1".to_string(),
                gateway_payment_id: "pay_1".to_string(),
            }
        );
    }

    #[test]
    fn test_razorpay_failed_event() {
        let body = br#"{
            "event": "payment.failed",
            "payload": {"payment": {"entity": {
                "id": "pay_2", "order_id": "order_2", "status": "failed",
                "amount": 49900, "currency": "INR", "error_description": "Payment was declined by the bank"
            }}}
        }"#;
        assert!(matches!(
            parse_razorpay_event(body).unwrap(),
            WebhookOutcome::Failed { reason, .. } if reason == "Payment was declined by the bank"
        ));
    }

    #[test]
    fn test_razorpay_event_missing_payment_is_decode_error() {
        let body = br#"{"event": "payment.captured", "payload": {}}"#;
        assert!(matches!(
            parse_razorpay_event(body),
            Err(PaymentError::Decode { .. })
        ));
    }

    #[test]
    fn test_garbage_body_is_decode_error() {
        assert!(parse_stripe_event(b"not json").is_err());
    }
}
