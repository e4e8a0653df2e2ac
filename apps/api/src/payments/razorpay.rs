use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::payments::error::{classify_http_error, decode, is_success, send, PaymentError};
use crate::payments::gateway::{
    GatewayKind, PaymentGateway, PaymentIntent, PaymentMetadata, PaymentVerification,
    VerifiedPayment,
};
use crate::payments::signature::verify_razorpay_checkout;

const GATEWAY: &str = "razorpay";
const RAZORPAY_API_URL: &str = "https://api.razorpay.com";

#[derive(Debug, Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RazorpayPayment {
    pub id: String,
    pub order_id: Option<String>,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorEnvelope {
    error: RazorpayErrorBody,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    description: Option<String>,
    reason: Option<String>,
}

fn razorpay_error(status: u16, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<RazorpayErrorEnvelope>(body).ok();
    let declined = parsed
        .as_ref()
        .and_then(|e| e.error.reason.as_deref())
        .is_some_and(|reason| reason.contains("declined") || reason == "insufficient_funds");
    let message = parsed
        .and_then(|e| e.error.description)
        .unwrap_or_else(|| body.chars().take(200).collect());
    classify_http_error(GATEWAY, status, message, declined)
}

pub struct RazorpayGateway {
    client: Client,
    key_id: String,
    key_secret: String,
    base_url: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::transport(GATEWAY, e))?;
        Ok(Self {
            client,
            key_id,
            key_secret,
            base_url: RAZORPAY_API_URL.to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Razorpay
    }

    /// POST /v1/orders. The client opens Razorpay Checkout with the
    /// returned order id and our public key id.
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &PaymentMetadata,
    ) -> Result<PaymentIntent, PaymentError> {
        let body = json!({
            "amount": amount,
            "currency": currency.to_ascii_uppercase(),
            // receipt is capped at 40 characters
            "receipt": metadata.transaction_id.simple().to_string(),
            "notes": {
                "transaction_id": metadata.transaction_id.to_string(),
                "user_id": metadata.user_id.to_string(),
                "plan": metadata.plan.as_str(),
            },
        });
        let request = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body);

        let (status, body) = send(GATEWAY, request).await?;
        if !is_success(status) {
            return Err(razorpay_error(status, &body));
        }
        let order: RazorpayOrder = decode(GATEWAY, &body)?;
        debug!("Created Razorpay order {}", order.id);

        Ok(PaymentIntent {
            gateway: GatewayKind::Razorpay,
            gateway_order_id: order.id,
            client_secret: None,
            key_id: Some(self.key_id.clone()),
            approval_url: None,
            amount: order.amount,
            currency: order.currency,
        })
    }

    /// Checks the Checkout handler signature, then confirms the payment
    /// state with GET /v1/payments/:id.
    async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> Result<VerifiedPayment, PaymentError> {
        let payment_id = verification.gateway_payment_id.as_deref().ok_or_else(|| {
            PaymentError::InvalidRequest("gateway_payment_id is required".to_string())
        })?;
        let signature = verification
            .signature
            .as_deref()
            .ok_or(PaymentError::InvalidSignature)?;
        if !verify_razorpay_checkout(
            &verification.gateway_order_id,
            payment_id,
            signature,
            &self.key_secret,
        ) {
            return Err(PaymentError::InvalidSignature);
        }

        let request = self
            .client
            .get(format!("{}/v1/payments/{payment_id}", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret));
        let (status, body) = send(GATEWAY, request).await?;
        if !is_success(status) {
            return Err(razorpay_error(status, &body));
        }
        let payment: RazorpayPayment = decode(GATEWAY, &body)?;
        payment_outcome(payment, &verification.gateway_order_id)
    }
}

pub(crate) fn payment_outcome(
    payment: RazorpayPayment,
    expected_order_id: &str,
) -> Result<VerifiedPayment, PaymentError> {
    if payment.order_id.as_deref() != Some(expected_order_id) {
        return Err(PaymentError::InvalidRequest(
            "payment does not belong to this order".to_string(),
        ));
    }
    match payment.status.as_str() {
        "captured" => Ok(VerifiedPayment {
            gateway_order_id: expected_order_id.to_string(),
            gateway_payment_id: payment.id,
            amount: payment.amount,
            currency: payment.currency,
        }),
        "failed" => Err(PaymentError::Declined(
            payment
                .error_description
                .unwrap_or_else(|| "payment failed".to_string()),
        )),
        other => Err(PaymentError::InvalidRequest(format!(
            "payment is not complete (status: {other})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(status: &str, order_id: &str) -> RazorpayPayment {
        RazorpayPayment {
            id: "pay_1".to_string(),
            order_id: Some(order_id.to_string()),
            status: status.to_string(),
            amount: 49_900,
            currency: "INR".to_string(),
            error_description: (status == "failed").then(|| "Bank declined".to_string()),
        }
    }

    #[test]
    fn test_captured_payment_is_verified() {
        let verified = payment_outcome(payment("captured", "order_1"), "order_1").unwrap();
        assert_eq!(verified.gateway_payment_id, "pay_1");
        assert_eq!(verified.amount, 49_900);
    }

    #[test]
    fn test_failed_payment_is_declined() {
        assert!(matches!(
            payment_outcome(payment("failed", "order_1"), "order_1"),
            Err(PaymentError::Declined(msg)) if msg == "Bank declined"
        ));
    }

    #[test]
    fn test_payment_for_other_order_is_rejected() {
        assert!(matches!(
            payment_outcome(payment("captured", "order_2"), "order_1"),
            Err(PaymentError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_signature_fails_before_any_request() {
        let gateway =
            RazorpayGateway::new("rzp_test_key".to_string(), "secret".to_string()).unwrap();
        let result = gateway
            .verify_payment(&PaymentVerification {
                gateway_order_id: "order_1".to_string(),
                gateway_payment_id: Some("pay_1".to_string()),
                signature: Some("00ff".to_string()),
            })
            .await;
        assert!(matches!(result, Err(PaymentError::InvalidSignature)));
    }

    #[test]
    fn test_error_body_description_is_surfaced() {
        let body = r#"{"error": {"code": "BAD_REQUEST_ERROR", "description": "amount must be at least INR 1.00"}}"#;
        match razorpay_error(400, body) {
            PaymentError::Gateway { message, .. } => {
                assert_eq!(message, "amount must be at least INR 1.00")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
