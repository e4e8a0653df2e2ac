use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::payments::error::{classify_http_error, decode, is_success, send, PaymentError};
use crate::payments::gateway::{
    GatewayKind, PaymentGateway, PaymentIntent, PaymentMetadata, PaymentVerification,
    VerifiedPayment,
};

const GATEWAY: &str = "stripe";
const STRIPE_API_URL: &str = "https://api.stripe.com";

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
    status: String,
    amount: i64,
    currency: String,
    latest_charge: Option<String>,
    last_payment_error: Option<StripeErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// Reads `{"error": {"type", "message"}}`; `card_error` means declined.
fn stripe_error(status: u16, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<StripeErrorEnvelope>(body).ok();
    let declined = parsed
        .as_ref()
        .and_then(|e| e.error.error_type.as_deref())
        == Some("card_error");
    let message = parsed
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| body.chars().take(200).collect());
    classify_http_error(GATEWAY, status, message, declined)
}

pub struct StripeGateway {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::transport(GATEWAY, e))?;
        Ok(Self {
            client,
            secret_key,
            base_url: STRIPE_API_URL.to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Stripe
    }

    /// POST /v1/payment_intents (form encoded, amounts in minor units)
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &PaymentMetadata,
    ) -> Result<PaymentIntent, PaymentError> {
        let form = [
            ("amount", amount.to_string()),
            ("currency", currency.to_ascii_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[transaction_id]", metadata.transaction_id.to_string()),
            ("metadata[user_id]", metadata.user_id.to_string()),
            ("metadata[plan]", metadata.plan.as_str().to_string()),
        ];
        let request = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", metadata.transaction_id.to_string())
            .form(&form);

        let (status, body) = send(GATEWAY, request).await?;
        if !is_success(status) {
            return Err(stripe_error(status, &body));
        }
        let intent: StripePaymentIntent = decode(GATEWAY, &body)?;
        debug!("Created Stripe payment intent {}", intent.id);

        Ok(PaymentIntent {
            gateway: GatewayKind::Stripe,
            gateway_order_id: intent.id,
            client_secret: intent.client_secret,
            key_id: None,
            approval_url: None,
            amount: intent.amount,
            currency: intent.currency.to_ascii_uppercase(),
        })
    }

    /// GET /v1/payment_intents/:id; only `succeeded` counts as paid.
    async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> Result<VerifiedPayment, PaymentError> {
        let request = self
            .client
            .get(format!(
                "{}/v1/payment_intents/{}",
                self.base_url, verification.gateway_order_id
            ))
            .bearer_auth(&self.secret_key);

        let (status, body) = send(GATEWAY, request).await?;
        if !is_success(status) {
            return Err(stripe_error(status, &body));
        }
        let intent: StripePaymentIntent = decode(GATEWAY, &body)?;
        intent_outcome(intent)
    }
}

fn intent_outcome(intent: StripePaymentIntent) -> Result<VerifiedPayment, PaymentError> {
    match intent.status.as_str() {
        "succeeded" => Ok(VerifiedPayment {
            gateway_payment_id: intent.latest_charge.unwrap_or_else(|| intent.id.clone()),
            gateway_order_id: intent.id,
            amount: intent.amount,
            currency: intent.currency.to_ascii_uppercase(),
        }),
        "requires_payment_method" | "canceled" => Err(PaymentError::Declined(
            intent
                .last_payment_error
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("payment {}", intent.status)),
        )),
        other => Err(PaymentError::InvalidRequest(format!(
            "payment is not complete (status: {other})"
        ))),
    }
}
