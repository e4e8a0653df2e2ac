use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::payments::error::PaymentError;
use crate::payments::paypal::PaypalGateway;
use crate::payments::plans::Plan;
use crate::payments::razorpay::RazorpayGateway;
use crate::payments::stripe::StripeGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayKind {
    Stripe,
    Razorpay,
    Paypal,
}

impl GatewayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::Stripe => "stripe",
            GatewayKind::Razorpay => "razorpay",
            GatewayKind::Paypal => "paypal",
        }
    }

    pub fn supported_currencies(&self) -> &'static [&'static str] {
        match self {
            GatewayKind::Stripe => &["USD", "EUR", "GBP", "CAD", "AUD", "JPY"],
            GatewayKind::Razorpay => &["INR"],
            GatewayKind::Paypal => &["USD", "EUR", "GBP", "CAD", "AUD", "JPY"],
        }
    }
}

impl FromStr for GatewayKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(GatewayKind::Stripe),
            "razorpay" => Ok(GatewayKind::Razorpay),
            "paypal" => Ok(GatewayKind::Paypal),
            other => Err(format!("unknown gateway '{other}'")),
        }
    }
}

/// Passed through to the vendor so its dashboard can be matched back to us.
#[derive(Debug, Clone)]
pub struct PaymentMetadata {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub plan: Plan,
}

/// What the client needs to complete payment with the vendor's widget.
/// Which optional field is set depends on the gateway: Stripe returns a
/// client secret, Razorpay a public key id, PayPal an approval URL.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub gateway: GatewayKind,
    pub gateway_order_id: String,
    pub client_secret: Option<String>,
    pub key_id: Option<String>,
    pub approval_url: Option<String>,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentVerification {
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub amount: i64,
    pub currency: String,
}

/// Uniform adapter over a payment vendor. Amounts are minor units.
/// Implementations never retry; a failed call is reported once.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn kind(&self) -> GatewayKind;

    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &PaymentMetadata,
    ) -> Result<PaymentIntent, PaymentError>;

    async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> Result<VerifiedPayment, PaymentError>;
}

/// The configured gateways. A gateway without credentials is absent and
/// reports `NotConfigured` when selected.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    stripe: Option<Arc<dyn PaymentGateway>>,
    razorpay: Option<Arc<dyn PaymentGateway>>,
    paypal: Option<Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn from_config(config: &Config) -> Result<Self, PaymentError> {
        let mut registry = GatewayRegistry::default();

        if let Some(secret_key) = &config.stripe_secret_key {
            registry = registry.with_gateway(Arc::new(StripeGateway::new(secret_key.clone())?));
        }
        if let (Some(key_id), Some(key_secret)) =
            (&config.razorpay_key_id, &config.razorpay_key_secret)
        {
            registry = registry.with_gateway(Arc::new(RazorpayGateway::new(
                key_id.clone(),
                key_secret.clone(),
            )?));
        }
        if let (Some(client_id), Some(client_secret)) =
            (&config.paypal_client_id, &config.paypal_client_secret)
        {
            registry = registry.with_gateway(Arc::new(PaypalGateway::new(
                client_id.clone(),
                client_secret.clone(),
                config.paypal_live,
            )?));
        }

        info!(
            "Payment gateways configured: stripe={} razorpay={} paypal={}",
            registry.stripe.is_some(),
            registry.razorpay.is_some(),
            registry.paypal.is_some()
        );
        Ok(registry)
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        match gateway.kind() {
            GatewayKind::Stripe => self.stripe = Some(gateway),
            GatewayKind::Razorpay => self.razorpay = Some(gateway),
            GatewayKind::Paypal => self.paypal = Some(gateway),
        }
        self
    }

    pub fn get(&self, kind: GatewayKind) -> Result<Arc<dyn PaymentGateway>, PaymentError> {
        let slot = match kind {
            GatewayKind::Stripe => &self.stripe,
            GatewayKind::Razorpay => &self.razorpay,
            GatewayKind::Paypal => &self.paypal,
        };
        slot.clone().ok_or(PaymentError::NotConfigured(kind.as_str()))
    }
}
