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
use crate::payments::plans::{format_major_units, parse_major_units};

const GATEWAY: &str = "paypal";
const PAYPAL_SANDBOX_URL: &str = "https://api-m.sandbox.paypal.com";
const PAYPAL_LIVE_URL: &str = "https://api-m.paypal.com";

/// Issues PayPal reports for a refused funding source.
const DECLINE_ISSUES: &[&str] = &[
    "INSTRUMENT_DECLINED",
    "PAYER_ACTION_REQUIRED",
    "TRANSACTION_REFUSED",
    "PAYER_CANNOT_PAY",
];

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct PaypalOrder {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    payments: Option<UnitPayments>,
}

#[derive(Debug, Deserialize)]
struct UnitPayments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    id: String,
    status: String,
    amount: Money,
}

#[derive(Debug, Deserialize)]
struct Money {
    currency_code: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PaypalErrorBody {
    message: Option<String>,
    #[serde(default)]
    details: Vec<PaypalErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct PaypalErrorDetail {
    issue: String,
    description: Option<String>,
}

fn paypal_error(status: u16, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<PaypalErrorBody>(body).ok();
    let detail = parsed.as_ref().and_then(|e| e.details.first());
    let declined = detail.is_some_and(|d| DECLINE_ISSUES.contains(&d.issue.as_str()));
    let message = detail
        .and_then(|d| d.description.clone())
        .or_else(|| parsed.as_ref().and_then(|e| e.message.clone()))
        .unwrap_or_else(|| body.chars().take(200).collect());
    classify_http_error(GATEWAY, status, message, declined)
}

pub struct PaypalGateway {
    client: Client,
    client_id: String,
    client_secret: String,
    base_url: String,
}

impl PaypalGateway {
    pub fn new(client_id: String, client_secret: String, live: bool) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::transport(GATEWAY, e))?;
        let base_url = if live { PAYPAL_LIVE_URL } else { PAYPAL_SANDBOX_URL };
        Ok(Self {
            client,
            client_id,
            client_secret,
            base_url: base_url.to_string(),
        })
    }

    /// Client-credentials token, fetched per operation.
    async fn access_token(&self) -> Result<String, PaymentError> {
        let request = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")]);
        let (status, body) = send(GATEWAY, request).await?;
        if !is_success(status) {
            return Err(paypal_error(status, &body));
        }
        let token: AccessToken = decode(GATEWAY, &body)?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl PaymentGateway for PaypalGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Paypal
    }

    /// POST /v2/checkout/orders with intent CAPTURE; the buyer approves at
    /// the returned URL.
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &PaymentMetadata,
    ) -> Result<PaymentIntent, PaymentError> {
        let currency = currency.to_ascii_uppercase();
        let token = self.access_token().await?;
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": metadata.transaction_id.to_string(),
                "custom_id": metadata.user_id.to_string(),
                "description": metadata.plan.display_name(),
                "amount": {
                    "currency_code": currency,
                    "value": format_major_units(amount, &currency),
                },
            }],
        });
        let request = self
            .client
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(token)
            .header("PayPal-Request-Id", metadata.transaction_id.to_string())
            .json(&body);

        let (status, body) = send(GATEWAY, request).await?;
        if !is_success(status) {
            return Err(paypal_error(status, &body));
        }
        let order: PaypalOrder = decode(GATEWAY, &body)?;
        debug!("Created PayPal order {} ({})", order.id, order.status);

        let approval_url = order
            .links
            .into_iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href);

        Ok(PaymentIntent {
            gateway: GatewayKind::Paypal,
            gateway_order_id: order.id,
            client_secret: None,
            key_id: None,
            approval_url,
            amount,
            currency,
        })
    }

    /// POST /v2/checkout/orders/:id/capture after the buyer approved.
    async fn verify_payment(
        &self,
        verification: &PaymentVerification,
    ) -> Result<VerifiedPayment, PaymentError> {
        let token = self.access_token().await?;
        let request = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.base_url, verification.gateway_order_id
            ))
            .bearer_auth(token)
            .json(&json!({}));

        let (status, body) = send(GATEWAY, request).await?;
        if !is_success(status) {
            return Err(paypal_error(status, &body));
        }
        let order: PaypalOrder = decode(GATEWAY, &body)?;
        capture_outcome(order)
    }
}

fn capture_outcome(order: PaypalOrder) -> Result<VerifiedPayment, PaymentError> {
    let capture = order
        .purchase_units
        .into_iter()
        .filter_map(|u| u.payments)
        .flat_map(|p| p.captures)
        .next();

    match (order.status.as_str(), capture) {
        ("COMPLETED", Some(capture)) if capture.status == "COMPLETED" => {
            let amount = parse_major_units(&capture.amount.value, &capture.amount.currency_code)
                .ok_or_else(|| PaymentError::Decode {
                    gateway: GATEWAY,
                    message: format!("bad amount '{}'", capture.amount.value),
                })?;
            Ok(VerifiedPayment {
                gateway_order_id: order.id,
                gateway_payment_id: capture.id,
                amount,
                currency: capture.amount.currency_code,
            })
        }
        (_, Some(capture)) if capture.status == "DECLINED" || capture.status == "FAILED" => {
            Err(PaymentError::Declined(format!("capture {}", capture.status.to_lowercase())))
        }
        (status, _) => Err(PaymentError::InvalidRequest(format!(
            "order is not complete (status: {status})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(order_status: &str, capture_status: &str) -> PaypalOrder {
        serde_json::from_value(serde_json::json!({
            "id": "5O190127TN364715T",
            "status": order_status,
            "purchase_units": [{
                "payments": {
                    "captures": [{
                        "id": "3C679366HH908993F",
                        "status": capture_status,
                        "amount": {"currency_code": "USD", "value": "9.99"}
                    }]
                }
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_completed_capture_is_verified_in_minor_units() {
        let verified = capture_outcome(order("COMPLETED", "COMPLETED")).unwrap();
        assert_eq!(verified.amount, 999);
        assert_eq!(verified.gateway_payment_id, "3C679366HH908993F");
    }

    #[test]
    fn test_declined_capture() {
        assert!(matches!(
            capture_outcome(order("COMPLETED", "DECLINED")),
            Err(PaymentError::Declined(_))
        ));
    }

    #[test]
    fn test_unapproved_order_is_not_complete() {
        let order: PaypalOrder =
            serde_json::from_str(r#"{"id": "X", "status": "PAYER_ACTION_REQUIRED"}"#).unwrap();
        assert!(matches!(
            capture_outcome(order),
            Err(PaymentError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_instrument_declined_is_declined() {
        let body = r#"{
            "name": "UNPROCESSABLE_ENTITY",
            "message": "The requested action could not be performed.",
            "details": [{"issue": "INSTRUMENT_DECLINED", "description": "The instrument presented was either declined by the processor or bank."}]
        }"#;
        assert!(matches!(paypal_error(422, body), PaymentError::Declined(_)));
    }

    #[test]
    fn test_other_unprocessable_entity_is_gateway_error() {
        let body = r#"{"name": "UNPROCESSABLE_ENTITY", "details": [{"issue": "ORDER_ALREADY_CAPTURED"}]}"#;
        assert!(matches!(
            paypal_error(422, body),
            PaymentError::Gateway { status: 422, .. }
        ));
    }

    #[test]
    fn test_sandbox_is_default_base_url() {
        let gateway = PaypalGateway::new("id".to_string(), "secret".to_string(), false).unwrap();
        assert_eq!(gateway.base_url, PAYPAL_SANDBOX_URL);
    }
}
