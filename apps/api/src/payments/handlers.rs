use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::billing::SubscriptionRow;
use crate::payments::error::PaymentError;
use crate::payments::gateway::{GatewayKind, PaymentIntent, PaymentVerification};
use crate::payments::plans::{format_major_units, Plan};
use crate::payments::selector::{default_currency, normalize_country, select_gateway};
use crate::payments::service::{
    apply_webhook_outcome, cancel_subscription, current_subscription, start_checkout,
    verify_checkout,
};
use crate::payments::signature::{
    verify_razorpay_webhook, verify_stripe_webhook, STRIPE_TOLERANCE_SECS,
};
use crate::payments::webhooks::{parse_razorpay_event, parse_stripe_event};
use crate::state::AppState;

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";
const RAZORPAY_SIGNATURE_HEADER: &str = "x-razorpay-signature";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlansQuery {
    pub country: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanOffer {
    pub plan: Plan,
    pub name: &'static str,
    /// Minor units.
    pub amount: i64,
    pub display_amount: String,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub currency: String,
    pub gateway: Option<GatewayKind>,
    pub plans: Vec<PlanOffer>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan: Plan,
    pub country: String,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub transaction_id: Uuid,
    pub plan: Plan,
    pub intent: PaymentIntent,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub plan: String,
    pub status: String,
    pub active: bool,
    pub gateway: Option<String>,
    pub current_period_end: Option<chrono::DateTime<Utc>>,
}

impl From<Option<SubscriptionRow>> for SubscriptionResponse {
    fn from(row: Option<SubscriptionRow>) -> Self {
        match row {
            Some(row) => SubscriptionResponse {
                active: row.is_active_at(Utc::now()),
                plan: row.plan,
                status: row.status,
                gateway: row.gateway,
                current_period_end: row.current_period_end,
            },
            None => SubscriptionResponse {
                plan: Plan::Free.as_str().to_string(),
                status: "none".to_string(),
                active: false,
                gateway: None,
                current_period_end: None,
            },
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/plans?country=IN
/// Prices for the caller's country. Without a country the USD table is shown.
pub async fn handle_list_plans(
    Query(query): Query<PlansQuery>,
) -> Result<Json<PlansResponse>, AppError> {
    let country = query.country.as_deref().map(normalize_country).transpose()?;
    let currency = match (&query.currency, &country) {
        (Some(currency), _) => currency.trim().to_ascii_uppercase(),
        (None, Some(country)) => default_currency(country).to_string(),
        (None, None) => "USD".to_string(),
    };
    let gateway = country
        .as_deref()
        .map(|c| select_gateway(c, &currency))
        .transpose()?;

    let plans = Plan::PAID
        .into_iter()
        .map(|plan| {
            let amount = plan.price(&currency).ok_or_else(|| {
                PaymentError::unsupported(format!("plans are not sold in {currency}"))
            })?;
            Ok(PlanOffer {
                plan,
                name: plan.display_name(),
                amount,
                display_amount: format_major_units(amount, &currency),
                currency: currency.clone(),
            })
        })
        .collect::<Result<Vec<_>, PaymentError>>()?;

    Ok(Json(PlansResponse {
        currency,
        gateway,
        plans,
    }))
}

/// POST /api/payments/checkout
pub async fn handle_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    let checkout = start_checkout(
        &state.db,
        &state.gateways,
        user.id,
        req.plan,
        &req.country,
        req.currency.as_deref(),
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            transaction_id: checkout.transaction_id,
            plan: checkout.plan,
            intent: checkout.intent,
        }),
    ))
}

/// POST /api/payments/verify
pub async fn handle_verify(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<PaymentVerification>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let subscription = verify_checkout(&state.db, &state.gateways, user.id, &req).await?;
    Ok(Json(SubscriptionResponse::from(Some(subscription))))
}

/// GET /api/subscription
pub async fn handle_get_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let row = current_subscription(&state.db, user.id).await?;
    Ok(Json(SubscriptionResponse::from(row)))
}

/// POST /api/subscription/cancel
pub async fn handle_cancel_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let row = cancel_subscription(&state.db, user.id).await?;
    Ok(Json(SubscriptionResponse::from(Some(row))))
}

/// POST /api/webhooks/stripe
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or(PaymentError::NotConfigured("stripe webhooks"))?;
    let signature = header_str(&headers, STRIPE_SIGNATURE_HEADER)
        .ok_or(PaymentError::InvalidSignature)?;

    if let Err(e) = verify_stripe_webhook(
        &body,
        signature,
        secret,
        Utc::now().timestamp(),
        STRIPE_TOLERANCE_SECS,
    ) {
        warn!("Rejected Stripe webhook: {e}");
        return Err(e.into());
    }

    let outcome = parse_stripe_event(&body)?;
    info!("Stripe webhook: {outcome:?}");
    apply_webhook_outcome(&state.db, outcome).await?;
    Ok(StatusCode::OK)
}

/// POST /api/webhooks/razorpay
pub async fn handle_razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let secret = state
        .config
        .razorpay_webhook_secret
        .as_deref()
        .ok_or(PaymentError::NotConfigured("razorpay webhooks"))?;
    let signature = header_str(&headers, RAZORPAY_SIGNATURE_HEADER)
        .ok_or(PaymentError::InvalidSignature)?;

    if !verify_razorpay_webhook(&body, signature, secret) {
        warn!("Rejected Razorpay webhook with bad signature");
        return Err(PaymentError::InvalidSignature.into());
    }

    let outcome = parse_razorpay_event(&body)?;
    info!("Razorpay webhook: {outcome:?}");
    apply_webhook_outcome(&state.db, outcome).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plans_for_india_are_in_rupees_via_razorpay() {
        let Json(response) = handle_list_plans(Query(PlansQuery {
            country: Some("in".to_string()),
            currency: None,
        }))
        .await
        .unwrap();
        assert_eq!(response.currency, "INR");
        assert_eq!(response.gateway, Some(GatewayKind::Razorpay));
        assert_eq!(response.plans.len(), 2);
        assert_eq!(response.plans[0].amount, 49_900);
        assert_eq!(response.plans[0].display_amount, "499.00");
    }

    #[tokio::test]
    async fn test_plans_without_country_default_to_usd() {
        let Json(response) = handle_list_plans(Query(PlansQuery {
            country: None,
            currency: None,
        }))
        .await
        .unwrap();
        assert_eq!(response.currency, "USD");
        assert_eq!(response.gateway, None);
    }

    #[tokio::test]
    async fn test_plans_for_blocked_country_are_refused() {
        let result = handle_list_plans(Query(PlansQuery {
            country: Some("KP".to_string()),
            currency: None,
        }))
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_missing_subscription_reports_free_plan() {
        let response = SubscriptionResponse::from(None);
        assert_eq!(response.plan, "free");
        assert!(!response.active);
    }
}
