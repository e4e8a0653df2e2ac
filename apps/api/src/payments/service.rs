//! Checkout, verification and subscription bookkeeping on top of the
//! gateway adapters.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::billing::{
    PaymentTransactionRow, SubscriptionRow, SubscriptionStatus, TransactionStatus,
};
use crate::models::notification::NotificationKind;
use crate::notifications::notify;
use crate::payments::error::PaymentError;
use crate::payments::gateway::{
    GatewayKind, GatewayRegistry, PaymentIntent, PaymentMetadata, PaymentVerification,
};
use crate::payments::plans::{format_major_units, Plan};
use crate::payments::selector::{default_currency, normalize_country, select_gateway};
use crate::payments::webhooks::WebhookOutcome;

/// A pending transaction plus what the client needs to pay it.
#[derive(Debug)]
pub struct Checkout {
    pub transaction_id: Uuid,
    pub plan: Plan,
    pub intent: PaymentIntent,
}

/// Where a renewal's period starts: the end of a still-running period, or now.
pub fn next_period_end(
    existing: Option<&SubscriptionRow>,
    period: Duration,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let start = existing
        .filter(|s| s.is_active_at(now))
        .and_then(|s| s.current_period_end)
        .unwrap_or(now);
    start + period
}

fn parse_plan(plan: &str) -> Result<Plan, AppError> {
    plan.parse::<Plan>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

pub async fn start_checkout(
    db: &PgPool,
    gateways: &GatewayRegistry,
    user_id: Uuid,
    plan: Plan,
    country: &str,
    currency: Option<&str>,
) -> Result<Checkout, AppError> {
    if plan == Plan::Free {
        return Err(AppError::Validation(
            "The free plan does not require payment".to_string(),
        ));
    }
    let country = normalize_country(country)?;
    let currency = currency
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_currency(&country).to_string());

    let kind = select_gateway(&country, &currency)?;
    let amount = plan.price(&currency).ok_or_else(|| {
        PaymentError::unsupported(format!("{} is not sold in {currency}", plan.display_name()))
    })?;
    let gateway = gateways.get(kind)?;

    let transaction_id = Uuid::new_v4();
    let metadata = PaymentMetadata {
        transaction_id,
        user_id,
        plan,
    };
    let intent = gateway
        .create_payment_intent(amount, &currency, &metadata)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO payment_transactions
            (id, user_id, gateway, gateway_order_id, amount, currency, plan, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(transaction_id)
    .bind(user_id)
    .bind(kind.as_str())
    .bind(&intent.gateway_order_id)
    .bind(amount)
    .bind(&currency)
    .bind(plan.as_str())
    .bind(TransactionStatus::Pending.as_str())
    .execute(db)
    .await?;

    info!(
        "Checkout {} for user {}: {} {} via {}",
        transaction_id,
        user_id,
        plan.as_str(),
        currency,
        kind.as_str()
    );
    Ok(Checkout {
        transaction_id,
        plan,
        intent,
    })
}

/// Confirms a payment with the gateway and activates the subscription.
/// Calling it again for an already settled transaction is a no-op.
pub async fn verify_checkout(
    db: &PgPool,
    gateways: &GatewayRegistry,
    user_id: Uuid,
    verification: &PaymentVerification,
) -> Result<SubscriptionRow, AppError> {
    let row: Option<PaymentTransactionRow> = sqlx::query_as(
        "SELECT * FROM payment_transactions WHERE gateway_order_id = $1 AND user_id = $2",
    )
    .bind(&verification.gateway_order_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    let row = row.ok_or_else(|| {
        AppError::NotFound(format!("Order {} not found", verification.gateway_order_id))
    })?;

    if row.status == TransactionStatus::Succeeded.as_str() {
        debug!("Transaction {} already settled", row.id);
        return load_subscription(db, user_id).await;
    }
    if !row.can_settle() {
        return Err(AppError::Conflict(format!(
            "Transaction is {}, start a new checkout",
            row.status
        )));
    }

    let kind = row
        .gateway
        .parse::<GatewayKind>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let gateway = gateways.get(kind)?;

    match gateway.verify_payment(verification).await {
        Ok(verified) => {
            if verified.amount != row.amount || !verified.currency.eq_ignore_ascii_case(&row.currency)
            {
                warn!(
                    "Transaction {} paid {} {} but expected {} {}",
                    row.id, verified.amount, verified.currency, row.amount, row.currency
                );
                mark_failed(db, &row, "Paid amount does not match the order").await?;
                return Err(AppError::Validation(
                    "Paid amount does not match the order".to_string(),
                ));
            }
            mark_succeeded(db, &row, &verified.gateway_payment_id).await
        }
        Err(PaymentError::Declined(reason)) => {
            mark_failed(db, &row, &reason).await?;
            Err(AppError::PaymentRequired(reason))
        }
        Err(e) => Err(e.into()),
    }
}

/// Settles the transaction and extends the user's subscription in one
/// database transaction.
pub async fn mark_succeeded(
    db: &PgPool,
    row: &PaymentTransactionRow,
    gateway_payment_id: &str,
) -> Result<SubscriptionRow, AppError> {
    let plan = parse_plan(&row.plan)?;
    let period = plan.period().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("plan {} has no billing period", plan.as_str()))
    })?;

    let mut tx = db.begin().await?;

    // Webhook and client verification can race; only one of them settles.
    let settled: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE payment_transactions
        SET status = $2, gateway_payment_id = $3, failure_reason = NULL, updated_at = NOW()
        WHERE id = $1 AND status = ANY($4)
        RETURNING id
        "#,
    )
    .bind(row.id)
    .bind(TransactionStatus::Succeeded.as_str())
    .bind(gateway_payment_id)
    .bind(TransactionStatus::SETTLEABLE.map(|s| s.as_str().to_string()).to_vec())
    .fetch_optional(&mut *tx)
    .await?;
    if settled.is_none() {
        tx.rollback().await?;
        return load_subscription(db, row.user_id).await;
    }

    let existing: Option<SubscriptionRow> =
        sqlx::query_as("SELECT * FROM subscriptions WHERE user_id = $1 FOR UPDATE")
            .bind(row.user_id)
            .fetch_optional(&mut *tx)
            .await?;
    let now = Utc::now();
    let period_end = next_period_end(existing.as_ref(), period, now);

    let subscription: SubscriptionRow = sqlx::query_as(
        r#"
        INSERT INTO subscriptions (id, user_id, plan, status, gateway, current_period_end)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id) DO UPDATE SET
            plan = EXCLUDED.plan,
            status = EXCLUDED.status,
            gateway = EXCLUDED.gateway,
            current_period_end = EXCLUDED.current_period_end,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(row.user_id)
    .bind(plan.as_str())
    .bind(SubscriptionStatus::Active.as_str())
    .bind(&row.gateway)
    .bind(period_end)
    .fetch_one(&mut *tx)
    .await?;

    notify(
        &mut *tx,
        row.user_id,
        NotificationKind::PaymentSucceeded,
        "Payment received",
        &format!(
            "We received your payment of {} {}.",
            format_major_units(row.amount, &row.currency),
            row.currency
        ),
    )
    .await?;
    notify(
        &mut *tx,
        row.user_id,
        NotificationKind::SubscriptionActivated,
        "Subscription active",
        &format!(
            "Your {} plan is active until {}.",
            plan.display_name(),
            period_end.format("%B %-d, %Y")
        ),
    )
    .await?;

    tx.commit().await?;
    info!(
        "Transaction {} settled; user {} on {} until {}",
        row.id,
        row.user_id,
        plan.as_str(),
        period_end.to_rfc3339()
    );
    Ok(subscription)
}

/// Marks a pending transaction failed and tells the user why.
pub async fn mark_failed(
    db: &PgPool,
    row: &PaymentTransactionRow,
    reason: &str,
) -> Result<(), AppError> {
    let mut tx = db.begin().await?;
    let failed: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE payment_transactions
        SET status = $2, failure_reason = $3, updated_at = NOW()
        WHERE id = $1 AND status = $4
        RETURNING id
        "#,
    )
    .bind(row.id)
    .bind(TransactionStatus::Failed.as_str())
    .bind(reason)
    .bind(TransactionStatus::Pending.as_str())
    .fetch_optional(&mut *tx)
    .await?;

    if failed.is_some() {
        notify(
            &mut *tx,
            row.user_id,
            NotificationKind::PaymentFailed,
            "Payment failed",
            &format!("Your payment could not be completed: {reason}"),
        )
        .await?;
        warn!("Transaction {} failed: {reason}", row.id);
    }
    tx.commit().await?;
    Ok(())
}

/// Applies a verified webhook event. Unknown orders are logged and dropped
/// so the vendor does not keep redelivering them.
pub async fn apply_webhook_outcome(db: &PgPool, outcome: WebhookOutcome) -> Result<(), AppError> {
    let (gateway, order_id) = match &outcome {
        WebhookOutcome::Succeeded {
            gateway,
            gateway_order_id,
            ..
        }
        | WebhookOutcome::Failed {
            gateway,
            gateway_order_id,
            ..
        } => (*gateway, gateway_order_id.as_str()),
        WebhookOutcome::Ignored(event) => {
            debug!("Ignoring webhook event {event}");
            return Ok(());
        }
    };

    let row: Option<PaymentTransactionRow> = sqlx::query_as(
        "SELECT * FROM payment_transactions WHERE gateway = $1 AND gateway_order_id = $2",
    )
    .bind(gateway.as_str())
    .bind(order_id)
    .fetch_optional(db)
    .await?;
    let Some(row) = row else {
        warn!("Webhook for unknown {} order {order_id}", gateway.as_str());
        return Ok(());
    };

    match outcome {
        WebhookOutcome::Succeeded {
            gateway_payment_id, ..
        } => {
            mark_succeeded(db, &row, &gateway_payment_id).await?;
        }
        WebhookOutcome::Failed { reason, .. } => mark_failed(db, &row, &reason).await?,
        WebhookOutcome::Ignored(_) => {}
    }
    Ok(())
}

pub async fn current_subscription(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Option<SubscriptionRow>, AppError> {
    let row = sqlx::query_as::<_, SubscriptionRow>("SELECT * FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

async fn load_subscription(db: &PgPool, user_id: Uuid) -> Result<SubscriptionRow, AppError> {
    current_subscription(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No subscription found".to_string()))
}

/// Gate for paid features.
pub async fn require_pro(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    let active = current_subscription(db, user_id)
        .await?
        .is_some_and(|s| s.is_active_at(Utc::now()));
    if !active {
        return Err(AppError::PaymentRequired(
            "This feature requires a Pro subscription".to_string(),
        ));
    }
    Ok(())
}

/// Cancels immediately; paid access ends with it.
pub async fn cancel_subscription(db: &PgPool, user_id: Uuid) -> Result<SubscriptionRow, AppError> {
    let mut tx = db.begin().await?;
    let row: Option<SubscriptionRow> = sqlx::query_as(
        r#"
        UPDATE subscriptions SET status = $2, updated_at = NOW()
        WHERE user_id = $1 AND status = $3
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(SubscriptionStatus::Cancelled.as_str())
    .bind(SubscriptionStatus::Active.as_str())
    .fetch_optional(&mut *tx)
    .await?;
    let row = row.ok_or_else(|| AppError::NotFound("No active subscription".to_string()))?;

    notify(
        &mut *tx,
        user_id,
        NotificationKind::SubscriptionCancelled,
        "Subscription cancelled",
        "Your Pro subscription has been cancelled.",
    )
    .await?;
    tx.commit().await?;

    info!("User {user_id} cancelled subscription {}", row.id);
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: &str, end: Option<DateTime<Utc>>) -> SubscriptionRow {
        let now = Utc::now();
        SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan: "pro_monthly".to_string(),
            status: status.to_string(),
            gateway: Some("stripe".to_string()),
            gateway_customer_id: None,
            gateway_subscription_id: None,
            current_period_end: end,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_first_payment_starts_now() {
        let now = Utc::now();
        assert_eq!(
            next_period_end(None, Duration::days(30), now),
            now + Duration::days(30)
        );
    }

    #[test]
    fn test_renewal_extends_running_period() {
        let now = Utc::now();
        let end = now + Duration::days(10);
        let existing = subscription("active", Some(end));
        assert_eq!(
            next_period_end(Some(&existing), Duration::days(30), now),
            end + Duration::days(30)
        );
    }

    #[test]
    fn test_lapsed_or_cancelled_period_restarts_now() {
        let now = Utc::now();
        let lapsed = subscription("active", Some(now - Duration::days(5)));
        let cancelled = subscription("cancelled", Some(now + Duration::days(5)));
        for existing in [lapsed, cancelled] {
            assert_eq!(
                next_period_end(Some(&existing), Duration::days(365), now),
                now + Duration::days(365)
            );
        }
    }

    #[test]
    fn test_unknown_plan_is_internal_error() {
        assert!(matches!(parse_plan("platinum"), Err(AppError::Internal(_))));
        assert_eq!(parse_plan("pro_yearly").unwrap(), Plan::ProYearly);
    }
}
