//! In-app notifications: written by billing and the application board,
//! read and dismissed by the recipient.

pub mod handlers;

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::notification::{NotificationKind, NotificationRow};

/// Inserts one notification. Takes any executor so callers can write it in
/// the same transaction as the change it reports.
pub async fn notify<'e, E>(
    executor: E,
    user_id: Uuid,
    kind: NotificationKind,
    title: &str,
    message: &str,
) -> Result<NotificationRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, NotificationRow>(
        r#"
        INSERT INTO notifications (id, user_id, kind, title, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(kind.as_str())
    .bind(title)
    .bind(message)
    .fetch_one(executor)
    .await
}
