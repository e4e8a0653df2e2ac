use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::notification::{NotificationKind, NotificationRow};
use crate::sanitize::fields::sanitize_required;
use crate::sanitize::FieldRule;
use crate::state::AppState;

const LIST_LIMIT: i64 = 100;
const BROADCAST_TITLE: FieldRule = FieldRule::strict("title", 200);
const BROADCAST_MESSAGE: FieldRule = FieldRule::free_text("message", 2000);

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: u64,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
    /// Every user when absent.
    pub user_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub recipients: u64,
}

/// GET /api/notifications?unread=true
pub async fn handle_list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<NotificationRow>>, AppError> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT * FROM notifications
        WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(user.id)
    .bind(query.unread)
    .bind(LIST_LIMIT)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/notifications/unread-count
pub async fn handle_unread_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CountResponse>, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(CountResponse { count }))
}

/// PATCH /api/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationRow>, AppError> {
    let row: Option<NotificationRow> = sqlx::query_as(
        "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?;
    row.map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Notification {id} not found")))
}

/// POST /api/notifications/read-all
pub async fn handle_mark_all_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UpdatedResponse>, AppError> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user.id)
    .execute(&state.db)
    .await?;
    Ok(Json(UpdatedResponse {
        updated: result.rows_affected(),
    }))
}

/// DELETE /api/notifications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Notification {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/notifications
/// Sends a system notification to the listed users, or to everyone.
pub async fn handle_broadcast(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<BroadcastRequest>,
) -> Result<(StatusCode, Json<BroadcastResponse>), AppError> {
    user.require_admin()?;
    let title = sanitize_required(&req.title, &BROADCAST_TITLE)?;
    let message = sanitize_required(&req.message, &BROADCAST_MESSAGE)?;

    let result = sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, kind, title, message)
        SELECT gen_random_uuid(), id, $1, $2, $3 FROM users
        WHERE $4::uuid[] IS NULL OR id = ANY($4)
        "#,
    )
    .bind(NotificationKind::System.as_str())
    .bind(&title)
    .bind(&message)
    .bind(req.user_ids.as_deref())
    .execute(&state.db)
    .await?;

    info!(
        "Admin {} broadcast '{}' to {} users",
        user.id,
        title,
        result.rows_affected()
    );
    Ok((
        StatusCode::CREATED,
        Json(BroadcastResponse {
            recipients: result.rows_affected(),
        }),
    ))
}
