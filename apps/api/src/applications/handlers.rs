use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::applications::board::{
    append_history, applied_at_after_move, group_board, history_line, BoardColumn,
};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::job_application::{ApplicationStatus, JobApplicationInput, JobApplicationRow};
use crate::models::notification::NotificationKind;
use crate::notifications::notify;
use crate::sanitize::fields::sanitize_optional;
use crate::sanitize::{sanitize_job_application, FieldRule};
use crate::state::AppState;

const MOVE_NOTE: FieldRule = FieldRule::free_text("note", 500);

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub status: ApplicationStatus,
    pub note: Option<String>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Job application {id} not found"))
}

/// GET /api/job-applications?status=applied
pub async fn handle_list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<JobApplicationRow>>, AppError> {
    let rows = sqlx::query_as::<_, JobApplicationRow>(
        r#"
        SELECT * FROM job_applications
        WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user.id)
    .bind(query.status.map(|s| s.as_str()))
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/job-applications/board
pub async fn handle_board(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<BoardColumn>>, AppError> {
    let rows = sqlx::query_as::<_, JobApplicationRow>(
        "SELECT * FROM job_applications WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(group_board(rows)))
}

/// POST /api/job-applications
/// New applications start in the `saved` column.
pub async fn handle_create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<JobApplicationInput>,
) -> Result<(StatusCode, Json<JobApplicationRow>), AppError> {
    let input = sanitize_job_application(&input)?;

    let row = sqlx::query_as::<_, JobApplicationRow>(
        r#"
        INSERT INTO job_applications
            (id, user_id, company, position, location, job_url, salary_range,
             description, notes, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&input.company)
    .bind(&input.position)
    .bind(&input.location)
    .bind(&input.job_url)
    .bind(&input.salary_range)
    .bind(&input.description)
    .bind(&input.notes)
    .bind(ApplicationStatus::Saved.as_str())
    .fetch_one(&state.db)
    .await?;

    info!("Created job application {} for user {}", row.id, user.id);
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/job-applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JobApplicationRow>, AppError> {
    let row: Option<JobApplicationRow> =
        sqlx::query_as("SELECT * FROM job_applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;
    row.map(Json).ok_or_else(|| not_found(id))
}

/// PUT /api/job-applications/:id
pub async fn handle_update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<JobApplicationInput>,
) -> Result<Json<JobApplicationRow>, AppError> {
    let input = sanitize_job_application(&input)?;

    let row: Option<JobApplicationRow> = sqlx::query_as(
        r#"
        UPDATE job_applications
        SET company = $3, position = $4, location = $5, job_url = $6,
            salary_range = $7, description = $8, notes = $9, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(&input.company)
    .bind(&input.position)
    .bind(&input.location)
    .bind(&input.job_url)
    .bind(&input.salary_range)
    .bind(&input.description)
    .bind(&input.notes)
    .fetch_optional(&state.db)
    .await?;
    row.map(Json).ok_or_else(|| not_found(id))
}

/// DELETE /api/job-applications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM job_applications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/job-applications/:id/status
/// Moves the card to another column, logs the move and notifies the user.
/// Moving to the current column changes nothing.
pub async fn handle_move(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<JobApplicationRow>, AppError> {
    let note = sanitize_optional(req.note.as_deref(), &MOVE_NOTE)?;

    let mut tx = state.db.begin().await?;
    let current: Option<JobApplicationRow> = sqlx::query_as(
        "SELECT * FROM job_applications WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&mut *tx)
    .await?;
    let current = current.ok_or_else(|| not_found(id))?;

    let from = current.status();
    if from == req.status {
        return Ok(Json(current));
    }

    let now = Utc::now();
    let line = history_line(now, from, req.status, note.as_deref());
    let row: JobApplicationRow = sqlx::query_as(
        r#"
        UPDATE job_applications
        SET status = $2, history = $3, applied_at = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.status.as_str())
    .bind(append_history(&current.history, &line))
    .bind(applied_at_after_move(current.applied_at, req.status, now))
    .fetch_one(&mut *tx)
    .await?;

    notify(
        &mut *tx,
        user.id,
        NotificationKind::ApplicationStatusChanged,
        "Application updated",
        &format!(
            "{} at {} moved from {from} to {}.",
            row.position, row.company, req.status
        ),
    )
    .await?;
    tx.commit().await?;

    info!("Moved job application {id}: {from} -> {}", req.status);
    Ok(Json(row))
}
