use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::documents::handlers::LATEX_CONTENT_TYPE;
use crate::documents::{generate_latex_cover_letter, TemplateId};
use crate::errors::AppError;
use crate::models::cover_letter::{CoverLetterData, CoverLetterRow};
use crate::resumes::queries::get_resume;
use crate::sanitize::documents::TITLE;
use crate::sanitize::fields::sanitize_required;
use crate::sanitize::sanitize_cover_letter;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    pub title: String,
    #[serde(default)]
    pub template_id: String,
    pub resume_id: Option<Uuid>,
    #[serde(default)]
    pub data: CoverLetterData,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CoverLetterSummary {
    pub id: Uuid,
    pub title: String,
    pub template_id: String,
    pub resume_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Cover letter {id} not found"))
}

/// Sanitizes the request and checks that a linked resume is the caller's.
async fn prepare(
    state: &AppState,
    user_id: Uuid,
    req: &CoverLetterRequest,
) -> Result<(String, TemplateId, CoverLetterData), AppError> {
    let title = sanitize_required(&req.title, &TITLE)?;
    let data = sanitize_cover_letter(&req.data)?;
    if let Some(resume_id) = req.resume_id {
        get_resume(&state.db, user_id, resume_id).await?;
    }
    Ok((title, TemplateId::resolve(&req.template_id), data))
}

async fn fetch(state: &AppState, user_id: Uuid, id: Uuid) -> Result<CoverLetterRow, AppError> {
    let row: Option<CoverLetterRow> =
        sqlx::query_as("SELECT * FROM cover_letters WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?;
    row.ok_or_else(|| not_found(id))
}

/// GET /api/cover-letters
pub async fn handle_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CoverLetterSummary>>, AppError> {
    let rows = sqlx::query_as::<_, CoverLetterSummary>(
        r#"
        SELECT id, title, template_id, resume_id, updated_at
        FROM cover_letters
        WHERE user_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// POST /api/cover-letters
pub async fn handle_create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CoverLetterRequest>,
) -> Result<(StatusCode, Json<CoverLetterRow>), AppError> {
    let (title, template, data) = prepare(&state, user.id, &req).await?;

    let row = sqlx::query_as::<_, CoverLetterRow>(
        r#"
        INSERT INTO cover_letters (id, user_id, resume_id, title, template_id, data)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(req.resume_id)
    .bind(&title)
    .bind(template.as_str())
    .bind(SqlJson(data))
    .fetch_one(&state.db)
    .await?;

    info!("Created cover letter {} for user {}", row.id, user.id);
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/cover-letters/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CoverLetterRow>, AppError> {
    Ok(Json(fetch(&state, user.id, id).await?))
}

/// PUT /api/cover-letters/:id
pub async fn handle_update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterRow>, AppError> {
    let (title, template, data) = prepare(&state, user.id, &req).await?;

    let row: Option<CoverLetterRow> = sqlx::query_as(
        r#"
        UPDATE cover_letters
        SET resume_id = $3, title = $4, template_id = $5, data = $6,
            latex_source = NULL, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(req.resume_id)
    .bind(&title)
    .bind(template.as_str())
    .bind(SqlJson(data))
    .fetch_optional(&state.db)
    .await?;
    row.map(Json).ok_or_else(|| not_found(id))
}

/// DELETE /api/cover-letters/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM cover_letters WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/cover-letters/:id/latex
pub async fn handle_export_latex(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let row = fetch(&state, user.id, id).await?;
    let latex = generate_latex_cover_letter(&row.data, &row.template_id);

    sqlx::query("UPDATE cover_letters SET latex_source = $2 WHERE id = $1")
        .bind(id)
        .bind(&latex)
        .execute(&state.db)
        .await?;

    Ok(([(header::CONTENT_TYPE, LATEX_CONTENT_TYPE)], latex))
}
