use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeData, ResumeRow};

/// List entry; the document body is left out.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub title: String,
    pub template_id: String,
    pub s3_pdf_key: Option<String>,
    pub updated_at: DateTime<Utc>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Resume {id} not found"))
}

/// Loads a resume owned by `user_id`. Other users' resumes are reported
/// as missing.
pub async fn get_resume(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<ResumeRow, AppError> {
    let row: Option<ResumeRow> =
        sqlx::query_as("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    row.ok_or_else(|| not_found(id))
}

pub async fn list_resumes(db: &PgPool, user_id: Uuid) -> Result<Vec<ResumeSummary>, AppError> {
    let rows = sqlx::query_as::<_, ResumeSummary>(
        r#"
        SELECT id, title, template_id, s3_pdf_key, updated_at
        FROM resumes
        WHERE user_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert_resume(
    db: &PgPool,
    user_id: Uuid,
    title: &str,
    template_id: &str,
    data: ResumeData,
) -> Result<ResumeRow, AppError> {
    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, user_id, title, template_id, data)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(template_id)
    .bind(Json(data))
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Saving new content invalidates the last exports.
pub async fn update_resume(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    title: &str,
    template_id: &str,
    data: ResumeData,
) -> Result<ResumeRow, AppError> {
    let row: Option<ResumeRow> = sqlx::query_as(
        r#"
        UPDATE resumes
        SET title = $3, template_id = $4, data = $5,
            latex_source = NULL, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(title)
    .bind(template_id)
    .bind(Json(data))
    .fetch_optional(db)
    .await?;
    row.ok_or_else(|| not_found(id))
}

pub async fn delete_resume(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<ResumeRow, AppError> {
    let row: Option<ResumeRow> =
        sqlx::query_as("DELETE FROM resumes WHERE id = $1 AND user_id = $2 RETURNING *")
            .bind(id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    row.ok_or_else(|| not_found(id))
}

pub async fn store_latex_source(db: &PgPool, id: Uuid, latex: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE resumes SET latex_source = $2 WHERE id = $1")
        .bind(id)
        .bind(latex)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn store_pdf_export(
    db: &PgPool,
    id: Uuid,
    latex: &str,
    s3_key: &str,
) -> Result<(), AppError> {
    sqlx::query("UPDATE resumes SET latex_source = $2, s3_pdf_key = $3 WHERE id = $1")
        .bind(id)
        .bind(latex)
        .bind(s3_key)
        .execute(db)
        .await?;
    Ok(())
}
