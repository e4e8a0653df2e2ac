use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::documents::handlers::LATEX_CONTENT_TYPE;
use crate::documents::pdf::compile_pdf;
use crate::documents::{generate_latex_resume, render_resume_html, TemplateId};
use crate::errors::AppError;
use crate::models::resume::{ResumeData, ResumeRow};
use crate::resumes::queries::{
    delete_resume, get_resume, insert_resume, list_resumes, store_latex_source, store_pdf_export,
    update_resume, ResumeSummary,
};
use crate::sanitize::documents::TITLE;
use crate::sanitize::fields::sanitize_required;
use crate::sanitize::sanitize_resume;
use crate::state::AppState;
use crate::storage::{delete_object, resume_pdf_key, upload_pdf};

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub title: String,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub data: ResumeData,
}

/// Cleaned fields ready to store. Unknown template ids are stored as the
/// template they render with.
fn prepare(req: &ResumeRequest) -> Result<(String, TemplateId, ResumeData), AppError> {
    let title = sanitize_required(&req.title, &TITLE)?;
    let template = TemplateId::resolve(&req.template_id);
    let data = sanitize_resume(&req.data)?;
    Ok((title, template, data))
}

fn attachment(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("attachment; filename=\"{safe}.pdf\"")
}

/// GET /api/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    Ok(Json(list_resumes(&state.db, user.id).await?))
}

/// POST /api/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ResumeRequest>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let (title, template, data) = prepare(&req)?;
    let row = insert_resume(&state.db, user.id, &title, template.as_str(), data).await?;
    info!("Created resume {} for user {}", row.id, user.id);
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRow>, AppError> {
    Ok(Json(get_resume(&state.db, user.id, id).await?))
}

/// PUT /api/resumes/:id
pub async fn handle_update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ResumeRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    let (title, template, data) = prepare(&req)?;
    let row = update_resume(&state.db, user.id, id, &title, template.as_str(), data).await?;
    Ok(Json(row))
}

/// DELETE /api/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let row = delete_resume(&state.db, user.id, id).await?;
    if let Some(key) = row.s3_pdf_key {
        // The row is gone either way; a stale object is only logged.
        if let Err(e) = delete_object(&state.s3, &state.config.s3_bucket, &key).await {
            warn!("Could not remove {key} for deleted resume {id}: {e}");
        }
    }
    info!("Deleted resume {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/resumes/:id/latex
pub async fn handle_export_latex(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let row = get_resume(&state.db, user.id, id).await?;
    let latex = generate_latex_resume(&row.data, &row.template_id);
    store_latex_source(&state.db, id, &latex).await?;
    Ok(([(header::CONTENT_TYPE, LATEX_CONTENT_TYPE)], latex))
}

/// GET /api/resumes/:id/html
pub async fn handle_export_html(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let row = get_resume(&state.db, user.id, id).await?;
    Ok(Html(render_resume_html(&row.data, &row.template_id)))
}

/// GET /api/resumes/:id/pdf
/// Compiles the resume, keeps a copy in object storage and returns the PDF.
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let row = get_resume(&state.db, user.id, id).await?;
    let latex = generate_latex_resume(&row.data, &row.template_id);

    let pdf = compile_pdf(
        &latex,
        &state.config.latex_bin,
        Duration::from_secs(state.config.latex_timeout_secs),
    )
    .await?;

    let key = resume_pdf_key(user.id, id);
    upload_pdf(&state.s3, &state.config.s3_bucket, &key, pdf.clone()).await?;
    store_pdf_export(&state.db, id, &latex, &key).await?;
    info!("Exported resume {id} to PDF ({} bytes)", pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&row.title)),
        ],
        pdf,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_normalizes_template_and_rejects_bad_title() {
        let req = ResumeRequest {
            title: "Backend roles".to_string(),
            template_id: "nonexistent-template".to_string(),
            data: ResumeData::default(),
        };
        let (title, template, _) = prepare(&req).unwrap();
        assert_eq!(title, "Backend roles");
        assert_eq!(template, TemplateId::Professional);

        let bad = ResumeRequest {
            title: "x'; DROP TABLE resumes; --".to_string(),
            ..req
        };
        assert!(matches!(prepare(&bad), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_title_is_required() {
        let req = ResumeRequest {
            title: "   ".to_string(),
            template_id: String::new(),
            data: ResumeData::default(),
        };
        assert!(prepare(&req).is_err());
    }

    #[test]
    fn test_attachment_filename_is_header_safe() {
        assert_eq!(
            attachment("Jane \"CV\" 2026"),
            "attachment; filename=\"Jane__CV__2026.pdf\""
        );
    }
}
