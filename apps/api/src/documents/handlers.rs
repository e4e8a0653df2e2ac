use axum::{
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::documents::templates::{list_templates, TemplateInfo};
use crate::documents::{generate_latex_resume, render_resume_html};
use crate::errors::AppError;
use crate::models::resume::ResumeData;
use crate::sanitize::sanitize_resume;

pub const LATEX_CONTENT_TYPE: &str = "application/x-tex; charset=utf-8";

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewFormat {
    #[default]
    Html,
    Latex,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub format: PreviewFormat,
    pub data: ResumeData,
}

/// GET /api/templates
pub async fn handle_list_templates() -> Json<Vec<TemplateInfo>> {
    Json(list_templates())
}

/// POST /api/documents/preview
/// Renders unsaved builder data; nothing is persisted.
pub async fn handle_preview(
    _user: AuthUser,
    Json(req): Json<PreviewRequest>,
) -> Result<Response, AppError> {
    let data = sanitize_resume(&req.data)?;
    let response = match req.format {
        PreviewFormat::Html => Html(render_resume_html(&data, &req.template_id)).into_response(),
        PreviewFormat::Latex => (
            [(header::CONTENT_TYPE, LATEX_CONTENT_TYPE)],
            generate_latex_resume(&data, &req.template_id),
        )
            .into_response(),
    };
    Ok(response)
}
