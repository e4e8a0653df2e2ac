//! Axum route handlers for the keyword API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::keywords::categorizer::{categorize_keywords, CategorizedKeywords};
use crate::keywords::extractor::{
    extract_keywords, keyword_match_report, KeywordMatchReport, DEFAULT_KEYWORD_LIMIT,
};
use crate::keywords::llm::extract_keywords_with_llm;
use crate::resumes::queries::get_resume;
use crate::state::AppState;

const MAX_KEYWORDS: usize = 500;
const MAX_KEYWORD_LIMIT: usize = 100;
const MAX_TEXT_CHARS: usize = 50_000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    pub limit: Option<usize>,
    #[serde(default)]
    pub use_ai: bool,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub keywords: Vec<String>,
    pub categorized: CategorizedKeywords,
}

/// Compare either a saved resume or pasted resume text against a job description.
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub resume_id: Option<Uuid>,
    pub resume_text: Option<String>,
    pub job_description: String,
    pub limit: Option<usize>,
}

fn check_text(text: &str, field: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "{field} exceeds maximum length of {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(())
}

fn resolve_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_KEYWORD_LIMIT)
        .clamp(1, MAX_KEYWORD_LIMIT)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/keywords/categorize
pub async fn handle_categorize(
    Json(req): Json<CategorizeRequest>,
) -> Result<Json<CategorizedKeywords>, AppError> {
    if req.keywords.len() > MAX_KEYWORDS {
        return Err(AppError::Validation(format!(
            "Too many keywords (max {MAX_KEYWORDS})"
        )));
    }
    Ok(Json(categorize_keywords(&req.keywords)))
}

/// POST /api/keywords/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    check_text(&req.text, "text")?;
    let limit = resolve_limit(req.limit);

    let keywords = if req.use_ai {
        extract_keywords_with_llm(&state.llm, &req.text, limit).await?
    } else {
        extract_keywords(&req.text, limit)
    };
    let categorized = categorize_keywords(&keywords);
    debug!(
        "Extracted {} keywords (ai: {})",
        categorized.len(),
        req.use_ai
    );
    Ok(Json(ExtractResponse {
        keywords,
        categorized,
    }))
}

/// POST /api/keywords/match
pub async fn handle_match(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<MatchRequest>,
) -> Result<Json<KeywordMatchReport>, AppError> {
    check_text(&req.job_description, "job_description")?;

    let resume_text = match (req.resume_id, req.resume_text) {
        (Some(id), _) => get_resume(&state.db, user.id, id).await?.data.plain_text(),
        (None, Some(text)) => text,
        (None, None) => {
            return Err(AppError::Validation(
                "Either resume_id or resume_text is required".to_string(),
            ))
        }
    };
    check_text(&resume_text, "resume")?;

    let report = keyword_match_report(
        &resume_text,
        &req.job_description,
        resolve_limit(req.limit),
    );
    if report.matched.is_empty() && report.missing.is_empty() {
        return Err(AppError::Validation(
            "No keywords found in job_description".to_string(),
        ));
    }
    Ok(Json(report))
}

/// POST /api/keywords/extract/pdf (multipart, field `file`)
/// Pulls text out of an uploaded PDF resume and extracts its keywords.
pub async fn handle_extract_pdf(
    _user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>, AppError> {
    let mut pdf = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?;
            pdf = Some(bytes);
            break;
        }
    }
    let pdf = pdf.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?;
    check_text(&text, "extracted text")?;

    let keywords = extract_keywords(&text, DEFAULT_KEYWORD_LIMIT);
    let categorized = categorize_keywords(&keywords);
    Ok(Json(ExtractResponse {
        keywords,
        categorized,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit_bounds() {
        assert_eq!(resolve_limit(None), DEFAULT_KEYWORD_LIMIT);
        assert_eq!(resolve_limit(Some(0)), 1);
        assert_eq!(resolve_limit(Some(10_000)), MAX_KEYWORD_LIMIT);
    }

    #[test]
    fn test_check_text_rejects_blank_and_oversized() {
        assert!(check_text("   ", "text").is_err());
        assert!(check_text(&"a".repeat(MAX_TEXT_CHARS + 1), "text").is_err());
        assert!(check_text("Rust engineer", "text").is_ok());
    }

    #[tokio::test]
    async fn test_categorize_handler_rejects_huge_lists() {
        let req = CategorizeRequest {
            keywords: vec!["Rust".to_string(); MAX_KEYWORDS + 1],
        };
        assert!(handle_categorize(Json(req)).await.is_err());
    }
}
