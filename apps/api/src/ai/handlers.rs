use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::ai::prompts::{
    BULLETS_PROMPT_TEMPLATE, COVER_LETTER_PROMPT_TEMPLATE, SUMMARY_PROMPT_TEMPLATE, WRITER_SYSTEM,
};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::llm_client::prompts::{json_system, NO_FABRICATION_INSTRUCTION};
use crate::models::resume::ResumeData;
use crate::payments::require_pro;
use crate::resumes::queries::get_resume;
use crate::sanitize::fields::{sanitize_list, sanitize_optional, sanitize_required};
use crate::sanitize::{sanitize_generated_text, sanitize_resume, FieldRule};
use crate::state::AppState;

const JOB_DESCRIPTION: FieldRule = FieldRule::free_text("job_description", 20_000);
const BULLET: FieldRule = FieldRule::free_text("bullets", 1000);
const POSITION: FieldRule = FieldRule::strict("position", 200);
const COMPANY: FieldRule = FieldRule::strict("company_name", 200);
const JOB_TITLE: FieldRule = FieldRule::strict("job_title", 200);
const RECIPIENT: FieldRule = FieldRule::strict("recipient_name", 100);
const MAX_BULLETS: usize = 30;
const MAX_PARAGRAPHS: usize = 6;
const NO_JOB: &str = "(none given)";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Either a saved resume or unsaved builder data.
#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub resume_id: Option<Uuid>,
    pub data: Option<ResumeData>,
    pub job_description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct BulletsRequest {
    pub bullets: Vec<String>,
    pub position: Option<String>,
    pub job_description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulletsResponse {
    pub bullets: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    pub resume_id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub recipient_name: Option<String>,
    pub job_description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoverLetterResponse {
    pub paragraphs: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt building and output cleaning
// ────────────────────────────────────────────────────────────────────────────

fn summary_prompt(resume_text: &str, job: Option<&str>) -> String {
    SUMMARY_PROMPT_TEMPLATE
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{resume}", resume_text)
        .replace("{job}", job.unwrap_or(NO_JOB))
}

fn bullets_prompt(bullets: &[String], position: Option<&str>, job: Option<&str>) -> String {
    let numbered = bullets
        .iter()
        .enumerate()
        .map(|(i, b)| format!("{}. {b}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    BULLETS_PROMPT_TEMPLATE
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{position}", position.unwrap_or("a professional"))
        .replace("{bullets}", &numbered)
        .replace("{job}", job.unwrap_or(NO_JOB))
}

fn cover_letter_prompt(
    resume_text: &str,
    company: &str,
    job_title: &str,
    recipient: Option<&str>,
    job: Option<&str>,
) -> String {
    COVER_LETTER_PROMPT_TEMPLATE
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{job_title}", job_title)
        .replace("{company}", company)
        .replace("{recipient}", recipient.unwrap_or("the hiring manager"))
        .replace("{resume}", resume_text)
        .replace("{job}", job.unwrap_or(NO_JOB))
}

/// Sanitizes model output as free text and drops empty items.
fn clean_generated(items: Vec<String>, max: usize) -> Result<Vec<String>, AppError> {
    let mut out = Vec::new();
    for item in items.into_iter().take(max) {
        let cleaned = sanitize_generated_text(&item)?;
        if !cleaned.is_empty() {
            out.push(cleaned);
        }
    }
    if out.is_empty() {
        return Err(AppError::Llm("model returned no usable text".to_string()));
    }
    Ok(out)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    require_pro(&state.db, user.id).await?;
    let job = sanitize_optional(req.job_description.as_deref(), &JOB_DESCRIPTION)?;

    let resume_text = match (req.resume_id, req.data) {
        (Some(id), _) => get_resume(&state.db, user.id, id).await?.data.plain_text(),
        (None, Some(data)) => sanitize_resume(&data)?.plain_text(),
        (None, None) => {
            return Err(AppError::Validation(
                "Either resume_id or data is required".to_string(),
            ))
        }
    };
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("The resume has no content yet".to_string()));
    }

    let generated: SummaryResponse = state
        .llm
        .call_json(
            &summary_prompt(&resume_text, job.as_deref()),
            &json_system(WRITER_SYSTEM),
        )
        .await
        .map_err(|e| AppError::Llm(format!("summary generation failed: {e}")))?;

    let summary = clean_generated(vec![generated.summary], 1)?.remove(0);
    info!("Generated summary for user {}", user.id);
    Ok(Json(SummaryResponse { summary }))
}

/// POST /api/ai/improve-bullets
pub async fn handle_improve_bullets(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<BulletsRequest>,
) -> Result<Json<BulletsResponse>, AppError> {
    require_pro(&state.db, user.id).await?;
    let bullets = sanitize_list(&req.bullets, &BULLET, MAX_BULLETS)?;
    if bullets.is_empty() {
        return Err(AppError::Validation("bullets must not be empty".to_string()));
    }
    let position = sanitize_optional(req.position.as_deref(), &POSITION)?;
    let job = sanitize_optional(req.job_description.as_deref(), &JOB_DESCRIPTION)?;

    let generated: BulletsResponse = state
        .llm
        .call_json(
            &bullets_prompt(&bullets, position.as_deref(), job.as_deref()),
            &json_system(WRITER_SYSTEM),
        )
        .await
        .map_err(|e| AppError::Llm(format!("bullet improvement failed: {e}")))?;

    let bullets = clean_generated(generated.bullets, bullets.len())?;
    Ok(Json(BulletsResponse { bullets }))
}

/// POST /api/ai/cover-letter
/// Drafts body paragraphs from a saved resume; the caller stores them in a
/// cover letter if they like them.
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    require_pro(&state.db, user.id).await?;
    let company = sanitize_required(&req.company_name, &COMPANY)?;
    let job_title = sanitize_required(&req.job_title, &JOB_TITLE)?;
    let recipient = sanitize_optional(req.recipient_name.as_deref(), &RECIPIENT)?;
    let job = sanitize_optional(req.job_description.as_deref(), &JOB_DESCRIPTION)?;
    let resume_text = get_resume(&state.db, user.id, req.resume_id)
        .await?
        .data
        .plain_text();

    let generated: CoverLetterResponse = state
        .llm
        .call_json(
            &cover_letter_prompt(
                &resume_text,
                &company,
                &job_title,
                recipient.as_deref(),
                job.as_deref(),
            ),
            &json_system(WRITER_SYSTEM),
        )
        .await
        .map_err(|e| AppError::Llm(format!("cover letter generation failed: {e}")))?;

    let paragraphs = clean_generated(generated.paragraphs, MAX_PARAGRAPHS)?;
    info!(
        "Generated {} cover letter paragraphs for user {}",
        paragraphs.len(),
        user.id
    );
    Ok(Json(CoverLetterResponse { paragraphs }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_prompt_fills_every_placeholder() {
        let prompt = summary_prompt("Jane Doe\nRust engineer", None);
        assert!(prompt.contains("Rust engineer"));
        assert!(prompt.contains(NO_JOB));
        assert!(prompt.contains(NO_FABRICATION_INSTRUCTION));
        assert!(!prompt.contains("{resume}") && !prompt.contains("{job}"));
    }

    #[test]
    fn test_bullets_prompt_numbers_bullets() {
        let bullets = vec!["fixed bugs".to_string(), "wrote docs".to_string()];
        let prompt = bullets_prompt(&bullets, Some("Backend Engineer"), Some("Rust role"));
        assert!(prompt.contains("1. fixed bugs\n2. wrote docs"));
        assert!(prompt.contains("as Backend Engineer"));
        assert!(prompt.contains("Rust role"));
    }

    #[test]
    fn test_cover_letter_prompt_defaults_recipient() {
        let prompt = cover_letter_prompt("resume", "Acme", "Engineer", None, None);
        assert!(prompt.contains("Engineer role at Acme, addressed to the hiring manager"));
    }

    #[test]
    fn test_clean_generated_strips_scripts_and_empties() {
        let cleaned = clean_generated(
            vec![
                "Led the <script>alert(1)</script>migration.".to_string(),
                "   ".to_string(),
                "Shipped v2.".to_string(),
            ],
            10,
        )
        .unwrap();
        assert_eq!(cleaned.len(), 2);
        assert!(!cleaned[0].contains("<script"));
        assert_eq!(cleaned[1], "Shipped v2.");
    }

    #[test]
    fn test_clean_generated_rejects_nothing_usable() {
        assert!(matches!(
            clean_generated(vec![String::new()], 3),
            Err(AppError::Llm(_))
        ));
    }

    #[test]
    fn test_generated_json_shapes() {
        let parsed: BulletsResponse =
            serde_json::from_str(r#"{"bullets": ["Built X", "Cut Y by 30%"]}"#).unwrap();
        assert_eq!(parsed.bullets.len(), 2);
    }
}
