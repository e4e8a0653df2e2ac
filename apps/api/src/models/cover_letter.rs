use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Sender details printed in the letter head.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sender {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverLetterData {
    pub sender: Sender,
    pub recipient_name: Option<String>,
    pub recipient_title: Option<String>,
    pub company_name: String,
    pub company_address: Option<String>,
    pub job_title: Option<String>,
    /// Free-form, printed as given ("March 3, 2026").
    pub date: Option<String>,
    pub salutation: Option<String>,
    pub body_paragraphs: Vec<String>,
    pub closing: Option<String>,
    pub signature_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoverLetterRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Option<Uuid>,
    pub title: String,
    pub template_id: String,
    pub data: Json<CoverLetterData>,
    pub latex_source: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
