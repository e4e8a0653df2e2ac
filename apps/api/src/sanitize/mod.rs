// Input sanitization applied to user-submitted text before persistence.
// Strict fields reject attack signatures; free-text fields have them stripped.

pub mod documents;
pub mod fields;
pub mod patterns;

pub use documents::{
    sanitize_cover_letter, sanitize_generated_text, sanitize_job_application, sanitize_resume,
};
pub use fields::{FieldRule, SanitizeError};
