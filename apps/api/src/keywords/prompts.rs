// LLM prompts for keyword extraction.

/// System prompt for keyword extraction; combined with the JSON-only rule.
pub const KEYWORD_EXTRACT_SYSTEM: &str = "You are an applicant tracking system analyst. \
    You extract the keywords a recruiter's ATS would scan for.";

/// Replace `{limit}` and `{text}` before sending.
pub const KEYWORD_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract at most {limit} ATS keywords from the text below.

Return a JSON object with this EXACT schema:
{"keywords": ["Rust", "PostgreSQL", "AWS Certified Solutions Architect", "stakeholder management"]}

Rules:
- Keep multi-word terms together ("machine learning", not "machine" and "learning").
- Use the spelling found in the text.
- Include skills, tools, certifications, degrees, industry terms and key responsibilities.
- Most important keywords first. No duplicates.

TEXT:
{text}"#;
