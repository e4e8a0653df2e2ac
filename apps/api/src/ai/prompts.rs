// LLM prompts for the writing assistant.

pub const WRITER_SYSTEM: &str = "You are an experienced resume writer and career coach. \
    You write concise, specific, achievement-oriented text in plain English.";

/// Replace `{resume}` and `{job}` before sending.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Write a professional summary of 2-4 sentences for the candidate below.

Return a JSON object with this EXACT schema:
{"summary": "..."}

Rules:
- First person implied, no "I".
- Lead with seniority and core strengths.
- If a target job is given, emphasise the overlap with it.

{no_fabrication}

CANDIDATE:
{resume}

TARGET JOB:
{job}"#;

/// Replace `{position}`, `{bullets}` and `{job}` before sending.
pub const BULLETS_PROMPT_TEMPLATE: &str = r#"Rewrite each bullet point below for a resume entry as {position}.

Return a JSON object with this EXACT schema, one output bullet per input bullet, same order:
{"bullets": ["...", "..."]}

Rules:
- Start with a strong past-tense action verb.
- Keep every number that is present; never add numbers that are not.
- At most 30 words per bullet.

{no_fabrication}

BULLETS:
{bullets}

TARGET JOB:
{job}"#;

/// Replace `{resume}`, `{company}`, `{job_title}`, `{recipient}` and `{job}`.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write the body of a cover letter for the {job_title} role at {company}, addressed to {recipient}.

Return a JSON object with this EXACT schema:
{"paragraphs": ["...", "...", "..."]}

Rules:
- Three or four paragraphs; no salutation and no closing.
- Open with why this role, close with a call to action.
- Refer to concrete experience from the candidate material.

{no_fabrication}

CANDIDATE:
{resume}

JOB DESCRIPTION:
{job}"#;
