//! LLM-assisted writing for Pro users: professional summaries, sharper
//! bullet points and cover-letter body paragraphs.

pub mod handlers;
pub mod prompts;
