//! ATS keyword tooling: rule-based categorization, local and LLM-backed
//! extraction, and resume-vs-job matching.

pub mod categorizer;
pub mod extractor;
pub mod handlers;
pub mod llm;
pub mod prompts;
