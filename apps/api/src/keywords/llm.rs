use serde::Deserialize;

use crate::errors::AppError;
use crate::keywords::prompts::{KEYWORD_EXTRACT_PROMPT_TEMPLATE, KEYWORD_EXTRACT_SYSTEM};
use crate::llm_client::prompts::json_system;
use crate::llm_client::LlmClient;

#[derive(Debug, Deserialize)]
struct ExtractedKeywords {
    keywords: Vec<String>,
}

/// Asks the LLM for keywords. Vendor failures surface as 503.
pub async fn extract_keywords_with_llm(
    llm: &LlmClient,
    text: &str,
    limit: usize,
) -> Result<Vec<String>, AppError> {
    let prompt = KEYWORD_EXTRACT_PROMPT_TEMPLATE
        .replace("{limit}", &limit.to_string())
        .replace("{text}", text);
    let extracted: ExtractedKeywords = llm
        .call_json(&prompt, &json_system(KEYWORD_EXTRACT_SYSTEM))
        .await
        .map_err(|e| AppError::Llm(format!("keyword extraction failed: {e}")))?;
    Ok(clean_llm_keywords(extracted.keywords, limit))
}

/// The model does not always respect the limit or avoid repeats.
fn clean_llm_keywords(keywords: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && k.chars().count() <= 100)
        .filter(|k| seen.insert(k.to_lowercase()))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_keywords_deserialize() {
        let parsed: ExtractedKeywords =
            serde_json::from_str(r#"{"keywords": ["Rust", "Kafka"]}"#).unwrap();
        assert_eq!(parsed.keywords, vec!["Rust", "Kafka"]);
    }

    #[test]
    fn test_clean_llm_keywords() {
        let raw = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "Kafka".to_string(),
            "Docker".to_string(),
        ];
        assert_eq!(clean_llm_keywords(raw, 2), vec!["Rust", "Kafka"]);
    }

    #[test]
    fn test_prompt_template_placeholders() {
        assert!(KEYWORD_EXTRACT_PROMPT_TEMPLATE.contains("{limit}"));
        assert!(KEYWORD_EXTRACT_PROMPT_TEMPLATE.contains("{text}"));
    }
}
