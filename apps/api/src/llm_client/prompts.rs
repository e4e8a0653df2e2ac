// Prompt fragments shared by every feature that calls the LLM.
// Feature-specific prompts live in a prompts.rs next to the feature.

/// Appended to feature system prompts to force JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps generated resume text to what the candidate actually provided.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Use only facts present in the candidate material you are given. \
    Do NOT invent employers, titles, dates, degrees, metrics or technologies. \
    If the material does not support a claim, leave it out.";

/// Joins a feature system prompt with the JSON-only rule.
pub fn json_system(feature_system: &str) -> String {
    format!("{feature_system} {JSON_ONLY_SYSTEM}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_system_appends_rule() {
        let system = json_system("You are a resume writer.");
        assert!(system.starts_with("You are a resume writer. "));
        assert!(system.ends_with(JSON_ONLY_SYSTEM));
    }
}
