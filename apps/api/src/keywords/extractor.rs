//! Local keyword extraction and resume-vs-job matching.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::keywords::categorizer::{categorize_keywords, CategorizedKeywords, KNOWN_PHRASES};

pub const DEFAULT_KEYWORD_LIMIT: usize = 30;
/// Longest known phrase, in words.
const MAX_PHRASE_WORDS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "been", "being", "both", "but", "by", "can", "could", "do", "does", "each", "etc", "for",
    "from", "had", "has", "have", "he", "her", "his", "how", "i", "if", "in", "including", "into",
    "is", "it", "its", "just", "may", "more", "most", "must", "new", "no", "not", "of", "on",
    "one", "or", "other", "our", "out", "over", "per", "plus", "preferred", "required", "role",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "to", "up", "us", "using", "very", "via", "was",
    "we", "well", "were", "what", "when", "where", "which", "while", "who", "will", "with",
    "within", "work", "would", "year", "years", "you", "your",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatchReport {
    /// Share of job keywords found in the resume, 0-100.
    pub score: u8,
    pub total_keywords: usize,
    pub matched: CategorizedKeywords,
    pub missing: CategorizedKeywords,
}

/// Lowercased word tokens. `+`, `#`, `.` and `/` stay inside tokens so
/// "c++", "c#", "node.js" and "ci/cd" survive; edge punctuation is trimmed.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '/' | '-' | '\'')))
        .map(|t| t.trim_matches(|c: char| matches!(c, '.' | '/' | '-' | '\'')))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_candidate(token: &str) -> bool {
    token.chars().count() >= 2
        && !STOP_WORDS.contains(&token)
        && !token.chars().all(|c| c.is_ascii_digit())
}

/// Most frequent terms in `text`, highest count first, ties broken by first
/// appearance. Known phrases ("machine learning") count as one term.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let tokens = tokenize(text);
    // term -> (count, first position)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut record = |term: String, position: usize| {
        counts.entry(term).or_insert((0, position)).0 += 1;
    };

    let mut i = 0;
    while i < tokens.len() {
        let phrase_len = (2..=MAX_PHRASE_WORDS)
            .rev()
            .filter(|n| i + n <= tokens.len())
            .find(|n| KNOWN_PHRASES.contains(&tokens[i..i + n].join(" ").as_str()));
        if let Some(n) = phrase_len {
            record(tokens[i..i + n].join(" "), i);
            i += n;
            continue;
        }
        if is_candidate(&tokens[i]) {
            record(tokens[i].clone(), i);
        }
        i += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, pos_a)), (_, (count_b, pos_b))| {
        count_b.cmp(count_a).then(pos_a.cmp(pos_b))
    });
    ranked.into_iter().take(limit).map(|(term, _)| term).collect()
}

/// Whole-term, case-insensitive containment. `haystack` must be lowercase.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    let term = term.to_lowercase();
    if term.is_empty() {
        return false;
    }
    let is_word = |c: char| c.is_alphanumeric();
    haystack.match_indices(&term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}

/// Scores a resume against the keywords of a job description.
pub fn keyword_match_report(resume_text: &str, job_text: &str, limit: usize) -> KeywordMatchReport {
    let job_keywords = extract_keywords(job_text, limit);
    let resume = resume_text.to_lowercase();

    let (matched, missing): (Vec<String>, Vec<String>) = job_keywords
        .into_iter()
        .partition(|keyword| contains_term(&resume, keyword));

    let total = matched.len() + missing.len();
    let score = if total == 0 {
        0
    } else {
        ((matched.len() * 100 + total / 2) / total) as u8
    };

    KeywordMatchReport {
        score,
        total_keywords: total,
        matched: categorize_keywords(&matched),
        missing: categorize_keywords(&missing),
    }
}
