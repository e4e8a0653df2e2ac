//! Keyword Categorizer: sorts flat keyword lists into ATS categories.
//!
//! Rules are checked in a fixed order and the first category with a matching
//! pattern wins, so "AWS Certified Solutions Architect" lands in
//! certifications even though "AWS" is also a tool. Keywords no rule
//! matches are placed by their shape (casing, digits, punctuation, length).

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    TechnicalSkills,
    SoftSkills,
    Education,
    Responsibilities,
    IndustryTerms,
    Tools,
    Certifications,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedKeywords {
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub education: Vec<String>,
    pub responsibilities: Vec<String>,
    pub industry_terms: Vec<String>,
    pub tools: Vec<String>,
    pub certifications: Vec<String>,
}

impl CategorizedKeywords {
    pub fn bucket_mut(&mut self, category: KeywordCategory) -> &mut Vec<String> {
        match category {
            KeywordCategory::TechnicalSkills => &mut self.technical_skills,
            KeywordCategory::SoftSkills => &mut self.soft_skills,
            KeywordCategory::Education => &mut self.education,
            KeywordCategory::Responsibilities => &mut self.responsibilities,
            KeywordCategory::IndustryTerms => &mut self.industry_terms,
            KeywordCategory::Tools => &mut self.tools,
            KeywordCategory::Certifications => &mut self.certifications,
        }
    }

    pub fn len(&self) -> usize {
        self.technical_skills.len()
            + self.soft_skills.len()
            + self.education.len()
            + self.responsibilities.len()
            + self.industry_terms.len()
            + self.tools.len()
            + self.certifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Ordered rules
// ────────────────────────────────────────────────────────────────────────────

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("keyword rule must compile"))
        .collect()
}

/// Precedence: certifications, education, soft skills, technical skills,
/// tools, industry terms, responsibilities.
static RULES: Lazy<Vec<(KeywordCategory, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            KeywordCategory::Certifications,
            compile(&[
                r"\bcertifi(ed|cation|cate)s?\b",
                r"\b(pmp|cissp|ccna|ccnp|cpa|cfa|cisa|cism|itil|csm|comptia)\b",
                r"\bsecurity\+",
                r"\b(six sigma|scrum master)\b",
                r"\blicen[cs]ed\b",
            ]),
        ),
        (
            KeywordCategory::Education,
            compile(&[
                r"\b(bachelor|bachelors|bachelor's|master's|masters|doctorate|phd|ph\.d|mba|bsc|msc)\b",
                r"\b(degree|diploma|university|college|graduate|coursework|gpa)\b",
            ]),
        ),
        (
            KeywordCategory::SoftSkills,
            compile(&[
                r"\b(communication|leadership|teamwork|collaboration|collaborative|interpersonal)\b",
                r"\b(problem[- ]solving|critical thinking|time management|attention to detail)\b",
                r"\b(adaptability|creativity|mentoring|mentorship|negotiation|presentation skills)\b",
                r"\bself[- ]motivated\b",
            ]),
        ),
        (
            KeywordCategory::TechnicalSkills,
            compile(&[
                r"\b(python|java|javascript|typescript|rust|golang|ruby|php|scala|kotlin|swift)\b",
                r"\b(sql|nosql|html|css|react|angular|vue|node\.?js|django|flask|spring boot|graphql)\b",
                r"\b(rest|restful|apis?|microservices|distributed systems|algorithms)\b",
                r"\b(machine learning|deep learning|data analysis|data structures|computer vision)\b",
                r"\bc\+\+",
                r"\bc#",
                r"\.net\b",
            ]),
        ),
        (
            KeywordCategory::Tools,
            compile(&[
                r"\b(aws|azure|gcp|docker|kubernetes|terraform|ansible|jenkins)\b",
                r"\b(git|github|gitlab|jira|confluence|figma|tableau|excel|salesforce)\b",
                r"\b(postgres|postgresql|mysql|mongodb|redis|kafka|elasticsearch|linux)\b",
                r"\b(grafana|prometheus|datadog)\b",
            ]),
        ),
        (
            KeywordCategory::IndustryTerms,
            compile(&[
                r"\b(saas|b2b|b2c|fintech|healthtech|healthcare|e-?commerce|logistics)\b",
                r"\b(agile|scrum|kanban|compliance|gdpr|hipaa|sox)\b",
                r"\b(risk management|supply chain|stakeholders?|roi|kpis?|go-to-market)\b",
            ]),
        ),
        (
            KeywordCategory::Responsibilities,
            compile(&[
                r"\bmanag(e|ed|es|ing|ement)\b",
                r"\b(develop|developed|developing|design|designed|designing)\b",
                r"\b(implement|implemented|implementing|coordinate|coordinated|coordinating)\b",
                r"\b(lead|led|leading|maintain|maintained|maintaining|deliver|delivered)\b",
                r"\b(optimi[sz]e|optimi[sz]ed|own|owned|ownership|report|reporting)\b",
            ]),
        ),
    ]
});

/// Multi-word terms the rules above recognize. The extractor keeps these
/// together instead of splitting them into single words.
pub const KNOWN_PHRASES: &[&str] = &[
    "six sigma",
    "scrum master",
    "problem solving",
    "critical thinking",
    "time management",
    "attention to detail",
    "spring boot",
    "distributed systems",
    "machine learning",
    "deep learning",
    "data analysis",
    "data structures",
    "computer vision",
    "risk management",
    "supply chain",
    "project management",
];

pub fn categorize_keyword(keyword: &str) -> KeywordCategory {
    RULES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(keyword)))
        .map(|(category, _)| *category)
        .unwrap_or_else(|| categorize_by_shape(keyword))
}

/// Trims, drops empties, de-duplicates case-insensitively (first spelling
/// kept) and buckets each keyword. Output order follows input order.
pub fn categorize_keywords<S: AsRef<str>>(keywords: &[S]) -> CategorizedKeywords {
    let mut seen = HashSet::new();
    let mut out = CategorizedKeywords::default();
    for keyword in keywords {
        let keyword = keyword.as_ref().trim();
        if keyword.is_empty() || !seen.insert(keyword.to_lowercase()) {
            continue;
        }
        out.bucket_mut(categorize_keyword(keyword))
            .push(keyword.to_string());
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Shape fallback
// ────────────────────────────────────────────────────────────────────────────

fn categorize_by_shape(keyword: &str) -> KeywordCategory {
    if keyword.chars().any(|c| c.is_ascii_digit()) || is_acronym(keyword) {
        return KeywordCategory::TechnicalSkills;
    }
    if keyword.contains(['.', '#', '+', '/']) || is_camel_case(keyword) {
        return KeywordCategory::Tools;
    }
    let lower = keyword.to_lowercase();
    if keyword.split_whitespace().count() >= 3
        || ["ing", "tion", "ment", "sion"]
            .iter()
            .any(|suffix| lower.ends_with(suffix))
    {
        return KeywordCategory::Responsibilities;
    }
    KeywordCategory::IndustryTerms
}

/// Two to five capital letters, e.g. "ETL" or "CRM".
fn is_acronym(keyword: &str) -> bool {
    (2..=5).contains(&keyword.len()) && keyword.chars().all(|c| c.is_ascii_uppercase())
}

/// A lowercase letter directly followed by an uppercase one: "PyTorch", "iOS".
fn is_camel_case(keyword: &str) -> bool {
    !keyword.contains(char::is_whitespace)
        && keyword
            .chars()
            .zip(keyword.chars().skip(1))
            .any(|(a, b)| a.is_lowercase() && b.is_uppercase())
}
