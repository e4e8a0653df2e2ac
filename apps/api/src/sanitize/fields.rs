//! Field-level rules: what kind of content a field holds and how long it may be.

use thiserror::Error;

use crate::sanitize::patterns::{
    has_sql_injection, has_xss, is_email, strip_sql_injection, strip_xss, url_scheme,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("SQL injection pattern detected")]
    SqlInjection { field: &'static str },

    #[error("XSS pattern detected")]
    Xss { field: &'static str },

    #[error("Dangerous URL scheme detected")]
    DangerousUrl { field: &'static str },

    #[error("Invalid email address")]
    InvalidEmail { field: &'static str },

    #[error("Field is required")]
    Required { field: &'static str },

    #[error("Field exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Too many entries (max {max})")]
    TooMany { field: &'static str, max: usize },
}

impl SanitizeError {
    pub fn field(&self) -> &'static str {
        match self {
            SanitizeError::SqlInjection { field }
            | SanitizeError::Xss { field }
            | SanitizeError::DangerousUrl { field }
            | SanitizeError::InvalidEmail { field }
            | SanitizeError::Required { field }
            | SanitizeError::TooLong { field, .. }
            | SanitizeError::TooMany { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Names and titles: any attack signature rejects the input.
    Strict,
    /// Descriptions and notes: attack signatures are stripped.
    FreeText,
    /// Rich text from the editor: cleaned with an HTML allow-list.
    Html,
    /// Links: only http(s), or mailto where allowed.
    Url { allow_mailto: bool },
    Email,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub max_len: usize,
    pub kind: FieldKind,
}

impl FieldRule {
    pub const fn strict(name: &'static str, max_len: usize) -> Self {
        Self { name, max_len, kind: FieldKind::Strict }
    }

    pub const fn free_text(name: &'static str, max_len: usize) -> Self {
        Self { name, max_len, kind: FieldKind::FreeText }
    }

    pub const fn html(name: &'static str, max_len: usize) -> Self {
        Self { name, max_len, kind: FieldKind::Html }
    }

    pub const fn url(name: &'static str) -> Self {
        Self { name, max_len: 2048, kind: FieldKind::Url { allow_mailto: false } }
    }

    /// A contact link that may also be an email link.
    pub const fn contact_url(name: &'static str) -> Self {
        Self { name, max_len: 2048, kind: FieldKind::Url { allow_mailto: true } }
    }

    pub const fn email(name: &'static str) -> Self {
        Self { name, max_len: 254, kind: FieldKind::Email }
    }
}

/// Removes null bytes and control characters other than newline and tab.
pub fn remove_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Cleans a single value according to its rule. Empty results are returned
/// as empty strings; use [`sanitize_required`] when the field must be set.
pub fn sanitize_field(value: &str, rule: &FieldRule) -> Result<String, SanitizeError> {
    let field = rule.name;
    let cleaned = remove_control_chars(value).trim().to_string();

    let cleaned = match rule.kind {
        FieldKind::Strict => {
            if has_sql_injection(&cleaned) {
                return Err(SanitizeError::SqlInjection { field });
            }
            if has_xss(&cleaned) {
                return Err(SanitizeError::Xss { field });
            }
            cleaned
        }
        FieldKind::FreeText => {
            let stripped = strip_xss(&cleaned).ok_or(SanitizeError::Xss { field })?;
            strip_sql_injection(&stripped)
                .ok_or(SanitizeError::SqlInjection { field })?
                .trim()
                .to_string()
        }
        FieldKind::Html => {
            let stripped = ammonia::clean(&cleaned);
            strip_sql_injection(&stripped)
                .ok_or(SanitizeError::SqlInjection { field })?
                .trim()
                .to_string()
        }
        FieldKind::Url { allow_mailto } => {
            check_url(&cleaned, field, allow_mailto)?;
            cleaned
        }
        FieldKind::Email => {
            if !cleaned.is_empty() && !is_email(&cleaned) {
                return Err(SanitizeError::InvalidEmail { field });
            }
            cleaned
        }
    };

    if cleaned.chars().count() > rule.max_len {
        return Err(SanitizeError::TooLong { field, max: rule.max_len });
    }

    Ok(cleaned)
}

/// Like [`sanitize_field`] but an empty result is an error.
pub fn sanitize_required(value: &str, rule: &FieldRule) -> Result<String, SanitizeError> {
    let cleaned = sanitize_field(value, rule)?;
    if cleaned.is_empty() {
        return Err(SanitizeError::Required { field: rule.name });
    }
    Ok(cleaned)
}

/// Optional fields collapse to `None` when they clean down to nothing.
pub fn sanitize_optional(
    value: Option<&str>,
    rule: &FieldRule,
) -> Result<Option<String>, SanitizeError> {
    match value {
        Some(v) => {
            let cleaned = sanitize_field(v, rule)?;
            Ok((!cleaned.is_empty()).then_some(cleaned))
        }
        None => Ok(None),
    }
}

/// Cleans every item of a string list, dropping items that end up empty.
pub fn sanitize_list(
    items: &[String],
    rule: &FieldRule,
    max_items: usize,
) -> Result<Vec<String>, SanitizeError> {
    check_count(items.len(), rule.name, max_items)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let cleaned = sanitize_field(item, rule)?;
        if !cleaned.is_empty() {
            out.push(cleaned);
        }
    }
    Ok(out)
}

pub fn check_count(len: usize, field: &'static str, max: usize) -> Result<(), SanitizeError> {
    if len > max {
        return Err(SanitizeError::TooMany { field, max });
    }
    Ok(())
}

fn check_url(url: &str, field: &'static str, allow_mailto: bool) -> Result<(), SanitizeError> {
    if url.is_empty() {
        return Ok(());
    }
    if has_xss(url) {
        return Err(SanitizeError::DangerousUrl { field });
    }
    match url_scheme(url).as_deref() {
        // bare host/path such as `github.com/jane`
        None => Ok(()),
        Some("http") | Some("https") => Ok(()),
        Some("mailto") if allow_mailto => Ok(()),
        Some(_) => Err(SanitizeError::DangerousUrl { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPANY: FieldRule = FieldRule::strict("company", 200);
    const DESCRIPTION: FieldRule = FieldRule::free_text("description", 5000);
    const WEBSITE: FieldRule = FieldRule::url("website");

    #[test]
    fn test_company_with_drop_table_is_rejected() {
        let err = sanitize_field("Acme'; DROP TABLE users; --", &COMPANY).unwrap_err();
        assert_eq!(err.to_string(), "SQL injection pattern detected");
        assert_eq!(err.field(), "company");
    }

    #[test]
    fn test_company_with_script_is_rejected() {
        let err = sanitize_field("<script>alert(1)</script>Acme", &COMPANY).unwrap_err();
        assert_eq!(err, SanitizeError::Xss { field: "company" });
    }

    #[test]
    fn test_company_is_trimmed_and_kept() {
        assert_eq!(sanitize_field("  O'Reilly Media \0", &COMPANY).unwrap(), "O'Reilly Media");
    }

    #[test]
    fn test_description_script_is_stripped_not_rejected() {
        let out = sanitize_field("Led a team<script>x()</script> of 5", &DESCRIPTION).unwrap();
        assert_eq!(out, "Led a team of 5");
    }

    #[test]
    fn test_description_nested_script_does_not_reassemble() {
        let out = sanitize_field("Led team <scr<script>ipt>alert(1)", &DESCRIPTION).unwrap();
        assert_eq!(out, "Led team alert(1)");
        assert!(!has_xss(&out));
    }

    #[test]
    fn test_language_names_survive_sanitizing() {
        let position = FieldRule::strict("position", 200);
        assert_eq!(
            sanitize_field("JavaScript: Frontend Lead", &position).unwrap(),
            "JavaScript: Frontend Lead"
        );
        assert_eq!(
            sanitize_field("Languages: JavaScript: ES2022, TypeScript", &DESCRIPTION).unwrap(),
            "Languages: JavaScript: ES2022, TypeScript"
        );
    }

    #[test]
    fn test_description_sql_is_stripped() {
        let input = "Shipped billing'; DROP TABLE users; --";
        let out = sanitize_field(input, &DESCRIPTION).unwrap();
        assert_ne!(out, input);
        assert!(!has_sql_injection(&out));
    }

    #[test]
    fn test_html_field_keeps_formatting_drops_handlers() {
        let rule = FieldRule::html("content", 10_000);
        let out = sanitize_field("<p onclick=\"x()\">Hello <b>team</b></p>", &rule).unwrap();
        assert_eq!(out, "<p>Hello <b>team</b></p>");
    }

    #[test]
    fn test_length_cap_counts_characters() {
        let rule = FieldRule::strict("name", 5);
        assert!(sanitize_field("éééé", &rule).is_ok());
        assert_eq!(
            sanitize_field("abcdef", &rule).unwrap_err(),
            SanitizeError::TooLong { field: "name", max: 5 }
        );
    }

    #[test]
    fn test_url_schemes() {
        assert!(sanitize_field("https://github.com/jane", &WEBSITE).is_ok());
        assert!(sanitize_field("github.com/jane", &WEBSITE).is_ok());
        assert_eq!(
            sanitize_field("javascript:alert(1)", &WEBSITE).unwrap_err(),
            SanitizeError::DangerousUrl { field: "website" }
        );
        assert!(sanitize_field("file:///etc/passwd", &WEBSITE).is_err());
        assert!(sanitize_field("data:text/html,<b>x</b>", &WEBSITE).is_err());
    }

    #[test]
    fn test_mailto_only_on_contact_links() {
        let contact = FieldRule::contact_url("website");
        assert!(sanitize_field("mailto:jane@example.com", &contact).is_ok());
        assert_eq!(
            sanitize_field("mailto:jane@example.com", &WEBSITE).unwrap_err(),
            SanitizeError::DangerousUrl { field: "website" }
        );
    }

    #[test]
    fn test_optional_empty_collapses_to_none() {
        assert_eq!(sanitize_optional(Some("   "), &COMPANY).unwrap(), None);
        assert_eq!(sanitize_optional(None, &COMPANY).unwrap(), None);
    }

    #[test]
    fn test_required_rejects_empty() {
        assert_eq!(
            sanitize_required(" ", &COMPANY).unwrap_err(),
            SanitizeError::Required { field: "company" }
        );
    }

    #[test]
    fn test_list_cap() {
        let skills: Vec<String> = (0..51).map(|i| format!("skill {i}")).collect();
        let rule = FieldRule::strict("skills", 100);
        assert_eq!(
            sanitize_list(&skills, &rule, 50).unwrap_err(),
            SanitizeError::TooMany { field: "skills", max: 50 }
        );
        assert_eq!(sanitize_list(&skills[..50], &rule, 50).unwrap().len(), 50);
    }
}
