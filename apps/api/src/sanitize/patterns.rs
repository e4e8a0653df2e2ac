//! Deny-list signatures for SQL injection and script injection.
//!
//! Strict fields are rejected on the first match; free-text fields have the
//! matching spans stripped instead.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("sanitizer pattern must compile"))
        .collect()
}

/// SQL fragments in suspicious contexts. A lone apostrophe (`O'Reilly`) or
/// a bare keyword (`Drop Shipping Co`) does not match.
static SQL_INJECTION: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        // quote immediately followed by a terminator or comment
        r#"['"]\s*(;|--|/\*|#)"#,
        // stacked statement
        r"(?i);\s*(drop|delete|insert|update|alter|create|truncate|exec(ute)?|grant|revoke|shutdown)\b",
        // tautology after a closing quote
        r#"(?i)['"]\s*\b(or|and)\b\s+['"]?\w+['"]?\s*(=|like)\s*['"]?\w*"#,
        r"(?i)\bor\s+1\s*=\s*1\b",
        r"(?i)\bunion\b(\s+all)?\s+select\b",
        r"(?i)\bdrop\s+(table|database|schema|view)\b",
        r"(?i)\binsert\s+into\b",
        r"(?i)\bdelete\s+from\b",
        r"(?i)\bupdate\s+\w+\s+set\b",
        r"(?i)\b(xp_cmdshell|sp_executesql|information_schema|pg_sleep|waitfor\s+delay)\b",
        r"(?i)\bbenchmark\s*\(",
        r"/\*.*?\*/",
        r"--\s*$",
    ])
});

/// Script injection signatures for strict fields.
static XSS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)<\s*/?\s*script\b",
        r"(?i)<\s*/?\s*(iframe|object|embed|applet|meta|link|style|svg|img|base|form|body)\b",
        r"(?i)\bon[a-z]+\s*=",
        r"(?i)\bexpression\s*\(",
        r#"(?i)[=("'`]\s*(javascript|vbscript|livescript)\s*:"#,
        r"(?i)^\s*(javascript|vbscript|livescript):\S",
        r"(?i)data\s*:\s*text/html",
    ])
});

/// Whole dangerous blocks, removed together with their content.
static DANGEROUS_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?is)<\s*script\b.*?<\s*/\s*script\s*>",
        r"(?is)<\s*style\b.*?<\s*/\s*style\s*>",
        r"(?is)<\s*iframe\b.*?<\s*/\s*iframe\s*>",
        r"(?is)<\s*object\b.*?<\s*/\s*object\s*>",
        r"(?is)<\s*embed\b.*?<\s*/\s*embed\s*>",
    ])
});

/// Leftover single tags and event-handler attributes.
static DANGEROUS_FRAGMENTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?i)<\s*/?\s*(script|style|iframe|object|embed|applet|meta|link|base|form|svg|img|body)\b[^>]*>?",
        r#"(?i)\s*\bon[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#,
        r"(?i)\bexpression\s*\([^)]*\)?",
        r#"(?i)data\s*:\s*text/html[^\s"'>]*"#,
    ])
});

/// Script schemes only where a link can start: inside an attribute or
/// `url(...)`, or at the very start of the value. "JavaScript: ES2022" in
/// prose is left alone.
static SCHEME_IN_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([=("'`]\s*)(?:javascript|vbscript|livescript)\s*:"#)
        .expect("scheme pattern must compile")
});
static SCHEME_AT_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\s*)(?:javascript|vbscript|livescript):(\S)")
        .expect("scheme pattern must compile")
});

/// Rounds of stripping before a payload is treated as built to reassemble.
const MAX_STRIP_PASSES: usize = 4;

static URL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").expect("scheme pattern must compile"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@<>]+@[^\s@<>]+\.[^\s@<>]+$").expect("email pattern must compile")
});

pub fn has_sql_injection(text: &str) -> bool {
    SQL_INJECTION.iter().any(|re| re.is_match(text))
}

pub fn has_xss(text: &str) -> bool {
    XSS.iter().any(|re| re.is_match(text))
}

fn strip_xss_pass(text: &str) -> String {
    let mut out = text.to_string();
    for re in DANGEROUS_BLOCKS.iter().chain(DANGEROUS_FRAGMENTS.iter()) {
        out = re.replace_all(&out, "").into_owned();
    }
    out = SCHEME_IN_ATTRIBUTE.replace_all(&out, "$1").into_owned();
    SCHEME_AT_START.replace(&out, "$1$2").into_owned()
}

/// Removes script blocks, stray dangerous tags, event handlers and
/// dangerous URL schemes. Ordinary text (including `<`, `&`) is untouched.
/// Passes repeat until nothing changes, since removing `<script>` from
/// `<scr<script>ipt>` leaves a new tag behind. Returns `None` if
/// signatures survive every pass.
pub fn strip_xss(text: &str) -> Option<String> {
    let mut out = text.to_string();
    for _ in 0..MAX_STRIP_PASSES {
        let next = strip_xss_pass(&out);
        if next == out {
            break;
        }
        out = next;
    }
    (!has_xss(&out)).then_some(out)
}

/// Removes SQL injection spans. Returns `None` if signatures survive
/// several passes (nested payloads built to reassemble after stripping).
pub fn strip_sql_injection(text: &str) -> Option<String> {
    let mut out = text.to_string();
    for _ in 0..MAX_STRIP_PASSES {
        if !has_sql_injection(&out) {
            return Some(out);
        }
        for re in SQL_INJECTION.iter() {
            out = re.replace_all(&out, "").into_owned();
        }
    }
    (!has_sql_injection(&out)).then_some(out)
}

/// Lowercased URL scheme with embedded whitespace and control characters
/// removed, so `java\tscript:` is still seen as `javascript`.
pub fn url_scheme(url: &str) -> Option<String> {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    URL_SCHEME
        .captures(&compact)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

pub fn is_email(text: &str) -> bool {
    EMAIL.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Acme'; DROP TABLE users; --")]
    #[case("x' OR '1'='1")]
    #[case("admin' --")]
    #[case("1 UNION SELECT password FROM users")]
    #[case("Robert'); DROP TABLE students;")]
    #[case("name; delete from resumes")]
    #[case("a /* hidden */ b")]
    #[case("1; WAITFOR DELAY '0:0:5'")]
    fn test_detects_sql_injection(#[case] input: &str) {
        assert!(has_sql_injection(input), "should flag: {input}");
    }

    #[rstest]
    #[case("O'Reilly Media")]
    #[case("AT&T")]
    #[case("Drop Shipping Co")]
    #[case("Senior C++ / C# Engineer")]
    #[case("Research & Development - Platform")]
    #[case("Select Comfort Corporation")]
    fn test_allows_legitimate_names(#[case] input: &str) {
        assert!(!has_sql_injection(input), "false positive: {input}");
        assert!(!has_xss(input), "false positive: {input}");
    }

    #[rstest]
    #[case("<script>alert(1)</script>")]
    #[case("<img src=x onerror=alert(1)>")]
    #[case("<a href=\"javascript:alert(1)\">x</a>")]
    #[case("<iframe src=//evil.example>")]
    #[case("<div onmouseover = 'steal()'>")]
    #[case("data:text/html;base64,PHNjcmlwdD4=")]
    fn test_detects_xss(#[case] input: &str) {
        assert!(has_xss(input), "should flag: {input}");
    }

    #[rstest]
    #[case("javascript:alert(1)")]
    #[case("  vbscript:msgbox(1)")]
    #[case("<a href='javascript:alert(1)'>x</a>")]
    #[case("background: url( javascript:alert(1))")]
    fn test_detects_script_scheme_where_a_link_starts(#[case] input: &str) {
        assert!(has_xss(input), "should flag: {input}");
    }

    #[rstest]
    #[case("JavaScript: Frontend Lead")]
    #[case("Languages: JavaScript: ES2022, TypeScript")]
    #[case("Taught JavaScript : the basics")]
    fn test_script_language_names_in_prose_are_not_xss(#[case] input: &str) {
        assert!(!has_xss(input), "false positive: {input}");
        assert_eq!(strip_xss(input).as_deref(), Some(input));
    }

    #[test]
    fn test_strip_xss_removes_script_block_and_keeps_text() {
        let out = strip_xss("Built APIs <script>alert('x')</script>for 3 teams");
        assert_eq!(out.as_deref(), Some("Built APIs for 3 teams"));
    }

    #[test]
    fn test_strip_xss_removes_event_handlers() {
        let out = strip_xss("<b onclick=\"steal()\">Lead</b>").unwrap();
        assert_eq!(out, "<b>Lead</b>");
        assert!(!has_xss(&out));
    }

    #[test]
    fn test_strip_xss_removes_javascript_scheme() {
        let out = strip_xss("<a href=\"javascript:alert(1)\">x</a>").unwrap();
        assert_eq!(out, "<a href=\"alert(1)\">x</a>");
        assert!(!has_xss(&out));
    }

    #[test]
    fn test_strip_xss_does_not_reassemble_nested_tags() {
        let out = strip_xss("<scr<script>ipt>alert(1)").unwrap();
        assert_eq!(out, "alert(1)");
        assert!(!has_xss(&out));
    }

    #[test]
    fn test_strip_xss_keeps_plain_comparisons() {
        assert_eq!(
            strip_xss("latency < 10ms & p99 > 2ms").as_deref(),
            Some("latency < 10ms & p99 > 2ms")
        );
    }

    #[test]
    fn test_strip_sql_injection_clears_signature() {
        let out = strip_sql_injection("Acme'; DROP TABLE users; --").unwrap();
        assert!(!has_sql_injection(&out));
        assert!(out.contains("Acme"));
    }

    #[test]
    fn test_url_scheme_sees_through_whitespace() {
        assert_eq!(url_scheme("java\tscript:alert(1)").as_deref(), Some("javascript"));
        assert_eq!(url_scheme("HTTPS://example.com").as_deref(), Some("https"));
        assert_eq!(url_scheme("linkedin.com/in/jane"), None);
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("jane@example.com"));
        assert!(!is_email("jane@example"));
        assert!(!is_email("<jane>@example.com"));
    }
}
