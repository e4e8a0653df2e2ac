//! Escaping of user text for LaTeX and HTML output.

/// Escapes LaTeX special characters in a single pass, so the replacement
/// text (which itself contains `\` and `{}`) is never re-escaped.
pub fn escape_latex(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for c in input.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '<' => out.push_str(r"\textless{}"),
            '>' => out.push_str(r"\textgreater{}"),
            '\n' | '\r' | '\t' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('\\', r"\textbackslash{}")]
    #[case('&', r"\&")]
    #[case('%', r"\%")]
    #[case('$', r"\$")]
    #[case('#', r"\#")]
    #[case('_', r"\_")]
    #[case('{', r"\{")]
    #[case('}', r"\}")]
    #[case('~', r"\textasciitilde{}")]
    #[case('^', r"\textasciicircum{}")]
    #[case('<', r"\textless{}")]
    #[case('>', r"\textgreater{}")]
    fn test_escape_latex_special_characters(#[case] special: char, #[case] expected: &str) {
        assert_eq!(escape_latex(&special.to_string()), expected);
    }

    #[test]
    fn test_escape_latex_is_single_pass() {
        // backslash replacement must not have its braces escaped again
        assert_eq!(escape_latex(r"a\b"), r"a\textbackslash{}b");
    }

    #[test]
    fn test_escape_latex_leaves_plain_text() {
        assert_eq!(escape_latex("Grew revenue 3x (EMEA)"), "Grew revenue 3x (EMEA)");
    }

    #[test]
    fn test_escape_latex_collapses_line_breaks() {
        assert_eq!(escape_latex("line one\nline two"), "line one line two");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }
}
