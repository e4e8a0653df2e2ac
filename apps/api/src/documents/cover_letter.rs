use crate::documents::escape::escape_latex;
use crate::documents::latex::{header, preamble, present};
use crate::documents::templates::TemplateId;
use crate::models::cover_letter::CoverLetterData;

const DEFAULT_SALUTATION: &str = "Dear Hiring Manager,";
const DEFAULT_CLOSING: &str = "Sincerely,";

/// Generates a LaTeX letter using the same visual template as the resume.
/// Unknown template ids fall back to `professional`; blank paragraphs are skipped.
pub fn generate_latex_cover_letter(data: &CoverLetterData, template_id: &str) -> String {
    let template = TemplateId::resolve(template_id);
    let sender = &data.sender;

    let mut doc = preamble(template);
    doc.push_str("\\begin{document}\n");

    let contacts: Vec<String> = [&sender.email, &sender.phone, &sender.location]
        .into_iter()
        .filter_map(|v| present(v))
        .map(escape_latex)
        .collect();
    doc.push_str(&header(template, &sender.full_name, &contacts));
    doc.push_str("\\bigskip\n");

    if let Some(date) = present(&data.date) {
        doc.push_str(&format!("{}\\par\\medskip\n", escape_latex(date)));
    }

    let recipient: Vec<String> = [
        present(&data.recipient_name),
        present(&data.recipient_title),
        Some(data.company_name.trim()).filter(|s| !s.is_empty()),
        present(&data.company_address),
    ]
    .into_iter()
    .flatten()
    .map(escape_latex)
    .collect();
    if !recipient.is_empty() {
        doc.push_str(&format!("{}\\par\\medskip\n", recipient.join("\\\\\n")));
    }

    if let Some(job_title) = present(&data.job_title) {
        doc.push_str(&format!(
            "\\textbf{{Re: {}}}\\par\\medskip\n",
            escape_latex(job_title)
        ));
    }

    let salutation = present(&data.salutation).unwrap_or(DEFAULT_SALUTATION);
    doc.push_str(&format!("{}\\par\\medskip\n", escape_latex(salutation)));

    for paragraph in data
        .body_paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
    {
        doc.push_str(&format!("{}\\par\\medskip\n", escape_latex(paragraph)));
    }

    let closing = present(&data.closing).unwrap_or(DEFAULT_CLOSING);
    let signature = present(&data.signature_name).unwrap_or(sender.full_name.trim());
    doc.push_str(&format!("{}\\par\n", escape_latex(closing)));
    if !signature.is_empty() {
        doc.push_str(&format!("\\vspace{{2em}}\n{}\\par\n", escape_latex(signature)));
    }

    doc.push_str("\\end{document}\n");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cover_letter::Sender;
    use rstest::rstest;

    fn letter() -> CoverLetterData {
        CoverLetterData {
            sender: Sender {
                full_name: "Jane Doe".to_string(),
                email: Some("jane@example.com".to_string()),
                ..Default::default()
            },
            company_name: "Acme & Sons".to_string(),
            job_title: Some("Staff Engineer".to_string()),
            body_paragraphs: vec![
                "I am writing to apply.".to_string(),
                "   ".to_string(),
                "I grew revenue by 30%.".to_string(),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_salutation_and_closing() {
        let latex = generate_latex_cover_letter(&letter(), "professional");
        assert!(latex.contains("Dear Hiring Manager,"));
        assert!(latex.contains("Sincerely,"));
        assert!(latex.contains("\\vspace{2em}\nJane Doe"));
    }

    #[test]
    fn test_blank_paragraphs_are_skipped() {
        let latex = generate_latex_cover_letter(&letter(), "minimal");
        assert!(latex.contains("I am writing to apply.\\par\\medskip\nI grew revenue by 30\\%."));
    }

    #[rstest]
    #[case("professional")]
    #[case("modern")]
    #[case("creative")]
    #[case("nonexistent-template")]
    fn test_cover_letter_escapes_user_text(#[case] template: &str) {
        let latex = generate_latex_cover_letter(&letter(), template);
        assert!(latex.contains("Acme \\& Sons"));
        assert!(!latex.contains("Acme & Sons"));
        assert!(latex.contains("30\\%"));
    }

    #[test]
    fn test_unknown_template_matches_professional() {
        assert_eq!(
            generate_latex_cover_letter(&letter(), "nonexistent-template"),
            generate_latex_cover_letter(&letter(), "professional")
        );
    }

    #[test]
    fn test_custom_salutation_is_escaped() {
        let mut data = letter();
        data.salutation = Some("Dear R&D team,".to_string());
        let latex = generate_latex_cover_letter(&data, "academic");
        assert!(latex.contains("Dear R\\&D team,"));
        assert!(!latex.contains(DEFAULT_SALUTATION));
    }
}
