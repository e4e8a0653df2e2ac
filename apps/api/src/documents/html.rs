//! HTML preview rendering. Mirrors the LaTeX layout closely enough for the
//! builder's live preview; the PDF export stays the source of truth.

use crate::documents::escape::escape_html;
use crate::documents::latex::present;
use crate::documents::templates::{Section, TemplateId};
use crate::models::resume::ResumeData;

const BASE_CSS: &str = "body{margin:0;padding:32px;color:#1a202c;line-height:1.4}\
h1{margin:0}.contact{margin:4px 0 12px}.entry{margin-bottom:10px}\
.entry-head,.entry-sub{display:flex;justify-content:space-between}\
.entry-sub{font-style:italic}ul{margin:4px 0;padding-left:20px}";

fn template_css(template: TemplateId) -> &'static str {
    match template {
        TemplateId::Professional => {
            "body{font-family:Georgia,serif}header{text-align:center}\
             h2{font-variant:small-caps;border-bottom:1px solid #1a202c}"
        }
        TemplateId::Modern => {
            "body{font-family:Helvetica,Arial,sans-serif}h1{color:#2b6cb0}\
             h2{color:#2b6cb0;border-bottom:2px solid #2b6cb0}"
        }
        TemplateId::Minimal => {
            "body{font-family:Helvetica,Arial,sans-serif;padding:64px}\
             h2{font-size:0.95em;text-transform:uppercase;letter-spacing:0.05em}"
        }
        TemplateId::Academic => {
            "body{font-family:'Times New Roman',serif}header{text-align:center}\
             h2{border-bottom:1px solid #4a5568}"
        }
        TemplateId::Creative => {
            "body{font-family:Helvetica,Arial,sans-serif}\
             header{background:#c53030;color:#fff;padding:16px}\
             h2{text-transform:uppercase;border-left:6px solid #c53030;padding-left:8px}"
        }
    }
}

/// Renders a standalone HTML page for a resume.
pub fn render_resume_html(data: &ResumeData, template_id: &str) -> String {
    let template = TemplateId::resolve(template_id);
    let info = &data.personal_info;

    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{BASE_CSS}{}</style>\n</head>\n\
         <body class=\"template-{}\">\n",
        escape_html(info.full_name.trim()),
        template_css(template),
        template.as_str()
    );

    html.push_str("<header>\n");
    if !info.full_name.trim().is_empty() {
        html.push_str(&format!("<h1>{}</h1>\n", escape_html(info.full_name.trim())));
    }
    let contacts: Vec<String> = [
        &info.email,
        &info.phone,
        &info.location,
        &info.website,
        &info.linkedin,
        &info.github,
    ]
    .into_iter()
    .filter_map(|v| present(v))
    .map(escape_html)
    .collect();
    if !contacts.is_empty() {
        html.push_str(&format!(
            "<p class=\"contact\">{}</p>\n",
            contacts.join(" &middot; ")
        ));
    }
    html.push_str("</header>\n");

    for &section in template.section_order() {
        if let Some(body) = section_html(data, section) {
            html.push_str(&format!(
                "<section>\n<h2>{}</h2>\n{body}</section>\n",
                template.section_title(section)
            ));
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn section_html(data: &ResumeData, section: Section) -> Option<String> {
    match section {
        Section::Summary => {
            present(&data.personal_info.summary).map(|s| format!("<p>{}</p>\n", escape_html(s)))
        }
        Section::Experience => collect(data.work_experience.iter().filter_map(|job| {
            let title = job.position.trim();
            let company = job.company.trim();
            if title.is_empty() && company.is_empty() {
                return None;
            }
            let end = if job.current {
                Some("Present")
            } else {
                present(&job.end_date)
            };
            let mut out = entry_head(title, &dates(present(&job.start_date), end));
            out.push_str(&entry_sub(company, present(&job.location)));
            if let Some(text) = present(&job.description) {
                out.push_str(&format!("<p>{}</p>\n", escape_html(text)));
            }
            out.push_str(&bullet_list(&job.highlights));
            Some(entry(out))
        })),
        Section::Education => collect(data.education.iter().filter_map(|edu| {
            if edu.degree.trim().is_empty() && edu.institution.trim().is_empty() {
                return None;
            }
            let degree = edu.degree.trim();
            let title = match present(&edu.field_of_study) {
                Some(field) if !degree.is_empty() => format!("{degree}, {field}"),
                Some(field) => field.to_string(),
                None => degree.to_string(),
            };
            let mut out = entry_head(
                &title,
                &dates(present(&edu.start_date), present(&edu.end_date)),
            );
            out.push_str(&entry_sub(edu.institution.trim(), present(&edu.location)));
            if let Some(gpa) = present(&edu.gpa) {
                out.push_str(&format!("<p>GPA: {}</p>\n", escape_html(gpa)));
            }
            if let Some(text) = present(&edu.description) {
                out.push_str(&format!("<p>{}</p>\n", escape_html(text)));
            }
            Some(entry(out))
        })),
        Section::Skills => inline(&data.skills),
        Section::Projects => collect(data.projects.iter().flatten().filter_map(|project| {
            if project.name.trim().is_empty() {
                return None;
            }
            let url = present(&project.url).map(escape_html).unwrap_or_default();
            let mut out = entry_head(project.name.trim(), "");
            if !url.is_empty() {
                out.push_str(&format!("<p class=\"url\">{url}</p>\n"));
            }
            if let Some(techs) = inline(&project.technologies) {
                out.push_str(&techs);
            }
            if let Some(text) = present(&project.description) {
                out.push_str(&format!("<p>{}</p>\n", escape_html(text)));
            }
            Some(entry(out))
        })),
        Section::Certifications => {
            let items: Vec<String> = data
                .certifications
                .iter()
                .flatten()
                .filter(|c| !c.name.trim().is_empty())
                .map(|c| {
                    let mut item = format!("<strong>{}</strong>", escape_html(c.name.trim()));
                    if let Some(issuer) = present(&c.issuer) {
                        item.push_str(&format!(", {}", escape_html(issuer)));
                    }
                    if let Some(date) = present(&c.date) {
                        item.push_str(&format!(" ({})", escape_html(date)));
                    }
                    item
                })
                .collect();
            list_items(items)
        }
        Section::Publications => {
            let items: Vec<String> = data
                .publications
                .iter()
                .flatten()
                .filter(|p| !p.title.trim().is_empty())
                .map(|p| {
                    let mut item = format!("<em>{}</em>", escape_html(p.title.trim()));
                    for extra in [present(&p.publisher), present(&p.date)].into_iter().flatten() {
                        item.push_str(&format!(", {}", escape_html(extra)));
                    }
                    item
                })
                .collect();
            list_items(items)
        }
        Section::Languages => inline(&data.languages),
    }
}

fn dates(start: Option<&str>, end: Option<&str>) -> String {
    match (start, end) {
        (Some(s), Some(e)) => format!("{s} – {e}"),
        (Some(s), None) => s.to_string(),
        (None, Some(e)) => e.to_string(),
        (None, None) => String::new(),
    }
}

fn entry(inner: String) -> String {
    format!("<div class=\"entry\">\n{inner}</div>\n")
}

fn entry_head(title: &str, dates: &str) -> String {
    format!(
        "<div class=\"entry-head\"><strong>{}</strong><span>{}</span></div>\n",
        escape_html(title),
        escape_html(dates)
    )
}

fn entry_sub(subtitle: &str, location: Option<&str>) -> String {
    if subtitle.is_empty() && location.is_none() {
        return String::new();
    }
    format!(
        "<div class=\"entry-sub\"><span>{}</span><span>{}</span></div>\n",
        escape_html(subtitle),
        location.map(escape_html).unwrap_or_default()
    )
}

fn bullet_list(items: &[String]) -> String {
    let items = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(escape_html)
        .collect();
    list_items(items).unwrap_or_default()
}

fn list_items(items: Vec<String>) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let lis: String = items.iter().map(|i| format!("<li>{i}</li>\n")).collect();
    Some(format!("<ul>\n{lis}</ul>\n"))
}

fn inline(items: &[String]) -> Option<String> {
    let escaped: Vec<String> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(escape_html)
        .collect();
    (!escaped.is_empty()).then(|| format!("<p>{}</p>\n", escaped.join(", ")))
}

fn collect(entries: impl Iterator<Item = String>) -> Option<String> {
    let joined: String = entries.collect();
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{PersonalInfo, WorkExperience};

    fn resume() -> ResumeData {
        ResumeData {
            personal_info: PersonalInfo {
                full_name: "Jane <b>Doe</b>".to_string(),
                ..Default::default()
            },
            work_experience: vec![WorkExperience {
                company: "AT&T".to_string(),
                position: "Engineer".to_string(),
                highlights: vec!["Shipped \"fast\" path".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_html_escapes_user_text() {
        let html = render_resume_html(&resume(), "modern");
        assert!(html.contains("Jane &lt;b&gt;Doe&lt;/b&gt;"));
        assert!(html.contains("AT&amp;T"));
        assert!(html.contains("Shipped &quot;fast&quot; path"));
        assert!(!html.contains("<b>Doe"));
    }

    #[test]
    fn test_html_omits_empty_sections() {
        let html = render_resume_html(&resume(), "professional");
        assert!(html.contains("<h2>Experience</h2>"));
        assert!(!html.contains("<h2>Education</h2>"));
        assert!(!html.contains("<h2>Skills</h2>"));
        assert!(!html.contains("Professional Summary"));
    }

    #[test]
    fn test_html_unknown_template_falls_back() {
        let html = render_resume_html(&resume(), "nonexistent-template");
        assert!(html.contains("class=\"template-professional\""));
    }
}
