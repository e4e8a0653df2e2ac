//! LaTeX resume generation.
//!
//! Every template shares one document skeleton; the template decides the
//! preamble (fonts, colours, heading and entry macros), the header block,
//! the section order and the skills separator. All user text goes through
//! [`escape_latex`] before interpolation, and sections with no content are
//! left out entirely.

use crate::documents::escape::escape_latex;
use crate::documents::templates::{Section, TemplateId};
use crate::models::resume::{
    Certification, Education, Project, Publication, ResumeData, WorkExperience,
};

const COMMON_PREAMBLE: &str = r"\documentclass[11pt,letterpaper]{article}
\usepackage[T1]{fontenc}
\usepackage[utf8]{inputenc}
\usepackage{enumitem}
\usepackage[hidelinks]{hyperref}
\pagestyle{empty}
\setlength{\parindent}{0pt}
";

const PROFESSIONAL_PREAMBLE: &str = r"\usepackage[margin=0.75in]{geometry}
\usepackage{titlesec}
\titleformat{\section}{\large\bfseries\scshape}{}{0em}{}[\titlerule]
\titlespacing*{\section}{0pt}{10pt}{6pt}
\setlist[itemize]{leftmargin=1.5em,noitemsep,topsep=2pt}
\newcommand{\resumesection}[1]{\section*{#1}}
\newcommand{\entryhead}[2]{\textbf{#1}\hfill #2\par}
\newcommand{\entrysub}[2]{\textit{#1}\hfill\textit{#2}\par}
";

const MODERN_PREAMBLE: &str = r"\usepackage[margin=0.6in]{geometry}
\usepackage{xcolor}
\usepackage{titlesec}
\definecolor{accent}{HTML}{2B6CB0}
\renewcommand{\familydefault}{\sfdefault}
\titleformat{\section}{\color{accent}\Large\bfseries}{}{0em}{}[{\color{accent}\titlerule[1pt]}]
\titlespacing*{\section}{0pt}{8pt}{4pt}
\setlist[itemize]{leftmargin=1.2em,label={\color{accent}\textbullet},noitemsep,topsep=1pt}
\newcommand{\resumesection}[1]{\section*{#1}}
\newcommand{\entryhead}[2]{{\large\textbf{#1}}\hfill{\small\color{accent}#2}\par}
\newcommand{\entrysub}[2]{{\color{accent}#1}\hfill{\small #2}\par}
";

const MINIMAL_PREAMBLE: &str = r"\usepackage[margin=1in]{geometry}
\usepackage{titlesec}
\titleformat{\section}{\normalsize\bfseries}{}{0em}{\MakeUppercase}
\titlespacing*{\section}{0pt}{12pt}{4pt}
\setlist[itemize]{leftmargin=1em,label=--,noitemsep,topsep=0pt}
\newcommand{\resumesection}[1]{\section*{#1}}
\newcommand{\entryhead}[2]{#1\hfill #2\par}
\newcommand{\entrysub}[2]{\textit{#1}\hfill #2\par}
";

const ACADEMIC_PREAMBLE: &str = r"\usepackage[margin=1in]{geometry}
\usepackage{mathptmx}
\usepackage{titlesec}
\titleformat{\section}{\large\bfseries}{}{0em}{}[\vspace{-4pt}\rule{\textwidth}{0.4pt}]
\titlespacing*{\section}{0pt}{12pt}{6pt}
\setlist[itemize]{leftmargin=2em,noitemsep,topsep=2pt}
\newcommand{\resumesection}[1]{\section*{#1}}
\newcommand{\entryhead}[2]{\textbf{#1}\hfill #2\par}
\newcommand{\entrysub}[2]{#1\hfill\textit{#2}\par}
";

const CREATIVE_PREAMBLE: &str = r"\usepackage[margin=0.7in]{geometry}
\usepackage{xcolor}
\definecolor{accent}{HTML}{C53030}
\definecolor{muted}{HTML}{4A5568}
\setlist[itemize]{leftmargin=1.2em,label={\color{accent}\guillemotright},noitemsep,topsep=2pt}
\newcommand{\resumesection}[1]{\vspace{10pt}{\color{accent}\rule[1pt]{6pt}{6pt}}\hspace{6pt}{\large\bfseries\MakeUppercase{#1}}\par\vspace{4pt}}
\newcommand{\entryhead}[2]{\textbf{#1}\hfill{\color{muted}#2}\par}
\newcommand{\entrysub}[2]{{\color{accent}#1}\hfill{\color{muted}\small #2}\par}
";

/// Template-specific preamble, shared with cover-letter generation.
pub(crate) fn preamble(template: TemplateId) -> String {
    let specific = match template {
        TemplateId::Professional => PROFESSIONAL_PREAMBLE,
        TemplateId::Modern => MODERN_PREAMBLE,
        TemplateId::Minimal => MINIMAL_PREAMBLE,
        TemplateId::Academic => ACADEMIC_PREAMBLE,
        TemplateId::Creative => CREATIVE_PREAMBLE,
    };
    format!("{COMMON_PREAMBLE}{specific}")
}

/// Name and contact block. `contacts` must already be escaped.
pub(crate) fn header(template: TemplateId, name: &str, contacts: &[String]) -> String {
    let name = escape_latex(name.trim());
    let mut out = String::new();
    match template {
        TemplateId::Professional | TemplateId::Academic => {
            let joiner = if template == TemplateId::Academic {
                r" \,\textperiodcentered\, "
            } else {
                r" \textbullet{} "
            };
            out.push_str("\\begin{center}\n");
            if !name.is_empty() {
                out.push_str(&format!("{{\\LARGE\\bfseries {name}}}\\\\[4pt]\n"));
            }
            if !contacts.is_empty() {
                out.push_str(&format!("{}\n", contacts.join(joiner)));
            }
            out.push_str("\\end{center}\n");
        }
        TemplateId::Modern => {
            if !name.is_empty() {
                out.push_str(&format!("{{\\Huge\\bfseries\\color{{accent}} {name}}}\\par\n"));
            }
            if !contacts.is_empty() {
                out.push_str(&format!("{{\\small {}}}\\par\n", contacts.join(r" \textbar{} ")));
            }
            out.push_str("\\medskip\n");
        }
        TemplateId::Minimal => {
            if !name.is_empty() {
                out.push_str(&format!("{{\\Large {name}}}\\par\\smallskip\n"));
            }
            if !contacts.is_empty() {
                out.push_str(&format!("{{\\small {}}}\\par\n", contacts.join(r" \quad ")));
            }
        }
        TemplateId::Creative => {
            out.push_str(
                "\\noindent\\colorbox{accent}{\\parbox{\\dimexpr\\textwidth-2\\fboxsep}{\\vspace{6pt}\n",
            );
            if !name.is_empty() {
                out.push_str(&format!("{{\\color{{white}}\\Huge\\bfseries {name}}}\\par\n"));
            }
            if !contacts.is_empty() {
                out.push_str(&format!(
                    "\\vspace{{4pt}}{{\\color{{white}}\\small {}}}\\par\n",
                    contacts.join(r" \textbullet{} ")
                ));
            }
            out.push_str("\\vspace{6pt}}}\\par\\medskip\n");
        }
    }
    out
}

/// Generates a complete LaTeX document for a resume.
/// Unknown template ids fall back to `professional`.
pub fn generate_latex_resume(data: &ResumeData, template_id: &str) -> String {
    render_latex_resume(data, TemplateId::resolve(template_id))
}

pub fn render_latex_resume(data: &ResumeData, template: TemplateId) -> String {
    let mut doc = preamble(template);
    doc.push_str("\\begin{document}\n");

    let info = &data.personal_info;
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
    .map(escape_latex)
    .collect();
    doc.push_str(&header(template, &info.full_name, &contacts));

    for &section in template.section_order() {
        if let Some(body) = section_body(data, template, section) {
            doc.push_str(&format!(
                "\\resumesection{{{}}}\n{body}",
                template.section_title(section)
            ));
        }
    }

    doc.push_str("\\end{document}\n");
    doc
}

fn section_body(data: &ResumeData, template: TemplateId, section: Section) -> Option<String> {
    match section {
        Section::Summary => present(&data.personal_info.summary).map(|s| format!("{}\n", escape_latex(s))),
        Section::Experience => join_entries(data.work_experience.iter().filter_map(experience_entry)),
        Section::Education => join_entries(data.education.iter().filter_map(education_entry)),
        Section::Skills => inline_list(&data.skills, skills_separator(template)),
        Section::Projects => join_entries(data.projects.iter().flatten().filter_map(project_entry)),
        Section::Certifications => {
            itemize(data.certifications.iter().flatten().filter_map(certification_item))
        }
        Section::Publications => {
            itemize(data.publications.iter().flatten().filter_map(publication_item))
        }
        Section::Languages => inline_list(&data.languages, ", "),
    }
}

fn skills_separator(template: TemplateId) -> &'static str {
    match template {
        TemplateId::Professional | TemplateId::Academic => ", ",
        TemplateId::Modern | TemplateId::Creative => r" \textbullet{} ",
        TemplateId::Minimal => r" \textperiodcentered{} ",
    }
}

fn experience_entry(job: &WorkExperience) -> Option<String> {
    let position = job.position.trim();
    let company = job.company.trim();
    let description = present(&job.description);
    let highlights: Vec<&str> = job
        .highlights
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .collect();

    if position.is_empty() && company.is_empty() && description.is_none() && highlights.is_empty() {
        return None;
    }

    let (title, subtitle) = if position.is_empty() {
        (company, "")
    } else {
        (position, company)
    };
    let dates = date_range(
        present(&job.start_date),
        present(&job.end_date),
        job.current,
    );

    let mut out = entry_lines(title, &dates, subtitle, present(&job.location).unwrap_or(""));
    if let Some(text) = description {
        out.push_str(&format!("{}\\par\n", escape_latex(text)));
    }
    if let Some(list) = itemize(highlights.into_iter().map(escape_latex)) {
        out.push_str(&list);
    }
    Some(out)
}

fn education_entry(edu: &Education) -> Option<String> {
    let degree = edu.degree.trim();
    let institution = edu.institution.trim();
    if degree.is_empty() && institution.is_empty() {
        return None;
    }

    let title = match present(&edu.field_of_study) {
        Some(field) if !degree.is_empty() => format!("{degree}, {field}"),
        Some(field) => field.to_string(),
        None if degree.is_empty() => institution.to_string(),
        None => degree.to_string(),
    };
    let subtitle = if title == institution { "" } else { institution };
    let dates = date_range(present(&edu.start_date), present(&edu.end_date), false);

    let mut out = entry_lines(&title, &dates, subtitle, present(&edu.location).unwrap_or(""));
    if let Some(gpa) = present(&edu.gpa) {
        out.push_str(&format!("GPA: {}\\par\n", escape_latex(gpa)));
    }
    if let Some(text) = present(&edu.description) {
        out.push_str(&format!("{}\\par\n", escape_latex(text)));
    }
    Some(out)
}

fn project_entry(project: &Project) -> Option<String> {
    let name = project.name.trim();
    if name.is_empty() {
        return None;
    }
    let url = present(&project.url).map(escape_latex).unwrap_or_default();
    let mut out = format!("\\entryhead{{{}}}{{{url}}}\n", escape_latex(name));

    let technologies: Vec<&str> = project
        .technologies
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !technologies.is_empty() {
        out.push_str(&format!(
            "\\textit{{{}}}\\par\n",
            escape_latex(&technologies.join(", "))
        ));
    }
    if let Some(text) = present(&project.description) {
        out.push_str(&format!("{}\\par\n", escape_latex(text)));
    }
    Some(out)
}

fn certification_item(cert: &Certification) -> Option<String> {
    let name = cert.name.trim();
    if name.is_empty() {
        return None;
    }
    let mut item = format!("\\textbf{{{}}}", escape_latex(name));
    if let Some(issuer) = present(&cert.issuer) {
        item.push_str(&format!(", {}", escape_latex(issuer)));
    }
    if let Some(date) = present(&cert.date) {
        item.push_str(&format!(" \\hfill {}", escape_latex(date)));
    }
    if let Some(url) = present(&cert.credential_url) {
        item.push_str(&format!("\\\\{{\\small {}}}", escape_latex(url)));
    }
    Some(item)
}

fn publication_item(publication: &Publication) -> Option<String> {
    let title = publication.title.trim();
    if title.is_empty() {
        return None;
    }
    let mut item = format!("\\textit{{{}}}", escape_latex(title));
    let venue: Vec<String> = [&publication.publisher, &publication.date]
        .into_iter()
        .filter_map(|v| present(v))
        .map(escape_latex)
        .collect();
    if !venue.is_empty() {
        item.push_str(&format!(". {}", venue.join(", ")));
    }
    item.push('.');
    if let Some(url) = present(&publication.url) {
        item.push_str(&format!(" {{\\small {}}}", escape_latex(url)));
    }
    Some(item)
}

/// `\entryhead` always, `\entrysub` only when it has something to say.
/// `title`, `subtitle` and `location` are raw; `dates` is already escaped.
fn entry_lines(title: &str, dates: &str, subtitle: &str, location: &str) -> String {
    let mut out = format!("\\entryhead{{{}}}{{{dates}}}\n", escape_latex(title));
    if !subtitle.is_empty() || !location.is_empty() {
        out.push_str(&format!(
            "\\entrysub{{{}}}{{{}}}\n",
            escape_latex(subtitle),
            escape_latex(location)
        ));
    }
    out
}

/// Escaped "start -- end" text; `current` prints "Present" as the end.
fn date_range(start: Option<&str>, end: Option<&str>, current: bool) -> String {
    let end = if current { Some("Present") } else { end };
    match (start, end) {
        (Some(s), Some(e)) => format!("{} -- {}", escape_latex(s), escape_latex(e)),
        (Some(s), None) => escape_latex(s),
        (None, Some(e)) => escape_latex(e),
        (None, None) => String::new(),
    }
}

fn join_entries(entries: impl Iterator<Item = String>) -> Option<String> {
    let entries: Vec<String> = entries.collect();
    (!entries.is_empty()).then(|| format!("{}\n", entries.join("\\smallskip\n")))
}

fn itemize(items: impl Iterator<Item = String>) -> Option<String> {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        return None;
    }
    let mut out = String::from("\\begin{itemize}\n");
    for item in items {
        out.push_str(&format!("  \\item {item}\n"));
    }
    out.push_str("\\end{itemize}\n");
    Some(out)
}

fn inline_list(items: &[String], separator: &str) -> Option<String> {
    let escaped: Vec<String> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(escape_latex)
        .collect();
    (!escaped.is_empty()).then(|| format!("{}\\par\n", escaped.join(separator)))
}

/// Trimmed, non-empty contents of an optional field.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::PersonalInfo;
    use rstest::rstest;

    fn sample_resume() -> ResumeData {
        ResumeData {
            personal_info: PersonalInfo {
                full_name: "Jane Doe".to_string(),
                email: Some("jane@example.com".to_string()),
                summary: Some("Backend engineer focused on payments.".to_string()),
                ..Default::default()
            },
            work_experience: vec![WorkExperience {
                company: "Acme".to_string(),
                position: "Senior Engineer".to_string(),
                start_date: Some("Jan 2021".to_string()),
                current: true,
                highlights: vec!["Cut p99 latency by 40%".to_string()],
                ..Default::default()
            }],
            education: vec![Education {
                institution: "State University".to_string(),
                degree: "B.Sc.".to_string(),
                field_of_study: Some("Computer Science".to_string()),
                ..Default::default()
            }],
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            ..Default::default()
        }
    }

    /// Every free-text field set to `marker{c}marker`.
    fn resume_with_every_field(value: &str) -> ResumeData {
        let s = || value.to_string();
        let o = || Some(value.to_string());
        ResumeData {
            personal_info: PersonalInfo {
                full_name: s(),
                email: o(),
                phone: o(),
                location: o(),
                website: o(),
                linkedin: o(),
                github: o(),
                summary: o(),
            },
            work_experience: vec![WorkExperience {
                company: s(),
                position: s(),
                location: o(),
                start_date: o(),
                end_date: o(),
                current: false,
                description: o(),
                highlights: vec![s()],
            }],
            education: vec![Education {
                institution: s(),
                degree: s(),
                field_of_study: o(),
                location: o(),
                start_date: o(),
                end_date: o(),
                gpa: o(),
                description: o(),
            }],
            skills: vec![s()],
            projects: Some(vec![Project {
                name: s(),
                description: o(),
                technologies: vec![s()],
                url: o(),
            }]),
            certifications: Some(vec![Certification {
                name: s(),
                issuer: o(),
                date: o(),
                credential_url: o(),
            }]),
            publications: Some(vec![Publication {
                title: s(),
                publisher: o(),
                date: o(),
                url: o(),
            }]),
            languages: vec![s()],
        }
    }

    #[rstest]
    fn test_every_template_escapes_every_special_character(
        #[values("professional", "modern", "minimal", "academic", "creative")] template: &str,
        #[values('\\', '&', '%', '$', '#', '_', '{', '}', '~', '^', '<', '>')] special: char,
    ) {
        let raw = format!("mark{special}mark");
        let escaped = format!("mark{}mark", escape_latex(&special.to_string()));
        let latex = generate_latex_resume(&resume_with_every_field(&raw), template);

        assert!(!latex.contains(&raw), "{template}: raw {special:?} leaked");
        // Education title joins degree and field, so it holds two occurrences.
        assert!(
            latex.matches(&escaped).count() >= 30,
            "{template}: expected every field escaped, found {}",
            latex.matches(&escaped).count()
        );
    }

    #[test]
    fn test_nonexistent_template_renders_professional() {
        let data = sample_resume();
        assert_eq!(
            generate_latex_resume(&data, "nonexistent-template"),
            generate_latex_resume(&data, "professional")
        );
    }

    #[test]
    fn test_templates_produce_distinct_documents() {
        let data = sample_resume();
        let rendered: Vec<String> = TemplateId::ALL
            .iter()
            .map(|t| generate_latex_resume(&data, t.as_str()))
            .collect();
        for (i, a) in rendered.iter().enumerate() {
            for b in rendered.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_document_is_well_formed() {
        let latex = generate_latex_resume(&sample_resume(), "modern");
        assert!(latex.starts_with("\\documentclass"));
        assert!(latex.contains("\\begin{document}"));
        assert!(latex.trim_end().ends_with("\\end{document}"));
        assert_eq!(
            latex.matches("\\begin{itemize}").count(),
            latex.matches("\\end{itemize}").count()
        );
    }

    #[test]
    fn test_missing_optional_sections_are_omitted() {
        let latex = generate_latex_resume(&sample_resume(), "professional");
        assert!(!latex.contains("{Projects}"));
        assert!(!latex.contains("{Certifications}"));
        assert!(!latex.contains("{Publications}"));
        assert!(!latex.contains("{Languages}"));
        assert!(latex.contains("\\resumesection{Experience}"));
    }

    #[test]
    fn test_empty_optional_sections_are_omitted() {
        let mut data = sample_resume();
        data.projects = Some(vec![]);
        data.certifications = Some(vec![Certification::default()]);
        data.publications = Some(vec![Publication {
            title: "   ".to_string(),
            ..Default::default()
        }]);
        let latex = generate_latex_resume(&data, "academic");
        assert!(!latex.contains("{Projects}"));
        assert!(!latex.contains("{Certifications}"));
        assert!(!latex.contains("{Publications}"));
        assert_eq!(latex.matches("\\begin{itemize}").count(), 1);
    }

    #[test]
    fn test_entry_without_highlights_has_no_itemize() {
        let mut data = sample_resume();
        data.work_experience[0].highlights.clear();
        let latex = generate_latex_resume(&data, "minimal");
        assert!(!latex.contains("\\begin{itemize}"));
    }

    #[test]
    fn test_current_role_prints_present() {
        let latex = generate_latex_resume(&sample_resume(), "professional");
        assert!(latex.contains("\\entryhead{Senior Engineer}{Jan 2021 -- Present}"));
        assert!(latex.contains("\\entrysub{Acme}{}"));
    }

    #[test]
    fn test_empty_resume_still_compiles_structurally() {
        let latex = generate_latex_resume(&ResumeData::default(), "creative");
        assert!(!latex.contains("\\resumesection"));
        assert!(latex.contains("\\end{document}"));
    }

    #[test]
    fn test_academic_orders_education_before_experience() {
        let latex = generate_latex_resume(&sample_resume(), "academic");
        let education = latex.find("\\resumesection{Education}").unwrap();
        let experience = latex.find("\\resumesection{Professional Experience}").unwrap();
        assert!(education < experience);
    }
}
