//! Template registry: the known layout ids and their section layout.
//!
//! Output formats (LaTeX, HTML) dispatch on [`TemplateId`]; unknown ids
//! resolve to [`TemplateId::Professional`].

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    #[default]
    Professional,
    Modern,
    Minimal,
    Academic,
    Creative,
}

/// Resume sections in the order a template prints them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Publications,
    Languages,
}

/// Public listing entry for the template picker.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: TemplateId,
    pub name: &'static str,
    pub description: &'static str,
}

const STANDARD_ORDER: &[Section] = &[
    Section::Summary,
    Section::Experience,
    Section::Education,
    Section::Skills,
    Section::Projects,
    Section::Certifications,
    Section::Publications,
    Section::Languages,
];

const ACADEMIC_ORDER: &[Section] = &[
    Section::Summary,
    Section::Education,
    Section::Publications,
    Section::Experience,
    Section::Projects,
    Section::Certifications,
    Section::Skills,
    Section::Languages,
];

const CREATIVE_ORDER: &[Section] = &[
    Section::Summary,
    Section::Skills,
    Section::Experience,
    Section::Projects,
    Section::Education,
    Section::Certifications,
    Section::Publications,
    Section::Languages,
];

impl TemplateId {
    pub const ALL: [TemplateId; 5] = [
        TemplateId::Professional,
        TemplateId::Modern,
        TemplateId::Minimal,
        TemplateId::Academic,
        TemplateId::Creative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Professional => "professional",
            TemplateId::Modern => "modern",
            TemplateId::Minimal => "minimal",
            TemplateId::Academic => "academic",
            TemplateId::Creative => "creative",
        }
    }

    /// Looks up a template by id, case-insensitively. Never fails.
    pub fn resolve(id: &str) -> TemplateId {
        let wanted = id.trim();
        TemplateId::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .unwrap_or_else(|| {
                debug!("Unknown template id {wanted:?}, using professional");
                TemplateId::Professional
            })
    }

    pub fn info(&self) -> TemplateInfo {
        let (name, description) = match self {
            TemplateId::Professional => (
                "Professional",
                "Classic single-column layout with ruled small-caps headings.",
            ),
            TemplateId::Modern => (
                "Modern",
                "Sans-serif layout with a blue accent colour and compact spacing.",
            ),
            TemplateId::Minimal => (
                "Minimal",
                "Generous margins, no rules, plain uppercase headings.",
            ),
            TemplateId::Academic => (
                "Academic",
                "CV layout leading with education and publications.",
            ),
            TemplateId::Creative => (
                "Creative",
                "Colour header band with skills placed up front.",
            ),
        };
        TemplateInfo {
            id: *self,
            name,
            description,
        }
    }

    pub fn section_order(&self) -> &'static [Section] {
        match self {
            TemplateId::Academic => ACADEMIC_ORDER,
            TemplateId::Creative => CREATIVE_ORDER,
            TemplateId::Professional | TemplateId::Modern | TemplateId::Minimal => STANDARD_ORDER,
        }
    }

    pub fn section_title(&self, section: Section) -> &'static str {
        match (self, section) {
            (TemplateId::Professional, Section::Summary) => "Professional Summary",
            (TemplateId::Modern, Section::Summary) => "Profile",
            (TemplateId::Creative, Section::Summary) => "About Me",
            (_, Section::Summary) => "Summary",
            (TemplateId::Academic, Section::Experience) => "Professional Experience",
            (_, Section::Experience) => "Experience",
            (_, Section::Education) => "Education",
            (TemplateId::Academic, Section::Skills) => "Technical Skills",
            (_, Section::Skills) => "Skills",
            (_, Section::Projects) => "Projects",
            (_, Section::Certifications) => "Certifications",
            (_, Section::Publications) => "Publications",
            (_, Section::Languages) => "Languages",
        }
    }
}

pub fn list_templates() -> Vec<TemplateInfo> {
    TemplateId::ALL.iter().map(TemplateId::info).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_template_falls_back_to_professional() {
        assert_eq!(TemplateId::resolve("nonexistent-template"), TemplateId::Professional);
        assert_eq!(TemplateId::resolve(""), TemplateId::Professional);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        assert_eq!(TemplateId::resolve(" Modern "), TemplateId::Modern);
        assert_eq!(TemplateId::resolve("ACADEMIC"), TemplateId::Academic);
    }

    #[test]
    fn test_every_template_orders_every_section_once() {
        for template in TemplateId::ALL {
            let order = template.section_order();
            assert_eq!(order.len(), 8, "{template:?}");
            for section in STANDARD_ORDER {
                assert_eq!(order.iter().filter(|s| *s == section).count(), 1);
            }
        }
    }

    #[test]
    fn test_academic_leads_with_education() {
        assert_eq!(TemplateId::Academic.section_order()[1], Section::Education);
    }

    #[test]
    fn test_list_templates_covers_all_ids() {
        let ids: Vec<_> = list_templates().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, TemplateId::ALL.to_vec());
    }

    #[test]
    fn test_template_id_serde() {
        let id: TemplateId = serde_json::from_str(r#""creative""#).unwrap();
        assert_eq!(id, TemplateId::Creative);
    }
}
