use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    /// Free-form dates ("Jan 2021", "2021-01"), printed as given.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: Option<String>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub gpa: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub name: String,
    pub issuer: Option<String>,
    pub date: Option<String>,
    pub credential_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Publication {
    pub title: String,
    pub publisher: Option<String>,
    pub date: Option<String>,
    pub url: Option<String>,
}

/// The structured resume document edited in the builder.
/// Projects, certifications and publications are optional sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeData {
    pub personal_info: PersonalInfo,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub projects: Option<Vec<Project>>,
    pub certifications: Option<Vec<Certification>>,
    pub publications: Option<Vec<Publication>>,
    pub languages: Vec<String>,
}

impl ResumeData {
    /// Flattens every textual field into one blob for keyword matching.
    pub fn plain_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let p = &self.personal_info;
        parts.push(&p.full_name);
        parts.extend(p.summary.as_deref());

        for job in &self.work_experience {
            parts.push(&job.position);
            parts.push(&job.company);
            parts.extend(job.description.as_deref());
            parts.extend(job.highlights.iter().map(String::as_str));
        }
        for edu in &self.education {
            parts.push(&edu.degree);
            parts.extend(edu.field_of_study.as_deref());
            parts.push(&edu.institution);
            parts.extend(edu.description.as_deref());
        }
        parts.extend(self.skills.iter().map(String::as_str));
        for project in self.projects.iter().flatten() {
            parts.push(&project.name);
            parts.extend(project.description.as_deref());
            parts.extend(project.technologies.iter().map(String::as_str));
        }
        for cert in self.certifications.iter().flatten() {
            parts.push(&cert.name);
            parts.extend(cert.issuer.as_deref());
        }
        for publication in self.publications.iter().flatten() {
            parts.push(&publication.title);
        }
        parts.extend(self.languages.iter().map(String::as_str));

        parts
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub template_id: String,
    pub data: Json<ResumeData>,
    pub latex_source: Option<String>,
    pub s3_pdf_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
