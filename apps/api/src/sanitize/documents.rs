//! Whole-document sanitizers for resumes, cover letters and job applications.
//!
//! Each returns a cleaned copy or the first rule violation found.

use crate::models::cover_letter::{CoverLetterData, Sender};
use crate::models::job_application::JobApplicationInput;
use crate::models::resume::{
    Certification, Education, PersonalInfo, Project, Publication, ResumeData, WorkExperience,
};
use crate::sanitize::fields::{
    check_count, sanitize_field, sanitize_list, sanitize_optional, sanitize_required, FieldRule,
    SanitizeError,
};

pub const MAX_WORK_EXPERIENCE: usize = 20;
pub const MAX_EDUCATION: usize = 10;
pub const MAX_SKILLS: usize = 50;
pub const MAX_PROJECTS: usize = 20;
pub const MAX_CERTIFICATIONS: usize = 30;
pub const MAX_PUBLICATIONS: usize = 30;
pub const MAX_LANGUAGES: usize = 20;
pub const MAX_HIGHLIGHTS: usize = 30;
pub const MAX_TECHNOLOGIES: usize = 30;
pub const MAX_PARAGRAPHS: usize = 10;

const FULL_NAME: FieldRule = FieldRule::strict("full_name", 100);
const EMAIL: FieldRule = FieldRule::email("email");
const PHONE: FieldRule = FieldRule::strict("phone", 30);
const LOCATION: FieldRule = FieldRule::strict("location", 200);
const WEBSITE: FieldRule = FieldRule::contact_url("website");
const LINKEDIN: FieldRule = FieldRule::url("linkedin");
const GITHUB: FieldRule = FieldRule::url("github");
const SUMMARY: FieldRule = FieldRule::free_text("summary", 5000);

const COMPANY: FieldRule = FieldRule::strict("company", 200);
const POSITION: FieldRule = FieldRule::strict("position", 200);
const DATE: FieldRule = FieldRule::strict("date", 50);
const DESCRIPTION: FieldRule = FieldRule::free_text("description", 5000);
const HIGHLIGHT: FieldRule = FieldRule::free_text("highlights", 1000);

const INSTITUTION: FieldRule = FieldRule::strict("institution", 200);
const DEGREE: FieldRule = FieldRule::strict("degree", 200);
const FIELD_OF_STUDY: FieldRule = FieldRule::strict("field_of_study", 200);
const GPA: FieldRule = FieldRule::strict("gpa", 20);

const SKILL: FieldRule = FieldRule::strict("skills", 100);
const LANGUAGE: FieldRule = FieldRule::strict("languages", 100);
const PROJECT_NAME: FieldRule = FieldRule::strict("project_name", 200);
const TECHNOLOGY: FieldRule = FieldRule::strict("technologies", 100);
const PROJECT_URL: FieldRule = FieldRule::url("project_url");
const CERT_NAME: FieldRule = FieldRule::strict("certification_name", 200);
const ISSUER: FieldRule = FieldRule::strict("issuer", 200);
const CREDENTIAL_URL: FieldRule = FieldRule::url("credential_url");
const PUBLICATION_TITLE: FieldRule = FieldRule::strict("publication_title", 300);
const PUBLISHER: FieldRule = FieldRule::strict("publisher", 200);
const PUBLICATION_URL: FieldRule = FieldRule::url("publication_url");

const RECIPIENT_NAME: FieldRule = FieldRule::strict("recipient_name", 100);
const RECIPIENT_TITLE: FieldRule = FieldRule::strict("recipient_title", 200);
const COMPANY_NAME: FieldRule = FieldRule::strict("company_name", 200);
const COMPANY_ADDRESS: FieldRule = FieldRule::free_text("company_address", 500);
const JOB_TITLE: FieldRule = FieldRule::strict("job_title", 200);
const SALUTATION: FieldRule = FieldRule::strict("salutation", 200);
const PARAGRAPH: FieldRule = FieldRule::free_text("body_paragraphs", 3000);
const CLOSING: FieldRule = FieldRule::strict("closing", 100);

const JOB_URL: FieldRule = FieldRule::url("job_url");
const SALARY_RANGE: FieldRule = FieldRule::strict("salary_range", 100);
const NOTES: FieldRule = FieldRule::free_text("notes", 10_000);
/// Job postings are often pasted from the browser with their markup.
const JOB_DESCRIPTION: FieldRule = FieldRule::html("description", 20_000);

pub const TITLE: FieldRule = FieldRule::strict("title", 200);

pub fn sanitize_resume(data: &ResumeData) -> Result<ResumeData, SanitizeError> {
    check_count(data.work_experience.len(), "work_experience", MAX_WORK_EXPERIENCE)?;
    check_count(data.education.len(), "education", MAX_EDUCATION)?;

    let work_experience = data
        .work_experience
        .iter()
        .map(sanitize_work_experience)
        .collect::<Result<Vec<_>, _>>()?;
    let education = data
        .education
        .iter()
        .map(sanitize_education)
        .collect::<Result<Vec<_>, _>>()?;

    let projects = match &data.projects {
        Some(items) => {
            check_count(items.len(), "projects", MAX_PROJECTS)?;
            Some(items.iter().map(sanitize_project).collect::<Result<Vec<_>, _>>()?)
        }
        None => None,
    };
    let certifications = match &data.certifications {
        Some(items) => {
            check_count(items.len(), "certifications", MAX_CERTIFICATIONS)?;
            Some(
                items
                    .iter()
                    .map(sanitize_certification)
                    .collect::<Result<Vec<_>, _>>()?,
            )
        }
        None => None,
    };
    let publications = match &data.publications {
        Some(items) => {
            check_count(items.len(), "publications", MAX_PUBLICATIONS)?;
            Some(
                items
                    .iter()
                    .map(sanitize_publication)
                    .collect::<Result<Vec<_>, _>>()?,
            )
        }
        None => None,
    };

    Ok(ResumeData {
        personal_info: sanitize_personal_info(&data.personal_info)?,
        work_experience,
        education,
        skills: sanitize_list(&data.skills, &SKILL, MAX_SKILLS)?,
        projects,
        certifications,
        publications,
        languages: sanitize_list(&data.languages, &LANGUAGE, MAX_LANGUAGES)?,
    })
}

fn sanitize_personal_info(info: &PersonalInfo) -> Result<PersonalInfo, SanitizeError> {
    Ok(PersonalInfo {
        full_name: sanitize_field(&info.full_name, &FULL_NAME)?,
        email: sanitize_optional(info.email.as_deref(), &EMAIL)?,
        phone: sanitize_optional(info.phone.as_deref(), &PHONE)?,
        location: sanitize_optional(info.location.as_deref(), &LOCATION)?,
        website: sanitize_optional(info.website.as_deref(), &WEBSITE)?,
        linkedin: sanitize_optional(info.linkedin.as_deref(), &LINKEDIN)?,
        github: sanitize_optional(info.github.as_deref(), &GITHUB)?,
        summary: sanitize_optional(info.summary.as_deref(), &SUMMARY)?,
    })
}

fn sanitize_work_experience(job: &WorkExperience) -> Result<WorkExperience, SanitizeError> {
    Ok(WorkExperience {
        company: sanitize_field(&job.company, &COMPANY)?,
        position: sanitize_field(&job.position, &POSITION)?,
        location: sanitize_optional(job.location.as_deref(), &LOCATION)?,
        start_date: sanitize_optional(job.start_date.as_deref(), &DATE)?,
        end_date: sanitize_optional(job.end_date.as_deref(), &DATE)?,
        current: job.current,
        description: sanitize_optional(job.description.as_deref(), &DESCRIPTION)?,
        highlights: sanitize_list(&job.highlights, &HIGHLIGHT, MAX_HIGHLIGHTS)?,
    })
}

fn sanitize_education(edu: &Education) -> Result<Education, SanitizeError> {
    Ok(Education {
        institution: sanitize_field(&edu.institution, &INSTITUTION)?,
        degree: sanitize_field(&edu.degree, &DEGREE)?,
        field_of_study: sanitize_optional(edu.field_of_study.as_deref(), &FIELD_OF_STUDY)?,
        location: sanitize_optional(edu.location.as_deref(), &LOCATION)?,
        start_date: sanitize_optional(edu.start_date.as_deref(), &DATE)?,
        end_date: sanitize_optional(edu.end_date.as_deref(), &DATE)?,
        gpa: sanitize_optional(edu.gpa.as_deref(), &GPA)?,
        description: sanitize_optional(edu.description.as_deref(), &DESCRIPTION)?,
    })
}

fn sanitize_project(project: &Project) -> Result<Project, SanitizeError> {
    Ok(Project {
        name: sanitize_field(&project.name, &PROJECT_NAME)?,
        description: sanitize_optional(project.description.as_deref(), &DESCRIPTION)?,
        technologies: sanitize_list(&project.technologies, &TECHNOLOGY, MAX_TECHNOLOGIES)?,
        url: sanitize_optional(project.url.as_deref(), &PROJECT_URL)?,
    })
}

fn sanitize_certification(cert: &Certification) -> Result<Certification, SanitizeError> {
    Ok(Certification {
        name: sanitize_field(&cert.name, &CERT_NAME)?,
        issuer: sanitize_optional(cert.issuer.as_deref(), &ISSUER)?,
        date: sanitize_optional(cert.date.as_deref(), &DATE)?,
        credential_url: sanitize_optional(cert.credential_url.as_deref(), &CREDENTIAL_URL)?,
    })
}

fn sanitize_publication(publication: &Publication) -> Result<Publication, SanitizeError> {
    Ok(Publication {
        title: sanitize_field(&publication.title, &PUBLICATION_TITLE)?,
        publisher: sanitize_optional(publication.publisher.as_deref(), &PUBLISHER)?,
        date: sanitize_optional(publication.date.as_deref(), &DATE)?,
        url: sanitize_optional(publication.url.as_deref(), &PUBLICATION_URL)?,
    })
}

pub fn sanitize_cover_letter(data: &CoverLetterData) -> Result<CoverLetterData, SanitizeError> {
    Ok(CoverLetterData {
        sender: Sender {
            full_name: sanitize_field(&data.sender.full_name, &FULL_NAME)?,
            email: sanitize_optional(data.sender.email.as_deref(), &EMAIL)?,
            phone: sanitize_optional(data.sender.phone.as_deref(), &PHONE)?,
            location: sanitize_optional(data.sender.location.as_deref(), &LOCATION)?,
        },
        recipient_name: sanitize_optional(data.recipient_name.as_deref(), &RECIPIENT_NAME)?,
        recipient_title: sanitize_optional(data.recipient_title.as_deref(), &RECIPIENT_TITLE)?,
        company_name: sanitize_field(&data.company_name, &COMPANY_NAME)?,
        company_address: sanitize_optional(data.company_address.as_deref(), &COMPANY_ADDRESS)?,
        job_title: sanitize_optional(data.job_title.as_deref(), &JOB_TITLE)?,
        date: sanitize_optional(data.date.as_deref(), &DATE)?,
        salutation: sanitize_optional(data.salutation.as_deref(), &SALUTATION)?,
        body_paragraphs: sanitize_list(&data.body_paragraphs, &PARAGRAPH, MAX_PARAGRAPHS)?,
        closing: sanitize_optional(data.closing.as_deref(), &CLOSING)?,
        signature_name: sanitize_optional(data.signature_name.as_deref(), &FULL_NAME)?,
    })
}

pub fn sanitize_job_application(
    input: &JobApplicationInput,
) -> Result<JobApplicationInput, SanitizeError> {
    Ok(JobApplicationInput {
        company: sanitize_required(&input.company, &COMPANY)?,
        position: sanitize_required(&input.position, &POSITION)?,
        location: sanitize_optional(input.location.as_deref(), &LOCATION)?,
        job_url: sanitize_optional(input.job_url.as_deref(), &JOB_URL)?,
        salary_range: sanitize_optional(input.salary_range.as_deref(), &SALARY_RANGE)?,
        description: sanitize_optional(input.description.as_deref(), &JOB_DESCRIPTION)?,
        notes: sanitize_optional(input.notes.as_deref(), &NOTES)?,
    })
}

/// Sanitizes free text coming back from the LLM before it is shown or stored.
pub fn sanitize_generated_text(text: &str) -> Result<String, SanitizeError> {
    sanitize_field(text, &FieldRule::free_text("generated_text", 10_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume_with_company(company: &str) -> ResumeData {
        ResumeData {
            work_experience: vec![WorkExperience {
                company: company.to_string(),
                position: "Engineer".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_resume_company_injection_is_rejected() {
        let err = sanitize_resume(&resume_with_company("Acme'; DROP TABLE users; --")).unwrap_err();
        assert_eq!(err.to_string(), "SQL injection pattern detected");
        assert_eq!(err.field(), "company");
    }

    #[test]
    fn test_resume_description_script_is_stripped() {
        let mut data = resume_with_company("Acme");
        data.work_experience[0].description =
            Some("Owned payments<script>document.cookie</script>".to_string());
        data.work_experience[0].highlights = vec!["<img src=x onerror=alert(1)>".to_string()];
        let clean = sanitize_resume(&data).unwrap();
        assert_eq!(clean.work_experience[0].description.as_deref(), Some("Owned payments"));
        assert!(clean.work_experience[0].highlights.is_empty());
    }

    #[test]
    fn test_resume_work_experience_cap() {
        let mut data = ResumeData::default();
        data.work_experience = vec![WorkExperience::default(); MAX_WORK_EXPERIENCE + 1];
        assert_eq!(
            sanitize_resume(&data).unwrap_err(),
            SanitizeError::TooMany { field: "work_experience", max: MAX_WORK_EXPERIENCE }
        );
    }

    #[test]
    fn test_resume_skills_cap() {
        let mut data = ResumeData::default();
        data.skills = (0..=MAX_SKILLS).map(|i| format!("skill-{i}")).collect();
        assert_eq!(
            sanitize_resume(&data).unwrap_err(),
            SanitizeError::TooMany { field: "skills", max: MAX_SKILLS }
        );
    }

    #[test]
    fn test_resume_dangerous_link_is_rejected() {
        let mut data = ResumeData::default();
        data.personal_info.website = Some("javascript:alert(document.domain)".to_string());
        assert_eq!(
            sanitize_resume(&data).unwrap_err(),
            SanitizeError::DangerousUrl { field: "website" }
        );
    }

    #[test]
    fn test_resume_optional_sections_stay_absent() {
        let clean = sanitize_resume(&resume_with_company("Acme")).unwrap();
        assert!(clean.projects.is_none());
        assert!(clean.certifications.is_none());
        assert!(clean.publications.is_none());
    }

    #[test]
    fn test_cover_letter_paragraphs_are_cleaned() {
        let data = CoverLetterData {
            company_name: "Globex".to_string(),
            body_paragraphs: vec![
                "I am excited<script>x()</script> to apply.".to_string(),
                "   ".to_string(),
            ],
            ..Default::default()
        };
        let clean = sanitize_cover_letter(&data).unwrap();
        assert_eq!(clean.body_paragraphs, vec!["I am excited to apply.".to_string()]);
    }

    #[test]
    fn test_job_application_requires_company_and_position() {
        let input = JobApplicationInput {
            company: "Globex".to_string(),
            ..Default::default()
        };
        assert_eq!(
            sanitize_job_application(&input).unwrap_err(),
            SanitizeError::Required { field: "position" }
        );
    }

    #[test]
    fn test_job_application_title_injection_is_rejected() {
        let input = JobApplicationInput {
            company: "Globex".to_string(),
            position: "Engineer\" OR \"1\"=\"1".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            sanitize_job_application(&input).unwrap_err(),
            SanitizeError::SqlInjection { field: "position" }
        ));
    }
}
