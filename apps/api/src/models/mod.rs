pub mod billing;
pub mod cover_letter;
pub mod job_application;
pub mod notification;
pub mod resume;
pub mod user;
