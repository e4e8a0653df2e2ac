//! Resume and cover-letter document output: template registry, LaTeX and
//! HTML generation, and PDF compilation.

pub mod cover_letter;
pub mod escape;
pub mod handlers;
pub mod html;
pub mod latex;
pub mod pdf;
pub mod templates;

pub use cover_letter::generate_latex_cover_letter;
pub use html::render_resume_html;
pub use latex::generate_latex_resume;
pub use templates::TemplateId;
