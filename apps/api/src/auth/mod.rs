//! Accounts and sessions: password hashing, login lockout, Redis-backed
//! session cookies and the `AuthUser` extractor.

pub mod extractor;
pub mod handlers;
pub mod lockout;
pub mod password;
pub mod session;

pub use extractor::AuthUser;
