//! Data models for DrDrive entities.
//!
//! - `User`: the profile record tied to a session
//! - `Registration`, `ProfileForm`: front-end input that becomes a request body
//! - Diagnosis types: `DiagnosisRequest`, `ImageAttachment`, `Diagnosis`

pub mod diagnosis;
pub mod user;

pub use diagnosis::{Diagnosis, DiagnosisRequest, ImageAttachment};
pub use user::{ProfileForm, ProfileUpdate, RegisterRequest, Registration, User};
