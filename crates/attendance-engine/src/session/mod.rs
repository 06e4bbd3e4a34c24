//! Class sessions: declaration, validation and deactivation.

pub mod engine;
pub mod types;

pub use types::{Session, SessionDeclaration, SessionId, SessionLocation};

pub use engine::{deactivation_checks, declare, validate_declaration};
