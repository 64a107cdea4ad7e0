//! Error types for the interview engine.

use thiserror::Error;

/// Typed failures surfaced by the interview engine.
///
/// Only configuration-time problems and caller mistakes reach the caller.
/// Generation failures are recovered inside the session with fallback text,
/// and malformed evaluation responses fall back to per-field defaults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterviewError {
    /// The candidate profile, domain config or session options are missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A domain configuration could not be located by its identifier.
    #[error("Domain config '{0}' not found")]
    DomainNotFound(String),

    /// The caller supplied an incomplete request (e.g. no answer text).
    #[error("Invalid request: {0}")]
    Precondition(String),

    /// The text-generation backend failed or produced nothing usable.
    #[error("Text generation failed: {0}")]
    Generation(String),
}

impl InterviewError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Shorthand for a required input that was not supplied at all.
    pub fn missing(what: &str) -> Self {
        Self::Configuration(format!("{what} is required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            InterviewError::missing("profile").to_string(),
            "Configuration error: profile is required"
        );
        assert_eq!(
            InterviewError::DomainNotFound("data_science.json".into()).to_string(),
            "Domain config 'data_science.json' not found"
        );
        assert_eq!(
            InterviewError::precondition("answer is required").to_string(),
            "Invalid request: answer is required"
        );
    }
}
