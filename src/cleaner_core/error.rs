//! Error taxonomy for the cleaning stages

use super::schema::Violation;

#[derive(Debug)]
pub enum CleanerError {
    /// Structural problem with the table itself (bad column, bad interval).
    /// Fatal for the file; the orchestrator logs it and moves on.
    Schema(String),
    /// Row values outside their domain. Carries per-row details.
    Validation(Vec<Violation>),
    /// A stage was invoked before its upstream requirement ran.
    /// Indicates a caller bug; never defaulted around.
    Precondition(String),
}

impl std::fmt::Display for CleanerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanerError::Schema(msg) => write!(f, "Schema error: {}", msg),
            CleanerError::Validation(violations) => {
                write!(f, "Validation failed with {} violation(s)", violations.len())?;
                if let Some(first) = violations.first() {
                    write!(f, " (first: {})", first)?;
                }
                Ok(())
            }
            CleanerError::Precondition(msg) => write!(f, "Precondition error: {}", msg),
        }
    }
}

impl std::error::Error for CleanerError {}
