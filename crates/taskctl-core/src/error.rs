use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskctlError {
    #[error("No task definition revisions found for family: {family}")]
    NotFound { family: String },

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TaskctlError {
    /// Shorthand for rejecting an empty required argument.
    pub(crate) fn require_non_empty(value: &str, what: &str) -> Result<(), TaskctlError> {
        if value.trim().is_empty() {
            Err(TaskctlError::InvalidInput(format!("{} must not be empty", what)))
        } else {
            Ok(())
        }
    }
}
