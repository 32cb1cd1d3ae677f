use beanbench_core::Error as CoreError;
use thiserror::Error;

/// Errors emitted by the generation engine.
///
/// Every variant is fatal for the run; nothing is retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CoreError> for GenerationError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::Configuration(message) => GenerationError::Configuration(message),
            CoreError::InvariantViolation(message) => GenerationError::InvariantViolation(message),
        }
    }
}
