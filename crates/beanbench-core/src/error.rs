use thiserror::Error;

/// Core error type shared across beanbench crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid or missing configuration (ranges, counts, catalog entries).
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Internal bookkeeping was broken; always a programming defect.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Error::InvariantViolation(message.into())
    }
}

/// Convenience alias for results returned by beanbench crates.
pub type Result<T> = std::result::Result<T, Error>;
