//! Shared error type across tagmetrics crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type used by core and binding.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("metric already registered: {0}")]
    DuplicateMetric(String),
    #[error("sampling loop already started")]
    AlreadyStarted,
    #[error("sampling loop is not running")]
    NotRunning,
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    /// Stable short code, handy for log fields and test assertions.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG",
            Error::DuplicateMetric(_) => "DUPLICATE_METRIC",
            Error::AlreadyStarted => "ALREADY_STARTED",
            Error::NotRunning => "NOT_RUNNING",
            Error::Internal(_) => "INTERNAL",
        }
    }
}
