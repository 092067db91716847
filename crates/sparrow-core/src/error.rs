//! Shared error type across sparrow crates.

use thiserror::Error;

/// Stable error codes (used in logs and by tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Config could not be parsed or failed validation.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Two collectors tried to register the same metric name.
    DuplicateMetric,
    /// I/O failure (config file, listener).
    Io,
}

impl ErrorCode {
    /// String representation used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::DuplicateMetric => "DUPLICATE_METRIC",
            ErrorCode::Io => "IO",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SparrowError>;

/// Unified error type used by core and agent.
#[derive(Debug, Error)]
pub enum SparrowError {
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("duplicate metric collector registration attempted: {0}")]
    DuplicateMetric(String),
    #[error("io: {0}")]
    Io(String),
}

impl SparrowError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            SparrowError::BadConfig(_) => ErrorCode::BadConfig,
            SparrowError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            SparrowError::DuplicateMetric(_) => ErrorCode::DuplicateMetric,
            SparrowError::Io(_) => ErrorCode::Io,
        }
    }
}
