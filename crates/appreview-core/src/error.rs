//! Error types for appreview operations.
//!
//! Errors carry a structured [`ErrorCode`] so hosts can branch on the failure
//! kind without matching on message text.

use thiserror::Error;

/// Result type alias for appreview operations.
pub type ReviewResult<T> = Result<T, ReviewError>;

/// Main error type for all appreview operations.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// Configuration error (missing app version, bad config file).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Key-value store operation failed.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (CFG_xxx)
    CfgInvalid,

    // Storage (STORE_xxx)
    StoreOperationFailed,
    StoreTypeMismatch,

    // Parse (PARSE_xxx)
    ParseInvalidTimestamp,
    ParseInvalidValue,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::StoreOperationFailed => "STORE_001",
            ErrorCode::StoreTypeMismatch => "STORE_002",
            ErrorCode::ParseInvalidTimestamp => "PARSE_001",
            ErrorCode::ParseInvalidValue => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl ReviewError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an error for a key holding a value of the wrong kind.
    pub fn type_mismatch(key: &str, expected: &str, found: &str) -> Self {
        Self::Storage {
            message: format!("key '{}' holds {} but {} was expected", key, found, expected),
            code: ErrorCode::StoreTypeMismatch,
            source: None,
        }
    }

    /// Create a timestamp parse error.
    pub fn timestamp(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidTimestamp,
        }
    }

    /// Create a value parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidValue,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            Self::Storage { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Io(_) => ErrorCode::StoreOperationFailed,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Get a suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Configuration(_) => {
                Some("Check that the app version is provided and the config file is valid")
            }
            Self::Storage {
                code: ErrorCode::StoreTypeMismatch,
                ..
            } => Some("Another component may be writing to the same key; use a distinct namespace"),
            Self::Storage { .. } | Self::Io(_) => {
                Some("Check that the state database path is writable")
            }
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for ReviewError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
            code: ErrorCode::StoreOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}
