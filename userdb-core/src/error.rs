//! Error types for userdb-core
//!
//! Two layers:
//! - [`StoreError`]: what the pool adapter reports about a statement
//! - [`AccessError`]: what a user operation reports to its caller

use thiserror::Error;

/// Failure reported by a [`StatementExecutor`](crate::db::StatementExecutor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No connection could be obtained within the pool's wait policy,
    /// or the store could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// The store rejected the values of a write (constraint or data error).
    #[error("store rejected input: {message}")]
    Rejected { message: String },

    /// Any other store-side rejection of the statement.
    #[error("statement failed: {message}")]
    Statement { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
        }
    }

    /// The store's diagnostic text, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Unavailable { message }
            | Self::Rejected { message }
            | Self::Statement { message } => message,
        }
    }
}

/// Outcome taxonomy for user operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No row matches the given identifier.
    #[error("user '{id}' not found")]
    NotFound { id: String },

    /// The store refused the write because of missing, malformed or duplicate values.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Pool exhausted or store unreachable.
    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Any other store-level failure; carries the store's message verbatim.
    #[error("statement error: {message}")]
    StatementError { message: String },
}

impl AccessError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Caller errors leave the system healthy; the rest are system-side failures.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidInput { .. })
    }

    /// Classify a store failure for a write that carries caller content.
    pub(crate) fn from_write(err: StoreError) -> Self {
        match err {
            StoreError::Rejected { message } => Self::InvalidInput { message },
            other => Self::from(other),
        }
    }
}

/// Classification for operations with no content to violate.
///
/// A rejection on a read or delete is not the caller's fault, so it surfaces
/// as a statement error.
impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { message } => Self::StoreUnavailable { message },
            StoreError::Rejected { message } | StoreError::Statement { message } => {
                Self::StatementError { message }
            }
        }
    }
}

/// Result type alias for user operations
pub type Result<T> = std::result::Result<T, AccessError>;

/// Invalid pool configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
