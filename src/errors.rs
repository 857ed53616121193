//! Error types for the stockflow orchestration core.
//!
//! The taxonomy distinguishes failures by how the scheduling layer reacts to
//! them: configuration errors are fatal to the triggering attempt, transient
//! I/O errors are retried inside a run under the pipeline's retry policy, and
//! empty-input errors are terminal because a retry would deterministically
//! reproduce the same empty input.

use thiserror::Error;

/// The main error type for stockflow operations.
#[derive(Debug, Error)]
pub enum StockflowError {
    /// Malformed or missing configuration. Fatal to the triggering attempt,
    /// not to the process.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Object storage or the key-value store was unreachable. Retried only
    /// inside a run via the pipeline's retry policy, never at the trigger
    /// level.
    #[error("transient I/O failure in {operation}: {message}")]
    TransientIo {
        /// The operation that failed (e.g. "list_keys").
        operation: String,
        /// Description of the failure.
        message: String,
    },

    /// The aggregate stage was handed zero records. Never retried.
    #[error("aggregate received an empty record sequence")]
    EmptyInput,

    /// A raw storage record could not be parsed into a stock row.
    #[error("malformed stock record: {message}")]
    MalformedRecord {
        /// Description of the parse failure.
        message: String,
    },
}

impl StockflowError {
    /// Creates a transient I/O error.
    #[must_use]
    pub fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransientIo {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed-record error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }

    /// Returns true if a retry under the pipeline's retry policy could
    /// plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo { .. })
    }
}

/// Error raised when configuration is malformed or missing.
#[derive(Debug, Clone, Error)]
#[error("invalid configuration: {message}")]
pub struct ConfigError {
    /// The error message.
    pub message: String,
    /// The offending field, when known.
    pub field: Option<String>,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a configuration error attributed to a specific field.
    #[must_use]
    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}
