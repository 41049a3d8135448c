//! Error types for column declaration, value conversion and fragment compilation.
//!
//! Validation failures are not errors: a value that fails a column validator
//! produces a [`FieldIssue`](crate::validator::FieldIssue) which the persistence
//! pipeline collects per row. Everything in this enum is fatal for the single
//! operation that produced it.

use thiserror::Error;

/// Error type for column operations
#[derive(Debug, Error)]
pub enum FieldError {
    /// Malformed column declaration (empty name, missing parameter, broken template)
    #[error("Invalid column declaration: {0}")]
    Construction(String),
    /// Decode/cast received a value whose shape does not fit the column type
    #[error("Type mismatch for column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },
    /// Cast received a value of the right shape that cannot be read as the domain type
    #[error("Invalid input for column {column}: {message}")]
    InvalidInput { column: String, message: String },
    /// A caller-supplied restorer returned something other than the declared object type
    #[error("Restorer for column {column} must return {expected}, got {actual}")]
    RestoreContractViolation {
        column: String,
        expected: String,
        actual: String,
    },
    /// A caller-supplied persister returned a non-string storage value
    #[error("Persister for column {column} must return a string, got {actual}")]
    PersistContractViolation { column: String, actual: String },
    /// Two subqueries in one session produced the same table alias
    #[error("Table alias {alias} is already in use in this query")]
    AliasCollision { alias: String },
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl FieldError {
    pub(crate) fn construction(message: impl Into<String>) -> Self {
        FieldError::Construction(message.into())
    }

    pub(crate) fn type_mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        FieldError::TypeMismatch {
            column: column.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn invalid_input(column: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError::InvalidInput {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a [`FieldError::TypeMismatch`]
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, FieldError::TypeMismatch { .. })
    }

    /// Whether this error is a [`FieldError::InvalidInput`]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, FieldError::InvalidInput { .. })
    }
}

/// Result alias used throughout the crate
pub type FieldResult<T> = Result<T, FieldError>;
