//! Core error types for horde-rs.
//!
//! [`HordeError`] covers the whole failure taxonomy of the ORM layer: schema
//! declaration problems, builder misuse, value coercion, configuration, and
//! failures reported by the SQL execution collaborator. Collaborator failures
//! are carried through unchanged; nothing in horde-rs retries them.

use thiserror::Error;

/// The primary error type for horde-rs.
///
/// # Examples
///
/// ```
/// use horde_rs_core::error::HordeError;
///
/// let err = HordeError::UnknownRelationship {
///     record: "Customer".into(),
///     name: "Loans".into(),
/// };
/// assert_eq!(
///     err.to_string(),
///     "Unknown relationship 'Loans' on record 'Customer'"
/// );
/// ```
#[derive(Error, Debug)]
pub enum HordeError {
    // ── Schema ───────────────────────────────────────────────────────

    /// A record field is declared with a value type that cannot be mapped to
    /// a string, integer, or float column.
    #[error("Unsupported field type '{declared}' for field '{field}' on record '{record}'")]
    UnsupportedFieldType {
        /// The record type name.
        record: String,
        /// The offending field name.
        field: String,
        /// The declared value type.
        declared: String,
    },

    /// A join chain names a relationship the current record does not declare.
    #[error("Unknown relationship '{name}' on record '{record}'")]
    UnknownRelationship {
        /// The record type the lookup was made against.
        record: String,
        /// The relationship name that could not be resolved.
        name: String,
    },

    // ── Builder misuse ───────────────────────────────────────────────

    /// The builder was used in an order or combination that has no meaning.
    #[error("Invalid query state: {0}")]
    InvalidQueryState(String),

    // ── Execution ────────────────────────────────────────────────────

    /// The SQL execution collaborator reported a failure.
    #[error("Execution failure: {0}")]
    ExecutionFailure(String),

    /// A column value could not be converted to its declared kind.
    #[error("Cannot coerce value '{value}' of column '{column}' to {kind}")]
    CoercionFailure {
        /// The result-set alias of the column.
        column: String,
        /// The raw text that failed to parse.
        value: String,
        /// The kind the value was expected to have.
        kind: String,
    },

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl HordeError {
    /// Returns `true` for errors caused by the caller rather than by data or
    /// the database.
    pub const fn is_builder_misuse(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFieldType { .. }
                | Self::UnknownRelationship { .. }
                | Self::InvalidQueryState(_)
        )
    }
}

// io::Error is not Clone; the copy keeps its kind and message.
impl Clone for HordeError {
    fn clone(&self) -> Self {
        match self {
            Self::UnsupportedFieldType {
                record,
                field,
                declared,
            } => Self::UnsupportedFieldType {
                record: record.clone(),
                field: field.clone(),
                declared: declared.clone(),
            },
            Self::UnknownRelationship { record, name } => Self::UnknownRelationship {
                record: record.clone(),
                name: name.clone(),
            },
            Self::InvalidQueryState(msg) => Self::InvalidQueryState(msg.clone()),
            Self::ExecutionFailure(msg) => Self::ExecutionFailure(msg.clone()),
            Self::CoercionFailure {
                column,
                value,
                kind,
            } => Self::CoercionFailure {
                column: column.clone(),
                value: value.clone(),
                kind: kind.clone(),
            },
            Self::ConfigurationError(msg) => Self::ConfigurationError(msg.clone()),
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

/// A convenience type alias for `Result<T, HordeError>`.
pub type HordeResult<T> = Result<T, HordeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_field_type_display() {
        let err = HordeError::UnsupportedFieldType {
            record: "Customer".into(),
            field: "Active".into(),
            declared: "bool".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported field type 'bool' for field 'Active' on record 'Customer'"
        );
    }

    #[test]
    fn test_invalid_query_state_display() {
        let err = HordeError::InvalidQueryState("and_filter before filter".into());
        assert_eq!(err.to_string(), "Invalid query state: and_filter before filter");
    }

    #[test]
    fn test_coercion_failure_display() {
        let err = HordeError::CoercionFailure {
            column: "SavingsAccountBalance".into(),
            value: "abc".into(),
            kind: "float".into(),
        };
        assert!(err.to_string().contains("SavingsAccountBalance"));
        assert!(err.to_string().contains("float"));
    }

    #[test]
    fn test_builder_misuse_classification() {
        assert!(HordeError::InvalidQueryState("x".into()).is_builder_misuse());
        assert!(HordeError::UnknownRelationship {
            record: "A".into(),
            name: "B".into()
        }
        .is_builder_misuse());
        assert!(!HordeError::ExecutionFailure("x".into()).is_builder_misuse());
        assert!(!HordeError::ConfigurationError("x".into()).is_builder_misuse());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: HordeError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_clone_keeps_variant_and_message() {
        let err = HordeError::UnknownRelationship {
            record: "Customer".into(),
            name: "Loans".into(),
        };
        let copy = err.clone();
        assert!(matches!(copy, HordeError::UnknownRelationship { .. }));
        assert_eq!(copy.to_string(), err.to_string());

        let io = HordeError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "locked",
        ));
        match io.clone() {
            HordeError::IoError(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied);
                assert!(e.to_string().contains("locked"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
