//! Error types for qstream-criteria.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by the target query model while clauses are being added or
/// a finished query is rendered.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum CriteriaError {
    #[error("Invalid identifier `{0}`")]
    #[diagnostic(
        code(qstream_criteria::invalid_identifier),
        help("Table, column and alias names must match [A-Za-z_][A-Za-z0-9_]*")
    )]
    InvalidIdentifier(String),

    #[error("Association `{assoc}` does not start at entity `{entity}`")]
    #[diagnostic(
        code(qstream_criteria::unknown_association),
        help("Join an association from the entity that declares it")
    )]
    UnknownAssociation { assoc: String, entity: String },

    #[error("Join parent `{0}` is not a root or join of this query")]
    #[diagnostic(
        code(qstream_criteria::unknown_alias),
        help("Joins must start from a root or join created by the same query")
    )]
    UnknownAlias(String),

    #[error("`{op}` is not supported by {kind} queries")]
    #[diagnostic(code(qstream_criteria::unsupported))]
    Unsupported { op: &'static str, kind: &'static str },

    #[error("Expected a {expected} selection, found {found}")]
    #[diagnostic(
        code(qstream_criteria::selection_mismatch),
        help("The selection produced by the previous step does not have the requested shape")
    )]
    SelectionMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Query `{0}` has no root")]
    #[diagnostic(code(qstream_criteria::missing_root))]
    MissingRoot(&'static str),

    #[error("Update has no assignments")]
    #[diagnostic(
        code(qstream_criteria::empty_update),
        help("Add at least one `set` before building an update")
    )]
    EmptyUpdate,

    #[error("Failed to serialize statement: {0}")]
    #[diagnostic(code(qstream_criteria::serialize))]
    Serialize(String),
}

impl From<serde_json::Error> for CriteriaError {
    fn from(err: serde_json::Error) -> Self {
        CriteriaError::Serialize(err.to_string())
    }
}

/// Result type alias for qstream-criteria operations.
pub type Result<T> = std::result::Result<T, CriteriaError>;
