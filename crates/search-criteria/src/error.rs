//! Error types for the search-criteria crate.

use thiserror::Error;

use crate::op::Operation;

/// Errors that can occur when parsing, constructing or evaluating criteria.
///
/// All variants describe bad input. None of them are transient, so callers
/// reject the request rather than retry.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed fragment, empty segment or unrecognized operator code.
    #[error("invalid search fragment {fragment:?}: {reason}")]
    Parse {
        fragment: String,
        reason: &'static str,
    },

    /// The value shape does not fit the operation (`In` needs a list,
    /// every other operation needs a scalar).
    #[error("operation '{op}' on field '{key}' {expected}")]
    InvalidValue {
        key: String,
        op: Operation,
        expected: &'static str,
    },

    /// Operator cannot be applied to the field's runtime value.
    #[error("operation '{op}' is not supported for {value_type} field '{key}'")]
    UnsupportedComparison {
        key: String,
        op: Operation,
        value_type: &'static str,
    },

    /// The accessor does not recognize the criterion key.
    #[error("unknown field '{key}'")]
    UnknownField { key: String },

    /// A `Like` pattern failed to compile.
    #[error("invalid like pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl SearchError {
    pub(crate) fn parse(fragment: &str, reason: &'static str) -> Self {
        SearchError::Parse {
            fragment: fragment.to_string(),
            reason,
        }
    }

    /// Returns `true` for errors raised while reading the wire format.
    pub fn is_parse(&self) -> bool {
        matches!(self, SearchError::Parse { .. })
    }
}

/// Result type for search-criteria operations.
pub type Result<T> = std::result::Result<T, SearchError>;
