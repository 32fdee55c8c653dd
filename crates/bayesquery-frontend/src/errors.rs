//! Error types for record decoding and key parsing.

use thiserror::Error;

/// Errors that can occur while decoding an input record sequence.
///
/// Every variant describes malformed input; none is recoverable for the run.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FrontendError {
    /// The input is not a JSON array of flat objects.
    #[error("invalid JSON input: {0}")]
    Json(String),

    /// A record key does not match the compact key grammar.
    #[error("malformed key '{key}' in record {record}: {reason}")]
    MalformedKey {
        record: usize,
        key: String,
        reason: String,
    },

    /// A probability is not a finite number in [0, 1].
    #[error("probability for '{key}' in record {record} must be in [0, 1], got {value}")]
    ProbabilityOutOfRange {
        record: usize,
        key: String,
        value: f64,
    },

    /// A value has the wrong type for its key.
    #[error("value for '{key}' in record {record} must be a {expected}, got {found}")]
    UnexpectedValue {
        record: usize,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A `BELIEF` or `QUERY` value is not a literal such as `A` or `-A`.
    #[error("invalid literal '{literal}' for '{key}' in record {record}: {reason}")]
    InvalidLiteral {
        record: usize,
        key: String,
        literal: String,
        reason: String,
    },

    /// No `QUERY` record was supplied.
    #[error("no QUERY entry in input")]
    MissingQuery,

    /// More than one `QUERY` record was supplied; multi-query evaluation is unsupported.
    #[error("{0} QUERY entries in input; only a single query is supported")]
    MultipleQueries(usize),
}

impl From<serde_json::Error> for FrontendError {
    fn from(err: serde_json::Error) -> Self {
        FrontendError::Json(err.to_string())
    }
}
