//! Error types for network construction and inference.

use std::fmt;

use thiserror::Error;

impl From<bayesquery_frontend::FrontendError> for ExecError {
    fn from(err: bayesquery_frontend::FrontendError) -> Self {
        ExecError::MalformedSpec(err.to_string())
    }
}

/// The role a name was referenced in when it failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A parent token inside a conditional row.
    Parent,
    /// An endpoint of a discovered edge.
    EdgeEndpoint,
    /// The query literal.
    Query,
    /// A `BELIEF` literal.
    Evidence,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => write!(f, "parent"),
            Self::EdgeEndpoint => write!(f, "edge endpoint"),
            Self::Query => write!(f, "query"),
            Self::Evidence => write!(f, "evidence"),
        }
    }
}

/// Coarse error classification for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedSpec,
    UnresolvedReference,
    CyclicStructure,
    UndefinedPosterior,
    Numerical,
    Internal,
}

/// Errors that can occur while building a network or running a query.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecError {
    /// Bad key grammar, out-of-range probability, or an inconsistent table.
    #[error("malformed specification: {0}")]
    MalformedSpec(String),

    /// A name that was never declared as a prior or a conditional child.
    #[error("unknown {kind} variable '{name}'")]
    UnresolvedReference { kind: ReferenceKind, name: String },

    /// The edge set contains a cycle; detected at bake time.
    #[error("cyclic structure: {0}")]
    CyclicStructure(String),

    /// Conditioning on the evidence leaves zero probability mass.
    #[error("undefined posterior: {0}")]
    UndefinedPosterior(String),

    /// Numerical stability error (NaN/Inf, normalization drift).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Internal error (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExecError {
    pub fn unresolved(kind: ReferenceKind, name: impl Into<String>) -> Self {
        ExecError::UnresolvedReference {
            kind,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecError::MalformedSpec(_) => ErrorKind::MalformedSpec,
            ExecError::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            ExecError::CyclicStructure(_) => ErrorKind::CyclicStructure,
            ExecError::UndefinedPosterior(_) => ErrorKind::UndefinedPosterior,
            ExecError::Numerical(_) => ErrorKind::Numerical,
            ExecError::Internal(_) => ErrorKind::Internal,
        }
    }
}
