//! # Parsed Specification
//!
//! Data structures produced by the record parser.
//!
//! ## Structure
//!
//! A parsed specification consists of:
//! - **Priors**: root variables with P(true)
//! - **Tables**: per-child groups of conditional rows (both outcomes present)
//! - **Beliefs**: observed evidence literals keyed by canonical variable name
//! - **Query**: query literals in declaration order
//! - **Edges**: parent -> child pairs discovered from conditional keys
//!
//! Ordered maps (`IndexMap`) keep declaration order while letting a later
//! declaration overwrite an earlier one in place.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Marker prefixed to a variable name to denote its `false` outcome.
pub const NEGATION_MARKER: char = '-';

/// Reserved record key carrying an evidence literal.
pub const BELIEF_KEY: &str = "BELIEF";

/// Reserved record key carrying the query literal.
pub const QUERY_KEY: &str = "QUERY";

/// One of the two outcomes of a binary variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    True,
    False,
}

impl Outcome {
    /// Both outcomes, `True` first.
    pub const ALL: [Outcome; 2] = [Outcome::True, Outcome::False];

    pub fn from_negated(negated: bool) -> Self {
        if negated {
            Outcome::False
        } else {
            Outcome::True
        }
    }

    pub fn is_true(self) -> bool {
        matches!(self, Outcome::True)
    }

    pub fn flip(self) -> Self {
        match self {
            Outcome::True => Outcome::False,
            Outcome::False => Outcome::True,
        }
    }
}

/// A variable name paired with an outcome, written `X` or `-X`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Canonical variable name (no negation marker)
    pub name: String,
    pub outcome: Outcome,
}

impl Literal {
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }

    pub fn positive(name: impl Into<String>) -> Self {
        Self::new(name, Outcome::True)
    }

    pub fn negative(name: impl Into<String>) -> Self {
        Self::new(name, Outcome::False)
    }

    pub fn is_negated(&self) -> bool {
        self.outcome == Outcome::False
    }

    /// The same variable with the opposite outcome.
    pub fn complement(&self) -> Self {
        Self::new(self.name.clone(), self.outcome.flip())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negated() {
            write!(f, "{}{}", NEGATION_MARKER, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A directed parent -> child dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub parent: String,
    pub child: String,
}

impl Edge {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

/// One row of a conditional probability table.
///
/// `parents` keeps the token order of the key the row came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CptRow {
    pub parents: Vec<Literal>,
    pub child: Literal,
    pub probability: f64,
}

/// The decoded form of a record key other than `BELIEF` / `QUERY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    /// `"X"`: prior P(X = true)
    Prior { name: String },
    /// `"X|P1..Pn"`: one conditional row of X
    Conditional { child: String, parents: Vec<Literal> },
}

/// A raw record value as it appears in the JSON input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RecordValue {
    /// Short description of the value's type for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            RecordValue::Number(_) => "number",
            RecordValue::Text(_) => "string",
            RecordValue::Other(serde_json::Value::Null) => "null",
            RecordValue::Other(serde_json::Value::Bool(_)) => "boolean",
            RecordValue::Other(serde_json::Value::Array(_)) => "array",
            RecordValue::Other(serde_json::Value::Object(_)) => "object",
            RecordValue::Other(_) => "value",
        }
    }
}

/// A flat key/value record, keys in input order.
pub type Record = IndexMap<String, RecordValue>;

/// Everything decoded from an input record sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSpec {
    /// Root variables: name -> P(true)
    pub priors: IndexMap<String, f64>,
    /// Conditional rows grouped per child; a later group for the same child replaces the earlier one
    pub tables: IndexMap<String, Vec<CptRow>>,
    /// Evidence: canonical name -> observed literal
    pub beliefs: IndexMap<String, Literal>,
    /// Query literals in declaration order
    pub query: Vec<Literal>,
    /// Structure discovered from conditional keys, in discovery order
    pub edges: Vec<Edge>,
}

impl ParsedSpec {
    /// The single query literal.
    ///
    /// Exactly one `QUERY` entry is supported; zero or several are rejected
    /// instead of silently picking one.
    pub fn single_query(&self) -> Result<&Literal, crate::errors::FrontendError> {
        match self.query.as_slice() {
            [query] => Ok(query),
            [] => Err(crate::errors::FrontendError::MissingQuery),
            many => Err(crate::errors::FrontendError::MultipleQueries(many.len())),
        }
    }

    /// Child -> parent names, see [`child_parents`].
    pub fn child_parents(&self) -> IndexMap<String, Vec<String>> {
        child_parents(&self.edges)
    }
}

/// Groups edges by child: parent names in first-seen order, duplicates dropped.
pub fn child_parents(edges: &[Edge]) -> IndexMap<String, Vec<String>> {
    let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
    for edge in edges {
        let parents = grouped.entry(edge.child.clone()).or_default();
        if !parents.contains(&edge.parent) {
            parents.push(edge.parent.clone());
        }
    }
    grouped
}
