//! Query result formatting.
//!
//! The result label is the query literal as written, a `|` separator, and the
//! evidence literals concatenated in declaration order, e.g. `B|-A`. The CLI
//! uses it as the output file stem.

use bayesquery_frontend::ast::Literal;
use serde::Serialize;

use crate::engine::elimination::Posterior;

/// Separator between the query literal and the evidence literals in a label.
pub const LABEL_SEPARATOR: char = '|';

/// The answer to a single query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub label: String,
    pub query: Literal,
    /// Probability of the outcome the query literal names
    pub probability: f64,
    pub posterior: Posterior,
}

pub fn result_label<'a>(query: &Literal, evidence: impl IntoIterator<Item = &'a Literal>) -> String {
    let mut label = format!("{}{}", query, LABEL_SEPARATOR);
    for literal in evidence {
        label.push_str(&literal.to_string());
    }
    label
}

pub fn format_result<'a>(
    query: &Literal,
    evidence: impl IntoIterator<Item = &'a Literal>,
    posterior: Posterior,
) -> QueryResult {
    QueryResult {
        label: result_label(query, evidence),
        query: query.clone(),
        probability: posterior.of(query),
        posterior,
    }
}
