//! # Record Parser
//!
//! This module decodes an ordered sequence of flat records into a [`ParsedSpec`]
//! using the Pest parser generator for the compact key grammar.
//!
//! ## Overview
//!
//! Each record key is one of:
//!
//! - `BELIEF`: the value is an evidence literal (`"A"` or `"-A"`)
//! - `QUERY`: the value is the query literal
//! - `"X"`: a prior, the value is P(X = true)
//! - `"X|P1P2..."`: one conditional row of X, the value is P(X = true | parents)
//!
//! Only the `true` side of a conditional row is written in the input; the
//! parser synthesizes the complementary `false` row with probability `1 - p`.
//!
//! ## Structure discovery
//!
//! Edges are only discovered from conditional keys. With the default
//! [`EdgeDiscovery::AffirmedRowsOnly`], a key whose parent tokens contain a
//! negation marker records no edges, so a child described exclusively by
//! negated-parent rows ends up without a parent entry and its table is later
//! dropped by the network builder. [`EdgeDiscovery::EveryRow`] records edges
//! for every conditional key.
//!
//! ## Grammar
//!
//! The grammar is defined in `grammar.pest` using Pest's PEG syntax.

use indexmap::IndexMap;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::*;
use crate::errors::FrontendError;

#[derive(Parser)]
#[grammar = "../grammar.pest"]
pub struct RecordKeyParser;

/// How conditional keys contribute to the edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeDiscovery {
    /// Record edges only for keys whose parent tokens are all un-negated.
    #[default]
    AffirmedRowsOnly,
    /// Record edges for every conditional key regardless of polarity.
    EveryRow,
}

/// Options controlling record decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub edge_discovery: EdgeDiscovery,
}

impl ParseOptions {
    pub fn with_edge_discovery(mut self, edge_discovery: EdgeDiscovery) -> Self {
        self.edge_discovery = edge_discovery;
        self
    }
}

/// Parses a JSON array of records with default options.
///
/// # Example
///
/// ```rust,ignore
/// use bayesquery_frontend::parse_spec_json;
///
/// let spec = parse_spec_json(r#"[{"A": 0.6}, {"B|A": 0.9, "B|-A": 0.2}, {"QUERY": "B"}]"#)?;
/// assert_eq!(spec.tables["B"].len(), 4);
/// ```
pub fn parse_spec_json(source: &str) -> Result<ParsedSpec, FrontendError> {
    parse_spec_json_with_options(source, ParseOptions::default())
}

/// Parses a JSON array of records with explicit options.
pub fn parse_spec_json_with_options(
    source: &str,
    options: ParseOptions,
) -> Result<ParsedSpec, FrontendError> {
    let records: Vec<Record> = serde_json::from_str(source)?;
    parse_records_with_options(&records, options)
}

/// Decodes records with default options.
pub fn parse_records(records: &[Record]) -> Result<ParsedSpec, FrontendError> {
    parse_records_with_options(records, ParseOptions::default())
}

/// Decodes records into priors, table groups, beliefs, query literals and edges.
///
/// Duplicate declarations are last-write-wins and keep their first position:
/// priors by name, beliefs by canonical name, table groups by child.
pub fn parse_records_with_options(
    records: &[Record],
    options: ParseOptions,
) -> Result<ParsedSpec, FrontendError> {
    let mut spec = ParsedSpec::default();

    for (index, record) in records.iter().enumerate() {
        // 1-based position used in diagnostics
        let position = index + 1;
        let mut affirmed: IndexMap<String, Vec<CptRow>> = IndexMap::new();
        let mut complements: IndexMap<String, Vec<CptRow>> = IndexMap::new();

        for (key, value) in record {
            match key.as_str() {
                BELIEF_KEY => {
                    let literal = literal_value(position, key, value)?;
                    #[cfg(feature = "tracing")]
                    tracing::trace!(record = position, %literal, "belief");
                    spec.beliefs.insert(literal.name.clone(), literal);
                }
                QUERY_KEY => {
                    let literal = literal_value(position, key, value)?;
                    #[cfg(feature = "tracing")]
                    tracing::trace!(record = position, %literal, "query");
                    spec.query.push(literal);
                }
                _ => {
                    let decoded =
                        parse_record_key(key).map_err(|reason| FrontendError::MalformedKey {
                            record: position,
                            key: key.clone(),
                            reason,
                        })?;
                    let probability = probability_value(position, key, value)?;
                    match decoded {
                        RecordKey::Prior { name } => {
                            #[cfg(feature = "tracing")]
                            tracing::trace!(record = position, %name, probability, "prior");
                            spec.priors.insert(name, probability);
                        }
                        RecordKey::Conditional { child, parents } => {
                            if options.edge_discovery == EdgeDiscovery::EveryRow
                                || parents.iter().all(|p| !p.is_negated())
                            {
                                spec.edges.extend(
                                    parents.iter().map(|p| Edge::new(p.name.clone(), child.clone())),
                                );
                            }
                            let row = CptRow {
                                parents,
                                child: Literal::positive(child.clone()),
                                probability,
                            };
                            let complement = CptRow {
                                parents: row.parents.clone(),
                                child: row.child.complement(),
                                probability: 1.0 - probability,
                            };
                            affirmed.entry(child.clone()).or_default().push(row);
                            complements.entry(child).or_default().push(complement);
                        }
                    }
                }
            }
        }

        for (child, mut rows) in affirmed {
            rows.extend(complements.shift_remove(&child).unwrap_or_default());
            if spec.tables.contains_key(&child) {
                #[cfg(feature = "tracing")]
                tracing::debug!(record = position, %child, "table redeclared, replacing earlier group");
            }
            spec.tables.insert(child, rows);
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        priors = spec.priors.len(),
        tables = spec.tables.len(),
        beliefs = spec.beliefs.len(),
        queries = spec.query.len(),
        edges = spec.edges.len(),
        "parsed records"
    );
    Ok(spec)
}

/// Decodes a prior or conditional key.
///
/// Returns a human-readable reason on failure.
pub fn parse_record_key(key: &str) -> Result<RecordKey, String> {
    let mut pairs = RecordKeyParser::parse(Rule::record_key, key)
        .map_err(|e| e.variant.message().into_owned())?;
    let pair = pairs
        .next()
        .ok_or_else(|| "empty key".to_string())?;

    match pair.as_rule() {
        Rule::prior_key => {
            let name = pair
                .into_inner()
                .find(|p| p.as_rule() == Rule::variable)
                .map(|p| p.as_str().to_string())
                .ok_or_else(|| "prior key without a variable name".to_string())?;
            Ok(RecordKey::Prior { name })
        }
        Rule::conditional_key => {
            let mut child = None;
            let mut parents = Vec::new();
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::variable => child = Some(inner.as_str().to_string()),
                    Rule::literal => parents.push(build_literal(inner)),
                    _ => {}
                }
            }
            let child =
                child.ok_or_else(|| "conditional key without a child variable".to_string())?;
            if parents.is_empty() {
                return Err("conditional key has no parent tokens".into());
            }
            Ok(RecordKey::Conditional { child, parents })
        }
        other => Err(format!("unexpected key structure: {:?}", other)),
    }
}

/// Decodes a literal such as `A` or `-A`.
pub fn parse_literal(text: &str) -> Result<Literal, String> {
    let mut pairs = RecordKeyParser::parse(Rule::literal_value, text)
        .map_err(|e| e.variant.message().into_owned())?;
    pairs
        .next()
        .and_then(|value| value.into_inner().find(|p| p.as_rule() == Rule::value_literal))
        .map(build_literal)
        .ok_or_else(|| "missing literal".to_string())
}

fn build_literal(pair: pest::iterators::Pair<Rule>) -> Literal {
    let mut negated = false;
    let mut name = String::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::negation => negated = true,
            Rule::name | Rule::variable => name = inner.as_str().to_string(),
            _ => {}
        }
    }
    Literal::new(name, Outcome::from_negated(negated))
}

fn literal_value(position: usize, key: &str, value: &RecordValue) -> Result<Literal, FrontendError> {
    match value {
        RecordValue::Text(text) => {
            parse_literal(text).map_err(|reason| FrontendError::InvalidLiteral {
                record: position,
                key: key.to_string(),
                literal: text.clone(),
                reason,
            })
        }
        other => Err(FrontendError::UnexpectedValue {
            record: position,
            key: key.to_string(),
            expected: "string literal",
            found: other.type_name(),
        }),
    }
}

fn probability_value(position: usize, key: &str, value: &RecordValue) -> Result<f64, FrontendError> {
    match value {
        RecordValue::Number(p) if p.is_finite() && (0.0..=1.0).contains(p) => Ok(*p),
        RecordValue::Number(p) => Err(FrontendError::ProbabilityOutOfRange {
            record: position,
            key: key.to_string(),
            value: *p,
        }),
        other => Err(FrontendError::UnexpectedValue {
            record: position,
            key: key.to_string(),
            expected: "number",
            found: other.type_name(),
        }),
    }
}
