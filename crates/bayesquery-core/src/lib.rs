//! # bayesquery Core
//!
//! Network construction and exact inference for bayesquery.

pub mod engine;

use bayesquery_frontend::ParseOptions;

// Re-export commonly used types
pub use engine::elimination::{infer, infer_all, infer_with_config, InferenceConfig, Posterior};
pub use engine::errors::{ErrorKind, ExecError, ReferenceKind};
pub use engine::evidence::Evidence;
pub use engine::network::{build_network, build_network_from_parts, Network, NetworkBuilder};
pub use engine::report::{format_result, result_label, QueryResult};

/// Parses a JSON record document and answers its query with default options.
///
/// This is a convenience function that chains parsing, network building,
/// evidence resolution, inference and result formatting.
pub fn answer_query(source: &str) -> Result<QueryResult, ExecError> {
    answer_query_with(source, ParseOptions::default(), InferenceConfig::default())
}

/// Parses a JSON record document and answers its query with explicit options.
pub fn answer_query_with(
    source: &str,
    options: ParseOptions,
    config: InferenceConfig,
) -> Result<QueryResult, ExecError> {
    let spec = bayesquery_frontend::parse_spec_json_with_options(source, options)?;
    let query = spec.single_query()?;
    let network = build_network(&spec)?;
    let evidence = Evidence::resolve(&network, &spec.beliefs)?;
    #[cfg(feature = "tracing")]
    tracing::debug!(query = %query, evidence = %evidence, "answering query");
    let posterior = infer_with_config(&network, &evidence, query, config)?;
    Ok(format_result(query, spec.beliefs.values(), posterior))
}
