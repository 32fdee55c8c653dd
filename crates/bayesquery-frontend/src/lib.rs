//! # bayesquery Frontend
//!
//! Record decoding and the compact CPT key grammar.

pub mod ast;
pub mod errors;
pub mod parser;

// Re-export commonly used types
pub use ast::*;
pub use errors::FrontendError;
pub use parser::{
    parse_literal, parse_record_key, parse_records, parse_records_with_options, parse_spec_json,
    parse_spec_json_with_options, EdgeDiscovery, ParseOptions,
};
