//! The execution engine for bayesquery networks.
//!
//! This module provides:
//! - **errors**: Error types for construction and inference failures
//! - **network**: Variables, distributions and the baked network
//! - **evidence**: Observations resolved against a network
//! - **factor**: Dense factors over binary variables
//! - **elimination**: Exact inference by variable elimination
//! - **report**: Result label and value for a single query

pub mod elimination;
pub mod errors;
pub mod evidence;
pub mod factor;
pub mod network;
pub mod report;
