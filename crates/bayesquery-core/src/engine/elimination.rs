//! Exact inference by variable elimination.
//!
//! The joint distribution is the product of one factor per variable. Evidence
//! reduces those factors, then every variable other than the query and the
//! observed ones is summed out in reverse topological order. The remaining
//! two-entry table is normalized into the posterior of the query.
//!
//! With [`InferenceConfig::prune_barren`] enabled, variables that are neither
//! the query, evidence, nor an ancestor of either are skipped entirely: their
//! factors marginalize to one and cannot change the posterior.

use bayesquery_frontend::ast::{Literal, Outcome};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::engine::errors::{ExecError, ReferenceKind};
use crate::engine::evidence::Evidence;
use crate::engine::factor::{product_all, Factor};
use crate::engine::network::{Network, VarId};

/// Default tolerance for a posterior summing to one.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Configuration for variable elimination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceConfig {
    /// Maximum allowed drift of a normalized posterior from one.
    pub tolerance: f64,
    /// Skip variables that cannot influence the query.
    pub prune_barren: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            prune_barren: true,
        }
    }
}

impl InferenceConfig {
    fn validate(self) -> Result<Self, ExecError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ExecError::MalformedSpec(
                "infer: tolerance must be finite and > 0".into(),
            ));
        }
        Ok(self)
    }
}

/// Posterior marginal of one binary variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    pub outcome_true: f64,
    pub outcome_false: f64,
}

impl Posterior {
    pub fn probability(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::True => self.outcome_true,
            Outcome::False => self.outcome_false,
        }
    }

    /// Probability of the outcome a literal names.
    pub fn of(&self, literal: &Literal) -> f64 {
        self.probability(literal.outcome)
    }

    fn point_mass(outcome: Outcome) -> Self {
        match outcome {
            Outcome::True => Self {
                outcome_true: 1.0,
                outcome_false: 0.0,
            },
            Outcome::False => Self {
                outcome_true: 0.0,
                outcome_false: 1.0,
            },
        }
    }
}

/// Runs variable elimination with default configuration.
pub fn infer(
    network: &Network,
    evidence: &Evidence,
    query: &Literal,
) -> Result<Posterior, ExecError> {
    infer_with_config(network, evidence, query, InferenceConfig::default())
}

/// Runs variable elimination with explicit configuration.
///
/// Only the query's name is used; its outcome selects the entry the caller
/// reports, see [`Posterior::of`].
pub fn infer_with_config(
    network: &Network,
    evidence: &Evidence,
    query: &Literal,
    config: InferenceConfig,
) -> Result<Posterior, ExecError> {
    let config = config.validate()?;
    let target = network.resolve(&query.name, ReferenceKind::Query)?;
    posterior_of(network, evidence, target, config)
}

/// Posterior of every variable, in declaration order.
///
/// Observed variables report a point mass on their observed outcome once the
/// evidence is known to have non-zero probability.
pub fn infer_all(
    network: &Network,
    evidence: &Evidence,
    config: InferenceConfig,
) -> Result<IndexMap<String, Posterior>, ExecError> {
    let config = config.validate()?;
    network
        .variables()
        .iter()
        .map(|variable| {
            posterior_of(network, evidence, variable.id, config)
                .map(|posterior| (variable.name.clone(), posterior))
        })
        .collect()
}

fn posterior_of(
    network: &Network,
    evidence: &Evidence,
    target: VarId,
    config: InferenceConfig,
) -> Result<Posterior, ExecError> {
    let relevant = if config.prune_barren {
        network.ancestors_inclusive(
            std::iter::once(target).chain(evidence.observations().map(|(id, _)| id)),
        )
    } else {
        network.variables().iter().map(|v| v.id).collect()
    };

    // One factor per relevant variable, reduced by evidence. The target keeps
    // its scope even when observed so that zero-mass evidence stays detectable.
    let mut factors: Vec<Factor> = Vec::with_capacity(relevant.len());
    for &id in network.topological_order() {
        if !relevant.contains(&id) {
            continue;
        }
        let mut factor = Factor::from_distribution(id, network.distribution(id));
        for (observed, outcome) in evidence.observations() {
            factor = if observed == target {
                factor.restrict(observed, outcome)
            } else {
                factor.reduce(observed, outcome)
            };
        }
        factors.push(factor);
    }
    #[cfg(feature = "tracing")]
    tracing::trace!(
        target = %network.variable(target).name,
        factors = factors.len(),
        pruned = network.len() - relevant.len(),
        "initial factors"
    );

    for &id in network.topological_order().iter().rev() {
        if id == target || evidence.observation(id).is_some() || !relevant.contains(&id) {
            continue;
        }
        let (mentioning, rest): (Vec<Factor>, Vec<Factor>) =
            factors.into_iter().partition(|f| f.mentions(id));
        factors = rest;
        if mentioning.is_empty() {
            continue;
        }
        let summed = product_all(&mentioning).sum_out(id);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            eliminated = %network.variable(id).name,
            combined = mentioning.len(),
            scope = summed.scope().len(),
            "eliminated variable"
        );
        factors.push(summed);
    }

    let joint = product_all(&factors);
    if joint.scope() != [target] {
        return Err(ExecError::Internal(format!(
            "elimination left scope {:?}, expected only '{}'",
            joint.scope(),
            network.variable(target).name
        )));
    }
    let weight_true = joint.value(&[Outcome::True]);
    let weight_false = joint.value(&[Outcome::False]);
    let total = weight_true + weight_false;

    if !total.is_finite() {
        return Err(ExecError::Numerical(format!(
            "unnormalized posterior of '{}' is not finite ({})",
            network.variable(target).name,
            total
        )));
    }
    if total <= 0.0 {
        return Err(ExecError::UndefinedPosterior(format!(
            "evidence {} has zero probability, so the posterior of '{}' is 0/0",
            evidence,
            network.variable(target).name
        )));
    }

    let posterior = match evidence.observation(target) {
        Some(outcome) => Posterior::point_mass(outcome),
        None => Posterior {
            outcome_true: weight_true / total,
            outcome_false: weight_false / total,
        },
    };
    let drift = (posterior.outcome_true + posterior.outcome_false - 1.0).abs();
    if drift > config.tolerance {
        return Err(ExecError::Numerical(format!(
            "posterior of '{}' sums to {} (tolerance {})",
            network.variable(target).name,
            posterior.outcome_true + posterior.outcome_false,
            config.tolerance
        )));
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target = %network.variable(target).name,
        p_true = posterior.outcome_true,
        evidence = %evidence,
        "posterior"
    );
    Ok(posterior)
}
