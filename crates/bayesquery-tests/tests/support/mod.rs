//! Shared helpers: brute-force joint enumeration used as an inference oracle.

#![allow(dead_code)]

use bayesquery_core::engine::network::{Network, VarId};
use bayesquery_frontend::ast::Outcome;

pub fn assert_close(actual: f64, expected: f64, tol: f64, label: &str) {
    assert!(
        (actual - expected).abs() <= tol,
        "{} mismatch: expected {:.15}, got {:.15}, diff={:.3e}",
        label,
        expected,
        actual,
        (actual - expected).abs()
    );
}

fn outcome_of(assignment: usize, id: VarId) -> Outcome {
    if assignment & (1 << id.index()) != 0 {
        Outcome::True
    } else {
        Outcome::False
    }
}

/// Joint probability of one full assignment (bit `i` set = variable `i` true).
pub fn joint(network: &Network, assignment: usize) -> f64 {
    network
        .variables()
        .iter()
        .map(|variable| {
            let parent_index = network
                .parents(variable.id)
                .iter()
                .enumerate()
                .fold(0usize, |acc, (k, parent)| {
                    acc | ((outcome_of(assignment, *parent).is_true() as usize) << k)
                });
            network
                .distribution(variable.id)
                .probability(outcome_of(assignment, variable.id), parent_index)
        })
        .product()
}

/// P(query = true | evidence) by summing the full joint; `None` when the evidence has zero mass.
pub fn enumerate_posterior(
    network: &Network,
    evidence: &[(VarId, Outcome)],
    query: VarId,
) -> Option<f64> {
    let mut weight_true = 0.0;
    let mut total = 0.0;
    for assignment in 0..1usize << network.len() {
        if evidence
            .iter()
            .any(|(id, outcome)| outcome_of(assignment, *id) != *outcome)
        {
            continue;
        }
        let p = joint(network, assignment);
        total += p;
        if outcome_of(assignment, query).is_true() {
            weight_true += p;
        }
    }
    (total > 0.0).then(|| weight_true / total)
}
