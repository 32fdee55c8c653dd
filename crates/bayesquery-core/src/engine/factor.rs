//! Dense factors over binary variables.
//!
//! A factor maps every assignment of its scope to a non-negative weight.
//! Entry `i` stores the weight of the assignment in which `scope[k]` is
//! `True` exactly when bit `k` of `i` is set.

use smallvec::SmallVec;

use bayesquery_frontend::ast::Outcome;

use crate::engine::network::{Distribution, VarId};

pub type Scope = SmallVec<[VarId; 4]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    scope: Scope,
    values: Vec<f64>,
}

#[inline]
fn bit(outcome: Outcome) -> usize {
    outcome.is_true() as usize
}

/// Inserts `value` as bit `position` of `index`, shifting higher bits up.
#[inline]
fn insert_bit(index: usize, position: usize, value: usize) -> usize {
    let low = index & ((1 << position) - 1);
    let high = index >> position;
    (high << (position + 1)) | (value << position) | low
}

impl Factor {
    /// The empty-scope factor with weight one.
    pub fn unit() -> Self {
        Self {
            scope: Scope::new(),
            values: vec![1.0],
        }
    }

    /// The factor of `var`'s distribution, scoped over `var` followed by its parents.
    pub fn from_distribution(var: VarId, distribution: &Distribution) -> Self {
        let mut scope = Scope::new();
        scope.push(var);
        scope.extend(distribution.parents().iter().copied());

        let values = (0..1usize << scope.len())
            .map(|index| {
                let outcome = if index & 1 == 1 {
                    Outcome::True
                } else {
                    Outcome::False
                };
                // remaining bits line up with the table's parent assignment index
                distribution.probability(outcome, index >> 1)
            })
            .collect();
        Self { scope, values }
    }

    pub fn scope(&self) -> &[VarId] {
        &self.scope
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn mentions(&self, var: VarId) -> bool {
        self.scope.contains(&var)
    }

    fn position(&self, var: VarId) -> Option<usize> {
        self.scope.iter().position(|v| *v == var)
    }

    /// Weight of one full assignment, given in scope order.
    pub fn value(&self, assignment: &[Outcome]) -> f64 {
        debug_assert_eq!(assignment.len(), self.scope.len());
        let index = assignment
            .iter()
            .enumerate()
            .fold(0, |acc, (k, outcome)| acc | (bit(*outcome) << k));
        self.values[index]
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Fixes `var` to `outcome` and drops it from the scope.
    pub fn reduce(&self, var: VarId, outcome: Outcome) -> Self {
        let Some(position) = self.position(var) else {
            return self.clone();
        };
        let mut scope = self.scope.clone();
        scope.remove(position);
        let values = (0..1usize << scope.len())
            .map(|index| self.values[insert_bit(index, position, bit(outcome))])
            .collect();
        Self { scope, values }
    }

    /// Sets the weight of every assignment where `var != outcome` to zero, keeping the scope.
    pub fn restrict(&self, var: VarId, outcome: Outcome) -> Self {
        let Some(position) = self.position(var) else {
            return self.clone();
        };
        let keep = bit(outcome);
        let values = self
            .values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                if (index >> position) & 1 == keep {
                    *value
                } else {
                    0.0
                }
            })
            .collect();
        Self {
            scope: self.scope.clone(),
            values,
        }
    }

    /// Pointwise product; the result's scope is `self`'s followed by `other`'s new variables.
    pub fn product(&self, other: &Factor) -> Self {
        let mut scope = self.scope.clone();
        for var in &other.scope {
            if !scope.contains(var) {
                scope.push(*var);
            }
        }
        // position of each of `other`'s variables inside the combined scope
        let other_positions: SmallVec<[usize; 4]> = other
            .scope
            .iter()
            .map(|var| scope.iter().position(|v| v == var).unwrap_or_default())
            .collect();
        let self_mask = (1usize << self.scope.len()) - 1;

        let values = (0..1usize << scope.len())
            .map(|index| {
                let other_index = other_positions
                    .iter()
                    .enumerate()
                    .fold(0, |acc, (k, position)| acc | (((index >> position) & 1) << k));
                self.values[index & self_mask] * other.values[other_index]
            })
            .collect();
        Self { scope, values }
    }

    /// Marginalizes `var` out by summing over both of its outcomes.
    pub fn sum_out(&self, var: VarId) -> Self {
        let Some(position) = self.position(var) else {
            return self.clone();
        };
        let mut scope = self.scope.clone();
        scope.remove(position);
        let values = (0..1usize << scope.len())
            .map(|index| {
                self.values[insert_bit(index, position, 0)]
                    + self.values[insert_bit(index, position, 1)]
            })
            .collect();
        Self { scope, values }
    }
}

/// Multiplies a sequence of factors, left to right.
pub fn product_all<'a>(factors: impl IntoIterator<Item = &'a Factor>) -> Factor {
    factors
        .into_iter()
        .fold(Factor::unit(), |acc, factor| acc.product(factor))
}
