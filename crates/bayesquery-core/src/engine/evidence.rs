//! Evidence resolution.
//!
//! Converts `BELIEF` literals into observations on network variables.

use bayesquery_frontend::ast::{Literal, Outcome};
use indexmap::IndexMap;

use crate::engine::errors::{ExecError, ReferenceKind};
use crate::engine::network::{Network, VarId};

/// Hard evidence resolved against a network, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evidence {
    observations: IndexMap<VarId, Outcome>,
    literals: Vec<Literal>,
}

impl Evidence {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolves beliefs keyed by canonical name.
    ///
    /// Fails with `UnresolvedReference` when a belief names an undeclared variable.
    pub fn resolve(
        network: &Network,
        beliefs: &IndexMap<String, Literal>,
    ) -> Result<Self, ExecError> {
        Self::from_literals(network, beliefs.values())
    }

    /// Resolves a sequence of literals; a later literal for the same variable wins.
    pub fn from_literals<'a>(
        network: &Network,
        literals: impl IntoIterator<Item = &'a Literal>,
    ) -> Result<Self, ExecError> {
        let mut evidence = Self::default();
        for literal in literals {
            let id = network.resolve(&literal.name, ReferenceKind::Evidence)?;
            if let Some(previous) = evidence.observations.insert(id, literal.outcome) {
                let slot = evidence
                    .literals
                    .iter_mut()
                    .find(|l| l.name == literal.name)
                    .ok_or_else(|| {
                        ExecError::Internal(format!(
                            "evidence for '{}' observed as {:?} but not recorded",
                            literal.name, previous
                        ))
                    })?;
                *slot = literal.clone();
            } else {
                evidence.literals.push(literal.clone());
            }
        }
        Ok(evidence)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observation(&self, id: VarId) -> Option<Outcome> {
        self.observations.get(&id).copied()
    }

    pub fn observations(&self) -> impl Iterator<Item = (VarId, Outcome)> + '_ {
        self.observations.iter().map(|(id, outcome)| (*id, *outcome))
    }

    /// Observed literals in declaration order.
    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }
}

impl std::fmt::Display for Evidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.literals.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", rendered.join(", "))
    }
}
