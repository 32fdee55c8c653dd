//! # Bayesian Network
//!
//! Binary random variables, their priors and conditional probability tables,
//! and the baked (validated, immutable) network that inference runs over.
//!
//! ## Key Components
//!
//! - **Variable**: a named binary variable with domain (`X`, `-X`)
//! - **Prior**: P(true) for a root variable; P(false) is derived
//! - **ConditionalTable**: the rows of a CPT plus a dense per-assignment index
//! - **NetworkBuilder**: collects declarations and bakes them into a [`Network`]
//!
//! ## Design
//!
//! Parent assignments are indexed densely: bit `i` of an assignment index is
//! set when `parents[i]` is `True`. Rows from the input are matched to this
//! index by parent name, so the token order inside a key is irrelevant.
//!
//! Baking checks that every edge endpoint resolves, every table is complete,
//! and the edge set is acyclic, then fixes a deterministic topological order
//! (Kahn's algorithm, ties broken by declaration order).
//!
//! ## Example
//!
//! ```rust,ignore
//! use bayesquery_core::engine::network::NetworkBuilder;
//!
//! let mut builder = NetworkBuilder::default();
//! builder.add_prior("A", 0.6)?;
//! builder.add_table("B", vec!["A".into()], &rows)?;
//! let network = builder.bake()?;
//! ```

use std::collections::BTreeSet;

use bayesquery_frontend::ast::{child_parents, CptRow, Edge, Literal, Outcome, ParsedSpec};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::engine::errors::{ExecError, ReferenceKind};

/// Tolerance for a CPT row pair summing to one.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// A unique identifier for a variable in the network.
///
/// VarId implements Ord/PartialOrd for stable, deterministic iteration.
/// Ids are assigned in declaration order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct VarId(pub u32);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A binary random variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub id: VarId,
    pub name: String,
    /// Outcome labels, `[true, false]` = `["X", "-X"]`
    pub domain: [String; 2],
}

impl Variable {
    fn new(id: VarId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            domain: [
                Literal::positive(name).to_string(),
                Literal::negative(name).to_string(),
            ],
        }
    }

    pub fn literal(&self, outcome: Outcome) -> Literal {
        Literal::new(self.name.clone(), outcome)
    }
}

/// Prior distribution of a root variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prior {
    p_true: f64,
}

impl Prior {
    pub fn new(p_true: f64) -> Result<Self, ExecError> {
        if !p_true.is_finite() || !(0.0..=1.0).contains(&p_true) {
            return Err(ExecError::MalformedSpec(format!(
                "prior probability must be in [0, 1], got {}",
                p_true
            )));
        }
        Ok(Self { p_true })
    }

    pub fn p_true(&self) -> f64 {
        self.p_true
    }

    pub fn p_false(&self) -> f64 {
        1.0 - self.p_true
    }

    pub fn probability(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::True => self.p_true(),
            Outcome::False => self.p_false(),
        }
    }
}

/// Conditional probability table of a variable with one or more parents.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalTable {
    parents: Vec<VarId>,
    rows: Vec<CptRow>,
    /// Indexed by parent assignment: `[P(true | a), P(false | a)]`
    probabilities: Vec<[f64; 2]>,
}

impl ConditionalTable {
    pub fn parents(&self) -> &[VarId] {
        &self.parents
    }

    /// Rows as declared, affirmed rows followed by synthesized complements.
    pub fn rows(&self) -> &[CptRow] {
        &self.rows
    }

    /// Number of parent assignments (2^parents).
    pub fn assignment_count(&self) -> usize {
        self.probabilities.len()
    }

    pub fn probability(&self, outcome: Outcome, assignment: usize) -> f64 {
        self.probabilities[assignment][outcome_slot(outcome)]
    }
}

/// The distribution attached to a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    Prior(Prior),
    Conditional(ConditionalTable),
}

impl Distribution {
    pub fn parents(&self) -> &[VarId] {
        match self {
            Distribution::Prior(_) => &[],
            Distribution::Conditional(table) => table.parents(),
        }
    }

    /// P(outcome | parent assignment); `assignment` is ignored for priors.
    pub fn probability(&self, outcome: Outcome, assignment: usize) -> f64 {
        match self {
            Distribution::Prior(prior) => prior.probability(outcome),
            Distribution::Conditional(table) => table.probability(outcome, assignment),
        }
    }
}

/// A baked Bayesian network.
///
/// Read-only once built; inference borrows it immutably.
#[derive(Debug, Clone)]
pub struct Network {
    variables: Vec<Variable>,
    distributions: Vec<Distribution>,
    children: Vec<Vec<VarId>>,
    edges: Vec<(VarId, VarId)>,
    index: FxHashMap<String, VarId>,
    topological_order: Vec<VarId>,
}

impl Network {
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn distribution(&self, id: VarId) -> &Distribution {
        &self.distributions[id.index()]
    }

    pub fn parents(&self, id: VarId) -> &[VarId] {
        self.distributions[id.index()].parents()
    }

    pub fn children(&self, id: VarId) -> &[VarId] {
        &self.children[id.index()]
    }

    /// Parent -> child pairs, deduplicated.
    pub fn edges(&self) -> &[(VarId, VarId)] {
        &self.edges
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.index.get(name).copied()
    }

    /// Resolves a name or fails with an `UnresolvedReference` of the given kind.
    pub fn resolve(&self, name: &str, kind: ReferenceKind) -> Result<VarId, ExecError> {
        self.lookup(name)
            .ok_or_else(|| ExecError::unresolved(kind, name))
    }

    /// Deterministic topological order (parents before children).
    pub fn topological_order(&self) -> &[VarId] {
        &self.topological_order
    }

    /// The variable and all of its ancestors.
    pub fn ancestors_inclusive(&self, roots: impl IntoIterator<Item = VarId>) -> BTreeSet<VarId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<VarId> = roots.into_iter().collect();
        while let Some(id) = stack.pop() {
            if seen.insert(id) {
                stack.extend(self.parents(id).iter().copied());
            }
        }
        seen
    }
}

/// Collects declarations and bakes them into a [`Network`].
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    variables: Vec<Variable>,
    distributions: Vec<Option<PendingDistribution>>,
    index: FxHashMap<String, VarId>,
    edges: Vec<Edge>,
}

#[derive(Debug)]
enum PendingDistribution {
    Prior(Prior),
    Conditional { parents: Vec<String>, rows: Vec<CptRow> },
}

impl NetworkBuilder {
    fn declare(&mut self, name: &str) -> VarId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = VarId(self.variables.len() as u32);
        self.variables.push(Variable::new(id, name));
        self.distributions.push(None);
        self.index.insert(name.to_string(), id);
        id
    }

    /// Declares a root variable; a redeclaration overwrites in place.
    pub fn add_prior(&mut self, name: &str, p_true: f64) -> Result<VarId, ExecError> {
        let prior = Prior::new(p_true)?;
        let id = self.declare(name);
        self.distributions[id.index()] = Some(PendingDistribution::Prior(prior));
        Ok(id)
    }

    /// Declares a conditional variable with its ordered parent list and rows.
    ///
    /// Replaces any earlier distribution of the same variable.
    pub fn add_table(
        &mut self,
        name: &str,
        parents: Vec<String>,
        rows: &[CptRow],
    ) -> Result<VarId, ExecError> {
        if parents.is_empty() {
            return Err(ExecError::MalformedSpec(format!(
                "conditional table for '{}' has no parents",
                name
            )));
        }
        let id = self.declare(name);
        if let Some(PendingDistribution::Prior(_)) = &self.distributions[id.index()] {
            #[cfg(feature = "tracing")]
            tracing::debug!(variable = name, "conditional table replaces prior");
        }
        self.edges
            .extend(parents.iter().map(|p| Edge::new(p.clone(), name)));
        self.distributions[id.index()] = Some(PendingDistribution::Conditional {
            parents,
            rows: rows.to_vec(),
        });
        Ok(id)
    }

    /// Records an additional structural edge; both endpoints must be declared by bake time.
    pub fn add_edge(&mut self, parent: &str, child: &str) {
        self.edges.push(Edge::new(parent, child));
    }

    /// Validates the declarations and produces an immutable network.
    pub fn bake(self) -> Result<Network, ExecError> {
        let NetworkBuilder {
            variables,
            distributions: pending,
            index,
            edges: declared_edges,
        } = self;

        let mut distributions = Vec::with_capacity(variables.len());
        for (variable, pending) in variables.iter().zip(pending) {
            let distribution = match pending {
                Some(PendingDistribution::Prior(prior)) => Distribution::Prior(prior),
                Some(PendingDistribution::Conditional { parents, rows }) => Distribution::Conditional(
                    build_table(&variable.name, &parents, rows, &index)?,
                ),
                None => {
                    return Err(ExecError::Internal(format!(
                        "variable '{}' declared without a distribution",
                        variable.name
                    )))
                }
            };
            distributions.push(distribution);
        }

        let mut edges = Vec::new();
        for edge in &declared_edges {
            let parent = index
                .get(&edge.parent)
                .copied()
                .ok_or_else(|| ExecError::unresolved(ReferenceKind::EdgeEndpoint, &edge.parent))?;
            let child = index
                .get(&edge.child)
                .copied()
                .ok_or_else(|| ExecError::unresolved(ReferenceKind::EdgeEndpoint, &edge.child))?;
            if !distributions[child.index()].parents().contains(&parent) {
                return Err(ExecError::MalformedSpec(format!(
                    "edge {} -> {} has no matching conditional table",
                    edge.parent, edge.child
                )));
            }
            if !edges.contains(&(parent, child)) {
                edges.push((parent, child));
            }
        }

        let mut children = vec![Vec::new(); variables.len()];
        for (id, distribution) in distributions.iter().enumerate() {
            for parent in distribution.parents() {
                children[parent.index()].push(VarId(id as u32));
            }
        }

        let topological_order = topological_sort(&variables, &distributions, &children)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            variables = variables.len(),
            edges = edges.len(),
            "baked network"
        );

        Ok(Network {
            variables,
            distributions,
            children,
            edges,
            index,
            topological_order,
        })
    }
}

/// Builds a network from a parsed specification.
pub fn build_network(spec: &ParsedSpec) -> Result<Network, ExecError> {
    build_network_from_parts(&spec.priors, &spec.tables, &spec.edges)
}

/// Builds a network from priors, per-child table groups and discovered edges.
///
/// A table group whose child never appears as an edge target is dropped, as is
/// the structure it would have described. The child keeps its prior, if any.
pub fn build_network_from_parts(
    priors: &IndexMap<String, f64>,
    tables: &IndexMap<String, Vec<CptRow>>,
    edges: &[Edge],
) -> Result<Network, ExecError> {
    let parents_of = child_parents(edges);
    let mut builder = NetworkBuilder::default();

    for (name, p_true) in priors {
        builder.add_prior(name, *p_true)?;
    }
    for (child, rows) in tables {
        match parents_of.get(child) {
            Some(parents) => {
                builder.add_table(child, parents.clone(), rows)?;
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    variable = %child,
                    rows = rows.len(),
                    "conditional table has no discovered edges; dropping it"
                );
            }
        }
    }
    for edge in edges {
        if !tables.contains_key(&edge.child) {
            builder.add_edge(&edge.parent, &edge.child);
        }
    }

    builder.bake()
}

#[inline]
fn outcome_slot(outcome: Outcome) -> usize {
    match outcome {
        Outcome::True => 0,
        Outcome::False => 1,
    }
}

fn build_table(
    child: &str,
    parents: &[String],
    rows: Vec<CptRow>,
    index: &FxHashMap<String, VarId>,
) -> Result<ConditionalTable, ExecError> {
    let parent_ids = parents
        .iter()
        .map(|p| {
            index
                .get(p)
                .copied()
                .ok_or_else(|| ExecError::unresolved(ReferenceKind::Parent, p))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // a complete table holds both outcomes for every assignment, so the rows
    // bound the dense index before anything is allocated for it
    if parents.len() + 1 >= usize::BITS as usize || rows.len() < 2usize << parents.len() {
        return Err(ExecError::MalformedSpec(format!(
            "conditional table for '{}' has {} rows, but {} parents ({}) need {}",
            child,
            rows.len(),
            parents.len(),
            parents.join(", "),
            describe_row_count(parents.len())
        )));
    }
    let assignment_count = 1usize << parents.len();
    let mut probabilities: Vec<[Option<f64>; 2]> = vec![[None, None]; assignment_count];

    for row in &rows {
        if row.child.name != child {
            return Err(ExecError::Internal(format!(
                "row for '{}' grouped under '{}'",
                row.child.name, child
            )));
        }
        for literal in &row.parents {
            if !parents.contains(&literal.name) && !index.contains_key(&literal.name) {
                return Err(ExecError::unresolved(ReferenceKind::Parent, &literal.name));
            }
        }
        let assignment = assignment_index(child, parents, &row.parents)?;
        let slot = &mut probabilities[assignment][outcome_slot(row.child.outcome)];
        if slot.is_some() {
            #[cfg(feature = "tracing")]
            tracing::trace!(%child, assignment, "row redeclared, last write wins");
        }
        *slot = Some(row.probability);
    }

    let mut dense = Vec::with_capacity(assignment_count);
    for (assignment, pair) in probabilities.into_iter().enumerate() {
        let (p_true, p_false) = match pair {
            [Some(t), Some(f)] => (t, f),
            _ => {
                return Err(ExecError::MalformedSpec(format!(
                    "conditional table for '{}' has no row for {}",
                    child,
                    describe_assignment(parents, assignment)
                )))
            }
        };
        if (p_true + p_false - 1.0).abs() > ROW_SUM_TOLERANCE {
            return Err(ExecError::MalformedSpec(format!(
                "rows of '{}' for {} sum to {}",
                child,
                describe_assignment(parents, assignment),
                p_true + p_false
            )));
        }
        dense.push([p_true, p_false]);
    }

    Ok(ConditionalTable {
        parents: parent_ids,
        rows,
        probabilities: dense,
    })
}

/// Maps a row's parent literals onto the declared parent order.
fn assignment_index(
    child: &str,
    parents: &[String],
    literals: &[Literal],
) -> Result<usize, ExecError> {
    if literals.len() != parents.len() {
        return Err(ExecError::MalformedSpec(format!(
            "row of '{}' conditions on {} parents, table declares {} ({})",
            child,
            literals.len(),
            parents.len(),
            parents.join(", ")
        )));
    }
    let mut assignment = 0usize;
    let mut seen = 0usize;
    for literal in literals {
        let position = parents.iter().position(|p| *p == literal.name).ok_or_else(|| {
            ExecError::MalformedSpec(format!(
                "row of '{}' conditions on '{}', which is not among its parents ({})",
                child,
                literal.name,
                parents.join(", ")
            ))
        })?;
        if seen & (1 << position) != 0 {
            return Err(ExecError::MalformedSpec(format!(
                "row of '{}' mentions parent '{}' twice",
                child, literal.name
            )));
        }
        seen |= 1 << position;
        if literal.outcome.is_true() {
            assignment |= 1 << position;
        }
    }
    Ok(assignment)
}

fn describe_row_count(parent_count: usize) -> String {
    if parent_count + 1 < usize::BITS as usize {
        (2usize << parent_count).to_string()
    } else {
        format!("2^{}", parent_count + 1)
    }
}

fn describe_assignment(parents: &[String], assignment: usize) -> String {
    parents
        .iter()
        .enumerate()
        .map(|(i, p)| {
            Literal::new(p.clone(), Outcome::from_negated(assignment & (1 << i) == 0)).to_string()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn topological_sort(
    variables: &[Variable],
    distributions: &[Distribution],
    children: &[Vec<VarId>],
) -> Result<Vec<VarId>, ExecError> {
    let mut in_degree: Vec<usize> = distributions.iter().map(|d| d.parents().len()).collect();
    let mut ready: BTreeSet<VarId> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| VarId(id as u32))
        .collect();

    let mut order = Vec::with_capacity(variables.len());
    while let Some(id) = ready.pop_first() {
        order.push(id);
        for child in &children[id.index()] {
            in_degree[child.index()] -= 1;
            if in_degree[child.index()] == 0 {
                ready.insert(*child);
            }
        }
    }

    if order.len() != variables.len() {
        let stuck = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(id, _)| variables[id].name.as_str())
            .collect::<Vec<_>>();
        return Err(ExecError::CyclicStructure(format!(
            "variables {} lie on or downstream of a cycle",
            stuck.join(", ")
        )));
    }
    Ok(order)
}
