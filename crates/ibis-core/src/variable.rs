//! Decision variables.
//!
//! A [`Variable`] is a cheap shared handle: two clones with the same id are
//! the same variable. Ids are assigned densely by the owning
//! [`crate::problem::Problem`], starting at 0.

use crate::interval::Interval;
use crate::tolerance::Tolerance;
use std::sync::Arc;

/// Continuous or discrete nature of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// Continuous real variable.
    Real,
    /// Integer-valued variable.
    Integer,
    /// 0/1 variable.
    Binary,
}

#[derive(Debug)]
struct VariableRep {
    id: usize,
    name: String,
    domain: Interval,
    kind: VarKind,
    tol: Tolerance,
}

/// A decision variable handle.
#[derive(Debug, Clone)]
pub struct Variable {
    rep: Arc<VariableRep>,
}

impl Variable {
    pub(crate) fn new(
        id: usize,
        name: impl Into<String>,
        domain: Interval,
        kind: VarKind,
        tol: Tolerance,
    ) -> Self {
        Variable {
            rep: Arc::new(VariableRep {
                id,
                name: name.into(),
                domain,
                kind,
                tol,
            }),
        }
    }

    /// Immutable identity, unique and dense per problem.
    pub fn id(&self) -> usize {
        self.rep.id
    }

    pub fn name(&self) -> &str {
        &self.rep.name
    }

    /// Initial domain declared at creation.
    pub fn domain(&self) -> Interval {
        self.rep.domain
    }

    pub fn kind(&self) -> VarKind {
        self.rep.kind
    }

    pub fn is_continuous(&self) -> bool {
        self.rep.kind == VarKind::Real
    }

    pub fn is_discrete(&self) -> bool {
        !self.is_continuous()
    }

    /// Output tolerance on interval solutions for this variable.
    pub fn tolerance(&self) -> Tolerance {
        self.rep.tol
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.rep.id == other.rep.id
    }
}

impl Eq for Variable {}

impl std::hash::Hash for Variable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rep.id.hash(state);
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rep.name)
    }
}
