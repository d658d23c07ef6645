//! Domain-reduction operators.
//!
//! A contractor narrows the domains of the variables of its scope in an
//! interval box and returns a [`Proof`] certificate: `Empty` when the box
//! cannot contain a solution, `Inner` when every point of the box
//! satisfies the underlying relation, `Maybe` otherwise. Contractors are
//! monotone: they only shrink domains.
//!
//! The closed set of variants:
//!
//! - [`Hc4Contractor`] - HC4-Revise over one DAG function
//! - [`Bc3Contractor`] - univariate interval-Newton refinement
//! - [`Bc4Contractor`] - HC4 plus BC3 on multiple-occurrence variables
//! - [`IntContractor`] - integral rounding of discrete domains
//! - [`ListContractor`] - ordered sequence, short-circuit on `Empty`
//! - [`MaxCidContractor`] - constructive interval disjunction
//! - [`BoContractor`] - boundary-aware stationary-point contraction
//! - [`PolytopeHullContractor`] - LP hull of a Taylor relaxation
//! - [`NewtonContractor`] - multivariate Krawczyk contraction
//! - [`Propagator`] - worklist fixpoint over a pool, itself a contractor

mod bc3;
mod bc4;
mod bco;
mod hc4;
mod integrality;
mod list;
mod max_cid;
mod newton_ctc;
mod polytope;
mod propagator;

pub use bc3::Bc3Contractor;
pub(crate) use bc3::ThickFn;
pub use bc4::Bc4Contractor;
pub use bco::BoContractor;
pub use hc4::Hc4Contractor;
pub use integrality::IntContractor;
pub use list::ListContractor;
pub use max_cid::MaxCidContractor;
pub use newton_ctc::NewtonContractor;
pub use polytope::PolytopeHullContractor;
pub use propagator::Propagator;

use hashbrown::HashMap;
use ibis_core::{IntervalBox, Proof, Scope, ScopeBank, Variable};

/// A monotone domain-reduction operator with a proof certificate.
///
/// `contract` may only shrink or leave unchanged the domains of the
/// variables of `scope`.
pub trait Contractor {
    /// The set of variables this contractor depends on and may reduce.
    fn scope(&self) -> &Scope;

    /// Reduction method; mutates `b` in place.
    fn contract(&mut self, b: &mut IntervalBox) -> Proof;

    /// Propagation dependency test.
    fn depends_on(&self, v: &Variable) -> bool {
        self.scope().contains(v)
    }

    /// Short description for logs.
    fn name(&self) -> String;
}

/// A pool of contractors with the per-variable dependency lists used by
/// the propagator. The pool scope is the union of the contractor scopes.
#[derive(Default)]
pub struct ContractorPool {
    ops: Vec<Box<dyn Contractor>>,
    scope: Scope,
    // variable id -> indices of the contractors depending on it
    deps: HashMap<usize, Vec<usize>>,
}

impl ContractorPool {
    pub fn new() -> Self {
        ContractorPool::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn push(&mut self, op: Box<dyn Contractor>) {
        let idx = self.ops.len();
        for v in op.scope().iter() {
            self.deps.entry(v.id()).or_default().push(idx);
        }
        self.scope = ScopeBank::intern(self.scope.union(op.scope()));
        self.ops.push(op);
    }

    pub fn at(&mut self, i: usize) -> &mut dyn Contractor {
        self.ops[i].as_mut()
    }

    pub fn at_ref(&self, i: usize) -> &dyn Contractor {
        self.ops[i].as_ref()
    }

    /// Indices of the contractors depending on `v`.
    pub fn dependents(&self, v: &Variable) -> &[usize] {
        self.deps.get(&v.id()).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::{Interval, Problem};

    /// A contractor that halves the domain of one variable; used to
    /// exercise the pool plumbing.
    pub(crate) struct Halver {
        scope: Scope,
        v: Variable,
    }

    impl Halver {
        pub(crate) fn new(v: Variable) -> Self {
            Halver {
                scope: ScopeBank::intern(Scope::from_vars([v.clone()])),
                v,
            }
        }
    }

    impl Contractor for Halver {
        fn scope(&self) -> &Scope {
            &self.scope
        }

        fn contract(&mut self, b: &mut IntervalBox) -> Proof {
            let x = b.get(&self.v);
            b.set(&self.v, Interval::new(x.left(), x.midpoint()));
            Proof::Maybe
        }

        fn name(&self) -> String {
            format!("halver on {}", self.v)
        }
    }

    #[test]
    fn test_traits_are_object_safe() {
        // This test passes if it compiles.
        fn _accepts(_c: &dyn Contractor) {}
    }

    #[test]
    fn test_pool_scope_and_deps() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.0, 1.0, "x").unwrap();
        let y = p.add_real_var(0.0, 1.0, "y").unwrap();

        let mut pool = ContractorPool::new();
        pool.push(Box::new(Halver::new(x.clone())));
        pool.push(Box::new(Halver::new(y.clone())));
        pool.push(Box::new(Halver::new(x.clone())));

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.scope().size(), 2);
        assert_eq!(pool.dependents(&x), &[0, 2]);
        assert_eq!(pool.dependents(&y), &[1]);
    }

    #[test]
    fn test_pool_contract_shrinks() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.0, 4.0, "x").unwrap();
        let mut pool = ContractorPool::new();
        pool.push(Box::new(Halver::new(x.clone())));
        let mut b = p.initial_box();
        assert_eq!(pool.at(0).contract(&mut b), Proof::Maybe);
        assert!(b.get(&x).is_set_eq(&Interval::new(0.0, 2.0)));
    }
}
