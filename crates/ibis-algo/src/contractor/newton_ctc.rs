//! Multivariate Newton contractor over a square equation system.

use super::Contractor;
use crate::prover::{krawczyk_step, KrawczykOutcome};
use ibis_core::{Dag, FunId, IbisError, IbisResult, IntervalBox, Proof, Scope, ScopeBank, Variable};
use std::rc::Rc;

/// One preconditioned Krawczyk contraction step per call.
///
/// Requires a square system: as many equations as variables in their
/// union scope.
pub struct NewtonContractor {
    dag: Rc<Dag>,
    funs: Vec<FunId>,
    vars: Vec<Variable>,
    scope: Scope,
}

impl NewtonContractor {
    pub fn new(dag: Rc<Dag>, funs: Vec<FunId>) -> IbisResult<Self> {
        let mut scope = Scope::new();
        for &f in &funs {
            if f >= dag.nb_funs() {
                return Err(IbisError::Structure(format!(
                    "Newton contractor created with a bad function index {f}"
                )));
            }
            if !dag.fun(f).image().is_singleton() {
                return Err(IbisError::Structure(
                    "Newton contractor requires equations".into(),
                ));
            }
            scope.insert_scope(dag.fun(f).scope());
        }
        let scope = ScopeBank::intern(scope);
        if scope.size() != funs.len() || funs.is_empty() {
            return Err(IbisError::Structure(format!(
                "Newton contractor requires a square system, got {} equations over {} variables",
                funs.len(),
                scope.size()
            )));
        }
        let vars: Vec<Variable> = scope.iter().cloned().collect();
        Ok(NewtonContractor {
            dag,
            funs,
            vars,
            scope,
        })
    }
}

impl Contractor for NewtonContractor {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        match krawczyk_step(&self.dag, &self.funs, &self.vars, b) {
            KrawczykOutcome::Empty => Proof::Empty,
            KrawczykOutcome::Certified(ks) => {
                for (v, k) in self.vars.iter().zip(ks.iter()) {
                    b.set(v, k.inter(&b.get(v)));
                }
                Proof::Feasible
            }
            KrawczykOutcome::Contracted(ks) => {
                for (v, k) in self.vars.iter().zip(ks.iter()) {
                    b.set(v, *k);
                }
                Proof::Maybe
            }
            KrawczykOutcome::NoInfo => Proof::Maybe,
        }
    }

    fn name(&self) -> String {
        format!("Newton contractor on {} equations", self.funs.len())
    }
}
