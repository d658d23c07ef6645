//! Polytope hull contractor: domain bounds from a linear relaxation.
//!
//! The nonlinear system is relaxed into a polytope by the interval Taylor
//! linearizer; each variable is then minimized and maximized over the
//! polytope and its domain intersected with the certified-side bounds.
//! The LP optimum is not rigorous by itself, so a small safety margin is
//! kept on each bound.

use super::Contractor;
use crate::relax::{LinExpr, LinearizerTaylor, LpModel, LpStatus};
use ibis_core::{Interval, IntervalBox, Proof, Scope};

const LP_SAFETY_MARGIN: f64 = 1.0e-8;

/// Hull contraction of the Taylor polytope of a set of functions.
pub struct PolytopeHullContractor {
    linearizer: LinearizerTaylor,
    scope: Scope,
}

impl PolytopeHullContractor {
    pub fn new(linearizer: LinearizerTaylor) -> Self {
        let scope = linearizer.scope().clone();
        PolytopeHullContractor { linearizer, scope }
    }
}

impl Contractor for PolytopeHullContractor {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        let mut lp = LpModel::new();
        if !self.linearizer.make(&mut lp, b) {
            return Proof::Maybe;
        }

        for v in self.scope.iter() {
            let iv = match self.linearizer.lin_var_index(v) {
                Some(iv) => iv,
                None => continue,
            };
            let mut obj = LinExpr::new();
            obj.add_term(1.0, iv);

            // Lowest value of v over the polytope.
            lp.set_obj(obj.clone(), true);
            match lp.optimize() {
                LpStatus::Infeasible => return Proof::Empty,
                LpStatus::Optimal => {
                    let x = b
                        .get(v)
                        .inter(&Interval::more_than(lp.obj_value() - LP_SAFETY_MARGIN));
                    if x.is_empty() {
                        return Proof::Empty;
                    }
                    b.set(v, x);
                }
                LpStatus::Other => return Proof::Maybe,
            }

            // Highest value of v.
            lp.set_obj(obj, false);
            match lp.optimize() {
                LpStatus::Infeasible => return Proof::Empty,
                LpStatus::Optimal => {
                    let x = b
                        .get(v)
                        .inter(&Interval::less_than(lp.obj_value() + LP_SAFETY_MARGIN));
                    if x.is_empty() {
                        return Proof::Empty;
                    }
                    b.set(v, x);
                }
                LpStatus::Other => return Proof::Maybe,
            }
        }

        Proof::Maybe
    }

    fn name(&self) -> String {
        format!("polytope hull on {} variables", self.scope.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::{Constraint, Dag, Problem, Term};
    use std::rc::Rc;

    #[test]
    fn test_contracts_linear_constraint() {
        // x + y = 1 on [0, 10]^2: the polytope hull tightens both domains
        // to (about) [0, 1].
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.0, 10.0, "x").unwrap();
        let y = p.add_real_var(0.0, 10.0, "y").unwrap();
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(
            Term::var(&x) + Term::var(&y),
            Term::from(1.0),
        ));
        let dag = Rc::new(dag);

        let lin = LinearizerTaylor::new(dag, vec![0], 1e-8, false);
        let mut c = PolytopeHullContractor::new(lin);
        let mut b = p.initial_box();
        let proof = c.contract(&mut b);
        assert_ne!(proof, Proof::Empty);
        assert!(b.get(&x).right() <= 1.0 + 1e-4);
        assert!(b.get(&y).right() <= 1.0 + 1e-4);
        assert!(b.get(&x).contains(0.5));
    }

    #[test]
    fn test_monotone() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.0, 10.0, "x").unwrap();
        let y = p.add_real_var(0.0, 10.0, "y").unwrap();
        let mut dag = Dag::new();
        dag.insert(&Constraint::le(
            Term::var(&x) + Term::var(&y),
            Term::from(5.0),
        ));
        let dag = Rc::new(dag);
        let lin = LinearizerTaylor::new(dag, vec![0], 1e-8, true);
        let mut c = PolytopeHullContractor::new(lin);
        let before = p.initial_box();
        let mut b = before.clone();
        c.contract(&mut b);
        assert!(before.contains(&b));
    }
}
