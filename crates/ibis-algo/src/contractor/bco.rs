//! Bound-constrained optimization contractor.
//!
//! Works on one partial derivative `df/dv = 0` of an objective function.
//! Inside the search region, minimizers are stationary points, so the
//! derivative equation can be contracted like any constraint. On the
//! boundary of the initial region that reasoning is wrong: a minimizer
//! may sit on the bound with a nonzero derivative. This contractor keeps
//! the boundary slices alive exactly when the derivative sign certifies
//! them, and instantiates `v` to the right bound when the derivative has
//! constant sign over the whole box.

use super::Contractor;
use ibis_core::{Dag, FunId, Interval, IntervalBox, Proof, Scope, ScopeBank, Variable};
use std::rc::Rc;

/// Stationary-point contraction made safe on the initial bounds.
pub struct BoContractor {
    dag: Rc<Dag>,
    fun: FunId,
    v: Variable,
    inner: Box<dyn Contractor>,
    init: Rc<IntervalBox>,
    scope: Scope,
}

impl BoContractor {
    /// `fun` is the derivative equation `df/dv = 0` in `dag`; `inner` is
    /// the contractor enforcing it (HC4 in the default pipeline); `init`
    /// is the initial region of the search.
    pub fn new(
        dag: Rc<Dag>,
        fun: FunId,
        v: Variable,
        inner: Box<dyn Contractor>,
        init: Rc<IntervalBox>,
    ) -> Self {
        let mut scope = dag.fun(fun).scope().clone();
        scope.insert(&v);
        let scope = ScopeBank::intern(scope);
        BoContractor {
            dag,
            fun,
            v,
            inner,
            init,
            scope,
        }
    }

    fn derivative_at_corner(&self, b: &IntervalBox, right: bool) -> Interval {
        let bits = vec![right; b.size()];
        self.dag.eval_point(self.fun, &b.corner(&bits))
    }
}

impl Contractor for BoContractor {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        let dom = b.get(&self.v);
        let idom = self.init.get(&self.v);

        // Does the box touch the initial region on a bound of v?
        let init_lb = dom.left() == idom.left();
        let init_rb = dom.right() == idom.right();

        if !(init_lb || init_rb) {
            // Interior box: minimizers are stationary points.
            return self.inner.contract(b);
        }

        let copy = b.clone();
        let proof = self.inner.contract(b);

        if proof == Proof::Empty {
            // No stationary point: the derivative has constant sign, so
            // the minimum sits on the matching bound of v.
            let ef = self.dag.eval_point(self.fun, &copy.midpoint());
            b.set_on_scope(&copy, &self.scope);

            if ef.is_certainly_le_zero() {
                b.set(&self.v, Interval::singleton(copy.get(&self.v).right()));
            } else if ef.is_certainly_ge_zero() {
                b.set(&self.v, Interval::singleton(copy.get(&self.v).left()));
            }
        } else {
            // Stationary points exist. A contracted-away boundary slice is
            // restored when the derivative sign at the corner certifies a
            // boundary minimum.
            let mut keep_lb = false;
            let mut keep_rb = false;

            if init_lb && b.get(&self.v).left() != copy.get(&self.v).left() {
                let ef = self.derivative_at_corner(&copy, false);
                if ef.is_certainly_ge_zero() {
                    keep_lb = true;
                }
            }
            if init_rb && b.get(&self.v).right() != copy.get(&self.v).right() {
                let ef = self.derivative_at_corner(&copy, true);
                if ef.is_certainly_le_zero() {
                    keep_rb = true;
                }
            }

            if keep_lb || keep_rb {
                b.set_on_scope(&copy, &self.scope);
                let d = b.get(&self.v);
                let l = if keep_lb {
                    copy.get(&self.v).left()
                } else {
                    d.left()
                };
                let r = if keep_rb {
                    copy.get(&self.v).right()
                } else {
                    d.right()
                };
                b.set(&self.v, Interval::new(l, r));
            }
        }

        Proof::Maybe
    }

    fn name(&self) -> String {
        format!("BO contractor @ {} / {}", self.fun, self.v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contractor::Hc4Contractor;
    use ibis_core::{Constraint, Problem, Term};

    /// Objective f(u) = 3u on u in [-10, 10]: df/du = 3, no stationary
    /// point, minimum at the left bound.
    #[test]
    fn test_monotone_objective_instantiates_bound() {
        let mut p = Problem::new("t");
        let u = p.add_real_var(-10.0, 10.0, "u").unwrap();
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(Term::from(3.0), Term::from(0.0)));
        let dag = Rc::new(dag);

        let inner = Box::new(Hc4Contractor::new(dag.clone(), 0).unwrap());
        let init = Rc::new(p.initial_box());
        let mut c = BoContractor::new(dag, 0, u.clone(), inner, init);

        let mut b = p.initial_box();
        assert_eq!(c.contract(&mut b), Proof::Maybe);
        assert!(b.get(&u).is_set_eq(&Interval::singleton(-10.0)));
    }

    /// f(x) = x^2 on [-4, 4]: df/dx = 2x = 0 keeps the stationary point.
    #[test]
    fn test_stationary_point_kept() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(-4.0, 4.0, "x").unwrap();
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(
            Term::from(2.0) * Term::var(&x),
            Term::from(0.0),
        ));
        let dag = Rc::new(dag);

        let inner = Box::new(Hc4Contractor::new(dag.clone(), 0).unwrap());
        let init = Rc::new(p.initial_box());
        let mut c = BoContractor::new(dag, 0, x.clone(), inner, init);

        let mut b = p.initial_box();
        assert_eq!(c.contract(&mut b), Proof::Maybe);
        assert!(b.get(&x).contains(0.0));
    }

    /// Interior boxes contract with the plain stationary equation.
    #[test]
    fn test_interior_box_plain_contraction() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(-4.0, 4.0, "x").unwrap();
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(
            Term::from(2.0) * Term::var(&x),
            Term::from(0.0),
        ));
        let dag = Rc::new(dag);

        let inner = Box::new(Hc4Contractor::new(dag.clone(), 0).unwrap());
        let init = Rc::new(p.initial_box());
        let mut c = BoContractor::new(dag, 0, x.clone(), inner, init);

        let mut b = p.initial_box();
        b.set(&x, Interval::new(-1.0, 2.0));
        c.contract(&mut b);
        assert!(b.get(&x).is_set_eq(&Interval::zero()));
    }
}
