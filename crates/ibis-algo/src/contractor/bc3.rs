//! BC3 contractor: box-consistency refinement of one variable under one
//! function.
//!
//! The outermost consistent subintervals of the variable domain are
//! searched by peeling boundary slices and Newton-contracting the rest,
//! with a bounded stack of candidate subintervals and a step cap.

use super::Contractor;
use crate::newton::{IntervalNewton, UniFn};
use crate::split::Peeler;
use ibis_core::{
    Dag, FunId, IbisError, IbisResult, Interval, IntervalBox, Proof, Scope, Variable,
};
use std::rc::Rc;

/// Univariate thick view of a DAG function: every variable but one is
/// frozen at its domain in the current box.
pub(crate) struct ThickFn<'a> {
    dag: &'a Dag,
    fun: FunId,
    var: &'a Variable,
    b: &'a IntervalBox,
}

impl<'a> ThickFn<'a> {
    pub(crate) fn new(dag: &'a Dag, fun: FunId, var: &'a Variable, b: &'a IntervalBox) -> Self {
        ThickFn { dag, fun, var, b }
    }
}

impl UniFn for ThickFn<'_> {
    fn eval(&self, x: Interval) -> Interval {
        self.dag.eval_override(self.fun, self.b, self.var, x)
    }

    fn eval_diff(&self, x: Interval) -> (Interval, Interval) {
        self.dag.eval_diff_override(self.fun, self.b, self.var, x)
    }
}

enum Side {
    Left,
    Right,
}

/// BC3 contractor on one (function, variable) pair.
pub struct Bc3Contractor {
    dag: Rc<Dag>,
    fun: FunId,
    var: Variable,
    scope: Scope,
    peeler: Peeler,
    max_steps: usize,
    newton: IntervalNewton,
}

impl Bc3Contractor {
    pub fn new(dag: Rc<Dag>, fun: FunId, var: Variable) -> IbisResult<Self> {
        Self::with_settings(dag, fun, var, 2.0, 30, IntervalNewton::default())
    }

    pub fn with_settings(
        dag: Rc<Dag>,
        fun: FunId,
        var: Variable,
        peel_factor: f64,
        max_steps: usize,
        newton: IntervalNewton,
    ) -> IbisResult<Self> {
        if fun >= dag.nb_funs() {
            return Err(IbisError::Structure(format!(
                "BC3 contractor created with a bad function index {fun}"
            )));
        }
        if !dag.fun(fun).scope().contains(&var) {
            return Err(IbisError::Structure(format!(
                "BC3 contractor: variable {} does not occur in function {fun}",
                var.name()
            )));
        }
        let scope = dag.fun(fun).scope().clone();
        Ok(Bc3Contractor {
            dag,
            fun,
            var,
            scope,
            peeler: Peeler::new(peel_factor)?,
            max_steps: max_steps.max(1),
            newton,
        })
    }

    pub fn var(&self) -> &Variable {
        &self.var
    }

    /// Consistency of the thickened function on a slice of the variable
    /// domain.
    fn consistency(&self, f: &ThickFn<'_>, x: Interval) -> Proof {
        let e = f.eval(x);
        let image = self.dag.fun(self.fun).image();
        if e.is_empty() || !image.overlaps(&e) {
            Proof::Empty
        } else if image.contains_interval(&e) {
            Proof::Inner
        } else {
            Proof::Maybe
        }
    }

    /// Searches the outermost consistent subinterval on one side of `x`.
    fn shrink(&self, f: &ThickFn<'_>, x: Interval, side: Side) -> (Proof, Interval) {
        let mut stack = vec![x];
        let mut steps = 0usize;

        while let Some(y) = stack.pop() {
            steps += 1;
            if steps > self.max_steps {
                return (Proof::Maybe, y);
            }

            // Is the boundary slice of y consistent?
            let (bound, mut rest) = match side {
                Side::Left => {
                    let b = self.peeler.peel_left(y);
                    (b, Interval::new(b.right(), y.right()))
                }
                Side::Right => {
                    let b = self.peeler.peel_right(y);
                    (b, Interval::new(y.left(), b.left()))
                }
            };

            let proof = self.consistency(f, bound);
            if proof != Proof::Empty {
                return (proof, bound);
            }

            let proof = self.newton.contract(f, &mut rest);
            if proof == Proof::Feasible {
                return (proof, rest);
            }
            if proof != Proof::Empty {
                let m = rest.midpoint();
                if rest.strictly_contains(m) {
                    // Process the boundary-side half first.
                    match side {
                        Side::Left => {
                            stack.push(Interval::new(m, rest.right()));
                            stack.push(Interval::new(rest.left(), m));
                        }
                        Side::Right => {
                            stack.push(Interval::new(rest.left(), m));
                            stack.push(Interval::new(m, rest.right()));
                        }
                    }
                } else {
                    return (Proof::Maybe, rest);
                }
            }
        }

        (Proof::Empty, Interval::empty())
    }
}

impl Contractor for Bc3Contractor {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        let f = ThickFn::new(&self.dag, self.fun, &self.var, b);
        let image = self.dag.fun(self.fun).image();
        let dom = b.get(&self.var);

        // Thickened evaluation on the full domain first.
        let e = f.eval(dom);
        if e.is_empty() || !e.overlaps(&image) {
            return Proof::Empty;
        }
        if image.contains_interval(&e) {
            return Proof::Inner;
        }

        let (lproof, lsol) = self.shrink(&f, dom, Side::Left);
        if lproof == Proof::Empty {
            return Proof::Empty;
        }

        let (rproof, rsol) = self.shrink(
            &f,
            Interval::new(lsol.left(), dom.right()),
            Side::Right,
        );

        let nd = lsol.hull(&rsol);
        b.set(&self.var, nd);

        lproof.max(rproof)
    }

    fn name(&self) -> String {
        format!("BC3 contractor @ {} / {}", self.fun, self.var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::term::sqr;
    use ibis_core::{Constraint, Problem, Term};

    fn sqrt2_problem() -> (Problem, Variable, Rc<Dag>) {
        let mut p = Problem::new("t");
        let x = p.add_real_var(1.0, 10.0, "x").unwrap();
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(
            sqr(Term::var(&x)) - Term::from(2.0),
            Term::from(0.0),
        ));
        (p, x, Rc::new(dag))
    }

    #[test]
    fn test_contracts_to_root() {
        let (p, x, dag) = sqrt2_problem();
        let mut c = Bc3Contractor::new(dag, 0, x.clone()).unwrap();
        let mut b = p.initial_box();
        let proof = c.contract(&mut b);
        assert_ne!(proof, Proof::Empty);
        let d = b.get(&x);
        assert!(d.contains(2.0f64.sqrt()));
        assert!(d.width() < 1.0);
    }

    #[test]
    fn test_detects_empty() {
        let (p, x, dag) = sqrt2_problem();
        let mut c = Bc3Contractor::new(dag, 0, x.clone()).unwrap();
        let mut b = p.initial_box();
        b.set(&x, Interval::new(3.0, 10.0));
        assert_eq!(c.contract(&mut b), Proof::Empty);
    }

    #[test]
    fn test_rejects_foreign_variable() {
        let (mut p, _, dag) = sqrt2_problem();
        let y = p.add_real_var(0.0, 1.0, "y").unwrap();
        assert!(Bc3Contractor::new(dag, 0, y).is_err());
    }

    #[test]
    fn test_monotone() {
        let (p, x, dag) = sqrt2_problem();
        let mut c = Bc3Contractor::new(dag, 0, x.clone()).unwrap();
        let mut b = p.initial_box();
        let before = b.get(&x);
        c.contract(&mut b);
        assert!(before.contains_interval(&b.get(&x)));
    }
}
