//! Constructive interval disjunction on the largest domain.
//!
//! The domain of the selected variable is sliced; the inner contractor
//! runs on one copy of the box per slice and the surviving copies are
//! hulled. Stronger than the inner contractor alone because each slice is
//! contracted in isolation.

use super::Contractor;
use ibis_core::{IntervalBox, Proof, Scope, Variable};

use crate::split::IntervalSlicer;

/// Max-CID: constructive interval disjunction on the variable with the
/// largest domain of the inner contractor's scope.
pub struct MaxCidContractor {
    inner: Box<dyn Contractor>,
    slicer: Box<dyn IntervalSlicer>,
    scope: Scope,
}

impl MaxCidContractor {
    pub fn new(inner: Box<dyn Contractor>, slicer: Box<dyn IntervalSlicer>) -> Self {
        let scope = inner.scope().clone();
        MaxCidContractor {
            inner,
            slicer,
            scope,
        }
    }

    fn select(&self, b: &IntervalBox) -> Option<Variable> {
        let mut best: Option<(f64, Variable)> = None;
        for v in self.scope.iter() {
            if !b.is_splittable(v) {
                continue;
            }
            let w = b.get(v).width();
            if best.as_ref().map(|(bw, _)| w > *bw).unwrap_or(true) {
                best = Some((w, v.clone()));
            }
        }
        best.map(|(_, v)| v)
    }
}

impl Contractor for MaxCidContractor {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        let v = match self.select(b) {
            Some(v) => v,
            None => return self.inner.contract(b),
        };

        let slices = self.slicer.apply(b.get(&v));
        if slices.len() <= 1 {
            return self.inner.contract(b);
        }

        let init = b.clone();
        let mut proof = Proof::Empty;

        for s in slices {
            let mut slice_box = init.clone();
            slice_box.set(&v, s);
            let certif = self.inner.contract(&mut slice_box);
            if certif == Proof::Empty {
                continue;
            }
            if proof == Proof::Empty {
                b.set_on_scope(&slice_box, &self.scope);
                proof = certif;
            } else {
                b.hull_on_scope(&slice_box, &self.scope);
                proof = proof.min(certif);
            }
        }

        proof
    }

    fn name(&self) -> String {
        format!("max-CID over [{}]", self.inner.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contractor::Hc4Contractor;
    use crate::split::Partitioner;
    use ibis_core::term::sqr;
    use ibis_core::{Constraint, Dag, Interval, Problem, Term};
    use std::rc::Rc;

    fn circle() -> (Problem, Variable, Variable, Rc<Dag>) {
        let mut p = Problem::new("t");
        let x = p.add_real_var(-2.0, 2.0, "x").unwrap();
        let y = p.add_real_var(-2.0, 2.0, "y").unwrap();
        let t = sqr(Term::var(&x)) + sqr(Term::var(&y)) - Term::from(1.0);
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(t, Term::from(0.0)));
        (p, x, y, Rc::new(dag))
    }

    #[test]
    fn test_at_least_as_strong_as_inner() {
        let (p, x, y, dag) = circle();
        let mut plain = Hc4Contractor::new(dag.clone(), 0).unwrap();
        let mut cid = MaxCidContractor::new(
            Box::new(Hc4Contractor::new(dag, 0).unwrap()),
            Box::new(Partitioner::new(4).unwrap()),
        );

        let mut b1 = p.initial_box();
        plain.contract(&mut b1);
        let mut b2 = p.initial_box();
        let proof = cid.contract(&mut b2);

        assert_ne!(proof, Proof::Empty);
        assert!(b1.get(&x).contains_interval(&b2.get(&x)));
        assert!(b1.get(&y).contains_interval(&b2.get(&y)));
    }

    #[test]
    fn test_all_slices_infeasible() {
        let (p, x, _, dag) = circle();
        let mut cid = MaxCidContractor::new(
            Box::new(Hc4Contractor::new(dag, 0).unwrap()),
            Box::new(Partitioner::new(3).unwrap()),
        );
        let mut b = p.initial_box();
        b.set(&x, Interval::new(1.5, 2.0));
        // x^2 >= 2.25 > 1 - y^2 for every slice.
        assert_eq!(cid.contract(&mut b), Proof::Empty);
    }
}
