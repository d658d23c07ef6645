//! BC4 contractor: HC4 followed by BC3 on multiple-occurrence variables.

use super::{Bc3Contractor, Contractor, Hc4Contractor};
use ibis_core::{Dag, FunId, IbisResult, IntervalBox, Proof, Scope};
use std::rc::Rc;

/// For one function, first applies HC4-Revise; when that is inconclusive,
/// refines each variable occurring more than once in the function's
/// syntactic tree with BC3 (single-occurrence variables are already at
/// their best domain after HC4).
pub struct Bc4Contractor {
    hc4: Hc4Contractor,
    bc3: Vec<Bc3Contractor>,
    scope: Scope,
}

impl Bc4Contractor {
    pub fn new(dag: Rc<Dag>, fun: FunId) -> IbisResult<Self> {
        Self::with_settings(dag, fun, 2.0, 30, crate::newton::IntervalNewton::default())
    }

    /// BC4 with explicit BC3 peel factor, step cap and Newton operator.
    pub fn with_settings(
        dag: Rc<Dag>,
        fun: FunId,
        peel_factor: f64,
        max_steps: usize,
        newton: crate::newton::IntervalNewton,
    ) -> IbisResult<Self> {
        let hc4 = Hc4Contractor::new(dag.clone(), fun)?;
        let scope = dag.fun(fun).scope().clone();
        let mut bc3 = Vec::new();
        for v in scope.iter() {
            if scope.count(v) > 1 {
                bc3.push(Bc3Contractor::with_settings(
                    dag.clone(),
                    fun,
                    v.clone(),
                    peel_factor,
                    max_steps,
                    newton.clone(),
                )?);
            }
        }
        Ok(Bc4Contractor { hc4, bc3, scope })
    }
}

impl Contractor for Bc4Contractor {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        let mut proof = self.hc4.contract(b);
        if proof != Proof::Maybe {
            return proof;
        }
        for c in self.bc3.iter_mut() {
            let certif = c.contract(b);
            if certif == Proof::Empty {
                return Proof::Empty;
            }
            proof = proof.max(certif);
        }
        proof
    }

    fn name(&self) -> String {
        format!("BC4 contractor @ {}", self.hc4.fun_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::term::sqr;
    use ibis_core::{Constraint, Dag, Interval, Problem, Term};

    #[test]
    fn test_bc3_only_on_multiple_occurrences() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(-10.0, 10.0, "x").unwrap();
        let y = p.add_real_var(-10.0, 10.0, "y").unwrap();
        // x occurs twice, y once: x^2 + x + y = 0
        let t = sqr(Term::var(&x)) + Term::var(&x) + Term::var(&y);
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(t, Term::from(0.0)));
        let c = Bc4Contractor::new(Rc::new(dag), 0).unwrap();
        assert_eq!(c.bc3.len(), 1);
        assert_eq!(c.bc3[0].var(), &x);
    }

    #[test]
    fn test_contract_tightens_multiple_occurrence_variable() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(1.0, 10.0, "x").unwrap();
        // x^2 - x - 2 = 0 has the root x = 2 in [1, 10].
        let t = sqr(Term::var(&x)) - Term::var(&x) - Term::from(2.0);
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(t, Term::from(0.0)));
        let mut c = Bc4Contractor::new(Rc::new(dag), 0).unwrap();
        let mut b = p.initial_box();
        let proof = c.contract(&mut b);
        assert_ne!(proof, Proof::Empty);
        assert!(b.get(&x).contains(2.0));
        assert!(b.get(&x).width() < 9.0);
    }

    #[test]
    fn test_empty_propagates() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(5.0, 10.0, "x").unwrap();
        let t = sqr(Term::var(&x)) - Term::var(&x) - Term::from(2.0);
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(t, Term::from(0.0)));
        let mut c = Bc4Contractor::new(Rc::new(dag), 0).unwrap();
        let mut b = p.initial_box();
        b.set(&x, Interval::new(5.0, 10.0));
        assert_eq!(c.contract(&mut b), Proof::Empty);
    }
}
