//! HC4 contractor: forward-backward projection over one DAG function.

use super::Contractor;
use ibis_core::{Dag, FunId, IbisError, IbisResult, IntervalBox, Proof, Scope};
use std::rc::Rc;

/// Contractor applying [`Dag::hc4_revise`] to one function of a DAG.
///
/// The contractor holds a non-owning handle on the DAG; the DAG never
/// references contractors back.
pub struct Hc4Contractor {
    dag: Rc<Dag>,
    fun: FunId,
    scope: Scope,
}

impl Hc4Contractor {
    pub fn new(dag: Rc<Dag>, fun: FunId) -> IbisResult<Self> {
        if fun >= dag.nb_funs() {
            return Err(IbisError::Structure(format!(
                "HC4 contractor created with a bad function index {fun}"
            )));
        }
        let scope = dag.fun(fun).scope().clone();
        Ok(Hc4Contractor { dag, fun, scope })
    }

    pub fn fun_index(&self) -> FunId {
        self.fun
    }

    pub fn dag(&self) -> &Rc<Dag> {
        &self.dag
    }
}

impl Contractor for Hc4Contractor {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        self.dag.hc4_revise(self.fun, b)
    }

    fn name(&self) -> String {
        format!("HC4 contractor @ {}", self.fun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::term::sqr;
    use ibis_core::{Constraint, Interval, Problem, Term};

    #[test]
    fn test_bad_function_index() {
        let dag = Rc::new(Dag::new());
        assert!(Hc4Contractor::new(dag, 0).is_err());
    }

    #[test]
    fn test_contract_equation() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(-10.0, 10.0, "x").unwrap();
        let mut dag = Dag::new();
        // x^2 = 4
        dag.insert(&Constraint::eq(sqr(Term::var(&x)), Term::from(4.0)));
        let dag = Rc::new(dag);
        let mut c = Hc4Contractor::new(dag, 0).unwrap();
        let mut b = p.initial_box();
        assert_eq!(c.contract(&mut b), Proof::Maybe);
        assert!(b.get(&x).is_set_eq(&Interval::new(-2.0, 2.0)));
    }
}
