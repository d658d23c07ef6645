//! Integrality contractor for discrete variables.

use super::Contractor;
use ibis_core::{IbisError, IbisResult, IntervalBox, Proof, Scope, ScopeBank, Variable};

/// Intersects the domain of each registered discrete variable with its
/// integral rounding `[ceil(lo), floor(hi)]`.
#[derive(Default)]
pub struct IntContractor {
    scope: Scope,
}

impl IntContractor {
    pub fn new() -> Self {
        IntContractor::default()
    }

    /// Registers a discrete variable.
    pub fn insert(&mut self, v: &Variable) -> IbisResult<()> {
        if !v.is_discrete() {
            return Err(IbisError::Structure(format!(
                "not an integer variable: {}",
                v.name()
            )));
        }
        self.scope.insert(v);
        self.scope = ScopeBank::intern(self.scope.clone());
        Ok(())
    }

    pub fn nb_vars(&self) -> usize {
        self.scope.size()
    }
}

impl Contractor for IntContractor {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        for v in self.scope.iter() {
            let rnd = b.get(v).round();
            if rnd.is_empty() {
                return Proof::Empty;
            }
            b.set(v, rnd);
        }
        Proof::Maybe
    }

    fn name(&self) -> String {
        let names: Vec<&str> = self.scope.iter().map(|v| v.name()).collect();
        format!("integral: {}", names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::{Interval, Problem};

    #[test]
    fn test_rounds_to_integral_bounds() {
        let mut p = Problem::new("t");
        let i = p.add_int_var(0, 10, "i").unwrap();
        let mut c = IntContractor::new();
        c.insert(&i).unwrap();
        let mut b = p.initial_box();
        b.set(&i, Interval::new(1.5, 4.3));
        assert_eq!(c.contract(&mut b), Proof::Maybe);
        assert!(b.get(&i).is_set_eq(&Interval::new(2.0, 4.0)));
    }

    #[test]
    fn test_empty_when_no_integer() {
        let mut p = Problem::new("t");
        let i = p.add_int_var(0, 10, "i").unwrap();
        let mut c = IntContractor::new();
        c.insert(&i).unwrap();
        let mut b = p.initial_box();
        b.set(&i, Interval::new(1.5, 1.8));
        assert_eq!(c.contract(&mut b), Proof::Empty);
    }

    #[test]
    fn test_rejects_continuous_variable() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.0, 1.0, "x").unwrap();
        let mut c = IntContractor::new();
        assert!(c.insert(&x).is_err());
    }
}
