//! List contractor: a fixed left-to-right sequence of child contractors.

use super::Contractor;
use ibis_core::{IntervalBox, Proof, Scope, ScopeBank};

/// Applies its children in order, short-circuiting on `Empty`.
#[derive(Default)]
pub struct ListContractor {
    ops: Vec<Box<dyn Contractor>>,
    scope: Scope,
}

impl ListContractor {
    pub fn new() -> Self {
        ListContractor::default()
    }

    pub fn push(&mut self, op: Box<dyn Contractor>) {
        self.scope = ScopeBank::intern(self.scope.union(op.scope()));
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Contractor for ListContractor {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        for op in self.ops.iter_mut() {
            if op.contract(b) == Proof::Empty {
                return Proof::Empty;
            }
        }
        Proof::Maybe
    }

    fn name(&self) -> String {
        format!("list of {} contractors", self.ops.len())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Halver;
    use super::*;
    use ibis_core::{Interval, Problem};

    #[test]
    fn test_applies_in_order() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.0, 8.0, "x").unwrap();
        let mut list = ListContractor::new();
        list.push(Box::new(Halver::new(x.clone())));
        list.push(Box::new(Halver::new(x.clone())));
        let mut b = p.initial_box();
        assert_eq!(list.contract(&mut b), Proof::Maybe);
        assert!(b.get(&x).is_set_eq(&Interval::new(0.0, 2.0)));
        assert_eq!(list.scope().size(), 1);
    }
}
