//! Search nodes.

use ibis_core::{IntervalBox, Proof, Variable};
use std::cell::RefCell;
use std::rc::Rc;

/// A CSP search node: a box plus its bookkeeping.
#[derive(Debug)]
pub struct CspNode {
    boxx: IntervalBox,
    depth: u32,
    index: u64,
    parent: Option<u64>,
    proof: Proof,
    // Variable split to create this node; round-robin selection resumes
    // after it.
    last_split: Option<Variable>,
}

/// Nodes are shared between the pending space, the split output and the
/// solution set.
pub type SharedCspNode = Rc<RefCell<CspNode>>;

impl CspNode {
    pub fn new(boxx: IntervalBox) -> Self {
        CspNode {
            boxx,
            depth: 0,
            index: 0,
            parent: None,
            proof: Proof::Maybe,
            last_split: None,
        }
    }

    pub fn shared(boxx: IntervalBox) -> SharedCspNode {
        Rc::new(RefCell::new(CspNode::new(boxx)))
    }

    /// Child of this node with the domain of `v` replaced by `slice`.
    pub fn child(&self, v: &Variable, slice: ibis_core::Interval, index: u64) -> CspNode {
        let mut boxx = self.boxx.clone();
        boxx.set(v, slice);
        CspNode {
            boxx,
            depth: self.depth + 1,
            index,
            parent: Some(self.index),
            proof: Proof::Maybe,
            last_split: Some(v.clone()),
        }
    }

    pub fn boxx(&self) -> &IntervalBox {
        &self.boxx
    }

    pub fn boxx_mut(&mut self) -> &mut IntervalBox {
        &mut self.boxx
    }

    pub fn set_boxx(&mut self, b: IntervalBox) {
        self.boxx = b;
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn set_index(&mut self, i: u64) {
        self.index = i;
    }

    pub fn parent(&self) -> Option<u64> {
        self.parent
    }

    pub fn proof(&self) -> Proof {
        self.proof
    }

    pub fn set_proof(&mut self, p: Proof) {
        self.proof = p;
    }

    pub fn last_split(&self) -> Option<&Variable> {
        self.last_split.as_ref()
    }
}

/// A branch-and-bound node: a CSP node extended with objective bounds.
#[derive(Debug)]
pub struct BcopNode {
    inner: CspNode,
    lower: f64,
    upper: f64,
}

pub type SharedBcopNode = Rc<RefCell<BcopNode>>;

impl BcopNode {
    pub fn new(boxx: IntervalBox) -> Self {
        BcopNode {
            inner: CspNode::new(boxx),
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    pub fn shared(boxx: IntervalBox) -> SharedBcopNode {
        Rc::new(RefCell::new(BcopNode::new(boxx)))
    }

    pub fn child(&self, v: &Variable, slice: ibis_core::Interval, index: u64) -> BcopNode {
        BcopNode {
            inner: self.inner.child(v, slice, index),
            lower: self.lower,
            upper: self.upper,
        }
    }

    pub fn node(&self) -> &CspNode {
        &self.inner
    }

    pub fn node_mut(&mut self) -> &mut CspNode {
        &mut self.inner
    }

    pub fn boxx(&self) -> &IntervalBox {
        self.inner.boxx()
    }

    pub fn boxx_mut(&mut self) -> &mut IntervalBox {
        self.inner.boxx_mut()
    }

    /// Lower bound on the objective within this node.
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Raises the lower bound (bounds only tighten).
    pub fn set_lower(&mut self, l: f64) {
        if l > self.lower {
            self.lower = l;
        }
    }

    /// Upper bound on the objective within this node.
    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn set_upper(&mut self, u: f64) {
        if u < self.upper {
            self.upper = u;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::{Interval, Problem};

    #[test]
    fn test_child_bookkeeping() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.0, 4.0, "x").unwrap();
        let mut n = CspNode::new(p.initial_box());
        n.set_index(7);
        let c = n.child(&x, Interval::new(0.0, 2.0), 8);
        assert_eq!(c.depth(), 1);
        assert_eq!(c.index(), 8);
        assert_eq!(c.parent(), Some(7));
        assert_eq!(c.last_split(), Some(&x));
        assert!(c.boxx().get(&x).is_set_eq(&Interval::new(0.0, 2.0)));
        // The parent box is untouched.
        assert!(n.boxx().get(&x).is_set_eq(&Interval::new(0.0, 4.0)));
    }

    #[test]
    fn test_bcop_bounds_only_tighten() {
        let mut p = Problem::new("t");
        p.add_real_var(0.0, 4.0, "x").unwrap();
        let mut n = BcopNode::new(p.initial_box());
        n.set_lower(1.0);
        n.set_lower(0.5);
        assert_eq!(n.lower(), 1.0);
        n.set_upper(3.0);
        n.set_upper(5.0);
        assert_eq!(n.upper(), 3.0);
    }
}
