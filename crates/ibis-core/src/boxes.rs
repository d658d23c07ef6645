//! Interval boxes: one interval domain per variable of a scope.
//!
//! A box addresses its components through the scope's compact index map,
//! so all per-variable access is O(1) after one hash lookup. A box is
//! empty as soon as any component is empty.

use crate::interval::Interval;
use crate::scope::Scope;
use crate::variable::Variable;

/// Assignment of one interval to every variable of a scope.
#[derive(Debug, Clone)]
pub struct IntervalBox {
    scope: Scope,
    doms: Vec<Interval>,
}

impl IntervalBox {
    /// A box over `scope` initialized with the variables' declared domains.
    pub fn new(scope: Scope) -> Self {
        let doms = scope.iter().map(|v| v.domain()).collect();
        IntervalBox { scope, doms }
    }

    /// A box over `scope` with every component set to `x`.
    pub fn filled(scope: Scope, x: Interval) -> Self {
        let doms = vec![x; scope.size()];
        IntervalBox { scope, doms }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn size(&self) -> usize {
        self.doms.len()
    }

    fn pos(&self, v: &Variable) -> usize {
        debug_assert!(self.scope.contains(v), "variable {v} not in box scope");
        self.scope
            .index_of(v)
            .expect("variable not in the box scope")
    }

    pub fn get(&self, v: &Variable) -> Interval {
        self.doms[self.pos(v)]
    }

    pub fn set(&mut self, v: &Variable, x: Interval) {
        let p = self.pos(v);
        self.doms[p] = x;
    }

    pub fn get_at(&self, pos: usize) -> Interval {
        self.doms[pos]
    }

    pub fn set_at(&mut self, pos: usize, x: Interval) {
        self.doms[pos] = x;
    }

    /// True iff any component is empty.
    pub fn is_empty(&self) -> bool {
        self.doms.iter().any(|x| x.is_empty())
    }

    /// Componentwise intersection with `other` (same scope).
    pub fn inter_assign(&mut self, other: &IntervalBox) {
        debug_assert_eq!(self.scope, other.scope);
        for (a, b) in self.doms.iter_mut().zip(other.doms.iter()) {
            *a = a.inter(b);
        }
    }

    /// Componentwise hull with `other` (same scope).
    pub fn hull_assign(&mut self, other: &IntervalBox) {
        debug_assert_eq!(self.scope, other.scope);
        for (a, b) in self.doms.iter_mut().zip(other.doms.iter()) {
            *a = a.hull(b);
        }
    }

    /// Copies the components of `scope` from `other` into this box.
    pub fn set_on_scope(&mut self, other: &IntervalBox, scope: &Scope) {
        for v in scope.iter() {
            self.set(v, other.get(v));
        }
    }

    /// Hulls the components of `scope` from `other` into this box.
    pub fn hull_on_scope(&mut self, other: &IntervalBox, scope: &Scope) {
        for v in scope.iter() {
            let h = self.get(v).hull(&other.get(v));
            self.set(v, h);
        }
    }

    pub fn contains(&self, other: &IntervalBox) -> bool {
        debug_assert_eq!(self.scope, other.scope);
        self.doms
            .iter()
            .zip(other.doms.iter())
            .all(|(a, b)| a.contains_interval(b))
    }

    pub fn strictly_contains(&self, other: &IntervalBox) -> bool {
        debug_assert_eq!(self.scope, other.scope);
        self.doms
            .iter()
            .zip(other.doms.iter())
            .all(|(a, b)| a.strictly_contains_interval(b))
    }

    /// Largest component width.
    pub fn width(&self) -> f64 {
        self.doms.iter().map(|x| x.width()).fold(0.0, f64::max)
    }

    /// Sum of the component widths.
    pub fn perimeter(&self) -> f64 {
        self.doms.iter().map(|x| x.width()).sum()
    }

    /// Perimeter counted in per-variable tolerance cells.
    pub fn grid_perimeter(&self) -> f64 {
        let mut p = 0.0;
        for (pos, v) in self.scope.iter().enumerate() {
            let w = self.doms[pos].width();
            let cell = v.tolerance().val().max(f64::MIN_POSITIVE);
            p += if w <= cell { 1.0 } else { w / cell };
        }
        p
    }

    /// Hausdorff distance: the largest componentwise distance.
    pub fn distance(&self, other: &IntervalBox) -> f64 {
        debug_assert_eq!(self.scope, other.scope);
        self.doms
            .iter()
            .zip(other.doms.iter())
            .map(|(a, b)| a.distance(b))
            .fold(0.0, f64::max)
    }

    /// True when the domain of `v` is worth splitting: wider than the
    /// variable's output tolerance and not canonical; a discrete domain
    /// must hold more than one integer.
    pub fn is_splittable(&self, v: &Variable) -> bool {
        let x = self.get(v);
        if x.is_empty() {
            return false;
        }
        if v.is_discrete() {
            let r = x.round();
            return !r.is_empty() && r.width() >= 1.0;
        }
        !v.tolerance().has_tolerance(&x)
    }

    pub fn midpoint(&self) -> RealPoint {
        let vals = self.doms.iter().map(|x| x.midpoint()).collect();
        RealPoint {
            scope: self.scope.clone(),
            vals,
        }
    }

    /// Corner selected by one bit per component: `true` picks the right
    /// bound, `false` the left.
    pub fn corner(&self, bits: &[bool]) -> RealPoint {
        debug_assert_eq!(bits.len(), self.doms.len());
        let vals = self
            .doms
            .iter()
            .zip(bits.iter())
            .map(|(x, hi)| if *hi { x.right() } else { x.left() })
            .collect();
        RealPoint {
            scope: self.scope.clone(),
            vals,
        }
    }

    /// Restriction of this box to a subscope.
    pub fn restrict(&self, scope: &Scope) -> IntervalBox {
        let doms = scope.iter().map(|v| self.get(v)).collect();
        IntervalBox {
            scope: scope.clone(),
            doms,
        }
    }
}

impl std::fmt::Display for IntervalBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (pos, v) in self.scope.iter().enumerate() {
            if pos > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", v.name(), self.doms[pos])?;
        }
        write!(f, ")")
    }
}

/// Assignment of one real value per variable of a scope.
#[derive(Debug, Clone)]
pub struct RealPoint {
    scope: Scope,
    vals: Vec<f64>,
}

impl RealPoint {
    pub fn new(scope: Scope, vals: Vec<f64>) -> Self {
        debug_assert_eq!(scope.size(), vals.len());
        RealPoint { scope, vals }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn get(&self, v: &Variable) -> f64 {
        self.vals[self
            .scope
            .index_of(v)
            .expect("variable not in the point scope")]
    }

    pub fn set(&mut self, v: &Variable, a: f64) {
        let p = self
            .scope
            .index_of(v)
            .expect("variable not in the point scope");
        self.vals[p] = a;
    }

    pub fn values(&self) -> &[f64] {
        &self.vals
    }

    /// The degenerate box `[p, p]`.
    pub fn to_box(&self) -> IntervalBox {
        let doms = self.vals.iter().map(|a| Interval::singleton(*a)).collect();
        IntervalBox {
            scope: self.scope.clone(),
            doms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tolerance::{TolKind, Tolerance};
    use crate::variable::VarKind;

    fn var(id: usize, lo: f64, hi: f64) -> Variable {
        Variable::new(
            id,
            format!("x{id}"),
            Interval::new(lo, hi),
            VarKind::Real,
            Tolerance::unchecked(1e-8, TolKind::Rel),
        )
    }

    fn sample() -> (Variable, Variable, IntervalBox) {
        let x = var(0, 0.0, 4.0);
        let y = var(1, -1.0, 1.0);
        let b = IntervalBox::new(Scope::from_vars([x.clone(), y.clone()]));
        (x, y, b)
    }

    #[test]
    fn test_new_uses_declared_domains() {
        let (x, y, b) = sample();
        assert!(b.get(&x).is_set_eq(&Interval::new(0.0, 4.0)));
        assert!(b.get(&y).is_set_eq(&Interval::new(-1.0, 1.0)));
        assert!(!b.is_empty());
    }

    #[test]
    fn test_empty_when_any_component_empty() {
        let (x, _, mut b) = sample();
        b.set(&x, Interval::empty());
        assert!(b.is_empty());
    }

    #[test]
    fn test_widths_and_distance() {
        let (x, _, b) = sample();
        assert_eq!(b.width(), 4.0);
        assert_eq!(b.perimeter(), 6.0);
        let mut c = b.clone();
        c.set(&x, Interval::new(1.0, 4.0));
        assert_eq!(b.distance(&c), 1.0);
    }

    #[test]
    fn test_hull_and_inter() {
        let (x, _, b) = sample();
        let mut c = b.clone();
        c.set(&x, Interval::new(2.0, 6.0));
        let mut h = b.clone();
        h.hull_assign(&c);
        assert!(h.get(&x).is_set_eq(&Interval::new(0.0, 6.0)));
        let mut i = b.clone();
        i.inter_assign(&c);
        assert!(i.get(&x).is_set_eq(&Interval::new(2.0, 4.0)));
    }

    #[test]
    fn test_corner_and_midpoint() {
        let (x, y, b) = sample();
        let m = b.midpoint();
        assert_eq!(m.get(&x), 2.0);
        assert_eq!(m.get(&y), 0.0);
        let c = b.corner(&[true, false]);
        assert_eq!(c.get(&x), 4.0);
        assert_eq!(c.get(&y), -1.0);
    }

    #[test]
    fn test_splittable() {
        let (x, _, b) = sample();
        assert!(b.is_splittable(&x));
        let i = Variable::new(
            2,
            "i",
            Interval::new(1.2, 2.9),
            VarKind::Integer,
            Tolerance::unchecked(0.0, TolKind::Abs),
        );
        let bi = IntervalBox::new(Scope::from_vars([i.clone()]));
        // A single integer fits: nothing to split.
        assert!(!bi.is_splittable(&i));
        let j = Variable::new(
            3,
            "j",
            Interval::new(0.0, 5.0),
            VarKind::Integer,
            Tolerance::unchecked(0.0, TolKind::Abs),
        );
        let bj = IntervalBox::new(Scope::from_vars([j.clone()]));
        assert!(bj.is_splittable(&j));
    }
}
