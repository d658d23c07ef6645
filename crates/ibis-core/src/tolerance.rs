//! Width tolerances used to stop nested interval sequences.
//!
//! A [`Tolerance`] is either absolute or relative. It answers three
//! questions: is an interval tight enough ([`Tolerance::has_tolerance`]),
//! did a contraction reduce a domain enough to be worth propagating
//! ([`Tolerance::is_improved`]), and what is the widest interval with a
//! given right bound that is still tight enough
//! ([`Tolerance::max_interval_dn`]).

use crate::error::{IbisError, IbisResult};
use crate::interval::Interval;
use crate::round::sub_down;
use serde::{Deserialize, Serialize};

/// Kind of a tolerance magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TolKind {
    /// Plain width test.
    Abs,
    /// Width test inside `[-1, 1]`, relative width outside.
    Rel,
}

/// An absolute or relative width tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    val: f64,
    kind: TolKind,
}

impl Tolerance {
    /// Absolute tolerance; negative magnitudes are rejected.
    pub fn abs(val: f64) -> IbisResult<Self> {
        Self::checked(val, TolKind::Abs)
    }

    /// Relative tolerance; negative magnitudes are rejected.
    pub fn rel(val: f64) -> IbisResult<Self> {
        Self::checked(val, TolKind::Rel)
    }

    fn checked(val: f64, kind: TolKind) -> IbisResult<Self> {
        if !val.is_finite() || val < 0.0 {
            return Err(IbisError::OutOfDomain(format!("bad tolerance {val}")));
        }
        Ok(Tolerance { val, kind })
    }

    // Known-good literals used for defaults.
    pub(crate) fn unchecked(val: f64, kind: TolKind) -> Self {
        Tolerance { val, kind }
    }

    pub fn val(&self) -> f64 {
        self.val
    }

    pub fn kind(&self) -> TolKind {
        self.kind
    }

    /// True when `x` is tight with respect to this tolerance. The empty set
    /// never is; a canonical interval always is.
    pub fn has_tolerance(&self, x: &Interval) -> bool {
        if x.is_empty() {
            false
        } else if x.is_canonical() {
            true
        } else {
            let w = match self.kind {
                TolKind::Abs => x.width(),
                TolKind::Rel => {
                    if Interval::minus_one_plus_one().contains_interval(x) {
                        x.width()
                    } else {
                        x.rel_width()
                    }
                }
            };
            w <= self.val
        }
    }

    /// True when the contraction from `prev` to `curr` is strong enough to
    /// re-propagate. An unbounded side becoming bounded always is.
    pub fn is_improved(&self, prev: &Interval, curr: &Interval) -> bool {
        if prev.is_empty() || curr.is_empty() || prev.is_set_eq(curr) {
            return curr.is_empty() && !prev.is_empty();
        }
        if !prev.contains_interval(curr) {
            return false;
        }
        if (prev.is_inf_left() && !curr.is_inf_left())
            || (prev.is_inf_right() && !curr.is_inf_right())
        {
            return true;
        }
        let wp = prev.width();
        let wc = curr.width();
        if wp == 0.0 || !wp.is_finite() {
            return false;
        }
        match self.kind {
            TolKind::Abs => wp - wc > self.val,
            TolKind::Rel => 1.0 - wc / wp > self.val,
        }
    }

    /// The widest interval with right bound `u` that has this tolerance.
    pub fn max_interval_dn(&self, u: f64) -> Interval {
        if !u.is_finite() {
            return Interval::less_than(u);
        }
        let margin = match self.kind {
            TolKind::Abs => self.val,
            TolKind::Rel => {
                if u.abs() <= 1.0 {
                    self.val
                } else {
                    self.val * u.abs()
                }
            }
        };
        Interval::new(sub_down(u, margin), u)
    }
}

impl Default for Tolerance {
    /// The default output tolerance of real variables: relative 1e-8.
    fn default() -> Self {
        Tolerance::unchecked(1e-8, TolKind::Rel)
    }
}

impl std::fmt::Display for Tolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TolKind::Abs => write!(f, "{} abs", self.val),
            TolKind::Rel => write!(f, "{} rel", self.val),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative_magnitude() {
        assert!(Tolerance::abs(-1.0).is_err());
        assert!(Tolerance::rel(f64::NAN).is_err());
        assert!(Tolerance::abs(0.0).is_ok());
    }

    #[test]
    fn test_has_tolerance() {
        let tol = Tolerance::abs(0.5).unwrap();
        assert!(tol.has_tolerance(&Interval::new(1.0, 1.25)));
        assert!(!tol.has_tolerance(&Interval::new(1.0, 2.0)));
        assert!(!tol.has_tolerance(&Interval::empty()));

        let rel = Tolerance::rel(1e-3).unwrap();
        // Inside [-1, 1] the plain width is tested.
        assert!(rel.has_tolerance(&Interval::new(0.5, 0.5005)));
        // Outside, the relative width.
        assert!(rel.has_tolerance(&Interval::new(1000.0, 1000.5)));
        assert!(!rel.has_tolerance(&Interval::new(1000.0, 1010.0)));
    }

    #[test]
    fn test_is_improved() {
        let tol = Tolerance::rel(0.1).unwrap();
        let prev = Interval::new(0.0, 10.0);
        assert!(tol.is_improved(&prev, &Interval::new(0.0, 5.0)));
        assert!(!tol.is_improved(&prev, &Interval::new(0.0, 9.5)));
        assert!(!tol.is_improved(&prev, &prev));
        assert!(tol.is_improved(&Interval::less_than(5.0), &Interval::new(0.0, 5.0)));
    }

    #[test]
    fn test_max_interval_dn() {
        let tol = Tolerance::abs(0.5).unwrap();
        let x = tol.max_interval_dn(2.0);
        assert_eq!(x.right(), 2.0);
        assert!(x.left() <= 1.5 && x.left() > 1.4);
        assert!(tol.has_tolerance(&x));
    }
}
