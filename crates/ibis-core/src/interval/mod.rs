//! Intervals bounded by floats in double precision.
//!
//! An [`Interval`] is a closed connected subset of the extended reals, or
//! the empty set. Every arithmetic operation is outward-rounded: the result
//! encloses the exact real image of the operands (see [`crate::round`] for
//! the rounding policy). The empty set absorbs all operations.
//!
//! Inverse projections for the elementary operations live in [`proj`].

pub mod proj;

use crate::round::{
    add_down, add_up, div_down, div_up, mul_down, mul_up, sqrt_down, sqrt_up, sub_down, sub_up,
    widen_down, widen_up,
};
use serde::{Deserialize, Serialize};

/// A closed interval `[lo, hi]` over the extended reals, or the empty set.
///
/// The empty set is encoded with NaN bounds; use [`Interval::is_empty`]
/// rather than inspecting bounds directly.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    /// Creates `[lo, hi]`; an invalid pair (NaN bound, `lo > hi`, or a
    /// bound pinned at the wrong infinity) yields the empty set.
    pub fn new(lo: f64, hi: f64) -> Self {
        if lo.is_nan() || hi.is_nan() || lo > hi || lo == f64::INFINITY || hi == f64::NEG_INFINITY
        {
            Self::empty()
        } else {
            Interval { lo, hi }
        }
    }

    /// The degenerate interval `[a, a]`.
    pub fn singleton(a: f64) -> Self {
        Self::new(a, a)
    }

    /// The empty set.
    pub fn empty() -> Self {
        Interval {
            lo: f64::NAN,
            hi: f64::NAN,
        }
    }

    /// `(-oo, a]`.
    pub fn less_than(a: f64) -> Self {
        Self::new(f64::NEG_INFINITY, a)
    }

    /// `[a, +oo)`.
    pub fn more_than(a: f64) -> Self {
        Self::new(a, f64::INFINITY)
    }

    pub fn universe() -> Self {
        Interval {
            lo: f64::NEG_INFINITY,
            hi: f64::INFINITY,
        }
    }

    pub fn positive() -> Self {
        Interval {
            lo: 0.0,
            hi: f64::INFINITY,
        }
    }

    pub fn negative() -> Self {
        Interval {
            lo: f64::NEG_INFINITY,
            hi: 0.0,
        }
    }

    pub fn zero() -> Self {
        Interval { lo: 0.0, hi: 0.0 }
    }

    pub fn one() -> Self {
        Interval { lo: 1.0, hi: 1.0 }
    }

    pub fn minus_one() -> Self {
        Interval { lo: -1.0, hi: -1.0 }
    }

    pub fn minus_one_plus_one() -> Self {
        Interval { lo: -1.0, hi: 1.0 }
    }

    pub fn minus_one_zero() -> Self {
        Interval { lo: -1.0, hi: 0.0 }
    }

    pub fn zero_plus_one() -> Self {
        Interval { lo: 0.0, hi: 1.0 }
    }

    /// A genuine enclosure of pi.
    pub fn pi() -> Self {
        Interval {
            lo: widen_down(std::f64::consts::PI),
            hi: widen_up(std::f64::consts::PI),
        }
    }

    pub fn half_pi() -> Self {
        Interval {
            lo: widen_down(std::f64::consts::FRAC_PI_2),
            hi: widen_up(std::f64::consts::FRAC_PI_2),
        }
    }

    pub fn two_pi() -> Self {
        let pi = Self::pi();
        Interval {
            lo: add_down(pi.lo, pi.lo),
            hi: add_up(pi.hi, pi.hi),
        }
    }

    pub fn minus_pi_plus_pi() -> Self {
        let pi = Self::pi();
        Interval {
            lo: -pi.hi,
            hi: pi.hi,
        }
    }

    pub fn zero_two_pi() -> Self {
        let tp = Self::two_pi();
        Interval { lo: 0.0, hi: tp.hi }
    }

    // ---- accessors -------------------------------------------------------

    pub fn left(&self) -> f64 {
        self.lo
    }

    pub fn right(&self) -> f64 {
        self.hi
    }

    /// Width `hi - lo`, rounded upward; 0 for the empty set.
    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else if self.lo == self.hi {
            0.0
        } else {
            sub_up(self.hi, self.lo)
        }
    }

    pub fn radius(&self) -> f64 {
        0.5 * self.width()
    }

    /// Width divided by the magnitude, used to gauge tightness of intervals
    /// far from the origin.
    pub fn rel_width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            let m = self.mag();
            if m == 0.0 || m.is_infinite() {
                self.width()
            } else {
                self.width() / m
            }
        }
    }

    /// A finite midpoint: NaN for the empty set, 0 for the universe, and
    /// the nearest finite float on a half-unbounded side.
    pub fn midpoint(&self) -> f64 {
        if self.is_empty() {
            f64::NAN
        } else if self.is_inf_left() {
            if self.is_inf_right() {
                0.0
            } else {
                f64::MIN
            }
        } else if self.is_inf_right() {
            f64::MAX
        } else {
            let m = 0.5 * self.lo + 0.5 * self.hi;
            m.clamp(self.lo, self.hi)
        }
    }

    /// Mignitude: the smallest absolute value in the interval.
    pub fn mig(&self) -> f64 {
        if self.is_empty() {
            f64::NAN
        } else if self.contains_zero() {
            0.0
        } else {
            self.lo.abs().min(self.hi.abs())
        }
    }

    /// Magnitude: the largest absolute value in the interval.
    pub fn mag(&self) -> f64 {
        if self.is_empty() {
            f64::NAN
        } else {
            self.lo.abs().max(self.hi.abs())
        }
    }

    /// A stable hash of the bound bits (the empty set hashes uniformly).
    pub fn hash_code(&self) -> u64 {
        if self.is_empty() {
            0x5851_f42d_4c95_7f2d
        } else {
            let h = self.lo.to_bits();
            h ^ (self.hi.to_bits() << 1)
        }
    }

    // ---- predicates ------------------------------------------------------

    pub fn is_empty(&self) -> bool {
        self.lo.is_nan()
    }

    /// True when no float lies strictly between the bounds.
    pub fn is_canonical(&self) -> bool {
        !self.is_empty() && (self.lo == self.hi || self.lo.next_up() == self.hi)
    }

    pub fn is_finite(&self) -> bool {
        !self.is_empty() && self.lo.is_finite() && self.hi.is_finite()
    }

    pub fn is_inf(&self) -> bool {
        !self.is_empty() && !self.is_finite()
    }

    pub fn is_inf_left(&self) -> bool {
        self.lo == f64::NEG_INFINITY
    }

    pub fn is_inf_right(&self) -> bool {
        self.hi == f64::INFINITY
    }

    pub fn is_universe(&self) -> bool {
        self.is_inf_left() && self.is_inf_right()
    }

    pub fn is_singleton(&self) -> bool {
        !self.is_empty() && self.lo == self.hi
    }

    pub fn is_zero(&self) -> bool {
        self.lo == 0.0 && self.hi == 0.0
    }

    pub fn contains(&self, a: f64) -> bool {
        !self.is_empty() && self.lo <= a && a <= self.hi
    }

    pub fn strictly_contains(&self, a: f64) -> bool {
        !self.is_empty() && self.lo < a && a < self.hi
    }

    pub fn contains_interval(&self, other: &Interval) -> bool {
        if other.is_empty() {
            return true;
        }
        !self.is_empty() && self.lo <= other.lo && other.hi <= self.hi
    }

    pub fn strictly_contains_interval(&self, other: &Interval) -> bool {
        if other.is_empty() {
            return !self.is_empty();
        }
        !self.is_empty() && self.lo < other.lo && other.hi < self.hi
    }

    pub fn contains_zero(&self) -> bool {
        self.contains(0.0)
    }

    pub fn strictly_contains_zero(&self) -> bool {
        self.strictly_contains(0.0)
    }

    pub fn is_positive(&self) -> bool {
        !self.is_empty() && self.lo >= 0.0
    }

    pub fn is_strictly_positive(&self) -> bool {
        !self.is_empty() && self.lo > 0.0
    }

    pub fn is_negative(&self) -> bool {
        !self.is_empty() && self.hi <= 0.0
    }

    pub fn is_strictly_negative(&self) -> bool {
        !self.is_empty() && self.hi < 0.0
    }

    pub fn is_disjoint(&self, other: &Interval) -> bool {
        self.is_empty() || other.is_empty() || self.hi < other.lo || other.hi < self.lo
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.is_disjoint(other)
    }

    // ---- comparators -----------------------------------------------------

    pub fn is_set_eq(&self, other: &Interval) -> bool {
        (self.is_empty() && other.is_empty())
            || (!self.is_empty() && !other.is_empty() && self.lo == other.lo && self.hi == other.hi)
    }

    pub fn is_set_neq(&self, other: &Interval) -> bool {
        !self.is_set_eq(other)
    }

    pub fn is_certainly_eq(&self, other: &Interval) -> bool {
        self.is_singleton() && other.is_singleton() && self.lo == other.lo
    }

    pub fn is_certainly_neq(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && self.is_disjoint(other)
    }

    pub fn is_certainly_le(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && self.hi <= other.lo
    }

    pub fn is_certainly_lt(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && self.hi < other.lo
    }

    pub fn is_certainly_ge(&self, other: &Interval) -> bool {
        other.is_certainly_le(self)
    }

    pub fn is_certainly_gt(&self, other: &Interval) -> bool {
        other.is_certainly_lt(self)
    }

    pub fn is_possibly_eq(&self, other: &Interval) -> bool {
        self.overlaps(other)
    }

    pub fn is_possibly_neq(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && !self.is_certainly_eq(other)
    }

    pub fn is_possibly_le(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && self.lo <= other.hi
    }

    pub fn is_possibly_lt(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && self.lo < other.hi
    }

    pub fn is_possibly_ge(&self, other: &Interval) -> bool {
        other.is_possibly_le(self)
    }

    pub fn is_possibly_gt(&self, other: &Interval) -> bool {
        other.is_possibly_lt(self)
    }

    pub fn is_certainly_le_zero(&self) -> bool {
        self.is_certainly_le(&Self::zero())
    }

    pub fn is_certainly_lt_zero(&self) -> bool {
        self.is_certainly_lt(&Self::zero())
    }

    pub fn is_certainly_ge_zero(&self) -> bool {
        self.is_certainly_ge(&Self::zero())
    }

    pub fn is_certainly_gt_zero(&self) -> bool {
        self.is_certainly_gt(&Self::zero())
    }

    // ---- set operations --------------------------------------------------

    /// Intersection, possibly empty.
    pub fn inter(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        Interval::new(self.lo.max(other.lo), self.hi.min(other.hi))
    }

    /// Least enclosing interval of the union.
    pub fn hull(&self, other: &Interval) -> Interval {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Interval {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    /// Hausdorff distance between two intervals.
    pub fn distance(&self, other: &Interval) -> f64 {
        if self.is_empty() && other.is_empty() {
            return 0.0;
        }
        if self.is_empty() || other.is_empty() {
            return f64::INFINITY;
        }
        let d = |a: f64, b: f64| -> f64 {
            if a == b {
                0.0
            } else {
                (a - b).abs()
            }
        };
        d(self.lo, other.lo).max(d(self.hi, other.hi))
    }

    /// Rounds to integral bounds: `[ceil(lo), floor(hi)]`, empty when no
    /// integer lies inside.
    pub fn round(&self) -> Interval {
        if self.is_empty() {
            return *self;
        }
        Interval::new(self.lo.ceil(), self.hi.floor())
    }

    /// Midpoint inflation `m + delta*(x - m) + chi*[-1, 1]`.
    ///
    /// Parameter validation is the caller's concern (the `Inflator` rejects
    /// `delta <= 1` and `chi < 0`); empty and unbounded inputs pass through.
    pub fn inflate(&self, delta: f64, chi: f64) -> Interval {
        if self.is_empty() || self.is_inf() {
            return *self;
        }
        let m = Interval::singleton(self.midpoint());
        m + Interval::singleton(delta) * (*self - m)
            + Interval::singleton(chi) * Interval::minus_one_plus_one()
    }

    // ---- elementary functions -------------------------------------------

    pub fn sqr(&self) -> Interval {
        if self.is_empty() {
            return *self;
        }
        let m = self.mig();
        let g = self.mag();
        Interval::new(mul_down(m, m), if g.is_infinite() { f64::INFINITY } else { mul_up(g, g) })
    }

    pub fn sqrt(&self) -> Interval {
        let x = self.inter(&Self::positive());
        if x.is_empty() {
            return x;
        }
        Interval::new(sqrt_down(x.lo), if x.hi.is_infinite() { f64::INFINITY } else { sqrt_up(x.hi) })
    }

    /// Integer power; `pow(x, 0) = [1, 1]` for non-empty `x`.
    pub fn pow(&self, n: i32) -> Interval {
        if self.is_empty() {
            return *self;
        }
        match n {
            0 => Self::one(),
            1 => *self,
            _ if n < 0 => Self::one() / self.pow(-n),
            _ => {
                let n = n as u32;
                if n % 2 == 0 {
                    Interval::new(pow_down(self.mig(), n), pow_up(self.mag(), n))
                } else {
                    let lo = if self.lo >= 0.0 {
                        pow_down(self.lo, n)
                    } else {
                        -pow_up(-self.lo, n)
                    };
                    let hi = if self.hi >= 0.0 {
                        pow_up(self.hi, n)
                    } else {
                        -pow_down(-self.hi, n)
                    };
                    Interval::new(lo, hi)
                }
            }
        }
    }

    pub fn exp(&self) -> Interval {
        if self.is_empty() {
            return *self;
        }
        let lo = if self.lo == f64::NEG_INFINITY {
            0.0
        } else {
            widen_down(self.lo.exp()).max(0.0)
        };
        let hi = if self.hi == f64::INFINITY {
            f64::INFINITY
        } else {
            widen_up(self.hi.exp())
        };
        Interval::new(lo, hi)
    }

    pub fn log(&self) -> Interval {
        if self.is_empty() || self.hi <= 0.0 {
            return Interval::empty();
        }
        let lo = if self.lo <= 0.0 {
            f64::NEG_INFINITY
        } else {
            widen_down(self.lo.ln())
        };
        let hi = if self.hi == f64::INFINITY {
            f64::INFINITY
        } else {
            widen_up(self.hi.ln())
        };
        Interval::new(lo, hi)
    }

    pub fn cos(&self) -> Interval {
        if self.is_empty() {
            return *self;
        }
        if !self.is_finite() || self.width() >= Self::two_pi().hi {
            return Self::minus_one_plus_one();
        }
        // Multiples of pi inside the domain pin the image at -1 (odd) or
        // +1 (even); the quotient is computed outward so borderline cases
        // err toward pinning.
        let q = *self / Self::pi();
        let (has_even, has_odd) = multiple_parities(&q);
        // Two ulps of slack absorb the libm error on top of the directed
        // rounding of the bound itself.
        let c1 = widen_down(widen_down(self.lo.cos())).max(-1.0);
        let c2 = widen_down(widen_down(self.hi.cos())).max(-1.0);
        let d1 = widen_up(widen_up(self.lo.cos())).min(1.0);
        let d2 = widen_up(widen_up(self.hi.cos())).min(1.0);
        let lo = if has_odd { -1.0 } else { c1.min(c2) };
        let hi = if has_even { 1.0 } else { d1.max(d2) };
        Interval::new(lo, hi)
    }

    pub fn sin(&self) -> Interval {
        if self.is_empty() {
            return *self;
        }
        (*self - Self::half_pi()).cos()
    }

    pub fn tan(&self) -> Interval {
        if self.is_empty() {
            return *self;
        }
        if !self.is_finite() || self.width() >= Self::pi().hi {
            return Self::universe();
        }
        // An asymptote pi/2 + k*pi inside the domain makes the image
        // unbounded.
        let q = (*self - Self::half_pi()) / Self::pi();
        if contains_integer(&q) {
            return Self::universe();
        }
        Interval::new(
            widen_down(widen_down(self.lo.tan())),
            widen_up(widen_up(self.hi.tan())),
        )
    }

    pub fn abs(&self) -> Interval {
        if self.is_empty() {
            return *self;
        }
        if self.lo >= 0.0 {
            *self
        } else if self.hi <= 0.0 {
            -*self
        } else {
            Interval::new(0.0, self.mag())
        }
    }

    pub fn sgn(&self) -> Interval {
        if self.is_empty() {
            return *self;
        }
        let s = |a: f64| -> f64 {
            if a < 0.0 {
                -1.0
            } else if a > 0.0 {
                1.0
            } else {
                0.0
            }
        };
        Interval::new(s(self.lo), s(self.hi))
    }

    pub fn min(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        Interval::new(self.lo.min(other.lo), self.hi.min(other.hi))
    }

    pub fn max(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::empty();
        }
        Interval::new(self.lo.max(other.lo), self.hi.max(other.hi))
    }
}

/// Set complement, up to two pieces (second piece empty when one suffices).
pub fn complement(x: &Interval) -> (Interval, Interval) {
    let e = Interval::empty();
    if x.is_empty() {
        return (Interval::universe(), e);
    }
    match (x.is_inf_left(), x.is_inf_right()) {
        (true, true) => (e, e),
        (true, false) => (Interval::more_than(x.right()), e),
        (false, true) => (Interval::less_than(x.left()), e),
        (false, false) => (
            Interval::less_than(x.left()),
            Interval::more_than(x.right()),
        ),
    }
}

/// Set difference `x \ y`, up to two pieces.
///
/// The bounds of `y` are kept in the result pieces (the difference of
/// closed intervals is rounded outward to closed intervals).
pub fn setminus(x: &Interval, y: &Interval) -> (Interval, Interval) {
    let e = Interval::empty();
    if x.is_empty() || y.is_empty() {
        return (*x, e);
    }
    if y.contains_interval(x) {
        return (e, e);
    }
    if x.contains_interval(y) {
        if y.is_singleton() {
            return (*x, e);
        }
        if x.left() == y.left() {
            return (Interval::new(y.right(), x.right()), e);
        }
        if x.right() == y.right() {
            return (Interval::new(x.left(), y.left()), e);
        }
        return (
            Interval::new(x.left(), y.left()),
            Interval::new(y.right(), x.right()),
        );
    }
    if y.contains(x.left()) {
        return (Interval::new(y.right(), x.right()), e);
    }
    if y.contains(x.right()) {
        return (Interval::new(x.left(), y.left()), e);
    }
    (*x, e)
}

/// Extended division: the relational quotient of `x / y` as an ordered pair
/// of disjoint intervals, the second empty when one piece suffices.
pub fn ext_div(x: &Interval, y: &Interval) -> (Interval, Interval) {
    if y.strictly_contains_zero() {
        let z1 = *x / y.inter(&Interval::negative());
        let z2 = *x / y.inter(&Interval::positive());
        if z1.is_disjoint(&z2) {
            if z1.is_certainly_lt(&z2) {
                (z1, z2)
            } else {
                (z2, z1)
            }
        } else {
            (z1.hull(&z2), Interval::empty())
        }
    } else {
        (*x / *y, Interval::empty())
    }
}

#[inline]
fn contains_integer(q: &Interval) -> bool {
    if q.is_empty() {
        return false;
    }
    if !q.is_finite() {
        return true;
    }
    q.left().ceil() <= q.right().floor()
}

/// Which parities of integers lie in `q`: `(even present, odd present)`.
fn multiple_parities(q: &Interval) -> (bool, bool) {
    if q.is_empty() {
        return (false, false);
    }
    if !q.is_finite() {
        return (true, true);
    }
    let kmin = q.left().ceil();
    let kmax = q.right().floor();
    if kmin > kmax {
        (false, false)
    } else if kmax > kmin {
        (true, true)
    } else {
        let even = (kmin / 2.0).fract() == 0.0;
        (even, !even)
    }
}

/// Directed lower bound of `a^n` for `a >= 0`.
fn pow_down(a: f64, n: u32) -> f64 {
    debug_assert!(a >= 0.0);
    if a.is_infinite() {
        return f64::INFINITY;
    }
    let mut r = 1.0f64;
    for _ in 0..n {
        r = mul_down(r, a);
    }
    r
}

/// Directed upper bound of `a^n` for `a >= 0`.
fn pow_up(a: f64, n: u32) -> f64 {
    debug_assert!(a >= 0.0);
    if a.is_infinite() {
        return f64::INFINITY;
    }
    let mut r = 1.0f64;
    for _ in 0..n {
        r = mul_up(r, a);
    }
    r
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.is_set_eq(other)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "empty")
        } else {
            write!(f, "[{}, {}]", self.lo, self.hi)
        }
    }
}

impl std::ops::Neg for Interval {
    type Output = Interval;

    fn neg(self) -> Interval {
        if self.is_empty() {
            self
        } else {
            Interval {
                lo: -self.hi,
                hi: -self.lo,
            }
        }
    }
}

impl std::ops::Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::empty();
        }
        Interval::new(add_down(self.lo, rhs.lo), add_up(self.hi, rhs.hi))
    }
}

impl std::ops::Sub for Interval {
    type Output = Interval;

    fn sub(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::empty();
        }
        Interval::new(sub_down(self.lo, rhs.hi), sub_up(self.hi, rhs.lo))
    }
}

impl std::ops::Mul for Interval {
    type Output = Interval;

    fn mul(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::empty();
        }
        if self.is_zero() || rhs.is_zero() {
            return Interval::zero();
        }
        // Corner candidates; NaN corners (0 * inf) are covered by the
        // neighbouring corners, see the soundness tests below.
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (a, b) in [
            (self.lo, rhs.lo),
            (self.lo, rhs.hi),
            (self.hi, rhs.lo),
            (self.hi, rhs.hi),
        ] {
            let d = mul_down(a, b);
            let u = mul_up(a, b);
            if !d.is_nan() && d < lo {
                lo = d;
            }
            if !u.is_nan() && u > hi {
                hi = u;
            }
        }
        Interval::new(lo, hi)
    }
}

impl std::ops::Div for Interval {
    type Output = Interval;

    fn div(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() || rhs.is_zero() {
            return Interval::empty();
        }
        if self.is_zero() {
            return Interval::zero();
        }
        if rhs.lo > 0.0 || rhs.hi < 0.0 {
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for (a, b) in [
                (self.lo, rhs.lo),
                (self.lo, rhs.hi),
                (self.hi, rhs.lo),
                (self.hi, rhs.hi),
            ] {
                let d = div_down(a, b);
                let u = div_up(a, b);
                if !d.is_nan() && d < lo {
                    lo = d;
                }
                if !u.is_nan() && u > hi {
                    hi = u;
                }
            }
            return Interval::new(lo, hi);
        }
        if rhs.lo == 0.0 {
            // rhs.hi > 0
            if self.lo >= 0.0 {
                Interval::new(div_down(self.lo, rhs.hi), f64::INFINITY)
            } else if self.hi <= 0.0 {
                Interval::new(f64::NEG_INFINITY, div_up(self.hi, rhs.hi))
            } else {
                Interval::universe()
            }
        } else if rhs.hi == 0.0 {
            // rhs.lo < 0
            if self.lo >= 0.0 {
                Interval::new(f64::NEG_INFINITY, div_up(self.lo, rhs.lo))
            } else if self.hi <= 0.0 {
                Interval::new(div_down(self.hi, rhs.lo), f64::INFINITY)
            } else {
                Interval::universe()
            }
        } else {
            // rhs strictly straddles zero: the hull of the two relational
            // pieces is the whole line.
            Interval::universe()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_absorbs() {
        let e = Interval::empty();
        let x = Interval::new(1.0, 2.0);
        assert!((e + x).is_empty());
        assert!((x - e).is_empty());
        assert!((e * x).is_empty());
        assert!((x / e).is_empty());
        assert!(e.sqr().is_empty());
        assert!(e.exp().is_empty());
    }

    #[test]
    fn test_identities() {
        let x = Interval::new(-3.5, 7.25);
        assert!((x + Interval::zero()).is_set_eq(&x));
        assert!((x * Interval::one()).is_set_eq(&x));
        assert!(x.hull(&Interval::empty()).is_set_eq(&x));
        assert!(x.inter(&Interval::universe()).is_set_eq(&x));
    }

    #[test]
    fn test_exact_arithmetic_stays_exact() {
        let x = Interval::new(-2.0, 3.0);
        let y = Interval::new(-3.0, 4.0);
        assert!((x + y).is_set_eq(&Interval::new(-5.0, 7.0)));
        assert!((x - y).is_set_eq(&Interval::new(-6.0, 6.0)));
        assert!((x * y).is_set_eq(&Interval::new(-9.0, 12.0)));
        assert!(Interval::new(4.0, 8.0)
            .sqr()
            .is_set_eq(&Interval::new(16.0, 64.0)));
    }

    #[test]
    fn test_division_cases() {
        let x = Interval::new(1.0, 2.0);
        assert!((x / Interval::new(2.0, 4.0)).is_set_eq(&Interval::new(0.25, 1.0)));
        assert!((x / Interval::new(0.0, 2.0)).is_set_eq(&Interval::more_than(0.5)));
        assert!((x / Interval::new(-2.0, 0.0)).is_set_eq(&Interval::less_than(-0.5)));
        assert!((x / Interval::new(-1.0, 1.0)).is_universe());
        assert!((x / Interval::zero()).is_empty());
        assert!((Interval::zero() / x).is_set_eq(&Interval::zero()));
    }

    #[test]
    fn test_ext_div_vectors() {
        // Ported from the univariate relational-division unit vectors.
        let (a, b) = ext_div(&Interval::new(4.0, 8.0), &Interval::new(-1.0, 2.0));
        assert!(a.is_set_eq(&Interval::less_than(-4.0)));
        assert!(b.is_set_eq(&Interval::more_than(2.0)));

        let (a, b) = ext_div(&Interval::new(-8.0, -4.0), &Interval::new(-1.0, 2.0));
        assert!(a.is_set_eq(&Interval::less_than(-2.0)));
        assert!(b.is_set_eq(&Interval::more_than(4.0)));

        let (a, b) = ext_div(&Interval::new(-8.0, 2.0), &Interval::new(-1.0, 2.0));
        assert!(a.is_universe());
        assert!(b.is_empty());

        let (a, b) = ext_div(&Interval::new(-8.0, 2.0), &Interval::new(0.0, 2.0));
        assert!(a.is_universe());
        assert!(b.is_empty());

        let x = Interval::new(-8.0, 2.0);
        let y = Interval::new(-4.0, -2.0);
        let (a, b) = ext_div(&x, &y);
        assert!(a.is_set_eq(&(x / y)));
        assert!(b.is_empty());

        let (a, b) = ext_div(&Interval::empty(), &Interval::new(-4.0, -2.0));
        assert!(a.is_empty());
        assert!(b.is_empty());
    }

    #[test]
    fn test_setminus_vectors() {
        let e = Interval::empty();

        let (a, b) = setminus(&Interval::new(0.0, 4.0), &Interval::new(1.0, 4.0));
        assert!(a.is_set_eq(&Interval::new(0.0, 1.0)));
        assert!(b.is_empty());

        let (a, b) = setminus(&Interval::new(0.0, 4.0), &Interval::new(4.0, 4.0));
        assert!(a.is_set_eq(&Interval::new(0.0, 4.0)));
        assert!(b.is_empty());

        let (a, b) = setminus(&Interval::new(0.0, 4.0), &Interval::new(-1.0, 4.0));
        assert!(a.is_empty());
        assert!(b.is_empty());

        let (a, b) = setminus(&Interval::new(0.0, 4.0), &Interval::new(1.0, 3.0));
        assert!(a.is_set_eq(&Interval::new(0.0, 1.0)));
        assert!(b.is_set_eq(&Interval::new(3.0, 4.0)));

        let (a, b) = setminus(&Interval::new(0.0, 4.0), &Interval::new(1.0, 5.0));
        assert!(a.is_set_eq(&Interval::new(0.0, 1.0)));
        assert!(b.is_empty());

        let (a, b) = setminus(&Interval::new(0.0, 4.0), &e);
        assert!(a.is_set_eq(&Interval::new(0.0, 4.0)));
        assert!(b.is_empty());
    }

    #[test]
    fn test_complement() {
        let (a, b) = complement(&Interval::new(1.0, 2.0));
        assert!(a.is_set_eq(&Interval::less_than(1.0)));
        assert!(b.is_set_eq(&Interval::more_than(2.0)));

        let (a, b) = complement(&Interval::universe());
        assert!(a.is_empty() && b.is_empty());

        let (a, b) = complement(&Interval::less_than(0.0));
        assert!(a.is_set_eq(&Interval::more_than(0.0)));
        assert!(b.is_empty());
    }

    #[test]
    fn test_round_to_integral() {
        assert!(Interval::new(1.5, 4.3)
            .round()
            .is_set_eq(&Interval::new(2.0, 4.0)));
        assert!(Interval::new(1.5, 1.8).round().is_empty());
        assert!(Interval::new(-2.5, -0.5)
            .round()
            .is_set_eq(&Interval::new(-2.0, -1.0)));
    }

    #[test]
    fn test_sqrt_and_pow() {
        assert!(Interval::new(4.0, 9.0)
            .sqrt()
            .is_set_eq(&Interval::new(2.0, 3.0)));
        assert!(Interval::new(-4.0, 9.0)
            .sqrt()
            .is_set_eq(&Interval::new(0.0, 3.0)));
        assert!(Interval::new(-3.0, -1.0).sqrt().is_empty());
        assert!(Interval::new(-2.0, 3.0)
            .pow(2)
            .is_set_eq(&Interval::new(0.0, 9.0)));
        assert!(Interval::new(-2.0, 3.0)
            .pow(3)
            .is_set_eq(&Interval::new(-8.0, 27.0)));
        assert!(Interval::new(-2.0, 3.0).pow(0).is_set_eq(&Interval::one()));
    }

    #[test]
    fn test_abs_sgn_min_max() {
        assert!(Interval::new(-3.0, 2.0)
            .abs()
            .is_set_eq(&Interval::new(0.0, 3.0)));
        assert!(Interval::new(-3.0, 2.0)
            .sgn()
            .is_set_eq(&Interval::minus_one_plus_one()));
        assert!(Interval::new(1.0, 2.0).sgn().is_set_eq(&Interval::one()));
        let x = Interval::new(0.0, 5.0);
        let y = Interval::new(1.0, 4.0);
        assert!(x.min(&y).is_set_eq(&Interval::new(0.0, 4.0)));
        assert!(x.max(&y).is_set_eq(&Interval::new(1.0, 5.0)));
    }

    #[test]
    fn test_trig_envelopes() {
        let c = Interval::new(0.0, std::f64::consts::PI).cos();
        assert!(c.contains(-1.0) && c.contains(1.0));
        let s = Interval::new(0.0, 0.5).sin();
        assert!(s.left() >= 0.0 - 1e-15 && s.right() <= 0.5f64.sin() + 1e-15);
        assert!(Interval::new(1.0, 2.0).tan().is_universe());
        assert!(Interval::universe().cos().is_set_eq(&Interval::minus_one_plus_one()));
    }

    #[test]
    fn test_inflate() {
        let x = Interval::new(1.0, 3.0);
        let y = x.inflate(1.5, 0.25);
        assert!(y.contains_interval(&x));
        assert!(y.left() <= 0.25 && y.right() >= 3.75);
    }

    #[test]
    fn test_comparators() {
        let x = Interval::new(0.0, 1.0);
        let y = Interval::new(2.0, 3.0);
        assert!(x.is_certainly_lt(&y));
        assert!(x.is_possibly_le(&y));
        assert!(!y.is_possibly_le(&x));
        assert!(x.is_certainly_neq(&y));
        assert!(Interval::singleton(2.0).is_certainly_eq(&Interval::singleton(2.0)));
    }

    #[test]
    fn test_midpoint_and_width() {
        assert_eq!(Interval::new(1.0, 3.0).midpoint(), 2.0);
        assert_eq!(Interval::universe().midpoint(), 0.0);
        assert_eq!(Interval::new(1.0, 3.0).width(), 2.0);
        assert!(Interval::less_than(0.0).width().is_infinite());
    }

    proptest! {
        /// Outward rounding: sampled real images stay inside the computed
        /// interval for every binary operation.
        #[test]
        fn prop_outward_containment(
            a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6,
            c in -1.0e6f64..1.0e6, d in -1.0e6f64..1.0e6,
            t in 0.0f64..1.0, u in 0.0f64..1.0,
        ) {
            let x = Interval::new(a.min(b), a.max(b));
            let y = Interval::new(c.min(d), c.max(d));
            let px = x.left() + t * (x.right() - x.left());
            let py = y.left() + u * (y.right() - y.left());
            prop_assert!((x + y).contains(px + py));
            prop_assert!((x - y).contains(px - py));
            prop_assert!((x * y).contains(px * py));
            if !y.contains_zero() {
                prop_assert!((x / y).contains(px / py));
            }
            prop_assert!(x.sqr().contains(px * px));
            prop_assert!(x.exp().contains(px.exp()) || px.exp().is_infinite());
            prop_assert!(x.cos().contains(px.cos()));
            prop_assert!(x.sin().contains(px.sin()));
        }

        /// The hull of extended-division pieces encloses all true quotients.
        #[test]
        fn prop_ext_div_encloses(
            a in -100.0f64..100.0, b in -100.0f64..100.0,
            c in -100.0f64..100.0, d in -100.0f64..100.0,
            t in 0.0f64..1.0, u in 0.0f64..1.0,
        ) {
            let x = Interval::new(a.min(b), a.max(b));
            let y = Interval::new(c.min(d), c.max(d));
            let px = x.left() + t * (x.right() - x.left());
            let py = y.left() + u * (y.right() - y.left());
            if py != 0.0 {
                let (z1, z2) = ext_div(&x, &y);
                prop_assert!(z1.contains(px / py) || z2.contains(px / py));
            }
        }
    }
}
