//! Interval slicers: partitions of one interval.

use ibis_core::{IbisError, IbisResult, Interval};

/// Generates a partition of an interval into disjoint covering slices.
///
/// A slicer may return fewer slices than its nominal arity when the
/// interval is too tight to cut; a single slice means the input could not
/// be split.
pub trait IntervalSlicer {
    fn apply(&mut self, x: Interval) -> Vec<Interval>;
}

/// Splits an interval in two equal parts at the midpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bisecter;

impl IntervalSlicer for Bisecter {
    fn apply(&mut self, x: Interval) -> Vec<Interval> {
        if x.is_empty() {
            return Vec::new();
        }
        let m = x.midpoint();
        if !x.strictly_contains(m) {
            return vec![x];
        }
        vec![
            Interval::new(x.left(), m),
            Interval::new(m, x.right()),
        ]
    }
}

/// Splits `[a, b]` into `[a, a+w]`, `[a+w, b-w]`, `[b-w, b]` where `w` is
/// a percentage of the width. Also provides the one-sided peels used by
/// the BC3 shrinking loops.
#[derive(Debug, Clone)]
pub struct Peeler {
    factor: f64,
    // factor / 100 as an interval, so the cut points are computed with
    // outward-safe arithmetic.
    ratio: Interval,
}

impl Peeler {
    /// `factor` is a width percentage in (0, 100).
    pub fn new(factor: f64) -> IbisResult<Self> {
        if !(factor > 0.0 && factor < 100.0) {
            return Err(IbisError::OutOfDomain(format!(
                "bad peel factor {factor}"
            )));
        }
        Ok(Peeler {
            factor,
            ratio: Interval::singleton(factor) / Interval::singleton(100.0),
        })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// The left boundary slice of `x`, or `x` itself when the cut point
    /// does not fall strictly inside.
    pub fn peel_left(&self, x: Interval) -> Interval {
        let w = Interval::singleton(x.width()) * self.ratio;
        let y = Interval::singleton(x.left()) + w;
        let c = y.left();
        if x.strictly_contains(c) {
            Interval::new(x.left(), c)
        } else {
            x
        }
    }

    /// The right boundary slice of `x`.
    pub fn peel_right(&self, x: Interval) -> Interval {
        let w = Interval::singleton(x.width()) * self.ratio;
        let y = Interval::singleton(x.right()) - w;
        let c = y.right();
        if x.strictly_contains(c) {
            Interval::new(c, x.right())
        } else {
            x
        }
    }
}

impl IntervalSlicer for Peeler {
    fn apply(&mut self, x: Interval) -> Vec<Interval> {
        if x.is_empty() {
            return Vec::new();
        }
        let w = Interval::singleton(x.width()) * self.ratio;
        let a = Interval::singleton(x.left()) + w;
        let b = Interval::singleton(x.right()) - w;
        let c = a.left();
        let d = b.right();
        if c <= x.left() || c >= d || d >= x.right() {
            // Unable to peel: degrade to bisection.
            return Bisecter.apply(x);
        }
        vec![
            Interval::new(x.left(), c),
            Interval::new(c, d),
            Interval::new(d, x.right()),
        ]
    }
}

/// Splits an interval into `n` slices of equal width, degrading to
/// bisection when the width cannot support the cuts.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    arity: usize,
}

impl Partitioner {
    pub fn new(arity: usize) -> IbisResult<Self> {
        if arity < 2 {
            return Err(IbisError::OutOfDomain(format!(
                "interval partitioner with bad arity {arity}"
            )));
        }
        Ok(Partitioner { arity })
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl IntervalSlicer for Partitioner {
    fn apply(&mut self, x: Interval) -> Vec<Interval> {
        if x.is_empty() {
            return Vec::new();
        }
        if self.arity == 2 || !x.is_finite() {
            return Bisecter.apply(x);
        }
        let h = x.width() / self.arity as f64;
        let mut slices = Vec::with_capacity(self.arity);
        let mut r = x.left();
        for i in 1..self.arity {
            let l = r;
            r = x.left() + i as f64 * h;
            if l >= r {
                return Bisecter.apply(x);
            }
            slices.push(Interval::new(l, r));
        }
        if r >= x.right() {
            return Bisecter.apply(x);
        }
        slices.push(Interval::new(r, x.right()));
        slices
    }
}
