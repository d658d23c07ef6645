//! Univariate interval Newton operator and midpoint inflation.
//!
//! Given a univariate interval function `f` and a domain `x`, the
//! contraction method encloses `{x in X : f(x) = 0}` and returns a proof
//! certificate:
//!
//! - `Empty` when `f` has no zero in `x`,
//! - `Feasible` when the existence of a zero is proven by the Newton
//!   inclusion test,
//! - `Maybe` when no proof is derived.
//!
//! The local search method refines an enclosure of a zero from the
//! midpoint of the domain using inflation, and is the workhorse of the
//! existence prover.

use ibis_core::{ext_div, IbisError, IbisResult, Interval, IntervalBox, Proof, Tolerance};

/// Midpoint inflation operator `m + delta*(x - m) + chi*[-1, 1]`.
///
/// Requires `delta > 1` and `chi >= 0`.
#[derive(Debug, Clone, Copy)]
pub struct Inflator {
    delta: f64,
    chi: f64,
}

impl Default for Inflator {
    fn default() -> Self {
        Inflator {
            delta: 1.125,
            chi: 1e-12,
        }
    }
}

impl Inflator {
    pub fn new(delta: f64, chi: f64) -> IbisResult<Self> {
        if !(delta > 1.0) {
            return Err(IbisError::OutOfDomain(format!(
                "bad inflation factor delta = {delta}"
            )));
        }
        if !(chi >= 0.0) {
            return Err(IbisError::OutOfDomain(format!(
                "bad inflation factor chi = {chi}"
            )));
        }
        Ok(Inflator { delta, chi })
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn chi(&self) -> f64 {
        self.chi
    }

    pub fn inflate(&self, x: Interval) -> Interval {
        x.inflate(self.delta, self.chi)
    }

    pub fn inflate_box(&self, b: &IntervalBox) -> IntervalBox {
        let mut r = b.clone();
        for pos in 0..b.size() {
            r.set_at(pos, self.inflate(b.get_at(pos)));
        }
        r
    }
}

/// A univariate interval function with derivative.
pub trait UniFn {
    fn eval(&self, x: Interval) -> Interval;

    /// Value and derivative on `x`.
    fn eval_diff(&self, x: Interval) -> (Interval, Interval);
}

/// Univariate interval Newton method.
#[derive(Debug, Clone)]
pub struct IntervalNewton {
    max_steps: usize,
    // Improvement percentage: iteration continues while the new width is
    // below this fraction of the previous one.
    improvement: f64,
    xtol: Tolerance,
    inflator: Inflator,
}

impl Default for IntervalNewton {
    fn default() -> Self {
        IntervalNewton {
            max_steps: 20,
            improvement: 50.0,
            xtol: Tolerance::default(),
            inflator: Inflator::default(),
        }
    }
}

impl IntervalNewton {
    pub fn new(max_steps: usize, improvement: f64, xtol: Tolerance, inflator: Inflator) -> Self {
        IntervalNewton {
            max_steps: max_steps.max(1),
            improvement: improvement.clamp(0.0, 100.0),
            xtol,
            inflator,
        }
    }

    pub fn set_max_steps(&mut self, n: usize) {
        self.max_steps = n.max(1);
    }

    pub fn set_inflator(&mut self, inflator: Inflator) {
        self.inflator = inflator;
    }

    /// Contraction method: iterates [`IntervalNewton::step`] until the
    /// domain is empty, tight enough, not improving, or the step cap is
    /// reached.
    pub fn contract(&self, f: &dyn UniFn, x: &mut Interval) -> Proof {
        let mut proof = Proof::Maybe;
        let mut y = *x;
        let mut steps = 0;

        loop {
            let prev = y;
            let p = self.step(f, &mut y);

            if p == Proof::Empty {
                *x = Interval::empty();
                return Proof::Empty;
            }
            if p == Proof::Feasible {
                proof = Proof::Feasible;
            }
            steps += 1;
            if steps >= self.max_steps
                || self.xtol.has_tolerance(&y)
                || !improved(&y, &prev, self.improvement)
            {
                break;
            }
        }

        *x = y;
        proof
    }

    /// One Newton step `x := x inter (c - f(c) / f'(x))` with `c` the
    /// midpoint of `x`. The inclusion `c - f(c)/f'(x) subset x` proves the
    /// existence of a zero.
    pub fn step(&self, f: &dyn UniFn, x: &mut Interval) -> Proof {
        let (fx, dx) = f.eval_diff(*x);

        if fx.is_empty() || !fx.contains_zero() {
            return Proof::Empty;
        }
        if dx.is_empty() || dx.is_inf() || dx.is_zero() {
            return Proof::Maybe;
        }

        let c = x.midpoint();
        let fc = f.eval(Interval::singleton(c));
        if fc.is_empty() {
            return Proof::Maybe;
        }
        let ci = Interval::singleton(c);

        if dx.strictly_contains_zero() {
            let (q1, q2) = ext_div(&fc, &dx);
            let xx1 = ci - q2;
            let xx2 = ci - q1;
            let nx = x.inter(&xx1).hull(&x.inter(&xx2));
            let proof = if nx.is_empty() {
                Proof::Empty
            } else {
                Proof::Maybe
            };
            *x = nx;
            proof
        } else {
            let xx = ci - fc / dx;
            let nx = x.inter(&xx);
            let proof = if nx.is_empty() {
                Proof::Empty
            } else if x.contains_interval(&xx) {
                Proof::Feasible
            } else {
                Proof::Maybe
            };
            *x = nx;
            proof
        }
    }

    /// Local search for a zero from the midpoint of `x`, with inflation.
    /// On success `x` is the certified enclosure; on failure `x` is left
    /// unchanged.
    pub fn local_search(&self, f: &dyn UniFn, x: &mut Interval) -> Proof {
        let mut y = Interval::singleton(x.midpoint());
        let mut steps = 0;
        let mut dcur = f64::INFINITY;

        loop {
            let prev = y;
            let p = self.local_step(f, &mut y);

            let dold = dcur;
            dcur = y.distance(&prev);

            if p == Proof::Empty {
                return Proof::Maybe;
            }
            if p == Proof::Feasible {
                *x = y;
                return Proof::Feasible;
            }
            steps += 1;
            if steps >= self.max_steps || dcur > dold {
                return Proof::Maybe;
            }
        }
    }

    /// One step of the local search: inflate, then contract around the
    /// inflated midpoint.
    pub fn local_step(&self, f: &dyn UniFn, x: &mut Interval) -> Proof {
        let ix = self.inflator.inflate(*x);
        let (fix, dix) = f.eval_diff(ix);

        if fix.is_empty() {
            return Proof::Empty;
        }
        if dix.is_empty() || dix.is_inf() || dix.contains_zero() {
            return Proof::Maybe;
        }

        let ic = ix.midpoint();
        let fic = f.eval(Interval::singleton(ic));
        if fic.is_empty() {
            return Proof::Maybe;
        }

        let nix = Interval::singleton(ic) - fic / dix;
        let proof = if ix.contains_interval(&nix) {
            Proof::Feasible
        } else {
            Proof::Maybe
        };
        *x = nix;
        proof
    }
}

/// True when the width of `x` is below `factor`% of the width of `old`.
fn improved(x: &Interval, old: &Interval, factor: f64) -> bool {
    if x.is_empty() || old.is_empty() || old.is_set_eq(x) || !old.contains_interval(x) {
        return false;
    }
    if (old.is_inf_left() && !x.is_inf_left()) || (old.is_inf_right() && !x.is_inf_right()) {
        return true;
    }
    let wx = x.width();
    let wo = old.width();
    if factor >= 100.0 {
        wx < wo
    } else {
        100.0 * wx < factor * wo
    }
}
