//! Inverse projections of the elementary operations.
//!
//! For a relation `z = op(x, y)`, `op_px(x, y, z)` returns the subset of
//! `x` consistent with the relation (an enclosure of the largest such set),
//! `op_py` is symmetric, and `op_pz(x, y, z)` intersects `z` with the
//! forward image `op(x, y)`. Unary operations take `(x, y)` with `y` the
//! image domain. Projections never widen their first argument.
//!
//! The trigonometric projections narrow over a bounded number of periods
//! and fall back to returning the input domain unchanged on very wide
//! boxes, which is sound for a projection.

use super::{ext_div, Interval};
use crate::round::{widen_down, widen_up};

// ---- addition / subtraction / negation ----------------------------------

pub fn add_px(x: Interval, y: Interval, z: Interval) -> Interval {
    x.inter(&(z - y))
}

pub fn add_py(x: Interval, y: Interval, z: Interval) -> Interval {
    y.inter(&(z - x))
}

pub fn add_pz(x: Interval, y: Interval, z: Interval) -> Interval {
    z.inter(&(x + y))
}

pub fn sub_px(x: Interval, y: Interval, z: Interval) -> Interval {
    x.inter(&(z + y))
}

pub fn sub_py(x: Interval, y: Interval, z: Interval) -> Interval {
    y.inter(&(x - z))
}

pub fn sub_pz(x: Interval, y: Interval, z: Interval) -> Interval {
    z.inter(&(x - y))
}

pub fn neg_px(x: Interval, y: Interval) -> Interval {
    x.inter(&(-y))
}

pub fn neg_py(x: Interval, y: Interval) -> Interval {
    y.inter(&(-x))
}

// ---- multiplication / division ------------------------------------------

pub fn mul_px(x: Interval, y: Interval, z: Interval) -> Interval {
    if z.is_empty() || y.is_empty() {
        return Interval::empty();
    }
    // y = 0 satisfies the relation for every x as soon as 0 is in z.
    if y.contains_zero() && z.contains_zero() {
        return x;
    }
    if y.is_zero() {
        return Interval::empty();
    }
    let (q1, q2) = ext_div(&z, &y);
    x.inter(&q1).hull(&x.inter(&q2))
}

pub fn mul_py(x: Interval, y: Interval, z: Interval) -> Interval {
    mul_px(y, x, z)
}

pub fn mul_pz(x: Interval, y: Interval, z: Interval) -> Interval {
    z.inter(&(x * y))
}

pub fn div_px(x: Interval, y: Interval, z: Interval) -> Interval {
    if y.is_empty() || y.is_zero() {
        return Interval::empty();
    }
    x.inter(&(z * y))
}

pub fn div_py(x: Interval, y: Interval, z: Interval) -> Interval {
    if x.is_empty() || z.is_empty() {
        return Interval::empty();
    }
    if x.contains_zero() && z.contains_zero() {
        return y;
    }
    let (q1, q2) = ext_div(&x, &z);
    y.inter(&q1).hull(&y.inter(&q2))
}

pub fn div_pz(x: Interval, y: Interval, z: Interval) -> Interval {
    z.inter(&(x / y))
}

// ---- square / square root / power ---------------------------------------

pub fn sqr_px(x: Interval, y: Interval) -> Interval {
    let r = y.inter(&Interval::positive()).sqrt();
    x.inter(&(-r)).hull(&x.inter(&r))
}

pub fn sqr_py(x: Interval, y: Interval) -> Interval {
    y.inter(&x.sqr())
}

pub fn sqrt_px(x: Interval, y: Interval) -> Interval {
    x.inter(&y.inter(&Interval::positive()).sqr())
}

pub fn sqrt_py(x: Interval, y: Interval) -> Interval {
    y.inter(&x.sqrt())
}

pub fn pow_px(x: Interval, n: i32, y: Interval) -> Interval {
    if x.is_empty() || y.is_empty() {
        return Interval::empty();
    }
    match n {
        0 => {
            if y.contains(1.0) {
                x
            } else {
                Interval::empty()
            }
        }
        1 => x.inter(&y),
        2 => sqr_px(x, y),
        _ if n < 0 => pow_px(x, -n, Interval::one() / y),
        _ => {
            if n % 2 == 0 {
                let r = root_pos(y.inter(&Interval::positive()), n as u32);
                x.inter(&(-r)).hull(&x.inter(&r))
            } else {
                x.inter(&odd_root(y, n as u32))
            }
        }
    }
}

pub fn pow_py(x: Interval, n: i32, y: Interval) -> Interval {
    y.inter(&x.pow(n))
}

/// Enclosure of the n-th root of a non-negative interval.
fn root_pos(v: Interval, n: u32) -> Interval {
    if v.is_empty() {
        return v;
    }
    let e = 1.0 / n as f64;
    let lo = if v.left() <= 0.0 {
        0.0
    } else {
        widen_down(widen_down(v.left().powf(e))).max(0.0)
    };
    let hi = if v.right() == f64::INFINITY {
        f64::INFINITY
    } else {
        widen_up(widen_up(v.right().powf(e)))
    };
    Interval::new(lo, hi)
}

/// Enclosure of the sign-preserving n-th root of `v` for odd `n`.
fn odd_root(v: Interval, n: u32) -> Interval {
    if v.is_empty() {
        return v;
    }
    let pos = root_pos(v.inter(&Interval::positive()), n);
    let neg = -root_pos((-v).inter(&Interval::positive()), n);
    neg.hull(&pos)
}

// ---- exp / log ----------------------------------------------------------

pub fn exp_px(x: Interval, y: Interval) -> Interval {
    x.inter(&y.log())
}

pub fn exp_py(x: Interval, y: Interval) -> Interval {
    y.inter(&x.exp())
}

pub fn log_px(x: Interval, y: Interval) -> Interval {
    x.inter(&y.exp())
}

pub fn log_py(x: Interval, y: Interval) -> Interval {
    y.inter(&x.log())
}

// ---- abs / sgn ----------------------------------------------------------

pub fn abs_px(x: Interval, y: Interval) -> Interval {
    let yp = y.inter(&Interval::positive());
    x.inter(&yp).hull(&x.inter(&(-yp)))
}

pub fn abs_py(x: Interval, y: Interval) -> Interval {
    y.inter(&x.abs())
}

pub fn sgn_px(x: Interval, y: Interval) -> Interval {
    if x.is_empty() || y.is_empty() {
        return Interval::empty();
    }
    let mut res = Interval::empty();
    if y.contains(1.0) {
        res = res.hull(&strictly_positive_part(x));
    }
    if y.contains(0.0) && x.contains_zero() {
        res = res.hull(&Interval::zero());
    }
    if y.contains(-1.0) {
        res = res.hull(&strictly_negative_part(x));
    }
    res
}

pub fn sgn_py(x: Interval, y: Interval) -> Interval {
    y.inter(&x.sgn())
}

fn strictly_positive_part(x: Interval) -> Interval {
    if x.is_empty() || x.right() <= 0.0 {
        return Interval::empty();
    }
    Interval::new(x.left().max(0.0f64.next_up()), x.right())
}

fn strictly_negative_part(x: Interval) -> Interval {
    if x.is_empty() || x.left() >= 0.0 {
        return Interval::empty();
    }
    Interval::new(x.left(), x.right().min(0.0f64.next_down()))
}

// ---- min / max ----------------------------------------------------------

pub fn min_px(x: Interval, y: Interval, z: Interval) -> Interval {
    if x.is_empty() || y.is_empty() || z.is_empty() {
        return Interval::empty();
    }
    // x is consistent when x itself realizes the minimum (x in z) or when
    // some y in z lies below x.
    let w = y.inter(&z);
    if w.is_empty() {
        x.inter(&z)
    } else {
        x.inter(&Interval::more_than(z.left()))
    }
}

pub fn min_py(x: Interval, y: Interval, z: Interval) -> Interval {
    min_px(y, x, z)
}

pub fn min_pz(x: Interval, y: Interval, z: Interval) -> Interval {
    z.inter(&x.min(&y))
}

pub fn max_px(x: Interval, y: Interval, z: Interval) -> Interval {
    if x.is_empty() || y.is_empty() || z.is_empty() {
        return Interval::empty();
    }
    let w = y.inter(&z);
    if w.is_empty() {
        x.inter(&z)
    } else {
        x.inter(&Interval::less_than(z.right()))
    }
}

pub fn max_py(x: Interval, y: Interval, z: Interval) -> Interval {
    max_px(y, x, z)
}

pub fn max_pz(x: Interval, y: Interval, z: Interval) -> Interval {
    z.inter(&x.max(&y))
}

// ---- trigonometric ------------------------------------------------------

const MAX_PERIODS: i64 = 64;

pub fn sin_px(x: Interval, y: Interval) -> Interval {
    let yy = y.inter(&Interval::minus_one_plus_one());
    if yy.is_empty() {
        return Interval::empty();
    }
    if x.is_empty() || !x.is_finite() {
        return x;
    }
    let p = Interval::new(
        widen_down(widen_down(yy.left().asin())),
        widen_up(widen_up(yy.right().asin())),
    );
    // Solutions: p + 2k*pi and (pi - p) + 2k*pi.
    let q = Interval::pi() - p;
    periodic_px(x, &[p, q], Interval::two_pi())
}

pub fn sin_py(x: Interval, y: Interval) -> Interval {
    y.inter(&x.sin())
}

pub fn cos_px(x: Interval, y: Interval) -> Interval {
    let yy = y.inter(&Interval::minus_one_plus_one());
    if yy.is_empty() {
        return Interval::empty();
    }
    if x.is_empty() || !x.is_finite() {
        return x;
    }
    // acos is decreasing: the principal branch bounds swap.
    let p = Interval::new(
        widen_down(widen_down(yy.right().acos())),
        widen_up(widen_up(yy.left().acos())),
    );
    periodic_px(x, &[p, -p], Interval::two_pi())
}

pub fn cos_py(x: Interval, y: Interval) -> Interval {
    y.inter(&x.cos())
}

pub fn tan_px(x: Interval, y: Interval) -> Interval {
    if y.is_empty() || x.is_empty() || !x.is_finite() {
        return if y.is_empty() { Interval::empty() } else { x };
    }
    let p = Interval::new(
        widen_down(widen_down(y.left().atan())),
        widen_up(widen_up(y.right().atan())),
    );
    periodic_px(x, &[p], Interval::pi())
}

pub fn tan_py(x: Interval, y: Interval) -> Interval {
    y.inter(&x.tan())
}

/// Hull of `x` intersected with every translate `b + k*period` of the
/// branches `b`, for the k range overlapping `x`; gives `x` back when the
/// domain spans too many periods to enumerate.
fn periodic_px(x: Interval, branches: &[Interval], period: Interval) -> Interval {
    let w = period.left();
    let kmin = ((x.left() - branches[0].right()) / w).floor() as i64 - 1;
    let kmax = ((x.right() - branches[0].left()) / w).ceil() as i64 + 1;
    if kmax - kmin > MAX_PERIODS {
        return x;
    }
    let mut res = Interval::empty();
    for k in kmin..=kmax {
        let shift = Interval::singleton(k as f64) * period;
        for b in branches {
            res = res.hull(&x.inter(&(*b + shift)));
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(a: f64, b: f64) -> Interval {
        Interval::new(a, b)
    }

    #[test]
    fn test_add_inv_vectors() {
        let (x, y, z) = (iv(-2.0, 3.0), iv(-3.0, 4.0), iv(0.0, 8.0));
        assert!(add_px(x, y, z).is_set_eq(&iv(-2.0, 3.0)));
        assert!(add_py(x, y, z).is_set_eq(&iv(-3.0, 4.0)));
        assert!(add_pz(x, y, z).is_set_eq(&iv(0.0, 7.0)));

        let (x, y, z) = (
            Interval::more_than(-2.0),
            iv(-3.0, 4.0),
            Interval::less_than(8.0),
        );
        assert!(add_px(x, y, z).is_set_eq(&iv(-2.0, 11.0)));
        assert!(add_py(x, y, z).is_set_eq(&iv(-3.0, 4.0)));
        assert!(add_pz(x, y, z).is_set_eq(&iv(-5.0, 8.0)));

        let (x, y, z) = (
            Interval::more_than(-2.0),
            Interval::less_than(0.0),
            Interval::universe(),
        );
        assert!(add_pz(x, y, z).is_universe());

        assert!(add_pz(iv(0.0, 1.0), iv(-1.0, 2.0), iv(4.0, 7.0)).is_empty());
        assert!(add_pz(Interval::empty(), iv(-1.0, 2.0), iv(4.0, 7.0)).is_empty());
    }

    #[test]
    fn test_min_inv_vectors() {
        let (x, y, z) = (iv(0.0, 5.0), iv(1.0, 4.0), iv(2.0, 6.0));
        assert!(min_px(x, y, z).is_set_eq(&iv(2.0, 5.0)));
        assert!(min_py(x, y, z).is_set_eq(&iv(2.0, 4.0)));
        assert!(min_pz(x, y, z).is_set_eq(&iv(2.0, 4.0)));

        assert!(min_pz(iv(0.0, 3.0), iv(4.0, 6.0), iv(4.0, 6.0)).is_empty());

        let (x, y, z) = (iv(0.0, 3.0), iv(5.0, 6.0), iv(-1.0, 7.0));
        assert!(min_px(x, y, z).is_set_eq(&x));
        assert!(min_py(x, y, z).is_set_eq(&y));
        assert!(min_pz(x, y, z).is_set_eq(&x));

        let (x, y, z) = (
            Interval::universe(),
            Interval::less_than(2.0),
            Interval::universe(),
        );
        assert!(min_px(x, y, z).is_set_eq(&x));
        assert!(min_py(x, y, z).is_set_eq(&y));
        assert!(min_pz(x, y, z).is_set_eq(&y));
    }

    #[test]
    fn test_max_inv_vectors() {
        let (x, y, z) = (iv(0.0, 7.0), iv(1.0, 4.0), iv(2.0, 6.0));
        assert!(max_px(x, y, z).is_set_eq(&iv(0.0, 6.0)));
        assert!(max_py(x, y, z).is_set_eq(&iv(1.0, 4.0)));
        assert!(max_pz(x, y, z).is_set_eq(&iv(2.0, 6.0)));

        let (x, y, z) = (iv(0.0, 3.0), iv(1.0, 4.0), iv(-2.0, 2.0));
        assert!(max_px(x, y, z).is_set_eq(&iv(0.0, 2.0)));
        assert!(max_py(x, y, z).is_set_eq(&iv(1.0, 2.0)));
        assert!(max_pz(x, y, z).is_set_eq(&iv(1.0, 2.0)));

        assert!(max_pz(iv(0.0, 3.0), iv(1.0, 4.0), iv(5.0, 6.0)).is_empty());

        let (x, y, z) = (
            Interval::less_than(3.0),
            Interval::more_than(2.0),
            iv(1.0, 8.0),
        );
        assert!(max_px(x, y, z).is_set_eq(&x));
        assert!(max_py(x, y, z).is_set_eq(&iv(2.0, 8.0)));
        assert!(max_pz(x, y, z).is_set_eq(&iv(2.0, 8.0)));
    }

    #[test]
    fn test_sgn_inv_vectors() {
        let (x, y) = (iv(1.0, 7.0), iv(-1.0, 1.0));
        assert!(sgn_px(x, y).is_set_eq(&x));
        assert!(sgn_py(x, y).is_set_eq(&Interval::one()));

        let (x, y) = (iv(0.0, 7.0), iv(-1.0, 1.0));
        assert!(sgn_px(x, y).is_set_eq(&x));
        assert!(sgn_py(x, y).is_set_eq(&iv(0.0, 1.0)));

        let (x, y) = (iv(-1.0, 7.0), iv(0.0, 1.0));
        assert!(sgn_px(x, y).is_set_eq(&iv(0.0, 7.0)));
        assert!(sgn_py(x, y).is_set_eq(&iv(0.0, 1.0)));

        assert!(sgn_px(iv(-1.0, 0.0), Interval::one()).is_empty());
        assert!(sgn_px(iv(0.0, 2.0), Interval::minus_one()).is_empty());
    }

    #[test]
    fn test_mul_div_projections() {
        // 6 = x * [2, 3] narrows x to [2, 3].
        let px = mul_px(iv(0.0, 10.0), iv(2.0, 3.0), Interval::singleton(6.0));
        assert!(px.is_set_eq(&iv(2.0, 3.0)));
        // A factor domain containing zero with zero in the image keeps x.
        let px = mul_px(iv(-5.0, 5.0), iv(-1.0, 1.0), iv(-1.0, 1.0));
        assert!(px.is_set_eq(&iv(-5.0, 5.0)));
        // z = x / y with z = [1, 2], y = [2, 4] narrows x to [2, 8].
        let px = div_px(iv(-100.0, 100.0), iv(2.0, 4.0), iv(1.0, 2.0));
        assert!(px.is_set_eq(&iv(2.0, 8.0)));
        let py = div_py(iv(4.0, 8.0), iv(-100.0, 100.0), iv(2.0, 2.0));
        assert!(py.is_set_eq(&iv(2.0, 4.0)));
    }

    #[test]
    fn test_sqr_sqrt_projections() {
        let px = sqr_px(iv(-10.0, 10.0), iv(4.0, 9.0));
        assert!(px.is_set_eq(&iv(-3.0, 3.0)));
        let px = sqr_px(iv(0.5, 10.0), iv(4.0, 9.0));
        assert!(px.is_set_eq(&iv(2.0, 3.0)));
        assert!(sqr_px(iv(-10.0, 10.0), iv(-5.0, -2.0)).is_empty());
        let px = sqrt_px(iv(0.0, 100.0), iv(2.0, 3.0));
        assert!(px.is_set_eq(&iv(4.0, 9.0)));
    }

    #[test]
    fn test_exp_log_projections() {
        let px = exp_px(Interval::universe(), iv(1.0, std::f64::consts::E));
        assert!(px.contains(0.0) && px.contains(1.0));
        assert!(px.right() < 1.001);
        assert!(exp_px(iv(0.0, 1.0), iv(-3.0, -2.0)).is_empty());
        let py = log_py(iv(1.0, 1.0), Interval::universe());
        assert!(py.contains(0.0));
    }

    #[test]
    fn test_pow_projections() {
        let px = pow_px(iv(-10.0, 10.0), 3, iv(-8.0, 27.0));
        assert!(px.contains_interval(&iv(-2.0, 3.0)));
        assert!(px.left() >= -2.001 && px.right() <= 3.001);
        let px = pow_px(iv(0.0, 10.0), 4, iv(16.0, 81.0));
        assert!(px.contains_interval(&iv(2.0, 3.0)));
        assert!(px.left() >= 1.999 && px.right() <= 3.001);
    }

    #[test]
    fn test_trig_projections() {
        // sin(x) = 1 on [0, 2*pi] pins x near pi/2.
        let px = sin_px(iv(0.0, 6.3), Interval::one());
        assert!(px.contains(std::f64::consts::FRAC_PI_2));
        assert!(px.width() < 1e-3);
        // cos(x) = 1 on [-7, 7] keeps the three multiples of 2*pi.
        let px = cos_px(iv(-7.0, 7.0), Interval::one());
        assert!(px.contains(0.0));
        assert!(px.contains(std::f64::consts::TAU) && px.contains(-std::f64::consts::TAU));
        // tan(x) = 0 on [3, 4] pins x near pi.
        let px = tan_px(iv(3.0, 4.0), Interval::zero());
        assert!(px.contains(std::f64::consts::PI));
        assert!(px.width() < 1e-6);
        // Projections never widen the input domain.
        let x = iv(0.25, 0.5);
        assert!(x.contains_interval(&sin_px(x, iv(-0.2, 0.9))));
    }
}
