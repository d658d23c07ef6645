//! Existence prover: certifies a solution inside a small box.
//!
//! Equation systems are certified with an inflation-based interval Newton
//! method: inflate the box, evaluate the function at the midpoint and the
//! Jacobian on the box, precondition with the inverse of the midpoint
//! Jacobian, and test the Krawczyk inclusion `K subset interior(X)`.
//! Inclusion proves the existence of a zero; iteration continues until the
//! distance between successive boxes stalls or a step limit is reached.
//!
//! Inequality constraints are checked by interval evaluation and can only
//! strengthen the verdict to `Inner` or collapse it to `Empty`.

use crate::contractor::ThickFn;
use crate::newton::{Inflator, IntervalNewton};
use faer::{prelude::*, solvers::PartialPivLu, Mat};
use ibis_core::{Dag, FunId, Interval, IntervalBox, Problem, Proof, Scope, Variable};
use std::rc::Rc;

/// One Krawczyk evaluation over a square system.
pub(crate) enum KrawczykOutcome {
    /// The system has no zero in the box.
    Empty,
    /// `K` is strictly inside the box: a zero exists; `K` encloses one.
    Certified(Vec<Interval>),
    /// The intersected box, possibly tightened, without a proof.
    Contracted(Vec<Interval>),
    /// Numerically degenerate step (singular midpoint Jacobian, unbounded
    /// derivative): nothing can be concluded.
    NoInfo,
}

/// Krawczyk operator `K = c - A f(c) + (I - A J)(X - c)` with `A` the
/// inverse of the midpoint Jacobian.
pub(crate) fn krawczyk_step(
    dag: &Dag,
    funs: &[FunId],
    vars: &[Variable],
    b: &IntervalBox,
) -> KrawczykOutcome {
    let n = funs.len();
    debug_assert_eq!(n, vars.len());

    let xs: Vec<Interval> = vars.iter().map(|v| b.get(v)).collect();
    if xs.iter().any(|x| x.is_empty() || !x.is_finite()) {
        return KrawczykOutcome::NoInfo;
    }
    let c: Vec<f64> = xs.iter().map(|x| x.midpoint()).collect();

    // F at the midpoint.
    let mut pm = b.midpoint();
    for (v, cv) in vars.iter().zip(c.iter()) {
        pm.set(v, *cv);
    }
    let fc: Vec<Interval> = funs.iter().map(|&f| dag.eval_point(f, &pm)).collect();
    if fc.iter().any(|e| e.is_empty() || !e.is_finite()) {
        return KrawczykOutcome::NoInfo;
    }

    // Interval Jacobian, rows ordered like funs, columns like vars.
    let mut jac: Vec<Vec<Interval>> = Vec::with_capacity(n);
    for &f in funs {
        let g = dag.gradient(f, b);
        let fscope = dag.fun(f).scope();
        let row: Vec<Interval> = vars
            .iter()
            .map(|v| match fscope.index_of(v) {
                Some(pos) => g[pos],
                None => Interval::zero(),
            })
            .collect();
        if row.iter().any(|z| z.is_empty() || z.is_inf()) {
            return KrawczykOutcome::NoInfo;
        }
        jac.push(row);
    }

    // Preconditioner: inverse of the midpoint Jacobian.
    let a = Mat::from_fn(n, n, |i, j| jac[i][j].midpoint());
    let lu = PartialPivLu::new(a.as_ref());
    let eye = Mat::from_fn(n, n, |i, j| if i == j { 1.0 } else { 0.0 });
    let inv = lu.solve(&eye);
    for i in 0..n {
        for j in 0..n {
            if !inv.read(i, j).is_finite() {
                return KrawczykOutcome::NoInfo;
            }
        }
    }

    // P = A * J as an interval matrix.
    let mut p = vec![vec![Interval::zero(); n]; n];
    for i in 0..n {
        for j in 0..n {
            let mut s = Interval::zero();
            for (l, row) in jac.iter().enumerate() {
                s = s + Interval::singleton(inv.read(i, l)) * row[j];
            }
            p[i][j] = s;
        }
    }

    // K_i = c_i - (A f(c))_i + sum_j (delta_ij - P_ij)(X_j - c_j)
    let mut ks = Vec::with_capacity(n);
    for i in 0..n {
        let mut k = Interval::singleton(c[i]);
        for j in 0..n {
            k = k - Interval::singleton(inv.read(i, j)) * fc[j];
        }
        for j in 0..n {
            let dij = if i == j {
                Interval::one() - p[i][j]
            } else {
                -p[i][j]
            };
            k = k + dij * (xs[j] - Interval::singleton(c[j]));
        }
        ks.push(k);
    }

    if ks
        .iter()
        .zip(xs.iter())
        .all(|(k, x)| x.strictly_contains_interval(k))
    {
        return KrawczykOutcome::Certified(ks);
    }

    let mut inter = Vec::with_capacity(n);
    for (k, x) in ks.iter().zip(xs.iter()) {
        let m = k.inter(x);
        if m.is_empty() {
            return KrawczykOutcome::Empty;
        }
        inter.push(m);
    }
    KrawczykOutcome::Contracted(inter)
}

/// A-posteriori certification of solution boxes.
pub struct Prover {
    dag: Rc<Dag>,
    eq_funs: Vec<FunId>,
    ineq_funs: Vec<FunId>,
    vars: Vec<Variable>,
    inflator: Inflator,
    max_iter: usize,
    uni: IntervalNewton,
}

impl Prover {
    pub fn new(problem: &Problem) -> Self {
        let mut dag = Dag::new();
        let mut eq_funs = Vec::new();
        let mut ineq_funs = Vec::new();
        for c in problem.ctrs() {
            let fi = dag.insert(c);
            if c.is_equation() {
                eq_funs.push(fi);
            } else {
                ineq_funs.push(fi);
            }
        }
        let mut scope = Scope::new();
        for &fi in &eq_funs {
            scope.insert_scope(dag.fun(fi).scope());
        }
        let vars: Vec<Variable> = scope.iter().cloned().collect();
        Prover {
            dag: Rc::new(dag),
            eq_funs,
            ineq_funs,
            vars,
            inflator: Inflator::default(),
            max_iter: 20,
            uni: IntervalNewton::default(),
        }
    }

    pub fn set_inflator(&mut self, inflator: Inflator) {
        self.uni.set_inflator(inflator);
        self.inflator = inflator;
    }

    pub fn set_max_iter(&mut self, n: usize) {
        self.max_iter = n.max(1);
        self.uni.set_max_steps(self.max_iter);
    }

    /// Certifies the box: `Feasible`/`Inner` when a solution is proven,
    /// `Empty` when the box certainly contains none, `Maybe` otherwise.
    /// The box may shrink to the certified enclosure.
    pub fn certify(&self, b: &mut IntervalBox) -> Proof {
        // Inequalities first, by plain evaluation.
        let mut ineq_proof = Proof::Inner;
        for &fi in &self.ineq_funs {
            let e = self.dag.eval(fi, b);
            let image = self.dag.fun(fi).image();
            if e.is_empty() || !e.overlaps(&image) {
                return Proof::Empty;
            }
            if !image.contains_interval(&e) {
                ineq_proof = Proof::Maybe;
            }
        }

        if self.eq_funs.is_empty() {
            return ineq_proof;
        }

        let eq_proof = self.certify_equations(b);
        eq_proof.min(ineq_proof)
    }

    fn certify_equations(&self, b: &mut IntervalBox) -> Proof {
        // Univariate system: inflation-based local search.
        if self.eq_funs.len() == 1 && self.vars.len() == 1 {
            let v = &self.vars[0];
            let f = ThickFn::new(&self.dag, self.eq_funs[0], v, b);
            let mut x = b.get(v);
            let proof = self.uni.local_search(&f, &mut x);
            if proof == Proof::Feasible {
                b.set(v, x);
            }
            return proof;
        }

        // Non-square systems cannot be certified by this operator.
        if self.eq_funs.len() != self.vars.len() {
            return Proof::Maybe;
        }

        let mut work = b.clone();
        let mut dprev = f64::INFINITY;
        for _ in 0..self.max_iter {
            // Inflate the equation variables.
            let mut inflated = work.clone();
            for v in &self.vars {
                inflated.set(v, self.inflator.inflate(work.get(v)));
            }

            match krawczyk_step(&self.dag, &self.eq_funs, &self.vars, &inflated) {
                KrawczykOutcome::Empty => return Proof::Empty,
                KrawczykOutcome::Certified(ks) => {
                    for (v, k) in self.vars.iter().zip(ks.iter()) {
                        b.set(v, *k);
                    }
                    return Proof::Feasible;
                }
                KrawczykOutcome::Contracted(ks) => {
                    let mut dcur = 0.0f64;
                    for (v, k) in self.vars.iter().zip(ks.iter()) {
                        dcur = dcur.max(k.distance(&work.get(v)));
                        work.set(v, *k);
                    }
                    if dcur > dprev {
                        return Proof::Maybe;
                    }
                    dprev = dcur;
                }
                KrawczykOutcome::NoInfo => return Proof::Maybe,
            }
        }
        Proof::Maybe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::term::sqr;
    use ibis_core::{Constraint, Term};

    #[test]
    fn test_certify_univariate_root() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(1.0, 2.0, "x").unwrap();
        p.add_ctr(Constraint::eq(
            sqr(Term::var(&x)) - Term::from(2.0),
            Term::from(0.0),
        ));
        let prover = Prover::new(&p);
        let mut b = p.initial_box();
        let proof = prover.certify(&mut b);
        assert_eq!(proof, Proof::Feasible);
        assert!(b.get(&x).contains(2.0f64.sqrt()));
    }

    #[test]
    fn test_certify_square_system() {
        // x + y = 3, x - y = 1: solution (2, 1).
        let mut p = Problem::new("t");
        let x = p.add_real_var(1.5, 2.5, "x").unwrap();
        let y = p.add_real_var(0.5, 1.5, "y").unwrap();
        p.add_ctr(Constraint::eq(
            Term::var(&x) + Term::var(&y),
            Term::from(3.0),
        ));
        p.add_ctr(Constraint::eq(
            Term::var(&x) - Term::var(&y),
            Term::from(1.0),
        ));
        let prover = Prover::new(&p);
        let mut b = p.initial_box();
        let proof = prover.certify(&mut b);
        assert_eq!(proof, Proof::Feasible);
        assert!(b.get(&x).contains(2.0));
        assert!(b.get(&y).contains(1.0));
    }

    #[test]
    fn test_certify_nonlinear_system() {
        // x^2 + y^2 = 1, y = x: solution near (0.7071, 0.7071).
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.6, 0.8, "x").unwrap();
        let y = p.add_real_var(0.6, 0.8, "y").unwrap();
        p.add_ctr(Constraint::eq(
            sqr(Term::var(&x)) + sqr(Term::var(&y)),
            Term::from(1.0),
        ));
        p.add_ctr(Constraint::eq(Term::var(&y), Term::var(&x)));
        let prover = Prover::new(&p);
        let mut b = p.initial_box();
        let proof = prover.certify(&mut b);
        assert_eq!(proof, Proof::Feasible);
        let r = 0.5f64.sqrt();
        assert!(b.get(&x).contains(r));
        assert!(b.get(&y).contains(r));
    }

    #[test]
    fn test_certify_detects_empty_inequality() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(2.0, 3.0, "x").unwrap();
        p.add_ctr(Constraint::le(sqr(Term::var(&x)), Term::from(1.0)));
        let prover = Prover::new(&p);
        let mut b = p.initial_box();
        assert_eq!(prover.certify(&mut b), Proof::Empty);
    }

    #[test]
    fn test_inner_inequalities_without_equations() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.0, 0.5, "x").unwrap();
        p.add_ctr(Constraint::le(sqr(Term::var(&x)), Term::from(1.0)));
        let prover = Prover::new(&p);
        let mut b = p.initial_box();
        assert_eq!(prover.certify(&mut b), Proof::Inner);
    }
}
