//! Linear relaxation of the DAG and the LP backend interface.
//!
//! [`LpModel`] is the narrow interface the search drivers need from a
//! linear-programming backend: add variables with bounds, add one-sided
//! linear rows, set an objective, optimize, read values. It is backed by
//! `good_lp` with the Clarabel solver. The rows are retained by the model
//! so the same relaxation can be re-optimized with a new objective (the
//! backing problem is rebuilt per solve).
//!
//! [`LinearizerTaylor`] produces the relaxation rows: a first-order
//! interval Taylor form of every function, expanded at a corner of the
//! box and at the opposite corner, with the derivative bound chosen per
//! variable so that each row is a certified one-sided bound.

use good_lp::solvers::clarabel::clarabel;
use good_lp::{variable, variables, Expression, ResolutionError, Solution, SolverModel};
use hashbrown::HashMap;
use ibis_core::{Dag, FunId, Interval, IntervalBox, Scope, Variable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::rc::Rc;
use tracing::debug;

/// Outcome of an LP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    Optimal,
    Infeasible,
    Other,
}

/// A linear expression over LP variable indices.
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    terms: Vec<(f64, usize)>,
}

impl LinExpr {
    pub fn new() -> Self {
        LinExpr::default()
    }

    pub fn add_term(&mut self, coef: f64, var: usize) {
        self.terms.push((coef, var));
    }

    pub fn terms(&self) -> &[(f64, usize)] {
        &self.terms
    }
}

/// A linear program built row by row and solved with Clarabel.
#[derive(Default)]
pub struct LpModel {
    bounds: Vec<(f64, f64)>,
    // (expression, bound, upper?): expr <= bound when upper, expr >= bound
    // otherwise.
    rows: Vec<(LinExpr, f64, bool)>,
    obj: LinExpr,
    minimize: bool,
    values: Vec<f64>,
    obj_value: f64,
}

impl LpModel {
    pub fn new() -> Self {
        LpModel {
            minimize: true,
            ..Default::default()
        }
    }

    /// Adds a variable with bounds and returns its index.
    pub fn add_var(&mut self, lo: f64, hi: f64) -> usize {
        self.bounds.push((lo, hi));
        self.bounds.len() - 1
    }

    pub fn nb_vars(&self) -> usize {
        self.bounds.len()
    }

    /// Adds the row `expr <= ub`.
    pub fn add_ctr_le(&mut self, expr: LinExpr, ub: f64) {
        self.rows.push((expr, ub, true));
    }

    /// Adds the row `expr >= lb`.
    pub fn add_ctr_ge(&mut self, lb: f64, expr: LinExpr) {
        self.rows.push((expr, lb, false));
    }

    pub fn set_obj(&mut self, expr: LinExpr, minimize: bool) {
        self.obj = expr;
        self.minimize = minimize;
    }

    /// Solves the current rows with the current objective.
    pub fn optimize(&mut self) -> LpStatus {
        let mut vars = variables!();
        let gvars: Vec<good_lp::Variable> = self
            .bounds
            .iter()
            .map(|(lo, hi)| {
                let mut def = variable();
                if lo.is_finite() {
                    def = def.min(*lo);
                }
                if hi.is_finite() {
                    def = def.max(*hi);
                }
                vars.add(def)
            })
            .collect();

        let mut obj_expr = Expression::from(0.0);
        for (c, i) in self.obj.terms() {
            obj_expr += *c * gvars[*i];
        }

        let mut model = if self.minimize {
            vars.minimise(obj_expr).using(clarabel)
        } else {
            vars.maximise(obj_expr).using(clarabel)
        };

        for (expr, bound, upper) in &self.rows {
            let mut e = Expression::from(0.0);
            for (c, i) in expr.terms() {
                e += *c * gvars[*i];
            }
            model = model.with(if *upper { e.leq(*bound) } else { e.geq(*bound) });
        }

        match model.solve() {
            Ok(sol) => {
                self.values = gvars.iter().map(|v| sol.value(*v)).collect();
                self.obj_value = self
                    .obj
                    .terms()
                    .iter()
                    .map(|(c, i)| c * self.values[*i])
                    .sum();
                LpStatus::Optimal
            }
            Err(ResolutionError::Infeasible) => LpStatus::Infeasible,
            Err(e) => {
                debug!(error = %e, "LP solve failed");
                LpStatus::Other
            }
        }
    }

    /// Objective value of the last optimal solve.
    pub fn obj_value(&self) -> f64 {
        self.obj_value
    }

    /// Value of variable `i` in the last optimal solve.
    pub fn var_value(&self, i: usize) -> f64 {
        self.values[i]
    }
}

/// Corner strategy for the Taylor expansion points.
enum CornerStyle {
    /// Every variable expanded at its left bound (and the opposite corner).
    Fixed,
    /// Corner drawn per make from a seeded generator.
    Random(StdRng),
}

/// First-order interval Taylor relaxation of DAG functions.
pub struct LinearizerTaylor {
    dag: Rc<Dag>,
    funs: Vec<FunId>,
    scope: Scope,
    eq_tol: f64,
    style: CornerStyle,
    var_map: HashMap<usize, usize>,
}

impl LinearizerTaylor {
    /// Relaxation of the given functions; `random_corner` draws a fresh
    /// expansion corner per [`LinearizerTaylor::make`].
    pub fn new(dag: Rc<Dag>, funs: Vec<FunId>, eq_tol: f64, random_corner: bool) -> Self {
        let mut scope = Scope::new();
        for &i in &funs {
            scope.insert_scope(dag.fun(i).scope());
        }
        let scope = ibis_core::ScopeBank::intern(scope);
        LinearizerTaylor {
            dag,
            funs,
            scope,
            eq_tol,
            style: if random_corner {
                CornerStyle::Random(StdRng::seed_from_u64(0x5eed))
            } else {
                CornerStyle::Fixed
            },
            var_map: HashMap::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// LP index of a variable after a successful `make`.
    pub fn lin_var_index(&self, v: &Variable) -> Option<usize> {
        self.var_map.get(&v.id()).copied()
    }

    /// Builds the relaxation rows of the current box into `lp`.
    ///
    /// Returns false (leaving `lp` partially filled but unused) when the
    /// box is unbounded or a function value or derivative degenerates;
    /// callers then skip the relaxation step for this box.
    pub fn make(&mut self, lp: &mut LpModel, b: &IntervalBox) -> bool {
        let n = self.scope.size();
        if n == 0 {
            return false;
        }

        // Expansion corner of this round.
        let bits: Vec<bool> = match &mut self.style {
            CornerStyle::Fixed => vec![false; n],
            CornerStyle::Random(rng) => (0..n).map(|_| rng.gen_bool(0.5)).collect(),
        };

        // One LP variable per scope variable, bounded by the box.
        self.var_map.clear();
        for v in self.scope.iter() {
            let dom = b.get(v);
            if !dom.is_finite() {
                return false;
            }
            let idx = lp.add_var(dom.left(), dom.right());
            self.var_map.insert(v.id(), idx);
        }

        // The two opposite expansion corners.
        let restricted = b.restrict(&self.scope);
        let c1 = restricted.corner(&bits);
        let flipped: Vec<bool> = bits.iter().map(|x| !x).collect();
        let c2 = restricted.corner(&flipped);

        for &fi in &self.funs {
            let f = self.dag.fun(fi);
            let fc1 = self.dag.eval_point(fi, &c1);
            let fc2 = self.dag.eval_point(fi, &c2);
            if fc1.is_empty() || fc2.is_empty() {
                return false;
            }

            let grad = self.dag.gradient(fi, b);
            if grad.iter().any(|g| g.is_empty() || g.is_inf()) {
                return false;
            }

            // An equation is slackened into a thin band.
            let mut img = f.image();
            if img.is_singleton() {
                img = img + Interval::new(-self.eq_tol, self.eq_tol);
            }

            // Lower-bounding rows: sum a_i x_i <= U - f(c) + sum a_i c_i,
            // one per corner, with a_i the derivative bound matching the
            // corner side.
            if img.right().is_finite() {
                let mut u1 = Interval::singleton(img.right()) - fc1;
                let mut u2 = Interval::singleton(img.right()) - fc2;
                let mut lo1 = LinExpr::new();
                let mut lo2 = LinExpr::new();

                for (pos, v) in f.scope().iter().enumerate() {
                    let lv = self.var_map[&v.id()];
                    let z = grad[pos];
                    let at_right = bits[self.scope.index_of(v).unwrap_or(0)];
                    if at_right {
                        lo1.add_term(z.right(), lv);
                        u1 = u1 + Interval::singleton(z.right()) * Interval::singleton(c1.get(v));
                        lo2.add_term(z.left(), lv);
                        u2 = u2 + Interval::singleton(z.left()) * Interval::singleton(c2.get(v));
                    } else {
                        lo1.add_term(z.left(), lv);
                        u1 = u1 + Interval::singleton(z.left()) * Interval::singleton(c1.get(v));
                        lo2.add_term(z.right(), lv);
                        u2 = u2 + Interval::singleton(z.right()) * Interval::singleton(c2.get(v));
                    }
                }
                if !u1.right().is_finite() || !u2.right().is_finite() {
                    return false;
                }
                lp.add_ctr_le(lo1, u1.right());
                lp.add_ctr_le(lo2, u2.right());
            }

            // Upper-bounding rows: sum b_i x_i >= L - f(c) + sum b_i c_i.
            if img.left().is_finite() {
                let mut l1 = Interval::singleton(img.left()) - fc1;
                let mut l2 = Interval::singleton(img.left()) - fc2;
                let mut up1 = LinExpr::new();
                let mut up2 = LinExpr::new();

                for (pos, v) in f.scope().iter().enumerate() {
                    let lv = self.var_map[&v.id()];
                    let z = grad[pos];
                    let at_right = bits[self.scope.index_of(v).unwrap_or(0)];
                    if at_right {
                        up1.add_term(z.left(), lv);
                        l1 = l1 + Interval::singleton(z.left()) * Interval::singleton(c1.get(v));
                        up2.add_term(z.right(), lv);
                        l2 = l2 + Interval::singleton(z.right()) * Interval::singleton(c2.get(v));
                    } else {
                        up1.add_term(z.right(), lv);
                        l1 = l1 + Interval::singleton(z.right()) * Interval::singleton(c1.get(v));
                        up2.add_term(z.left(), lv);
                        l2 = l2 + Interval::singleton(z.left()) * Interval::singleton(c2.get(v));
                    }
                }
                if !l1.left().is_finite() || !l2.left().is_finite() {
                    return false;
                }
                lp.add_ctr_ge(l1.left(), up1);
                lp.add_ctr_ge(l2.left(), up2);
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::term::sqr;
    use ibis_core::{Constraint, Problem, Term};

    #[test]
    fn test_lp_model_simple() {
        // min x + y s.t. x + y >= 1, 0 <= x, y <= 2
        let mut lp = LpModel::new();
        let x = lp.add_var(0.0, 2.0);
        let y = lp.add_var(0.0, 2.0);
        let mut row = LinExpr::new();
        row.add_term(1.0, x);
        row.add_term(1.0, y);
        lp.add_ctr_ge(1.0, row.clone());
        lp.set_obj(row, true);
        assert_eq!(lp.optimize(), LpStatus::Optimal);
        assert!((lp.obj_value() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lp_model_infeasible() {
        let mut lp = LpModel::new();
        let x = lp.add_var(0.0, 1.0);
        let mut row = LinExpr::new();
        row.add_term(1.0, x);
        lp.add_ctr_ge(5.0, row.clone());
        lp.set_obj(row, true);
        assert_eq!(lp.optimize(), LpStatus::Infeasible);
    }

    #[test]
    fn test_taylor_relaxation_encloses_feasible_points() {
        // x^2 - y = 0 on x in [0, 2], y in [0, 4].
        let mut p = Problem::new("t");
        let x = p.add_real_var(0.0, 2.0, "x").unwrap();
        let y = p.add_real_var(0.0, 4.0, "y").unwrap();
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(sqr(Term::var(&x)), Term::var(&y)));
        let dag = Rc::new(dag);

        let mut lin = LinearizerTaylor::new(dag, vec![0], 1e-8, false);
        let mut lp = LpModel::new();
        let b = p.initial_box();
        assert!(lin.make(&mut lp, &b));

        // Minimizing y over the relaxation must not exceed the true
        // minimum of y on the curve (which is 0 at x = 0).
        let iy = lin.lin_var_index(&y).unwrap();
        let mut obj = LinExpr::new();
        obj.add_term(1.0, iy);
        lp.set_obj(obj, true);
        assert_eq!(lp.optimize(), LpStatus::Optimal);
        assert!(lp.obj_value() <= 1e-6);
    }

    #[test]
    fn test_make_rejects_unbounded_box() {
        let mut p = Problem::new("t");
        let x = p.add_real_var_on(ibis_core::Interval::positive(), "x").unwrap();
        let mut dag = Dag::new();
        dag.insert(&Constraint::eq(sqr(Term::var(&x)), Term::from(1.0)));
        let dag = Rc::new(dag);
        let mut lin = LinearizerTaylor::new(dag, vec![0], 1e-8, true);
        let mut lp = LpModel::new();
        assert!(!lin.make(&mut lp, &p.initial_box()));
    }
}
