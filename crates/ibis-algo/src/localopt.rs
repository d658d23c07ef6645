//! Local (non-rigorous) minimization used for upper bounds.
//!
//! The branch-and-bound driver asks a local optimizer for a good feasible
//! point inside a node box; the returned point is then re-evaluated with
//! interval arithmetic, so the optimizer itself does not need to be
//! rigorous - only its end point matters.
//!
//! The implementation converts the bound-constrained problem into a
//! sequence of unconstrained ones with an exterior quadratic penalty and
//! solves each with L-BFGS under a More-Thuente line search. Both the
//! objective values and the gradients come from the DAG: values by safe
//! point evaluation, gradients as the midpoints of the reverse-mode
//! interval gradients at the degenerate point box.

use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use ibis_core::{Dag, FunId, IntervalBox, RealPoint, Scope};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::debug;

/// Status reported by optimizers and the branch-and-bound driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationStatus {
    Optimal,
    Infeasible,
    StopOnTimeLimit,
    StopOnNodeLimit,
    Other,
}

impl std::fmt::Display for OptimizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OptimizationStatus::Optimal => "optimal",
            OptimizationStatus::Infeasible => "infeasible",
            OptimizationStatus::StopOnTimeLimit => "stop on time limit",
            OptimizationStatus::StopOnNodeLimit => "stop on node limit",
            OptimizationStatus::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// Local solver collaborator interface: minimize over a region from a
/// starting point, return a status and the end point.
pub trait LocalOptimizer {
    fn minimize(&mut self, region: &IntervalBox, start: &RealPoint)
        -> (OptimizationStatus, RealPoint);
}

/// DAG-evaluated objective with exterior quadratic penalty for box-bound
/// violations.
struct PenaltyProblem<'a> {
    dag: &'a Dag,
    fun: FunId,
    scope: &'a Scope,
    lb: &'a [f64],
    ub: &'a [f64],
    penalty: f64,
}

impl PenaltyProblem<'_> {
    fn point(&self, x: &[f64]) -> RealPoint {
        RealPoint::new(self.scope.clone(), x.to_vec())
    }

    fn raw_cost(&self, x: &[f64]) -> f64 {
        let e = self.dag.eval_point(self.fun, &self.point(x));
        let mut cost = e.midpoint();
        if !cost.is_finite() {
            return 1.0e30;
        }
        for i in 0..x.len() {
            if x[i] < self.lb[i] {
                let d = self.lb[i] - x[i];
                cost += self.penalty * d * d;
            }
            if x[i] > self.ub[i] {
                let d = x[i] - self.ub[i];
                cost += self.penalty * d * d;
            }
        }
        if cost.is_finite() {
            cost
        } else {
            1.0e30
        }
    }
}

impl CostFunction for PenaltyProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.raw_cost(x))
    }
}

impl Gradient for PenaltyProblem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        // Analytic slopes: the interval gradient at the degenerate point
        // box collapses to the usual derivative (a generalized slope at
        // the kinks of abs/min/max), plus the penalty derivatives.
        let b = self.point(x).to_box();
        let grad = self.dag.gradient(self.fun, &b);
        let fscope = self.dag.fun(self.fun).scope();

        let mut g = vec![0.0; x.len()];
        for (i, v) in self.scope.iter().enumerate() {
            let gi = match fscope.index_of(v) {
                Some(pos) => grad[pos].midpoint(),
                None => 0.0,
            };
            g[i] = if gi.is_finite() { gi } else { 0.0 };
            if x[i] < self.lb[i] {
                g[i] -= 2.0 * self.penalty * (self.lb[i] - x[i]);
            }
            if x[i] > self.ub[i] {
                g[i] += 2.0 * self.penalty * (x[i] - self.ub[i]);
            }
        }
        Ok(g)
    }
}

/// Penalty + L-BFGS local optimizer over one DAG function.
pub struct LbfgsOptimizer {
    dag: Rc<Dag>,
    fun: FunId,
    scope: Scope,
    iter_limit: u64,
}

impl LbfgsOptimizer {
    /// `fun` is the DAG handle of the minimized function and `scope` its
    /// decision variables; `iter_limit` bounds the total number of L-BFGS
    /// iterations across the penalty rounds.
    pub fn new(dag: Rc<Dag>, fun: FunId, scope: Scope, iter_limit: u64) -> Self {
        LbfgsOptimizer {
            dag,
            fun,
            scope,
            iter_limit: iter_limit.max(1),
        }
    }
}

impl LocalOptimizer for LbfgsOptimizer {
    fn minimize(
        &mut self,
        region: &IntervalBox,
        start: &RealPoint,
    ) -> (OptimizationStatus, RealPoint) {
        let lb: Vec<f64> = self.scope.iter().map(|v| region.get(v).left()).collect();
        let ub: Vec<f64> = self.scope.iter().map(|v| region.get(v).right()).collect();
        let mut x: Vec<f64> = self.scope.iter().map(|v| start.get(v)).collect();

        let mut penalty = 1000.0;
        let max_penalty_iters = 3u64;
        let inner_max_iter = (self.iter_limit / max_penalty_iters).max(1);
        let mut succeeded = false;

        for _ in 0..max_penalty_iters {
            let problem = PenaltyProblem {
                dag: &self.dag,
                fun: self.fun,
                scope: &self.scope,
                lb: &lb,
                ub: &ub,
                penalty,
            };

            let linesearch = MoreThuenteLineSearch::new();
            let solver = LBFGS::new(linesearch, 7);
            let executor = Executor::new(problem, solver)
                .configure(|state| state.param(x.clone()).max_iters(inner_max_iter));

            match executor.run() {
                Ok(res) => {
                    if let Some(best) = res.state().get_best_param() {
                        x = best.clone();
                        succeeded = true;
                    }
                }
                Err(e) => {
                    // A failed line search is not fatal: the next penalty
                    // round restarts from the current point.
                    debug!(error = %e, "local L-BFGS round failed");
                }
            }

            penalty *= 10.0;
        }

        // Clamp into the region; the caller certifies the point anyway.
        for (i, v) in (0..x.len()).zip(self.scope.iter()) {
            let dom = region.get(v);
            x[i] = x[i].clamp(dom.left(), dom.right());
        }

        let mut end = start.clone();
        for (i, v) in (0..x.len()).zip(self.scope.iter()) {
            end.set(v, x[i]);
        }

        let status = if succeeded {
            OptimizationStatus::Optimal
        } else {
            OptimizationStatus::Other
        };
        (status, end)
    }
}
