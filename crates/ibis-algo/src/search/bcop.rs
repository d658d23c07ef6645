//! Branch-and-bound driver for bound-constrained optimization.
//!
//! The problem `min f(x)` over variable bounds is extended with an
//! objective variable `z` and the equation `z - f = 0` (maximization
//! minimizes `-f`, the enclosure is negated on output). The search keeps a
//! best-known upper bound `u`; a node is fathomed when its lower bound on
//! `z` exceeds `u`. Lower bounds come from interval evaluation, the
//! propagated domain of `z` and the LP optimum of a Taylor relaxation;
//! upper bounds come from a local solver run at the node midpoint followed
//! by a safe interval evaluation at the returned point.

use crate::contractor::{
    BoContractor, Contractor, ContractorPool, Hc4Contractor, IntContractor, ListContractor,
    MaxCidContractor, Propagator,
};
use crate::localopt::{LbfgsOptimizer, LocalOptimizer, OptimizationStatus};
use crate::params::Params;
use crate::relax::{LinExpr, LinearizerTaylor, LpModel, LpStatus};
use crate::split::{
    Bisecter, HybridSsrLfSelector, IntervalSlicer, LargestFirstSelector, Partitioner, Peeler,
    RoundRobinSelector, SmallestFirstSelector, SmallestLargestSelector, SsrSelector, VarSelector,
};
use ibis_core::{
    term, Constraint, Dag, FunId, IbisError, IbisResult, Interval, IntervalBox, Problem, Proof,
    RealPoint, Scope, ScopeBank, Term, Tolerance, VarKind, Variable,
};
use std::rc::Rc;
use tracing::{debug, info};
use web_time::Instant;

use super::node::{BcopNode, SharedBcopNode};

/// DAG-backed model of a bound-constrained optimization problem: one
/// derivative equation per objective variable and the objective equation
/// `z - f = 0` over a fresh objective variable.
pub struct BcopModel {
    problem: Problem,
    dag: Rc<Dag>,
    z: Variable,
    obj_scope: Scope,
    full_scope: Scope,
    deriv_funs: Vec<(Variable, FunId)>,
    obj_fun: FunId,
    // Pure value/gradient handle on the minimized term, for the local
    // solver (universe image, never contracted).
    f_fun: FunId,
    minimize: bool,
    // f for minimization, -f for maximization: the search always
    // minimizes this term.
    obj_term: Term,
}

impl BcopModel {
    pub fn new(src: &Problem) -> IbisResult<Self> {
        let obj = src
            .obj()
            .ok_or_else(|| IbisError::Structure("BCOP model without an objective".into()))?;

        // Rebuild the variables so the objective variable gets the next
        // dense id.
        let mut problem = Problem::new(src.name());
        for v in src.vars() {
            problem.add_var_with(v.domain(), v.name(), v.kind(), Some(v.tolerance()))?;
        }

        let f = obj.term().clone();
        let minimize = obj.is_minimization();
        let obj_term = if minimize { f } else { term::neg(f) };
        let obj_scope = ScopeBank::intern(obj_term.scope());

        for v in src.vars() {
            if !obj_scope.contains(v) {
                return Err(IbisError::Structure(format!(
                    "variable {} does not occur in the objective function",
                    v.name()
                )));
            }
        }

        let mut dag = Dag::new();
        let mut deriv_funs = Vec::new();
        for v in obj_scope.iter() {
            let d = term::derive(&obj_term, v)?;
            let fi = dag.insert(&Constraint::eq(d, Term::from(0.0)));
            deriv_funs.push((v.clone(), fi));
        }

        let z = problem.add_var_with(Interval::universe(), "_z", VarKind::Real, None)?;
        let obj_fun = dag.insert(&Constraint::eq(
            Term::var(&z) - obj_term.clone(),
            Term::from(0.0),
        ));
        let f_fun = dag.insert(&Constraint::in_(obj_term.clone(), Interval::universe()));

        let mut full_scope = obj_scope.clone();
        full_scope.insert(&z);
        let full_scope = ScopeBank::intern(full_scope);

        Ok(BcopModel {
            problem,
            dag: Rc::new(dag),
            z,
            obj_scope,
            full_scope,
            deriv_funs,
            obj_fun,
            f_fun,
            minimize,
            obj_term,
        })
    }

    pub fn dag(&self) -> &Rc<Dag> {
        &self.dag
    }

    pub fn obj_var(&self) -> &Variable {
        &self.z
    }

    pub fn obj_scope(&self) -> &Scope {
        &self.obj_scope
    }

    pub fn full_scope(&self) -> &Scope {
        &self.full_scope
    }

    pub fn is_minimization(&self) -> bool {
        self.minimize
    }

    /// The initial region: declared domains plus the universe domain of z.
    pub fn initial_box(&self) -> IntervalBox {
        self.problem.initial_box()
    }
}

/// Pending-node container: DFS bursts interleaved with lowest-lower-bound
/// extractions every `frequency` pops.
struct BcopSpace {
    nodes: Vec<SharedBcopNode>,
    frequency: u64,
    count: u64,
}

impl BcopSpace {
    fn new(frequency: u64) -> Self {
        BcopSpace {
            nodes: Vec::new(),
            frequency: frequency.max(1),
            count: 0,
        }
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, node: SharedBcopNode) {
        self.nodes.push(node);
    }

    fn extract(&mut self) -> Option<SharedBcopNode> {
        if self.nodes.is_empty() {
            return None;
        }
        self.count += 1;
        if self.count % self.frequency == 0 {
            let mut best = 0;
            for i in 1..self.nodes.len() {
                if self.nodes[i].borrow().lower() < self.nodes[best].borrow().lower() {
                    best = i;
                }
            }
            Some(self.nodes.remove(best))
        } else {
            self.nodes.pop()
        }
    }

    fn lowest_lower_bound(&self) -> f64 {
        self.nodes
            .iter()
            .map(|n| n.borrow().lower())
            .fold(f64::INFINITY, f64::min)
    }

    /// Fathoms every node whose lower bound exceeds the incumbent.
    fn simplify(&mut self, u: f64) {
        self.nodes.retain(|n| n.borrow().lower() <= u);
    }
}

/// Branch-and-bound solver for BCOPs.
pub struct BcopSolver {
    model: BcopModel,
    params: Params,
    contractor: Box<dyn Contractor>,
    selector: Box<dyn VarSelector>,
    slicer: Box<dyn IntervalSlicer>,
    local: Box<dyn LocalOptimizer>,
    linearizer: LinearizerTaylor,
    obj_tol: Tolerance,
    status: OptimizationStatus,
    sol: Option<RealPoint>,
    obj_val: Interval,
    upper: f64,
    nb_nodes: u64,
    nb_pending: usize,
    preprocessing_time: f64,
    solving_time: f64,
}

impl BcopSolver {
    pub fn new(problem: &Problem, params: Params) -> IbisResult<Self> {
        let started = Instant::now();

        if !problem.is_bcop() {
            return Err(IbisError::Structure(
                "BO solver applied to a problem that is not a bound-constrained \
                 optimization problem"
                    .into(),
            ));
        }

        let model = BcopModel::new(problem)?;
        let contractor = Self::make_contractor(&model, &params)?;
        let (selector, slicer) = Self::make_split(&model, &params)?;

        let local = Box::new(LbfgsOptimizer::new(
            model.dag.clone(),
            model.f_fun,
            model.obj_scope.clone(),
            params.get_int("LOCAL_SOLVER_ITER_LIMIT")?.max(1) as u64,
        ));

        // Relaxing the objective equation gives certified LP lower bounds
        // on z. The derivative equations are deliberately left out: their
        // rows only hold at interior minimizers.
        let linearizer = LinearizerTaylor::new(
            model.dag.clone(),
            vec![model.obj_fun],
            params.get_dbl("RELAXATION_EQ_TOL")?,
            params.get_str("RELAXATION_CORNER")? == "RANDOM",
        );

        let obj_tol = params.get_tol("OBJ_TOL")?;

        Ok(BcopSolver {
            model,
            params,
            contractor,
            selector,
            slicer,
            local,
            linearizer,
            obj_tol,
            status: OptimizationStatus::Other,
            sol: None,
            obj_val: Interval::universe(),
            upper: f64::INFINITY,
            nb_nodes: 0,
            nb_pending: 0,
            preprocessing_time: started.elapsed().as_secs_f64(),
            solving_time: 0.0,
        })
    }

    fn make_contractor(model: &BcopModel, params: &Params) -> IbisResult<Box<dyn Contractor>> {
        let tol = params.propagation_tol()?;
        let max_iter = params.get_int("PROPAGATION_ITER_LIMIT")?.max(1) as usize;
        let init = Rc::new(model.initial_box());

        let mut pool = ContractorPool::new();
        for (v, fi) in &model.deriv_funs {
            let op = Box::new(Hc4Contractor::new(model.dag.clone(), *fi)?);
            // Without a presolve phase every node may touch the initial
            // bounds, so each derivative equation is boundary-guarded.
            pool.push(Box::new(BoContractor::new(
                model.dag.clone(),
                *fi,
                v.clone(),
                op,
                init.clone(),
            )));
        }
        pool.push(Box::new(Hc4Contractor::new(
            model.dag.clone(),
            model.obj_fun,
        )?));

        let propagator = Propagator::new(pool, tol, max_iter);

        let base: Box<dyn Contractor> = match params.get_str("PROPAGATION_ALGORITHM")? {
            "MAX_CID_HC4" => Box::new(MaxCidContractor::new(
                Box::new(propagator),
                Box::new(Partitioner::new(
                    params.get_int("SPLIT_NB_SLICES")?.max(2) as usize
                )?),
            )),
            _ => Box::new(propagator),
        };

        let discrete: Vec<_> = model
            .problem
            .vars()
            .iter()
            .filter(|v| v.is_discrete())
            .cloned()
            .collect();
        if discrete.is_empty() {
            Ok(base)
        } else {
            let mut ic = IntContractor::new();
            for v in &discrete {
                ic.insert(v)?;
            }
            let mut list = ListContractor::new();
            list.push(base);
            list.push(Box::new(ic));
            Ok(Box::new(list))
        }
    }

    fn make_split(
        model: &BcopModel,
        params: &Params,
    ) -> IbisResult<(Box<dyn VarSelector>, Box<dyn IntervalSlicer>)> {
        let scope = if params.get_str("SPLIT_OBJECTIVE")? == "YES" {
            model.full_scope.clone()
        } else {
            model.obj_scope.clone()
        };
        let funs: Vec<FunId> = (0..model.dag.nb_funs()).collect();

        let selector: Box<dyn VarSelector> = match params.get_str("SPLIT_SELECTION")? {
            "RR" => Box::new(RoundRobinSelector::new(scope)),
            "LF" => Box::new(LargestFirstSelector::new(scope)),
            "SF" => Box::new(SmallestFirstSelector::new(scope)),
            "SLF" => Box::new(SmallestLargestSelector::new(scope)),
            "SSR" => Box::new(SsrSelector::new(model.dag.clone(), funs, scope)),
            "SSR_LF" => {
                let ssr = SsrSelector::new(model.dag.clone(), funs, scope);
                let freq = params.get_int("SPLIT_SSR_LF_FREQUENCY")?.max(1) as usize;
                Box::new(HybridSsrLfSelector::new(ssr, freq))
            }
            "ASR" => Box::new(SsrSelector::average(model.dag.clone(), funs, scope)),
            other => {
                return Err(IbisError::Structure(format!(
                    "bad split selection strategy {other}"
                )))
            }
        };

        let slicer: Box<dyn IntervalSlicer> = match params.get_str("SPLIT_SLICING")? {
            "PEELING" => Box::new(Peeler::new(params.get_dbl("SPLIT_PEEL_FACTOR")?)?),
            "PARTITION" => {
                Box::new(Partitioner::new(params.get_int("SPLIT_NB_SLICES")?.max(2) as usize)?)
            }
            _ => Box::new(Bisecter),
        };

        Ok((selector, slicer))
    }

    /// Lower bound of a node from the propagated `z` domain and the LP
    /// relaxation. The built relaxation is returned for the polytope
    /// reduction step.
    fn calculate_lower(&mut self, node: &SharedBcopNode) -> Option<LpModel> {
        {
            let mut n = node.borrow_mut();
            let zl = n.boxx().get(&self.model.z).left();
            n.set_lower(zl);
        }

        let mut lp = LpModel::new();
        let built = {
            let n = node.borrow();
            self.linearizer.make(&mut lp, n.boxx())
        };
        if !built {
            return None;
        }
        let iz = self.linearizer.lin_var_index(&self.model.z)?;
        let mut obj = LinExpr::new();
        obj.add_term(1.0, iz);
        lp.set_obj(obj, true);

        if lp.optimize() == LpStatus::Optimal {
            let lb = lp.obj_value();
            let mut n = node.borrow_mut();
            if lb > n.lower() {
                debug!(node = n.node().index(), lb, "lower bound improved by the relaxation");
                n.set_lower(lb);
            }
        }
        Some(lp)
    }

    /// Min/maximizes each objective variable over the relaxation and
    /// intersects its domain with the certified-side bounds.
    fn reduce_polytope(&mut self, node: &SharedBcopNode, lp: &mut LpModel) -> Proof {
        const MARGIN: f64 = 1.0e-8;
        for v in self.model.obj_scope.clone().iter() {
            let iv = match self.linearizer.lin_var_index(v) {
                Some(i) => i,
                None => continue,
            };
            let mut obj = LinExpr::new();
            obj.add_term(1.0, iv);

            lp.set_obj(obj.clone(), true);
            match lp.optimize() {
                LpStatus::Infeasible => return Proof::Empty,
                LpStatus::Optimal => {
                    let mut n = node.borrow_mut();
                    let x = n
                        .boxx()
                        .get(v)
                        .inter(&Interval::more_than(lp.obj_value() - MARGIN));
                    if x.is_empty() {
                        return Proof::Empty;
                    }
                    n.boxx_mut().set(v, x);
                }
                LpStatus::Other => return Proof::Maybe,
            }

            lp.set_obj(obj, false);
            match lp.optimize() {
                LpStatus::Infeasible => return Proof::Empty,
                LpStatus::Optimal => {
                    let mut n = node.borrow_mut();
                    let x = n
                        .boxx()
                        .get(v)
                        .inter(&Interval::less_than(lp.obj_value() + MARGIN));
                    if x.is_empty() {
                        return Proof::Empty;
                    }
                    n.boxx_mut().set(v, x);
                }
                LpStatus::Other => return Proof::Maybe,
            }
        }
        Proof::Maybe
    }

    /// Upper bound of a node: local descent from the midpoint, certified
    /// by a safe interval evaluation at the end point.
    fn calculate_upper(&mut self, node: &SharedBcopNode) {
        let (region, start) = {
            let n = node.borrow();
            let region = n.boxx().restrict(&self.model.obj_scope);
            let start = region.midpoint();
            (region, start)
        };

        let (status, end) = self.local.minimize(&region, &start);
        if status != OptimizationStatus::Optimal {
            return;
        }

        let e = self.model.obj_term.eval(&end.to_box());
        if e.is_empty() || !e.right().is_finite() {
            return;
        }
        let u = e.right();
        node.borrow_mut().set_upper(u);

        if u < self.upper {
            self.sol = Some(end);
            self.obj_val = self.obj_tol.max_interval_dn(u);
            self.upper = self.obj_val.left();
            debug!(u, refined = self.upper, "new upper bound of the global optimum");
        }
    }

    fn split(&mut self, node: &SharedBcopNode) -> Vec<SharedBcopNode> {
        let n = node.borrow();
        let v = match self
            .selector
            .select(n.boxx(), n.node().last_split())
        {
            Some(v) => v,
            None => return Vec::new(),
        };
        let mut slices = self.slicer.apply(n.boxx().get(&v));
        if v.is_discrete() {
            slices = slices
                .into_iter()
                .map(|s| s.round())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if slices.len() < 2 {
            return Vec::new();
        }
        let mut children = Vec::with_capacity(slices.len());
        for s in slices {
            self.nb_nodes += 1;
            children.push(Rc::new(std::cell::RefCell::new(
                n.child(&v, s, self.nb_nodes),
            )));
        }
        children
    }

    fn find_initial_bounds(&mut self, node: &SharedBcopNode) -> bool {
        {
            let mut n = node.borrow_mut();
            let e = self.model.obj_term.eval(n.boxx());
            if e.is_empty() {
                return false;
            }
            n.set_lower(e.left());
        }
        self.calculate_lower(node);
        self.calculate_upper(node);

        let mut n = node.borrow_mut();
        let z = Interval::new(n.lower(), self.upper.min(n.upper()).max(n.lower()));
        if z.is_empty() {
            return false;
        }
        n.boxx_mut().set(&self.model.z, z);
        true
    }

    fn bb_step(&mut self, space: &mut BcopSpace, sols: &mut BcopSpace) -> bool {
        let node = match space.extract() {
            Some(n) => n,
            None => return false,
        };

        let children = self.split(&node);
        if children.len() <= 1 {
            debug!(node = node.borrow().node().index(), "node stored as a solution");
            sols.insert(node);
            return true;
        }

        for child in children {
            // Fathoming by the bound test.
            let z = child.borrow().boxx().get(&self.model.z);
            if z.left() > self.upper {
                debug!("node fathomed by the bound test");
                continue;
            }
            if z.right() > self.upper {
                let clipped = Interval::new(z.left(), self.upper);
                child.borrow_mut().boxx_mut().set(&self.model.z, clipped);
            }

            let proof = {
                let mut c = child.borrow_mut();
                self.contractor.contract(c.boxx_mut())
            };
            if proof == Proof::Empty {
                continue;
            }

            let lp = self.calculate_lower(&child);
            self.calculate_upper(&child);

            if let Some(mut lp) = lp {
                if self.reduce_polytope(&child, &mut lp) == Proof::Empty {
                    debug!("node fathomed by the polytope reduction");
                    continue;
                }
            }
            space.insert(child);
        }

        space.simplify(self.upper);
        sols.simplify(self.upper);
        true
    }

    /// Runs the optimization; the outcome is read through
    /// [`BcopSolver::status`], [`BcopSolver::obj_enclosure`] and
    /// [`BcopSolver::best_solution`].
    pub fn optimize(&mut self) {
        let started = Instant::now();
        self.status = OptimizationStatus::Other;
        self.upper = f64::INFINITY;
        self.obj_val = Interval::universe();
        self.nb_nodes = 1;

        let time_limit = self.params.get_dbl("TIME_LIMIT").unwrap_or(f64::INFINITY);
        let node_limit = self.params.get_int("NODE_LIMIT").unwrap_or(i64::MAX).max(1) as u64;
        let frequency = self.params.get_int("BB_SPACE_FREQUENCY").unwrap_or(1).max(1) as u64;

        let root = BcopNode::shared(self.model.initial_box());
        if !self.find_initial_bounds(&root) {
            self.status = OptimizationStatus::Infeasible;
            self.solving_time = started.elapsed().as_secs_f64();
            return;
        }

        info!(problem = self.model.problem.name(), "branch-and-bound starts");

        let mut space = BcopSpace::new(frequency);
        space.insert(root);
        let mut sols = BcopSpace::new(frequency);

        loop {
            let more = self.bb_step(&mut space, &mut sols);

            let lb = space.lowest_lower_bound().min(sols.lowest_lower_bound());

            if !more || space.is_empty() {
                self.status = OptimizationStatus::Optimal;
                if lb.is_finite() {
                    self.obj_val = Interval::new(lb.min(self.obj_val.right()), self.obj_val.right());
                }
                break;
            }
            if self.upper.is_finite() && lb >= self.obj_val.left() {
                // The lowest open lower bound meets the incumbent within
                // the objective tolerance: the enclosure is closed.
                self.status = OptimizationStatus::Optimal;
                self.obj_val = Interval::new(lb, self.obj_val.right().max(lb));
                break;
            }
            if self.preprocessing_time + started.elapsed().as_secs_f64() > time_limit {
                self.status = OptimizationStatus::StopOnTimeLimit;
                if lb.is_finite() {
                    self.obj_val = Interval::new(lb.min(self.obj_val.right()), self.obj_val.right());
                }
                break;
            }
            if self.nb_nodes > node_limit {
                self.status = OptimizationStatus::StopOnNodeLimit;
                if lb.is_finite() {
                    self.obj_val = Interval::new(lb.min(self.obj_val.right()), self.obj_val.right());
                }
                break;
            }
        }

        self.nb_pending = space.len();
        self.solving_time = started.elapsed().as_secs_f64();
        info!(
            nodes = self.nb_nodes,
            pending = self.nb_pending,
            status = %self.status,
            "branch-and-bound ends"
        );
    }

    pub fn status(&self) -> OptimizationStatus {
        self.status
    }

    /// Enclosure of the global optimum, in the sense of the original
    /// objective (negated back for maximization).
    pub fn obj_enclosure(&self) -> Interval {
        if self.model.minimize {
            self.obj_val
        } else {
            -self.obj_val
        }
    }

    /// The best point found by the upper-bounding side, if any.
    pub fn best_solution(&self) -> Option<&RealPoint> {
        self.sol.as_ref()
    }

    pub fn nb_nodes(&self) -> u64 {
        self.nb_nodes
    }

    pub fn nb_pending(&self) -> usize {
        self.nb_pending
    }

    pub fn preprocessing_time(&self) -> f64 {
        self.preprocessing_time
    }

    pub fn solving_time(&self) -> f64 {
        self.solving_time
    }

    pub fn model(&self) -> &BcopModel {
        &self.model
    }

    /// Summary of the last optimization, stamped for logs and archives.
    pub fn report(&self) -> BcopReport {
        let enc = self.obj_enclosure();
        BcopReport {
            problem: self.model.problem.name().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            status: self.status,
            obj_lower: enc.left(),
            obj_upper: enc.right(),
            nb_nodes: self.nb_nodes,
            nb_pending: self.nb_pending,
            preprocessing_time: self.preprocessing_time,
            solving_time: self.solving_time,
        }
    }
}

/// Serializable summary of a finished optimization.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BcopReport {
    pub problem: String,
    pub generated_at: String,
    pub status: OptimizationStatus,
    pub obj_lower: f64,
    pub obj_upper: f64,
    pub nb_nodes: u64,
    pub nb_pending: usize,
    pub preprocessing_time: f64,
    pub solving_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_core::term::sqr;
    use ibis_core::Objective;

    #[test]
    fn test_model_structure() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(-1.0, 1.0, "x").unwrap();
        p.set_obj(Objective::minimize(sqr(Term::var(&x))));
        let m = BcopModel::new(&p).unwrap();
        assert_eq!(m.deriv_funs.len(), 1);
        assert_eq!(m.obj_scope().size(), 1);
        assert_eq!(m.full_scope().size(), 2);
        assert!(m.obj_var().name().starts_with("_z"));
    }

    #[test]
    fn test_model_rejects_fake_variable() {
        let mut p = Problem::new("t");
        let x = p.add_real_var(-1.0, 1.0, "x").unwrap();
        p.add_real_var(-1.0, 1.0, "unused").unwrap();
        p.set_obj(Objective::minimize(sqr(Term::var(&x))));
        assert!(BcopModel::new(&p).is_err());
    }

    #[test]
    fn test_minimize_parabola() {
        // min (x - 1)^2 on [-4, 4]: optimum 0 at x = 1.
        let mut p = Problem::new("parabola");
        let x = p.add_real_var(-4.0, 4.0, "x").unwrap();
        p.set_obj(Objective::minimize(sqr(Term::var(&x) - Term::from(1.0))));

        let mut solver = BcopSolver::new(&p, Params::default()).unwrap();
        solver.optimize();

        assert_eq!(solver.status(), OptimizationStatus::Optimal);
        let enc = solver.obj_enclosure();
        assert!(enc.left() <= 1e-4 && enc.right() >= -1e-9);
        assert!(enc.right() <= 0.01);
        let best = solver.best_solution().unwrap();
        assert!((best.get(&x) - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_maximize_negates_enclosure() {
        // max 2x on [0, 1]: optimum 2 at x = 1.
        let mut p = Problem::new("linmax");
        let x = p.add_real_var(0.0, 1.0, "x").unwrap();
        p.set_obj(Objective::maximize(Term::from(2.0) * Term::var(&x)));

        let mut solver = BcopSolver::new(&p, Params::default()).unwrap();
        solver.optimize();

        let enc = solver.obj_enclosure();
        assert!(enc.contains(2.0) || (enc.right() - 2.0).abs() < 1e-3);
        let best = solver.best_solution().unwrap();
        assert!((best.get(&x) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_node_budget_keeps_valid_enclosure() {
        // min 3u + x^2 y^2 + x y with a node budget of 5.
        let mut p = Problem::new("budget");
        let x = p.add_real_var(-10.0, 4.0, "x").unwrap();
        let u = p.add_real_var(-10.0, 10.0, "u").unwrap();
        let y = p.add_real_var(-1.0, 2.0, "y").unwrap();
        let t = Term::from(3.0) * Term::var(&u)
            + sqr(Term::var(&x)) * sqr(Term::var(&y))
            + Term::var(&x) * Term::var(&y);
        p.set_obj(Objective::minimize(t.clone()));

        let mut params = Params::default();
        params.set_int("NODE_LIMIT", 5).unwrap();
        let mut solver = BcopSolver::new(&p, params).unwrap();
        solver.optimize();

        let enc = solver.obj_enclosure();
        let best = solver.best_solution().expect("a candidate solution");
        let witness = t.eval(&best.to_box());
        // The enclosure's left bound never exceeds any witness value.
        assert!(enc.left() <= witness.right() + 1e-9);
        assert!(!enc.is_empty());
    }
}
