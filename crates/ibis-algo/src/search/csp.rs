//! Branch-and-prune driver for constraint satisfaction problems.
//!
//! The driver alternates propagation and domain splitting over a space of
//! search nodes until the space drains or a stop criterion fires. Each
//! processed node is either dropped (`Empty`), stored as a solution
//! (inner box, or too tight to split), or split into children pushed back
//! into the space.

use crate::contractor::{
    Bc4Contractor, Contractor, ContractorPool, Hc4Contractor, IntContractor, ListContractor,
    MaxCidContractor, NewtonContractor, PolytopeHullContractor, Propagator,
};
use crate::newton::{Inflator, IntervalNewton};
use crate::params::Params;
use crate::prover::Prover;
use crate::relax::LinearizerTaylor;
use crate::split::{
    Bisecter, HybridSsrLfSelector, IntervalSlicer, LargestFirstSelector, Partitioner, Peeler,
    RoundRobinSelector, SmallestFirstSelector, SmallestLargestSelector, SsrSelector, VarSelector,
};
use ibis_core::{
    Dag, FunId, IbisError, IbisResult, IntervalBox, Problem, Proof, Tolerance,
};
use serde::Serialize;
use std::rc::Rc;
use tracing::{debug, info};
use web_time::Instant;

use super::node::{CspNode, SharedCspNode};
use super::space::{BfsSpace, CspSpace, DfsSpace, DmdfsSpace, HybridDfsSpace, HybridStyle};

/// Stop criteria observed during a solve, readable after it returns.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CspEnv {
    pub time_limit_reached: bool,
    pub node_limit_reached: bool,
    pub solution_limit_reached: bool,
    pub depth_limit_reached: bool,
}

/// One reported solution: final box, proof tag, node bookkeeping.
#[derive(Debug, Clone)]
pub struct CspSolution {
    pub boxx: IntervalBox,
    pub proof: Proof,
    pub index: u64,
    pub parent: Option<u64>,
    pub depth: u32,
}

/// Serializable summary of a finished solve.
#[derive(Debug, Clone, Serialize)]
pub struct CspReport {
    pub problem: String,
    pub generated_at: String,
    pub nb_nodes: u64,
    pub nb_pending: usize,
    pub nb_solutions: usize,
    pub solving_time: f64,
    pub env: CspEnv,
}

/// Branch-and-prune solver over a CSP.
pub struct CspSolver {
    problem: Problem,
    params: Params,
    dag: Rc<Dag>,
    contractor: Box<dyn Contractor>,
    selector: Box<dyn VarSelector>,
    slicer: Box<dyn IntervalSlicer>,
    space: Box<dyn CspSpace>,
    prover: Option<Prover>,
    env: CspEnv,
    nb_nodes: u64,
    solving_time: f64,
}

impl CspSolver {
    /// Builds the solving machinery from the problem and the parameters.
    /// Structural faults (bad parameter values, non-CSP input) surface
    /// here; [`CspSolver::solve`] itself is total.
    pub fn new(problem: Problem, params: Params) -> IbisResult<Self> {
        if !problem.is_csp() {
            return Err(IbisError::Structure(
                "CSP solver applied to a problem that is not a constraint satisfaction problem"
                    .into(),
            ));
        }

        let mut dag = Dag::new();
        for c in problem.ctrs() {
            dag.insert(c);
        }
        let dag = Rc::new(dag);

        let contractor = Self::make_contractor(&problem, &dag, &params)?;
        let (selector, slicer) = Self::make_split(&problem, &dag, &params)?;
        let space = Self::make_space(&params)?;

        let prover = if params.get_str("CERTIFICATION")? == "YES" {
            let mut prover = Prover::new(&problem);
            prover.set_max_iter(params.get_int("NEWTON_CERTIFY_ITER_LIMIT")?.max(1) as usize);
            prover.set_inflator(Inflator::new(
                params.get_dbl("INFLATION_DELTA")?,
                params.get_dbl("INFLATION_CHI")?,
            )?);
            Some(prover)
        } else {
            None
        };

        Ok(CspSolver {
            problem,
            params,
            dag,
            contractor,
            selector,
            slicer,
            space,
            prover,
            env: CspEnv::default(),
            nb_nodes: 0,
            solving_time: 0.0,
        })
    }

    fn base_pool(dag: &Rc<Dag>, base: &str, params: &Params) -> IbisResult<ContractorPool> {
        let mut pool = ContractorPool::new();
        for fi in 0..dag.nb_funs() {
            let op: Box<dyn Contractor> = match base {
                "BC4" => {
                    let newton = IntervalNewton::new(
                        params.get_int("NEWTON_ITER_LIMIT")?.max(1) as usize,
                        params.get_dbl("NEWTON_IMPROVEMENT")?,
                        params.var_tol(),
                        Inflator::new(
                            params.get_dbl("INFLATION_DELTA")?,
                            params.get_dbl("INFLATION_CHI")?,
                        )?,
                    );
                    Box::new(Bc4Contractor::with_settings(
                        dag.clone(),
                        fi,
                        params.get_dbl("BC3_PEEL_FACTOR")?,
                        params.get_int("BC3_ITER_LIMIT")?.max(1) as usize,
                        newton,
                    )?)
                }
                // The affine backend contracts under the same pool
                // contract; HC4 carries it.
                "HC4" | "AFFINE" => Box::new(Hc4Contractor::new(dag.clone(), fi)?),
                other => {
                    return Err(IbisError::Structure(format!(
                        "bad propagation base {other}"
                    )))
                }
            };
            pool.push(op);
        }
        Ok(pool)
    }

    fn make_contractor(
        problem: &Problem,
        dag: &Rc<Dag>,
        params: &Params,
    ) -> IbisResult<Box<dyn Contractor>> {
        let tol = params.propagation_tol()?;
        let max_iter = params.get_int("PROPAGATION_ITER_LIMIT")?.max(1) as usize;

        let base = params.get_str("PROPAGATION_BASE")?.to_string();
        let pool = Self::base_pool(dag, &base, params)?;
        let propagator = Propagator::new(pool, tol, max_iter);

        let mut stages: Vec<Box<dyn Contractor>> = Vec::new();

        if params.get_str("PROPAGATION_WITH_ACID")? == "YES" {
            // ACID stage: constructive disjunction around the base
            // propagation.
            let inner = Propagator::new(Self::base_pool(dag, &base, params)?, tol, max_iter);
            stages.push(Box::new(MaxCidContractor::new(
                Box::new(inner),
                Box::new(Partitioner::new(3)?),
            )));
        }

        stages.insert(0, Box::new(propagator));

        if params.get_str("PROPAGATION_WITH_POLYTOPE_HULL")? == "YES" {
            let funs: Vec<FunId> = (0..dag.nb_funs()).collect();
            let lin = LinearizerTaylor::new(
                dag.clone(),
                funs,
                params.get_dbl("RELAXATION_EQ_TOL")?,
                params.get_str("RELAXATION_CORNER")? == "RANDOM",
            );
            stages.push(Box::new(PolytopeHullContractor::new(lin)));
        }

        if params.get_str("PROPAGATION_WITH_NEWTON")? == "YES" {
            let eqs: Vec<FunId> = (0..dag.nb_funs())
                .filter(|&f| dag.fun(f).image().is_singleton())
                .collect();
            match NewtonContractor::new(dag.clone(), eqs) {
                Ok(op) => stages.push(Box::new(op)),
                Err(e) => debug!(error = %e, "Newton stage skipped"),
            }
        }

        let discrete: Vec<_> = problem.vars().iter().filter(|v| v.is_discrete()).collect();
        if !discrete.is_empty() {
            let mut ic = IntContractor::new();
            for v in discrete {
                ic.insert(v)?;
            }
            stages.push(Box::new(ic));
        }

        if stages.len() == 1 {
            Ok(stages.pop().expect("one stage"))
        } else {
            let mut list = ListContractor::new();
            for s in stages {
                list.push(s);
            }
            Ok(Box::new(list))
        }
    }

    fn make_split(
        problem: &Problem,
        dag: &Rc<Dag>,
        params: &Params,
    ) -> IbisResult<(Box<dyn VarSelector>, Box<dyn IntervalSlicer>)> {
        let scope = problem.scope();
        let funs: Vec<FunId> = (0..dag.nb_funs()).collect();

        let selector: Box<dyn VarSelector> = match params.get_str("SPLIT_SELECTION")? {
            "RR" => Box::new(RoundRobinSelector::new(scope)),
            "LF" => Box::new(LargestFirstSelector::new(scope)),
            "SF" => Box::new(SmallestFirstSelector::new(scope)),
            "SLF" => Box::new(SmallestLargestSelector::new(scope)),
            "SSR" => Box::new(SsrSelector::new(dag.clone(), funs, scope)),
            "SSR_LF" => {
                let ssr = SsrSelector::new(dag.clone(), funs, scope);
                let freq = params.get_int("SPLIT_SSR_LF_FREQUENCY")?.max(1) as usize;
                Box::new(HybridSsrLfSelector::new(ssr, freq))
            }
            "ASR" => Box::new(SsrSelector::average(dag.clone(), funs, scope)),
            other => {
                return Err(IbisError::Structure(format!(
                    "bad split selection strategy {other}"
                )))
            }
        };

        let slicer: Box<dyn IntervalSlicer> = match params.get_str("SPLIT_SLICING")? {
            "BI" => Box::new(Bisecter),
            "PEELING" => Box::new(Peeler::new(params.get_dbl("SPLIT_PEEL_FACTOR")?)?),
            "PARTITION" => {
                Box::new(Partitioner::new(params.get_int("SPLIT_NB_SLICES")?.max(2) as usize)?)
            }
            other => {
                return Err(IbisError::Structure(format!(
                    "bad split slicing strategy {other}"
                )))
            }
        };

        Ok((selector, slicer))
    }

    fn make_space(params: &Params) -> IbisResult<Box<dyn CspSpace>> {
        Ok(match params.get_str("BP_NODE_SELECTION")? {
            "DFS" => Box::new(DfsSpace::new()),
            "BFS" => Box::new(BfsSpace::new()),
            "DMDFS" => Box::new(DmdfsSpace::new()),
            "IDFS" => Box::new(HybridDfsSpace::new(HybridStyle::Depth)),
            "PDFS" => Box::new(HybridDfsSpace::new(HybridStyle::Perimeter)),
            "GPDFS" => Box::new(HybridDfsSpace::new(HybridStyle::GridPerimeter)),
            other => {
                return Err(IbisError::Structure(format!(
                    "bad node selection strategy {other}"
                )))
            }
        })
    }

    /// Every constraint certainly satisfied on the whole box.
    fn is_inner(&self, b: &IntervalBox) -> bool {
        self.problem
            .ctrs()
            .iter()
            .all(|c| c.is_satisfied(b) == Proof::Inner)
    }

    /// Splits a node; 0 or 1 child means the node is a solution.
    fn split(&mut self, node: &SharedCspNode) -> Vec<SharedCspNode> {
        let n = node.borrow();
        let v = match self.selector.select(n.boxx(), n.last_split()) {
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
            let child = n.child(&v, s, self.nb_nodes);
            children.push(std::rc::Rc::new(std::cell::RefCell::new(child)));
        }
        children
    }

    fn bp_step(&mut self, node: SharedCspNode, depth_limit: u32) {
        let proof = {
            let mut n = node.borrow_mut();
            n.set_proof(Proof::Maybe);
            self.contractor.contract(n.boxx_mut())
        };

        debug!(node = node.borrow().index(), %proof, "contraction");

        if proof == Proof::Empty {
            node.borrow_mut().set_proof(Proof::Empty);
            return;
        }

        if self.is_inner(node.borrow().boxx()) {
            node.borrow_mut().set_proof(Proof::Inner);
            if self
                .params
                .get_str("SPLIT_INNER_BOX")
                .map(|s| s == "NO")
                .unwrap_or(true)
            {
                self.space.push_sol(node);
                return;
            }
        }

        if node.borrow().depth() + 1 >= depth_limit {
            debug!(node = node.borrow().index(), "fathomed by the depth limit");
            self.env.depth_limit_reached = true;
            return;
        }

        let children = self.split(&node);
        if children.len() <= 1 {
            self.space.push_sol(node);
        } else {
            debug!(
                node = node.borrow().index(),
                children = children.len(),
                "split"
            );
            self.space.insert_pending_ordered(children);
        }
    }

    /// Runs branch-and-prune to quiescence or a stop criterion.
    pub fn solve(&mut self) {
        let started = Instant::now();

        let time_limit = self.params.get_dbl("TIME_LIMIT").unwrap_or(f64::INFINITY);
        let node_limit = self.params.get_int("NODE_LIMIT").unwrap_or(i64::MAX).max(1) as u64;
        let sol_limit = self.params.get_int("SOLUTION_LIMIT").unwrap_or(i64::MAX).max(1) as usize;
        let depth_limit = self
            .params
            .get_int("DEPTH_LIMIT")
            .unwrap_or(i64::MAX)
            .clamp(1, u32::MAX as i64) as u32;

        self.env = CspEnv::default();
        self.nb_nodes = 1;
        let root = CspNode::shared(self.problem.initial_box());
        self.space.insert_pending(root);

        info!(problem = self.problem.name(), "branch-and-prune starts");

        while let Some(node) = self.space.next_pending() {
            self.bp_step(node, depth_limit);

            if started.elapsed().as_secs_f64() > time_limit {
                self.env.time_limit_reached = true;
                break;
            }
            if self.nb_nodes > node_limit {
                self.env.node_limit_reached = true;
                break;
            }
            if self.space.nb_sols() >= sol_limit {
                self.env.solution_limit_reached = true;
                break;
            }
        }

        let gap = self.params.get_dbl("SOLUTION_CLUSTER_GAP").unwrap_or(-1.0);
        self.space.make_sol_clusters(gap);

        if let Some(prover) = &self.prover {
            let sols = std::mem::take(self.space.sols_mut());
            for node in sols {
                let (proof, keep) = {
                    let mut n = node.borrow_mut();
                    let mut b = n.boxx().clone();
                    let certified = prover.certify(&mut b);
                    if certified != Proof::Empty {
                        n.set_boxx(b);
                        (n.proof().max(certified), true)
                    } else {
                        (Proof::Empty, false)
                    }
                };
                if keep {
                    node.borrow_mut().set_proof(proof);
                    self.space.sols_mut().push(node);
                }
            }
        }

        self.solving_time = started.elapsed().as_secs_f64();
        info!(
            nodes = self.nb_nodes,
            solutions = self.space.nb_sols(),
            time = self.solving_time,
            "branch-and-prune ends"
        );
    }

    pub fn env(&self) -> &CspEnv {
        &self.env
    }

    pub fn nb_nodes(&self) -> u64 {
        self.nb_nodes
    }

    pub fn nb_pending(&self) -> usize {
        self.space.nb_pending()
    }

    pub fn nb_solutions(&self) -> usize {
        self.space.nb_sols()
    }

    pub fn solving_time(&self) -> f64 {
        self.solving_time
    }

    pub fn solution(&self, i: usize) -> CspSolution {
        let node = self.space.sol_at(i);
        let n = node.borrow();
        CspSolution {
            boxx: n.boxx().clone(),
            proof: n.proof(),
            index: n.index(),
            parent: n.parent(),
            depth: n.depth(),
        }
    }

    /// Summary of the last solve, stamped for logs and archives.
    pub fn report(&self) -> CspReport {
        CspReport {
            problem: self.problem.name().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            nb_nodes: self.nb_nodes,
            nb_pending: self.space.nb_pending(),
            nb_solutions: self.space.nb_sols(),
            solving_time: self.solving_time,
            env: self.env,
        }
    }

    pub fn dag(&self) -> &Rc<Dag> {
        &self.dag
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// The propagation tolerance actually in force, for reporting.
    pub fn propagation_tol(&self) -> Tolerance {
        self.params.propagation_tol().unwrap_or_default()
    }
}
