//! Branch-and-prune driver over the public API with the different node
//! selection and propagation strategies.

use ibis_algo::params::Params;
use ibis_algo::search::CspSolver;
use ibis_core::term::sqr;
use ibis_core::{Constraint, Problem, Proof, Term};

fn circle_line() -> Problem {
    let mut p = Problem::new("circle-line");
    let x = p.add_real_var(-2.0, 2.0, "x").unwrap();
    let y = p.add_real_var(-2.0, 2.0, "y").unwrap();
    p.add_ctr(Constraint::eq(
        sqr(Term::var(&x)) + sqr(Term::var(&y)),
        Term::from(1.0),
    ));
    p.add_ctr(Constraint::eq(Term::var(&y), Term::var(&x)));
    p
}

fn solve_with(config: &[(&str, &str)]) -> CspSolver {
    let mut params = Params::default();
    params.set_dbl("SOLUTION_CLUSTER_GAP", 1e-2).unwrap();
    for (k, v) in config {
        params.set_str(k, v).unwrap();
    }
    let mut solver = CspSolver::new(circle_line(), params).unwrap();
    solver.solve();
    solver
}

fn assert_finds_both_roots(solver: &CspSolver) {
    let r = 0.5_f64.sqrt();
    let x = solver.problem().var_at(0).clone();
    let mut pos = false;
    let mut neg = false;
    for i in 0..solver.nb_solutions() {
        let s = solver.solution(i);
        if s.boxx.get(&x).contains(r) {
            pos = true;
        }
        if s.boxx.get(&x).contains(-r) {
            neg = true;
        }
    }
    assert!(pos && neg, "both solutions must be enclosed");
}

#[test]
fn test_dfs_default() {
    let solver = solve_with(&[]);
    assert_finds_both_roots(&solver);
}

#[test]
fn test_bfs_space() {
    let solver = solve_with(&[("BP_NODE_SELECTION", "BFS")]);
    assert_finds_both_roots(&solver);
}

#[test]
fn test_dmdfs_space() {
    let solver = solve_with(&[("BP_NODE_SELECTION", "DMDFS")]);
    assert_finds_both_roots(&solver);
}

#[test]
fn test_hybrid_spaces() {
    for s in ["IDFS", "PDFS", "GPDFS"] {
        let solver = solve_with(&[("BP_NODE_SELECTION", s)]);
        assert_finds_both_roots(&solver);
    }
}

#[test]
fn test_selection_strategies() {
    for s in ["LF", "SF", "SLF", "SSR", "SSR_LF", "ASR"] {
        let solver = solve_with(&[("SPLIT_SELECTION", s)]);
        assert_finds_both_roots(&solver);
    }
}

#[test]
fn test_slicing_strategies() {
    for s in ["PEELING", "PARTITION"] {
        let solver = solve_with(&[("SPLIT_SLICING", s)]);
        assert_finds_both_roots(&solver);
    }
}

#[test]
fn test_bc4_base_and_newton_stage() {
    let solver = solve_with(&[
        ("PROPAGATION_BASE", "BC4"),
        ("PROPAGATION_WITH_NEWTON", "YES"),
    ]);
    assert_finds_both_roots(&solver);
}

#[test]
fn test_acid_stage() {
    let solver = solve_with(&[("PROPAGATION_WITH_ACID", "YES")]);
    assert_finds_both_roots(&solver);
}

#[test]
fn test_certification_pass() {
    let solver = solve_with(&[("CERTIFICATION", "YES")]);
    assert!(solver.nb_solutions() >= 1);
    let feasible = (0..solver.nb_solutions())
        .filter(|&i| solver.solution(i).proof >= Proof::Feasible)
        .count();
    assert!(feasible >= 1);
}

#[test]
fn test_solution_limit() {
    let mut params = Params::default();
    params.set_int("SOLUTION_LIMIT", 1).unwrap();
    let mut solver = CspSolver::new(circle_line(), params).unwrap();
    solver.solve();
    assert!(solver.nb_solutions() <= 2);
    assert!(solver.env().solution_limit_reached || solver.nb_pending() == 0);
}

#[test]
fn test_depth_limit_fathoms() {
    let mut params = Params::default();
    params.set_int("DEPTH_LIMIT", 3).unwrap();
    let mut solver = CspSolver::new(circle_line(), params).unwrap();
    solver.solve();
    assert!(solver.env().depth_limit_reached);
}
