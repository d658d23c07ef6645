//! Branch-and-bound driver scenarios.

use ibis_algo::localopt::OptimizationStatus;
use ibis_algo::params::Params;
use ibis_algo::search::BcopSolver;
use ibis_core::term::sqr;
use ibis_core::{Objective, Problem, Term};

#[test]
fn test_two_variable_quadratic_with_node_budget() {
    // Minimize 3u + x^2 y^2 + x y on x in [-10, 4], u in [-10, 10],
    // y in [-1, 2] with a node budget of 5: the driver must return an
    // objective enclosure and a candidate whose value the enclosure's
    // left bound does not exceed.
    let mut p = Problem::new("quadratic");
    let x = p.add_real_var(-10.0, 4.0, "x").unwrap();
    let u = p.add_real_var(-10.0, 10.0, "u").unwrap();
    let y = p.add_real_var(-1.0, 2.0, "y").unwrap();
    let obj = Term::from(3.0) * Term::var(&u)
        + sqr(Term::var(&x)) * sqr(Term::var(&y))
        + Term::var(&x) * Term::var(&y);
    p.set_obj(Objective::minimize(obj.clone()));

    let mut params = Params::default();
    params.set_int("NODE_LIMIT", 5).unwrap();
    let mut solver = BcopSolver::new(&p, params).unwrap();
    solver.optimize();

    let enclosure = solver.obj_enclosure();
    assert!(!enclosure.is_empty());
    let best = solver.best_solution().expect("a candidate solution");
    let witness = obj.eval(&best.to_box());
    assert!(enclosure.left() <= witness.right() + 1e-9);
    // The witness respects the variable bounds.
    assert!((-10.0..=4.0).contains(&best.get(&x)));
    assert!((-10.0..=10.0).contains(&best.get(&u)));
    assert!((-1.0..=2.0).contains(&best.get(&y)));
}

#[test]
fn test_convex_objective_reaches_optimal_status() {
    // min (x + 2)^2 + (y - 1)^2 on [-5, 5]^2: optimum 0 at (-2, 1).
    let mut p = Problem::new("convex");
    let x = p.add_real_var(-5.0, 5.0, "x").unwrap();
    let y = p.add_real_var(-5.0, 5.0, "y").unwrap();
    let obj = sqr(Term::var(&x) + Term::from(2.0)) + sqr(Term::var(&y) - Term::from(1.0));
    p.set_obj(Objective::minimize(obj));

    let mut solver = BcopSolver::new(&p, Params::default()).unwrap();
    solver.optimize();

    assert_eq!(solver.status(), OptimizationStatus::Optimal);
    let enclosure = solver.obj_enclosure();
    assert!(enclosure.left() <= 1e-3);
    assert!(enclosure.right() <= 0.05);
    let best = solver.best_solution().unwrap();
    assert!((best.get(&x) + 2.0).abs() < 0.1);
    assert!((best.get(&y) - 1.0).abs() < 0.1);
}

#[test]
fn test_boundary_optimum_found() {
    // min x + y on [0, 1]^2: optimum 0 at the corner (0, 0), with both
    // derivative equations monotone (no stationary point).
    let mut p = Problem::new("corner");
    let x = p.add_real_var(0.0, 1.0, "x").unwrap();
    let y = p.add_real_var(0.0, 1.0, "y").unwrap();
    p.set_obj(Objective::minimize(Term::var(&x) + Term::var(&y)));

    let mut solver = BcopSolver::new(&p, Params::default()).unwrap();
    solver.optimize();

    let best = solver.best_solution().unwrap();
    assert!(best.get(&x) < 1e-3);
    assert!(best.get(&y) < 1e-3);
    let enclosure = solver.obj_enclosure();
    assert!(enclosure.left() <= 1e-6);
}

#[test]
fn test_time_and_node_counters_reported() {
    let mut p = Problem::new("counters");
    let x = p.add_real_var(-1.0, 1.0, "x").unwrap();
    p.set_obj(Objective::minimize(sqr(Term::var(&x))));
    let mut solver = BcopSolver::new(&p, Params::default()).unwrap();
    solver.optimize();
    assert!(solver.nb_nodes() >= 1);
    assert!(solver.solving_time() >= 0.0);
    assert!(solver.preprocessing_time() >= 0.0);

    let report = solver.report();
    assert_eq!(report.problem, "counters");
    assert!(report.obj_lower <= report.obj_upper);
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("generated_at"));
}
