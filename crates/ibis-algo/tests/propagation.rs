//! Propagator-level properties: confluence under pool order, soundness on
//! sampled feasible points, and nested propagation.

use ibis_algo::contractor::{Contractor, ContractorPool, Hc4Contractor, Propagator};
use ibis_core::term::sqr;
use ibis_core::{Constraint, Dag, Problem, Term, Tolerance, Variable};
use std::rc::Rc;

/// x^2 + y^2 = 1 and y = x^2 over [-2, 2]^2.
fn curves() -> (Problem, Variable, Variable, Rc<Dag>) {
    let mut p = Problem::new("curves");
    let x = p.add_real_var(-2.0, 2.0, "x").unwrap();
    let y = p.add_real_var(-2.0, 2.0, "y").unwrap();
    let mut dag = Dag::new();
    dag.insert(&Constraint::eq(
        sqr(Term::var(&x)) + sqr(Term::var(&y)),
        Term::from(1.0),
    ));
    dag.insert(&Constraint::eq(Term::var(&y), sqr(Term::var(&x))));
    (p, x, y, Rc::new(dag))
}

fn propagator(dag: &Rc<Dag>, order: &[usize]) -> Propagator {
    let mut pool = ContractorPool::new();
    for &i in order {
        pool.push(Box::new(Hc4Contractor::new(dag.clone(), i).unwrap()));
    }
    Propagator::new(pool, Tolerance::rel(1e-3).unwrap(), 200)
}

#[test]
fn test_confluence_under_worklist_order() {
    let (p, x, y, dag) = curves();
    let tol = 1e-3;

    let mut p1 = propagator(&dag, &[0, 1]);
    let mut b1 = p.initial_box();
    let r1 = p1.contract(&mut b1);

    let mut p2 = propagator(&dag, &[1, 0]);
    let mut b2 = p.initial_box();
    let r2 = p2.contract(&mut b2);

    assert_eq!(r1 == ibis_core::Proof::Empty, r2 == ibis_core::Proof::Empty);
    for v in [&x, &y] {
        let (d1, d2) = (b1.get(v), b2.get(v));
        let scale = d1.width().max(d2.width()).max(1.0);
        assert!((d1.width() - d2.width()).abs() <= tol * scale);
    }
}

#[test]
fn test_soundness_on_sampled_feasible_points() {
    // The true solutions of the system: y = x^2 and x^2 + y^2 = 1 give
    // y^2 + y - 1 = 0, y = (sqrt(5) - 1) / 2, x = +/- sqrt(y).
    let (p, x, y, dag) = curves();
    let ys = (5.0_f64.sqrt() - 1.0) / 2.0;
    let xs = ys.sqrt();

    let mut prop = propagator(&dag, &[0, 1]);
    let mut b = p.initial_box();
    let proof = prop.contract(&mut b);

    assert_ne!(proof, ibis_core::Proof::Empty);
    assert!(b.get(&y).contains(ys));
    assert!(b.get(&x).contains(xs) || b.get(&x).contains(-xs));
}

#[test]
fn test_nested_propagators() {
    // A propagator is a contractor: nest one inside another pool.
    let (p, x, _, dag) = curves();
    let inner = propagator(&dag, &[0]);
    let mut pool = ContractorPool::new();
    pool.push(Box::new(inner));
    pool.push(Box::new(Hc4Contractor::new(dag.clone(), 1).unwrap()));
    let mut outer = Propagator::new(pool, Tolerance::rel(1e-3).unwrap(), 200);

    let mut b = p.initial_box();
    let proof = outer.contract(&mut b);
    assert_ne!(proof, ibis_core::Proof::Empty);
    assert!(b.get(&x).width() <= 2.0);
}

#[test]
fn test_propagation_reaches_fixed_point() {
    let (p, _, _, dag) = curves();
    let mut prop = propagator(&dag, &[0, 1]);
    let mut b = p.initial_box();
    prop.contract(&mut b);
    let first = b.clone();
    prop.contract(&mut b);
    // Re-running from the fixed point changes nothing beyond tolerance.
    assert!(first.distance(&b) <= 1e-3 * first.width().max(1.0));
}
