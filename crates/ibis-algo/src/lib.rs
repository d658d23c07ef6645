//! # ibis-algo: Algorithm Layer of the IBIS Interval Solver
//!
//! Rigorous constraint solving over the model layer of `ibis-core`:
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`contractor`] | Domain-reduction operators: HC4, BC3, BC4, integrality, list, max-CID, BO, polytope hull, Newton, and the worklist [`contractor::Propagator`] |
//! | [`newton`] | Univariate interval Newton and midpoint inflation |
//! | [`prover`] | Existence certification by preconditioned Krawczyk iteration |
//! | [`split`] | Interval slicers and variable selectors |
//! | [`search`] | Branch-and-prune ([`search::CspSolver`]) and branch-and-bound ([`search::BcopSolver`]) |
//! | [`relax`] | LP interface and interval Taylor linearization |
//! | [`localopt`] | Penalty + L-BFGS local optimizer for upper bounds |
//! | [`params`] | String-keyed solver parameters |
//!
//! ## Architecture
//!
//! Everything reduces domains through one object-safe trait,
//! [`contractor::Contractor`]: a monotone operator returning a proof
//! certificate. The propagator drives a pool of contractors to a fixed
//! point and is itself a contractor, so propagation nests under
//! constructive disjunction or sequential lists. The search drivers
//! alternate contraction and splitting over an explicit node space; all
//! work is single-threaded and cooperative, with stop criteria polled
//! between steps.
//!
//! ## Example
//!
//! ```rust
//! use ibis_algo::params::Params;
//! use ibis_algo::search::CspSolver;
//! use ibis_core::{term, Constraint, Problem, Term};
//!
//! // Solve x^2 = 2 over [0, 2].
//! let mut problem = Problem::new("sqrt2");
//! let x = problem.add_real_var(0.0, 2.0, "x").unwrap();
//! problem.add_ctr(Constraint::eq(term::sqr(Term::var(&x)), Term::from(2.0)));
//!
//! let mut solver = CspSolver::new(problem, Params::default()).unwrap();
//! solver.solve();
//! assert!(solver.nb_solutions() >= 1);
//! let sol = solver.solution(0);
//! assert!(sol.boxx.get(&x).contains(2.0_f64.sqrt()));
//! ```

pub mod contractor;
pub mod localopt;
pub mod newton;
pub mod params;
pub mod prover;
pub mod relax;
pub mod search;
pub mod split;

pub use contractor::Contractor;
pub use localopt::{LocalOptimizer, OptimizationStatus};
pub use newton::{Inflator, IntervalNewton};
pub use params::Params;
pub use prover::Prover;
pub use search::{BcopSolver, CspSolver};
