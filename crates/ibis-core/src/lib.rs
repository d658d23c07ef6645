//! # ibis-core: Model Layer of the IBIS Interval Solver
//!
//! Provides the data structures a rigorous nonlinear constraint solver
//! reasons with: outward-rounded interval arithmetic with inverse
//! projections, variables and scopes, interval boxes, a symbolic term
//! algebra with derivation, a shared-subexpression DAG with forward
//! evaluation and HC4-Revise backward contraction, and the problem model.
//!
//! ## Design Philosophy
//!
//! Everything numeric is **total**: an impossible operation produces the
//! empty set, never a fault. Structural mistakes (unknown variable, empty
//! declared domain, out-of-range factor) are `Err` values of
//! [`IbisError`]. Certified facts travel as [`Proof`] values ordered by
//! strength (`Empty < Maybe < Feasible < Inner < Optimal`).
//!
//! Rounding is outward everywhere, implemented with error-free
//! transformations instead of a process-global rounding mode, so exact
//! dyadic arithmetic stays exact and no global floating-point state
//! exists (see [`round`] internals in the crate source).
//!
//! ## Quick Start
//!
//! ```rust
//! use ibis_core::*;
//!
//! // x^2 + y^2 = 1 over x, y in [-2, 2]
//! let mut problem = Problem::new("circle");
//! let x = problem.add_real_var(-2.0, 2.0, "x").unwrap();
//! let y = problem.add_real_var(-2.0, 2.0, "y").unwrap();
//! problem.add_ctr(Constraint::eq(
//!     term::sqr(Term::var(&x)) + term::sqr(Term::var(&y)),
//!     Term::from(1.0),
//! ));
//!
//! // Reduce the conjunction to a DAG and contract the initial box.
//! let mut dag = Dag::new();
//! for c in problem.ctrs() {
//!     dag.insert(c);
//! }
//! let mut b = problem.initial_box();
//! let proof = dag.hc4_revise(0, &mut b);
//! assert_eq!(proof, Proof::Maybe);
//! assert!(b.get(&x).contains_interval(&Interval::new(-1.0, 1.0)));
//! ```
//!
//! ## Modules
//!
//! - [`interval`] - Interval type, arithmetic and inverse projections
//! - [`tolerance`] - Absolute/relative width tolerances
//! - [`variable`], [`scope`] - Variables and occurrence-counted scopes
//!   with the global [`ScopeBank`]
//! - [`boxes`] - Interval boxes and real points
//! - [`term`] - Symbolic terms with simplification and derivation
//! - [`dag`] - Shared-subexpression graph, evaluation, HC4-Revise,
//!   interval gradients
//! - [`problem`] - Variables, constraints, objective
//!
//! The algorithm layer (contractors, propagation, search) lives in the
//! `ibis-algo` crate.

pub mod boxes;
pub mod dag;
pub mod error;
pub mod interval;
pub mod problem;
pub mod proof;
mod round;
pub mod scope;
pub mod term;
pub mod tolerance;
pub mod variable;

pub use boxes::{IntervalBox, RealPoint};
pub use dag::{Dag, DagFun, FunId, NodeId};
pub use error::{IbisError, IbisResult};
pub use interval::{complement, ext_div, setminus, Interval};
pub use problem::{Constraint, ObjDir, Objective, Problem, Rel};
pub use proof::Proof;
pub use scope::{Scope, ScopeBank};
pub use term::Term;
pub use tolerance::{TolKind, Tolerance};
pub use variable::{VarKind, Variable};
