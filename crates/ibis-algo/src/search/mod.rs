//! Search drivers: branch-and-prune over CSPs, branch-and-bound over
//! bound-constrained optimization problems.

mod bcop;
mod csp;
mod node;
mod space;

pub use bcop::{BcopModel, BcopReport, BcopSolver};
pub use csp::{CspEnv, CspReport, CspSolution, CspSolver};
pub use node::{BcopNode, CspNode, SharedBcopNode, SharedCspNode};
pub use space::{BfsSpace, CspSpace, DfsSpace, DmdfsSpace, HybridDfsSpace, HybridStyle};
