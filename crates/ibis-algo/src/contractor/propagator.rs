//! AC3-like worklist propagation over a pool of contractors.
//!
//! The queue starts with every contractor of the pool. When a contractor
//! reduces a domain beyond the relative tolerance, the contractors
//! depending on that variable re-enter the queue (deduplicated through an
//! active bitset). Termination: contractors only shrink domains, and a
//! hard iteration bound caps the number of queue pops when the reductions
//! stay below tolerance but nonzero.
//!
//! A propagator is itself a contractor, so propagators nest.

use super::{Contractor, ContractorPool};
use ibis_core::{IntervalBox, Proof, Scope, Tolerance};
use std::collections::VecDeque;
use tracing::debug;

/// Worklist fixpoint over a pool of contractors.
pub struct Propagator {
    pool: ContractorPool,
    tol: Tolerance,
    max_iter: usize,
    certif: Vec<Proof>,
}

impl Propagator {
    pub fn new(pool: ContractorPool, tol: Tolerance, max_iter: usize) -> Self {
        Propagator {
            pool,
            tol,
            max_iter: max_iter.max(1),
            certif: Vec::new(),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn tol(&self) -> Tolerance {
        self.tol
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Certificate returned by the i-th contractor during the last run.
    pub fn proof_at(&self, i: usize) -> Proof {
        self.certif[i]
    }
}

impl Contractor for Propagator {
    fn scope(&self) -> &Scope {
        self.pool.scope()
    }

    fn contract(&mut self, b: &mut IntervalBox) -> Proof {
        let n = self.pool.len();
        if n == 0 {
            return Proof::Maybe;
        }

        self.certif.clear();
        self.certif.resize(n, Proof::Maybe);

        let mut queue: VecDeque<usize> = (0..n).collect();
        let mut active = vec![true; n];
        let mut copy = b.clone();
        let mut steps = 0usize;

        while let Some(j) = queue.pop_front() {
            active[j] = false;

            // Snapshot the scope of the contractor before running it.
            let scope = self.pool.at_ref(j).scope().clone();
            copy.set_on_scope(b, &scope);

            let proof = self.pool.at(j).contract(b);
            self.certif[j] = proof;

            if proof == Proof::Empty {
                debug!(contractor = j, "propagation finds an empty box");
                return Proof::Empty;
            }

            steps += 1;
            if steps >= self.max_iter {
                debug!(steps, "propagation stops on the iteration bound");
                break;
            }

            // Re-queue the contractors depending on a domain that was
            // reduced enough. Contractors that proved an inner box cannot
            // contribute further reductions.
            for v in scope.iter() {
                let prev = copy.get(v);
                let curr = b.get(v);
                if !self.tol.is_improved(&prev, &curr) {
                    continue;
                }
                for &k in self.pool.dependents(v) {
                    if k != j && !active[k] && self.certif[k] != Proof::Inner {
                        queue.push_back(k);
                        active[k] = true;
                    }
                }
            }
        }

        // Pointwise min of the contractor certificates.
        self.certif.iter().copied().fold(Proof::Inner, Proof::min)
    }

    fn name(&self) -> String {
        format!("propagator on {} contractors", self.pool.len())
    }
}
