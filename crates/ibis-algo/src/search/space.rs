//! Search spaces: containers of pending and solution nodes.
//!
//! The pending side defines the exploration strategy (DFS, BFS,
//! distant-most DFS, hybrid best-first DFS); the solution side is shared:
//! every space stores solution nodes and can cluster nearby solutions by
//! Hausdorff distance.

use super::node::SharedCspNode;
use ibis_core::Proof;

/// Pending/solution node container of the branch-and-prune driver.
pub trait CspSpace {
    fn nb_pending(&self) -> usize;

    /// Extracts the next node to process.
    fn next_pending(&mut self) -> Option<SharedCspNode>;

    fn insert_pending(&mut self, node: SharedCspNode);

    /// Inserts the children of a split, ordered left to right.
    fn insert_pending_ordered(&mut self, nodes: Vec<SharedCspNode>) {
        for n in nodes {
            self.insert_pending(n);
        }
    }

    fn sols(&self) -> &Vec<SharedCspNode>;

    fn sols_mut(&mut self) -> &mut Vec<SharedCspNode>;

    fn nb_sols(&self) -> usize {
        self.sols().len()
    }

    fn push_sol(&mut self, node: SharedCspNode) {
        self.sols_mut().push(node);
    }

    fn sol_at(&self, i: usize) -> SharedCspNode {
        self.sols()[i].clone()
    }

    fn has_feasible_sol(&self) -> bool {
        self.sols()
            .iter()
            .any(|n| matches!(n.borrow().proof(), Proof::Feasible | Proof::Inner))
    }

    /// Merges solutions whose Hausdorff distance is within `gap`; a
    /// negative gap disables clustering.
    fn make_sol_clusters(&mut self, gap: f64) {
        cluster(self.sols_mut(), gap);
    }
}

/// Hull-merges nodes closer than `gap` until no mergeable pair remains.
pub(crate) fn cluster(nodes: &mut Vec<SharedCspNode>, gap: f64) {
    if gap < 0.0 {
        return;
    }
    let mut i = 0;
    while i < nodes.len() {
        let mut j = i + 1;
        while j < nodes.len() {
            let d = nodes[i].borrow().boxx().distance(nodes[j].borrow().boxx());
            if d <= gap {
                let other = nodes.remove(j);
                let other = other.borrow();
                let mut base = nodes[i].borrow_mut();
                let hulled = {
                    let mut b = base.boxx().clone();
                    b.hull_assign(other.boxx());
                    b
                };
                base.set_boxx(hulled);
                let p = base.proof().min(other.proof());
                base.set_proof(p);
                // Restart the scan for the grown box.
                drop(base);
                j = i + 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
}

/// Depth-first search: last inserted, first popped.
#[derive(Default)]
pub struct DfsSpace {
    pending: Vec<SharedCspNode>,
    sols: Vec<SharedCspNode>,
}

impl DfsSpace {
    pub fn new() -> Self {
        DfsSpace::default()
    }
}

impl CspSpace for DfsSpace {
    fn nb_pending(&self) -> usize {
        self.pending.len()
    }

    fn next_pending(&mut self) -> Option<SharedCspNode> {
        self.pending.pop()
    }

    fn insert_pending(&mut self, node: SharedCspNode) {
        self.pending.push(node);
    }

    fn sols(&self) -> &Vec<SharedCspNode> {
        &self.sols
    }

    fn sols_mut(&mut self) -> &mut Vec<SharedCspNode> {
        &mut self.sols
    }
}

/// Breadth-first search: first inserted, first popped.
#[derive(Default)]
pub struct BfsSpace {
    pending: std::collections::VecDeque<SharedCspNode>,
    sols: Vec<SharedCspNode>,
}

impl BfsSpace {
    pub fn new() -> Self {
        BfsSpace::default()
    }
}

impl CspSpace for BfsSpace {
    fn nb_pending(&self) -> usize {
        self.pending.len()
    }

    fn next_pending(&mut self) -> Option<SharedCspNode> {
        self.pending.pop_front()
    }

    fn insert_pending(&mut self, node: SharedCspNode) {
        self.pending.push_back(node);
    }

    fn sols(&self) -> &Vec<SharedCspNode> {
        &self.sols
    }

    fn sols_mut(&mut self) -> &mut Vec<SharedCspNode> {
        &mut self.sols
    }
}

struct DistElem {
    node: SharedCspNode,
    mindist: f64,
}

/// Distant-most DFS: prefers the pending node farthest from the known
/// solutions, to spread the solution set early.
#[derive(Default)]
pub struct DmdfsSpace {
    pending: Vec<DistElem>,
    sols: Vec<SharedCspNode>,
}

impl DmdfsSpace {
    pub fn new() -> Self {
        DmdfsSpace::default()
    }

    fn sort_pending(&mut self) {
        self.pending
            .sort_by(|a, b| a.mindist.total_cmp(&b.mindist));
    }
}

impl CspSpace for DmdfsSpace {
    fn nb_pending(&self) -> usize {
        self.pending.len()
    }

    fn next_pending(&mut self) -> Option<SharedCspNode> {
        self.pending.pop().map(|e| e.node)
    }

    fn insert_pending(&mut self, node: SharedCspNode) {
        // Distance to the closest known solution.
        let mut d = f64::INFINITY;
        for s in &self.sols {
            let e = s.borrow().boxx().distance(node.borrow().boxx());
            if e < d {
                d = e;
            }
        }
        self.pending.push(DistElem { node, mindist: d });
    }

    fn sols(&self) -> &Vec<SharedCspNode> {
        &self.sols
    }

    fn sols_mut(&mut self) -> &mut Vec<SharedCspNode> {
        &mut self.sols
    }

    fn push_sol(&mut self, node: SharedCspNode) {
        // A new solution can only decrease the pending distances.
        for e in self.pending.iter_mut() {
            let d = node.borrow().boxx().distance(e.node.borrow().boxx());
            if d < e.mindist {
                e.mindist = d;
            }
        }
        self.sols.push(node);
        self.sort_pending();
    }

    fn make_sol_clusters(&mut self, gap: f64) {
        if gap < 0.0 {
            return;
        }
        cluster(&mut self.sols, gap);
        // Recompute the distances against the clustered solutions.
        for e in self.pending.iter_mut() {
            e.mindist = f64::INFINITY;
            for s in &self.sols {
                let d = s.borrow().boxx().distance(e.node.borrow().boxx());
                if d < e.mindist {
                    e.mindist = d;
                }
            }
        }
        self.sort_pending();
    }
}

/// Ordering key of the hybrid best-first stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HybridStyle {
    /// Shallowest node first.
    Depth,
    /// Widest box first (sum of widths).
    Perimeter,
    /// Widest box first, counted in tolerance cells.
    GridPerimeter,
}

struct KeyedElem {
    key: f64,
    node: SharedCspNode,
}

/// Hybrid best-first DFS: bursts of DFS on a stack; when a solution is
/// found the stack migrates into an ordered set and the next burst
/// restarts from the best node, with the children ordering alternating
/// left-right between bursts.
pub struct HybridDfsSpace {
    style: HybridStyle,
    stack: Vec<SharedCspNode>,
    // Ascending by key; extraction takes the front.
    set: Vec<KeyedElem>,
    sols: Vec<SharedCspNode>,
    left_right: bool,
}

impl HybridDfsSpace {
    pub fn new(style: HybridStyle) -> Self {
        HybridDfsSpace {
            style,
            stack: Vec::new(),
            set: Vec::new(),
            sols: Vec::new(),
            left_right: true,
        }
    }

    fn key(&self, node: &SharedCspNode) -> f64 {
        let n = node.borrow();
        match self.style {
            HybridStyle::Depth => n.depth() as f64,
            // Negated: the widest box must come first in the ascending set.
            HybridStyle::Perimeter => -n.boxx().perimeter(),
            HybridStyle::GridPerimeter => -n.boxx().grid_perimeter(),
        }
    }

    fn insert_keyed(&mut self, node: SharedCspNode) {
        let key = self.key(&node);
        let pos = self
            .set
            .partition_point(|e| e.key <= key);
        self.set.insert(pos, KeyedElem { key, node });
    }
}

impl CspSpace for HybridDfsSpace {
    fn nb_pending(&self) -> usize {
        self.stack.len() + self.set.len()
    }

    fn next_pending(&mut self) -> Option<SharedCspNode> {
        if let Some(n) = self.stack.pop() {
            return Some(n);
        }
        if self.set.is_empty() {
            None
        } else {
            Some(self.set.remove(0).node)
        }
    }

    fn insert_pending(&mut self, node: SharedCspNode) {
        self.stack.push(node);
    }

    fn insert_pending_ordered(&mut self, mut nodes: Vec<SharedCspNode>) {
        // The children come ordered left to right; a left-to-right DFS
        // needs them pushed in reverse.
        if self.left_right {
            nodes.reverse();
        }
        for n in nodes {
            self.stack.push(n);
        }
    }

    fn sols(&self) -> &Vec<SharedCspNode> {
        &self.sols
    }

    fn sols_mut(&mut self) -> &mut Vec<SharedCspNode> {
        &mut self.sols
    }

    fn push_sol(&mut self, node: SharedCspNode) {
        self.sols.push(node);
        // End of the DFS burst: alternate the ordering and move the
        // stacked nodes into the best-first set.
        self.left_right = !self.left_right;
        while let Some(n) = self.stack.pop() {
            self.insert_keyed(n);
        }
    }
}
