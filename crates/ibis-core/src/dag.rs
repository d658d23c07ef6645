//! Shared-subexpression DAG over interval arithmetic.
//!
//! A [`Dag`] represents a conjunction of constraints as one expression
//! graph. Each inserted constraint is held in the canonical form `F in I`
//! and yields a [`DagFun`] handle recording the root node, the image
//! interval, the scope and the topological order of the function's
//! subgraph (operands before parents).
//!
//! Hash-consing merges common subexpressions, so a node can be reached
//! through several parents. The backward pass of [`Dag::hc4_revise`] merges
//! the projections of such shared nodes by intersection, which is what
//! makes the DAG contraction stronger than contraction over expression
//! trees.
//!
//! The per-node scratch cells (forward value, backward projection,
//! adjoint) are interior-mutable: the core is single-threaded and the
//! cells are written only by the currently running contractor.

use crate::boxes::{IntervalBox, RealPoint};
use crate::interval::proj::*;
use crate::interval::Interval;
use crate::problem::Constraint;
use crate::proof::Proof;
use crate::scope::{Scope, ScopeBank};
use crate::term::{Term, TermOp, TermView};
use crate::variable::Variable;
use hashbrown::HashMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;
use std::cell::RefCell;

/// Index of a node in the DAG, dense in creation order.
pub type NodeId = usize;

/// Index of a function (inserted constraint root) in the DAG.
pub type FunId = usize;

#[derive(Debug, Clone)]
enum DagOp {
    Cst(Interval),
    Var(Variable),
    Unary(TermOp),
    Binary(TermOp),
}

#[derive(Debug, Clone)]
struct DagNode {
    op: DagOp,
    args: [NodeId; 2],
    arity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Cst(u64, u64),
    Var(usize),
    Op(u64, NodeId, NodeId),
}

/// Handle on one function `F in I` of the DAG.
#[derive(Debug, Clone)]
pub struct DagFun {
    root: NodeId,
    image: Interval,
    scope: Scope,
    topo: Vec<NodeId>,
}

impl DagFun {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Target image `I` of the canonical form `F in I`.
    pub fn image(&self) -> Interval {
        self.image
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn depends_on(&self, v: &Variable) -> bool {
        self.scope.contains(v)
    }
}

/// Shared expression graph of a conjunction of constraints.
#[derive(Debug, Default)]
pub struct Dag {
    nodes: Vec<DagNode>,
    // Structural mirror: one petgraph node per DAG node, one edge per
    // operand reference (parent -> child). Subgraph extraction and
    // topological ordering run on this graph.
    structure: DiGraph<NodeId, ()>,
    gidx: Vec<NodeIndex>,
    cse: HashMap<NodeKey, NodeId>,
    var_nodes: HashMap<usize, NodeId>,
    funs: Vec<DagFun>,
    scope: Scope,
    vals: RefCell<Vec<Interval>>,
    prjs: RefCell<Vec<Interval>>,
    adjs: RefCell<Vec<Interval>>,
}

impl Dag {
    pub fn new() -> Self {
        Dag::default()
    }

    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nb_funs(&self) -> usize {
        self.funs.len()
    }

    pub fn fun(&self, i: FunId) -> &DagFun {
        &self.funs[i]
    }

    /// Union of the scopes of all inserted functions.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The node representing variable `v`, if `v` occurs in the graph.
    pub fn var_node(&self, v: &Variable) -> Option<NodeId> {
        self.var_nodes.get(&v.id()).copied()
    }

    /// Inserts a constraint in canonical form and returns its handle.
    pub fn insert(&mut self, c: &Constraint) -> FunId {
        let root = self.insert_term(c.term());
        let topo = self.subgraph_topo(root);
        let fun = DagFun {
            root,
            image: c.image(),
            scope: c.scope().clone(),
            topo,
        };
        self.scope = self.scope.union(fun.scope());
        self.scope = ScopeBank::intern(self.scope.clone());
        self.funs.push(fun);
        self.funs.len() - 1
    }

    fn insert_term(&mut self, t: &Term) -> NodeId {
        match t.visit() {
            TermView::Cst(x) => {
                let key = NodeKey::Cst(x.left().to_bits(), x.right().to_bits());
                self.intern_node(key, DagOp::Cst(x), [0, 0], 0)
            }
            TermView::Var(v) => {
                let key = NodeKey::Var(v.id());
                let id = self.intern_node(key, DagOp::Var(v.clone()), [0, 0], 0);
                self.var_nodes.insert(v.id(), id);
                id
            }
            TermView::Unary(op, u) => {
                let a = self.insert_term(u);
                let key = NodeKey::Op(op_tag(op), a, usize::MAX);
                self.intern_node(key, DagOp::Unary(op), [a, 0], 1)
            }
            TermView::Binary(op, l, r) => {
                let a = self.insert_term(l);
                let b = self.insert_term(r);
                let key = NodeKey::Op(op_tag(op), a, b);
                self.intern_node(key, DagOp::Binary(op), [a, b], 2)
            }
        }
    }

    fn intern_node(&mut self, key: NodeKey, op: DagOp, args: [NodeId; 2], arity: usize) -> NodeId {
        if let Some(id) = self.cse.get(&key) {
            return *id;
        }
        let id = self.nodes.len();
        self.nodes.push(DagNode { op, args, arity });
        let g = self.structure.add_node(id);
        self.gidx.push(g);
        for k in 0..arity {
            self.structure.add_edge(g, self.gidx[args[k]], ());
        }
        self.cse.insert(key, id);
        self.vals.borrow_mut().push(Interval::empty());
        self.prjs.borrow_mut().push(Interval::empty());
        self.adjs.borrow_mut().push(Interval::empty());
        id
    }

    /// Nodes reachable from `root`, operands before parents.
    fn subgraph_topo(&self, root: NodeId) -> Vec<NodeId> {
        let mut topo = Vec::new();
        let mut dfs = DfsPostOrder::new(&self.structure, self.gidx[root]);
        while let Some(nx) = dfs.next(&self.structure) {
            topo.push(self.structure[nx]);
        }
        topo
    }

    fn forward(&self, node: &DagNode, vals: &[Interval], lookup: &dyn Fn(&Variable) -> Interval) -> Interval {
        match &node.op {
            DagOp::Cst(x) => *x,
            DagOp::Var(v) => lookup(v),
            DagOp::Unary(op) => {
                let x = vals[node.args[0]];
                match op {
                    TermOp::Neg => -x,
                    TermOp::Abs => x.abs(),
                    TermOp::Sgn => x.sgn(),
                    TermOp::Sqr => x.sqr(),
                    TermOp::Sqrt => x.sqrt(),
                    TermOp::Pow(n) => x.pow(*n),
                    TermOp::Exp => x.exp(),
                    TermOp::Log => x.log(),
                    TermOp::Cos => x.cos(),
                    TermOp::Sin => x.sin(),
                    TermOp::Tan => x.tan(),
                    _ => Interval::empty(),
                }
            }
            DagOp::Binary(op) => {
                let x = vals[node.args[0]];
                let y = vals[node.args[1]];
                match op {
                    TermOp::Add => x + y,
                    TermOp::Sub => x - y,
                    TermOp::Mul => x * y,
                    TermOp::Div => x / y,
                    TermOp::Min => x.min(&y),
                    TermOp::Max => x.max(&y),
                    _ => Interval::empty(),
                }
            }
        }
    }

    fn eval_lookup(&self, fun: FunId, lookup: &dyn Fn(&Variable) -> Interval) -> Interval {
        let topo = &self.funs[fun].topo;
        let mut vals = self.vals.borrow_mut();
        for &id in topo {
            let t = self.forward(&self.nodes[id], &vals, lookup);
            vals[id] = t;
        }
        vals[self.funs[fun].root]
    }

    /// Forward interval evaluation of a function on a box.
    ///
    /// The per-node cached values are valid only for the last evaluated
    /// box.
    pub fn eval(&self, fun: FunId, b: &IntervalBox) -> Interval {
        self.eval_lookup(fun, &|v| b.get(v))
    }

    /// Safe evaluation at a real point (degenerate intervals).
    pub fn eval_point(&self, fun: FunId, p: &RealPoint) -> Interval {
        self.eval_lookup(fun, &|v| Interval::singleton(p.get(v)))
    }

    /// Evaluation with the domain of one variable replaced by `x`.
    pub fn eval_override(&self, fun: FunId, b: &IntervalBox, ov: &Variable, x: Interval) -> Interval {
        self.eval_lookup(fun, &|v| if v == ov { x } else { b.get(v) })
    }

    /// HC4-Revise: forward evaluation, then backward projection onto the
    /// image, writing contracted variable domains back into `b`.
    ///
    /// Shared nodes reached through several parents merge their projected
    /// values by intersection.
    pub fn hc4_revise(&self, fun: FunId, b: &mut IntervalBox) -> Proof {
        let image = self.funs[fun].image;
        let root = self.funs[fun].root;
        let root_val = self.eval(fun, b);

        if root_val.is_empty() || !root_val.overlaps(&image) {
            return Proof::Empty;
        }
        if image.contains_interval(&root_val) {
            return Proof::Inner;
        }

        let topo = &self.funs[fun].topo;
        let vals = self.vals.borrow();
        let mut prjs = self.prjs.borrow_mut();
        for &id in topo {
            prjs[id] = vals[id];
        }
        prjs[root] = root_val.inter(&image);

        for &id in topo.iter().rev() {
            let node = &self.nodes[id];
            let z = prjs[id];
            if z.is_empty() {
                return Proof::Empty;
            }
            match &node.op {
                DagOp::Cst(_) | DagOp::Var(_) => {}
                DagOp::Unary(op) => {
                    let a = node.args[0];
                    let x = vals[a];
                    let nx = match op {
                        TermOp::Neg => neg_px(x, z),
                        TermOp::Abs => abs_px(x, z),
                        TermOp::Sgn => sgn_px(x, z),
                        TermOp::Sqr => sqr_px(x, z),
                        TermOp::Sqrt => sqrt_px(x, z),
                        TermOp::Pow(n) => pow_px(x, *n, z),
                        TermOp::Exp => exp_px(x, z),
                        TermOp::Log => log_px(x, z),
                        TermOp::Cos => cos_px(x, z),
                        TermOp::Sin => sin_px(x, z),
                        TermOp::Tan => tan_px(x, z),
                        _ => x,
                    };
                    prjs[a] = prjs[a].inter(&nx);
                    if prjs[a].is_empty() {
                        return Proof::Empty;
                    }
                }
                DagOp::Binary(op) => {
                    let (a, c) = (node.args[0], node.args[1]);
                    let x = vals[a];
                    let y = vals[c];
                    let (nx, ny) = match op {
                        TermOp::Add => (add_px(x, y, z), add_py(x, y, z)),
                        TermOp::Sub => (sub_px(x, y, z), sub_py(x, y, z)),
                        TermOp::Mul => (mul_px(x, y, z), mul_py(x, y, z)),
                        TermOp::Div => (div_px(x, y, z), div_py(x, y, z)),
                        TermOp::Min => (min_px(x, y, z), min_py(x, y, z)),
                        TermOp::Max => (max_px(x, y, z), max_py(x, y, z)),
                        _ => (x, y),
                    };
                    prjs[a] = prjs[a].inter(&nx);
                    if prjs[a].is_empty() {
                        return Proof::Empty;
                    }
                    prjs[c] = prjs[c].inter(&ny);
                    if prjs[c].is_empty() {
                        return Proof::Empty;
                    }
                }
            }
        }

        // Write the projected variable domains back into the box. The
        // projections only shrank the forward values, so each new domain
        // is included in the previous one.
        for v in self.funs[fun].scope.iter() {
            if let Some(&id) = self.var_nodes.get(&v.id()) {
                let nv = prjs[id];
                if nv.is_empty() {
                    return Proof::Empty;
                }
                b.set(v, nv);
            }
        }
        Proof::Maybe
    }

    /// Reverse-mode interval gradient of a function on a box, indexed by
    /// the compact positions of the function's scope.
    ///
    /// `abs` contributes its sign enclosure, `sgn` a zero derivative, and
    /// `min`/`max` the `[0, 1]` generalized slope, so the result is a
    /// sound slope enclosure even for the non-smooth operations.
    pub fn gradient(&self, fun: FunId, b: &IntervalBox) -> Vec<Interval> {
        self.gradient_lookup(fun, &|v| b.get(v))
    }

    /// Gradient with the domain of one variable replaced by `x`.
    pub fn gradient_override(
        &self,
        fun: FunId,
        b: &IntervalBox,
        ov: &Variable,
        x: Interval,
    ) -> Vec<Interval> {
        self.gradient_lookup(fun, &|v| if v == ov { x } else { b.get(v) })
    }

    fn gradient_lookup(&self, fun: FunId, lookup: &dyn Fn(&Variable) -> Interval) -> Vec<Interval> {
        self.eval_lookup(fun, lookup);
        let f = &self.funs[fun];
        let vals = self.vals.borrow();
        let mut adjs = self.adjs.borrow_mut();
        for &id in &f.topo {
            adjs[id] = Interval::zero();
        }
        adjs[f.root] = Interval::one();

        let two = Interval::singleton(2.0);
        let unit = Interval::zero_plus_one();
        for &id in f.topo.iter().rev() {
            let node = &self.nodes[id];
            let a = adjs[id];
            if a.is_zero() || a.is_empty() {
                continue;
            }
            match &node.op {
                DagOp::Cst(_) | DagOp::Var(_) => {}
                DagOp::Unary(op) => {
                    let i = node.args[0];
                    let x = vals[i];
                    let dx = match op {
                        TermOp::Neg => -a,
                        TermOp::Abs => a * x.sgn(),
                        TermOp::Sgn => Interval::zero(),
                        TermOp::Sqr => a * two * x,
                        TermOp::Sqrt => a / (two * x.sqrt()),
                        TermOp::Pow(n) => a * Interval::singleton(*n as f64) * x.pow(*n - 1),
                        TermOp::Exp => a * x.exp(),
                        TermOp::Log => a / x,
                        TermOp::Cos => -a * x.sin(),
                        TermOp::Sin => a * x.cos(),
                        TermOp::Tan => a * (Interval::one() + x.tan().sqr()),
                        _ => Interval::zero(),
                    };
                    adjs[i] = adjs[i] + dx;
                }
                DagOp::Binary(op) => {
                    let (i, j) = (node.args[0], node.args[1]);
                    let x = vals[i];
                    let y = vals[j];
                    let (dx, dy) = match op {
                        TermOp::Add => (a, a),
                        TermOp::Sub => (a, -a),
                        TermOp::Mul => (a * y, a * x),
                        TermOp::Div => (a / y, -a * x / y.sqr()),
                        // Generalized slope of the non-smooth envelope.
                        TermOp::Min | TermOp::Max => (a * unit, a * unit),
                        _ => (Interval::zero(), Interval::zero()),
                    };
                    adjs[i] = adjs[i] + dx;
                    adjs[j] = adjs[j] + dy;
                }
            }
        }

        f.scope
            .iter()
            .map(|v| match self.var_nodes.get(&v.id()) {
                Some(&id) => adjs[id],
                None => Interval::zero(),
            })
            .collect()
    }

    /// Value and derivative with respect to `ov`, with the domain of `ov`
    /// replaced by `x`. This is the thick univariate view used by interval
    /// Newton refinements.
    pub fn eval_diff_override(
        &self,
        fun: FunId,
        b: &IntervalBox,
        ov: &Variable,
        x: Interval,
    ) -> (Interval, Interval) {
        let grad = self.gradient_override(fun, b, ov, x);
        let val = self.vals.borrow()[self.funs[fun].root];
        let d = match self.funs[fun].scope.index_of(ov) {
            Some(pos) => grad[pos],
            None => Interval::zero(),
        };
        (val, d)
    }
}

fn op_tag(op: TermOp) -> u64 {
    match op {
        TermOp::Add => 1,
        TermOp::Sub => 2,
        TermOp::Mul => 3,
        TermOp::Div => 4,
        TermOp::Min => 5,
        TermOp::Max => 6,
        TermOp::Neg => 7,
        TermOp::Abs => 8,
        TermOp::Sgn => 9,
        TermOp::Sqr => 10,
        TermOp::Sqrt => 11,
        TermOp::Pow(n) => 12 | ((n as u64) << 32),
        TermOp::Exp => 13,
        TermOp::Log => 14,
        TermOp::Cos => 15,
        TermOp::Sin => 16,
        TermOp::Tan => 17,
    }
}
