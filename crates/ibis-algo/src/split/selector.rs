//! Variable selection strategies for splitting.

use ibis_core::{Dag, FunId, IntervalBox, Scope, Variable};
use std::rc::Rc;

/// Chooses the variable whose domain the next split will slice.
///
/// `last` carries the variable split at the parent node (the round-robin
/// state lives in the search node, not in the selector). `None` means no
/// splittable variable remains.
pub trait VarSelector {
    fn select(&mut self, b: &IntervalBox, last: Option<&Variable>) -> Option<Variable>;
}

/// Domain size used to compare variables: integer count for discrete
/// domains, width for continuous ones.
fn domain_size(b: &IntervalBox, v: &Variable) -> f64 {
    let x = b.get(v);
    if v.is_discrete() {
        let r = x.round();
        if r.is_empty() {
            0.0
        } else {
            r.width() + 1.0
        }
    } else {
        x.width()
    }
}

/// Cycles through the scope in id order, starting after the variable
/// split at the parent.
pub struct RoundRobinSelector {
    scope: Scope,
}

impl RoundRobinSelector {
    pub fn new(scope: Scope) -> Self {
        RoundRobinSelector { scope }
    }
}

impl VarSelector for RoundRobinSelector {
    fn select(&mut self, b: &IntervalBox, last: Option<&Variable>) -> Option<Variable> {
        let n = self.scope.size();
        if n == 0 {
            return None;
        }
        let first = match last.and_then(|v| self.scope.index_of(v)) {
            Some(pos) => (pos + 1) % n,
            None => 0,
        };
        for k in 0..n {
            let v = self.scope.var_at((first + k) % n);
            if b.is_splittable(v) {
                return Some(v.clone());
            }
        }
        None
    }
}

/// Largest domain first.
pub struct LargestFirstSelector {
    scope: Scope,
}

impl LargestFirstSelector {
    pub fn new(scope: Scope) -> Self {
        LargestFirstSelector { scope }
    }
}

impl VarSelector for LargestFirstSelector {
    fn select(&mut self, b: &IntervalBox, _last: Option<&Variable>) -> Option<Variable> {
        let mut best: Option<(f64, Variable)> = None;
        for v in self.scope.iter() {
            if !b.is_splittable(v) {
                continue;
            }
            let d = domain_size(b, v);
            if best.as_ref().map(|(bd, _)| d > *bd).unwrap_or(true) {
                best = Some((d, v.clone()));
            }
        }
        best.map(|(_, v)| v)
    }
}

/// Smallest domain first.
pub struct SmallestFirstSelector {
    scope: Scope,
}

impl SmallestFirstSelector {
    pub fn new(scope: Scope) -> Self {
        SmallestFirstSelector { scope }
    }
}

impl VarSelector for SmallestFirstSelector {
    fn select(&mut self, b: &IntervalBox, _last: Option<&Variable>) -> Option<Variable> {
        let mut best: Option<(f64, Variable)> = None;
        for v in self.scope.iter() {
            if !b.is_splittable(v) {
                continue;
            }
            let d = domain_size(b, v);
            if best.as_ref().map(|(bd, _)| d < *bd).unwrap_or(true) {
                best = Some((d, v.clone()));
            }
        }
        best.map(|(_, v)| v)
    }
}

/// Smallest discrete domain first, largest real domain otherwise.
pub struct SmallestLargestSelector {
    scope: Scope,
}

impl SmallestLargestSelector {
    pub fn new(scope: Scope) -> Self {
        SmallestLargestSelector { scope }
    }
}

impl VarSelector for SmallestLargestSelector {
    fn select(&mut self, b: &IntervalBox, _last: Option<&Variable>) -> Option<Variable> {
        let mut best_disc: Option<(f64, Variable)> = None;
        let mut best_real: Option<(f64, Variable)> = None;
        for v in self.scope.iter() {
            if !b.is_splittable(v) {
                continue;
            }
            let d = domain_size(b, v);
            if v.is_discrete() {
                if best_disc.as_ref().map(|(bd, _)| d < *bd).unwrap_or(true) {
                    best_disc = Some((d, v.clone()));
                }
            } else if best_real.as_ref().map(|(bd, _)| d > *bd).unwrap_or(true) {
                best_real = Some((d, v.clone()));
            }
        }
        best_disc.or(best_real).map(|(_, v)| v)
    }
}

/// How the per-function smear weights are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SmearMode {
    /// Sum of the relative smears over the functions (SSR).
    SumRelative,
    /// Average of the relative smears (ASR).
    AverageRelative,
}

/// Smear-based selection: weight a variable by the impact of its domain
/// width through the function derivatives.
pub struct SsrSelector {
    dag: Rc<Dag>,
    funs: Vec<FunId>,
    scope: Scope,
    mode: SmearMode,
    fallback: LargestFirstSelector,
}

impl SsrSelector {
    pub fn new(dag: Rc<Dag>, funs: Vec<FunId>, scope: Scope) -> Self {
        let fallback = LargestFirstSelector::new(scope.clone());
        SsrSelector {
            dag,
            funs,
            scope,
            mode: SmearMode::SumRelative,
            fallback,
        }
    }

    /// The average-smear-relative variant.
    pub fn average(dag: Rc<Dag>, funs: Vec<FunId>, scope: Scope) -> Self {
        let mut s = Self::new(dag, funs, scope);
        s.mode = SmearMode::AverageRelative;
        s
    }

    fn weights(&self, b: &IntervalBox) -> Option<Vec<f64>> {
        let n = self.scope.size();
        let mut acc = vec![0.0f64; n];
        let mut cnt = vec![0usize; n];
        let mut any = false;

        for &fi in &self.funs {
            let fscope = self.dag.fun(fi).scope().clone();
            let grad = self.dag.gradient(fi, b);

            let mut smears = vec![0.0f64; fscope.size()];
            let mut total = 0.0f64;
            for (pos, v) in fscope.iter().enumerate() {
                let g = grad[pos];
                if g.is_empty() {
                    return None;
                }
                let m = g.mag();
                let s = if m.is_finite() {
                    m * b.get(v).width().min(1.0e30)
                } else {
                    f64::INFINITY
                };
                smears[pos] = s;
                total += s.min(1.0e30);
            }
            if !(total > 0.0) || !total.is_finite() {
                continue;
            }
            for (pos, v) in fscope.iter().enumerate() {
                if let Some(gpos) = self.scope.index_of(v) {
                    acc[gpos] += smears[pos].min(1.0e30) / total;
                    cnt[gpos] += 1;
                    any = true;
                }
            }
        }

        if !any {
            return None;
        }
        if self.mode == SmearMode::AverageRelative {
            for i in 0..n {
                if cnt[i] > 0 {
                    acc[i] /= cnt[i] as f64;
                }
            }
        }
        Some(acc)
    }
}

impl VarSelector for SsrSelector {
    fn select(&mut self, b: &IntervalBox, last: Option<&Variable>) -> Option<Variable> {
        let weights = match self.weights(b) {
            Some(w) => w,
            None => return self.fallback.select(b, last),
        };
        let mut best: Option<(f64, Variable)> = None;
        for (pos, v) in self.scope.iter().enumerate() {
            if !b.is_splittable(v) {
                continue;
            }
            let w = weights[pos];
            if best.as_ref().map(|(bw, _)| w > *bw).unwrap_or(true) {
                best = Some((w, v.clone()));
            }
        }
        best.map(|(_, v)| v).or_else(|| self.fallback.select(b, last))
    }
}

/// Smear selection with a periodic largest-first round.
pub struct HybridSsrLfSelector {
    ssr: SsrSelector,
    lf: LargestFirstSelector,
    frequency: usize,
    count: usize,
}

impl HybridSsrLfSelector {
    pub fn new(ssr: SsrSelector, frequency: usize) -> Self {
        let lf = LargestFirstSelector::new(ssr.scope.clone());
        HybridSsrLfSelector {
            ssr,
            lf,
            frequency: frequency.max(1),
            count: 0,
        }
    }
}

impl VarSelector for HybridSsrLfSelector {
    fn select(&mut self, b: &IntervalBox, last: Option<&Variable>) -> Option<Variable> {
        self.count += 1;
        if self.count % self.frequency == 0 {
            self.lf.select(b, last)
        } else {
            self.ssr.select(b, last)
        }
    }
}

/// Average-smear-relative selection.
pub type AsrSelector = SsrSelector;
