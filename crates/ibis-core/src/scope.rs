//! Scopes: sets of variables with occurrence counts.
//!
//! A [`Scope`] keeps its variables ordered by id and maintains a compact
//! index map id -> 0..n-1, which boxes use to address their components.
//! Scopes are copy-on-write values; equal scopes can be deduplicated
//! through the process-wide [`ScopeBank`].

use crate::variable::Variable;
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
struct ScopeRep {
    // Variables ordered by id, with their occurrence counts.
    vars: Vec<Variable>,
    counts: Vec<usize>,
    // id -> position in vars.
    index: HashMap<usize, usize>,
}

impl ScopeRep {
    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, v) in self.vars.iter().enumerate() {
            self.index.insert(v.id(), pos);
        }
    }
}

/// An unordered collection of variables with occurrence counts and a
/// compact index map.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    rep: Arc<ScopeRep>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn from_vars<I: IntoIterator<Item = Variable>>(vars: I) -> Self {
        let mut s = Scope::new();
        for v in vars {
            s.insert(&v);
        }
        s
    }

    pub fn size(&self) -> usize {
        self.rep.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rep.vars.is_empty()
    }

    /// Compact position of `v` in 0..size()-1, if present.
    pub fn index_of(&self, v: &Variable) -> Option<usize> {
        self.rep.index.get(&v.id()).copied()
    }

    /// Occurrence counter of `v` (0 when absent).
    pub fn count(&self, v: &Variable) -> usize {
        match self.index_of(v) {
            Some(pos) => self.rep.counts[pos],
            None => 0,
        }
    }

    pub fn contains(&self, v: &Variable) -> bool {
        self.rep.index.contains_key(&v.id())
    }

    pub fn contains_scope(&self, other: &Scope) -> bool {
        other.iter().all(|v| self.contains(v))
    }

    pub fn disjoint(&self, other: &Scope) -> bool {
        !self.overlaps(other)
    }

    pub fn overlaps(&self, other: &Scope) -> bool {
        self.iter().any(|v| other.contains(v))
    }

    pub fn min_id(&self) -> Option<usize> {
        self.rep.vars.first().map(|v| v.id())
    }

    pub fn max_id(&self) -> Option<usize> {
        self.rep.vars.last().map(|v| v.id())
    }

    /// Iteration in increasing id order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.rep.vars.iter()
    }

    /// Variable at compact position `pos`.
    pub fn var_at(&self, pos: usize) -> &Variable {
        &self.rep.vars[pos]
    }

    /// Inserts one occurrence of `v`.
    pub fn insert(&mut self, v: &Variable) {
        self.insert_n(v, 1);
    }

    /// Inserts `n` occurrences of `v`.
    pub fn insert_n(&mut self, v: &Variable, n: usize) {
        let rep = Arc::make_mut(&mut self.rep);
        match rep.vars.binary_search_by_key(&v.id(), |x| x.id()) {
            Ok(pos) => rep.counts[pos] += n,
            Err(pos) => {
                rep.vars.insert(pos, v.clone());
                rep.counts.insert(pos, n);
                rep.rebuild_index();
            }
        }
    }

    /// Union with `other`, occurrence counts added.
    pub fn insert_scope(&mut self, other: &Scope) {
        for (pos, v) in other.rep.vars.iter().enumerate() {
            self.insert_n(v, other.rep.counts[pos]);
        }
    }

    /// Removes all occurrences of `v`.
    pub fn remove(&mut self, v: &Variable) {
        let rep = Arc::make_mut(&mut self.rep);
        if let Ok(pos) = rep.vars.binary_search_by_key(&v.id(), |x| x.id()) {
            rep.vars.remove(pos);
            rep.counts.remove(pos);
            rep.rebuild_index();
        }
    }

    /// Removes `n` occurrences of `v`, dropping it at zero.
    pub fn remove_n(&mut self, v: &Variable, n: usize) {
        let rep = Arc::make_mut(&mut self.rep);
        if let Ok(pos) = rep.vars.binary_search_by_key(&v.id(), |x| x.id()) {
            if rep.counts[pos] > n {
                rep.counts[pos] -= n;
            } else {
                rep.vars.remove(pos);
                rep.counts.remove(pos);
                rep.rebuild_index();
            }
        }
    }

    /// Union of two scopes, interned.
    pub fn union(&self, other: &Scope) -> Scope {
        let mut s = self.clone();
        s.insert_scope(other);
        ScopeBank::intern(s)
    }

    /// Intersection of two scopes, interned.
    pub fn inter(&self, other: &Scope) -> Scope {
        let mut s = Scope::new();
        for v in self.iter() {
            if other.contains(v) {
                s.insert(v);
            }
        }
        ScopeBank::intern(s)
    }

    pub fn hash_code(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for v in self.iter() {
            h = (h ^ v.id() as u64).wrapping_mul(0x100_0000_01b3);
        }
        h
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.rep, &other.rep) {
            return true;
        }
        self.rep.counts == other.rep.counts
            && self.rep.vars.len() == other.rep.vars.len()
            && self
                .rep
                .vars
                .iter()
                .zip(other.rep.vars.iter())
                .all(|(a, b)| a.id() == b.id())
    }
}

impl Eq for Scope {}

impl std::hash::Hash for Scope {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v.name())?;
        }
        write!(f, "}}")
    }
}

/// Process-wide bank of scopes, so equal scopes share one representation.
///
/// The bank is append-only: inserting a scope equal to a previously
/// interned one returns the canonical instance.
pub struct ScopeBank;

static BANK: Lazy<Mutex<hashbrown::HashSet<Scope>>> =
    Lazy::new(|| Mutex::new(hashbrown::HashSet::new()));

impl ScopeBank {
    /// Returns the canonical instance equal to `scope`, inserting it on
    /// first sight.
    pub fn intern(scope: Scope) -> Scope {
        let mut bank = BANK.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = bank.get(&scope) {
            return existing.clone();
        }
        bank.insert(scope.clone());
        scope
    }

    /// Number of distinct scopes interned so far.
    pub fn len() -> usize {
        BANK.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
