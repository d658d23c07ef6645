//! Constrained problems: variables, constraints, optional objective.
//!
//! A [`Problem`] owns its variables (ids are dense in 0..N-1 in creation
//! order) and its constraints. Constraints are stored in the canonical form
//! `F in I`: an equation contributes `I = {0}`, an inequality a half-line,
//! a membership its interval.

use crate::boxes::IntervalBox;
use crate::error::{IbisError, IbisResult};
use crate::interval::Interval;
use crate::proof::Proof;
use crate::scope::{Scope, ScopeBank};
use crate::term::{sub, Term};
use crate::tolerance::{TolKind, Tolerance};
use crate::variable::{VarKind, Variable};

/// Relation of the original constraint, kept for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rel {
    Eq,
    Le,
    Ge,
    In,
}

/// A constraint in canonical form `F in I`.
#[derive(Debug, Clone)]
pub struct Constraint {
    term: Term,
    image: Interval,
    rel: Rel,
    scope: Scope,
}

impl Constraint {
    fn make(term: Term, image: Interval, rel: Rel) -> Self {
        let scope = ScopeBank::intern(term.scope());
        Constraint {
            term,
            image,
            rel,
            scope,
        }
    }

    /// `l = r`, canonicalized to `l - r in {0}`.
    pub fn eq(l: Term, r: Term) -> Self {
        Self::make(sub(l, r), Interval::zero(), Rel::Eq)
    }

    /// `l <= r`, canonicalized to `l - r in (-oo, 0]`.
    pub fn le(l: Term, r: Term) -> Self {
        Self::make(sub(l, r), Interval::negative(), Rel::Le)
    }

    /// `l >= r`, canonicalized to `l - r in [0, +oo)`.
    pub fn ge(l: Term, r: Term) -> Self {
        Self::make(sub(l, r), Interval::positive(), Rel::Ge)
    }

    /// Membership `t in x`.
    pub fn in_(t: Term, x: Interval) -> Self {
        Self::make(t, x, Rel::In)
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn image(&self) -> Interval {
        self.image
    }

    pub fn rel(&self) -> Rel {
        self.rel
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn is_equation(&self) -> bool {
        self.image.is_singleton()
    }

    pub fn is_linear(&self) -> bool {
        self.term.is_linear()
    }

    /// Satisfaction test by interval evaluation: `Inner` when certainly
    /// satisfied on the whole box, `Empty` when certainly violated,
    /// `Maybe` otherwise.
    pub fn is_satisfied(&self, b: &IntervalBox) -> Proof {
        let e = self.term.eval(b);
        if e.is_empty() || !e.overlaps(&self.image) {
            Proof::Empty
        } else if self.image.contains_interval(&e) {
            Proof::Inner
        } else {
            Proof::Maybe
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rel {
            Rel::Eq => write!(f, "{} = 0", self.term),
            Rel::Le => write!(f, "{} <= 0", self.term),
            Rel::Ge => write!(f, "{} >= 0", self.term),
            Rel::In => write!(f, "{} in {}", self.term, self.image),
        }
    }
}

/// Direction of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjDir {
    Minimize,
    Maximize,
}

/// An objective function with its direction.
#[derive(Debug, Clone)]
pub struct Objective {
    term: Term,
    dir: ObjDir,
}

impl Objective {
    pub fn minimize(term: Term) -> Self {
        Objective {
            term,
            dir: ObjDir::Minimize,
        }
    }

    pub fn maximize(term: Term) -> Self {
        Objective {
            term,
            dir: ObjDir::Maximize,
        }
    }

    pub fn term(&self) -> &Term {
        &self.term
    }

    pub fn is_minimization(&self) -> bool {
        self.dir == ObjDir::Minimize
    }
}

/// A constraint satisfaction or bound-constrained optimization problem.
#[derive(Debug, Default)]
pub struct Problem {
    name: String,
    vars: Vec<Variable>,
    ctrs: Vec<Constraint>,
    obj: Option<Objective>,
    default_tol: Option<Tolerance>,
}

impl Problem {
    pub fn new(name: impl Into<String>) -> Self {
        Problem {
            name: name.into(),
            ..Default::default()
        }
    }

    fn default_tol(&self) -> Tolerance {
        self.default_tol
            .unwrap_or_else(|| Tolerance::unchecked(1e-8, TolKind::Rel))
    }

    /// Changes the output tolerance given to variables created afterwards.
    pub fn set_default_tolerance(&mut self, tol: Tolerance) {
        self.default_tol = Some(tol);
    }

    pub fn add_real_var(&mut self, lo: f64, hi: f64, name: &str) -> IbisResult<Variable> {
        self.add_var(Interval::new(lo, hi), name, VarKind::Real, None)
    }

    pub fn add_real_var_on(&mut self, domain: Interval, name: &str) -> IbisResult<Variable> {
        self.add_var(domain, name, VarKind::Real, None)
    }

    pub fn add_real_var_tol(
        &mut self,
        domain: Interval,
        name: &str,
        tol: Tolerance,
    ) -> IbisResult<Variable> {
        self.add_var(domain, name, VarKind::Real, Some(tol))
    }

    pub fn add_int_var(&mut self, lo: i64, hi: i64, name: &str) -> IbisResult<Variable> {
        self.add_var(
            Interval::new(lo as f64, hi as f64),
            name,
            VarKind::Integer,
            Some(Tolerance::unchecked(0.0, TolKind::Abs)),
        )
    }

    pub fn add_bool_var(&mut self, name: &str) -> IbisResult<Variable> {
        self.add_var(
            Interval::new(0.0, 1.0),
            name,
            VarKind::Binary,
            Some(Tolerance::unchecked(0.0, TolKind::Abs)),
        )
    }

    /// Adds a variable of any kind; used to rebuild or extend a problem
    /// (for example with an objective variable).
    pub fn add_var_with(
        &mut self,
        domain: Interval,
        name: &str,
        kind: VarKind,
        tol: Option<Tolerance>,
    ) -> IbisResult<Variable> {
        self.add_var(domain, name, kind, tol)
    }

    fn add_var(
        &mut self,
        domain: Interval,
        name: &str,
        kind: VarKind,
        tol: Option<Tolerance>,
    ) -> IbisResult<Variable> {
        if domain.is_empty() {
            return Err(IbisError::Structure(format!(
                "variable {name} created with an empty domain"
            )));
        }
        let id = self.vars.len();
        let name = if name.is_empty() {
            format!("_v{id}")
        } else {
            name.to_string()
        };
        let tol = tol.unwrap_or_else(|| self.default_tol());
        let v = Variable::new(id, name, domain, kind, tol);
        self.vars.push(v.clone());
        Ok(v)
    }

    pub fn add_ctr(&mut self, c: Constraint) {
        self.ctrs.push(c);
    }

    pub fn set_obj(&mut self, obj: Objective) {
        self.obj = Some(obj);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nb_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn var_at(&self, i: usize) -> &Variable {
        &self.vars[i]
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn nb_ctrs(&self) -> usize {
        self.ctrs.len()
    }

    pub fn ctr_at(&self, i: usize) -> &Constraint {
        &self.ctrs[i]
    }

    pub fn ctrs(&self) -> &[Constraint] {
        &self.ctrs
    }

    pub fn obj(&self) -> Option<&Objective> {
        self.obj.as_ref()
    }

    /// The scope holding every variable of this problem, interned.
    pub fn scope(&self) -> Scope {
        ScopeBank::intern(Scope::from_vars(self.vars.iter().cloned()))
    }

    /// The box of the declared variable domains.
    pub fn initial_box(&self) -> IntervalBox {
        IntervalBox::new(self.scope())
    }

    /// A variable declared but not occurring in any constraint or in the
    /// objective.
    pub fn is_fake_var(&self, v: &Variable) -> bool {
        !self.ctrs.iter().any(|c| c.term().depends_on(v))
            && !self
                .obj
                .as_ref()
                .map(|o| o.term().depends_on(v))
                .unwrap_or(false)
    }

    /// Constraint satisfaction problem: constraints, no objective.
    pub fn is_csp(&self) -> bool {
        self.obj.is_none() && !self.ctrs.is_empty()
    }

    /// Bound-constrained optimization problem: an objective over variable
    /// bounds only.
    pub fn is_bcop(&self) -> bool {
        self.obj.is_some() && self.ctrs.is_empty()
    }

    pub fn is_continuous(&self) -> bool {
        self.vars.iter().all(|v| v.is_continuous())
    }

    pub fn is_discrete(&self) -> bool {
        !self.vars.is_empty() && self.vars.iter().all(|v| v.is_discrete())
    }

    pub fn is_mixed(&self) -> bool {
        !self.is_continuous() && !self.is_discrete()
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.name.is_empty() {
            writeln!(f, "problem {}", self.name)?;
        }
        for v in &self.vars {
            writeln!(f, "  {} in {}", v.name(), v.domain())?;
        }
        for c in &self.ctrs {
            writeln!(f, "  {c}")?;
        }
        if let Some(o) = &self.obj {
            let dir = if o.is_minimization() { "min" } else { "max" };
            writeln!(f, "  {dir} {}", o.term())?;
        }
        Ok(())
    }
}
