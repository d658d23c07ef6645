//! Symbolic expression terms.
//!
//! Terms are immutable sum-type nodes shared by reference. The smart
//! constructors canonicalize on the fly: operations between constants
//! fold, and the usual identities (`0 + x`, `x * 1`, `x / 1`, `-(-x)`,
//! `pow(x, 0)`, `pow(x, 1)`) are applied. Every node caches a hash code
//! mixing the operator and operand hashes, a constancy flag and a
//! linearity flag.

use crate::error::{IbisError, IbisResult};
use crate::interval::Interval;
use crate::boxes::IntervalBox;
use crate::scope::Scope;
use crate::variable::Variable;
use std::rc::Rc;

/// Operator symbols of internal term nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Neg,
    Abs,
    Sgn,
    Sqr,
    Sqrt,
    Pow(i32),
    Exp,
    Log,
    Cos,
    Sin,
    Tan,
}

impl TermOp {
    fn tag(&self) -> u64 {
        match self {
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
            TermOp::Pow(n) => 12 ^ ((*n as u64) << 8),
            TermOp::Exp => 13,
            TermOp::Log => 14,
            TermOp::Cos => 15,
            TermOp::Sin => 16,
            TermOp::Tan => 17,
        }
    }
}

#[derive(Debug)]
enum TermKind {
    Cst(Interval),
    Var(Variable),
    Unary(TermOp, Term),
    Binary(TermOp, Term, Term),
}

#[derive(Debug)]
struct TermNode {
    kind: TermKind,
    hash: u64,
    constant: bool,
    linear: bool,
}

/// A shared immutable expression term.
#[derive(Debug, Clone)]
pub struct Term {
    rep: Rc<TermNode>,
}

fn mix(h1: u64, h2: u64) -> u64 {
    h1 ^ h2.rotate_left(17).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

impl Term {
    pub fn cst(x: Interval) -> Term {
        Term {
            rep: Rc::new(TermNode {
                hash: mix(0, x.hash_code()),
                constant: true,
                linear: true,
                kind: TermKind::Cst(x),
            }),
        }
    }

    pub fn var(v: &Variable) -> Term {
        Term {
            rep: Rc::new(TermNode {
                hash: mix(1, v.id() as u64),
                constant: false,
                linear: true,
                kind: TermKind::Var(v.clone()),
            }),
        }
    }

    fn unary(op: TermOp, t: Term) -> Term {
        let constant = t.is_constant();
        Term {
            rep: Rc::new(TermNode {
                hash: mix(op.tag(), t.hash_code()),
                constant,
                linear: constant || matches!(op, TermOp::Neg) && t.is_linear(),
                kind: TermKind::Unary(op, t),
            }),
        }
    }

    fn binary(op: TermOp, l: Term, r: Term) -> Term {
        let constant = l.is_constant() && r.is_constant();
        let linear = constant
            || match op {
                TermOp::Add | TermOp::Sub => l.is_linear() && r.is_linear(),
                TermOp::Mul => {
                    (l.is_constant() && r.is_linear()) || (r.is_constant() && l.is_linear())
                }
                TermOp::Div => l.is_linear() && r.is_constant(),
                _ => false,
            };
        Term {
            rep: Rc::new(TermNode {
                hash: mix(op.tag(), mix(l.hash_code(), r.hash_code())),
                constant,
                linear,
                kind: TermKind::Binary(op, l, r),
            }),
        }
    }

    pub fn hash_code(&self) -> u64 {
        self.rep.hash
    }

    pub fn is_constant(&self) -> bool {
        self.rep.constant
    }

    pub fn is_linear(&self) -> bool {
        self.rep.linear
    }

    /// The constant value of a constant term.
    pub fn eval_const(&self) -> IbisResult<Interval> {
        if !self.is_constant() {
            return Err(IbisError::Structure(
                "constant evaluation of a non-constant term".into(),
            ));
        }
        Ok(self.eval_with(&mut |_| Interval::empty()))
    }

    /// Interval evaluation on a box.
    pub fn eval(&self, b: &IntervalBox) -> Interval {
        self.eval_with(&mut |v| b.get(v))
    }

    fn eval_with(&self, lookup: &mut dyn FnMut(&Variable) -> Interval) -> Interval {
        match &self.rep.kind {
            TermKind::Cst(x) => *x,
            TermKind::Var(v) => lookup(v),
            TermKind::Unary(op, t) => {
                let x = t.eval_with(lookup);
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
            TermKind::Binary(op, l, r) => {
                let x = l.eval_with(lookup);
                let y = r.eval_with(lookup);
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

    /// Collects the free variables with their occurrence counts.
    pub fn make_scope(&self, scope: &mut Scope) {
        match &self.rep.kind {
            TermKind::Cst(_) => {}
            TermKind::Var(v) => scope.insert(v),
            TermKind::Unary(_, t) => t.make_scope(scope),
            TermKind::Binary(_, l, r) => {
                l.make_scope(scope);
                r.make_scope(scope);
            }
        }
    }

    pub fn scope(&self) -> Scope {
        let mut s = Scope::new();
        self.make_scope(&mut s);
        s
    }

    pub fn depends_on(&self, v: &Variable) -> bool {
        match &self.rep.kind {
            TermKind::Cst(_) => false,
            TermKind::Var(w) => w == v,
            TermKind::Unary(_, t) => t.depends_on(v),
            TermKind::Binary(_, l, r) => l.depends_on(v) || r.depends_on(v),
        }
    }

    fn as_cst(&self) -> Option<Interval> {
        match &self.rep.kind {
            TermKind::Cst(x) => Some(*x),
            _ => None,
        }
    }

    fn is_cst_value(&self, a: f64) -> bool {
        matches!(self.as_cst(), Some(x) if x.is_singleton() && x.left() == a)
    }

    pub fn is_zero(&self) -> bool {
        self.is_cst_value(0.0)
    }

    pub fn is_one(&self) -> bool {
        self.is_cst_value(1.0)
    }

    pub fn is_minus_one(&self) -> bool {
        self.is_cst_value(-1.0)
    }

    pub(crate) fn visit(&self) -> TermView<'_> {
        match &self.rep.kind {
            TermKind::Cst(x) => TermView::Cst(*x),
            TermKind::Var(v) => TermView::Var(v),
            TermKind::Unary(op, t) => TermView::Unary(*op, t),
            TermKind::Binary(op, l, r) => TermView::Binary(*op, l, r),
        }
    }
}

/// Borrowed view of a term node, for structural traversals.
pub(crate) enum TermView<'a> {
    Cst(Interval),
    Var(&'a Variable),
    Unary(TermOp, &'a Term),
    Binary(TermOp, &'a Term, &'a Term),
}

// ---- smart constructors --------------------------------------------------

pub fn add(l: Term, r: Term) -> Term {
    if let (Some(a), Some(b)) = (l.as_cst(), r.as_cst()) {
        return Term::cst(a + b);
    }
    if l.is_zero() {
        return r;
    }
    if r.is_zero() {
        return l;
    }
    Term::binary(TermOp::Add, l, r)
}

pub fn sub(l: Term, r: Term) -> Term {
    if let (Some(a), Some(b)) = (l.as_cst(), r.as_cst()) {
        return Term::cst(a - b);
    }
    if r.is_zero() {
        return l;
    }
    if l.is_zero() {
        return neg(r);
    }
    Term::binary(TermOp::Sub, l, r)
}

pub fn mul(l: Term, r: Term) -> Term {
    if let (Some(a), Some(b)) = (l.as_cst(), r.as_cst()) {
        return Term::cst(a * b);
    }
    if l.is_zero() || r.is_zero() {
        return Term::cst(Interval::zero());
    }
    if l.is_one() {
        return r;
    }
    if r.is_one() {
        return l;
    }
    if l.is_minus_one() {
        return neg(r);
    }
    if r.is_minus_one() {
        return neg(l);
    }
    Term::binary(TermOp::Mul, l, r)
}

pub fn div(l: Term, r: Term) -> Term {
    if let (Some(a), Some(b)) = (l.as_cst(), r.as_cst()) {
        return Term::cst(a / b);
    }
    if r.is_one() {
        return l;
    }
    if l.is_zero() {
        return Term::cst(Interval::zero());
    }
    if r.is_minus_one() {
        return neg(l);
    }
    Term::binary(TermOp::Div, l, r)
}

pub fn neg(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(-a);
    }
    if let TermKind::Unary(TermOp::Neg, inner) = &t.rep.kind {
        return inner.clone();
    }
    Term::unary(TermOp::Neg, t)
}

pub fn abs(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(a.abs());
    }
    Term::unary(TermOp::Abs, t)
}

pub fn sgn(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(a.sgn());
    }
    Term::unary(TermOp::Sgn, t)
}

pub fn sqr(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(a.sqr());
    }
    Term::unary(TermOp::Sqr, t)
}

pub fn sqrt(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(a.sqrt());
    }
    Term::unary(TermOp::Sqrt, t)
}

pub fn pow(t: Term, n: i32) -> Term {
    if n == 0 {
        return Term::cst(Interval::one());
    }
    if n == 1 {
        return t;
    }
    if let Some(a) = t.as_cst() {
        return Term::cst(a.pow(n));
    }
    if n == 2 {
        return sqr(t);
    }
    Term::unary(TermOp::Pow(n), t)
}

pub fn exp(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(a.exp());
    }
    Term::unary(TermOp::Exp, t)
}

pub fn log(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(a.log());
    }
    Term::unary(TermOp::Log, t)
}

pub fn cos(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(a.cos());
    }
    Term::unary(TermOp::Cos, t)
}

pub fn sin(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(a.sin());
    }
    Term::unary(TermOp::Sin, t)
}

pub fn tan(t: Term) -> Term {
    if let Some(a) = t.as_cst() {
        return Term::cst(a.tan());
    }
    Term::unary(TermOp::Tan, t)
}

pub fn mini(l: Term, r: Term) -> Term {
    if let (Some(a), Some(b)) = (l.as_cst(), r.as_cst()) {
        return Term::cst(a.min(&b));
    }
    Term::binary(TermOp::Min, l, r)
}

pub fn maxi(l: Term, r: Term) -> Term {
    if let (Some(a), Some(b)) = (l.as_cst(), r.as_cst()) {
        return Term::cst(a.max(&b));
    }
    Term::binary(TermOp::Max, l, r)
}

// ---- derivation ----------------------------------------------------------

/// Symbolic partial derivative of `t` with respect to `v`.
///
/// min and max are not differentiable and fail with
/// [`IbisError::NotDifferentiable`].
pub fn derive(t: &Term, v: &Variable) -> IbisResult<Term> {
    match t.visit() {
        TermView::Cst(_) => Ok(Term::cst(Interval::zero())),
        TermView::Var(w) => Ok(Term::cst(if w == v {
            Interval::one()
        } else {
            Interval::zero()
        })),
        TermView::Unary(op, u) => {
            let du = derive(u, v)?;
            Ok(match op {
                TermOp::Neg => neg(du),
                TermOp::Abs => mul(sgn(u.clone()), du),
                TermOp::Sgn => Term::cst(Interval::zero()),
                TermOp::Sqr => mul(mul(Term::from(2.0), du), u.clone()),
                TermOp::Sqrt => div(mul(Term::from(0.5), du), sqrt(u.clone())),
                TermOp::Pow(n) => mul(mul(Term::from(n as f64), du), pow(u.clone(), n - 1)),
                TermOp::Exp => mul(du, exp(u.clone())),
                TermOp::Log => div(du, u.clone()),
                TermOp::Cos => mul(neg(du), sin(u.clone())),
                TermOp::Sin => mul(du, cos(u.clone())),
                TermOp::Tan => mul(add(Term::from(1.0), sqr(tan(u.clone()))), du),
                _ => unreachable!("binary operator in a unary node"),
            })
        }
        TermView::Binary(op, l, r) => {
            match op {
                TermOp::Min | TermOp::Max => {
                    return Err(IbisError::NotDifferentiable(
                        "function min/max is not derivable".into(),
                    ))
                }
                _ => {}
            }
            let dl = derive(l, v)?;
            let dr = derive(r, v)?;
            Ok(match op {
                TermOp::Add => add(dl, dr),
                TermOp::Sub => sub(dl, dr),
                TermOp::Mul => add(mul(dl, r.clone()), mul(dr, l.clone())),
                TermOp::Div => div(
                    sub(mul(dl, r.clone()), mul(dr, l.clone())),
                    sqr(r.clone()),
                ),
                _ => unreachable!("unary operator in a binary node"),
            })
        }
    }
}

// ---- conversions and operators ------------------------------------------

impl From<f64> for Term {
    fn from(a: f64) -> Term {
        Term::cst(Interval::singleton(a))
    }
}

impl From<Interval> for Term {
    fn from(x: Interval) -> Term {
        Term::cst(x)
    }
}

impl From<&Variable> for Term {
    fn from(v: &Variable) -> Term {
        Term::var(v)
    }
}

impl std::ops::Add for Term {
    type Output = Term;
    fn add(self, rhs: Term) -> Term {
        add(self, rhs)
    }
}

impl std::ops::Sub for Term {
    type Output = Term;
    fn sub(self, rhs: Term) -> Term {
        sub(self, rhs)
    }
}

impl std::ops::Mul for Term {
    type Output = Term;
    fn mul(self, rhs: Term) -> Term {
        mul(self, rhs)
    }
}

impl std::ops::Div for Term {
    type Output = Term;
    fn div(self, rhs: Term) -> Term {
        div(self, rhs)
    }
}

impl std::ops::Neg for Term {
    type Output = Term;
    fn neg(self) -> Term {
        neg(self)
    }
}

impl std::ops::Add<Term> for f64 {
    type Output = Term;
    fn add(self, rhs: Term) -> Term {
        add(Term::from(self), rhs)
    }
}

impl std::ops::Sub<Term> for f64 {
    type Output = Term;
    fn sub(self, rhs: Term) -> Term {
        sub(Term::from(self), rhs)
    }
}

impl std::ops::Mul<Term> for f64 {
    type Output = Term;
    fn mul(self, rhs: Term) -> Term {
        mul(Term::from(self), rhs)
    }
}

impl std::ops::Add<f64> for Term {
    type Output = Term;
    fn add(self, rhs: f64) -> Term {
        add(self, Term::from(rhs))
    }
}

impl std::ops::Sub<f64> for Term {
    type Output = Term;
    fn sub(self, rhs: f64) -> Term {
        sub(self, Term::from(rhs))
    }
}

impl std::ops::Mul<f64> for Term {
    type Output = Term;
    fn mul(self, rhs: f64) -> Term {
        mul(self, Term::from(rhs))
    }
}

impl std::ops::Div<f64> for Term {
    type Output = Term;
    fn div(self, rhs: f64) -> Term {
        div(self, Term::from(rhs))
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rep.kind {
            TermKind::Cst(x) => {
                if x.is_singleton() {
                    write!(f, "{}", x.left())
                } else {
                    write!(f, "{x}")
                }
            }
            TermKind::Var(v) => write!(f, "{}", v.name()),
            TermKind::Unary(op, t) => match op {
                TermOp::Neg => write!(f, "(-{t})"),
                TermOp::Abs => write!(f, "abs({t})"),
                TermOp::Sgn => write!(f, "sgn({t})"),
                TermOp::Sqr => write!(f, "sqr({t})"),
                TermOp::Sqrt => write!(f, "sqrt({t})"),
                TermOp::Pow(n) => write!(f, "pow({t}, {n})"),
                TermOp::Exp => write!(f, "exp({t})"),
                TermOp::Log => write!(f, "log({t})"),
                TermOp::Cos => write!(f, "cos({t})"),
                TermOp::Sin => write!(f, "sin({t})"),
                TermOp::Tan => write!(f, "tan({t})"),
                _ => Err(std::fmt::Error),
            },
            TermKind::Binary(op, l, r) => match op {
                TermOp::Add => write!(f, "({l} + {r})"),
                TermOp::Sub => write!(f, "({l} - {r})"),
                TermOp::Mul => write!(f, "({l}*{r})"),
                TermOp::Div => write!(f, "({l}/{r})"),
                TermOp::Min => write!(f, "min({l}, {r})"),
                TermOp::Max => write!(f, "max({l}, {r})"),
                _ => Err(std::fmt::Error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tolerance::{TolKind, Tolerance};
    use crate::variable::VarKind;

    fn var(id: usize, name: &str) -> Variable {
        Variable::new(
            id,
            name,
            Interval::new(-10.0, 10.0),
            VarKind::Real,
            Tolerance::unchecked(1e-8, TolKind::Rel),
        )
    }

    #[test]
    fn test_constant_folding() {
        let t = Term::from(2.0) + Term::from(3.0);
        assert!(t.is_constant());
        assert!(t.eval_const().unwrap().is_set_eq(&Interval::singleton(5.0)));
        let t = Term::from(2.0) * Term::from(4.0) - Term::from(1.0);
        assert!(t.eval_const().unwrap().is_set_eq(&Interval::singleton(7.0)));
    }

    #[test]
    fn test_identities() {
        let x = var(0, "x");
        let t = Term::from(0.0) + Term::var(&x);
        assert!(matches!(t.visit(), TermView::Var(_)));
        let t = Term::var(&x) * Term::from(1.0);
        assert!(matches!(t.visit(), TermView::Var(_)));
        let t = Term::var(&x) / Term::from(1.0);
        assert!(matches!(t.visit(), TermView::Var(_)));
        let t = neg(neg(Term::var(&x)));
        assert!(matches!(t.visit(), TermView::Var(_)));
        let t = pow(Term::var(&x), 0);
        assert!(t.is_one());
        let t = pow(Term::var(&x), 1);
        assert!(matches!(t.visit(), TermView::Var(_)));
        let t = Term::var(&x) * Term::from(0.0);
        assert!(t.is_zero());
    }

    #[test]
    fn test_eval_on_box() {
        let x = var(0, "x");
        let y = var(1, "y");
        let mut b = IntervalBox::new(Scope::from_vars([x.clone(), y.clone()]));
        b.set(&x, Interval::new(1.0, 2.0));
        b.set(&y, Interval::new(3.0, 4.0));
        let t = sqr(Term::var(&x) + Term::var(&y)) - 2.0 * Term::var(&y);
        let e = t.eval(&b);
        // (x+y)^2 in [16, 36], 2y in [6, 8]
        assert!(e.is_set_eq(&Interval::new(8.0, 30.0)));
    }

    #[test]
    fn test_scope_counts_occurrences() {
        let x = var(0, "x");
        let y = var(1, "y");
        let t = sqr(Term::var(&x)) + Term::var(&x) * Term::var(&y);
        let s = t.scope();
        assert_eq!(s.size(), 2);
        assert_eq!(s.count(&x), 2);
        assert_eq!(s.count(&y), 1);
    }

    #[test]
    fn test_linearity() {
        let x = var(0, "x");
        let y = var(1, "y");
        assert!((2.0 * Term::var(&x) + Term::var(&y)).is_linear());
        assert!(!(Term::var(&x) * Term::var(&y)).is_linear());
        assert!(!sqr(Term::var(&x)).is_linear());
        assert!((Term::var(&x) / 3.0).is_linear());
    }

    #[test]
    fn test_derive_polynomial() {
        let x = var(0, "x");
        let y = var(1, "y");
        // d/dx (x^2 y + x) = 2xy + 1
        let t = sqr(Term::var(&x)) * Term::var(&y) + Term::var(&x);
        let d = derive(&t, &x).unwrap();
        let mut b = IntervalBox::new(Scope::from_vars([x.clone(), y.clone()]));
        b.set(&x, Interval::singleton(3.0));
        b.set(&y, Interval::singleton(5.0));
        assert!(d.eval(&b).is_set_eq(&Interval::singleton(31.0)));
    }

    #[test]
    fn test_derive_chain_rules() {
        let x = var(0, "x");
        // d/dx exp(2x) = 2 exp(2x)
        let d = derive(&exp(2.0 * Term::var(&x)), &x).unwrap();
        let mut b = IntervalBox::new(Scope::from_vars([x.clone()]));
        b.set(&x, Interval::singleton(0.0));
        assert!(d.eval(&b).contains(2.0));
        // d/dx sqrt(x) at 4 = 0.25
        let d = derive(&sqrt(Term::var(&x)), &x).unwrap();
        b.set(&x, Interval::singleton(4.0));
        assert!(d.eval(&b).contains(0.25));
    }

    #[test]
    fn test_derive_min_max_fails() {
        let x = var(0, "x");
        let y = var(1, "y");
        let t = mini(Term::var(&x), Term::var(&y));
        assert!(matches!(
            derive(&t, &x),
            Err(IbisError::NotDifferentiable(_))
        ));
        let t = maxi(Term::var(&x), Term::var(&y));
        assert!(matches!(
            derive(&t, &y),
            Err(IbisError::NotDifferentiable(_))
        ));
    }

    #[test]
    fn test_display() {
        let x = var(0, "x");
        let y = var(1, "y");
        let t = sqr(Term::var(&x) + Term::var(&y)) - 2.0 * Term::var(&y);
        assert_eq!(format!("{t}"), "(sqr((x + y)) - (2*y))");
    }
}
