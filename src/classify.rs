//! Grammar classification of PBES equations.
//!
//! Both classifiers walk the formula while tracking a [`Mode`]. Entering a quantifier or
//! connective narrows the mode; a connective that does not fit the current mode makes the
//! classification fail. Failing is not an error, the result is simply `false`.
//!
//! PPG shapes, per equation body:
//!
//! ```text
//! conjunctive:  g && ... && (forall v. g' || X(e)) && (g'' || Y(f)) && ...
//! disjunctive:  g || ... || (exists v. g' && X(e)) || (g'' && Y(f)) || ...
//! ```
//!
//! where the guards `g` are simple.

use crate::expr::Expr;
use crate::pbes::{Equation, Pbes};

/// Position in the formula relative to the connectives seen so far.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Undetermined,
    BoundedForall,
    BoundedExists,
    Conjunctive,
    Universal,
    Disjunctive,
    Existential,
}

impl Mode {
    /// Mode inside a universal quantifier, if one is allowed here.
    pub fn enter_forall(self) -> Option<Mode> {
        match self {
            Mode::Undetermined | Mode::BoundedForall => Some(Mode::BoundedForall),
            Mode::Conjunctive | Mode::Universal => Some(Mode::Universal),
            _ => None,
        }
    }

    pub fn enter_exists(self) -> Option<Mode> {
        match self {
            Mode::Undetermined | Mode::BoundedExists => Some(Mode::BoundedExists),
            Mode::Disjunctive | Mode::Existential => Some(Mode::Existential),
            _ => None,
        }
    }

    /// Mode of the operands of a conjunction.
    ///
    /// `Conjunctive` when the conjunction is part of a top-level conjunction, `Existential`
    /// when it is a guarded term `g && psi` below a disjunction or existential quantifier.
    pub fn enter_and(self) -> Option<Mode> {
        match self {
            Mode::Undetermined | Mode::Conjunctive => Some(Mode::Conjunctive),
            Mode::Disjunctive | Mode::Existential | Mode::BoundedExists => Some(Mode::Existential),
            Mode::Universal | Mode::BoundedForall => None,
        }
    }

    pub fn enter_or(self) -> Option<Mode> {
        match self {
            Mode::Undetermined | Mode::Disjunctive => Some(Mode::Disjunctive),
            Mode::Conjunctive | Mode::Universal | Mode::BoundedForall => Some(Mode::Universal),
            Mode::Existential | Mode::BoundedExists => None,
        }
    }

    /// Checks if operands in this mode must be guarded (one side simple).
    pub fn is_guarded(self) -> bool {
        matches!(self, Mode::Universal | Mode::Existential)
    }
}

/// Checks if no propositional variable occurs in `e`.
pub fn is_simple(e: &Expr) -> bool {
    e.is_simple()
}

fn is_ppg_expr(e: &Expr, mode: Mode) -> bool {
    if e.is_simple() || e.is_propvar() {
        return true;
    }
    match e {
        Expr::Forall(_, body) => mode.enter_forall().map_or(false, |m| is_ppg_expr(body, m)),
        Expr::Exists(_, body) => mode.enter_exists().map_or(false, |m| is_ppg_expr(body, m)),
        Expr::And(l, r) => match mode.enter_and() {
            Some(m) if m.is_guarded() => is_guarded_ppg(l, r, m),
            Some(m) => is_ppg_expr(l, m) && is_ppg_expr(r, m),
            None => false,
        },
        Expr::Or(l, r) => match mode.enter_or() {
            Some(m) if m.is_guarded() => is_guarded_ppg(l, r, m),
            Some(m) => is_ppg_expr(l, m) && is_ppg_expr(r, m),
            None => false,
        },
        // `l => r` reads as `!l || r` with a simple `l`
        Expr::Imp(l, r) => {
            l.is_simple() && mode.enter_or().map_or(false, |m| is_ppg_expr(r, m))
        }
        Expr::Not(_) | Expr::Data(_) | Expr::PropVar(_) => false,
    }
}

fn is_guarded_ppg(l: &Expr, r: &Expr, mode: Mode) -> bool {
    (l.is_simple() && is_ppg_expr(r, mode)) || (r.is_simple() && is_ppg_expr(l, mode))
}

/// Strips directly nested quantifiers of the same kind.
pub(crate) fn strip_forall(e: &Expr) -> &Expr {
    match e {
        Expr::Forall(_, body) => strip_forall(body),
        _ => e,
    }
}

pub(crate) fn strip_exists(e: &Expr) -> &Expr {
    match e {
        Expr::Exists(_, body) => strip_exists(body),
        _ => e,
    }
}

fn is_bqnf_expr(e: &Expr) -> bool {
    if e.is_simple() || e.is_propvar() {
        return true;
    }
    match e {
        Expr::Forall(..) => match strip_forall(e) {
            Expr::Imp(l, r) | Expr::Or(l, r) if l.is_simple() => is_bqnf_expr(r),
            Expr::And(..) => false,
            body => is_bqnf_expr(body),
        },
        Expr::Exists(..) => match strip_exists(e) {
            Expr::And(l, r) if l.is_simple() => is_bqnf_expr(r),
            Expr::Or(..) => false,
            body => is_bqnf_expr(body),
        },
        Expr::And(l, r) | Expr::Or(l, r) => is_bqnf_expr(l) && is_bqnf_expr(r),
        Expr::Imp(l, r) => l.is_simple() && is_bqnf_expr(r),
        Expr::Not(_) | Expr::Data(_) | Expr::PropVar(_) => false,
    }
}

pub fn is_ppg_equation(eq: &Equation) -> bool {
    is_ppg_expr(&eq.formula, Mode::Undetermined)
}

pub fn is_ppg(pbes: &Pbes) -> bool {
    pbes.equations.iter().all(is_ppg_equation)
}

pub fn is_bqnf_equation(eq: &Equation) -> bool {
    is_bqnf_expr(&eq.formula)
}

pub fn is_bqnf(pbes: &Pbes) -> bool {
    pbes.equations.iter().all(is_bqnf_equation)
}
