//! Translation from BQNF to PPG.
//!
//! Every subformula that does not fit the PPG shape at its position is moved into a fresh
//! equation with the same fixpoint symbol. Its parameters are those of the source equation
//! followed by the quantified variables in scope. Fresh equations directly follow the
//! equation they were split from.

use log::{debug, info, trace};

use crate::classify::{is_bqnf_equation, is_ppg_equation};
use crate::data::Variable;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::names::NameRegistry;
use crate::pbes::{Equation, FixpointSymbol, Pbes, PropVar};
use crate::ppg::RewriteOptions;

pub fn bqnf2ppg(pbes: &Pbes) -> Result<Pbes> {
    bqnf2ppg_with(pbes, RewriteOptions::default())
}

pub fn bqnf2ppg_with(pbes: &Pbes, options: RewriteOptions) -> Result<Pbes> {
    info!("bqnf2ppg: {} equations", pbes.equations.len());
    pbes.validate()?;
    if let Some(eq) = pbes.equations.iter().find(|eq| !is_bqnf_equation(eq)) {
        return Err(Error::validation(eq.name(), "input not in BQNF"));
    }

    let mut rewriter = Bqnf2PpgRewriter {
        registry: NameRegistry::from_pbes(pbes),
        equations: Vec::new(),
        max_depth: options.max_depth,
    };
    for eq in &pbes.equations {
        rewriter.visit_equation(eq.clone(), 0)?;
    }

    for eq in &rewriter.equations {
        if !is_ppg_equation(eq) {
            return Err(Error::validation(eq.name(), "rewriter output failed PPG re-check"));
        }
    }
    info!(
        "bqnf2ppg: {} equations after rewriting",
        rewriter.equations.len()
    );
    Ok(Pbes::new(
        pbes.data.clone(),
        rewriter.equations,
        pbes.initial.clone(),
    ))
}

/// `psi` is of the form `g1 => g2 => ... => X(e)` (or with `||`), with simple guards.
fn is_inner_implies(e: &Expr) -> bool {
    match e {
        _ if e.is_simple() || e.is_propvar() => true,
        Expr::Or(l, r) | Expr::Imp(l, r) => l.is_simple() && is_inner_implies(r),
        _ => false,
    }
}

/// `psi` is of the form `g1 && g2 && ... && X(e)`, with simple guards.
fn is_inner_and(e: &Expr) -> bool {
    match e {
        _ if e.is_simple() || e.is_propvar() => true,
        Expr::And(l, r) => l.is_simple() && is_inner_and(r),
        _ => false,
    }
}

/// Splits `qexpr` into a simple guard and the guarded part, for the universal shape.
fn implies_guard(qexpr: &Expr) -> (Option<&Expr>, &Expr) {
    match qexpr {
        Expr::Or(l, r) | Expr::Imp(l, r) if l.is_simple() => (Some(&**l), &**r),
        _ => (None, qexpr),
    }
}

fn and_guard(qexpr: &Expr) -> (Option<&Expr>, &Expr) {
    match qexpr {
        Expr::And(l, r) if l.is_simple() => (Some(&**l), &**r),
        _ => (None, qexpr),
    }
}

fn collect_forall(e: &Expr) -> (Vec<Variable>, &Expr) {
    let mut qvars = Vec::new();
    let mut qexpr = e;
    while let Expr::Forall(vars, body) = qexpr {
        qvars.extend(vars.iter().cloned());
        qexpr = body;
    }
    (qvars, qexpr)
}

fn collect_exists(e: &Expr) -> (Vec<Variable>, &Expr) {
    let mut qvars = Vec::new();
    let mut qexpr = e;
    while let Expr::Exists(vars, body) = qexpr {
        qvars.extend(vars.iter().cloned());
        qexpr = body;
    }
    (qvars, qexpr)
}

struct Bqnf2PpgRewriter {
    registry: NameRegistry,
    equations: Vec<Equation>,
    max_depth: usize,
}

impl Bqnf2PpgRewriter {
    /// Fresh variable `X_n(params(var), qvars)` and its identity instantiation.
    fn fresh_variable(&mut self, var: &PropVar, qvars: &[Variable]) -> (PropVar, Expr) {
        let name = self.registry.fresh(&var.name);
        let mut parameters: Vec<Variable> = var
            .parameters
            .iter()
            .filter(|p| !qvars.iter().any(|q| q.name == p.name))
            .cloned()
            .collect();
        parameters.extend(qvars.iter().cloned());
        let fresh = PropVar::new(name, parameters);
        let instance = Expr::PropVar(fresh.identity());
        debug!("fresh variable {} for {}", fresh, var.name);
        (fresh, instance)
    }

    fn push(&mut self, symbol: FixpointSymbol, var: &PropVar, formula: Expr) {
        trace!("bqnf2ppg: {} {} = {}", symbol, var, formula);
        self.equations.push(Equation::new(symbol, var.clone(), formula));
    }

    fn visit_equation(&mut self, eq: Equation, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::too_deep("bqnf2ppg", self.max_depth));
        }
        if eq.formula.is_simple() || eq.formula.is_propvar() {
            self.equations.push(eq);
            return Ok(());
        }
        self.visit_expression(eq.symbol, &eq.variable, &eq.formula, depth)
    }

    fn visit_expression(&mut self, symbol: FixpointSymbol, var: &PropVar, e: &Expr, depth: usize) -> Result<()> {
        match e {
            Expr::Forall(..) => {
                let (qvars, qexpr) = collect_forall(e);
                if !self.visit_inner_implies(symbol, var, e, &qvars, qexpr, depth)? {
                    return Err(Error::structural("bqnf2ppg: expected phi => psi", e));
                }
                Ok(())
            }
            Expr::Exists(..) => {
                let (qvars, qexpr) = collect_exists(e);
                if !self.visit_inner_and(symbol, var, e, &qvars, qexpr, depth)? {
                    return Err(Error::structural("bqnf2ppg: expected phi && psi", e));
                }
                Ok(())
            }
            Expr::Or(..) | Expr::Imp(..) => {
                if !self.visit_inner_implies(symbol, var, e, &[], e, depth)? {
                    self.visit_or(symbol, var, e, depth)?;
                }
                Ok(())
            }
            Expr::And(..) => {
                if !self.visit_inner_and(symbol, var, e, &[], e, depth)? {
                    self.visit_and(symbol, var, e, depth)?;
                }
                Ok(())
            }
            Expr::Not(_) | Expr::Data(_) | Expr::PropVar(_) => Err(Error::structural("bqnf2ppg", e)),
        }
    }

    /// Handles `forall qvars. qexpr`, or `qexpr` itself when `qvars` is empty.
    ///
    /// Returns `false` if there is neither a quantifier nor a guard to split on.
    fn visit_inner_implies(
        &mut self,
        symbol: FixpointSymbol,
        var: &PropVar,
        e: &Expr,
        qvars: &[Variable],
        qexpr: &Expr,
        depth: usize,
    ) -> Result<bool> {
        if qexpr.is_propvar() || qexpr.is_simple() {
            self.push(symbol, var, e.clone());
            return Ok(true);
        }
        let (guard, psi) = implies_guard(qexpr);
        if is_inner_implies(psi) {
            self.push(symbol, var, e.clone());
            return Ok(true);
        }
        if qvars.is_empty() && guard.is_none() {
            return Ok(false);
        }

        let (fresh, instance) = self.fresh_variable(var, qvars);
        let expr = match guard {
            None => instance,
            Some(g) if matches!(qexpr, Expr::Or(..)) => Expr::or(g.clone(), instance),
            Some(g) => Expr::imp(g.clone(), instance),
        };
        self.push(symbol, var, Expr::forall(qvars.to_vec(), expr));
        self.visit_equation(Equation::new(symbol, fresh, psi.clone()), depth + 1)?;
        Ok(true)
    }

    fn visit_inner_and(
        &mut self,
        symbol: FixpointSymbol,
        var: &PropVar,
        e: &Expr,
        qvars: &[Variable],
        qexpr: &Expr,
        depth: usize,
    ) -> Result<bool> {
        if qexpr.is_propvar() || qexpr.is_simple() {
            self.push(symbol, var, e.clone());
            return Ok(true);
        }
        let (guard, psi) = and_guard(qexpr);
        if is_inner_and(psi) {
            self.push(symbol, var, e.clone());
            return Ok(true);
        }
        if qvars.is_empty() && guard.is_none() {
            return Ok(false);
        }

        let (fresh, instance) = self.fresh_variable(var, qvars);
        let expr = match guard {
            None => instance,
            Some(g) => Expr::and(g.clone(), instance),
        };
        self.push(symbol, var, Expr::exists(qvars.to_vec(), expr));
        self.visit_equation(Equation::new(symbol, fresh, psi.clone()), depth + 1)?;
        Ok(true)
    }

    /// Rewrites one conjunct `forall qvars. g => psi` into PPG shape.
    fn rewrite_inner_bounded_forall(
        &mut self,
        symbol: FixpointSymbol,
        var: &PropVar,
        e: &Expr,
    ) -> (Expr, Option<Equation>) {
        let (qvars, qexpr) = collect_forall(e);
        if qexpr.is_propvar() || qexpr.is_simple() {
            return (e.clone(), None);
        }
        let (guard, psi) = implies_guard(qexpr);
        if is_inner_implies(psi) {
            return (e.clone(), None);
        }

        let (fresh, instance) = self.fresh_variable(var, &qvars);
        let expr = match guard {
            None => instance,
            Some(g) if matches!(qexpr, Expr::Or(..)) => Expr::or(g.clone(), instance),
            Some(g) => Expr::imp(g.clone(), instance),
        };
        (
            Expr::forall(qvars, expr),
            Some(Equation::new(symbol, fresh, psi.clone())),
        )
    }

    fn rewrite_inner_bounded_exists(
        &mut self,
        symbol: FixpointSymbol,
        var: &PropVar,
        e: &Expr,
    ) -> (Expr, Option<Equation>) {
        let (qvars, qexpr) = collect_exists(e);
        if qexpr.is_propvar() || qexpr.is_simple() {
            return (e.clone(), None);
        }
        let (guard, psi) = and_guard(qexpr);
        if is_inner_and(psi) {
            return (e.clone(), None);
        }

        let (fresh, instance) = self.fresh_variable(var, &qvars);
        let expr = match guard {
            None => instance,
            Some(g) => Expr::and(g.clone(), instance),
        };
        (
            Expr::exists(qvars, expr),
            Some(Equation::new(symbol, fresh, psi.clone())),
        )
    }

    fn visit_and(&mut self, symbol: FixpointSymbol, var: &PropVar, e: &Expr, depth: usize) -> Result<()> {
        let mut parts = Vec::new();
        let mut new_equations = Vec::new();
        for c in e.conjuncts() {
            let (expr, eqn) = self.rewrite_inner_bounded_forall(symbol, var, c);
            parts.push(expr);
            new_equations.extend(eqn);
        }
        self.push(symbol, var, Expr::join_and(parts));
        for eqn in new_equations {
            self.visit_equation(eqn, depth + 1)?;
        }
        Ok(())
    }

    fn visit_or(&mut self, symbol: FixpointSymbol, var: &PropVar, e: &Expr, depth: usize) -> Result<()> {
        let mut parts = Vec::new();
        let mut new_equations = Vec::new();
        for d in e.disjuncts() {
            let (expr, eqn) = self.rewrite_inner_bounded_exists(symbol, var, d);
            parts.push(expr);
            new_equations.extend(eqn);
        }
        self.push(symbol, var, Expr::join_or(parts));
        for eqn in new_equations {
            self.visit_equation(eqn, depth + 1)?;
        }
        Ok(())
    }
}
