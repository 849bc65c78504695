//! Normalisation of an arbitrary (monotone) PBES to PPG shape.
//!
//! The rewriter walks each right-hand side with the same modes as the classifier. A
//! subformula whose connective does not fit the current mode is replaced by an instantiation
//! of a fresh variable, and a new equation with that subformula as its body is rewritten
//! in turn. The extracted subformula is always a strict subterm, so the process terminates.

use std::collections::VecDeque;

use log::{debug, info, trace};

use crate::classify::{is_ppg_equation, Mode};
use crate::data::Variable;
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::names::NameRegistry;
use crate::pbes::{normalize, Equation, Pbes, PropVar};

/// Default recursion guard of the rewriters and analyses.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Maximal nesting depth before a pass gives up with a structural error.
    pub max_depth: usize,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

pub fn to_ppg(pbes: &Pbes) -> Result<Pbes> {
    to_ppg_with(pbes, RewriteOptions::default())
}

pub fn to_ppg_with(pbes: &Pbes, options: RewriteOptions) -> Result<Pbes> {
    info!("to_ppg: {} equations", pbes.equations.len());
    pbes.validate()?;
    let pbes = normalize(pbes)?;

    let mut registry = NameRegistry::from_pbes(&pbes);
    let mut equations = Vec::with_capacity(pbes.equations.len());
    for eq in &pbes.equations {
        let mut pending = VecDeque::from([eq.clone()]);
        while let Some(eq) = pending.pop_front() {
            let mut rewriter = PpgRewriter {
                equation: &eq,
                registry: &mut registry,
                fresh: Vec::new(),
                max_depth: options.max_depth,
            };
            let formula = rewriter.rewrite(&eq.formula, Mode::Undetermined, &[], 0)?;
            let fresh = rewriter.fresh;

            let result = Equation::new(eq.symbol, eq.variable.clone(), formula);
            if !is_ppg_equation(&result) {
                return Err(Error::validation(
                    result.name(),
                    "rewriter output failed PPG re-check",
                ));
            }
            equations.push(result);
            for f in fresh.into_iter().rev() {
                pending.push_front(f);
            }
        }
    }

    info!("to_ppg: {} equations after rewriting", equations.len());
    Ok(Pbes::new(pbes.data.clone(), equations, pbes.initial.clone()))
}

struct PpgRewriter<'a> {
    equation: &'a Equation,
    registry: &'a mut NameRegistry,
    /// Equations introduced while rewriting `equation`, in order of introduction.
    fresh: Vec<Equation>,
    max_depth: usize,
}

impl PpgRewriter<'_> {
    fn rewrite(&mut self, e: &Expr, mode: Mode, scope: &[Variable], depth: usize) -> Result<Expr> {
        if depth > self.max_depth {
            return Err(Error::too_deep("to_ppg", self.max_depth));
        }
        trace!("{:indent$}{:?}: {}", "", mode, e, indent = 2 * depth);

        if e.is_simple() || e.is_propvar() {
            return Ok(e.clone());
        }
        match e {
            Expr::Forall(vars, body) => match mode.enter_forall() {
                Some(m) => {
                    let scope = [scope, vars.as_slice()].concat();
                    let body = self.rewrite(body, m, &scope, depth + 1)?;
                    Ok(Expr::Forall(vars.clone(), Box::new(body)))
                }
                None => Ok(self.extract(e, scope)),
            },
            Expr::Exists(vars, body) => match mode.enter_exists() {
                Some(m) => {
                    let scope = [scope, vars.as_slice()].concat();
                    let body = self.rewrite(body, m, &scope, depth + 1)?;
                    Ok(Expr::Exists(vars.clone(), Box::new(body)))
                }
                None => Ok(self.extract(e, scope)),
            },
            Expr::And(l, r) => match mode.enter_and() {
                Some(m) if m.is_guarded() => self.rewrite_guarded(e, l, r, m, scope, depth, Expr::And),
                Some(m) => {
                    let l = self.rewrite(l, m, scope, depth + 1)?;
                    let r = self.rewrite(r, m, scope, depth + 1)?;
                    Ok(Expr::And(Box::new(l), Box::new(r)))
                }
                None => Ok(self.extract(e, scope)),
            },
            Expr::Or(l, r) => match mode.enter_or() {
                Some(m) if m.is_guarded() => self.rewrite_guarded(e, l, r, m, scope, depth, Expr::Or),
                Some(m) => {
                    let l = self.rewrite(l, m, scope, depth + 1)?;
                    let r = self.rewrite(r, m, scope, depth + 1)?;
                    Ok(Expr::Or(Box::new(l), Box::new(r)))
                }
                None => Ok(self.extract(e, scope)),
            },
            Expr::Imp(..) | Expr::Not(_) | Expr::Data(_) | Expr::PropVar(_) => {
                Err(Error::structural("to_ppg", e))
            }
        }
    }

    /// Rewrites `g op psi` (or `psi op g`) keeping the simple side as guard.
    #[allow(clippy::too_many_arguments)]
    fn rewrite_guarded(
        &mut self,
        e: &Expr,
        l: &Expr,
        r: &Expr,
        mode: Mode,
        scope: &[Variable],
        depth: usize,
        op: fn(Box<Expr>, Box<Expr>) -> Expr,
    ) -> Result<Expr> {
        if l.is_simple() {
            let r = self.rewrite(r, mode, scope, depth + 1)?;
            Ok(op(Box::new(l.clone()), Box::new(r)))
        } else if r.is_simple() {
            let l = self.rewrite(l, mode, scope, depth + 1)?;
            Ok(op(Box::new(l), Box::new(r.clone())))
        } else {
            Ok(self.extract(e, scope))
        }
    }

    /// Moves `e` into a fresh equation and returns its instantiation.
    fn extract(&mut self, e: &Expr, scope: &[Variable]) -> Expr {
        let source = &self.equation.variable;
        let mut parameters: Vec<Variable> = Vec::new();
        for v in source.parameters.iter().chain(scope) {
            // an inner binder shadows an outer one with the same name
            if let Some(pos) = parameters.iter().position(|p| p.name == v.name) {
                parameters.remove(pos);
            }
            parameters.push(v.clone());
        }

        let name = self.registry.fresh(&source.name);
        let fresh = PropVar::new(name, parameters);
        debug!("to_ppg: {} = {}", fresh, e);
        let instance = fresh.identity();
        self.fresh
            .push(Equation::new(self.equation.symbol, fresh, e.clone()));
        Expr::PropVar(instance)
    }
}
