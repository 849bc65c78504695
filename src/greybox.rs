//! Greybox access to a PPG: initial state and successor expressions.
//!
//! The greybox only knows about expressions. Turning them into states and state vectors is
//! up to the [`Explorer`][crate::explorer::Explorer].

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display, Formatter};

use log::trace;

use crate::data::{DataTerm, Substitution, Variable};
use crate::error::{Error, Result};
use crate::eval::DataRewriter;
use crate::expr::{Expr, PropVarInst};
use crate::pbes::{Equation, Pbes};

/// Player owning a node of the parity game.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Owner {
    /// Disjunctive node, label value 0.
    Or,
    /// Conjunctive node, label value 1.
    And,
}

impl Owner {
    /// Owner of a node with right-hand side `e`: conjunctions, universal quantifiers and
    /// `true` belong to AND, everything else to OR.
    pub fn of(e: &Expr) -> Owner {
        match e {
            Expr::And(..) | Expr::Forall(..) => Owner::And,
            _ if e.is_true() => Owner::And,
            _ => Owner::Or,
        }
    }

    /// Value of the `type` state label.
    pub fn label(self) -> usize {
        match self {
            Owner::Or => 0,
            Owner::And => 1,
        }
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Owner::And => write!(f, "AND"),
            Owner::Or => write!(f, "OR"),
        }
    }
}

pub struct PbesGreybox<R> {
    pbes: Pbes,
    index: HashMap<String, usize>,
    rewriter: R,
    max_depth: usize,
}

impl<R> PbesGreybox<R>
where
    R: DataRewriter,
{
    pub fn new(pbes: Pbes, rewriter: R, max_depth: usize) -> Self {
        let index = pbes
            .equations
            .iter()
            .enumerate()
            .map(|(i, eq)| (eq.name().to_string(), i))
            .collect();
        Self {
            pbes,
            index,
            rewriter,
            max_depth,
        }
    }

    pub fn pbes(&self) -> &Pbes {
        &self.pbes
    }

    pub fn rewriter(&self) -> &R {
        &self.rewriter
    }

    pub fn equation(&self, name: &str) -> Result<&Equation> {
        self.index
            .get(name)
            .map(|&i| &self.pbes.equations[i])
            .ok_or_else(|| Error::index("variable", name))
    }

    /// The initial instantiation with its arguments rewritten to values.
    pub fn initial_state(&self) -> PropVarInst {
        let sigma = Substitution::new();
        let init = &self.pbes.initial;
        PropVarInst::new(
            init.name.clone(),
            init.args.iter().map(|a| self.rewriter.rewrite(a, &sigma)).collect(),
        )
    }

    /// Rewrites the data leaves of `e` under `sigma` and simplifies the boolean structure.
    ///
    /// Quantifiers over finite sorts are expanded; other quantifiers are kept.
    pub fn rewrite_and_simplify(&self, e: &Expr, sigma: &Substitution) -> Result<Expr> {
        self.simplify(e, sigma, 0)
    }

    fn simplify(&self, e: &Expr, sigma: &Substitution, depth: usize) -> Result<Expr> {
        if depth > self.max_depth {
            return Err(Error::too_deep("rewrite_and_simplify", self.max_depth));
        }
        let result = match e {
            Expr::Data(t) => Expr::data(self.rewriter.rewrite(t, sigma)),
            Expr::PropVar(x) => Expr::PropVar(PropVarInst::new(
                x.name.clone(),
                x.args.iter().map(|a| self.rewriter.rewrite(a, sigma)).collect(),
            )),
            Expr::Not(x) => Expr::not(self.simplify(x, sigma, depth + 1)?),
            Expr::And(l, r) => {
                let l = self.simplify(l, sigma, depth + 1)?;
                if l.is_false() {
                    return Ok(l);
                }
                Expr::and(l, self.simplify(r, sigma, depth + 1)?)
            }
            Expr::Or(l, r) => {
                let l = self.simplify(l, sigma, depth + 1)?;
                if l.is_true() {
                    return Ok(l);
                }
                Expr::or(l, self.simplify(r, sigma, depth + 1)?)
            }
            Expr::Imp(l, r) => {
                let l = self.simplify(l, sigma, depth + 1)?;
                if l.is_false() {
                    return Ok(Expr::tt());
                }
                Expr::imp(l, self.simplify(r, sigma, depth + 1)?)
            }
            Expr::Forall(vars, body) => self.quantifier(true, vars, body, sigma, depth)?,
            Expr::Exists(vars, body) => self.quantifier(false, vars, body, sigma, depth)?,
        };
        trace!("{:indent$}{} ==> {}", "", e, result, indent = 2 * depth);
        Ok(result)
    }

    fn quantifier(
        &self,
        forall: bool,
        vars: &[Variable],
        body: &Expr,
        sigma: &Substitution,
        depth: usize,
    ) -> Result<Expr> {
        let bindings: Option<Vec<(&Variable, Vec<DataTerm>)>> = vars
            .iter()
            .map(|v| self.rewriter.enumerate(&v.sort).map(|domain| (v, domain)))
            .collect();
        match bindings {
            Some(bindings) => self.expand(forall, &bindings, body, sigma, depth + 1),
            None => {
                let inner: Substitution = sigma
                    .iter()
                    .filter(|(v, _)| !vars.contains(v))
                    .map(|(v, t)| (v.clone(), t.clone()))
                    .collect();
                let body = self.simplify(body, &inner, depth + 1)?;
                Ok(if forall {
                    Expr::forall(vars.to_vec(), body)
                } else {
                    Expr::exists(vars.to_vec(), body)
                })
            }
        }
    }

    /// Instantiates each bound variable with every value of its domain, joining the instances
    /// with `&&` (universal) or `||` (existential).
    fn expand(
        &self,
        forall: bool,
        bindings: &[(&Variable, Vec<DataTerm>)],
        body: &Expr,
        sigma: &Substitution,
        depth: usize,
    ) -> Result<Expr> {
        let ((v, domain), rest) = match bindings.split_first() {
            Some(split) => split,
            None => return self.simplify(body, sigma, depth),
        };
        let mut parts = Vec::with_capacity(domain.len());
        for value in domain {
            let mut inner = sigma.clone();
            inner.insert((*v).clone(), value.clone());
            let part = self.expand(forall, rest, body, &inner, depth)?;
            match part.as_bool() {
                // absorbing element
                Some(b) if b != forall => return Ok(part),
                // neutral element
                Some(_) => {}
                None => parts.push(part),
            }
        }
        Ok(if forall {
            Expr::join_and(parts)
        } else {
            Expr::join_or(parts)
        })
    }

    /// Successors of `state` along its whole right-hand side.
    pub fn get_successors(&self, state: &PropVarInst) -> Result<BTreeSet<Expr>> {
        let formula = &self.equation(&state.name)?.formula;
        self.get_successors_of(state, formula)
    }

    /// Successors of `state` along `formula`, one of the parts of its right-hand side.
    ///
    /// The parameters of the state's equation are replaced by the state's values, the result
    /// is simplified and then split by its top-level connective.
    pub fn get_successors_of(&self, state: &PropVarInst, formula: &Expr) -> Result<BTreeSet<Expr>> {
        let eq = self.equation(&state.name)?;
        let parameters = &eq.variable.parameters;
        if parameters.len() != state.args.len() {
            return Err(Error::structural("get_successors", state));
        }
        let sigma: Substitution = parameters
            .iter()
            .cloned()
            .zip(state.args.iter().cloned())
            .collect();

        let e = self.rewrite_and_simplify(formula, &sigma)?;
        let parts = match &e {
            Expr::And(..) => e.conjuncts(),
            Expr::Or(..) => e.disjuncts(),
            _ => vec![&e],
        };
        Ok(parts.into_iter().cloned().collect())
    }
}
