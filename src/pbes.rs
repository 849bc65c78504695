//! Parameterised Boolean Equation Systems.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display, Formatter};

use log::debug;

use crate::data::{DataSpec, DataTerm, Variable};
use crate::error::{Error, Result};
use crate::expr::{Expr, PropVarInst};
use crate::info::{FALSE_NAME, TRUE_NAME};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FixpointSymbol {
    /// Least fixpoint.
    Mu,
    /// Greatest fixpoint.
    Nu,
}

impl Display for FixpointSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FixpointSymbol::Mu => write!(f, "mu"),
            FixpointSymbol::Nu => write!(f, "nu"),
        }
    }
}

/// Declaration `X(d1: D1, ..., dn: Dn)` of a propositional variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropVar {
    pub name: String,
    pub parameters: Vec<Variable>,
}

impl PropVar {
    pub fn new(name: impl Into<String>, parameters: Vec<Variable>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }

    /// The instantiation `X(d1, ..., dn)` passing every parameter unchanged.
    pub fn identity(&self) -> PropVarInst {
        PropVarInst::new(
            self.name.clone(),
            self.parameters.iter().cloned().map(DataTerm::Var).collect(),
        )
    }
}

impl Display for PropVar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.parameters.is_empty() {
            write!(f, "(")?;
            for (i, p) in self.parameters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", p.name, p.sort)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Equation {
    pub symbol: FixpointSymbol,
    pub variable: PropVar,
    pub formula: Expr,
}

impl Equation {
    pub fn new(symbol: FixpointSymbol, variable: PropVar, formula: Expr) -> Self {
        Self {
            symbol,
            variable,
            formula,
        }
    }

    pub fn name(&self) -> &str {
        &self.variable.name
    }
}

impl Display for Equation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {};", self.symbol, self.variable, self.formula)
    }
}

/// An ordered list of equations with an initial instantiation.
///
/// Equation order encodes priority: adjacent equations with the same fixpoint symbol
/// form one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pbes {
    pub data: DataSpec,
    pub equations: Vec<Equation>,
    pub initial: PropVarInst,
}

impl Pbes {
    pub fn new(data: DataSpec, equations: Vec<Equation>, initial: PropVarInst) -> Self {
        Self {
            data,
            equations,
            initial,
        }
    }

    pub fn equation(&self, name: &str) -> Option<&Equation> {
        self.equations.iter().find(|eq| eq.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.equations.iter().map(|eq| eq.name()).collect()
    }

    /// Checks that the PBES is well formed:
    /// equation names are unique, every instantiation refers to a declared variable with
    /// the right arity, right-hand sides only use their own parameters, and the initial
    /// instantiation is closed.
    pub fn validate(&self) -> Result<()> {
        let mut arity: HashMap<&str, usize> = HashMap::new();
        for eq in &self.equations {
            if eq.name() == TRUE_NAME || eq.name() == FALSE_NAME {
                return Err(Error::validation(eq.name(), "reserved name"));
            }
            if arity.insert(eq.name(), eq.variable.parameters.len()).is_some() {
                return Err(Error::validation(eq.name(), "duplicate equation"));
            }
        }

        let check = |owner: &str, x: &PropVarInst| -> Result<()> {
            match arity.get(x.name.as_str()) {
                None => Err(Error::validation(
                    owner,
                    format!("unknown propositional variable {}", x.name),
                )),
                Some(&n) if n != x.args.len() => Err(Error::validation(
                    owner,
                    format!("{} expects {} arguments, got {}", x.name, n, x.args.len()),
                )),
                Some(_) => Ok(()),
            }
        };

        for eq in &self.equations {
            for x in eq.formula.instantiations() {
                check(eq.name(), x)?;
            }
            let params: BTreeSet<&Variable> = eq.variable.parameters.iter().collect();
            if let Some(v) = eq.formula.free_variables().iter().find(|v| !params.contains(v)) {
                return Err(Error::validation(
                    eq.name(),
                    format!("free data variable {}: {}", v.name, v.sort),
                ));
            }
        }

        check("init", &self.initial)?;
        if self.initial.args.iter().any(|a| !a.free_variables().is_empty()) {
            return Err(Error::validation("init", "initial instantiation is not closed"));
        }
        Ok(())
    }
}

impl Display for Pbes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "pbes")?;
        for eq in &self.equations {
            writeln!(f, "  {}", eq)?;
        }
        write!(f, "init {};", self.initial)
    }
}

/// Eliminates implications and pushes negations down to the data leaves.
///
/// Fails if a negation reaches a propositional variable.
pub fn normalize(pbes: &Pbes) -> Result<Pbes> {
    let mut equations = Vec::with_capacity(pbes.equations.len());
    for eq in &pbes.equations {
        let formula = normalize_expr(&eq.formula)?;
        if formula != eq.formula {
            debug!("normalized {}: {}", eq.name(), formula);
        }
        equations.push(Equation::new(eq.symbol, eq.variable.clone(), formula));
    }
    Ok(Pbes::new(pbes.data.clone(), equations, pbes.initial.clone()))
}

pub fn normalize_expr(e: &Expr) -> Result<Expr> {
    push_negation(e, false)
}

fn push_negation(e: &Expr, negated: bool) -> Result<Expr> {
    Ok(match e {
        Expr::Data(t) if negated => Expr::Data(DataTerm::negate(t.clone())),
        Expr::Data(_) => e.clone(),
        Expr::PropVar(_) if negated => return Err(Error::structural("normalize", Expr::not(e.clone()))),
        Expr::PropVar(_) => e.clone(),
        Expr::Not(x) => push_negation(x, !negated)?,
        Expr::And(l, r) if negated => Expr::or(push_negation(l, true)?, push_negation(r, true)?),
        Expr::And(l, r) => Expr::and(push_negation(l, false)?, push_negation(r, false)?),
        Expr::Or(l, r) if negated => Expr::and(push_negation(l, true)?, push_negation(r, true)?),
        Expr::Or(l, r) => Expr::or(push_negation(l, false)?, push_negation(r, false)?),
        Expr::Imp(l, r) if negated => Expr::and(push_negation(l, false)?, push_negation(r, true)?),
        Expr::Imp(l, r) => Expr::or(push_negation(l, true)?, push_negation(r, false)?),
        Expr::Forall(vars, body) if negated => Expr::exists(vars.clone(), push_negation(body, true)?),
        Expr::Forall(vars, body) => Expr::forall(vars.clone(), push_negation(body, false)?),
        Expr::Exists(vars, body) if negated => Expr::forall(vars.clone(), push_negation(body, true)?),
        Expr::Exists(vars, body) => Expr::exists(vars.clone(), push_negation(body, false)?),
    })
}
