//! PBES expressions.
//!
//! A boxed tree: each node owns its children. Boolean constants
//! are data leaves (`Data(true)` / `Data(false)`).

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use crate::data::{DataTerm, Substitution, Variable};

/// Instantiation `X(e1, ..., en)` of a propositional variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropVarInst {
    pub name: String,
    pub args: Vec<DataTerm>,
}

impl PropVarInst {
    pub fn new(name: impl Into<String>, args: Vec<DataTerm>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn substitute(&self, sigma: &Substitution) -> Self {
        Self {
            name: self.name.clone(),
            args: self.args.iter().map(|a| a.substitute(sigma)).collect(),
        }
    }
}

impl Display for PropVarInst {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, a) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", a)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    Data(DataTerm),
    PropVar(PropVarInst),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Imp(Box<Expr>, Box<Expr>),
    Forall(Vec<Variable>, Box<Expr>),
    Exists(Vec<Variable>, Box<Expr>),
}

impl Expr {
    pub fn data(term: DataTerm) -> Self {
        Expr::Data(term)
    }

    pub fn tt() -> Self {
        Expr::Data(DataTerm::Bool(true))
    }

    pub fn ff() -> Self {
        Expr::Data(DataTerm::Bool(false))
    }

    pub fn constant(value: bool) -> Self {
        Expr::Data(DataTerm::Bool(value))
    }

    pub fn propvar(name: impl Into<String>, args: Vec<DataTerm>) -> Self {
        Expr::PropVar(PropVarInst::new(name, args))
    }

    pub fn not(value: Self) -> Self {
        match value {
            Expr::Data(t) => Expr::Data(DataTerm::negate(t)),
            Expr::Not(inner) => *inner,
            _ => Expr::Not(Box::new(value)),
        }
    }

    pub fn and(lhs: Self, rhs: Self) -> Self {
        match (lhs.as_bool(), rhs.as_bool()) {
            (Some(false), _) | (_, Some(false)) => Expr::ff(),
            (Some(true), _) => rhs,
            (_, Some(true)) => lhs,
            _ => Expr::And(Box::new(lhs), Box::new(rhs)),
        }
    }

    pub fn or(lhs: Self, rhs: Self) -> Self {
        match (lhs.as_bool(), rhs.as_bool()) {
            (Some(true), _) | (_, Some(true)) => Expr::tt(),
            (Some(false), _) => rhs,
            (_, Some(false)) => lhs,
            _ => Expr::Or(Box::new(lhs), Box::new(rhs)),
        }
    }

    pub fn imp(lhs: Self, rhs: Self) -> Self {
        match (lhs.as_bool(), rhs.as_bool()) {
            (Some(false), _) | (_, Some(true)) => Expr::tt(),
            (Some(true), _) => rhs,
            _ => Expr::Imp(Box::new(lhs), Box::new(rhs)),
        }
    }

    /// `forall vars. body`; an empty variable list or a constant body yields the body itself.
    pub fn forall(vars: Vec<Variable>, body: Self) -> Self {
        if vars.is_empty() || body.as_bool().is_some() {
            body
        } else {
            Expr::Forall(vars, Box::new(body))
        }
    }

    pub fn exists(vars: Vec<Variable>, body: Self) -> Self {
        if vars.is_empty() || body.as_bool().is_some() {
            body
        } else {
            Expr::Exists(vars, Box::new(body))
        }
    }

    /// Right-nested conjunction of `parts`; `true` when empty.
    pub fn join_and(parts: impl IntoIterator<Item = Expr>) -> Self {
        let mut parts: Vec<Expr> = parts.into_iter().collect();
        let mut result = match parts.pop() {
            Some(last) => last,
            None => return Expr::tt(),
        };
        while let Some(part) = parts.pop() {
            result = Expr::and(part, result);
        }
        result
    }

    /// Right-nested disjunction of `parts`; `false` when empty.
    pub fn join_or(parts: impl IntoIterator<Item = Expr>) -> Self {
        let mut parts: Vec<Expr> = parts.into_iter().collect();
        let mut result = match parts.pop() {
            Some(last) => last,
            None => return Expr::ff(),
        };
        while let Some(part) = parts.pop() {
            result = Expr::or(part, result);
        }
        result
    }
}

impl Expr {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Expr::Data(t) => t.as_bool(),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        self.as_bool() == Some(true)
    }

    pub fn is_false(&self) -> bool {
        self.as_bool() == Some(false)
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Expr::Data(_))
    }

    pub fn is_propvar(&self) -> bool {
        matches!(self, Expr::PropVar(_))
    }

    pub fn as_propvar(&self) -> Option<&PropVarInst> {
        match self {
            Expr::PropVar(x) => Some(x),
            _ => None,
        }
    }

    /// Checks if no propositional variable occurs in the expression.
    pub fn is_simple(&self) -> bool {
        match self {
            Expr::Data(_) => true,
            Expr::PropVar(_) => false,
            Expr::Not(x) => x.is_simple(),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => l.is_simple() && r.is_simple(),
            Expr::Forall(_, body) | Expr::Exists(_, body) => body.is_simple(),
        }
    }

    /// Top-level conjuncts, flattening nested `And` nodes.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(e) = stack.pop() {
            match e {
                Expr::And(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                _ => result.push(e),
            }
        }
        result
    }

    /// Top-level disjuncts, flattening nested `Or` nodes.
    pub fn disjuncts(&self) -> Vec<&Expr> {
        let mut result = Vec::new();
        let mut stack = vec![self];
        while let Some(e) = stack.pop() {
            match e {
                Expr::Or(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                _ => result.push(e),
            }
        }
        result
    }

    /// Free data variables.
    pub fn free_variables(&self) -> BTreeSet<Variable> {
        let mut result = BTreeSet::new();
        self.collect_free_variables(&mut Vec::new(), &mut result);
        result
    }

    fn collect_free_variables(&self, bound: &mut Vec<Variable>, result: &mut BTreeSet<Variable>) {
        match self {
            Expr::Data(t) => {
                for v in t.free_variables() {
                    if !bound.contains(&v) {
                        result.insert(v);
                    }
                }
            }
            Expr::PropVar(x) => {
                for a in &x.args {
                    for v in a.free_variables() {
                        if !bound.contains(&v) {
                            result.insert(v);
                        }
                    }
                }
            }
            Expr::Not(x) => x.collect_free_variables(bound, result),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => {
                l.collect_free_variables(bound, result);
                r.collect_free_variables(bound, result);
            }
            Expr::Forall(vars, body) | Expr::Exists(vars, body) => {
                let n = bound.len();
                bound.extend(vars.iter().cloned());
                body.collect_free_variables(bound, result);
                bound.truncate(n);
            }
        }
    }

    /// All instantiations occurring in the expression, left to right.
    pub fn instantiations(&self) -> Vec<&PropVarInst> {
        let mut result = Vec::new();
        self.collect_instantiations(&mut result);
        result
    }

    fn collect_instantiations<'a>(&'a self, result: &mut Vec<&'a PropVarInst>) {
        match self {
            Expr::Data(_) => {}
            Expr::PropVar(x) => result.push(x),
            Expr::Not(x) => x.collect_instantiations(result),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => {
                l.collect_instantiations(result);
                r.collect_instantiations(result);
            }
            Expr::Forall(_, body) | Expr::Exists(_, body) => body.collect_instantiations(result),
        }
    }

    /// Names of the propositional variables occurring in the expression.
    pub fn occurring_names(&self) -> BTreeSet<String> {
        self.instantiations().into_iter().map(|x| x.name.clone()).collect()
    }

    /// Capture-avoiding substitution of data variables.
    ///
    /// Bound variables that would capture a variable of the substituted terms are renamed
    /// by appending primes.
    pub fn substitute(&self, sigma: &Substitution) -> Expr {
        if sigma.is_empty() {
            return self.clone();
        }
        match self {
            Expr::Data(t) => Expr::Data(t.substitute(sigma)),
            Expr::PropVar(x) => Expr::PropVar(x.substitute(sigma)),
            Expr::Not(x) => Expr::Not(Box::new(x.substitute(sigma))),
            Expr::And(l, r) => Expr::And(Box::new(l.substitute(sigma)), Box::new(r.substitute(sigma))),
            Expr::Or(l, r) => Expr::Or(Box::new(l.substitute(sigma)), Box::new(r.substitute(sigma))),
            Expr::Imp(l, r) => Expr::Imp(Box::new(l.substitute(sigma)), Box::new(r.substitute(sigma))),
            Expr::Forall(vars, body) => {
                let (vars, body) = substitute_binder(vars, body, sigma);
                Expr::Forall(vars, Box::new(body))
            }
            Expr::Exists(vars, body) => {
                let (vars, body) = substitute_binder(vars, body, sigma);
                Expr::Exists(vars, Box::new(body))
            }
        }
    }

    /// Number of nodes, counting data leaves as one.
    pub fn size(&self) -> usize {
        match self {
            Expr::Data(_) | Expr::PropVar(_) => 1,
            Expr::Not(x) => 1 + x.size(),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => 1 + l.size() + r.size(),
            Expr::Forall(_, body) | Expr::Exists(_, body) => 1 + body.size(),
        }
    }
}

fn substitute_binder(vars: &[Variable], body: &Expr, sigma: &Substitution) -> (Vec<Variable>, Expr) {
    let mut inner: Substitution = sigma
        .iter()
        .filter(|(v, _)| !vars.contains(v))
        .map(|(v, t)| (v.clone(), t.clone()))
        .collect();
    if inner.is_empty() {
        return (vars.to_vec(), body.clone());
    }

    let mut range_variables = BTreeSet::new();
    for t in inner.values() {
        t.collect_free_variables(&mut range_variables);
    }
    let mut avoid: BTreeSet<String> = range_variables.iter().map(|v| v.name.clone()).collect();
    avoid.extend(body.free_variables().into_iter().map(|v| v.name));
    avoid.extend(vars.iter().map(|v| v.name.clone()));

    let mut new_vars = Vec::with_capacity(vars.len());
    for v in vars {
        if range_variables.iter().any(|w| w.name == v.name) {
            let mut name = format!("{}'", v.name);
            while avoid.contains(&name) {
                name.push('\'');
            }
            avoid.insert(name.clone());
            let fresh = Variable::new(name, v.sort.clone());
            inner.insert(v.clone(), DataTerm::Var(fresh.clone()));
            new_vars.push(fresh);
        } else {
            new_vars.push(v.clone());
        }
    }
    (new_vars, body.substitute(&inner))
}

impl From<DataTerm> for Expr {
    fn from(value: DataTerm) -> Self {
        Expr::Data(value)
    }
}

impl From<PropVarInst> for Expr {
    fn from(value: PropVarInst) -> Self {
        Expr::PropVar(value)
    }
}

fn write_variables(f: &mut Formatter<'_>, vars: &[Variable]) -> fmt::Result {
    for (i, v) in vars.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", v.name, v.sort)?;
    }
    Ok(())
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Data(t) => write!(f, "{}", t),
            Expr::PropVar(x) => write!(f, "{}", x),
            Expr::Not(x) => write!(f, "!{}", x),
            Expr::And(l, r) => write!(f, "({} && {})", l, r),
            Expr::Or(l, r) => write!(f, "({} || {})", l, r),
            Expr::Imp(l, r) => write!(f, "({} => {})", l, r),
            Expr::Forall(vars, body) => {
                write!(f, "(forall ")?;
                write_variables(f, vars)?;
                write!(f, ". {})", body)
            }
            Expr::Exists(vars, body) => {
                write!(f, "(exists ")?;
                write_variables(f, vars)?;
                write!(f, ". {})", body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Sort;

    fn d() -> Sort {
        Sort::named("D")
    }

    #[test]
    fn test_smart_constructors() {
        let x = Expr::propvar("X", vec![]);
        assert_eq!(Expr::and(Expr::tt(), x.clone()), x);
        assert!(Expr::and(x.clone(), Expr::ff()).is_false());
        assert!(Expr::or(Expr::tt(), x.clone()).is_true());
        assert_eq!(Expr::forall(vec![], x.clone()), x);
        assert_eq!(Expr::not(Expr::not(x.clone())), x);
    }

    #[test]
    fn test_simple() {
        let b = Expr::data(DataTerm::var("b", Sort::Bool));
        let x = Expr::propvar("X", vec![]);
        assert!(b.is_simple());
        assert!(Expr::and(b.clone(), b.clone()).is_simple());
        assert!(!Expr::or(b.clone(), x.clone()).is_simple());
        assert!(!Expr::exists(vec![Variable::new("d", d())], x).is_simple());
    }

    #[test]
    fn test_split_and_join() {
        let a = Expr::propvar("A", vec![]);
        let b = Expr::propvar("B", vec![]);
        let c = Expr::propvar("C", vec![]);
        let e = Expr::and(Expr::and(a.clone(), b.clone()), c.clone());
        let parts: Vec<Expr> = e.conjuncts().into_iter().cloned().collect();
        assert_eq!(parts, vec![a.clone(), b.clone(), c.clone()]);
        let joined = Expr::join_or(parts);
        println!("joined = {}", joined);
        assert_eq!(joined.disjuncts().len(), 3);
        assert!(Expr::join_and(vec![]).is_true());
    }

    #[test]
    fn test_free_variables() {
        let x = Variable::new("x", d());
        let y = Variable::new("y", d());
        let e = Expr::exists(
            vec![x.clone()],
            Expr::and(
                Expr::data(DataTerm::equal(x.clone().into(), y.clone().into())),
                Expr::propvar("X", vec![x.clone().into()]),
            ),
        );
        let fv = e.free_variables();
        assert_eq!(fv.into_iter().collect::<Vec<_>>(), vec![y]);
        assert_eq!(e.occurring_names().len(), 1);
    }

    #[test]
    fn test_capture_avoiding_substitution() {
        let x = Variable::new("x", d());
        let y = Variable::new("y", d());
        // exists x. X(x, y)  [y := x]  ==>  exists x'. X(x', x)
        let e = Expr::exists(
            vec![x.clone()],
            Expr::propvar("X", vec![x.clone().into(), y.clone().into()]),
        );
        let mut sigma = Substitution::new();
        sigma.insert(y, DataTerm::Var(x.clone()));
        let r = e.substitute(&sigma);
        assert_eq!(r.to_string(), "(exists x': D. X(x', x))");
        assert_eq!(r.free_variables().into_iter().collect::<Vec<_>>(), vec![x]);
    }

    #[test]
    fn test_substitution_respects_binding() {
        let x = Variable::new("x", d());
        let e = Expr::forall(vec![x.clone()], Expr::propvar("X", vec![x.clone().into()]));
        let mut sigma = Substitution::new();
        sigma.insert(x, DataTerm::constant("d1", d()));
        assert_eq!(e.substitute(&sigma), e);
    }
}
