//! One-point rule: elimination of quantified variables that are pinned to a single value.
//!
//! ```text
//! exists d. d == e && phi(d)    ==>  phi(e)
//! forall d. d != e || phi(d)    ==>  phi(e)
//! forall d. d == e => phi(d)    ==>  phi(e)
//! exists b: Bool. b && phi(b)   ==>  phi(true)
//! ```
//!
//! The rewriter works bottom-up. The choice between several defining literals for the same
//! variable is a heuristic, so the result is not a canonical form.

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::data::{DataTerm, Op, Sort, Substitution, Variable};
use crate::expr::Expr;
use crate::pbes::{Equation, Pbes};
use crate::quantifier::{flatten_conjuncts, flatten_disjuncts};

pub fn one_point_rule(pbes: &Pbes) -> Pbes {
    let equations = pbes
        .equations
        .iter()
        .map(|eq| Equation::new(eq.symbol, eq.variable.clone(), one_point_rule_expr(&eq.formula)))
        .collect();
    Pbes::new(pbes.data.clone(), equations, pbes.initial.clone())
}

pub fn one_point_rule_expr(e: &Expr) -> Expr {
    match e {
        Expr::Data(_) | Expr::PropVar(_) => e.clone(),
        Expr::Not(x) => Expr::not(one_point_rule_expr(x)),
        Expr::And(l, r) => Expr::and(one_point_rule_expr(l), one_point_rule_expr(r)),
        Expr::Or(l, r) => Expr::or(one_point_rule_expr(l), one_point_rule_expr(r)),
        Expr::Imp(l, r) => Expr::imp(one_point_rule_expr(l), one_point_rule_expr(r)),
        Expr::Exists(vars, body) => {
            let body = one_point_rule_expr(body);
            let mut vars = vars.clone();
            let mut literals = flatten_conjuncts(&body);
            if eliminate(&mut vars, &mut literals, true).is_empty() {
                return Expr::exists(vars, body);
            }
            let result = Expr::exists(vars, Expr::join_and(literals));
            debug!("one point: {} ==> {}", e, result);
            result
        }
        Expr::Forall(vars, body) => {
            let body = one_point_rule_expr(body);
            let mut vars = vars.clone();
            let result = if let Expr::Imp(guard, psi) = &body {
                let mut literals = flatten_conjuncts(guard);
                let applied = eliminate(&mut vars, &mut literals, true);
                if applied.is_empty() {
                    return Expr::forall(vars, body);
                }
                let psi = applied.iter().fold((**psi).clone(), |p, sigma| p.substitute(sigma));
                Expr::forall(vars, Expr::imp(Expr::join_and(literals), psi))
            } else {
                let mut literals = flatten_disjuncts(&body);
                if eliminate(&mut vars, &mut literals, false).is_empty() {
                    return Expr::forall(vars, body);
                }
                Expr::forall(vars, Expr::join_or(literals))
            };
            debug!("one point: {} ==> {}", e, result);
            result
        }
    }
}

/// Value assigned to a bound variable by `literal`, if the literal defines one.
///
/// With `positive` the literal must hold (conjunct of an existential): `v == e`, `e == v`,
/// `v` and `!v`. Otherwise the literal must fail (disjunct of a universal): `v != e`,
/// `e != v`, `!v` and `v`.
fn binding(literal: &Expr, vars: &[Variable], positive: bool) -> Option<(Variable, DataTerm)> {
    let term = match literal {
        Expr::Data(t) => t,
        _ => return None,
    };
    let bound = |t: &DataTerm| match t {
        DataTerm::Var(v) if vars.contains(v) => Some(v.clone()),
        _ => None,
    };
    let equality = if positive { Op::Eq } else { Op::Neq };
    match term {
        DataTerm::Var(v) if v.sort == Sort::Bool => bound(term).map(|v| (v, DataTerm::Bool(positive))),
        DataTerm::App(Op::Not, args) if args.len() == 1 => match &args[0] {
            DataTerm::Var(v) if v.sort == Sort::Bool => bound(&args[0]).map(|v| (v, DataTerm::Bool(!positive))),
            _ => None,
        },
        DataTerm::App(op, args) if *op == equality && args.len() == 2 => {
            if let Some(v) = bound(&args[0]).filter(|v| !args[1].has_free_variable(v)) {
                Some((v, args[1].clone()))
            } else {
                bound(&args[1])
                    .filter(|v| !args[0].has_free_variable(v))
                    .map(|v| (v, args[0].clone()))
            }
        }
        _ => None,
    }
}

/// Defining literal (by position) and value per bound variable.
///
/// A later literal for the same variable only wins if its value depends on strictly fewer
/// variables.
fn candidates(literals: &[Expr], vars: &[Variable], positive: bool) -> BTreeMap<Variable, (usize, DataTerm)> {
    let mut result: BTreeMap<Variable, (usize, DataTerm)> = BTreeMap::new();
    for (i, literal) in literals.iter().enumerate() {
        if let Some((v, e)) = binding(literal, vars, positive) {
            let better = match result.get(&v) {
                Some((_, old)) => {
                    let (new_fv, old_fv) = (e.free_variables(), old.free_variables());
                    new_fv.len() < old_fv.len() && new_fv.is_subset(&old_fv)
                }
                None => true,
            };
            if better {
                result.insert(v, (i, e));
            }
        }
    }
    result
}

/// Removes defined variables from `vars` one at a time, substituting into the remaining
/// literals. Returns the substitutions in the order they were applied.
fn eliminate(vars: &mut Vec<Variable>, literals: &mut Vec<Expr>, positive: bool) -> Vec<Substitution> {
    let mut applied = Vec::new();
    loop {
        let found = candidates(literals, vars, positive);
        let next = vars
            .iter()
            .find_map(|v| found.get(v).map(|(i, e)| (v.clone(), *i, e.clone())));
        let (v, index, value) = match next {
            Some(next) => next,
            None => break,
        };
        trace!("one point: {} := {}", v, value);
        literals.remove(index);
        let mut sigma = Substitution::new();
        sigma.insert(v.clone(), value);
        for literal in literals.iter_mut() {
            *literal = literal.substitute(&sigma);
        }
        vars.retain(|w| *w != v);
        applied.push(sigma);
    }
    applied
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn d() -> Sort {
        Sort::named("D")
    }

    #[test]
    fn test_exists_equality() {
        // exists d: D. d == e && X(d)  ==>  X(e)
        let dv = Variable::new("d", d());
        let e = DataTerm::var("e", d());
        let x = Expr::exists(
            vec![dv.clone()],
            Expr::and(
                Expr::data(DataTerm::equal(dv.clone().into(), e.clone())),
                Expr::propvar("X", vec![dv.clone().into()]),
            ),
        );
        let r = one_point_rule_expr(&x);
        println!("{} ==> {}", x, r);
        assert_eq!(r, Expr::propvar("X", vec![e]));
    }

    #[test]
    fn test_forall_inequality() {
        // forall d: D. d1 != d || X(d)  ==>  X(d1)
        let dv = Variable::new("d", d());
        let d1 = DataTerm::constant("d1", d());
        let x = Expr::forall(
            vec![dv.clone()],
            Expr::or(
                Expr::data(DataTerm::not_equal(d1.clone(), dv.clone().into())),
                Expr::propvar("X", vec![dv.clone().into()]),
            ),
        );
        assert_eq!(one_point_rule_expr(&x), Expr::propvar("X", vec![d1]));
    }

    #[test]
    fn test_forall_guard() {
        // forall n, m: Nat. (n == 3 && m < n) => Y(n, m)  ==>  forall m: Nat. (m < 3) => Y(3, m)
        let n = Variable::new("n", Sort::Nat);
        let m = Variable::new("m", Sort::Nat);
        let guard = DataTerm::conj(
            DataTerm::equal(n.clone().into(), DataTerm::int(3)),
            DataTerm::less(m.clone().into(), n.clone().into()),
        );
        let x = Expr::forall(
            vec![n.clone(), m.clone()],
            Expr::imp(Expr::data(guard), Expr::propvar("Y", vec![n.into(), m.clone().into()])),
        );
        let r = one_point_rule_expr(&x);
        println!("{} ==> {}", x, r);
        assert_eq!(r.to_string(), "(forall m: Nat. ((m < 3) => Y(3, m)))");
    }

    #[test]
    fn test_boolean_literal() {
        let b = Variable::new("b", Sort::Bool);
        let x = Expr::exists(
            vec![b.clone()],
            Expr::and(Expr::data(b.clone().into()), Expr::propvar("X", vec![b.clone().into()])),
        );
        assert_eq!(one_point_rule_expr(&x), Expr::propvar("X", vec![DataTerm::Bool(true)]));
    }

    #[test]
    fn test_prefers_fewer_variables() {
        // exists d: D. d == f && d == d1 && X(d): the closed value is picked
        let dv = Variable::new("d", d());
        let f = DataTerm::var("f", d());
        let d1 = DataTerm::constant("d1", d());
        let x = Expr::exists(
            vec![dv.clone()],
            Expr::join_and(vec![
                Expr::data(DataTerm::equal(dv.clone().into(), f.clone())),
                Expr::data(DataTerm::equal(dv.clone().into(), d1.clone())),
                Expr::propvar("X", vec![dv.clone().into()]),
            ]),
        );
        let r = one_point_rule_expr(&x);
        println!("{} ==> {}", x, r);
        assert_eq!(r.to_string(), "((d1 == f) && X(d1))");
    }

    #[test]
    fn test_open_value() {
        let dv = Variable::new("d", d());
        let x = Expr::exists(
            vec![dv.clone()],
            Expr::and(
                Expr::data(DataTerm::equal(dv.clone().into(), DataTerm::var("g", d()))),
                Expr::propvar("X", vec![dv.clone().into()]),
            ),
        );
        // the value may mention other free variables
        assert_eq!(one_point_rule_expr(&x), Expr::propvar("X", vec![DataTerm::var("g", d())]));

        let y = Expr::exists(
            vec![dv.clone()],
            Expr::and(
                Expr::data(DataTerm::less(DataTerm::int(0), DataTerm::int(1))),
                Expr::propvar("X", vec![dv.clone().into()]),
            ),
        );
        assert_eq!(one_point_rule_expr(&y), y);
    }
}
