//! Distribution of universal quantifiers over conjunctions.
//!
//! `forall v. g => (psi_1 && ... && psi_n)` becomes
//! `(forall v_1. g_1 => psi_1) && ... && (forall v_n. g_n => psi_n)`, where `v_i` are the
//! variables of `v` that `psi_i` depends on (directly, or through the guard) and `g_i` is the
//! guard filtered down to `v_i`.

use std::collections::BTreeSet;

use log::debug;

use crate::data::{DataTerm, Op, Variable};
use crate::expr::Expr;
use crate::pbes::{Equation, Pbes};

pub fn distribute(pbes: &Pbes) -> Pbes {
    let equations = pbes
        .equations
        .iter()
        .map(|eq| Equation::new(eq.symbol, eq.variable.clone(), distribute_expr(&eq.formula)))
        .collect();
    Pbes::new(pbes.data.clone(), equations, pbes.initial.clone())
}

pub fn distribute_expr(e: &Expr) -> Expr {
    match e {
        Expr::Data(_) | Expr::PropVar(_) => e.clone(),
        Expr::Not(x) => Expr::Not(Box::new(distribute_expr(x))),
        Expr::And(l, r) => Expr::And(Box::new(distribute_expr(l)), Box::new(distribute_expr(r))),
        Expr::Or(l, r) => Expr::Or(Box::new(distribute_expr(l)), Box::new(distribute_expr(r))),
        Expr::Imp(l, r) => Expr::Imp(Box::new(distribute_expr(l)), Box::new(distribute_expr(r))),
        Expr::Exists(vars, body) => Expr::Exists(vars.clone(), Box::new(distribute_expr(body))),
        Expr::Forall(vars, body) => {
            let mut vars = vars.clone();
            let mut body = distribute_expr(body);
            while let Expr::Forall(inner, inner_body) = body {
                vars.extend(inner);
                body = *inner_body;
            }
            distribute_forall(vars, body)
        }
    }
}

fn distribute_forall(vars: Vec<Variable>, body: Expr) -> Expr {
    let result = match &body {
        Expr::Imp(g, psi) if g.is_simple() => {
            let guards = flatten_conjuncts(g);
            distribute_guarded(&vars, psi, &guards, |keep, p| {
                Expr::imp(filter(g, keep, &vars), p.clone())
            })
        }
        Expr::Or(g, psi) if g.is_simple() => {
            let guards = flatten_disjuncts(g);
            distribute_guarded(&vars, psi, &guards, |keep, p| {
                Expr::or(filter_disjuncts(g, keep, &vars), p.clone())
            })
        }
        Expr::And(..) => {
            let parts = body.conjuncts().into_iter().map(|p| {
                let fv = p.free_variables();
                let keep: Vec<Variable> = vars.iter().filter(|v| fv.contains(v)).cloned().collect();
                Expr::forall(keep, p.clone())
            });
            Some(Expr::join_and(parts))
        }
        _ => None,
    };
    match result {
        Some(e) => {
            debug!("distribute: {} ==> {}", Expr::Forall(vars, Box::new(body)), e);
            e
        }
        None => Expr::forall(vars, body),
    }
}

/// Splits a guarded body `g op (psi_1 && ... && psi_n)`; `None` if nothing changes.
fn distribute_guarded<F>(vars: &[Variable], psi: &Expr, guards: &[Expr], make: F) -> Option<Expr>
where
    F: Fn(&[Variable], &Expr) -> Expr,
{
    let parts = psi.conjuncts();
    let mut result = Vec::with_capacity(parts.len());
    for p in &parts {
        let keep = relevant_variables(p, guards, vars);
        if parts.len() == 1 && keep.len() == vars.len() {
            return None;
        }
        result.push(Expr::forall(keep.clone(), make(&keep, p)));
    }
    Some(Expr::join_and(result))
}

/// Variables of `all` that `body` depends on, closed under sharing a guard part.
fn relevant_variables(body: &Expr, guards: &[Expr], all: &[Variable]) -> Vec<Variable> {
    let all_set: BTreeSet<&Variable> = all.iter().collect();
    let mut keep: BTreeSet<Variable> = body
        .free_variables()
        .into_iter()
        .filter(|v| all_set.contains(v))
        .collect();
    let guard_vars: Vec<BTreeSet<Variable>> = guards
        .iter()
        .map(|g| {
            g.free_variables()
                .into_iter()
                .filter(|v| all_set.contains(v))
                .collect()
        })
        .collect();
    loop {
        let mut changed = false;
        for fv in &guard_vars {
            if !fv.is_disjoint(&keep) && !fv.is_subset(&keep) {
                keep.extend(fv.iter().cloned());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    all.iter().filter(|v| keep.contains(v)).cloned().collect()
}

fn flatten_data(t: &DataTerm, op: Op, result: &mut Vec<Expr>) {
    match t {
        DataTerm::App(o, args) if *o == op && args.len() == 2 => {
            flatten_data(&args[0], op, result);
            flatten_data(&args[1], op, result);
        }
        _ => result.push(Expr::Data(t.clone())),
    }
}

/// Conjuncts of `e`, looking through data-level conjunctions.
pub(crate) fn flatten_conjuncts(e: &Expr) -> Vec<Expr> {
    let mut result = Vec::new();
    for c in e.conjuncts() {
        match c {
            Expr::Data(t) => flatten_data(t, Op::And, &mut result),
            _ => result.push(c.clone()),
        }
    }
    result
}

pub(crate) fn flatten_disjuncts(e: &Expr) -> Vec<Expr> {
    let mut result = Vec::new();
    for c in e.disjuncts() {
        match c {
            Expr::Data(t) => flatten_data(t, Op::Or, &mut result),
            _ => result.push(c.clone()),
        }
    }
    result
}

fn partition(parts: Vec<Expr>, dropped: &[Variable]) -> (Vec<Expr>, Vec<Expr>) {
    parts.into_iter().partition(|c| {
        let fv = c.free_variables();
        !dropped.iter().any(|v| fv.contains(v))
    })
}

/// Restricts the guard `guard` of `forall all. guard => psi` to the variables `keep`.
///
/// Guard conjuncts that mention only dropped variables are existentially quantified over
/// those variables, so `forall keep. filter(guard, keep, all) => psi` is equivalent to the
/// original when `psi` does not depend on the dropped variables.
pub fn filter(guard: &Expr, keep: &[Variable], all: &[Variable]) -> Expr {
    let dropped: Vec<Variable> = all.iter().filter(|v| !keep.contains(v)).cloned().collect();
    if dropped.is_empty() {
        return guard.clone();
    }
    let (mut relevant, irrelevant) = partition(flatten_conjuncts(guard), &dropped);
    if !irrelevant.is_empty() {
        let rest = Expr::join_and(irrelevant);
        let fv = rest.free_variables();
        let vars = dropped.into_iter().filter(|v| fv.contains(v)).collect();
        relevant.push(Expr::exists(vars, rest));
    }
    Expr::join_and(relevant)
}

/// Dual of [`filter`] for guards of the shape `g || psi`.
fn filter_disjuncts(guard: &Expr, keep: &[Variable], all: &[Variable]) -> Expr {
    let dropped: Vec<Variable> = all.iter().filter(|v| !keep.contains(v)).cloned().collect();
    if dropped.is_empty() {
        return guard.clone();
    }
    let (mut relevant, irrelevant) = partition(flatten_disjuncts(guard), &dropped);
    if !irrelevant.is_empty() {
        let rest = Expr::join_or(irrelevant);
        let fv = rest.free_variables();
        let vars = dropped.into_iter().filter(|v| fv.contains(v)).collect();
        relevant.push(Expr::forall(vars, rest));
    }
    Expr::join_or(relevant)
}
