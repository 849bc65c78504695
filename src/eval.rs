//! Data rewriting: the interface used by the greybox, and a reference innermost evaluator.

use log::trace;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::data::{DataSpec, DataTerm, Op, Sort, Substitution};
use crate::error::{Error, Result};

/// Evaluates data terms under a substitution.
///
/// Implementations must return a normal form: closed terms over the supported operators
/// evaluate to values, anything else is returned simplified as far as possible.
pub trait DataRewriter {
    fn rewrite(&self, term: &DataTerm, sigma: &Substitution) -> DataTerm;

    /// All values of a finite sort, `None` for infinite sorts.
    fn enumerate(&self, sort: &Sort) -> Option<Vec<DataTerm>>;

    /// Some value of the sort, used to fill unused state-vector slots.
    fn representative(&self, sort: &Sort) -> Result<DataTerm>;
}

/// Innermost evaluator over booleans, integers, lists and finite structured sorts.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    data: DataSpec,
}

impl Evaluator {
    pub fn new(data: DataSpec) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &DataSpec {
        &self.data
    }

    /// Evaluates a closed term.
    pub fn eval(&self, term: &DataTerm) -> DataTerm {
        self.rewrite(term, &Substitution::new())
    }

    fn apply(&self, op: Op, mut args: Vec<DataTerm>) -> DataTerm {
        if op == Op::Not && args.len() == 1 {
            return DataTerm::negate(args.remove(0));
        }
        let result = match (op, args.as_slice()) {
            (Op::And, [a, b]) => match (a.as_bool(), b.as_bool()) {
                (Some(false), _) | (_, Some(false)) => Some(DataTerm::Bool(false)),
                (Some(true), _) => Some(b.clone()),
                (_, Some(true)) => Some(a.clone()),
                _ if a == b => Some(a.clone()),
                _ => None,
            },
            (Op::Or, [a, b]) => match (a.as_bool(), b.as_bool()) {
                (Some(true), _) | (_, Some(true)) => Some(DataTerm::Bool(true)),
                (Some(false), _) => Some(b.clone()),
                (_, Some(false)) => Some(a.clone()),
                _ if a == b => Some(a.clone()),
                _ => None,
            },
            (Op::Imp, [a, b]) => match (a.as_bool(), b.as_bool()) {
                (Some(false), _) | (_, Some(true)) => Some(DataTerm::Bool(true)),
                (Some(true), _) => Some(b.clone()),
                (_, Some(false)) => Some(DataTerm::negate(a.clone())),
                _ => None,
            },

            (Op::Eq, [a, b]) => equality(a, b),
            (Op::Neq, [a, b]) => equality(a, b).map(DataTerm::negate),

            (Op::Lt, [DataTerm::Int(a), DataTerm::Int(b)]) => Some(DataTerm::Bool(a < b)),
            (Op::Le, [DataTerm::Int(a), DataTerm::Int(b)]) => Some(DataTerm::Bool(a <= b)),
            (Op::Gt, [DataTerm::Int(a), DataTerm::Int(b)]) => Some(DataTerm::Bool(a > b)),
            (Op::Ge, [DataTerm::Int(a), DataTerm::Int(b)]) => Some(DataTerm::Bool(a >= b)),

            (Op::Add, [DataTerm::Int(a), DataTerm::Int(b)]) => Some(DataTerm::Int(a + b)),
            (Op::Sub, [DataTerm::Int(a), DataTerm::Int(b)]) => Some(DataTerm::Int(a - b)),
            (Op::Mul, [DataTerm::Int(a), DataTerm::Int(b)]) => Some(DataTerm::Int(a * b)),
            (Op::Div, [DataTerm::Int(a), DataTerm::Int(b)]) if !b.is_zero() => {
                Some(DataTerm::Int(floor_div(a, b)))
            }
            (Op::Mod, [DataTerm::Int(a), DataTerm::Int(b)]) if !b.is_zero() => {
                Some(DataTerm::Int(a - floor_div(a, b) * b))
            }
            (Op::Min, [DataTerm::Int(a), DataTerm::Int(b)]) => Some(DataTerm::Int(a.min(b).clone())),
            (Op::Max, [DataTerm::Int(a), DataTerm::Int(b)]) => Some(DataTerm::Int(a.max(b).clone())),

            (Op::Len, [DataTerm::List { elements, .. }]) => {
                Some(DataTerm::Int(BigInt::from(elements.len())))
            }
            (Op::Cons, [d, DataTerm::List { sort, elements }]) => {
                let mut elements = elements.clone();
                elements.insert(0, d.clone());
                Some(DataTerm::list(sort.clone(), elements))
            }
            (Op::Snoc, [DataTerm::List { sort, elements }, d]) => {
                let mut elements = elements.clone();
                elements.push(d.clone());
                Some(DataTerm::list(sort.clone(), elements))
            }
            (Op::Concat, [DataTerm::List { sort, elements: xs }, DataTerm::List { elements: ys, .. }]) => {
                let mut elements = xs.clone();
                elements.extend(ys.iter().cloned());
                Some(DataTerm::list(sort.clone(), elements))
            }
            (Op::Head, [DataTerm::List { elements, .. }]) => elements.first().cloned(),
            (Op::Tail, [DataTerm::List { sort, elements }]) if !elements.is_empty() => {
                Some(DataTerm::list(sort.clone(), elements[1..].to_vec()))
            }

            (Op::If, [c, a, b]) => match c.as_bool() {
                Some(true) => Some(a.clone()),
                Some(false) => Some(b.clone()),
                None if a == b => Some(a.clone()),
                None => None,
            },

            _ => None,
        };
        result.unwrap_or_else(|| DataTerm::App(op, args))
    }
}

/// Decides `a == b` when possible: values compare structurally, identical terms are equal.
fn equality(a: &DataTerm, b: &DataTerm) -> Option<DataTerm> {
    if a.is_value() && b.is_value() {
        Some(DataTerm::Bool(a == b))
    } else if a == b {
        Some(DataTerm::Bool(true))
    } else {
        None
    }
}

fn floor_div(a: &BigInt, b: &BigInt) -> BigInt {
    let q = a / b;
    let r = a - &q * b;
    if !r.is_zero() && (r.is_negative() != b.is_negative()) {
        q - 1
    } else {
        q
    }
}

impl DataRewriter for Evaluator {
    fn rewrite(&self, term: &DataTerm, sigma: &Substitution) -> DataTerm {
        let result = match term {
            DataTerm::Var(v) => match sigma.get(v) {
                Some(value) if value.is_value() => value.clone(),
                Some(value) => self.rewrite(value, &Substitution::new()),
                None => term.clone(),
            },
            DataTerm::Bool(_) | DataTerm::Int(_) | DataTerm::Constant { .. } => term.clone(),
            DataTerm::List { sort, elements } => DataTerm::list(
                sort.clone(),
                elements.iter().map(|e| self.rewrite(e, sigma)).collect(),
            ),
            DataTerm::App(op, args) => {
                let args = args.iter().map(|a| self.rewrite(a, sigma)).collect();
                self.apply(*op, args)
            }
        };
        trace!("rewrite({}) = {}", term, result);
        result
    }

    fn enumerate(&self, sort: &Sort) -> Option<Vec<DataTerm>> {
        self.data.enumerate(sort)
    }

    fn representative(&self, sort: &Sort) -> Result<DataTerm> {
        self.data
            .representative(sort)
            .ok_or_else(|| Error::index("sort", sort))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Variable;
    use test_log::test;

    fn d() -> Sort {
        Sort::named("D")
    }

    fn evaluator() -> Evaluator {
        Evaluator::new(DataSpec::new().with_struct("D", ["d1", "d2"]))
    }

    #[test]
    fn test_arithmetic() {
        let ev = evaluator();
        let e = DataTerm::plus(DataTerm::int(2), DataTerm::int(3));
        assert_eq!(ev.eval(&e), DataTerm::int(5));
        let e = DataTerm::modulo(DataTerm::int(-7), DataTerm::int(3));
        assert_eq!(ev.eval(&e), DataTerm::int(2));
        let e = DataTerm::app(Op::Div, vec![DataTerm::int(1), DataTerm::int(0)]);
        assert_eq!(ev.eval(&e), e);
    }

    #[test]
    fn test_lists() {
        let ev = evaluator();
        let q = Variable::new("q", Sort::list(d()));
        let d1 = DataTerm::constant("d1", d());
        let mut sigma = Substitution::new();
        sigma.insert(q.clone(), DataTerm::empty_list(d()));

        let e = DataTerm::snoc(q.clone().into(), d1.clone());
        let r = ev.rewrite(&e, &sigma);
        assert_eq!(r, DataTerm::list(d(), vec![d1.clone()]));
        println!("{} = {}", e, r);

        let e = DataTerm::less(DataTerm::length(q.clone().into()), DataTerm::int(2));
        assert!(ev.rewrite(&e, &sigma).is_true());

        let e = DataTerm::head(q.clone().into());
        assert_eq!(ev.rewrite(&e, &sigma), DataTerm::head(DataTerm::empty_list(d())));

        sigma.insert(q.clone(), DataTerm::list(d(), vec![d1.clone()]));
        let e = DataTerm::tail(q.into());
        assert_eq!(ev.rewrite(&e, &sigma), DataTerm::empty_list(d()));
    }

    #[test]
    fn test_equality() {
        let ev = evaluator();
        let d1 = DataTerm::constant("d1", d());
        let d2 = DataTerm::constant("d2", d());
        assert!(ev.eval(&DataTerm::equal(d1.clone(), d1.clone())).is_true());
        assert!(ev.eval(&DataTerm::not_equal(d1.clone(), d2.clone())).is_true());
        let x = DataTerm::var("x", d());
        let e = DataTerm::equal(x.clone(), d1.clone());
        assert_eq!(ev.eval(&e), e);
        assert!(ev.eval(&DataTerm::equal(x.clone(), x)).is_true());
    }

    #[test]
    fn test_boolean_simplification() {
        let ev = evaluator();
        let b = DataTerm::var("b", Sort::Bool);
        assert_eq!(ev.eval(&DataTerm::conj(DataTerm::Bool(true), b.clone())), b);
        assert!(ev.eval(&DataTerm::disj(b.clone(), DataTerm::Bool(true))).is_true());
        assert_eq!(
            ev.eval(&DataTerm::implies(b.clone(), DataTerm::Bool(false))),
            DataTerm::negate(b)
        );
    }

    #[test]
    fn test_representative() {
        let ev = evaluator();
        assert_eq!(ev.representative(&d()).unwrap(), DataTerm::constant("d1", d()));
        assert!(ev.representative(&Sort::named("E")).is_err());
        assert_eq!(ev.enumerate(&Sort::Bool).map(|v| v.len()), Some(2));
    }
}
