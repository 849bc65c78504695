//! Data terms: the leaves of PBES expressions.
//!
//! The PBES algorithms treat data terms as opaque. They only ask for free variables,
//! substitution, and whether a term is a variable or a boolean constant. Evaluation is
//! delegated to an injected [`DataRewriter`][crate::eval::DataRewriter].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use num_bigint::BigInt;

/// Sort (type) of a data term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sort {
    Bool,
    Pos,
    Nat,
    Int,
    List(Box<Sort>),
    /// A sort declared in the [`DataSpec`], e.g. `sort D = struct d1 | d2`.
    Named(String),
}

impl Sort {
    pub fn list(element: Sort) -> Self {
        Sort::List(Box::new(element))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Sort::Named(name.into())
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Pos => write!(f, "Pos"),
            Sort::Nat => write!(f, "Nat"),
            Sort::Int => write!(f, "Int"),
            Sort::List(element) => write!(f, "List({})", element),
            Sort::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A typed data variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    pub name: String,
    pub sort: Sort,
}

impl Variable {
    pub fn new(name: impl Into<String>, sort: Sort) -> Self {
        Self {
            name: name.into(),
            sort,
        }
    }

    /// The `name:sort` signature identifying a state-vector slot.
    pub fn signature(&self) -> String {
        format!("{}:{}", self.name, self.sort)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Built-in data operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    Not,
    And,
    Or,
    Imp,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// List length `#q`.
    Len,
    /// Prepend `d |> q`.
    Cons,
    /// Append `q <| d`.
    Snoc,
    Concat,
    Head,
    Tail,
    If,
    Min,
    Max,
}

impl Op {
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Not => "!",
            Op::And => "&&",
            Op::Or => "||",
            Op::Imp => "=>",
            Op::Eq => "==",
            Op::Neq => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "div",
            Op::Mod => "mod",
            Op::Len => "#",
            Op::Cons => "|>",
            Op::Snoc => "<|",
            Op::Concat => "++",
            Op::Head => "head",
            Op::Tail => "tail",
            Op::If => "if",
            Op::Min => "min",
            Op::Max => "max",
        }
    }

    fn is_infix(self) -> bool {
        !matches!(
            self,
            Op::Not | Op::Len | Op::Head | Op::Tail | Op::If | Op::Min | Op::Max
        )
    }
}

/// A data term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataTerm {
    Var(Variable),
    Bool(bool),
    Int(BigInt),
    /// Constructor of a structured sort, e.g. `d1: D`.
    Constant { name: String, sort: Sort },
    /// List literal; `sort` is the element sort.
    List { sort: Sort, elements: Vec<DataTerm> },
    App(Op, Vec<DataTerm>),
}

/// Mapping from data variables to the terms replacing them.
pub type Substitution = BTreeMap<Variable, DataTerm>;

impl DataTerm {
    pub fn var(name: impl Into<String>, sort: Sort) -> Self {
        DataTerm::Var(Variable::new(name, sort))
    }

    pub fn int(value: i64) -> Self {
        DataTerm::Int(BigInt::from(value))
    }

    pub fn constant(name: impl Into<String>, sort: Sort) -> Self {
        DataTerm::Constant {
            name: name.into(),
            sort,
        }
    }

    pub fn list(sort: Sort, elements: Vec<DataTerm>) -> Self {
        DataTerm::List { sort, elements }
    }

    pub fn empty_list(sort: Sort) -> Self {
        DataTerm::list(sort, Vec::new())
    }

    pub fn app(op: Op, args: Vec<DataTerm>) -> Self {
        DataTerm::App(op, args)
    }

    pub fn negate(x: DataTerm) -> Self {
        match x {
            DataTerm::Bool(b) => DataTerm::Bool(!b),
            DataTerm::App(Op::Not, mut args) if args.len() == 1 => args.remove(0),
            _ => DataTerm::app(Op::Not, vec![x]),
        }
    }

    pub fn conj(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::And, vec![a, b])
    }

    pub fn disj(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Or, vec![a, b])
    }

    pub fn implies(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Imp, vec![a, b])
    }

    pub fn equal(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Eq, vec![a, b])
    }

    pub fn not_equal(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Neq, vec![a, b])
    }

    pub fn less(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Lt, vec![a, b])
    }

    pub fn less_eq(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Le, vec![a, b])
    }

    pub fn greater(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Gt, vec![a, b])
    }

    pub fn greater_eq(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Ge, vec![a, b])
    }

    pub fn plus(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Add, vec![a, b])
    }

    pub fn minus(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Sub, vec![a, b])
    }

    pub fn modulo(a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::Mod, vec![a, b])
    }

    pub fn length(q: DataTerm) -> Self {
        DataTerm::app(Op::Len, vec![q])
    }

    pub fn cons(d: DataTerm, q: DataTerm) -> Self {
        DataTerm::app(Op::Cons, vec![d, q])
    }

    pub fn snoc(q: DataTerm, d: DataTerm) -> Self {
        DataTerm::app(Op::Snoc, vec![q, d])
    }

    pub fn head(q: DataTerm) -> Self {
        DataTerm::app(Op::Head, vec![q])
    }

    pub fn tail(q: DataTerm) -> Self {
        DataTerm::app(Op::Tail, vec![q])
    }

    pub fn if_then_else(c: DataTerm, a: DataTerm, b: DataTerm) -> Self {
        DataTerm::app(Op::If, vec![c, a, b])
    }
}

impl DataTerm {
    pub fn is_variable(&self) -> bool {
        matches!(self, DataTerm::Var(_))
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            DataTerm::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataTerm::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, DataTerm::Bool(true))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, DataTerm::Bool(false))
    }

    /// Checks if the term is a closed normal form (no variables, no applications).
    pub fn is_value(&self) -> bool {
        match self {
            DataTerm::Bool(_) | DataTerm::Int(_) | DataTerm::Constant { .. } => true,
            DataTerm::List { elements, .. } => elements.iter().all(|e| e.is_value()),
            DataTerm::Var(_) | DataTerm::App(..) => false,
        }
    }

    pub fn free_variables(&self) -> BTreeSet<Variable> {
        let mut result = BTreeSet::new();
        self.collect_free_variables(&mut result);
        result
    }

    pub fn collect_free_variables(&self, result: &mut BTreeSet<Variable>) {
        match self {
            DataTerm::Var(v) => {
                result.insert(v.clone());
            }
            DataTerm::Bool(_) | DataTerm::Int(_) | DataTerm::Constant { .. } => {}
            DataTerm::List { elements, .. } => {
                for e in elements {
                    e.collect_free_variables(result);
                }
            }
            DataTerm::App(_, args) => {
                for a in args {
                    a.collect_free_variables(result);
                }
            }
        }
    }

    pub fn has_free_variable(&self, v: &Variable) -> bool {
        match self {
            DataTerm::Var(w) => w == v,
            DataTerm::Bool(_) | DataTerm::Int(_) | DataTerm::Constant { .. } => false,
            DataTerm::List { elements, .. } => elements.iter().any(|e| e.has_free_variable(v)),
            DataTerm::App(_, args) => args.iter().any(|a| a.has_free_variable(v)),
        }
    }

    /// Applies `sigma` to the term. Data terms have no binders, so no capture can occur.
    pub fn substitute(&self, sigma: &Substitution) -> DataTerm {
        if sigma.is_empty() {
            return self.clone();
        }
        match self {
            DataTerm::Var(v) => sigma.get(v).cloned().unwrap_or_else(|| self.clone()),
            DataTerm::Bool(_) | DataTerm::Int(_) | DataTerm::Constant { .. } => self.clone(),
            DataTerm::List { sort, elements } => DataTerm::List {
                sort: sort.clone(),
                elements: elements.iter().map(|e| e.substitute(sigma)).collect(),
            },
            DataTerm::App(op, args) => {
                DataTerm::App(*op, args.iter().map(|a| a.substitute(sigma)).collect())
            }
        }
    }

    /// Number of nodes in the term.
    pub fn size(&self) -> usize {
        match self {
            DataTerm::List { elements, .. } => 1 + elements.iter().map(|e| e.size()).sum::<usize>(),
            DataTerm::App(_, args) => 1 + args.iter().map(|a| a.size()).sum::<usize>(),
            _ => 1,
        }
    }
}

impl From<bool> for DataTerm {
    fn from(value: bool) -> Self {
        DataTerm::Bool(value)
    }
}

impl From<Variable> for DataTerm {
    fn from(value: Variable) -> Self {
        DataTerm::Var(value)
    }
}

impl Display for DataTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DataTerm::Var(v) => write!(f, "{}", v),
            DataTerm::Bool(b) => write!(f, "{}", b),
            DataTerm::Int(n) => write!(f, "{}", n),
            DataTerm::Constant { name, .. } => write!(f, "{}", name),
            DataTerm::List { elements, .. } => {
                write!(f, "[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            DataTerm::App(op, args) => match (op, args.as_slice()) {
                (Op::Not, [x]) => write!(f, "!{}", x),
                (Op::Len, [x]) => write!(f, "#{}", x),
                (op, [a, b]) if op.is_infix() => write!(f, "({} {} {})", a, op.symbol(), b),
                (op, args) => {
                    write!(f, "{}(", op.symbol())?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", a)?;
                    }
                    write!(f, ")")
                }
            },
        }
    }
}

/// Declarations of finite structured sorts, e.g. `sort D = struct d1 | d2`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSpec {
    structs: BTreeMap<String, Vec<String>>,
}

impl DataSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_struct<I, S>(mut self, name: impl Into<String>, constructors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_struct(name, constructors);
        self
    }

    pub fn add_struct<I, S>(&mut self, name: impl Into<String>, constructors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let constructors: Vec<String> = constructors.into_iter().map(Into::into).collect();
        assert!(!constructors.is_empty(), "Structured sort needs at least one constructor");
        self.structs.insert(name.into(), constructors);
    }

    pub fn constructors(&self, sort: &str) -> Option<&[String]> {
        self.structs.get(sort).map(|c| c.as_slice())
    }

    /// Returns all values of a finite sort, or `None` if the sort is infinite or unknown.
    pub fn enumerate(&self, sort: &Sort) -> Option<Vec<DataTerm>> {
        match sort {
            Sort::Bool => Some(vec![DataTerm::Bool(false), DataTerm::Bool(true)]),
            Sort::Named(name) => self.constructors(name).map(|cs| {
                cs.iter()
                    .map(|c| DataTerm::constant(c.clone(), sort.clone()))
                    .collect()
            }),
            Sort::Pos | Sort::Nat | Sort::Int | Sort::List(_) => None,
        }
    }

    /// Returns some value of the given sort, or `None` for an undeclared structured sort.
    pub fn representative(&self, sort: &Sort) -> Option<DataTerm> {
        match sort {
            Sort::Bool => Some(DataTerm::Bool(false)),
            Sort::Pos => Some(DataTerm::int(1)),
            Sort::Nat | Sort::Int => Some(DataTerm::int(0)),
            Sort::List(element) => Some(DataTerm::empty_list((**element).clone())),
            Sort::Named(name) => self
                .constructors(name)
                .and_then(|cs| cs.first())
                .map(|c| DataTerm::constant(c.clone(), sort.clone())),
        }
    }
}
