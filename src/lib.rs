//! # ppg-rs: Parameterised Parity Games from PBESs
//!
//! **`ppg-rs`** rewrites a *parameterised Boolean equation system* (PBES) into a
//! *parameterised parity game* (PPG) and explores the resulting game on the fly through
//! integer state vectors.
//!
//! ## What is a PPG?
//!
//! A PBES is a sequence of fixpoint equations `sigma X(d: D) = phi`, where `sigma` is `mu` or `nu`
//! and `phi` is a first-order formula over data and instantiations `Y(e)`. A PPG is a PBES in
//! which every right-hand side is either *conjunctive* or *disjunctive*: a conjunction (or
//! disjunction) of guarded instantiations. Every instantiation `X(v)` with closed values `v`
//! is then a node of a parity game, owned by the AND or the OR player, with the priority of
//! the equation of `X`.
//!
//! ## Pipeline
//!
//! - **[`pbes`]**: the equation system, validation and normalization of negations.
//! - **[`quantifier`]** and **[`one_point`]**: distribution of universal quantifiers and the
//!   one-point rule, which keep the number of new equations small.
//! - **[`bqnf`]**: rewriting of bounded quantifier normal form into a PPG.
//! - **[`ppg`]**: rewriting of an arbitrary PBES into a PPG, introducing fresh equations.
//! - **[`info`]**: static analysis of a PPG: state vector layout, transition groups and the
//!   read/write dependency matrix.
//! - **[`explorer`]**: successor generation for integer state vectors.
//!
//! ## Basic Usage
//!
//! ```rust
//! use ppg_rs::classify::is_ppg;
//! use ppg_rs::data::{DataSpec, DataTerm, Sort, Variable};
//! use ppg_rs::eval::Evaluator;
//! use ppg_rs::explorer::{Explorer, ExplorerOptions};
//! use ppg_rs::expr::{Expr, PropVarInst};
//! use ppg_rs::pbes::{Equation, FixpointSymbol, Pbes, PropVar};
//! use ppg_rs::ppg::to_ppg;
//!
//! // nu X(n: Nat) = X(n + 1) && (X(n) || X(n + 2))
//! let n = Variable::new("n", Sort::Nat);
//! let succ = |k| Expr::propvar("X", vec![DataTerm::plus(n.clone().into(), DataTerm::int(k))]);
//! let x = Equation::new(
//!     FixpointSymbol::Nu,
//!     PropVar::new("X", vec![n.clone()]),
//!     Expr::and(succ(1), Expr::or(Expr::propvar("X", vec![n.clone().into()]), succ(2))),
//! );
//! let pbes = Pbes::new(DataSpec::new(), vec![x], PropVarInst::new("X", vec![DataTerm::int(0)]));
//! assert!(!is_ppg(&pbes));
//!
//! // The disjunction becomes a fresh equation
//! let ppg = to_ppg(&pbes).unwrap();
//! assert!(is_ppg(&ppg));
//! assert_eq!(ppg.equations.len(), 2);
//!
//! // Explore the first states of the game
//! let mut explorer = Explorer::new(&ppg, Evaluator::new(DataSpec::new()), ExplorerOptions::default()).unwrap();
//! let space = explorer.explore(Some(10)).unwrap();
//! assert!(space.states >= 10);
//! ```
//!
//! ## Core Components
//!
//! - **[`data`]** and **[`eval`]**: data terms, sorts and the [`DataRewriter`][crate::eval::DataRewriter]
//!   used to evaluate them.
//! - **[`expr`]**: PBES expressions with simplifying constructors.
//! - **[`classify`]**: the PPG and BQNF grammar checks.
//! - **[`greybox`]**: successor expressions of an instantiation.
//! - **[`table`]**: intern tables mapping values to indices and back.

pub mod bqnf;
pub mod classify;
pub mod data;
pub mod error;
pub mod eval;
pub mod explorer;
pub mod expr;
pub mod greybox;
pub mod info;
pub mod lts;
pub mod names;
pub mod one_point;
pub mod pbes;
pub mod ppg;
pub mod quantifier;
pub mod table;
