//! On-the-fly exploration of a PPG through integer state vectors.
//!
//! A state vector holds, at slot 0, the index of the variable name in the string table and,
//! at slot `i > 0`, the index of the value of parameter signature `i` in the value table of
//! its type. Slots that are not parameters of the current variable keep the value of the
//! source state, or the default value when the `reset` option is set.

use std::collections::{BTreeSet, HashSet};
use std::fmt::{self, Display, Formatter};

use log::{debug, info, trace};

use crate::classify::is_ppg;
use crate::data::DataTerm;
use crate::error::{Error, Result};
use crate::eval::DataRewriter;
use crate::expr::{Expr, PropVarInst};
use crate::greybox::{Owner, PbesGreybox};
use crate::info::{LtsInfo, FALSE_NAME, TRUE_NAME};
use crate::pbes::Pbes;
use crate::ppg::{to_ppg_with, RewriteOptions, DEFAULT_MAX_DEPTH};
use crate::table::InternTable;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExplorerOptions {
    /// Reset slots that are not parameters of the current variable to their default value.
    pub reset: bool,
    /// Split every top-level conjunction and disjunction into transition groups.
    pub always_split: bool,
    /// Recursion guard of the analyses and of the successor computation.
    pub max_depth: usize,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            reset: false,
            always_split: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A node of the parity game: a variable with values for its parameters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct State {
    pub variable: String,
    pub values: Vec<DataTerm>,
}

impl State {
    pub fn new(variable: impl Into<String>, values: Vec<DataTerm>) -> Self {
        Self {
            variable: variable.into(),
            values,
        }
    }

    pub fn true_state() -> Self {
        Self::new(TRUE_NAME, vec![])
    }

    pub fn false_state() -> Self {
        Self::new(FALSE_NAME, vec![])
    }

    /// State of a closed instantiation; any argument that is not a value is an error.
    pub fn from_instantiation(inst: &PropVarInst) -> Result<Self> {
        if let Some(a) = inst.args.iter().find(|a| !a.is_value()) {
            return Err(Error::no_value(format!("state {}: argument {}", inst, a)));
        }
        Ok(Self::new(inst.name.clone(), inst.args.clone()))
    }

    pub fn to_instantiation(&self) -> PropVarInst {
        PropVarInst::new(self.variable.clone(), self.values.clone())
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_instantiation())
    }
}

/// Size of an explored state space.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct StateSpace {
    pub states: usize,
    pub transitions: usize,
}

pub struct Explorer<R> {
    greybox: PbesGreybox<R>,
    info: LtsInfo,
    strings: InternTable<String>,
    /// Value table per state type; the table of type 0 (variable names) stays empty.
    values: Vec<InternTable<DataTerm>>,
}

impl<R> Explorer<R>
where
    R: DataRewriter,
{
    /// Creates an explorer for `pbes`, rewriting it to a PPG first if needed.
    pub fn new(pbes: &Pbes, rewriter: R, options: ExplorerOptions) -> Result<Self> {
        let pbes = if is_ppg(pbes) {
            pbes.clone()
        } else {
            info!("Rewriting to PPG...");
            let ppg = to_ppg_with(
                pbes,
                RewriteOptions {
                    max_depth: options.max_depth,
                },
            )?;
            info!("Rewriting done");
            ppg
        };
        let info = LtsInfo::new(&pbes, &rewriter, &options)?;
        let values = (0..info.lts_type().number_of_state_types())
            .map(|_| InternTable::default())
            .collect();
        Ok(Self {
            greybox: PbesGreybox::new(pbes, rewriter, options.max_depth),
            info,
            strings: InternTable::default(),
            values,
        })
    }

    pub fn info(&self) -> &LtsInfo {
        &self.info
    }

    pub fn greybox(&self) -> &PbesGreybox<R> {
        &self.greybox
    }

    pub fn pbes(&self) -> &Pbes {
        self.greybox.pbes()
    }

    pub fn state_length(&self) -> usize {
        self.info.state_length()
    }

    pub fn get_initial_state(&self) -> Result<State> {
        State::from_instantiation(&self.greybox.initial_state())
    }

    /// State vector of the initial state.
    pub fn initial_state(&mut self) -> Result<Vec<usize>> {
        let state = self.get_initial_state()?;
        let mut dst = vec![0; self.state_length()];
        self.to_state_vector(&state, &mut dst, None)?;
        Ok(dst)
    }

    /// Index of the variable name `s`, added to the string table if new.
    pub fn get_string_index(&mut self, s: &str) -> usize {
        match self.strings.find(s) {
            Some(index) => index,
            None => self.strings.put(s.to_string()),
        }
    }

    /// Index of `value` in the table of type `type_no`, added if new.
    pub fn get_index(&mut self, type_no: usize, value: &DataTerm) -> Result<usize> {
        if type_no == 0 {
            return Err(Error::index("data type number", type_no));
        }
        let table = self
            .values
            .get_mut(type_no)
            .ok_or_else(|| Error::index("type number", type_no))?;
        Ok(match table.find(value) {
            Some(index) => index,
            None => table.put(value.clone()),
        })
    }

    /// Printed value at `index` of the table of type `type_no`.
    pub fn get_value(&self, type_no: usize, index: usize) -> Result<String> {
        if type_no == 0 {
            return self.get_string_value(index).map(str::to_string);
        }
        self.get_data_value(type_no, index).map(ToString::to_string)
    }

    pub fn get_string_value(&self, index: usize) -> Result<&str> {
        self.strings
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| Error::index("string index", index))
    }

    pub fn get_data_value(&self, type_no: usize, index: usize) -> Result<&DataTerm> {
        self.values
            .get(type_no)
            .and_then(|table| table.get(index))
            .ok_or_else(|| Error::index("value index", format!("{} of type {}", index, type_no)))
    }

    /// Encodes `state` into `dst`.
    ///
    /// With a source state, slots of unchanged parameters keep the source index and, unless
    /// `reset` is set, so do the slots that are not parameters of `state`.
    pub fn to_state_vector(
        &mut self,
        state: &State,
        dst: &mut [usize],
        src: Option<(&State, &[usize])>,
    ) -> Result<()> {
        let length = self.state_length();
        if dst.len() != length || src.map_or(false, |(_, v)| v.len() != length) {
            return Err(Error::no_value(format!("to_state_vector: expected length {}", length)));
        }

        let same_var = src.map_or(false, |(s, _)| s.variable == state.variable);
        dst[0] = match src {
            Some((_, v)) if same_var => v[0],
            _ => self.get_string_index(&state.variable),
        };

        match src {
            Some((_, v)) if !self.info.reset_option() => dst[1..].copy_from_slice(&v[1..]),
            _ => {
                for i in 1..length {
                    let value = self.info.default_value(i - 1)?.clone();
                    let type_no = self.info.lts_type().state_type_no(i);
                    dst[i] = self.values[type_no].put(value);
                }
            }
        }

        let var = self.info.variable(&state.variable)?;
        if var.indices.len() != state.values.len() {
            return Err(Error::no_value(format!(
                "to_state_vector: {} expects {} values",
                state,
                var.indices.len()
            )));
        }
        let src_var = match src {
            Some((s, _)) => Some(self.info.variable(&s.variable)?),
            None => None,
        };
        for (value, &index) in state.values.iter().zip(&var.indices) {
            let i = index + 1;
            let unchanged = match (src, src_var) {
                (Some((s, v)), Some(sv)) => sv
                    .positions
                    .get(&index)
                    .and_then(|&pos| s.values.get(pos))
                    .filter(|old| *old == value)
                    .map(|_| v[i]),
                _ => None,
            };
            dst[i] = match unchanged {
                Some(old) => old,
                None => {
                    let type_no = self.info.lts_type().state_type_no(i);
                    self.values[type_no].put(value.clone())
                }
            };
        }
        Ok(())
    }

    /// Variable name at slot 0 of `src`, after checking the vector length.
    fn variable_name(&self, src: &[usize]) -> Result<&str> {
        match src.first() {
            Some(&index) if src.len() == self.state_length() => self.get_string_value(index),
            _ => Err(Error::index("state vector length", src.len())),
        }
    }

    /// Decodes a state vector.
    pub fn from_state_vector(&self, src: &[usize]) -> Result<State> {
        let name = self.variable_name(src)?;
        let var = self.info.variable(name)?;
        let values = var
            .indices
            .iter()
            .map(|&index| {
                let i = index + 1;
                let type_no = self.info.lts_type().state_type_no(i);
                src.get(i)
                    .ok_or_else(|| Error::no_value(format!("from_state_vector: slot {}", i)))
                    .and_then(|&j| self.get_data_value(type_no, j))
                    .map(Clone::clone)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(State::new(name, values))
    }

    fn to_states(&self, successors: BTreeSet<Expr>, owner: Owner) -> Result<Vec<State>> {
        let mut result = Vec::with_capacity(successors.len());
        for e in successors {
            match &e {
                Expr::PropVar(inst) => result.push(State::from_instantiation(inst)?),
                _ if e.is_true() => {
                    if owner != Owner::And {
                        result.push(State::true_state());
                    }
                }
                _ if e.is_false() => {
                    if owner != Owner::Or {
                        result.push(State::false_state());
                    }
                }
                _ => return Err(Error::structural("get_successors", e)),
            }
        }
        Ok(result)
    }

    fn is_sink(state: &State) -> bool {
        state.variable == TRUE_NAME || state.variable == FALSE_NAME
    }

    /// Successors of `state`: the union of the successors along each of its groups.
    ///
    /// A conjunctive state never has `true` as a successor and a disjunctive state never has
    /// `false`; the sink states loop.
    pub fn get_successors(&self, state: &State) -> Result<Vec<State>> {
        if Self::is_sink(state) {
            return Ok(vec![state.clone()]);
        }
        let owner = self.info.variable(&state.variable)?.owner;
        let inst = state.to_instantiation();
        let mut successors = BTreeSet::new();
        let mut groups = self.info.groups_of(&state.variable).peekable();
        if groups.peek().is_none() {
            successors = self.greybox.get_successors(&inst)?;
        }
        for (_, group) in groups {
            successors.extend(self.greybox.get_successors_of(&inst, &group.formula)?);
        }
        self.to_states(successors, owner)
    }

    /// Successors of `state` along transition group `group`.
    pub fn get_successors_in_group(&self, state: &State, group: usize) -> Result<Vec<State>> {
        let g = self.info.group(group)?;
        if g.variable != state.variable {
            return Ok(vec![]);
        }
        if Self::is_sink(state) {
            return Ok(vec![state.clone()]);
        }
        let successors = self
            .greybox
            .get_successors_of(&state.to_instantiation(), &g.formula)?;
        self.to_states(successors, g.owner)
    }

    /// Calls `cb` with the vector of every successor of `src`.
    pub fn next_state_all<F>(&mut self, src: &[usize], mut cb: F) -> Result<()>
    where
        F: FnMut(&[usize]),
    {
        let state = self.from_state_vector(src)?;
        trace!("next_state_all: {}", state);
        let successors = self.get_successors(&state)?;
        let mut dst = vec![0; self.state_length()];
        for s in &successors {
            self.to_state_vector(s, &mut dst, Some((&state, src)))?;
            cb(&dst);
        }
        Ok(())
    }

    /// Calls `cb` with the vector of every successor of `src` along `group`.
    pub fn next_state_long<F>(&mut self, src: &[usize], group: usize, mut cb: F) -> Result<()>
    where
        F: FnMut(&[usize], usize),
    {
        let same_var = self.info.group(group)?.variable == self.variable_name(src)?;
        if !same_var {
            return Ok(());
        }
        let state = self.from_state_vector(src)?;
        let successors = self.get_successors_in_group(&state, group)?;
        let mut dst = vec![0; self.state_length()];
        for s in &successors {
            self.to_state_vector(s, &mut dst, Some((&state, src)))?;
            cb(&dst, group);
        }
        Ok(())
    }

    /// Value of state label `label` (0: priority, 1: owner) of `src`.
    pub fn state_label(&self, label: usize, src: &[usize]) -> Result<usize> {
        let var = self.info.variable(self.variable_name(src)?)?;
        match label {
            0 => Ok(var.priority),
            1 => Ok(var.owner.label()),
            _ => Err(Error::index("label", label)),
        }
    }

    /// Breadth-first exploration with [`next_state_all`][Self::next_state_all], stopping
    /// after `limit` states if given.
    pub fn explore(&mut self, limit: Option<usize>) -> Result<StateSpace> {
        self.explore_with(limit, |explorer, src, next| {
            explorer.next_state_all(src, |dst| next.push(dst.to_vec()))
        })
    }

    /// Breadth-first exploration with [`next_state_long`][Self::next_state_long] over all
    /// groups.
    pub fn explore_grouped(&mut self, limit: Option<usize>) -> Result<StateSpace> {
        self.explore_with(limit, |explorer, src, next| {
            for group in 0..explorer.info.number_of_groups() {
                explorer.next_state_long(src, group, |dst, _| next.push(dst.to_vec()))?;
            }
            Ok(())
        })
    }

    fn explore_with<F>(&mut self, limit: Option<usize>, mut successors: F) -> Result<StateSpace>
    where
        F: FnMut(&mut Self, &[usize], &mut Vec<Vec<usize>>) -> Result<()>,
    {
        let mut states: InternTable<Vec<usize>> = InternTable::new(10);
        let mut transitions: HashSet<(usize, usize)> = HashSet::new();
        let initial = self.initial_state()?;
        states.put(initial);

        let mut current = 0;
        while current < states.len() {
            if limit.map_or(false, |l| states.len() >= l) {
                debug!("explore: state limit {:?} reached", limit);
                break;
            }
            let src = states[current].clone();
            let mut next = Vec::new();
            successors(self, &src, &mut next)?;
            for dst in next {
                let target = states.put(dst);
                transitions.insert((current, target));
            }
            current += 1;
        }

        let space = StateSpace {
            states: states.len(),
            transitions: transitions.len(),
        };
        info!("explore: {} states, {} transitions", space.states, space.transitions);
        Ok(space)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::data::{DataSpec, Sort, Variable};
    use crate::eval::Evaluator;
    use crate::pbes::{Equation, FixpointSymbol, PropVar};

    /// nu X(n: Nat) = (n < 2 || Y) && X((n + 1) mod 3);  mu Y = false || Y
    fn counter() -> Pbes {
        let n = Variable::new("n", Sort::Nat);
        let x = Equation::new(
            FixpointSymbol::Nu,
            PropVar::new("X", vec![n.clone()]),
            Expr::and(
                Expr::or(
                    Expr::data(DataTerm::less(n.clone().into(), DataTerm::int(2))),
                    Expr::propvar("Y", vec![]),
                ),
                Expr::propvar(
                    "X",
                    vec![DataTerm::modulo(
                        DataTerm::plus(n.clone().into(), DataTerm::int(1)),
                        DataTerm::int(3),
                    )],
                ),
            ),
        );
        let y = Equation::new(FixpointSymbol::Mu, PropVar::new("Y", vec![]), Expr::propvar("Y", vec![]));
        Pbes::new(DataSpec::new(), vec![x, y], PropVarInst::new("X", vec![DataTerm::int(0)]))
    }

    fn explorer(options: ExplorerOptions) -> Explorer<Evaluator> {
        Explorer::new(&counter(), Evaluator::new(DataSpec::new()), options).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let mut e = explorer(ExplorerOptions::default());
        let init = e.initial_state().unwrap();
        assert_eq!(init, vec![0, 0]);
        assert_eq!(e.get_value(0, init[0]).unwrap(), "X");
        assert_eq!(e.get_value(1, init[1]).unwrap(), "0");
        let state = e.from_state_vector(&init).unwrap();
        assert_eq!(state, State::new("X", vec![DataTerm::int(0)]));
        assert_eq!(e.info().state_to_string(&state).unwrap(), "AND:X(n:Nat = 0)");
        assert_eq!(e.state_label(0, &init).unwrap(), 2);
        assert_eq!(e.state_label(1, &init).unwrap(), 1);
        assert_eq!(e.state_label(2, &init), Err(Error::index("label", 2)));
    }

    #[test]
    fn test_successors() {
        let e = explorer(ExplorerOptions::default());
        let x = |n| State::new("X", vec![DataTerm::int(n)]);
        // n < 2: the guard is true and dropped below a conjunction
        assert_eq!(e.get_successors(&x(0)).unwrap(), vec![x(1)]);
        let succ = e.get_successors(&x(2)).unwrap();
        println!("{:?}", succ);
        assert_eq!(succ, vec![x(0), State::new("Y", vec![])]);
        let t = State::true_state();
        assert_eq!(e.get_successors(&t).unwrap(), vec![t.clone()]);
        assert_eq!(e.get_successors_in_group(&t, 0).unwrap(), vec![t.clone()]);
        assert!(e.get_successors_in_group(&t, 1).unwrap().is_empty());
    }

    #[test]
    fn test_explore() {
        let mut e = explorer(ExplorerOptions::default());
        // X(0) -> X(1) -> X(2) -> {X(0), Y}, Y -> Y
        let space = e.explore(None).unwrap();
        assert_eq!(space, StateSpace { states: 4, transitions: 5 });
        let grouped = e.explore_grouped(None).unwrap();
        assert_eq!(grouped, space);
        assert_eq!(e.explore(Some(2)).unwrap().states, 2);
    }

    #[test]
    fn test_reset() {
        let options = ExplorerOptions {
            reset: true,
            ..ExplorerOptions::default()
        };
        let mut e = explorer(options);
        let mut vectors = Vec::new();
        let init = e.initial_state().unwrap();
        let x2 = {
            let mut next = Vec::new();
            e.next_state_all(&init, |dst| next.push(dst.to_vec())).unwrap();
            let x1 = next.pop().unwrap();
            next.clear();
            e.next_state_all(&x1, |dst| next.push(dst.to_vec())).unwrap();
            next.pop().unwrap()
        };
        e.next_state_all(&x2, |dst| vectors.push(dst.to_vec())).unwrap();
        println!("{:?}", vectors);
        // Y has no parameters: its n slot is reset to the default 0, which has index 0
        let y = vectors.iter().find(|v| e.get_string_value(v[0]).unwrap() == "Y").unwrap();
        assert_eq!(y[1], 0);
    }

    #[test]
    fn test_no_value() {
        let e = explorer(ExplorerOptions::default());
        let inst = PropVarInst::new("X", vec![DataTerm::var("m", Sort::Nat)]);
        assert!(matches!(State::from_instantiation(&inst), Err(Error::NoValue { .. })));
        assert!(matches!(e.from_state_vector(&[7, 0]), Err(Error::Index { .. })));
    }

    #[test]
    fn test_reserved_variable() {
        let mut p = counter();
        p.equations[1].variable.name = TRUE_NAME.to_string();
        p.equations[0].formula = Expr::propvar(TRUE_NAME, vec![]);
        let result = Explorer::new(&p, Evaluator::new(DataSpec::new()), ExplorerOptions::default());
        assert!(matches!(result, Err(e) if e == Error::validation("true", "reserved name")));
    }

    #[test]
    fn test_short_state_vector() {
        let mut e = explorer(ExplorerOptions::default());
        let short = Error::index("state vector length", 1);
        let empty = Error::index("state vector length", 0);
        assert_eq!(e.from_state_vector(&[]), Err(empty.clone()));
        assert_eq!(e.from_state_vector(&[0]), Err(short.clone()));
        assert_eq!(e.state_label(0, &[]), Err(empty.clone()));
        assert_eq!(e.state_label(1, &[0]), Err(short.clone()));
        assert_eq!(e.next_state_long(&[], 2, |_, _| {}), Err(empty.clone()));
        assert_eq!(e.next_state_all(&[0], |_| {}), Err(short));
        assert_eq!(e.next_state_all(&[], |_| {}), Err(empty));
    }
}
