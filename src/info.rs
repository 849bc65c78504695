//! Static analysis of a PPG: state-vector layout, transition groups and dependency matrix.
//!
//! The state vector has one slot for the propositional variable name, followed by one slot
//! per distinct parameter signature `name:sort` over all equations. Transition groups 0 and 1
//! are the sinks for `true` and `false`; the other groups are parts of the right-hand sides
//! of the equations reachable from the initial instantiation.
//!
//! The dependency matrix is computed from syntactic analyses over parameter signatures:
//!
//! - `tf(phi)`: a boolean constant may be a successor;
//! - `occ(phi)`: names of the instantiated variables;
//! - `used(phi)`: signatures whose value is needed to compute the successors;
//! - `copied(phi)`: signatures passed on unchanged;
//! - `changed(phi)`: target signatures that may get a new value;
//! - `reset(phi, d)`: signatures of `d` that the targets do not have.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use log::{debug, info};

use crate::classify::is_ppg_equation;
use crate::data::{DataTerm, Substitution, Variable};
use crate::error::{Error, Result};
use crate::eval::DataRewriter;
use crate::explorer::{ExplorerOptions, State};
use crate::expr::{Expr, PropVarInst};
use crate::greybox::Owner;
use crate::lts::LtsType;
use crate::pbes::{FixpointSymbol, Pbes, PropVar};

/// Name of the sink variable for `true`.
pub const TRUE_NAME: &str = "true";
/// Name of the sink variable for `false`.
pub const FALSE_NAME: &str = "false";

/// Static information about one propositional variable.
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub variable: PropVar,
    pub owner: Owner,
    pub symbol: FixpointSymbol,
    pub priority: usize,
    pub formula: Expr,
    /// Parameter signatures, in parameter order.
    pub signatures: Vec<String>,
    /// Parameter index (slot minus one) of each parameter.
    pub indices: Vec<usize>,
    /// Position in the parameter list per parameter index.
    pub positions: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionGroup {
    /// Variable whose states take part in this group.
    pub variable: String,
    pub owner: Owner,
    pub formula: Expr,
}

pub struct LtsInfo {
    lts_type: LtsType,
    param_index: HashMap<String, usize>,
    default_values: Vec<DataTerm>,
    variables: HashMap<String, VariableInfo>,
    groups: Vec<TransitionGroup>,
    matrix: Vec<Vec<bool>>,
    read_matrix: Vec<Vec<bool>>,
    write_matrix: Vec<Vec<bool>>,
    reset: bool,
    always_split: bool,
    max_depth: usize,
}

impl LtsInfo {
    /// Analyzes `pbes`, which must be a valid PPG.
    pub fn new<R: DataRewriter>(pbes: &Pbes, rewriter: &R, options: &ExplorerOptions) -> Result<Self> {
        pbes.validate()?;
        if let Some(eq) = pbes.equations.iter().find(|eq| !is_ppg_equation(eq)) {
            return Err(Error::validation(eq.name(), "PBES is not a PPG"));
        }

        let mut info = Self {
            lts_type: LtsType::new(),
            param_index: HashMap::new(),
            default_values: Vec::new(),
            variables: HashMap::new(),
            groups: Vec::new(),
            matrix: Vec::new(),
            read_matrix: Vec::new(),
            write_matrix: Vec::new(),
            reset: options.reset,
            always_split: options.always_split,
            max_depth: options.max_depth,
        };
        info.compute_lts_type(pbes, rewriter)?;
        info.compute_transition_groups(pbes)?;
        info.compute_dependency_matrix();
        Ok(info)
    }

    fn compute_lts_type<R: DataRewriter>(&mut self, pbes: &Pbes, rewriter: &R) -> Result<()> {
        info!("Compute LTS type");
        let mut params: Vec<&Variable> = Vec::new();
        for eq in &pbes.equations {
            for p in &eq.variable.parameters {
                let signature = p.signature();
                if params.iter().all(|q| q.signature() != signature) {
                    params.push(p);
                }
            }
        }

        let sigma = Substitution::new();
        self.lts_type.add_state("var", "string");
        for (i, p) in params.iter().enumerate() {
            let signature = p.signature();
            self.lts_type.add_state(signature.clone(), p.sort.to_string());
            self.param_index.insert(signature, i);
            let value = rewriter.representative(&p.sort)?;
            self.default_values.push(rewriter.rewrite(&value, &sigma));
        }
        self.lts_type.add_state_label("priority", "int");
        self.lts_type.add_state_label("type", "int");

        info!("LTS type: {}", self.lts_type);
        Ok(())
    }

    fn add_variable(&mut self, variable: PropVar, owner: Owner, symbol: FixpointSymbol, priority: usize, formula: Expr) -> Result<()> {
        let signatures: Vec<String> = variable.parameters.iter().map(Variable::signature).collect();
        let indices = signatures
            .iter()
            .map(|s| self.index_of(s))
            .collect::<Result<Vec<usize>>>()?;
        let positions = indices.iter().enumerate().map(|(pos, &i)| (i, pos)).collect();
        debug!("Adding var {}, priority={}, symbol={}", variable.name, priority, symbol);
        self.variables.insert(
            variable.name.clone(),
            VariableInfo {
                variable,
                owner,
                symbol,
                priority,
                formula,
                signatures,
                indices,
                positions,
            },
        );
        Ok(())
    }

    fn compute_transition_groups(&mut self, pbes: &Pbes) -> Result<()> {
        info!("Compute transition groups");

        self.add_variable(PropVar::new(TRUE_NAME, vec![]), Owner::And, FixpointSymbol::Nu, 0, Expr::tt())?;
        self.groups.push(TransitionGroup {
            variable: TRUE_NAME.to_string(),
            owner: Owner::And,
            formula: Expr::tt(),
        });
        self.add_variable(PropVar::new(FALSE_NAME, vec![]), Owner::Or, FixpointSymbol::Mu, 1, Expr::ff())?;
        self.groups.push(TransitionGroup {
            variable: FALSE_NAME.to_string(),
            owner: Owner::Or,
            formula: Expr::ff(),
        });

        // Even priorities are nu, odd ones mu.
        let mut priority = 2;
        let mut symbol = FixpointSymbol::Nu;
        for eq in &pbes.equations {
            if eq.symbol != symbol {
                priority += 1;
                symbol = eq.symbol;
            }
            let owner = Owner::of(&eq.formula);
            self.add_variable(eq.variable.clone(), owner, eq.symbol, priority, eq.formula.clone())?;
        }

        // Skip equations that are not reachable from the initial instantiation.
        let mut reachable: BTreeSet<String> = BTreeSet::new();
        let mut queue = VecDeque::new();
        reachable.insert(pbes.initial.name.clone());
        queue.push_back(pbes.initial.name.clone());
        while let Some(name) = queue.pop_front() {
            for part in self.split_variable(&name)? {
                for occ in self.occ(&part) {
                    if reachable.insert(occ.clone()) {
                        queue.push_back(occ);
                    }
                }
            }
        }
        debug!("Reachable variables: {:?}", reachable);

        for eq in &pbes.equations {
            let name = eq.name();
            if !reachable.contains(name) {
                continue;
            }
            let owner = self.variable(name)?.owner;
            for part in self.split_variable(name)? {
                debug!("Add transition group {}: {} {} {}", self.groups.len(), owner, name, part);
                self.groups.push(TransitionGroup {
                    variable: name.to_string(),
                    owner,
                    formula: part,
                });
            }
        }
        info!("{} transition groups", self.groups.len());
        Ok(())
    }

    fn split_variable(&self, name: &str) -> Result<Vec<Expr>> {
        let v = self.variable(name)?;
        self.split_expression(&v.formula, v.priority, v.owner, &BTreeSet::new(), 0)
    }

    /// Splits `e` into the parts that become separate transition groups.
    ///
    /// A conjunction (disjunction) is only split if every part is a pass-through instantiation;
    /// those with the same priority (and a compatible owner) are replaced by the parts of their
    /// own right-hand side. With `always_split`, every conjunction and disjunction is split.
    fn split_expression(
        &self,
        e: &Expr,
        priority: usize,
        owner: Owner,
        stack: &BTreeSet<String>,
        depth: usize,
    ) -> Result<Vec<Expr>> {
        if depth > self.max_depth {
            return Err(Error::too_deep("split_expression", self.max_depth));
        }
        if e.is_simple() || (!e.is_propvar() && count_variables(e) <= 1 && !self.always_split) {
            return Ok(vec![e.clone()]);
        }
        let parts: Vec<&Expr> = match e {
            Expr::And(..) => e.conjuncts(),
            Expr::Or(..) => e.disjuncts(),
            _ => vec![e],
        };

        let mut result = Vec::new();
        for part in &parts {
            let inst = match part.as_propvar() {
                Some(inst) if self.is_pass_through(inst)? => inst,
                _ => {
                    return Ok(if self.always_split {
                        parts.iter().map(|p| (*p).clone()).collect()
                    } else {
                        vec![e.clone()]
                    });
                }
            };
            let target = self.variable(&inst.name)?;
            let compatible = target.owner == owner
                || target.formula.is_simple()
                || count_variables(&target.formula) <= 1;
            if target.priority == priority && compatible && !stack.contains(&inst.name) {
                debug!("Inlining pass-through {}", inst);
                let mut stack = stack.clone();
                stack.insert(inst.name.clone());
                result.extend(self.split_expression(&target.formula, priority, owner, &stack, depth + 1)?);
            } else {
                result.push((*part).clone());
            }
        }
        Ok(result)
    }

    /// Checks if `inst` passes the parameters of its target unchanged, `Y(d1, ..., dn)`
    /// for `Y(d1: D1, ..., dn: Dn)`.
    pub fn is_pass_through(&self, inst: &PropVarInst) -> Result<bool> {
        let params = &self.variable(&inst.name)?.variable.parameters;
        Ok(params.len() == inst.args.len()
            && params
                .iter()
                .zip(&inst.args)
                .all(|(p, a)| a.as_variable() == Some(p)))
    }

    fn compute_dependency_matrix(&mut self) {
        info!("Compute dependency matrix");
        for group in 0..self.groups.len() {
            let mut row = Vec::with_capacity(self.state_length());
            let mut read_row = Vec::with_capacity(self.state_length());
            let mut write_row = Vec::with_capacity(self.state_length());
            for part in 0..self.state_length() {
                let (r, w) = if part == 0 {
                    (true, self.is_write_dependent_propvar(group))
                } else {
                    (
                        self.is_read_dependent_parameter(group, part),
                        self.is_write_dependent_parameter(group, part),
                    )
                };
                row.push(r || w);
                read_row.push(r);
                write_row.push(w);
            }
            self.matrix.push(row);
            self.read_matrix.push(read_row);
            self.write_matrix.push(write_row);
        }
    }

    fn is_sink(group: usize) -> bool {
        group < 2
    }

    fn param_set(&self, name: &str) -> BTreeSet<String> {
        self.variables
            .get(name)
            .map(|v| v.signatures.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn is_read_dependent_parameter(&self, group: usize, part: usize) -> bool {
        if Self::is_sink(group) {
            return false;
        }
        let p = &self.lts_type.state_names()[part];
        let g = &self.groups[group];
        if !self.param_set(&g.variable).contains(p) {
            return false;
        }
        let empty = BTreeSet::new();
        if self.used(&g.formula, &empty).contains(p) {
            return true;
        }
        self.changed(&g.formula, &empty).contains(p) && self.copied(&g.formula, &empty).contains(p)
    }

    fn is_write_dependent_propvar(&self, group: usize) -> bool {
        if Self::is_sink(group) {
            return false;
        }
        let g = &self.groups[group];
        if tf(&g.formula) {
            return true;
        }
        let occ = self.occ(&g.formula);
        match occ.len() {
            0 => false,
            1 => !occ.contains(&g.variable),
            _ => true,
        }
    }

    fn is_write_dependent_parameter(&self, group: usize, part: usize) -> bool {
        if Self::is_sink(group) {
            return false;
        }
        let p = &self.lts_type.state_names()[part];
        let g = &self.groups[group];
        if self.reset {
            if tf(&g.formula) {
                return true;
            }
            if self.reset_set(&g.formula, &self.param_set(&g.variable)).contains(p) {
                return true;
            }
        }
        self.changed(&g.formula, &BTreeSet::new()).contains(p)
    }

    /// Names of the instantiated variables in `e`.
    pub fn occ(&self, e: &Expr) -> BTreeSet<String> {
        e.occurring_names()
    }

    /// Signatures of the free data variables of `e`.
    pub fn free(&self, e: &Expr) -> BTreeSet<String> {
        e.free_variables().iter().map(Variable::signature).collect()
    }

    fn signatures_of(&self, name: &str) -> &[String] {
        self.variables
            .get(name)
            .map(|v| v.signatures.as_slice())
            .unwrap_or(&[])
    }

    /// Signatures read by `e`; `bound` holds the signatures bound by enclosing quantifiers.
    pub fn used(&self, e: &Expr, bound: &BTreeSet<String>) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        match e {
            Expr::Data(t) => {
                result.extend(data_signatures(t).filter(|s| !bound.contains(s)));
            }
            Expr::PropVar(inst) => {
                for (param, value) in self.signatures_of(&inst.name).iter().zip(&inst.args) {
                    match value.as_variable() {
                        Some(v) => {
                            let signature = v.signature();
                            if *param != signature && !bound.contains(&signature) {
                                result.insert(signature);
                            }
                        }
                        None => result.extend(data_signatures(value).filter(|s| !bound.contains(s))),
                    }
                }
            }
            Expr::Not(x) => result = self.used(x, bound),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => {
                result = self.used(l, bound);
                result.extend(self.used(r, bound));
            }
            Expr::Forall(vars, body) | Expr::Exists(vars, body) => {
                result = self.used(body, &extend_bound(bound, vars));
            }
        }
        result
    }

    /// Signatures passed unchanged to a parameter with the same signature.
    pub fn copied(&self, e: &Expr, bound: &BTreeSet<String>) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        match e {
            Expr::Data(_) => {}
            Expr::PropVar(inst) => {
                for (param, value) in self.signatures_of(&inst.name).iter().zip(&inst.args) {
                    if let Some(v) = value.as_variable() {
                        let signature = v.signature();
                        if *param == signature && !bound.contains(&signature) {
                            result.insert(signature);
                        }
                    }
                }
            }
            Expr::Not(x) => result = self.copied(x, bound),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => {
                result = self.copied(l, bound);
                result.extend(self.copied(r, bound));
            }
            Expr::Forall(vars, body) | Expr::Exists(vars, body) => {
                result = self.copied(body, &extend_bound(bound, vars));
            }
        }
        result
    }

    /// Target parameter signatures that do not simply receive the same-named value.
    pub fn changed(&self, e: &Expr, bound: &BTreeSet<String>) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        match e {
            Expr::Data(_) => {}
            Expr::PropVar(inst) => {
                for (param, value) in self.signatures_of(&inst.name).iter().zip(&inst.args) {
                    let unchanged = value.as_variable().map_or(false, |v| {
                        let signature = v.signature();
                        *param == signature && !bound.contains(&signature)
                    });
                    if !unchanged {
                        result.insert(param.clone());
                    }
                }
            }
            Expr::Not(x) => result = self.changed(x, bound),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => {
                result = self.changed(l, bound);
                result.extend(self.changed(r, bound));
            }
            Expr::Forall(vars, body) | Expr::Exists(vars, body) => {
                result = self.changed(body, &extend_bound(bound, vars));
            }
        }
        result
    }

    /// Signatures of `d` missing from the parameters of some instantiated variable.
    pub fn reset_set(&self, e: &Expr, d: &BTreeSet<String>) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        match e {
            Expr::Data(_) => {}
            Expr::PropVar(inst) => {
                let params = self.param_set(&inst.name);
                result.extend(d.iter().filter(|s| !params.contains(*s)).cloned());
            }
            Expr::Not(x) | Expr::Forall(_, x) | Expr::Exists(_, x) => result = self.reset_set(x, d),
            Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => {
                result = self.reset_set(l, d);
                result.extend(self.reset_set(r, d));
            }
        }
        result
    }

    pub fn lts_type(&self) -> &LtsType {
        &self.lts_type
    }

    pub fn state_length(&self) -> usize {
        self.lts_type.state_length()
    }

    pub fn reset_option(&self) -> bool {
        self.reset
    }

    pub fn always_split_option(&self) -> bool {
        self.always_split
    }

    pub fn number_of_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[TransitionGroup] {
        &self.groups
    }

    pub fn group(&self, group: usize) -> Result<&TransitionGroup> {
        self.groups.get(group).ok_or_else(|| Error::index("group", group))
    }

    /// Groups whose source variable is `name`.
    pub fn groups_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (usize, &'a TransitionGroup)> + 'a {
        self.groups
            .iter()
            .enumerate()
            .filter(move |(_, g)| g.variable == name)
    }

    pub fn variable(&self, name: &str) -> Result<&VariableInfo> {
        self.variables
            .get(name)
            .ok_or_else(|| Error::index("variable", name))
    }

    pub fn variables(&self) -> &HashMap<String, VariableInfo> {
        &self.variables
    }

    /// Parameter index (slot minus one) of a signature.
    pub fn index_of(&self, signature: &str) -> Result<usize> {
        self.param_index
            .get(signature)
            .copied()
            .ok_or_else(|| Error::index("signature", signature))
    }

    /// Default value of parameter index `index`.
    pub fn default_value(&self, index: usize) -> Result<&DataTerm> {
        self.default_values
            .get(index)
            .ok_or_else(|| Error::index("parameter index", index))
    }

    pub fn matrix(&self) -> &[Vec<bool>] {
        &self.matrix
    }

    pub fn read_matrix(&self) -> &[Vec<bool>] {
        &self.read_matrix
    }

    pub fn write_matrix(&self) -> &[Vec<bool>] {
        &self.write_matrix
    }

    /// `(read, write)` dependency of `group` on slot `part`.
    pub fn dependency(&self, group: usize, part: usize) -> Result<(bool, bool)> {
        let read = self.read_matrix.get(group).ok_or_else(|| Error::index("group", group))?;
        let write = &self.write_matrix[group];
        match (read.get(part), write.get(part)) {
            (Some(&r), Some(&w)) => Ok((r, w)),
            _ => Err(Error::index("slot", part)),
        }
    }

    /// Renders a state as `AND:X(q:List(D) = [d1])`.
    pub fn state_to_string(&self, state: &State) -> Result<String> {
        let v = self.variable(&state.variable)?;
        let params = v
            .signatures
            .iter()
            .zip(&state.values)
            .map(|(s, value)| format!("{} = {}", s, value))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("{}:{}({})", v.owner, state.variable, params))
    }
}

fn extend_bound(bound: &BTreeSet<String>, vars: &[Variable]) -> BTreeSet<String> {
    let mut result = bound.clone();
    result.extend(vars.iter().map(Variable::signature));
    result
}

fn data_signatures(t: &DataTerm) -> impl Iterator<Item = String> {
    t.free_variables().into_iter().map(|v| v.signature())
}

/// Checks if a boolean constant may be a successor along `e`.
pub fn tf(e: &Expr) -> bool {
    match e {
        Expr::PropVar(_) => false,
        Expr::Data(_) => true,
        Expr::Not(x) | Expr::Forall(_, x) | Expr::Exists(_, x) => tf(x),
        Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => tf(l) || tf(r),
    }
}

/// Number of instantiations in `e`; `usize::MAX` if an instantiation occurs under a quantifier.
pub fn count_variables(e: &Expr) -> usize {
    match e {
        Expr::PropVar(_) => 1,
        Expr::Data(_) => 0,
        Expr::Not(x) => count_variables(x),
        Expr::And(l, r) | Expr::Or(l, r) | Expr::Imp(l, r) => {
            count_variables(l).saturating_add(count_variables(r))
        }
        Expr::Forall(_, body) | Expr::Exists(_, body) => {
            if count_variables(body) > 0 {
                usize::MAX
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::data::{DataSpec, Sort};
    use crate::eval::Evaluator;
    use crate::pbes::Equation;

    fn nat(name: &str) -> Variable {
        Variable::new(name, Sort::Nat)
    }

    fn analyze(pbes: &Pbes, options: ExplorerOptions) -> LtsInfo {
        let rewriter = Evaluator::new(pbes.data.clone());
        LtsInfo::new(pbes, &rewriter, &options).unwrap()
    }

    /// nu X(n: Nat) = (n < 3 || Y(n, 0)) && X(n)
    /// mu Y(n: Nat, m: Nat) = Z(n) || Z(n + m)
    /// mu Z(n: Nat) = Z(n)
    fn example() -> Pbes {
        let (n, m) = (nat("n"), nat("m"));
        let x = Equation::new(
            FixpointSymbol::Nu,
            PropVar::new("X", vec![n.clone()]),
            Expr::and(
                Expr::or(
                    Expr::data(DataTerm::less(n.clone().into(), DataTerm::int(3))),
                    Expr::propvar("Y", vec![n.clone().into(), DataTerm::int(0)]),
                ),
                Expr::propvar("X", vec![n.clone().into()]),
            ),
        );
        let y = Equation::new(
            FixpointSymbol::Mu,
            PropVar::new("Y", vec![n.clone(), m.clone()]),
            Expr::or(
                Expr::propvar("Z", vec![n.clone().into()]),
                Expr::propvar("Z", vec![DataTerm::plus(n.clone().into(), m.clone().into())]),
            ),
        );
        let z = Equation::new(
            FixpointSymbol::Mu,
            PropVar::new("Z", vec![n.clone()]),
            Expr::propvar("Z", vec![n.clone().into()]),
        );
        Pbes::new(DataSpec::new(), vec![x, y, z], PropVarInst::new("X", vec![DataTerm::int(0)]))
    }

    #[test]
    fn test_lts_type() {
        let info = analyze(&example(), ExplorerOptions::default());
        let t = info.lts_type();
        println!("{}", t);
        assert_eq!(t.state_names(), ["var", "n:Nat", "m:Nat"]);
        assert_eq!(t.number_of_state_types(), 2);
        assert_eq!(info.default_value(1).unwrap(), &DataTerm::int(0));
        assert_eq!(info.index_of("m:Nat").unwrap(), 1);
        assert_eq!(info.index_of("k:Nat"), Err(Error::index("signature", "k:Nat")));
    }

    #[test]
    fn test_priorities_and_groups() {
        let info = analyze(&example(), ExplorerOptions::default());
        for (i, g) in info.groups().iter().enumerate() {
            println!("group {}: {} {} {}", i, g.owner, g.variable, g.formula);
        }
        assert_eq!(info.variable("true").unwrap().priority, 0);
        assert_eq!(info.variable("false").unwrap().priority, 1);
        assert_eq!(info.variable("X").unwrap().priority, 2);
        assert_eq!(info.variable("Y").unwrap().priority, 3);
        assert_eq!(info.variable("Z").unwrap().priority, 3);
        assert_eq!(info.variable("X").unwrap().owner, Owner::And);

        // X has a guarded part, Y has a part that changes n, and Z only passes n on to itself:
        // none of them is split.
        let names: Vec<&str> = info.groups().iter().map(|g| g.variable.as_str()).collect();
        assert_eq!(names, vec!["true", "false", "X", "Y", "Z"]);
    }

    #[test]
    fn test_dependency_matrix() {
        let info = analyze(&example(), ExplorerOptions::default());
        for row in info.matrix() {
            println!("{:?}", row);
        }
        // sinks only read the variable slot
        assert_eq!(info.read_matrix()[0], vec![true, false, false]);
        assert_eq!(info.write_matrix()[1], vec![false, false, false]);

        // X: reads n, may move to true and Y, writes m (set to 0)
        assert_eq!(info.dependency(2, 0).unwrap(), (true, true));
        assert_eq!(info.dependency(2, 1).unwrap(), (true, false));
        assert_eq!(info.dependency(2, 2).unwrap(), (false, true));

        // Y: reads n and m, writes n (n + m), m is not a parameter of Z
        assert_eq!(info.dependency(3, 1).unwrap(), (true, true));
        assert_eq!(info.dependency(3, 2).unwrap(), (true, false));

        // Z: self loop without changes
        assert_eq!(info.dependency(4, 0).unwrap(), (true, false));
        assert_eq!(info.dependency(4, 1).unwrap(), (false, false));

        assert_eq!(info.dependency(5, 0), Err(Error::index("group", 5)));
    }

    #[test]
    fn test_reset_option() {
        let options = ExplorerOptions {
            reset: true,
            ..ExplorerOptions::default()
        };
        let info = analyze(&example(), options);
        // Y moves to Z, which has no m: m is reset
        assert_eq!(info.dependency(3, 2).unwrap(), (true, true));
    }

    #[test]
    fn test_pass_through_inlining() {
        // nu X(n: Nat) = A(n) && B(n);  nu A(n: Nat) = n > 0 || X(n);  nu B(n: Nat) = X(n + 1)
        let n = nat("n");
        let x = Equation::new(
            FixpointSymbol::Nu,
            PropVar::new("X", vec![n.clone()]),
            Expr::and(
                Expr::propvar("A", vec![n.clone().into()]),
                Expr::propvar("B", vec![n.clone().into()]),
            ),
        );
        let a = Equation::new(
            FixpointSymbol::Nu,
            PropVar::new("A", vec![n.clone()]),
            Expr::or(
                Expr::data(DataTerm::greater(n.clone().into(), DataTerm::int(0))),
                Expr::propvar("X", vec![n.clone().into()]),
            ),
        );
        let b = Equation::new(
            FixpointSymbol::Nu,
            PropVar::new("B", vec![n.clone()]),
            Expr::propvar("X", vec![DataTerm::plus(n.clone().into(), DataTerm::int(1))]),
        );
        let p = Pbes::new(DataSpec::new(), vec![x, a, b], PropVarInst::new("X", vec![DataTerm::int(0)]));
        let info = analyze(&p, ExplorerOptions::default());
        let x_groups: Vec<String> = info.groups_of("X").map(|(_, g)| g.formula.to_string()).collect();
        println!("{:?}", x_groups);
        assert_eq!(x_groups, vec!["((n > 0) || X(n))", "X((n + 1))"]);
        // A and B no longer occur once inlined, so they get no groups
        assert_eq!(info.number_of_groups(), 4);
    }

    #[test]
    fn test_count_variables() {
        let n = nat("n");
        let x = Expr::propvar("X", vec![n.clone().into()]);
        assert_eq!(count_variables(&Expr::and(x.clone(), x.clone())), 2);
        assert_eq!(count_variables(&Expr::forall(vec![n.clone()], x.clone())), usize::MAX);
        assert_eq!(
            count_variables(&Expr::and(Expr::forall(vec![n], x.clone()), x)),
            usize::MAX
        );
    }

    #[test]
    fn test_not_ppg() {
        let x = Equation::new(
            FixpointSymbol::Nu,
            PropVar::new("X", vec![]),
            Expr::and(
                Expr::propvar("X", vec![]),
                Expr::or(Expr::propvar("X", vec![]), Expr::propvar("X", vec![])),
            ),
        );
        let p = Pbes::new(DataSpec::new(), vec![x], PropVarInst::new("X", vec![]));
        let rewriter = Evaluator::new(DataSpec::new());
        let result = LtsInfo::new(&p, &rewriter, &ExplorerOptions::default());
        assert!(matches!(result, Err(Error::Validation { .. })));
    }
}
