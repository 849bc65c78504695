use std::collections::BTreeSet;

use test_log::test;

use ppg_rs::classify::is_ppg;
use ppg_rs::data::{DataSpec, DataTerm, Sort, Variable};
use ppg_rs::eval::Evaluator;
use ppg_rs::explorer::{Explorer, ExplorerOptions, StateSpace};
use ppg_rs::expr::{Expr, PropVarInst};
use ppg_rs::pbes::{Equation, FixpointSymbol, Pbes, PropVar};
use ppg_rs::ppg::to_ppg;

fn d() -> Sort {
    Sort::named("D")
}

fn data() -> DataSpec {
    DataSpec::new().with_struct("D", ["d1", "d2"])
}

fn empty() -> DataTerm {
    DataTerm::empty_list(d())
}

/// nu X(q: List(D)) = (#q < 2 || q != []) && (forall d: D. #q >= 2 || X(q <| d)) && (q == [] || X(tail(q)))
fn buffer() -> Pbes {
    let q = Variable::new("q", Sort::list(d()));
    let dv = Variable::new("d", d());
    let qt: DataTerm = q.clone().into();
    let len = || DataTerm::length(qt.clone());

    let x = Equation::new(
        FixpointSymbol::Nu,
        PropVar::new("X", vec![q.clone()]),
        Expr::and(
            Expr::and(
                Expr::or(
                    Expr::data(DataTerm::less(len(), DataTerm::int(2))),
                    Expr::data(DataTerm::not_equal(qt.clone(), empty())),
                ),
                Expr::forall(
                    vec![dv.clone()],
                    Expr::or(
                        Expr::data(DataTerm::greater_eq(len(), DataTerm::int(2))),
                        Expr::propvar("X", vec![DataTerm::snoc(qt.clone(), dv.clone().into())]),
                    ),
                ),
            ),
            Expr::or(
                Expr::data(DataTerm::equal(qt.clone(), empty())),
                Expr::propvar("X", vec![DataTerm::tail(qt.clone())]),
            ),
        ),
    );
    Pbes::new(data(), vec![x], PropVarInst::new("X", vec![empty()]))
}

/// Buffer that reads a datum `e` and then has to deliver it:
///
/// ```text
/// nu X(q: List(D)) = (forall d: D. #q >= 2 || X(q <| d))
///                 && (forall d: D. #q >= 2 || Y(q <| d, d))
///                 && (q == [] || X(tail(q)))
/// mu Y(q: List(D), e: D) = (forall d: D. #q >= 2 || Y(q <| d, e))
///                       && (q == [] || Z(tail(q), e, head(q) == e))
/// mu Z(q: List(D), e: D, b: Bool) = b || Y(q, e)
/// ```
fn delivery() -> Pbes {
    let q = Variable::new("q", Sort::list(d()));
    let e = Variable::new("e", d());
    let b = Variable::new("b", Sort::Bool);
    let dv = Variable::new("d", d());
    let qt: DataTerm = q.clone().into();
    let et: DataTerm = e.clone().into();
    let full = || Expr::data(DataTerm::greater_eq(DataTerm::length(qt.clone()), DataTerm::int(2)));
    let is_empty = || Expr::data(DataTerm::equal(qt.clone(), empty()));
    let read = |name: &str, extra: Vec<DataTerm>| {
        let mut args = vec![DataTerm::snoc(qt.clone(), dv.clone().into())];
        args.extend(extra);
        Expr::forall(vec![dv.clone()], Expr::or(full(), Expr::propvar(name, args)))
    };

    let x = Equation::new(
        FixpointSymbol::Nu,
        PropVar::new("X", vec![q.clone()]),
        Expr::and(
            Expr::and(read("X", vec![]), read("Y", vec![dv.clone().into()])),
            Expr::or(is_empty(), Expr::propvar("X", vec![DataTerm::tail(qt.clone())])),
        ),
    );
    let y = Equation::new(
        FixpointSymbol::Mu,
        PropVar::new("Y", vec![q.clone(), e.clone()]),
        Expr::and(
            read("Y", vec![et.clone()]),
            Expr::or(
                is_empty(),
                Expr::propvar(
                    "Z",
                    vec![
                        DataTerm::tail(qt.clone()),
                        et.clone(),
                        DataTerm::equal(DataTerm::head(qt.clone()), et.clone()),
                    ],
                ),
            ),
        ),
    );
    let z = Equation::new(
        FixpointSymbol::Mu,
        PropVar::new("Z", vec![q.clone(), e.clone(), b.clone()]),
        Expr::or(Expr::data(b.into()), Expr::propvar("Y", vec![qt.clone(), et.clone()])),
    );
    Pbes::new(data(), vec![x, y, z], PropVarInst::new("X", vec![empty()]))
}

/// Two alternating variables whose normal form needs fresh equations below quantifiers:
///
/// ```text
/// mu X(b: Bool) = (exists d: D. Y(d) && X(b)) || (b && forall d: D. Y(d) || X(!b))
/// nu Y(d: D) = (d == d1 => X(true)) && (Y(d) || X(false))
/// ```
fn mixed() -> Pbes {
    let b = Variable::new("b", Sort::Bool);
    let dv = Variable::new("d", d());
    let bt: DataTerm = b.clone().into();
    let y_d = || Expr::propvar("Y", vec![dv.clone().into()]);
    let x = Equation::new(
        FixpointSymbol::Mu,
        PropVar::new("X", vec![b.clone()]),
        Expr::or(
            Expr::exists(vec![dv.clone()], Expr::and(y_d(), Expr::propvar("X", vec![bt.clone()]))),
            Expr::and(
                Expr::data(bt.clone()),
                Expr::forall(
                    vec![dv.clone()],
                    Expr::or(y_d(), Expr::propvar("X", vec![DataTerm::negate(bt.clone())])),
                ),
            ),
        ),
    );
    let y = Equation::new(
        FixpointSymbol::Nu,
        PropVar::new("Y", vec![dv.clone()]),
        Expr::and(
            Expr::imp(
                Expr::data(DataTerm::equal(dv.clone().into(), DataTerm::constant("d1", d()))),
                Expr::propvar("X", vec![DataTerm::Bool(true)]),
            ),
            Expr::or(y_d(), Expr::propvar("X", vec![DataTerm::Bool(false)])),
        ),
    );
    Pbes::new(data(), vec![x, y], PropVarInst::new("X", vec![DataTerm::Bool(false)]))
}

/// Every combination of `reset` and `always_split`.
fn all_options() -> Vec<ExplorerOptions> {
    let mut result = Vec::new();
    for reset in [false, true] {
        for always_split in [false, true] {
            result.push(ExplorerOptions {
                reset,
                always_split,
                ..ExplorerOptions::default()
            });
        }
    }
    result
}

fn explorer(pbes: &Pbes, options: ExplorerOptions) -> Explorer<Evaluator> {
    let ppg = to_ppg(pbes).unwrap();
    assert!(is_ppg(&ppg));
    Explorer::new(&ppg, Evaluator::new(pbes.data.clone()), options).unwrap()
}

/// All reachable state vectors.
fn reachable(explorer: &mut Explorer<Evaluator>) -> Vec<Vec<usize>> {
    let mut seen = BTreeSet::new();
    let mut queue = vec![explorer.initial_state().unwrap()];
    let mut result = Vec::new();
    while let Some(src) = queue.pop() {
        if !seen.insert(src.clone()) {
            continue;
        }
        explorer
            .next_state_all(&src, |dst| queue.push(dst.to_vec()))
            .unwrap();
        result.push(src);
    }
    result
}

#[test]
fn test_buffer() {
    let pbes = buffer();
    println!("{}", pbes);
    let mut explorer = explorer(&pbes, ExplorerOptions::default());
    println!("{}", explorer.info().lts_type());
    for (i, g) in explorer.info().groups().iter().enumerate() {
        println!("group {}: {} {}", i, g.variable, g.formula);
    }

    assert_eq!(explorer.state_length(), 2);
    assert_eq!(explorer.info().number_of_groups(), 3);
    let space = explorer.explore(None).unwrap();
    assert_eq!(space, StateSpace { states: 7, transitions: 12 });
    assert_eq!(explorer.explore_grouped(None).unwrap(), space);
}

#[test]
fn test_buffer_successors() {
    let pbes = buffer();
    let explorer = explorer(&pbes, ExplorerOptions::default());
    let init = explorer.get_initial_state().unwrap();
    assert_eq!(explorer.info().state_to_string(&init).unwrap(), "AND:X(q:List(D) = [])");

    let succ: Vec<String> = explorer
        .get_successors(&init)
        .unwrap()
        .iter()
        .map(|s| s.to_string())
        .collect();
    println!("{:?}", succ);
    assert_eq!(succ, vec!["X([d1])", "X([d2])"]);
}

#[test]
fn test_delivery() {
    let pbes = delivery();
    let options = ExplorerOptions {
        reset: true,
        ..ExplorerOptions::default()
    };
    let mut explorer = explorer(&pbes, options);
    println!("{}", explorer.info().lts_type());
    for row in explorer.info().matrix() {
        println!("{:?}", row);
    }

    assert_eq!(explorer.state_length(), 4);
    assert_eq!(explorer.info().lts_type().number_of_state_types(), 4);
    assert_eq!(explorer.info().number_of_groups(), 5);

    // With E the datum being delivered and O the other one:
    // - X: the 7 lists of length at most 2
    // - Y: Y([E], E), Y([E, E], E), Y([E, O], E), Y([O, E], E)
    // - Z: Z([], E, true), Z([E], E, true), Z([O], E, true), Z([E], E, false)
    // - the sink `true`
    // giving 7 + 2 * 4 + 2 * 4 + 1 = 24 states.
    //
    // X([]) has 2 + 2 successors, each X([a]) 2 + 2 + 1 and each full X(q) only its tail:
    // 4 + 10 + 4 = 18. Y([E], E) has 3 successors and the other Y states one each, 6 per
    // datum. Every Z state has one successor. With the loop on `true`: 18 + 12 + 8 + 1 = 39.
    let space = explorer.explore(None).unwrap();
    assert_eq!(space, StateSpace { states: 24, transitions: 39 });
    assert_eq!(explorer.explore_grouped(None).unwrap(), space);
}

#[test]
fn test_delivery_without_reset() {
    let mut explorer = explorer(&delivery(), ExplorerOptions::default());
    // `true` keeps the parameter values of each of the six Z states leading to it, and each
    // of these vectors has its own loop: 24 + 5 states and 39 + 5 transitions
    let space = explorer.explore(None).unwrap();
    assert_eq!(space, StateSpace { states: 29, transitions: 44 });
}

#[test]
fn test_delivery_priorities() {
    let explorer = explorer(&delivery(), ExplorerOptions::default());
    let info = explorer.info();
    assert_eq!(info.variable("X").unwrap().priority, 2);
    assert_eq!(info.variable("Y").unwrap().priority, 3);
    assert_eq!(info.variable("Z").unwrap().priority, 3);

    let mut explorer = explorer;
    let init = explorer.initial_state().unwrap();
    assert_eq!(explorer.state_label(0, &init).unwrap(), 2);
    assert_eq!(explorer.state_label(1, &init).unwrap(), 1);
}

#[test]
fn test_grouped_successors_agree() {
    for pbes in [delivery(), mixed()] {
        for options in all_options() {
            println!("{:?}", options);
            let mut explorer = explorer(&pbes, options);
            for src in reachable(&mut explorer) {
                let mut all = BTreeSet::new();
                explorer
                    .next_state_all(&src, |dst| {
                        all.insert(dst.to_vec());
                    })
                    .unwrap();
                let mut grouped = BTreeSet::new();
                for group in 0..explorer.info().number_of_groups() {
                    explorer
                        .next_state_long(&src, group, |dst, g| {
                            assert_eq!(g, group);
                            grouped.insert(dst.to_vec());
                        })
                        .unwrap();
                }
                assert_eq!(all, grouped, "successors of {:?}", explorer.from_state_vector(&src).unwrap());
            }
        }
    }
}

#[test]
fn test_write_dependencies() {
    // A slot that is not write-dependent for a group keeps its value along that group
    for pbes in [delivery(), mixed()] {
        for options in all_options() {
            println!("{:?}", options);
            let mut explorer = explorer(&pbes, options);
            let states = reachable(&mut explorer);
            assert!(states.len() > 1);
            for src in states {
                for group in 0..explorer.info().number_of_groups() {
                    let write = explorer.info().write_matrix()[group].clone();
                    let mut successors = Vec::new();
                    explorer
                        .next_state_long(&src, group, |dst, _| successors.push(dst.to_vec()))
                        .unwrap();
                    for dst in successors {
                        for (slot, &w) in write.iter().enumerate() {
                            if !w {
                                assert_eq!(src[slot], dst[slot], "{:?} group {} slot {}", options, group, slot);
                            }
                        }
                    }
                }
            }
        }
    }
}
