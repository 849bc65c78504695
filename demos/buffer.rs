use clap::Parser;

use ppg_rs::classify::is_ppg;
use ppg_rs::data::{DataSpec, DataTerm, Sort, Variable};
use ppg_rs::eval::Evaluator;
use ppg_rs::explorer::{Explorer, ExplorerOptions};
use ppg_rs::expr::{Expr, PropVarInst};
use ppg_rs::pbes::{Equation, FixpointSymbol, Pbes, PropVar};
use ppg_rs::ppg::to_ppg;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Capacity of the buffer.
    #[arg(value_name = "INT", default_value = "2")]
    capacity: i64,

    /// Number of data values.
    #[clap(long, value_name = "INT", default_value = "2")]
    domain: usize,

    /// Reset state-vector slots that are not parameters of the current variable.
    #[clap(long)]
    reset: bool,

    /// Split every conjunction and disjunction into transition groups.
    #[clap(long)]
    always_split: bool,

    /// Stop exploring after this many states.
    #[clap(long, value_name = "INT")]
    limit: Option<usize>,
}

/// nu X(q: List(D)) = (#q < c || q != []) && (forall d: D. #q >= c || X(q <| d)) && (q == [] || X(tail(q)))
fn buffer(capacity: i64, domain: usize) -> Pbes {
    let d = Sort::named("D");
    let data = DataSpec::new().with_struct("D", (1..=domain).map(|i| format!("d{}", i)));
    let q = Variable::new("q", Sort::list(d.clone()));
    let dv = Variable::new("d", d.clone());
    let qt: DataTerm = q.clone().into();
    let empty = DataTerm::empty_list(d);
    let len = || DataTerm::length(qt.clone());

    let x = Equation::new(
        FixpointSymbol::Nu,
        PropVar::new("X", vec![q]),
        Expr::join_and([
            Expr::or(
                Expr::data(DataTerm::less(len(), DataTerm::int(capacity))),
                Expr::data(DataTerm::not_equal(qt.clone(), empty.clone())),
            ),
            Expr::forall(
                vec![dv.clone()],
                Expr::or(
                    Expr::data(DataTerm::greater_eq(len(), DataTerm::int(capacity))),
                    Expr::propvar("X", vec![DataTerm::snoc(qt.clone(), dv.into())]),
                ),
            ),
            Expr::or(
                Expr::data(DataTerm::equal(qt.clone(), empty.clone())),
                Expr::propvar("X", vec![DataTerm::tail(qt.clone())]),
            ),
        ]),
    );
    Pbes::new(data, vec![x], PropVarInst::new("X", vec![empty]))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let pbes = buffer(args.capacity, args.domain);
    println!("{}", pbes);

    let ppg = to_ppg(&pbes)?;
    assert!(is_ppg(&ppg));
    println!("{}", ppg);

    let options = ExplorerOptions {
        reset: args.reset,
        always_split: args.always_split,
        ..ExplorerOptions::default()
    };
    let mut explorer = Explorer::new(&ppg, Evaluator::new(pbes.data.clone()), options)?;
    let info = explorer.info();
    println!("LTS type: {}", info.lts_type());
    for (i, g) in info.groups().iter().enumerate() {
        let row: String = info.matrix()[i]
            .iter()
            .zip(&info.read_matrix()[i])
            .zip(&info.write_matrix()[i])
            .map(|((&m, &r), &w)| match (m, r, w) {
                (false, _, _) => '-',
                (_, true, true) => '+',
                (_, true, false) => 'r',
                _ => 'w',
            })
            .collect();
        println!("group {:>3}: {} {:<5} {} {}", i, row, g.owner, g.variable, g.formula);
    }

    let space = explorer.explore(args.limit)?;
    println!("states = {}, transitions = {}", space.states, space.transitions);

    let time_total = time_total.elapsed();
    println!("Total time: {:.3} s", time_total.as_secs_f64());

    Ok(())
}
