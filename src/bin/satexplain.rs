use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use satexplain::cnf::dimacs::load_annotated_dimacs;
use satexplain::cnf::store::{ClauseStore, ClauseView, Lit};
use satexplain::report::{explain_with_mus, Report};
use satexplain::sat::dpll::{solve, SearchResult};
use satexplain::sat::{AbortSignal, SolverStats};

const EXIT_SAT: i32 = 0;
const EXIT_UNSAT: i32 = 1;
const EXIT_MALFORMED: i32 = 2;
const EXIT_INTERNAL: i32 = 3;
const EXIT_CANCELLED: i32 = 4;

#[derive(Debug, Parser)]
#[command(name = "satexplain")]
#[command(about = "Explain why a CNF is unsatisfiable under assumptions")]
struct Cli {
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Load a CNF and print its dimensions
    Parse {
        #[arg(long)]
        cnf: String,
    },
    /// Report SAT/UNSAT and a model when one exists
    Solve {
        #[arg(long)]
        cnf: String,
        #[arg(long = "assume", value_name = "LIT")]
        assumptions: Vec<i32>,
        #[arg(long = "hint", value_name = "LIT")]
        hints: Vec<i32>,
    },
    /// Emit the full JSON explanation report
    Explain {
        #[arg(long)]
        cnf: String,
        #[arg(long = "assume", value_name = "LIT")]
        assumptions: Vec<i32>,
        #[arg(long = "hint", value_name = "LIT")]
        hints: Vec<i32>,
        #[arg(long)]
        pretty: bool,
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },
}

fn main() {
    let cli = Cli::parse();
    configure_logging(cli.verbose);
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    match cli.command {
        Cmd::Parse { cnf } => parse_cmd(&cnf),
        Cmd::Solve {
            cnf,
            assumptions,
            hints,
        } => solve_cmd(&cnf, &assumptions, &hints),
        Cmd::Explain {
            cnf,
            assumptions,
            hints,
            pretty,
            timeout_ms,
        } => explain_cmd(&cnf, &assumptions, &hints, pretty, timeout_ms),
    }
}

fn parse_cmd(path: &str) -> i32 {
    let store = match load_annotated_dimacs(path) {
        Ok(store) => store,
        Err(err) => return input_error(err),
    };
    let annotated = store.iter().filter(|c| !c.rule_id.is_empty()).count();
    println!(
        "vars={} clauses={} annotated={}",
        store.num_vars(),
        store.len(),
        annotated
    );
    EXIT_SAT
}

fn solve_cmd(path: &str, assumptions: &[i32], hints: &[i32]) -> i32 {
    let (store, assumptions, hints) = match load_inputs(path, assumptions, hints) {
        Ok(v) => v,
        Err(err) => return input_error(err),
    };
    let view = ClauseView::full(&store);
    let hint_vars: Vec<u32> = hints.iter().map(|lit| lit.var).collect();
    let mut stats = SolverStats::default();
    let abort = AbortSignal::new();
    match solve(&view, &assumptions, &hint_vars, &abort, &mut stats) {
        Ok(SearchResult::Sat(model)) => {
            println!("s SATISFIABLE");
            let mut line = String::from("v");
            for (var, value) in &model {
                let lit = if *value { *var as i32 } else { -(*var as i32) };
                line.push_str(&format!(" {lit}"));
            }
            line.push_str(" 0");
            println!("{line}");
            EXIT_SAT
        }
        Ok(SearchResult::Unsat(_)) => {
            println!("s UNSATISFIABLE");
            EXIT_UNSAT
        }
        Ok(SearchResult::Cancelled) => EXIT_CANCELLED,
        Err(err) => internal_error(err),
    }
}

fn explain_cmd(
    path: &str,
    assumptions: &[i32],
    hints: &[i32],
    pretty: bool,
    timeout_ms: Option<u64>,
) -> i32 {
    let (store, assumptions, hints) = match load_inputs(path, assumptions, hints) {
        Ok(v) => v,
        Err(err) => return input_error(err),
    };

    let abort = AbortSignal::new();
    if let Some(ms) = timeout_ms {
        let watchdog = abort.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(ms));
            watchdog.abort();
        });
    }

    let outcome = match explain_with_mus(&store, &assumptions, &hints, &abort) {
        Ok(outcome) => outcome,
        Err(err) => return internal_error(err),
    };
    let json = if pretty {
        serde_json::to_string_pretty(&outcome.report)
    } else {
        serde_json::to_string(&outcome.report)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(err) => return internal_error(err.into()),
    }
    log::debug!(
        "solve_calls={} decisions={} propagations={} conflicts={}",
        outcome.stats.solve_calls,
        outcome.stats.decisions,
        outcome.stats.propagations,
        outcome.stats.conflicts
    );
    match outcome.report {
        Report::Sat { .. } => EXIT_SAT,
        Report::UnsatWithCore { .. } => EXIT_UNSAT,
        Report::Cancelled => EXIT_CANCELLED,
    }
}

fn load_inputs(
    path: &str,
    assumptions: &[i32],
    hints: &[i32],
) -> Result<(ClauseStore, Vec<Lit>, Vec<Lit>)> {
    let store = load_annotated_dimacs(path)?;
    let assumptions = lits_from(assumptions, "assumption")?;
    let hints = lits_from(hints, "hint")?;
    Ok((store, assumptions, hints))
}

fn lits_from(values: &[i32], what: &str) -> Result<Vec<Lit>> {
    values
        .iter()
        .map(|&value| {
            Lit::from_dimacs(value).ok_or_else(|| anyhow::anyhow!("{what} literal must be nonzero"))
        })
        .collect()
}

fn input_error(err: anyhow::Error) -> i32 {
    eprintln!("error: {err:#}");
    EXIT_MALFORMED
}

fn internal_error(err: anyhow::Error) -> i32 {
    eprintln!("internal error: {err:#}");
    EXIT_INTERNAL
}

fn configure_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}
