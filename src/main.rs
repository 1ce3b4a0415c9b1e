//! VPP dispatch entry point: CLI wiring around scenario loading and evaluation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vpp_dispatch::dispatch::{DispatchProblem, Problem};
use vpp_dispatch::io::export::{export_decision_csv, export_steps_csv, import_candidate_csv};
use vpp_dispatch::report::DispatchReport;
use vpp_dispatch::sampling::screen_random_candidates;
use vpp_dispatch::scenario::Scenario;

/// Evaluate dispatch candidates for a virtual power plant.
#[derive(Parser)]
#[command(name = "vpp-dispatch", version, about)]
struct Cli {
    /// Scenario TOML file
    #[arg(short, long)]
    scenario: PathBuf,
    /// Log filter, e.g. `info` or `vpp_dispatch=debug`
    #[arg(long, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the bounds of every decision variable.
    Bounds,
    /// Evaluate one candidate read from CSV.
    Evaluate {
        /// CSV with one value per row (or the long decision format)
        #[arg(short, long)]
        candidate: PathBuf,
        /// Write per-step balances to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Evaluate random candidates within bounds and report the best.
    Sample {
        /// Number of candidates
        #[arg(short = 'n', long, default_value_t = 100)]
        count: usize,
        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Write per-step balances of the best candidate to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Write the best candidate in long decision format
        #[arg(long)]
        candidate_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let scenario = Scenario::load(&cli.scenario)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;
    println!("{}", scenario.sizing);
    println!();
    let problem = scenario
        .into_problem()
        .context("binding scenario to dispatch problem")?;

    match cli.command {
        Commands::Bounds => print_bounds(&problem),
        Commands::Evaluate { candidate, export } => {
            evaluate(&problem, &candidate, export.as_deref())
        }
        Commands::Sample {
            count,
            seed,
            export,
            candidate_out,
        } => sample(
            &problem,
            count,
            seed,
            export.as_deref(),
            candidate_out.as_deref(),
        ),
    }
}

fn print_bounds(problem: &DispatchProblem) -> Result<()> {
    let bounds = problem.bounds();
    println!(
        "{} variables ({} continuous, {} binary), {} equality, {} inequality",
        problem.n_var(),
        problem.layout().n_continuous(),
        problem.layout().n_binary(),
        problem.n_eq(),
        problem.n_ieq()
    );
    for k in 0..bounds.len() {
        let name = problem
            .layout()
            .describe(k)
            .map_or_else(|| format!("x[{k}]"), |v| v.to_string());
        println!(
            "{k:>5}  {name:<20} [{:.6}, {:.6}]",
            bounds.lower[k], bounds.upper[k]
        );
    }
    Ok(())
}

fn evaluate(problem: &DispatchProblem, candidate: &Path, export: Option<&Path>) -> Result<()> {
    let x = import_candidate_csv(candidate)
        .with_context(|| format!("reading candidate {}", candidate.display()))?;
    if x.len() != problem.n_var() {
        bail!(
            "candidate {} has {} values, expected {}",
            candidate.display(),
            x.len(),
            problem.n_var()
        );
    }
    let decision = problem.decompose(&x)?;
    let report = DispatchReport::new(problem, &decision)?;
    println!("Objective:             {:.6}", report.evaluation.objective);
    println!("{report}");

    if let Some(path) = export {
        export_steps_csv(&report.steps, path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "step balances exported");
    }
    Ok(())
}

fn sample(
    problem: &DispatchProblem,
    count: usize,
    seed: u64,
    export: Option<&Path>,
    candidate_out: Option<&Path>,
) -> Result<()> {
    let Some(best) = screen_random_candidates(problem, count, seed)? else {
        bail!("--count must be at least 1");
    };
    let decision = problem.decompose(&best.candidate)?;
    let report = DispatchReport::new(problem, &decision)?;
    println!(
        "Best of {} candidates (seed {seed}): objective {:.6}",
        best.evaluated, report.evaluation.objective
    );
    println!("{report}");

    if let Some(path) = export {
        export_steps_csv(&report.steps, path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "step balances exported");
    }
    if let Some(path) = candidate_out {
        export_decision_csv(&decision, problem.layout(), path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "candidate exported");
    }
    Ok(())
}
