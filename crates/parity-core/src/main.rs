//! Parity simulation runner
//!
//! Loads a scenario from TOML, runs it to completion and writes the round
//! log and final snapshot.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use thiserror::Error;

use parity_core::{
    build_scenario, default_config_toml, write_snapshot, ConfigError, LogError, RoundLogger,
    RunOptions, SetupError, SimulationConfig, StrategyRegistry,
};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "parity_sim")]
#[command(about = "Round-based opinion dynamics over networked communities")]
struct Args {
    /// Scenario file; the built-in example scenario when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed, overriding the scenario's
    #[arg(long)]
    seed: Option<u64>,

    /// Round cap, overriding the scenario's max_rounds
    #[arg(long)]
    rounds: Option<u64>,

    /// Write every round record to this JSONL file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write the final population snapshot to this JSON file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print the example scenario and exit
    #[arg(long)]
    print_default_config: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Log(#[from] LogError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("parity_core=info")),
        )
        .init();

    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_toml());
        return;
    }

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::from_str(&default_config_toml())?,
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(rounds) = args.rounds {
        config.simulation.max_rounds = rounds;
    }

    println!("Parity Simulation");
    println!("=================");
    println!("Seed: {}", config.simulation.seed);
    println!("Max rounds: {}", config.simulation.max_rounds);
    println!(
        "Handler: {}, completion: {}",
        config.handler.kind, config.completion.kind
    );
    println!();

    let registry = StrategyRegistry::with_builtins();
    let mut scenario = build_scenario(&config, &registry)?;

    let mut logger = match &args.events {
        Some(path) => RoundLogger::new(path)?,
        None => RoundLogger::null(),
    };

    let options = RunOptions::default().with_max_rounds(scenario.max_rounds);
    let mut log_error = None;
    let summary = scenario.population.run(
        scenario.handler.as_ref(),
        scenario.completion.as_mut(),
        &options,
        |record| {
            if log_error.is_none() {
                if let Err(e) = logger.log(record) {
                    log_error = Some(e);
                }
            }
            if record.round % 100 == 0 {
                println!(
                    "[Round {:>6}] {} pairs, coordination {:.2}",
                    record.round,
                    record.pair_count(),
                    record.coordination_rate()
                );
            }
        },
    );
    if let Some(e) = log_error {
        return Err(e.into());
    }
    logger.flush()?;

    println!();
    println!(
        "Finished after {} rounds ({:?}): {} pairings, {} anomalies",
        summary.rounds, summary.stop_reason, summary.total_pairings, summary.total_anomalies
    );
    for community in scenario.population.communities() {
        match community.mean_opinion() {
            Some(mean) => println!("  {:<16} mean opinion {:.3}", community.name(), mean),
            None => println!("  {:<16} (empty)", community.name()),
        }
    }

    if let Some(path) = &args.snapshot {
        write_snapshot(path, &scenario.population.snapshot())?;
        println!("Wrote snapshot to {}", path.display());
    }

    Ok(())
}
