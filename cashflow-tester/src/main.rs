//! Headless QA driver: plays full Cash Flow games through the public engine
//! API and reports aggregate results.

mod bot;
mod report;
mod simulation;

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use bot::BotStrategy;
use report::{print_console_report, summarize, write_json_report};
use simulation::{SimulationConfig, run_simulation};

#[derive(Debug, Parser)]
#[command(name = "cashflow-tester", version)]
#[command(about = "Automated simulation runs against the Cash Flow game engine")]
struct Args {
    /// Number of games to simulate
    #[arg(long, default_value_t = 20)]
    games: u64,

    /// Base seed; game N runs with seed base + N
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Players seated per game (2-6)
    #[arg(long, default_value_t = 4)]
    players: usize,

    /// Bot spending strategy
    #[arg(long, value_enum, default_value_t = BotStrategy::Balanced)]
    strategy: BotStrategy,

    /// Turn cap per game before declaring a stalemate
    #[arg(long, default_value_t = 500)]
    max_turns: u32,

    /// Print per-game lines in addition to the summary
    #[arg(short, long)]
    verbose: bool,

    /// Also write the full batch (summary + per-game outcomes) as JSON
    #[arg(long)]
    json_output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(usize::try_from(args.games).unwrap_or_default());
    for n in 0..args.games {
        let mut config = SimulationConfig::new(args.seed + n, args.players, args.strategy);
        config.max_turns = args.max_turns;
        let outcome = run_simulation(config)?;
        log::info!(
            "seed {} done: {} turns, winner {:?}",
            outcome.seed,
            outcome.turns_played,
            outcome.winner
        );
        outcomes.push(outcome);
    }

    let summary = summarize(&outcomes);
    print_console_report(&outcomes, &summary, started.elapsed(), args.verbose);
    if let Some(path) = &args.json_output {
        write_json_report(path, &outcomes, &summary)?;
        println!("JSON report written to {}", path.display());
    }

    if summary.invariant_failures > 0 {
        bail!("{} invariant check(s) failed", summary.invariant_failures);
    }
    Ok(())
}
