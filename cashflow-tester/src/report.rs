//! Aggregate reporting for simulation batches.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::simulation::SimulationOutcome;

/// Roll-up of a batch of simulated games.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub games: usize,
    pub finished: usize,
    pub total_turns: u64,
    pub total_purchases: u64,
    pub invariant_failures: usize,
    pub wins_by_player: HashMap<String, usize>,
}

#[must_use]
pub fn summarize(outcomes: &[SimulationOutcome]) -> BatchSummary {
    let mut summary = BatchSummary {
        games: outcomes.len(),
        ..BatchSummary::default()
    };
    for outcome in outcomes {
        if outcome.finished {
            summary.finished += 1;
        }
        summary.total_turns += u64::from(outcome.turns_played);
        summary.total_purchases += u64::from(outcome.purchases);
        summary.invariant_failures += outcome.invariant_failures.len();
        if let Some(winner) = &outcome.winner {
            *summary.wins_by_player.entry(winner.clone()).or_default() += 1;
        }
    }
    summary
}

pub fn print_console_report(
    outcomes: &[SimulationOutcome],
    summary: &BatchSummary,
    duration: Duration,
    verbose: bool,
) {
    println!();
    println!("{}", "Cash Flow simulation results".bright_cyan().bold());
    println!("{}", "============================".cyan());
    println!("Games run: {}", summary.games);
    println!(
        "Finished with a winner: {} ({} hit the turn cap)",
        summary.finished.to_string().green(),
        (summary.games - summary.finished).to_string().yellow()
    );
    if summary.games > 0 {
        #[allow(clippy::cast_precision_loss)]
        let avg_turns = summary.total_turns as f64 / summary.games as f64;
        println!("Average turns per game: {avg_turns:.1}");
    }
    println!("Total card purchases: {}", summary.total_purchases);
    if summary.invariant_failures == 0 {
        println!("Invariant checks: {}", "all passed".green());
    } else {
        println!(
            "Invariant checks: {}",
            format!("{} FAILED", summary.invariant_failures).red().bold()
        );
    }
    println!("Elapsed: {duration:?}");

    if !summary.wins_by_player.is_empty() {
        println!();
        println!("{}", "Wins by seat".bold());
        let mut wins: Vec<_> = summary.wins_by_player.iter().collect();
        wins.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (name, count) in wins {
            println!("  {name}: {count}");
        }
    }

    if verbose {
        println!();
        for outcome in outcomes {
            print_outcome_line(outcome);
        }
    }
    println!();
}

fn print_outcome_line(outcome: &SimulationOutcome) {
    let status = if outcome.finished {
        "WIN ".green()
    } else {
        "CAP ".yellow()
    };
    println!(
        "{} seed {:>10}  turns {:>4}  purchases {:>3}  winner {}",
        status,
        outcome.seed,
        outcome.turns_played,
        outcome.purchases,
        outcome.winner.as_deref().unwrap_or("-")
    );
    for failure in &outcome.invariant_failures {
        println!("      {}", failure.red());
    }
}

/// Serialize the batch (summary plus per-game outcomes) as pretty JSON.
///
/// # Errors
///
/// Returns an error when the report cannot be serialized or written.
pub fn write_json_report(
    path: &Path,
    outcomes: &[SimulationOutcome],
    summary: &BatchSummary,
) -> Result<()> {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        summary: &'a BatchSummary,
        games: &'a [SimulationOutcome],
    }
    let body = serde_json::to_string_pretty(&JsonReport {
        summary,
        games: outcomes,
    })
    .context("serializing report")?;
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashflow_game::{GamePhase, GameSnapshot, TurnPhase};

    fn outcome(seed: u64, finished: bool, winner: Option<&str>) -> SimulationOutcome {
        SimulationOutcome {
            seed,
            turns_played: 40,
            finished,
            winner: winner.map(str::to_string),
            purchases: 3,
            invariant_failures: vec![],
            final_snapshot: GameSnapshot {
                game_phase: GamePhase::Finished,
                turn_phase: TurnPhase::RollDice,
                turn_count: 40,
                current_player: None,
                dice_value: 0,
                pending_card: None,
                market_open: false,
                players: vec![],
            },
        }
    }

    #[test]
    fn summaries_count_wins_and_turns() {
        let outcomes = vec![
            outcome(1, true, Some("Bot-1")),
            outcome(2, true, Some("Bot-1")),
            outcome(3, false, None),
        ];
        let summary = summarize(&outcomes);
        assert_eq!(summary.games, 3);
        assert_eq!(summary.finished, 2);
        assert_eq!(summary.total_turns, 120);
        assert_eq!(summary.wins_by_player["Bot-1"], 2);
        assert_eq!(summary.invariant_failures, 0);
    }
}
