//! Deterministic headless simulation harness driving the engine through its
//! public API.

use anyhow::{Context, Result};
use cashflow_game::{
    CardDecision, DefaultsLoader, GameBuilder, GameEngine, GamePhase, GameSnapshot, MarketAction,
    ProfessionsList, TurnPhase,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use crate::bot::BotStrategy;

/// Configuration for one simulated game.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub players: usize,
    pub strategy: BotStrategy,
    pub max_turns: u32,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(seed: u64, players: usize, strategy: BotStrategy) -> Self {
        Self {
            seed,
            players,
            strategy,
            max_turns: 500,
        }
    }
}

/// What one simulated game produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub seed: u64,
    pub turns_played: u32,
    pub finished: bool,
    pub winner: Option<String>,
    pub purchases: u32,
    pub invariant_failures: Vec<String>,
    pub final_snapshot: GameSnapshot,
}

/// Run a complete seeded game with bot players.
///
/// # Errors
///
/// Returns an error when the engine rejects an action the bot believed was
/// legal, which indicates an engine or harness defect.
pub fn run_simulation(config: SimulationConfig) -> Result<SimulationOutcome> {
    let mut game = build_game(config)?;
    game.start_game().context("starting game")?;

    let mut bot_rng = ChaCha20Rng::seed_from_u64(config.seed ^ 0xB07);
    let mut purchases = 0_u32;
    let mut invariant_failures = Vec::new();

    while game.game_phase() == GamePhase::Playing && game.turn_count() <= config.max_turns {
        step(&mut game, config.strategy, &mut bot_rng, &mut purchases)?;
        check_invariants(&game, &mut invariant_failures);
    }

    let winner = game.winner().map(|player| player.name.clone());
    Ok(SimulationOutcome {
        seed: config.seed,
        turns_played: game.turn_count(),
        finished: game.game_phase() == GamePhase::Finished,
        winner,
        purchases,
        invariant_failures,
        final_snapshot: game.snapshot(),
    })
}

fn build_game(config: SimulationConfig) -> Result<GameEngine> {
    let professions = ProfessionsList::default_list();
    let mut builder = GameBuilder::new(config.seed);
    for index in 0..config.players {
        let profession = professions
            .iter()
            .nth(index % professions.len())
            .context("profession list is empty")?;
        let name = format!("Bot-{}", index + 1);
        builder = builder.player(&name, &profession.id);
    }
    builder.build(&DefaultsLoader)
}

fn step(
    game: &mut GameEngine,
    strategy: BotStrategy,
    bot_rng: &mut ChaCha20Rng,
    purchases: &mut u32,
) -> Result<()> {
    match game.turn_phase() {
        TurnPhase::RollDice => {
            game.roll_dice()?;
        }
        TurnPhase::Move => {
            game.move_player()?;
        }
        TurnPhase::CardDecision => {
            let decision = {
                let card = game.pending_card().context("decision phase without card")?;
                let player = game.current_player().context("no current player")?;
                strategy.decide_card(card, player)
            };
            match game.handle_card_decision(decision) {
                Ok(_) => {
                    if matches!(decision, CardDecision::Buy { .. }) {
                        *purchases += 1;
                    }
                }
                // The bot misjudged affordability; declining is always legal.
                Err(err) => {
                    log::debug!("buy rejected ({err}); passing instead");
                    game.handle_card_decision(CardDecision::Pass)?;
                }
            }
        }
        TurnPhase::Market => {
            game.handle_market_action(MarketAction::Exit)?;
        }
        TurnPhase::LayerTransition => {
            let pending = game
                .pending_transition()
                .copied()
                .context("transition phase without pending state")?;
            let middle = game.board().ring_size(cashflow_game::Ring::Middle);
            let (ring, position) = strategy.decide_transition(&pending, middle, bot_rng);
            game.handle_layer_transition(ring, position)?;
        }
        TurnPhase::EndTurn => {
            game.end_turn()?;
        }
        TurnPhase::SquareEvent => {
            anyhow::bail!("engine exposed an idle square_event phase");
        }
    }
    Ok(())
}

fn check_invariants(game: &GameEngine, failures: &mut Vec<String>) {
    let per_child = game.config().child_monthly_expense_cents;
    for player in game.players() {
        if player.passive_income_cents != player.assets_passive_income_cents() {
            failures.push(format!(
                "ledger drift: {} passive income {} != holdings sum {}",
                player.name,
                player.passive_income_cents,
                player.assets_passive_income_cents()
            ));
        }
        let expected_expenses = player.base_expenses_cents
            + player.liabilities_expense_cents()
            + i64::from(player.children) * per_child;
        if player.expenses_cents != expected_expenses {
            failures.push(format!(
                "expense drift: {} expenses {} != expected {}",
                player.name, player.expenses_cents, expected_expenses
            ));
        }
    }
}
