//! Turn state machine: the authoritative game engine.
//!
//! Every mutation enters through one of the phase-guarded operations below.
//! Callers (GUI, CLI, tests) hold no game state of their own; they read the
//! snapshot and issue one action at a time for the current player.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::board::{Board, Ring, SquareKind};
use crate::cards::{Card, CardKind, PurchaseError};
use crate::catalog::CardCatalog;
use crate::config::GameConfig;
use crate::game_log::{GameLog, LogEntry};
use crate::ledger::{Player, TransferError};
use crate::money::format_cents;
use crate::squares::{SquareIntent, resolve_square};

pub const DICE_MIN: u8 = 1;
pub const DICE_MAX: u8 = 6;

/// Outer game lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Waiting,
    Playing,
    Finished,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase within the current player's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    RollDice,
    Move,
    SquareEvent,
    CardDecision,
    Market,
    LayerTransition,
    EndTurn,
}

impl TurnPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RollDice => "roll_dice",
            Self::Move => "move",
            Self::SquareEvent => "square_event",
            Self::CardDecision => "card_decision",
            Self::Market => "market",
            Self::LayerTransition => "layer_transition",
            Self::EndTurn => "end_turn",
        }
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Player response to a drawn card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum CardDecision {
    Buy { shares: Option<u32> },
    Pass,
}

/// Player action while the market is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MarketAction {
    SellToBank {
        asset_index: usize,
        price_cents: i64,
    },
    SellToPlayer {
        asset_index: usize,
        buyer_index: usize,
        price_cents: i64,
    },
    Exit,
}

/// Ring change awaiting the player's choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    pub from_ring: Ring,
    pub from_position: usize,
    /// Star cell: the player picks any middle-ring destination.
    pub gateway: bool,
    /// Ring the landed square suggests.
    pub suggested_target: Option<Ring>,
}

/// Errors returned by engine operations. None of them mutate state.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("operation '{operation}' requires the {expected} phase (currently {actual})")]
    PhaseViolation {
        operation: &'static str,
        expected: TurnPhase,
        actual: TurnPhase,
    },
    #[error("the game has not been started")]
    GameNotStarted,
    #[error("the game has already started")]
    AlreadyStarted,
    #[error("the game is finished; no further turns are accepted")]
    GameFinished,
    #[error("need at least {required} players ({seated} seated)")]
    NotEnoughPlayers { required: usize, seated: usize },
    #[error("at most {allowed} players are supported ({seated} seated)")]
    TooManyPlayers { allowed: usize, seated: usize },
    #[error("debug dice are only accepted in debug mode")]
    DebugDisabled,
    #[error("dice value {value} outside {DICE_MIN}..={DICE_MAX}")]
    DiceOutOfRange { value: u8 },
    #[error("no card is pending a decision")]
    NoPendingCard,
    #[error("no ring transition is pending")]
    NoPendingTransition,
    #[error("no player at index {index}")]
    UnknownPlayer { index: usize },
    #[error("no asset at index {index}")]
    UnknownAsset { index: usize },
    #[error("players cannot trade with themselves")]
    SelfTrade,
    #[error(transparent)]
    Purchase(#[from] PurchaseError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Pending-card view included in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub id: String,
    pub name: String,
    pub kind: CardKind,
    pub required_cash_cents: i64,
}

/// Per-player view included in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub profession: String,
    pub ring: Ring,
    pub position: usize,
    pub cash_cents: i64,
    pub passive_income_cents: i64,
    pub expenses_cents: i64,
    pub financially_free: bool,
    pub assets: usize,
    pub liabilities: usize,
    pub children: u8,
    pub downsized_turns: u8,
}

/// Read-only view of the full game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_phase: GamePhase,
    pub turn_phase: TurnPhase,
    pub turn_count: u32,
    pub current_player: Option<String>,
    pub dice_value: u8,
    pub pending_card: Option<CardSummary>,
    pub market_open: bool,
    pub players: Vec<PlayerSummary>,
}

/// The authoritative game engine and turn state machine.
#[derive(Debug, Clone)]
pub struct GameEngine {
    config: GameConfig,
    board: Board,
    catalog: CardCatalog,
    players: Vec<Player>,
    game_phase: GamePhase,
    turn_phase: TurnPhase,
    turn_count: u32,
    current_player_index: usize,
    debug_mode: bool,
    dice_value: u8,
    pending_card: Option<Card>,
    market_open: bool,
    pending_transition: Option<PendingTransition>,
    winner_index: Option<usize>,
    seed: u64,
    rng: ChaCha20Rng,
    log: GameLog,
}

impl GameEngine {
    #[must_use]
    pub fn new(
        board: Board,
        catalog: CardCatalog,
        config: GameConfig,
        players: Vec<Player>,
        seed: u64,
    ) -> Self {
        Self {
            config,
            board,
            catalog,
            players,
            game_phase: GamePhase::Waiting,
            turn_phase: TurnPhase::RollDice,
            turn_count: 0,
            current_player_index: 0,
            debug_mode: false,
            dice_value: 0,
            pending_card: None,
            market_open: false,
            pending_transition: None,
            winner_index: None,
            seed,
            rng: ChaCha20Rng::seed_from_u64(seed),
            log: GameLog::new(),
        }
    }

    /// Begin play. Validates the seat count against configured bounds.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` when the game already started or the player
    /// count is out of bounds.
    pub fn start_game(&mut self) -> Result<(), EngineError> {
        match self.game_phase {
            GamePhase::Waiting => {}
            GamePhase::Playing => return Err(EngineError::AlreadyStarted),
            GamePhase::Finished => return Err(EngineError::GameFinished),
        }
        if self.players.len() < self.config.min_players {
            return Err(EngineError::NotEnoughPlayers {
                required: self.config.min_players,
                seated: self.players.len(),
            });
        }
        if self.players.len() > self.config.max_players {
            return Err(EngineError::TooManyPlayers {
                allowed: self.config.max_players,
                seated: self.players.len(),
            });
        }

        self.game_phase = GamePhase::Playing;
        self.turn_phase = TurnPhase::RollDice;
        self.current_player_index = 0;
        self.turn_count = 1;
        let opener = self.players[0].name.clone();
        self.note(format!(
            "Game started with {} players; {opener} goes first",
            self.players.len()
        ));
        Ok(())
    }

    /// Roll the dice for the current player.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PhaseViolation` outside the roll phase.
    pub fn roll_dice(&mut self) -> Result<u8, EngineError> {
        self.guard("roll_dice", TurnPhase::RollDice)?;
        let value = self.rng.gen_range(DICE_MIN..=DICE_MAX);
        self.apply_roll(value);
        Ok(value)
    }

    /// Roll with an externally supplied value. Only honored in debug mode.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` outside the roll phase, when debug mode is off,
    /// or when the value is out of range.
    pub fn roll_dice_debug(&mut self, value: u8) -> Result<u8, EngineError> {
        self.guard("roll_dice", TurnPhase::RollDice)?;
        if !self.debug_mode {
            return Err(EngineError::DebugDisabled);
        }
        if !(DICE_MIN..=DICE_MAX).contains(&value) {
            return Err(EngineError::DiceOutOfRange { value });
        }
        self.apply_roll(value);
        Ok(value)
    }

    fn apply_roll(&mut self, value: u8) {
        self.dice_value = value;
        self.turn_phase = TurnPhase::Move;
        let name = self.players[self.current_player_index].name.clone();
        self.note(format!("{name} rolled a {value}"));
    }

    /// Move the current player and immediately resolve the landed square.
    /// There is no externally observable idle Move state.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PhaseViolation` outside the move phase.
    pub fn move_player(&mut self) -> Result<String, EngineError> {
        self.guard("move_player", TurnPhase::Move)?;
        let steps = u32::from(self.dice_value);
        let idx = self.current_player_index;
        let (ring, old_position, direction) = {
            let player = &self.players[idx];
            (player.ring, player.position, player.direction)
        };
        let (new_position, new_direction) = self.board.advance(old_position, steps, ring, direction);
        {
            let player = &mut self.players[idx];
            player.position = new_position;
            player.direction = new_direction;
        }
        let name = self.players[idx].name.clone();
        self.note(format!(
            "{name} moved from {old_position} to {new_position} on the {ring} ring"
        ));
        self.turn_phase = TurnPhase::SquareEvent;
        Ok(self.resolve_square_event())
    }

    fn resolve_square_event(&mut self) -> String {
        let idx = self.current_player_index;
        let (ring, position) = {
            let player = &self.players[idx];
            (player.ring, player.position)
        };
        let Some(square) = self.board.square(position, ring).cloned() else {
            let name = self.players[idx].name.clone();
            let detail = format!("{name} landed on an empty cell");
            self.note(detail.clone());
            self.turn_phase = TurnPhase::EndTurn;
            return detail;
        };
        self.note(format!("Arrived at: {}", square.name));

        if self.players[idx].downsized_turns > 0 && square.kind == SquareKind::Paycheck {
            let player = &mut self.players[idx];
            player.downsized_turns -= 1;
            let detail = format!(
                "{} is downsized and skips this paycheck ({} left)",
                player.name, player.downsized_turns
            );
            self.note(detail.clone());
            self.turn_phase = TurnPhase::EndTurn;
            return detail;
        }

        let outcome = resolve_square(
            &square,
            &mut self.players[idx],
            &mut self.catalog,
            &self.config,
            &mut self.rng,
        );
        self.note(outcome.detail.clone());

        self.turn_phase = match outcome.intent {
            SquareIntent::OfferCard(card) => {
                self.pending_card = Some(card);
                TurnPhase::CardDecision
            }
            SquareIntent::OpenMarket => {
                self.market_open = true;
                TurnPhase::Market
            }
            SquareIntent::RingTransition => {
                self.pending_transition = Some(PendingTransition {
                    from_ring: ring,
                    from_position: position,
                    gateway: self.board.is_gateway(ring, position),
                    suggested_target: square.params.transition_target,
                });
                TurnPhase::LayerTransition
            }
            SquareIntent::None => TurnPhase::EndTurn,
        };
        outcome.detail
    }

    /// Resolve the pending card: buy it (with an optional share count for
    /// financial cards) or pass. A failed buy leaves the decision open so
    /// the caller can retry with different terms or pass.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PhaseViolation` outside the decision phase, or
    /// a purchase error with both ledger and phase untouched.
    pub fn handle_card_decision(&mut self, decision: CardDecision) -> Result<String, EngineError> {
        self.guard("handle_card_decision", TurnPhase::CardDecision)?;
        let card = self.pending_card.clone().ok_or(EngineError::NoPendingCard)?;
        let idx = self.current_player_index;

        let detail = match decision {
            CardDecision::Buy { shares } => {
                let receipt =
                    card.execute_purchase(&mut self.players[idx], shares, &self.config)?;
                format!("{}: {}", self.players[idx].name, receipt.detail)
            }
            CardDecision::Pass => {
                format!("{} passed on {}", self.players[idx].name, card.name)
            }
        };
        self.note(detail.clone());
        self.pending_card = None;
        self.turn_phase = TurnPhase::EndTurn;
        Ok(detail)
    }

    /// Execute one market action. Sales keep the market open; `Exit` ends
    /// the market visit.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` outside the market phase, for unknown
    /// asset/player indices, for self-trades, or when the buyer cannot pay;
    /// failed actions leave every ledger untouched.
    pub fn handle_market_action(&mut self, action: MarketAction) -> Result<String, EngineError> {
        self.guard("handle_market_action", TurnPhase::Market)?;
        let idx = self.current_player_index;

        let detail = match action {
            MarketAction::SellToBank {
                asset_index,
                price_cents,
            } => {
                let player = &mut self.players[idx];
                let asset = player
                    .remove_asset(asset_index)
                    .ok_or(EngineError::UnknownAsset { index: asset_index })?;
                player.cash_cents += price_cents;
                format!(
                    "{} sold {} to the bank for {}",
                    player.name,
                    asset.name,
                    format_cents(price_cents)
                )
            }
            MarketAction::SellToPlayer {
                asset_index,
                buyer_index,
                price_cents,
            } => {
                if buyer_index >= self.players.len() {
                    return Err(EngineError::UnknownPlayer { index: buyer_index });
                }
                if buyer_index == idx {
                    return Err(EngineError::SelfTrade);
                }
                let (seller, buyer) = pair_mut(&mut self.players, idx, buyer_index);
                seller.transfer_asset_to(buyer, asset_index, price_cents)?;
                format!(
                    "{} sold an asset to {} for {}",
                    self.players[idx].name,
                    self.players[buyer_index].name,
                    format_cents(price_cents)
                )
            }
            MarketAction::Exit => {
                self.market_open = false;
                self.turn_phase = TurnPhase::EndTurn;
                format!("{} left the market", self.players[idx].name)
            }
        };
        self.note(detail.clone());
        Ok(detail)
    }

    /// Resolve a pending ring transition. Star-cell players supply the
    /// middle-ring destination of their choice; everyone else is remapped
    /// through the fixed transition table. An out-of-range star choice falls
    /// back to the middle ring's start cell.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PhaseViolation` outside the transition phase.
    pub fn handle_layer_transition(
        &mut self,
        target_ring: Ring,
        target_position: Option<usize>,
    ) -> Result<String, EngineError> {
        self.guard("handle_layer_transition", TurnPhase::LayerTransition)?;
        let pending = self
            .pending_transition
            .take()
            .ok_or(EngineError::NoPendingTransition)?;
        let idx = self.current_player_index;

        let destination = if pending.gateway && target_ring == Ring::Middle {
            let size = self.board.ring_size(Ring::Middle);
            match target_position {
                Some(position) if position < size => position,
                _ => 0,
            }
        } else {
            self.board
                .transition_position(pending.from_ring, pending.from_position, target_ring)
        };
        self.players[idx].enter_ring(target_ring, destination);

        let detail = format!(
            "{} switched from the {} ring (cell {}) to the {} ring (cell {})",
            self.players[idx].name,
            pending.from_ring,
            pending.from_position,
            target_ring,
            destination
        );
        self.note(detail.clone());
        self.turn_phase = TurnPhase::EndTurn;
        Ok(detail)
    }

    /// Close out the current player's turn: check the win condition, then
    /// hand the dice to the next player.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PhaseViolation` unless the turn reached its end
    /// (or sits in an unresolved transition, which is abandoned).
    pub fn end_turn(&mut self) -> Result<String, EngineError> {
        match self.game_phase {
            GamePhase::Playing => {}
            GamePhase::Waiting => return Err(EngineError::GameNotStarted),
            GamePhase::Finished => return Err(EngineError::GameFinished),
        }
        if !matches!(
            self.turn_phase,
            TurnPhase::EndTurn | TurnPhase::LayerTransition
        ) {
            return Err(EngineError::PhaseViolation {
                operation: "end_turn",
                expected: TurnPhase::EndTurn,
                actual: self.turn_phase,
            });
        }
        self.pending_transition = None;

        let idx = self.current_player_index;
        if self.players[idx].is_financially_free() {
            self.game_phase = GamePhase::Finished;
            self.winner_index = Some(idx);
            let name = self.players[idx].name.clone();
            let detail = format!("{name} reached financial freedom and wins the game!");
            self.note(detail.clone());
            return Ok(detail);
        }

        self.current_player_index = (idx + 1) % self.players.len();
        if self.current_player_index == 0 {
            self.turn_count += 1;
        }
        self.turn_phase = TurnPhase::RollDice;
        self.dice_value = 0;
        self.pending_card = None;
        self.market_open = false;

        let next = self.players[self.current_player_index].name.clone();
        let detail = format!("It is {next}'s turn");
        self.note(detail.clone());
        Ok(detail)
    }

    /// Read-only view of the complete game state.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_phase: self.game_phase,
            turn_phase: self.turn_phase,
            turn_count: self.turn_count,
            current_player: self.current_player().map(|p| p.name.clone()),
            dice_value: self.dice_value,
            pending_card: self.pending_card.as_ref().map(|card| CardSummary {
                id: card.id.clone(),
                name: card.name.clone(),
                kind: card.kind(),
                required_cash_cents: card.required_cash_cents(None),
            }),
            market_open: self.market_open,
            players: self.players.iter().map(player_summary).collect(),
        }
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    #[must_use]
    pub fn winner(&self) -> Option<&Player> {
        self.winner_index.and_then(|idx| self.players.get(idx))
    }

    /// The most recent `count` log entries, oldest first.
    #[must_use]
    pub fn recent_log(&self, count: usize) -> &[LogEntry] {
        self.log.recent(count)
    }

    #[must_use]
    pub const fn game_phase(&self) -> GamePhase {
        self.game_phase
    }

    #[must_use]
    pub const fn turn_phase(&self) -> TurnPhase {
        self.turn_phase
    }

    #[must_use]
    pub const fn turn_count(&self) -> u32 {
        self.turn_count
    }

    #[must_use]
    pub const fn current_player_index(&self) -> usize {
        self.current_player_index
    }

    #[must_use]
    pub const fn dice_value(&self) -> u8 {
        self.dice_value
    }

    #[must_use]
    pub const fn pending_card(&self) -> Option<&Card> {
        self.pending_card.as_ref()
    }

    #[must_use]
    pub const fn pending_transition(&self) -> Option<&PendingTransition> {
        self.pending_transition.as_ref()
    }

    #[must_use]
    pub const fn market_open(&self) -> bool {
        self.market_open
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub const fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    fn guard(&self, operation: &'static str, expected: TurnPhase) -> Result<(), EngineError> {
        match self.game_phase {
            GamePhase::Playing => {}
            GamePhase::Waiting => return Err(EngineError::GameNotStarted),
            GamePhase::Finished => return Err(EngineError::GameFinished),
        }
        if self.turn_phase != expected {
            return Err(EngineError::PhaseViolation {
                operation,
                expected,
                actual: self.turn_phase,
            });
        }
        Ok(())
    }

    fn note(&mut self, message: String) {
        log::debug!("turn {}: {message}", self.turn_count);
        self.log.record(self.turn_count, message);
    }
}

fn player_summary(player: &Player) -> PlayerSummary {
    PlayerSummary {
        name: player.name.clone(),
        profession: player.profession.clone(),
        ring: player.ring,
        position: player.position,
        cash_cents: player.cash_cents,
        passive_income_cents: player.passive_income_cents,
        expenses_cents: player.expenses_cents,
        financially_free: player.is_financially_free(),
        assets: player.assets.len(),
        liabilities: player.liabilities.len(),
        children: player.children,
        downsized_turns: player.downsized_turns,
    }
}

/// Disjoint mutable borrows of two distinct players.
fn pair_mut(players: &mut [Player], first: usize, second: usize) -> (&mut Player, &mut Player) {
    if first < second {
        let (left, right) = players.split_at_mut(second);
        (&mut left[first], &mut right[0])
    } else {
        let (left, right) = players.split_at_mut(first);
        (&mut right[0], &mut left[second])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Asset;
    use crate::professions::ProfessionsList;

    fn two_player_engine(seed: u64) -> GameEngine {
        let professions = ProfessionsList::default_list();
        let players = vec![
            Player::from_profession("Alice", professions.get_by_id("engineer").unwrap()),
            Player::from_profession("Bob", professions.get_by_id("doctor").unwrap()),
        ];
        GameEngine::new(
            Board::default_board(),
            CardCatalog::default_catalog(),
            GameConfig::default_config(),
            players,
            seed,
        )
    }

    #[test]
    fn start_requires_enough_players() {
        let professions = ProfessionsList::default_list();
        let solo = vec![Player::from_profession(
            "Solo",
            professions.get_by_id("nurse").unwrap(),
        )];
        let mut engine = GameEngine::new(
            Board::default_board(),
            CardCatalog::default_catalog(),
            GameConfig::default_config(),
            solo,
            1,
        );
        assert_eq!(
            engine.start_game(),
            Err(EngineError::NotEnoughPlayers {
                required: 2,
                seated: 1
            })
        );

        let mut engine = two_player_engine(1);
        engine.start_game().unwrap();
        assert_eq!(engine.game_phase(), GamePhase::Playing);
        assert_eq!(engine.turn_count(), 1);
        assert_eq!(engine.start_game(), Err(EngineError::AlreadyStarted));
    }

    #[test]
    fn operations_reject_wrong_phases() {
        let mut engine = two_player_engine(2);
        assert_eq!(engine.roll_dice(), Err(EngineError::GameNotStarted));

        engine.start_game().unwrap();
        assert_eq!(
            engine.move_player(),
            Err(EngineError::PhaseViolation {
                operation: "move_player",
                expected: TurnPhase::Move,
                actual: TurnPhase::RollDice,
            })
        );
        assert!(matches!(
            engine.handle_card_decision(CardDecision::Pass),
            Err(EngineError::PhaseViolation { .. })
        ));
        assert!(matches!(
            engine.handle_market_action(MarketAction::Exit),
            Err(EngineError::PhaseViolation { .. })
        ));

        let value = engine.roll_dice().unwrap();
        assert!((DICE_MIN..=DICE_MAX).contains(&value));
        // Rolling twice is illegal; the stored dice value is untouched.
        assert!(matches!(
            engine.roll_dice(),
            Err(EngineError::PhaseViolation { .. })
        ));
        assert_eq!(engine.dice_value(), value);
    }

    #[test]
    fn debug_dice_require_flag_and_range() {
        let mut engine = two_player_engine(3);
        engine.start_game().unwrap();
        assert_eq!(engine.roll_dice_debug(4), Err(EngineError::DebugDisabled));

        engine.set_debug_mode(true);
        assert_eq!(
            engine.roll_dice_debug(7),
            Err(EngineError::DiceOutOfRange { value: 7 })
        );
        assert_eq!(engine.roll_dice_debug(4), Ok(4));
        assert_eq!(engine.dice_value(), 4);
        assert_eq!(engine.turn_phase(), TurnPhase::Move);
    }

    #[test]
    fn scripted_turn_reaches_end_and_rotates_players() {
        let mut engine = two_player_engine(4);
        engine.set_debug_mode(true);
        engine.start_game().unwrap();

        // Middle ring from 0, a 1 lands on the paycheck square.
        engine.roll_dice_debug(1).unwrap();
        engine.move_player().unwrap();
        assert_eq!(engine.turn_phase(), TurnPhase::EndTurn);
        let alice = &engine.players()[0];
        // 10_000.00 + 5_000.00 - 2_500.00
        assert_eq!(alice.cash_cents, 1_250_000);

        engine.end_turn().unwrap();
        assert_eq!(engine.current_player_index(), 1);
        assert_eq!(engine.turn_phase(), TurnPhase::RollDice);
        assert_eq!(engine.dice_value(), 0);

        // Wrapping back to player 0 bumps the turn counter.
        engine.roll_dice_debug(1).unwrap();
        engine.move_player().unwrap();
        engine.end_turn().unwrap();
        assert_eq!(engine.current_player_index(), 0);
        assert_eq!(engine.turn_count(), 2);
    }

    #[test]
    fn card_decision_flow_buys_or_passes() {
        let mut engine = two_player_engine(5);
        engine.set_debug_mode(true);
        engine.start_game().unwrap();

        // Middle ring cell 2 is an opportunity square.
        engine.roll_dice_debug(2).unwrap();
        engine.move_player().unwrap();
        assert_eq!(engine.turn_phase(), TurnPhase::CardDecision);
        let pending = engine.pending_card().cloned().unwrap();

        engine.handle_card_decision(CardDecision::Pass).unwrap();
        assert!(engine.pending_card().is_none());
        assert_eq!(engine.turn_phase(), TurnPhase::EndTurn);
        assert!(
            engine
                .recent_log(3)
                .iter()
                .any(|entry| entry.message.contains(&pending.name))
        );
    }

    #[test]
    fn failed_purchase_keeps_the_decision_open() {
        let mut engine = two_player_engine(6);
        engine.set_debug_mode(true);
        engine.start_game().unwrap();
        engine.players[0].cash_cents = 0;

        engine.roll_dice_debug(2).unwrap();
        engine.move_player().unwrap();
        assert_eq!(engine.turn_phase(), TurnPhase::CardDecision);

        let err = engine
            .handle_card_decision(CardDecision::Buy { shares: None })
            .unwrap_err();
        assert!(matches!(err, EngineError::Purchase(_)));
        assert_eq!(engine.turn_phase(), TurnPhase::CardDecision);
        assert!(engine.pending_card().is_some());
        assert_eq!(engine.players()[0].cash_cents, 0);

        engine.handle_card_decision(CardDecision::Pass).unwrap();
        assert_eq!(engine.turn_phase(), TurnPhase::EndTurn);
    }

    #[test]
    fn market_flow_sells_to_bank_and_players() {
        let mut engine = two_player_engine(7);
        engine.set_debug_mode(true);
        engine.start_game().unwrap();
        engine.players[0].add_asset(Asset::new(
            "Kiosk",
            CardKind::SideBusiness,
            100_000,
            20_000,
        ));
        engine.players[0].add_asset(Asset::new(
            "Condo",
            CardKind::Opportunity,
            8_000_000,
            80_000,
        ));

        // Middle ring cell 5 is a market square.
        engine.roll_dice_debug(5).unwrap();
        engine.move_player().unwrap();
        assert_eq!(engine.turn_phase(), TurnPhase::Market);
        assert!(engine.market_open());

        let cash_before = engine.players()[0].cash_cents;
        engine
            .handle_market_action(MarketAction::SellToBank {
                asset_index: 0,
                price_cents: 150_000,
            })
            .unwrap();
        assert_eq!(engine.players()[0].cash_cents, cash_before + 150_000);
        assert_eq!(engine.players()[0].passive_income_cents, 80_000);
        assert_eq!(engine.turn_phase(), TurnPhase::Market);

        let err = engine
            .handle_market_action(MarketAction::SellToPlayer {
                asset_index: 0,
                buyer_index: 0,
                price_cents: 1,
            })
            .unwrap_err();
        assert_eq!(err, EngineError::SelfTrade);

        engine
            .handle_market_action(MarketAction::SellToPlayer {
                asset_index: 0,
                buyer_index: 1,
                price_cents: 500_000,
            })
            .unwrap();
        assert_eq!(engine.players()[0].passive_income_cents, 0);
        assert_eq!(engine.players()[1].passive_income_cents, 80_000);

        engine.handle_market_action(MarketAction::Exit).unwrap();
        assert!(!engine.market_open());
        assert_eq!(engine.turn_phase(), TurnPhase::EndTurn);
    }

    #[test]
    fn win_condition_finishes_the_game_for_good() {
        let mut engine = two_player_engine(8);
        engine.set_debug_mode(true);
        engine.start_game().unwrap();
        engine.players[0].add_asset(Asset::new(
            "Tower",
            CardKind::Enterprise,
            1,
            10_000_000,
        ));

        engine.roll_dice_debug(1).unwrap();
        engine.move_player().unwrap();
        let detail = engine.end_turn().unwrap();
        assert!(detail.contains("financial freedom"));
        assert_eq!(engine.game_phase(), GamePhase::Finished);
        assert_eq!(engine.winner().unwrap().name, "Alice");

        assert_eq!(engine.roll_dice(), Err(EngineError::GameFinished));
        assert_eq!(engine.end_turn(), Err(EngineError::GameFinished));
    }

    #[test]
    fn snapshot_reflects_engine_state() {
        let mut engine = two_player_engine(9);
        engine.start_game().unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.game_phase, GamePhase::Playing);
        assert_eq!(snapshot.turn_phase, TurnPhase::RollDice);
        assert_eq!(snapshot.turn_count, 1);
        assert_eq!(snapshot.current_player.as_deref(), Some("Alice"));
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[1].profession, "Doctor");
        assert!(!snapshot.players[0].financially_free);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"turn_phase\":\"roll_dice\""));
    }
}
