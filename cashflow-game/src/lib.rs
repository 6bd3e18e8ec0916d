//! Cash Flow Game Engine
//!
//! Platform-agnostic core game logic for the Cash Flow financial-education
//! board game. This crate provides the full turn state machine without UI or
//! platform-specific dependencies.

pub mod board;
pub mod cards;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod game_log;
pub mod ledger;
pub mod money;
pub mod professions;
pub mod squares;

// Re-export commonly used types
pub use board::{
    Board, BoardConfig, BoardError, Direction, GATEWAY_POSITION, Ring, RingLayout, Square,
    SquareKind, SquareParams, entry_direction,
};
pub use cards::{Card, CardKind, CardTerms, PurchaseError, PurchaseReceipt};
pub use catalog::{CardCatalog, DrawRecord};
pub use config::{ConfigError, DoodadEvent, DrawWeights, GameConfig};
pub use engine::{
    CardDecision, CardSummary, DICE_MAX, DICE_MIN, EngineError, GameEngine, GamePhase,
    GameSnapshot, MarketAction, PendingTransition, PlayerSummary, TurnPhase,
};
pub use game_log::{GameLog, LogEntry};
pub use ledger::{
    Asset, Holdings, LedgerEntry, LedgerEntryKind, Liability, Player, ShareLot, TransferError,
};
pub use money::{format_cents, monthly_loan_payment_cents};
pub use professions::{PlayerSetup, Profession, ProfessionsList};
pub use squares::{SquareIntent, SquareOutcome, resolve_square};

/// Trait for abstracting data loading operations.
/// Platform-specific implementations should provide this.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the card catalog from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the card data cannot be loaded.
    fn load_catalog(&self) -> Result<CardCatalog, Self::Error>;

    /// Load the board layout from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the board data cannot be loaded.
    fn load_board(&self) -> Result<BoardConfig, Self::Error>;

    /// Load the profession templates from the platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the profession data cannot be loaded.
    fn load_professions(&self) -> Result<ProfessionsList, Self::Error>;
}

/// Loader that serves the built-in defaults (catalog, board layout,
/// professions). Useful for tests and headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsLoader;

impl DataLoader for DefaultsLoader {
    type Error = std::convert::Infallible;

    fn load_catalog(&self) -> Result<CardCatalog, Self::Error> {
        Ok(CardCatalog::default_catalog())
    }

    fn load_board(&self) -> Result<BoardConfig, Self::Error> {
        Ok(BoardConfig::default_layout())
    }

    fn load_professions(&self) -> Result<ProfessionsList, Self::Error> {
        Ok(ProfessionsList::default_list())
    }
}

/// Assembles a ready-to-start engine from a data loader and seat list.
#[derive(Debug, Clone)]
pub struct GameBuilder {
    seed: u64,
    config: GameConfig,
    setups: Vec<PlayerSetup>,
    debug_mode: bool,
}

impl GameBuilder {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: GameConfig::default_config(),
            setups: Vec::new(),
            debug_mode: false,
        }
    }

    #[must_use]
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn player(mut self, name: &str, profession_id: &str) -> Self {
        self.setups.push(PlayerSetup::new(name, profession_id));
        self
    }

    #[must_use]
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Load data through the loader, validate it, and seat the players.
    ///
    /// # Errors
    ///
    /// Returns an error when loading fails, the configuration or board
    /// layout is invalid, or a seat names an unknown profession.
    pub fn build<L>(&self, loader: &L) -> Result<GameEngine, anyhow::Error>
    where
        L: DataLoader,
        L::Error: Into<anyhow::Error>,
    {
        self.config.validate()?;
        let catalog = loader.load_catalog().map_err(Into::into)?;
        let board_config = loader.load_board().map_err(Into::into)?;
        board_config.validate()?;
        let professions = loader.load_professions().map_err(Into::into)?;

        let mut players = Vec::with_capacity(self.setups.len());
        for setup in &self.setups {
            let profession = professions
                .get_by_id(&setup.profession_id)
                .ok_or_else(|| anyhow::anyhow!("unknown profession '{}'", setup.profession_id))?;
            players.push(Player::from_profession(&setup.name, profession));
        }

        let mut game = GameEngine::new(
            Board::new(board_config),
            catalog,
            self.config.clone(),
            players,
            self.seed,
        );
        game.set_debug_mode(self.debug_mode);
        Ok(game)
    }
}
