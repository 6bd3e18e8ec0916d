//! Engine configuration: draw weights, loan rates, life-event amounts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cards::CardKind;

/// Weighted distribution over card kinds used by opportunity squares.
///
/// The two-stage draw picks a kind from these weights first, then a uniform
/// card within that kind's deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawWeights {
    #[serde(default = "DrawWeights::default_enterprise")]
    pub enterprise: u32,
    #[serde(default = "DrawWeights::default_opportunity")]
    pub opportunity: u32,
    #[serde(default = "DrawWeights::default_financial")]
    pub financial: u32,
    #[serde(default = "DrawWeights::default_side_business")]
    pub side_business: u32,
}

impl DrawWeights {
    const fn default_enterprise() -> u32 {
        20
    }

    const fn default_opportunity() -> u32 {
        40
    }

    const fn default_financial() -> u32 {
        30
    }

    const fn default_side_business() -> u32 {
        10
    }

    #[must_use]
    pub const fn weight_for(&self, kind: CardKind) -> u32 {
        match kind {
            CardKind::Enterprise => self.enterprise,
            CardKind::Opportunity => self.opportunity,
            CardKind::Financial => self.financial,
            CardKind::SideBusiness => self.side_business,
        }
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.enterprise + self.opportunity + self.financial + self.side_business
    }
}

impl Default for DrawWeights {
    fn default() -> Self {
        Self {
            enterprise: Self::default_enterprise(),
            opportunity: Self::default_opportunity(),
            financial: Self::default_financial(),
            side_business: Self::default_side_business(),
        }
    }
}

/// One entry in the unexpected-expense table. The landed amount is drawn
/// uniformly from `[min_cents, max_cents]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoodadEvent {
    pub label: String,
    pub min_cents: i64,
    pub max_cents: i64,
}

impl DoodadEvent {
    fn new(label: &str, min_cents: i64, max_cents: i64) -> Self {
        Self {
            label: label.to_string(),
            min_cents,
            max_cents,
        }
    }
}

/// Tunable game rules consumed by the engine and square resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub draw_weights: DrawWeights,
    /// Annual financing rate for enterprise purchases.
    #[serde(default = "GameConfig::default_enterprise_loan_rate")]
    pub enterprise_loan_rate: f64,
    /// Annual financing rate for opportunity purchases.
    #[serde(default = "GameConfig::default_opportunity_loan_rate")]
    pub opportunity_loan_rate: f64,
    /// Charity payout per child when landing on a charity square.
    #[serde(default = "GameConfig::default_charity_bonus")]
    pub charity_bonus_per_child_cents: i64,
    /// Permanent monthly expense added per child.
    #[serde(default = "GameConfig::default_child_expense")]
    pub child_monthly_expense_cents: i64,
    /// Paycheck landings skipped after a downsizing.
    #[serde(default = "GameConfig::default_downsized_penalty")]
    pub downsized_turn_penalty: u8,
    #[serde(default = "GameConfig::default_doodad_events")]
    pub doodad_events: Vec<DoodadEvent>,
    #[serde(default = "GameConfig::default_min_players")]
    pub min_players: usize,
    #[serde(default = "GameConfig::default_max_players")]
    pub max_players: usize,
}

impl GameConfig {
    const fn default_enterprise_loan_rate() -> f64 {
        0.10
    }

    const fn default_opportunity_loan_rate() -> f64 {
        0.08
    }

    const fn default_charity_bonus() -> i64 {
        10_000
    }

    const fn default_child_expense() -> i64 {
        30_000
    }

    const fn default_downsized_penalty() -> u8 {
        2
    }

    const fn default_min_players() -> usize {
        2
    }

    const fn default_max_players() -> usize {
        6
    }

    fn default_doodad_events() -> Vec<DoodadEvent> {
        vec![
            DoodadEvent::new("Car repair", 80_000, 150_000),
            DoodadEvent::new("Medical bills", 50_000, 200_000),
            DoodadEvent::new("Appliance repair", 30_000, 80_000),
            DoodadEvent::new("Vet visit", 40_000, 120_000),
            DoodadEvent::new("Home repair", 100_000, 300_000),
            DoodadEvent::new("Traffic fine", 20_000, 60_000),
            DoodadEvent::new("Night out", 30_000, 80_000),
            DoodadEvent::new("Shopping spree", 50_000, 120_000),
        ]
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self {
            draw_weights: DrawWeights::default(),
            enterprise_loan_rate: Self::default_enterprise_loan_rate(),
            opportunity_loan_rate: Self::default_opportunity_loan_rate(),
            charity_bonus_per_child_cents: Self::default_charity_bonus(),
            child_monthly_expense_cents: Self::default_child_expense(),
            downsized_turn_penalty: Self::default_downsized_penalty(),
            doodad_events: Self::default_doodad_events(),
            min_players: Self::default_min_players(),
            max_players: Self::default_max_players(),
        }
    }

    /// Annual financing rate for the given card kind, if that kind supports
    /// loans at all.
    #[must_use]
    pub fn loan_rate_for(&self, kind: CardKind) -> Option<f64> {
        match kind {
            CardKind::Enterprise => Some(self.enterprise_loan_rate),
            CardKind::Opportunity => Some(self.opportunity_loan_rate),
            CardKind::Financial | CardKind::SideBusiness => None,
        }
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.draw_weights.total() == 0 {
            return Err(ConfigError::EmptyDrawWeights);
        }
        for (field, rate) in [
            ("enterprise_loan_rate", self.enterprise_loan_rate),
            ("opportunity_loan_rate", self.opportunity_loan_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(ConfigError::RateOutOfRange { field, rate });
            }
        }
        if self.charity_bonus_per_child_cents < 0 {
            return Err(ConfigError::NegativeAmount {
                field: "charity_bonus_per_child_cents",
            });
        }
        if self.child_monthly_expense_cents < 0 {
            return Err(ConfigError::NegativeAmount {
                field: "child_monthly_expense_cents",
            });
        }
        for event in &self.doodad_events {
            if event.min_cents < 0 || event.min_cents > event.max_cents {
                return Err(ConfigError::DoodadRange {
                    label: event.label.clone(),
                    min: event.min_cents,
                    max: event.max_cents,
                });
            }
        }
        if self.min_players < 2 || self.min_players > self.max_players {
            return Err(ConfigError::PlayerBounds {
                min: self.min_players,
                max: self.max_players,
            });
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Errors raised when game configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("draw weights must not all be zero")]
    EmptyDrawWeights,
    #[error("{field} must be within (0, 1] (got {rate})")]
    RateOutOfRange { field: &'static str, rate: f64 },
    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },
    #[error("doodad event '{label}' has invalid range {min}..={max}")]
    DoodadRange { label: String, min: i64, max: i64 },
    #[error("player bounds invalid (min {min}, max {max})")]
    PlayerBounds { min: usize, max: usize },
}
