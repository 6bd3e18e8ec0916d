//! Scripted player policies used to drive full games headlessly.

use cashflow_game::{Card, CardDecision, PendingTransition, Player, Ring};
use clap::ValueEnum;
use rand::Rng;

/// How eagerly the bot spends its cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BotStrategy {
    /// Only buys when the price is a small fraction of cash on hand.
    Cautious,
    /// Buys when the price fits inside half the cash on hand.
    Balanced,
    /// Buys anything it can afford and chases the inner ring.
    Aggressive,
}

impl BotStrategy {
    const fn spend_fraction(self) -> f64 {
        match self {
            Self::Cautious => 0.25,
            Self::Balanced => 0.5,
            Self::Aggressive => 1.0,
        }
    }

    /// Decide on a drawn card for the given player.
    #[must_use]
    pub fn decide_card(self, card: &Card, player: &Player) -> CardDecision {
        let shares = match required_lot(card) {
            0 => None,
            min_lot => {
                let affordable = card.max_affordable_shares(player);
                if affordable < min_lot {
                    return CardDecision::Pass;
                }
                Some(match self {
                    Self::Aggressive => affordable,
                    Self::Cautious | Self::Balanced => min_lot,
                })
            }
        };
        let required = card.required_cash_cents(shares);
        if player.cash_cents <= 0 || !card.can_afford(player, shares) {
            return CardDecision::Pass;
        }
        #[allow(clippy::cast_precision_loss)]
        let budget = (player.cash_cents as f64 * self.spend_fraction()) as i64;
        if required <= budget {
            CardDecision::Buy { shares }
        } else {
            CardDecision::Pass
        }
    }

    /// Decide where a pending ring transition should land.
    #[must_use]
    pub fn decide_transition(
        self,
        pending: &PendingTransition,
        middle_ring_size: usize,
        rng: &mut impl Rng,
    ) -> (Ring, Option<usize>) {
        if pending.gateway {
            // Star cell: pick a middle-ring destination.
            let position = match self {
                Self::Aggressive => rng.gen_range(0..middle_ring_size),
                Self::Cautious | Self::Balanced => 0,
            };
            return (Ring::Middle, Some(position));
        }
        let target = match self {
            Self::Aggressive => pending.suggested_target.unwrap_or(Ring::Middle),
            Self::Balanced => pending.suggested_target.unwrap_or(pending.from_ring),
            Self::Cautious => Ring::Middle,
        };
        (target, None)
    }
}

fn required_lot(card: &Card) -> u32 {
    match &card.terms {
        cashflow_game::CardTerms::Financial { min_shares, .. } => *min_shares,
        _ => 0,
    }
}
