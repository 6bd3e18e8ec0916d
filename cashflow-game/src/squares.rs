//! Square effect resolution.
//!
//! Each landed square mutates the player's ledger directly and/or hands an
//! intent back to the engine. Squares never reach into engine state
//! themselves; the intent is the only channel.

use rand::Rng;

use crate::board::{Square, SquareKind};
use crate::cards::{Card, CardKind};
use crate::catalog::CardCatalog;
use crate::config::{DrawWeights, GameConfig};
use crate::ledger::Player;
use crate::money::{cents_to_f64, format_cents, round_f64_to_cents};

/// Follow-up the engine must take after a square effect.
#[derive(Debug, Clone, PartialEq)]
pub enum SquareIntent {
    /// Nothing pending; the turn can end.
    None,
    /// The player drew an investment card and must decide on it.
    OfferCard(Card),
    /// The player may trade assets until leaving the market.
    OpenMarket,
    /// The player may change rings from this cell.
    RingTransition,
}

/// Result of resolving a landed square.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareOutcome {
    pub intent: SquareIntent,
    pub detail: String,
}

impl SquareOutcome {
    fn note(detail: String) -> Self {
        Self {
            intent: SquareIntent::None,
            detail,
        }
    }
}

/// Apply a square's effect to the landed player.
///
/// The downsized-paycheck skip is the engine's responsibility and has
/// already happened by the time this runs.
pub fn resolve_square(
    square: &Square,
    player: &mut Player,
    catalog: &mut CardCatalog,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> SquareOutcome {
    match square.kind {
        SquareKind::Start => SquareOutcome::note(format!(
            "{} passed the starting square",
            player.name
        )),
        SquareKind::Paycheck => resolve_paycheck(player),
        SquareKind::Opportunity => resolve_opportunity(player, catalog, config, rng),
        SquareKind::Doodad => resolve_doodad(square, player, config, rng),
        SquareKind::Market => SquareOutcome {
            intent: SquareIntent::OpenMarket,
            detail: format!("{} entered the market", player.name),
        },
        SquareKind::Charity => resolve_charity(player, config),
        SquareKind::Downsized => resolve_downsized(player, config),
        SquareKind::Baby => resolve_baby(player, config),
        SquareKind::RingTransition => SquareOutcome {
            intent: SquareIntent::RingTransition,
            detail: format!("{} reached a ring gateway", player.name),
        },
    }
}

fn resolve_paycheck(player: &mut Player) -> SquareOutcome {
    player.receive_salary();
    player.receive_passive_income();
    player.pay_expenses();
    let net = player.salary_cents + player.passive_income_cents - player.expenses_cents;
    SquareOutcome::note(format!(
        "{} settled the month: salary {} + passive {} - expenses {} = net {}",
        player.name,
        format_cents(player.salary_cents),
        format_cents(player.passive_income_cents),
        format_cents(player.expenses_cents),
        format_cents(net)
    ))
}

fn resolve_opportunity(
    player: &mut Player,
    catalog: &mut CardCatalog,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> SquareOutcome {
    let Some(kind) = pick_weighted_kind(&config.draw_weights, rng) else {
        return SquareOutcome::note(format!(
            "{} found no investment opportunities",
            player.name
        ));
    };
    match catalog.draw(kind, rng) {
        Some(card) => {
            let detail = format!("{} drew an opportunity: {card}", player.name);
            SquareOutcome {
                intent: SquareIntent::OfferCard(card),
                detail,
            }
        }
        None => SquareOutcome::note(format!(
            "{} drew from an empty {kind} deck",
            player.name
        )),
    }
}

fn resolve_doodad(
    square: &Square,
    player: &mut Player,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> SquareOutcome {
    if config.doodad_events.is_empty() {
        return SquareOutcome::note(format!("{} dodged an unexpected expense", player.name));
    }
    let event = &config.doodad_events[rng.gen_range(0..config.doodad_events.len())];
    let drawn = rng.gen_range(event.min_cents..=event.max_cents);
    let amount = round_f64_to_cents(cents_to_f64(drawn) * square.params.doodad_multiplier);
    player.cash_cents -= amount;
    SquareOutcome::note(format!(
        "{} hit an unexpected expense: {} cost {}",
        player.name,
        event.label,
        format_cents(amount)
    ))
}

fn resolve_charity(player: &mut Player, config: &GameConfig) -> SquareOutcome {
    let bonus = i64::from(player.children) * config.charity_bonus_per_child_cents;
    if bonus > 0 {
        player.cash_cents += bonus;
        SquareOutcome::note(format!(
            "{} volunteered: {} children earned a {} bonus",
            player.name,
            player.children,
            format_cents(bonus)
        ))
    } else {
        SquareOutcome::note(format!(
            "{} volunteered, but with no children there is no bonus",
            player.name
        ))
    }
}

fn resolve_downsized(player: &mut Player, config: &GameConfig) -> SquareOutcome {
    player.downsized_turns += config.downsized_turn_penalty;
    SquareOutcome::note(format!(
        "{} was downsized and will miss the next {} paychecks",
        player.name, config.downsized_turn_penalty
    ))
}

fn resolve_baby(player: &mut Player, config: &GameConfig) -> SquareOutcome {
    player.children += 1;
    player.expenses_cents += config.child_monthly_expense_cents;
    SquareOutcome::note(format!(
        "{} had a baby! {} children now, monthly expenses up by {}",
        player.name,
        player.children,
        format_cents(config.child_monthly_expense_cents)
    ))
}

/// Stage one of the opportunity draw: pick a card kind from the configured
/// weights, then the catalog picks uniformly within that deck.
fn pick_weighted_kind(weights: &DrawWeights, rng: &mut impl Rng) -> Option<CardKind> {
    let total = weights.total();
    if total == 0 {
        return None;
    }
    let roll = rng.gen_range(0..total);
    let mut current = 0;
    for kind in CardKind::ALL {
        current += weights.weight_for(kind);
        if roll < current {
            return Some(kind);
        }
    }
    CardKind::ALL.first().copied()
}
