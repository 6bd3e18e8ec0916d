//! Card catalog: typed decks, random draws, draw history.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cards::{Card, CardKind, CardTerms};

/// One recorded draw, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub card_id: String,
    pub kind: CardKind,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    cards: Vec<serde_json::Value>,
}

/// All card templates, grouped into per-kind decks. Decks are never
/// consumed: a draw hands back a copy of the shared template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CardCatalog {
    cards: Vec<Card>,
    history: Vec<DrawRecord>,
    skipped_entries: usize,
}

impl CardCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cards: Vec::new(),
            history: Vec::new(),
            skipped_entries: 0,
        }
    }

    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards,
            history: Vec::new(),
            skipped_entries: 0,
        }
    }

    /// Load a catalog from a JSON document of the shape `{"cards": [...]}`.
    /// Malformed entries are skipped (and counted) rather than aborting the
    /// whole load.
    ///
    /// # Errors
    ///
    /// Returns an error only when the outer document itself cannot be
    /// parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut cards = Vec::with_capacity(file.cards.len());
        let mut skipped_entries = 0;
        for value in file.cards {
            match serde_json::from_value::<Card>(value) {
                Ok(card) => cards.push(card),
                Err(err) => {
                    log::warn!("skipping malformed card entry: {err}");
                    skipped_entries += 1;
                }
            }
        }
        Ok(Self {
            cards,
            history: Vec::new(),
            skipped_entries,
        })
    }

    /// The built-in eight-card set used when no data source is supplied.
    #[must_use]
    pub fn default_catalog() -> Self {
        let mk = |id: &str, name: &str, desc: &str, terms: CardTerms| Card {
            id: id.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
            terms,
        };
        Self::from_cards(vec![
            mk(
                "ENT001",
                "Small restaurant",
                "Invest in a small restaurant",
                CardTerms::Enterprise {
                    cost_cents: 5_000_000,
                    down_payment_cents: 1_000_000,
                    monthly_cash_flow_cents: 120_000,
                    employee_count: 3,
                    management_required: true,
                },
            ),
            mk(
                "ENT002",
                "Car wash",
                "Open a self-service car wash",
                CardTerms::Enterprise {
                    cost_cents: 3_000_000,
                    down_payment_cents: 600_000,
                    monthly_cash_flow_cents: 80_000,
                    employee_count: 1,
                    management_required: false,
                },
            ),
            mk(
                "OPP001",
                "Rental condo",
                "Buy a condo and rent it out",
                CardTerms::Opportunity {
                    cost_cents: 8_000_000,
                    down_payment_cents: 1_600_000,
                    monthly_cash_flow_cents: 80_000,
                },
            ),
            mk(
                "OPP002",
                "Storefront",
                "Invest in a small storefront",
                CardTerms::Opportunity {
                    cost_cents: 12_000_000,
                    down_payment_cents: 2_400_000,
                    monthly_cash_flow_cents: 150_000,
                },
            ),
            mk(
                "FIN001",
                "Tech fund",
                "Shares in a technology stock fund",
                CardTerms::Financial {
                    price_per_share_cents: 10_000,
                    dividend_per_share_cents: 200,
                    min_shares: 10,
                    max_shares: 1_000,
                },
            ),
            mk(
                "FIN002",
                "Blue chip stock",
                "Steady large-company shares",
                CardTerms::Financial {
                    price_per_share_cents: 5_000,
                    dividend_per_share_cents: 100,
                    min_shares: 20,
                    max_shares: 2_000,
                },
            ),
            mk(
                "SIDE001",
                "Online store",
                "Start an online sales side gig",
                CardTerms::SideBusiness {
                    cost_cents: 200_000,
                    monthly_cash_flow_cents: 40_000,
                    time_cost_hours: 10,
                },
            ),
            mk(
                "SIDE002",
                "Content channel",
                "Launch a self-media channel",
                CardTerms::SideBusiness {
                    cost_cents: 100_000,
                    monthly_cash_flow_cents: 30_000,
                    time_cost_hours: 15,
                },
            ),
        ])
    }

    /// Draw a uniform-random card from one kind's deck, recording the draw.
    /// Returns `None` when that deck is empty.
    pub fn draw(&mut self, kind: CardKind, rng: &mut impl Rng) -> Option<Card> {
        let deck: Vec<usize> = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, card)| card.kind() == kind)
            .map(|(idx, _)| idx)
            .collect();
        if deck.is_empty() {
            return None;
        }
        let chosen = deck[rng.gen_range(0..deck.len())];
        let card = self.cards[chosen].clone();
        self.history.push(DrawRecord {
            card_id: card.id.clone(),
            kind,
        });
        Some(card)
    }

    /// Draw uniformly across the union of all decks.
    pub fn draw_random(&mut self, rng: &mut impl Rng) -> Option<Card> {
        if self.cards.is_empty() {
            return None;
        }
        let card = self.cards[rng.gen_range(0..self.cards.len())].clone();
        self.history.push(DrawRecord {
            card_id: card.id.clone(),
            kind: card.kind(),
        });
        Some(card)
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn cards_by_kind(&self, kind: CardKind) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |card| card.kind() == kind)
    }

    #[must_use]
    pub fn deck_size(&self, kind: CardKind) -> usize {
        self.cards_by_kind(kind).count()
    }

    #[must_use]
    pub const fn total_cards(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Deck sizes keyed by kind name.
    #[must_use]
    pub fn summary(&self) -> HashMap<CardKind, usize> {
        CardKind::ALL
            .iter()
            .map(|kind| (*kind, self.deck_size(*kind)))
            .collect()
    }

    /// Entries dropped during the last JSON load.
    #[must_use]
    pub const fn skipped_entries(&self) -> usize {
        self.skipped_entries
    }

    #[must_use]
    pub fn draw_history(&self) -> &[DrawRecord] {
        &self.history
    }

    pub fn reset_draw_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn default_catalog_fills_every_deck() {
        let catalog = CardCatalog::default_catalog();
        assert_eq!(catalog.total_cards(), 8);
        for kind in CardKind::ALL {
            assert_eq!(catalog.deck_size(kind), 2, "deck {kind}");
        }
        assert_eq!(catalog.summary().len(), 4);
        assert!(catalog.get_by_id("FIN001").is_some());
        assert!(catalog.get_by_id("NOPE").is_none());
    }

    #[test]
    fn draw_respects_kind_and_records_history() {
        let mut catalog = CardCatalog::default_catalog();
        let mut rng = ChaCha20Rng::seed_from_u64(7);

        for _ in 0..20 {
            let card = catalog.draw(CardKind::Financial, &mut rng).unwrap();
            assert_eq!(card.kind(), CardKind::Financial);
        }
        assert_eq!(catalog.draw_history().len(), 20);
        assert!(
            catalog
                .draw_history()
                .iter()
                .all(|record| record.kind == CardKind::Financial)
        );

        catalog.reset_draw_history();
        assert!(catalog.draw_history().is_empty());
    }

    #[test]
    fn empty_deck_yields_none() {
        let mut catalog = CardCatalog::empty();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert!(catalog.draw(CardKind::Enterprise, &mut rng).is_none());
        assert!(catalog.draw_random(&mut rng).is_none());
        assert!(catalog.draw_history().is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let json = r#"{
            "cards": [
                {
                    "id": "SIDE010",
                    "name": "Tutoring",
                    "type": "side_business",
                    "cost_cents": 50000,
                    "monthly_cash_flow_cents": 20000
                },
                {"id": "BROKEN", "name": "No terms"},
                {
                    "id": "FIN010",
                    "name": "Bond fund",
                    "type": "financial",
                    "price_per_share_cents": 2000,
                    "dividend_per_share_cents": 40
                }
            ]
        }"#;
        let catalog = CardCatalog::from_json(json).unwrap();
        assert_eq!(catalog.total_cards(), 2);
        assert_eq!(catalog.skipped_entries(), 1);
        // Defaulted share bounds apply when the data file omits them.
        let bond = catalog.get_by_id("FIN010").unwrap();
        assert_eq!(bond.required_cash_cents(None), 2_000);
    }
}
