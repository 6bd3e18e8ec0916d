//! Investment card templates and purchase execution.
//!
//! Cards are shared immutable templates; a purchase never consumes the
//! template and always constructs fresh `Asset`/`Liability` entries on the
//! buyer's ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::GameConfig;
use crate::ledger::{Asset, Liability, Player};
use crate::money::{format_cents, monthly_loan_payment_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Enterprise,
    Opportunity,
    Financial,
    SideBusiness,
}

impl CardKind {
    pub const ALL: [Self; 4] = [
        Self::Enterprise,
        Self::Opportunity,
        Self::Financial,
        Self::SideBusiness,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enterprise => "enterprise",
            Self::Opportunity => "opportunity",
            Self::Financial => "financial",
            Self::SideBusiness => "side_business",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enterprise" => Ok(Self::Enterprise),
            "opportunity" => Ok(Self::Opportunity),
            "financial" => Ok(Self::Financial),
            "side_business" => Ok(Self::SideBusiness),
            _ => Err(()),
        }
    }
}

/// Kind-specific economics carried on the card template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CardTerms {
    Enterprise {
        cost_cents: i64,
        down_payment_cents: i64,
        monthly_cash_flow_cents: i64,
        #[serde(default)]
        employee_count: u32,
        #[serde(default)]
        management_required: bool,
    },
    Opportunity {
        cost_cents: i64,
        down_payment_cents: i64,
        monthly_cash_flow_cents: i64,
    },
    Financial {
        price_per_share_cents: i64,
        dividend_per_share_cents: i64,
        #[serde(default = "default_min_shares")]
        min_shares: u32,
        #[serde(default = "default_max_shares")]
        max_shares: u32,
    },
    SideBusiness {
        cost_cents: i64,
        monthly_cash_flow_cents: i64,
        #[serde(default)]
        time_cost_hours: u32,
    },
}

const fn default_min_shares() -> u32 {
    1
}

const fn default_max_shares() -> u32 {
    1_000
}

/// An immutable investment-opportunity template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(flatten)]
    pub terms: CardTerms,
}

/// Why a purchase could not be executed. No ledger mutation accompanies any
/// of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("insufficient funds (required {required_cents} cents, available {available_cents} cents)")]
    InsufficientFunds {
        required_cents: i64,
        available_cents: i64,
    },
    #[error("share count {requested} outside allowed range {min}..={max}")]
    InvalidShareCount { requested: u32, min: u32, max: u32 },
}

/// What a completed purchase did to the buyer's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub card_id: String,
    pub detail: String,
    pub spent_cents: i64,
    pub financed_cents: i64,
    pub monthly_income_cents: i64,
}

impl Card {
    #[must_use]
    pub const fn kind(&self) -> CardKind {
        match self.terms {
            CardTerms::Enterprise { .. } => CardKind::Enterprise,
            CardTerms::Opportunity { .. } => CardKind::Opportunity,
            CardTerms::Financial { .. } => CardKind::Financial,
            CardTerms::SideBusiness { .. } => CardKind::SideBusiness,
        }
    }

    /// Cash needed up front for this card, at the given share quantity for
    /// financial cards (minimum lot when unspecified).
    #[must_use]
    pub fn required_cash_cents(&self, quantity: Option<u32>) -> i64 {
        match &self.terms {
            CardTerms::Enterprise {
                down_payment_cents, ..
            }
            | CardTerms::Opportunity {
                down_payment_cents, ..
            } => *down_payment_cents,
            CardTerms::Financial {
                price_per_share_cents,
                min_shares,
                ..
            } => {
                let shares = quantity.unwrap_or(*min_shares);
                price_per_share_cents * i64::from(shares)
            }
            CardTerms::SideBusiness { cost_cents, .. } => *cost_cents,
        }
    }

    #[must_use]
    pub fn can_afford(&self, player: &Player, quantity: Option<u32>) -> bool {
        player.cash_cents >= self.required_cash_cents(quantity)
    }

    /// Financed remainder for loan-backed kinds; zero elsewhere.
    #[must_use]
    pub fn loan_amount_cents(&self) -> i64 {
        match &self.terms {
            CardTerms::Enterprise {
                cost_cents,
                down_payment_cents,
                ..
            }
            | CardTerms::Opportunity {
                cost_cents,
                down_payment_cents,
                ..
            } => (cost_cents - down_payment_cents).max(0),
            CardTerms::Financial { .. } | CardTerms::SideBusiness { .. } => 0,
        }
    }

    /// Largest share count the player could pay for, capped by the card's
    /// maximum. Zero for non-financial cards.
    #[must_use]
    pub fn max_affordable_shares(&self, player: &Player) -> u32 {
        match &self.terms {
            CardTerms::Financial {
                price_per_share_cents,
                max_shares,
                ..
            } => {
                if *price_per_share_cents <= 0 || player.cash_cents <= 0 {
                    return 0;
                }
                let affordable = player.cash_cents / price_per_share_cents;
                u32::try_from(affordable)
                    .unwrap_or(u32::MAX)
                    .min(*max_shares)
            }
            _ => 0,
        }
    }

    /// Months of cash flow needed to recoup an up-front side-business cost.
    #[must_use]
    pub fn payback_months(&self) -> Option<i64> {
        match &self.terms {
            CardTerms::SideBusiness {
                cost_cents,
                monthly_cash_flow_cents,
                ..
            } if *monthly_cash_flow_cents > 0 => {
                // Equivalent to `i64::div_ceil`, which is still unstable for
                // signed integers (`int_roundings`).
                let a = *cost_cents;
                let b = *monthly_cash_flow_cents;
                let q = a / b;
                let r = a % b;
                Some(if r != 0 && ((r > 0) == (b > 0)) { q + 1 } else { q })
            }
            _ => None,
        }
    }

    /// Execute the purchase against the buyer's ledger.
    ///
    /// Enterprise and opportunity cards pay the down payment and finance the
    /// remainder as a liability at the kind's annual rate; financial cards
    /// buy `quantity` shares (minimum lot when unspecified); side businesses
    /// always pay full price with no financing path.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError` when the buyer cannot pay or the share count
    /// is out of bounds; the ledger is untouched on failure.
    pub fn execute_purchase(
        &self,
        player: &mut Player,
        quantity: Option<u32>,
        config: &GameConfig,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        match &self.terms {
            CardTerms::Enterprise {
                cost_cents,
                down_payment_cents,
                monthly_cash_flow_cents,
                ..
            }
            | CardTerms::Opportunity {
                cost_cents,
                down_payment_cents,
                monthly_cash_flow_cents,
            } => self.execute_financed(
                player,
                config,
                *cost_cents,
                *down_payment_cents,
                *monthly_cash_flow_cents,
            ),
            CardTerms::Financial {
                price_per_share_cents,
                dividend_per_share_cents,
                min_shares,
                max_shares,
            } => self.execute_shares(
                player,
                quantity.unwrap_or(*min_shares),
                *price_per_share_cents,
                *dividend_per_share_cents,
                *min_shares,
                *max_shares,
            ),
            CardTerms::SideBusiness {
                cost_cents,
                monthly_cash_flow_cents,
                ..
            } => self.execute_full_price(player, *cost_cents, *monthly_cash_flow_cents),
        }
    }

    fn execute_financed(
        &self,
        player: &mut Player,
        config: &GameConfig,
        cost_cents: i64,
        down_payment_cents: i64,
        monthly_cash_flow_cents: i64,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        if player.cash_cents < down_payment_cents {
            return Err(PurchaseError::InsufficientFunds {
                required_cents: down_payment_cents,
                available_cents: player.cash_cents,
            });
        }
        player.cash_cents -= down_payment_cents;

        let mut financed_cents = 0;
        if cost_cents > down_payment_cents {
            financed_cents = cost_cents - down_payment_cents;
            let rate = config
                .loan_rate_for(self.kind())
                .unwrap_or(config.opportunity_loan_rate);
            let payment = monthly_loan_payment_cents(financed_cents, rate);
            player.add_liability(Liability::new(&format!("{} loan", self.name), payment));
        }
        player.add_asset(Asset::new(
            &self.name,
            self.kind(),
            cost_cents,
            monthly_cash_flow_cents,
        ));

        Ok(PurchaseReceipt {
            card_id: self.id.clone(),
            detail: format!(
                "Purchased {} for {} down",
                self.name,
                format_cents(down_payment_cents)
            ),
            spent_cents: down_payment_cents,
            financed_cents,
            monthly_income_cents: monthly_cash_flow_cents,
        })
    }

    fn execute_shares(
        &self,
        player: &mut Player,
        shares: u32,
        price_per_share_cents: i64,
        dividend_per_share_cents: i64,
        min_shares: u32,
        max_shares: u32,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        if shares < min_shares || shares > max_shares {
            return Err(PurchaseError::InvalidShareCount {
                requested: shares,
                min: min_shares,
                max: max_shares,
            });
        }
        let total_cents = price_per_share_cents * i64::from(shares);
        if player.cash_cents < total_cents {
            return Err(PurchaseError::InsufficientFunds {
                required_cents: total_cents,
                available_cents: player.cash_cents,
            });
        }
        player.cash_cents -= total_cents;
        let asset = Asset::financial(
            &self.name,
            shares,
            price_per_share_cents,
            dividend_per_share_cents,
        );
        let monthly_income_cents = asset.passive_income_cents;
        player.add_asset(asset);

        Ok(PurchaseReceipt {
            card_id: self.id.clone(),
            detail: format!(
                "Bought {shares} shares of {} for {}",
                self.name,
                format_cents(total_cents)
            ),
            spent_cents: total_cents,
            financed_cents: 0,
            monthly_income_cents,
        })
    }

    fn execute_full_price(
        &self,
        player: &mut Player,
        cost_cents: i64,
        monthly_cash_flow_cents: i64,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        if player.cash_cents < cost_cents {
            return Err(PurchaseError::InsufficientFunds {
                required_cents: cost_cents,
                available_cents: player.cash_cents,
            });
        }
        player.cash_cents -= cost_cents;
        player.add_asset(Asset::new(
            &self.name,
            self.kind(),
            cost_cents,
            monthly_cash_flow_cents,
        ));

        Ok(PurchaseReceipt {
            card_id: self.id.clone(),
            detail: format!(
                "Started {} for {}",
                self.name,
                format_cents(cost_cents)
            ),
            spent_cents: cost_cents,
            financed_cents: 0,
            monthly_income_cents: monthly_cash_flow_cents,
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::professions::ProfessionsList;

    fn buyer(cash_cents: i64) -> Player {
        let professions = ProfessionsList::default_list();
        let mut player =
            Player::from_profession("Buyer", professions.get_by_id("engineer").unwrap());
        player.cash_cents = cash_cents;
        player
    }

    fn enterprise_card() -> Card {
        Card {
            id: "ENT001".to_string(),
            name: "Small restaurant".to_string(),
            desc: String::new(),
            terms: CardTerms::Enterprise {
                cost_cents: 5_000_000,
                down_payment_cents: 1_000_000,
                monthly_cash_flow_cents: 120_000,
                employee_count: 3,
                management_required: true,
            },
        }
    }

    fn financial_card() -> Card {
        Card {
            id: "FIN001".to_string(),
            name: "Tech fund".to_string(),
            desc: String::new(),
            terms: CardTerms::Financial {
                price_per_share_cents: 10_000,
                dividend_per_share_cents: 200,
                min_shares: 10,
                max_shares: 1_000,
            },
        }
    }

    #[test]
    fn enterprise_purchase_finances_remainder() {
        let config = GameConfig::default_config();
        let card = enterprise_card();
        let mut player = buyer(1_000_000);

        let receipt = card.execute_purchase(&mut player, None, &config).unwrap();

        assert_eq!(player.cash_cents, 0);
        assert_eq!(receipt.financed_cents, 4_000_000);
        assert_eq!(player.passive_income_cents, 120_000);
        assert_eq!(player.assets.len(), 1);
        assert_eq!(player.liabilities.len(), 1);
        // 40_000.00 at 10% annually -> 333.33 per month.
        assert_eq!(player.liabilities[0].expense_cents, 33_333);
        assert_eq!(player.liabilities[0].name, "Small restaurant loan");
    }

    #[test]
    fn enterprise_purchase_requires_down_payment() {
        let config = GameConfig::default_config();
        let card = enterprise_card();
        let mut player = buyer(999_999);
        let before = player.clone();

        let err = card.execute_purchase(&mut player, None, &config).unwrap_err();
        assert_eq!(
            err,
            PurchaseError::InsufficientFunds {
                required_cents: 1_000_000,
                available_cents: 999_999
            }
        );
        assert_eq!(player, before);
    }

    #[test]
    fn financial_purchase_buys_requested_lot() {
        let config = GameConfig::default_config();
        let card = financial_card();
        let mut player = buyer(500_000);

        let receipt = card
            .execute_purchase(&mut player, Some(10), &config)
            .unwrap();

        assert_eq!(player.cash_cents, 400_000);
        assert_eq!(player.passive_income_cents, 2_000);
        assert_eq!(receipt.monthly_income_cents, 2_000);
        let lot = player.assets[0].shares.unwrap();
        assert_eq!(lot.shares, 10);
    }

    #[test]
    fn financial_purchase_rejects_out_of_range_lots() {
        let config = GameConfig::default_config();
        let card = financial_card();
        let mut player = buyer(50_000_000);
        let before = player.clone();

        let err = card
            .execute_purchase(&mut player, Some(9), &config)
            .unwrap_err();
        assert_eq!(
            err,
            PurchaseError::InvalidShareCount {
                requested: 9,
                min: 10,
                max: 1_000
            }
        );
        let err = card
            .execute_purchase(&mut player, Some(1_001), &config)
            .unwrap_err();
        assert!(matches!(err, PurchaseError::InvalidShareCount { .. }));
        assert_eq!(player, before);
    }

    #[test]
    fn side_business_is_full_price_without_financing() {
        let config = GameConfig::default_config();
        let card = Card {
            id: "SIDE001".to_string(),
            name: "Online store".to_string(),
            desc: String::new(),
            terms: CardTerms::SideBusiness {
                cost_cents: 200_000,
                monthly_cash_flow_cents: 40_000,
                time_cost_hours: 10,
            },
        };
        let mut player = buyer(200_000);

        let receipt = card.execute_purchase(&mut player, None, &config).unwrap();
        assert_eq!(player.cash_cents, 0);
        assert_eq!(receipt.financed_cents, 0);
        assert!(player.liabilities.is_empty());
        assert_eq!(card.payback_months(), Some(5));
    }

    #[test]
    fn card_json_uses_tagged_terms() {
        let json = r#"{
            "id": "OPP001",
            "name": "Rental condo",
            "type": "opportunity",
            "cost_cents": 8000000,
            "down_payment_cents": 1600000,
            "monthly_cash_flow_cents": 80000
        }"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.kind(), CardKind::Opportunity);
        assert_eq!(card.required_cash_cents(None), 1_600_000);
        assert_eq!(card.loan_amount_cents(), 6_400_000);
    }

    #[test]
    fn affordability_queries_cover_share_cards() {
        let card = financial_card();
        let player = buyer(105_000);
        assert!(card.can_afford(&player, Some(10)));
        assert!(!card.can_afford(&player, Some(11)));
        assert_eq!(card.max_affordable_shares(&player), 10);
        assert_eq!(enterprise_card().max_affordable_shares(&player), 0);
    }
}
