//! Per-player financial ledger: cash, holdings, income statement.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use thiserror::Error;

use crate::board::{Direction, Ring, entry_direction};
use crate::cards::CardKind;
use crate::professions::Profession;

/// Bounded length of the per-player income history.
const INCOME_HISTORY_WINDOW: usize = 64;

/// Holdings stay inline for the common case of a handful of positions.
pub type Holdings<T> = SmallVec<[T; 4]>;

/// Share economics attached to a financial asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLot {
    pub shares: u32,
    pub price_per_share_cents: i64,
    pub dividend_per_share_cents: i64,
}

/// An owned income-producing position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub kind: CardKind,
    pub cost_cents: i64,
    pub passive_income_cents: i64,
    #[serde(default)]
    pub shares: Option<ShareLot>,
}

impl Asset {
    #[must_use]
    pub fn new(name: &str, kind: CardKind, cost_cents: i64, passive_income_cents: i64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            cost_cents,
            passive_income_cents,
            shares: None,
        }
    }

    /// A share-denominated asset; cost and income derive from the lot.
    #[must_use]
    pub fn financial(
        name: &str,
        shares: u32,
        price_per_share_cents: i64,
        dividend_per_share_cents: i64,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: CardKind::Financial,
            cost_cents: price_per_share_cents * i64::from(shares),
            passive_income_cents: dividend_per_share_cents * i64::from(shares),
            shares: Some(ShareLot {
                shares,
                price_per_share_cents,
                dividend_per_share_cents,
            }),
        }
    }
}

/// A recurring monthly obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liability {
    pub name: String,
    pub expense_cents: i64,
}

impl Liability {
    #[must_use]
    pub fn new(name: &str, expense_cents: i64) -> Self {
        Self {
            name: name.to_string(),
            expense_cents,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    Salary,
    PassiveIncome,
    Expenses,
}

/// One recorded cash movement, newest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: LedgerEntryKind,
    pub amount_cents: i64,
}

/// Errors raised when a player-to-player asset sale cannot complete.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("seller does not hold asset index {index}")]
    UnknownAsset { index: usize },
    #[error("buyer cannot afford the sale (required {required_cents} cents, available {available_cents} cents)")]
    InsufficientFunds {
        required_cents: i64,
        available_cents: i64,
    },
}

/// A seated player and their complete financial position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub profession: String,
    pub salary_cents: i64,
    pub cash_cents: i64,
    pub passive_income_cents: i64,
    pub base_expenses_cents: i64,
    pub expenses_cents: i64,
    #[serde(default)]
    pub children: u8,
    #[serde(default)]
    pub downsized_turns: u8,
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub ring: Ring,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub assets: Holdings<Asset>,
    #[serde(default)]
    pub liabilities: Holdings<Liability>,
    #[serde(default)]
    income_history: VecDeque<LedgerEntry>,
}

impl Player {
    /// Seat a player using a profession template's starting economics.
    #[must_use]
    pub fn from_profession(name: &str, profession: &Profession) -> Self {
        Self {
            name: name.to_string(),
            profession: profession.name.clone(),
            salary_cents: profession.salary_cents,
            cash_cents: profession.starting_cash_cents,
            passive_income_cents: 0,
            base_expenses_cents: profession.base_expenses_cents,
            expenses_cents: profession.base_expenses_cents,
            children: 0,
            downsized_turns: 0,
            position: 0,
            ring: Ring::Middle,
            direction: Direction::Forward,
            assets: Holdings::new(),
            liabilities: Holdings::new(),
            income_history: VecDeque::new(),
        }
    }

    fn record(&mut self, kind: LedgerEntryKind, amount_cents: i64) {
        if self.income_history.len() >= INCOME_HISTORY_WINDOW {
            self.income_history.pop_front();
        }
        self.income_history.push_back(LedgerEntry { kind, amount_cents });
    }

    pub fn receive_salary(&mut self) {
        self.cash_cents += self.salary_cents;
        self.record(LedgerEntryKind::Salary, self.salary_cents);
    }

    pub fn receive_passive_income(&mut self) {
        self.cash_cents += self.passive_income_cents;
        self.record(LedgerEntryKind::PassiveIncome, self.passive_income_cents);
    }

    pub fn pay_expenses(&mut self) {
        self.cash_cents -= self.expenses_cents;
        self.record(LedgerEntryKind::Expenses, -self.expenses_cents);
    }

    pub fn add_asset(&mut self, asset: Asset) {
        self.passive_income_cents += asset.passive_income_cents;
        self.assets.push(asset);
    }

    pub fn add_liability(&mut self, liability: Liability) {
        self.expenses_cents += liability.expense_cents;
        self.liabilities.push(liability);
    }

    /// Release a held asset (a sale), returning it with its passive income
    /// already deducted from the ledger.
    pub fn remove_asset(&mut self, index: usize) -> Option<Asset> {
        if index >= self.assets.len() {
            return None;
        }
        let asset = self.assets.remove(index);
        self.passive_income_cents -= asset.passive_income_cents;
        Some(asset)
    }

    /// Win condition: passive income covers expenses.
    #[must_use]
    pub const fn is_financially_free(&self) -> bool {
        self.passive_income_cents >= self.expenses_cents
    }

    /// Sell a held asset to another player. Both ledgers mutate together or
    /// not at all.
    ///
    /// # Errors
    ///
    /// Returns `TransferError` when the asset index is unknown or the buyer
    /// cannot afford the price; neither ledger changes in that case.
    pub fn transfer_asset_to(
        &mut self,
        buyer: &mut Self,
        asset_index: usize,
        price_cents: i64,
    ) -> Result<(), TransferError> {
        if asset_index >= self.assets.len() {
            return Err(TransferError::UnknownAsset { index: asset_index });
        }
        if buyer.cash_cents < price_cents {
            return Err(TransferError::InsufficientFunds {
                required_cents: price_cents,
                available_cents: buyer.cash_cents,
            });
        }
        let asset = self.assets.remove(asset_index);
        self.passive_income_cents -= asset.passive_income_cents;
        self.cash_cents += price_cents;
        buyer.cash_cents -= price_cents;
        buyer.add_asset(asset);
        Ok(())
    }

    /// Move the player onto a ring at a given cell, resetting direction per
    /// the entry rule.
    pub fn enter_ring(&mut self, ring: Ring, position: usize) {
        self.ring = ring;
        self.position = position;
        self.direction = entry_direction(ring, position);
    }

    #[must_use]
    pub fn assets_passive_income_cents(&self) -> i64 {
        self.assets.iter().map(|a| a.passive_income_cents).sum()
    }

    #[must_use]
    pub fn liabilities_expense_cents(&self) -> i64 {
        self.liabilities.iter().map(|l| l.expense_cents).sum()
    }

    #[must_use]
    pub fn income_history(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.income_history.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::professions::ProfessionsList;

    fn engineer() -> Player {
        let professions = ProfessionsList::default_list();
        Player::from_profession("Alice", professions.get_by_id("engineer").unwrap())
    }

    #[test]
    fn paycheck_cycle_matches_ledger_math() {
        let mut player = engineer();
        player.cash_cents = 1_000_000;
        player.expenses_cents = 200_000;
        player.salary_cents = 500_000;

        player.receive_salary();
        player.receive_passive_income();
        player.pay_expenses();

        assert_eq!(player.cash_cents, 1_300_000);
        assert_eq!(player.passive_income_cents, 0);
        let kinds: Vec<_> = player.income_history().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LedgerEntryKind::Salary,
                LedgerEntryKind::PassiveIncome,
                LedgerEntryKind::Expenses
            ]
        );
    }

    #[test]
    fn holdings_keep_passive_income_and_expense_sums() {
        let mut player = engineer();
        player.add_asset(Asset::new("Laundromat", CardKind::Enterprise, 3_000_000, 80_000));
        player.add_asset(Asset::financial("Index fund", 10, 10_000, 200));
        player.add_liability(Liability::new("Laundromat loan", 20_000));

        assert_eq!(player.passive_income_cents, 82_000);
        assert_eq!(player.passive_income_cents, player.assets_passive_income_cents());
        assert_eq!(
            player.expenses_cents,
            player.base_expenses_cents + player.liabilities_expense_cents()
        );

        let sold = player.remove_asset(0).unwrap();
        assert_eq!(sold.name, "Laundromat");
        assert_eq!(player.passive_income_cents, 2_000);
        assert!(player.remove_asset(5).is_none());
    }

    #[test]
    fn transfer_moves_asset_and_cash_atomically() {
        let mut seller = engineer();
        let mut buyer = engineer();
        buyer.cash_cents = 700_000;
        seller.add_asset(Asset::new("Condo", CardKind::Opportunity, 8_000_000, 80_000));
        let seller_cash = seller.cash_cents;

        seller
            .transfer_asset_to(&mut buyer, 0, 700_000)
            .expect("transfer succeeds");

        assert!(seller.assets.is_empty());
        assert_eq!(seller.passive_income_cents, 0);
        assert_eq!(seller.cash_cents, seller_cash + 700_000);
        assert_eq!(buyer.cash_cents, 0);
        assert_eq!(buyer.passive_income_cents, 80_000);
        assert_eq!(buyer.assets.len(), 1);
    }

    #[test]
    fn failed_transfer_leaves_both_ledgers_unchanged() {
        let mut seller = engineer();
        let mut buyer = engineer();
        buyer.cash_cents = 100;
        seller.add_asset(Asset::new("Condo", CardKind::Opportunity, 8_000_000, 80_000));

        let seller_before = seller.clone();
        let buyer_before = buyer.clone();

        let err = seller.transfer_asset_to(&mut buyer, 0, 700_000).unwrap_err();
        assert_eq!(
            err,
            TransferError::InsufficientFunds {
                required_cents: 700_000,
                available_cents: 100
            }
        );
        assert_eq!(seller, seller_before);
        assert_eq!(buyer, buyer_before);

        let err = seller.transfer_asset_to(&mut buyer, 3, 1).unwrap_err();
        assert_eq!(err, TransferError::UnknownAsset { index: 3 });
        assert_eq!(seller, seller_before);
        assert_eq!(buyer, buyer_before);
    }

    #[test]
    fn ring_entry_resets_direction() {
        let mut player = engineer();
        player.enter_ring(Ring::Inner, 9);
        assert_eq!(player.direction, Direction::Backward);
        player.enter_ring(Ring::Inner, 1);
        assert_eq!(player.direction, Direction::Forward);
        player.enter_ring(Ring::Middle, 18);
        assert_eq!(player.direction, Direction::Forward);
    }

    #[test]
    fn income_history_stays_bounded() {
        let mut player = engineer();
        for _ in 0..100 {
            player.receive_salary();
        }
        assert_eq!(player.income_history().count(), INCOME_HISTORY_WINDOW);
    }
}
