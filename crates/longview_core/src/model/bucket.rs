//! Buckets - named balance containers with weighted holdings.
//!
//! A bucket's balance is the sum of its holdings' amounts. Deposits allocate
//! proportionally by configured weight (the last holding absorbs rounding
//! residue so totals stay exact); withdrawals draw proportionally from
//! current amounts. Non-cash buckets never go negative: an underfunded
//! withdraw moves nothing and the caller records a warning.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::ledger::{FlowKind, Ledger};
use crate::month::Month;

/// Name of the distinguished liquidity bucket.
pub const CASH_BUCKET: &str = "Cash";

/// Tax classification of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketKind {
    Cash,
    Taxable,
    TaxDeferred,
    TaxFree,
    Property,
    Other,
}

impl BucketKind {
    /// Tax-deferred or tax-free: untouchable before the taxable-eligibility
    /// month and the SEPP freeze both key off this.
    #[must_use]
    pub fn is_tax_advantaged(self) -> bool {
        matches!(self, BucketKind::TaxDeferred | BucketKind::TaxFree)
    }
}

/// A weighted slice of a bucket tied to an asset class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub asset_class: String,
    pub weight: f64,
    pub amount: f64,
    pub cost_basis: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub kind: BucketKind,
    pub holdings: Vec<Holding>,
    pub may_go_negative: bool,
    pub cash_fallback: bool,
}

impl Bucket {
    #[must_use]
    pub fn balance(&self) -> f64 {
        self.holdings.iter().map(|h| h.amount).sum()
    }

    /// Distribute `amount` across holdings by configured weight; the last
    /// holding absorbs the rounding residue so the bucket grows by exactly
    /// `amount`. Records a single ledger entry.
    pub fn deposit(
        &mut self,
        amount: f64,
        source: &str,
        month: Month,
        kind: FlowKind,
        ledger: &mut Ledger,
    ) {
        if amount <= 0.0 {
            return;
        }
        self.put_proportional(amount);
        ledger.record(month, source, self.name.clone(), amount, kind);
    }

    /// Draw `amount` proportionally from current holdings. Moves nothing and
    /// returns 0 when underfunded, unless the bucket may go negative, in
    /// which case the full amount is taken. Records one ledger entry for the
    /// amount actually moved.
    pub fn withdraw(
        &mut self,
        amount: f64,
        target: &str,
        month: Month,
        kind: FlowKind,
        ledger: &mut Ledger,
    ) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        if self.balance() < amount && !self.may_go_negative {
            tracing::warn!(
                bucket = %self.name,
                requested = amount,
                balance = self.balance(),
                "withdraw skipped: insufficient balance"
            );
            return 0.0;
        }
        self.take_proportional(amount);
        ledger.record(month, self.name.clone(), target, amount, kind);
        amount
    }

    /// Take min(amount, balance), never driving the bucket negative.
    /// Records one ledger entry for the amount moved.
    pub fn partial_withdraw(
        &mut self,
        amount: f64,
        target: &str,
        month: Month,
        kind: FlowKind,
        ledger: &mut Ledger,
    ) -> f64 {
        let moved = amount.min(self.balance()).max(0.0);
        if moved <= 0.0 {
            return 0.0;
        }
        self.take_proportional(moved);
        ledger.record(month, self.name.clone(), target, moved, kind);
        moved
    }

    fn put_proportional(&mut self, amount: f64) {
        debug_assert!(!self.holdings.is_empty(), "bucket {} has no holdings", self.name);
        let last = self.holdings.len() - 1;
        let mut distributed = 0.0;
        for h in &mut self.holdings[..last] {
            let share = amount * h.weight;
            h.amount += share;
            distributed += share;
        }
        // Residue lands on the last holding so the total is exact.
        self.holdings[last].amount += amount - distributed;
    }

    fn take_proportional(&mut self, amount: f64) {
        let balance = self.balance();
        if balance <= 0.0 || self.holdings.len() == 1 {
            // Nothing to prorate against; the first holding carries the
            // balance (overdrawn cash stays a single-holding concern).
            self.holdings[0].amount -= amount;
            return;
        }
        let last = self.holdings.len() - 1;
        let mut taken = 0.0;
        for h in &mut self.holdings[..last] {
            let share = amount * (h.amount / balance);
            h.amount -= share;
            taken += share;
        }
        self.holdings[last].amount -= amount - taken;
    }
}

/// The ordered set of buckets for one trial, with name lookup.
///
/// Iteration order is configuration order everywhere it matters (market
/// returns, snapshots), which keeps trials reproducible.
#[derive(Debug, Clone)]
pub struct Buckets {
    slots: Vec<Bucket>,
    by_name: FxHashMap<String, usize>,
}

impl Buckets {
    #[must_use]
    pub fn new(buckets: Vec<Bucket>) -> Self {
        let by_name = buckets
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();
        Self { slots: buckets, by_name }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Bucket> {
        self.by_name.get(name).map(|&i| &self.slots[i])
    }

    /// Slot index for a bucket name. Indices are stable for the life of the
    /// trial and sidestep holding a borrow across lookup and use.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn at(&self, index: usize) -> &Bucket {
        &self.slots[index]
    }

    pub fn at_mut(&mut self, index: usize) -> &mut Bucket {
        &mut self.slots[index]
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Bucket> {
        self.by_name.get(name).copied().map(|i| &mut self.slots[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bucket> {
        self.slots.iter_mut()
    }

    #[must_use]
    pub fn balance_of(&self, name: &str) -> f64 {
        self.get(name).map_or(0.0, Bucket::balance)
    }

    /// Sum of all bucket balances.
    #[must_use]
    pub fn portfolio_value(&self) -> f64 {
        self.slots.iter().map(Bucket::balance).sum()
    }

    /// Move `amount` between two buckets with a single ledger entry.
    /// The movement is clamped to the source balance unless the source may
    /// go negative. Returns the amount moved.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: f64,
        month: Month,
        ledger: &mut Ledger,
    ) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let Some(&from_idx) = self.by_name.get(from) else {
            tracing::warn!(bucket = from, "transfer skipped: unknown source bucket");
            return 0.0;
        };
        let Some(&to_idx) = self.by_name.get(to) else {
            tracing::warn!(bucket = to, "transfer skipped: unknown target bucket");
            return 0.0;
        };
        if from_idx == to_idx {
            return 0.0;
        }

        let source = &mut self.slots[from_idx];
        let moved = if source.may_go_negative {
            amount
        } else {
            amount.min(source.balance()).max(0.0)
        };
        if moved <= 0.0 {
            return 0.0;
        }
        source.take_proportional(moved);
        self.slots[to_idx].put_proportional(moved);
        ledger.record(month, from, to, moved, FlowKind::Transfer);
        moved
    }

    /// Withdraw up to `amount` from the named bucket, pulling any shortfall
    /// from Cash (which may overdraw if it allows it). Returns the total
    /// obtained.
    pub fn withdraw_with_cash_fallback(
        &mut self,
        name: &str,
        amount: f64,
        target: &str,
        month: Month,
        kind: FlowKind,
        ledger: &mut Ledger,
    ) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let obtained = match self.get_mut(name) {
            Some(bucket) => bucket.partial_withdraw(amount, target, month, kind, ledger),
            None => {
                tracing::warn!(bucket = name, "withdraw skipped: unknown bucket");
                0.0
            }
        };
        let shortfall = amount - obtained;
        if shortfall <= 1e-9 {
            return obtained;
        }
        match self.get_mut(CASH_BUCKET) {
            Some(cash) => obtained + cash.withdraw(shortfall, target, month, kind, ledger),
            None => obtained,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_holding_bucket(name: &str) -> Bucket {
        Bucket {
            name: name.to_string(),
            kind: BucketKind::Taxable,
            holdings: vec![
                Holding {
                    asset_class: "Stocks".to_string(),
                    weight: 0.7,
                    amount: 7_000.0,
                    cost_basis: None,
                },
                Holding {
                    asset_class: "Fixed-Income".to_string(),
                    weight: 0.3,
                    amount: 3_000.0,
                    cost_basis: None,
                },
            ],
            may_go_negative: false,
            cash_fallback: false,
        }
    }

    fn cash_bucket(amount: f64) -> Bucket {
        Bucket {
            name: CASH_BUCKET.to_string(),
            kind: BucketKind::Cash,
            holdings: vec![Holding {
                asset_class: "Cash".to_string(),
                weight: 1.0,
                amount,
                cost_basis: None,
            }],
            may_go_negative: true,
            cash_fallback: false,
        }
    }

    #[test]
    fn deposit_grows_by_exact_amount() {
        let mut bucket = two_holding_bucket("Brokerage");
        let mut ledger = Ledger::new();
        let before = bucket.balance();
        bucket.deposit(1_000.0, "Salary", Month::new(2025, 1), FlowKind::Deposit, &mut ledger);
        assert!((bucket.balance() - before - 1_000.0).abs() < 1e-9);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn weights_stable_under_deposit_withdraw() {
        let mut bucket = two_holding_bucket("Brokerage");
        let mut ledger = Ledger::new();
        let m = Month::new(2025, 1);
        for _ in 0..50 {
            bucket.deposit(997.0, "in", m, FlowKind::Deposit, &mut ledger);
            bucket.withdraw(997.0, "out", m, FlowKind::Withdraw, &mut ledger);
        }
        let balance = bucket.balance();
        assert!((bucket.holdings[0].amount / balance - 0.7).abs() < 1e-6);
        assert!((bucket.holdings[1].amount / balance - 0.3).abs() < 1e-6);
    }

    #[test]
    fn underfunded_withdraw_moves_nothing() {
        let mut bucket = two_holding_bucket("Brokerage");
        let mut ledger = Ledger::new();
        let moved = bucket.withdraw(
            20_000.0,
            "out",
            Month::new(2025, 1),
            FlowKind::Withdraw,
            &mut ledger,
        );
        assert_eq!(moved, 0.0);
        assert!((bucket.balance() - 10_000.0).abs() < 1e-9);
        assert!(ledger.is_empty());
    }

    #[test]
    fn cash_may_overdraw() {
        let mut cash = cash_bucket(100.0);
        let mut ledger = Ledger::new();
        let moved = cash.withdraw(500.0, "taxes", Month::new(2025, 12), FlowKind::Withdraw, &mut ledger);
        assert_eq!(moved, 500.0);
        assert!((cash.balance() + 400.0).abs() < 1e-9);
    }

    #[test]
    fn transfer_preserves_net_worth() {
        let mut buckets = Buckets::new(vec![two_holding_bucket("Brokerage"), cash_bucket(1_000.0)]);
        let mut ledger = Ledger::new();
        let before = buckets.portfolio_value();
        let moved = buckets.transfer("Brokerage", CASH_BUCKET, 2_500.0, Month::new(2025, 4), &mut ledger);
        assert_eq!(moved, 2_500.0);
        assert!((buckets.portfolio_value() - before).abs() < 1e-9);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn cash_fallback_covers_shortfall() {
        let mut buckets = Buckets::new(vec![two_holding_bucket("Brokerage"), cash_bucket(5_000.0)]);
        let mut ledger = Ledger::new();
        let got = buckets.withdraw_with_cash_fallback(
            "Brokerage",
            12_000.0,
            "spending",
            Month::new(2025, 6),
            FlowKind::Withdraw,
            &mut ledger,
        );
        assert!((got - 12_000.0).abs() < 1e-9);
        assert!((buckets.balance_of("Brokerage")).abs() < 1e-9);
        assert!((buckets.balance_of(CASH_BUCKET) - 3_000.0).abs() < 1e-9);
    }
}
