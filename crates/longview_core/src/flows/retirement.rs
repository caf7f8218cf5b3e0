//! Tax-deferred distribution flows: required minimum distributions and
//! 72(t) substantially equal periodic payments.

use serde::{Deserialize, Serialize};

use crate::flows::{Books, TickContext};
use crate::model::{BucketKind, FlowKind, single_life_expectancy, uniform_lifetime_divisor};
use crate::month::Month;
use crate::taxes::TaxFlows;

/// Annual payment under the IRS amortization method:
/// `principal * rate / (1 - (1 + rate)^-life_expectancy)`.
/// A zero rate degenerates to straight-line over the expectancy.
#[must_use]
pub fn amortized_annual_payment(principal: f64, rate: f64, life_expectancy: f64) -> f64 {
    if principal <= 0.0 || life_expectancy <= 0.0 {
        return 0.0;
    }
    if rate == 0.0 {
        return principal / life_expectancy;
    }
    principal * rate / (1.0 - (1.0 + rate).powf(-life_expectancy))
}

/// Required minimum distributions, taken once per year at the configured
/// month once the statutory age is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmdFlow {
    rmd_month: i8,
    start_age: u8,
    /// Proceeds distributed across these buckets by share.
    targets: Vec<(String, f64)>,
    #[serde(skip)]
    last: TaxFlows,
}

impl RmdFlow {
    #[must_use]
    pub fn new(rmd_month: i8, start_age: u8, targets: Vec<(String, f64)>) -> Self {
        Self { rmd_month, start_age, targets, last: TaxFlows::default() }
    }

    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        self.last = TaxFlows::default();
        if ctx.month.month != self.rmd_month || ctx.age_years < i32::from(self.start_age) {
            return;
        }
        let age = ctx.age_years.clamp(0, 255) as u8;
        let Some(divisor) = uniform_lifetime_divisor(age) else {
            return;
        };

        let deferred: Vec<(String, f64)> = books
            .buckets
            .iter()
            .filter(|b| b.kind == BucketKind::TaxDeferred)
            .map(|b| (b.name.clone(), b.balance()))
            .collect();
        let total: f64 = deferred.iter().map(|(_, v)| v).sum();
        if total <= 0.0 {
            return;
        }
        let annual = total / divisor;

        // Draw the distribution from each tax-deferred bucket in proportion
        // to its balance, then fan the proceeds out by target share.
        let mut distributed = 0.0;
        for (name, balance) in &deferred {
            let take = annual * (balance / total);
            distributed +=
                books.withdraw(name, take.min(*balance), "RMD", ctx.month, FlowKind::Withdraw);
        }
        if distributed <= 0.0 {
            return;
        }
        for (target, share) in &self.targets {
            books.deposit(target, distributed * share, "RMD", ctx.month, FlowKind::Deposit);
        }

        // Ordinary income; RMDs are never penalty-eligible.
        self.last.ordinary_withdrawal = distributed;
    }

    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        self.last
    }
}

/// SEPP schedule state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeppState {
    Inactive,
    Active,
    Completed,
}

/// Substantially equal periodic payments over a fixed window.
///
/// The monthly payment is amortized once at the start month from the source
/// balance and cached for the entire window; 72(t) exempts these
/// withdrawals from the early-distribution penalty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeppFlow {
    start: Month,
    end: Month,
    source: String,
    target: String,
    /// Amortization interest rate fixed at schedule creation.
    rate: f64,
    /// Age in whole years at the start month.
    age_at_start: u8,
    state: SeppState,
    monthly: f64,
    #[serde(skip)]
    last: TaxFlows,
}

impl SeppFlow {
    #[must_use]
    pub fn new(start: Month, end: Month, source: String, target: String, rate: f64, age_at_start: u8) -> Self {
        Self {
            start,
            end,
            source,
            target,
            rate,
            age_at_start,
            state: SeppState::Inactive,
            monthly: 0.0,
            last: TaxFlows::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SeppState {
        self.state
    }

    /// The cached monthly payment; 0 until the schedule activates.
    #[must_use]
    pub fn monthly_payment(&self) -> f64 {
        self.monthly
    }

    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        self.last = TaxFlows::default();
        if ctx.month < self.start {
            return;
        }
        if ctx.month > self.end {
            self.state = SeppState::Completed;
            return;
        }

        if self.state == SeppState::Inactive {
            let expectancy = single_life_expectancy(self.age_at_start).unwrap_or(0.0);
            let principal = books.buckets.balance_of(&self.source);
            self.monthly = amortized_annual_payment(principal, self.rate, expectancy) / 12.0;
            self.state = SeppState::Active;
        }

        let moved = books.transfer(&self.source, &self.target, self.monthly, ctx.month);
        // Ordinary income, but 72(t) shields it from the 10% penalty.
        self.last.ordinary_withdrawal = moved;
    }

    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amortization_matches_formula() {
        let expectancy = single_life_expectancy(55).unwrap();
        let annual = amortized_annual_payment(500_000.0, 0.05, expectancy);
        let expected = 500_000.0 * 0.05 / (1.0 - 1.05_f64.powf(-expectancy));
        assert!((annual - expected).abs() < 1e-6);
        assert!(annual > 0.0);
    }

    #[test]
    fn zero_rate_is_straight_line() {
        let annual = amortized_annual_payment(300_000.0, 0.0, 30.0);
        assert!((annual - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn empty_principal_pays_nothing() {
        assert_eq!(amortized_annual_payment(0.0, 0.05, 29.6), 0.0);
    }
}
