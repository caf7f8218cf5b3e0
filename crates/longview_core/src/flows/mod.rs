//! Transaction types applied by the monthly pipeline.
//!
//! Every concrete flow implements the same contract: `apply` mutates bucket
//! balances and the ledger for one month, and `tax_flows` reports that
//! month's contribution to the tax-relevant categories (zero for categories
//! the flow does not touch). The engine applies each transaction once per
//! tick and folds the reported flows into the yearly log.
//!
//! Polymorphism is a sum type, not a trait object: the pipeline dispatches
//! over `Transaction` variants so the set of flow kinds is closed and the
//! per-tick query loop is branch-predictable.

mod income;
mod property;
mod refill;
mod retirement;
mod scheduled;
mod social_security;

pub use income::{SalaryFlow, UnemploymentFlow};
pub use property::{PropertyFlow, RentFlow};
pub use refill::RefillTransaction;
pub use retirement::{RmdFlow, SeppFlow, amortized_annual_payment};
pub use scheduled::{FixedFlows, FlowRow, RecurringFlows, RecurringRow};
pub use social_security::{SocialSecurityFlow, claim_adjustment};

use crate::model::{Buckets, CategoryMultipliers, FlowKind, Ledger, TrialWarning, WarningKind};
use crate::month::Month;
use crate::taxes::TaxFlows;

/// Mutable per-trial books shared by every flow: balances, the audit
/// ledger, and collected warnings.
#[derive(Debug)]
pub struct Books {
    pub buckets: Buckets,
    pub ledger: Ledger,
    pub warnings: Vec<TrialWarning>,
}

impl Books {
    #[must_use]
    pub fn new(buckets: Buckets) -> Self {
        Self {
            buckets,
            ledger: Ledger::new(),
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, month: Month, kind: WarningKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%month, ?kind, "{message}");
        self.warnings.push(TrialWarning { month, kind, message });
    }

    /// Deposit into a named bucket. Unknown buckets are a warning and the
    /// operation is skipped.
    pub fn deposit(
        &mut self,
        bucket: &str,
        amount: f64,
        source: &str,
        month: Month,
        kind: FlowKind,
    ) -> bool {
        let Some(idx) = self.buckets.index_of(bucket) else {
            unknown_bucket_warning(self, month, bucket, "deposit");
            return false;
        };
        self.buckets.at_mut(idx).deposit(amount, source, month, kind, &mut self.ledger);
        true
    }

    /// Withdraw from a named bucket; 0 on unknown bucket or insufficient
    /// balance, with the condition recorded as a warning.
    pub fn withdraw(
        &mut self,
        bucket: &str,
        amount: f64,
        target: &str,
        month: Month,
        kind: FlowKind,
    ) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let Some(idx) = self.buckets.index_of(bucket) else {
            unknown_bucket_warning(self, month, bucket, "withdrawal");
            return 0.0;
        };
        let underfunded = {
            let b = self.buckets.at(idx);
            b.cash_fallback && !b.may_go_negative && b.balance() < amount
        };
        if underfunded {
            // Declared fallback buckets top up the shortfall from Cash.
            return self.buckets.withdraw_with_cash_fallback(
                bucket,
                amount,
                target,
                month,
                kind,
                &mut self.ledger,
            );
        }
        let moved = self.buckets.at_mut(idx).withdraw(amount, target, month, kind, &mut self.ledger);
        if moved == 0.0 {
            self.warn(
                month,
                WarningKind::InsufficientFunds,
                format!("withdrawal of {amount:.2} from {bucket:?} skipped: insufficient balance"),
            );
        }
        moved
    }

    /// Withdraw up to `amount` from a bucket with any shortfall pulled from
    /// Cash.
    pub fn withdraw_with_fallback(
        &mut self,
        bucket: &str,
        amount: f64,
        target: &str,
        month: Month,
        kind: FlowKind,
    ) -> f64 {
        if self.buckets.index_of(bucket).is_none() {
            unknown_bucket_warning(self, month, bucket, "withdrawal");
            return 0.0;
        }
        self.buckets
            .withdraw_with_cash_fallback(bucket, amount, target, month, kind, &mut self.ledger)
    }

    /// Bucket-to-bucket transfer with a single ledger entry.
    pub fn transfer(&mut self, from: &str, to: &str, amount: f64, month: Month) -> f64 {
        if self.buckets.index_of(from).is_none() {
            unknown_bucket_warning(self, month, from, "transfer");
            return 0.0;
        }
        if self.buckets.index_of(to).is_none() {
            unknown_bucket_warning(self, month, to, "transfer");
            return 0.0;
        }
        self.buckets.transfer(from, to, amount, month, &mut self.ledger)
    }
}

/// Read-only context for one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub month: Month,
    /// Cumulative inflation modifier for the tick's year.
    pub modifier: f64,
    pub categories: &'a CategoryMultipliers,
    /// First month tax-advantaged buckets may be tapped.
    pub taxable_eligibility: Option<Month>,
    /// Household age in whole years at this tick.
    pub age_years: i32,
}

/// The closed set of scheduled and policy flows the pipeline applies each
/// tick. SEPP and Roth conversions are sequenced separately by the engine
/// and are not members.
#[derive(Debug, Clone)]
pub enum Transaction {
    Fixed(FixedFlows),
    Recurring(RecurringFlows),
    Salary(SalaryFlow),
    SocialSecurity(SocialSecurityFlow),
    Rmd(RmdFlow),
    Property(PropertyFlow),
    Rent(RentFlow),
    Unemployment(UnemploymentFlow),
}

impl Transaction {
    /// Apply this flow's effect for the month. Getters afterwards report
    /// exactly this month's contribution.
    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        match self {
            Transaction::Fixed(f) => f.apply(books, ctx),
            Transaction::Recurring(f) => f.apply(books, ctx),
            Transaction::Salary(f) => f.apply(books, ctx),
            Transaction::SocialSecurity(f) => f.apply(books, ctx),
            Transaction::Rmd(f) => f.apply(books, ctx),
            Transaction::Property(f) => f.apply(books, ctx),
            Transaction::Rent(f) => f.apply(books, ctx),
            Transaction::Unemployment(f) => f.apply(books, ctx),
        }
    }

    /// The last applied month's tax-relevant flow breakdown.
    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        match self {
            Transaction::Fixed(f) => f.tax_flows(),
            Transaction::Recurring(f) => f.tax_flows(),
            Transaction::Salary(f) => f.tax_flows(),
            Transaction::SocialSecurity(f) => f.tax_flows(),
            Transaction::Rmd(f) => f.tax_flows(),
            Transaction::Property(f) => f.tax_flows(),
            Transaction::Rent(f) => f.tax_flows(),
            Transaction::Unemployment(f) => f.tax_flows(),
        }
    }
}

pub(crate) fn unknown_bucket_warning(books: &mut Books, month: Month, bucket: &str, what: &str) {
    books.warn(
        month,
        WarningKind::UnknownBucket,
        format!("{what} names unknown bucket {bucket:?}; skipped"),
    );
}
