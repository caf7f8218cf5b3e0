//! Scheduled cash flows: one-shot rows keyed by month and recurring rows
//! active over a month range.
//!
//! Amounts are inflation-adjusted by the row's category multiplier for the
//! tick's year. Positive amounts deposit into the named bucket; negative
//! amounts withdraw. A withdrawal aimed at a tax-advantaged bucket before
//! the taxable-eligibility month is routed to Cash instead - the account
//! can't actually be tapped yet, so the spending comes out of liquidity.

use serde::{Deserialize, Serialize};

use crate::flows::{Books, TickContext};
use crate::model::{CASH_BUCKET, FlowKind};
use crate::month::Month;
use crate::taxes::TaxFlows;

/// A one-shot scheduled row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRow {
    pub month: Month,
    pub bucket: String,
    /// Positive = deposit, negative = withdrawal, in start-year dollars.
    pub amount: f64,
    /// Inflation category (e.g. "Travel", "Tuition").
    pub category: String,
    pub description: String,
}

/// A recurring scheduled row, active while `start <= m <= end`
/// (no end = open-ended).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringRow {
    pub start: Month,
    pub end: Option<Month>,
    pub bucket: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
}

impl RecurringRow {
    #[must_use]
    pub fn active_at(&self, month: Month) -> bool {
        month >= self.start && self.end.is_none_or(|end| month <= end)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixedFlows {
    rows: Vec<FlowRow>,
    last: TaxFlows,
}

impl FixedFlows {
    #[must_use]
    pub fn new(rows: Vec<FlowRow>) -> Self {
        Self { rows, last: TaxFlows::default() }
    }

    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        self.last = TaxFlows::default();
        for row in &self.rows {
            if row.month == ctx.month {
                apply_row(&row.bucket, row.amount, &row.category, &row.description, books, ctx);
            }
        }
    }

    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        self.last
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecurringFlows {
    rows: Vec<RecurringRow>,
    last: TaxFlows,
}

impl RecurringFlows {
    #[must_use]
    pub fn new(rows: Vec<RecurringRow>) -> Self {
        Self { rows, last: TaxFlows::default() }
    }

    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        self.last = TaxFlows::default();
        for row in &self.rows {
            if row.active_at(ctx.month) {
                apply_row(&row.bucket, row.amount, &row.category, &row.description, books, ctx);
            }
        }
    }

    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        self.last
    }
}

/// Apply a single row's inflation-adjusted amount to its bucket.
fn apply_row(
    bucket: &str,
    amount: f64,
    category: &str,
    description: &str,
    books: &mut Books,
    ctx: &TickContext<'_>,
) {
    let adjusted = amount * ctx.categories.multiplier(category, ctx.month.year);
    if adjusted == 0.0 {
        return;
    }

    if adjusted > 0.0 {
        books.deposit(bucket, adjusted, description, ctx.month, FlowKind::Deposit);
        return;
    }

    let wanted = -adjusted;
    let locked = books
        .buckets
        .get(bucket)
        .map(|b| b.kind.is_tax_advantaged())
        .unwrap_or(false);
    let pre_eligibility = ctx
        .taxable_eligibility
        .is_some_and(|eligible| ctx.month < eligible);

    // Can't tap the account yet; spend from liquidity instead.
    let from = if locked && pre_eligibility { CASH_BUCKET } else { bucket };

    books.withdraw(from, wanted, description, ctx.month, FlowKind::Withdraw);
}
