//! Earned-income flows: salary with merit raises and bonuses, and
//! unemployment benefits.

use serde::{Deserialize, Serialize};

use crate::flows::{Books, TickContext};
use crate::model::{BucketKind, FlowKind};
use crate::month::Month;
use crate::taxes::TaxFlows;

/// Salary distributed across target buckets by share each month until the
/// retirement month. Shares routed to tax-deferred buckets are pre-tax and
/// do not count as salary income for the year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryFlow {
    /// Compounds at each merit month; cached across ticks within a trial.
    annual_gross: f64,
    annual_bonus: f64,
    bonus_month: i8,
    merit_rate: f64,
    merit_month: i8,
    targets: Vec<(String, f64)>,
    retirement_month: Month,
    #[serde(skip)]
    last: TaxFlows,
}

impl SalaryFlow {
    #[must_use]
    pub fn new(
        annual_gross: f64,
        annual_bonus: f64,
        bonus_month: i8,
        merit_rate: f64,
        merit_month: i8,
        targets: Vec<(String, f64)>,
        retirement_month: Month,
    ) -> Self {
        Self {
            annual_gross,
            annual_bonus,
            bonus_month,
            merit_rate,
            merit_month,
            targets,
            retirement_month,
            last: TaxFlows::default(),
        }
    }

    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        self.last = TaxFlows::default();
        if ctx.month >= self.retirement_month {
            return;
        }

        if ctx.month.month == self.merit_month {
            self.annual_gross *= 1.0 + self.merit_rate;
        }

        let mut gross = self.annual_gross / 12.0;
        if ctx.month.month == self.bonus_month {
            gross += self.annual_bonus;
        }

        for (bucket, share) in &self.targets {
            let amount = gross * share;
            if amount <= 0.0 {
                continue;
            }
            let kind = books.buckets.get(bucket).map(|b| b.kind);
            if books.deposit(bucket, amount, "Salary", ctx.month, FlowKind::Deposit) {
                // Pre-tax 401k shares reduce AGI at source.
                if kind != Some(BucketKind::TaxDeferred) {
                    self.last.salary += amount;
                }
            }
        }
    }

    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        self.last
    }
}

/// Flat monthly unemployment benefit within a claim window. Ordinary income
/// but exempt from payroll tax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnemploymentFlow {
    start: Month,
    end: Month,
    monthly: f64,
    target: String,
    #[serde(skip)]
    last: TaxFlows,
}

impl UnemploymentFlow {
    #[must_use]
    pub fn new(start: Month, end: Month, monthly: f64, target: String) -> Self {
        Self { start, end, monthly, target, last: TaxFlows::default() }
    }

    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        self.last = TaxFlows::default();
        if ctx.month < self.start || ctx.month > self.end || self.monthly <= 0.0 {
            return;
        }
        if books.deposit(&self.target, self.monthly, "Unemployment", ctx.month, FlowKind::Deposit) {
            self.last.unemployment = self.monthly;
        }
    }

    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        self.last
    }
}
