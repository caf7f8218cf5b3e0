//! Social Security benefits with SSA claim-age adjustment.
//!
//! The monthly benefit is the full (FRA) benefit scaled by the claim-age
//! adjustment, indexed by cumulative inflation, and scaled by the payout
//! percentage (a lever for modeling future benefit cuts).

use serde::{Deserialize, Serialize};

use crate::flows::{Books, TickContext};
use crate::model::FlowKind;
use crate::month::Month;
use crate::taxes::TaxFlows;

/// SSA early/late claim adjustment factor.
///
/// Claiming before full retirement age reduces the benefit by 5/9 of 1% per
/// month for the first 36 months and 5/12 of 1% per month beyond that.
/// Claiming after full retirement age earns delayed credits of 2/3 of 1%
/// per month, up to age 70.
#[must_use]
pub fn claim_adjustment(start_age_months: i32, full_age_months: i32) -> f64 {
    let diff = start_age_months - full_age_months;
    if diff < 0 {
        let early = -diff;
        let first = early.min(36) as f64;
        let beyond = (early - 36).max(0) as f64;
        1.0 - first * (5.0 / 900.0) - beyond * (5.0 / 1200.0)
    } else {
        let credit_months = diff.min(70 * 12 - full_age_months).max(0) as f64;
        1.0 + credit_months * (2.0 / 300.0)
    }
}

/// One beneficiary's Social Security income stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSecurityFlow {
    birth: Month,
    start_age_months: i32,
    full_age_months: i32,
    /// Monthly benefit at full retirement age, in base-year dollars.
    full_benefit: f64,
    /// Fraction of the statutory benefit actually paid out.
    payout_pct: f64,
    target: String,
    #[serde(skip)]
    last: TaxFlows,
}

impl SocialSecurityFlow {
    #[must_use]
    pub fn new(
        birth: Month,
        start_age_months: i32,
        full_age_months: i32,
        full_benefit: f64,
        payout_pct: f64,
        target: String,
    ) -> Self {
        Self {
            birth,
            start_age_months,
            full_age_months,
            full_benefit,
            payout_pct,
            target,
            last: TaxFlows::default(),
        }
    }

    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        self.last = TaxFlows::default();
        let age_months = ctx.month.months_since(self.birth);
        if age_months < self.start_age_months {
            return;
        }
        let adjustment = claim_adjustment(self.start_age_months, self.full_age_months);
        let monthly = self.full_benefit * adjustment * ctx.modifier * self.payout_pct;
        if monthly <= 0.0 {
            return;
        }
        if books.deposit(&self.target, monthly, "Social Security", ctx.month, FlowKind::Deposit) {
            self.last.social_security = monthly;
        }
    }

    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        self.last
    }
}
