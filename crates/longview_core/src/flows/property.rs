//! Home-ownership carrying costs and the rent that replaces them after a
//! sale.
//!
//! The property flow amortizes the mortgage (fixed P&I split into interest
//! and principal against the remaining balance) and pays escrow and
//! maintenance, all out of Cash. Once the Property bucket is empty - a
//! forced liquidation sold the house - the carrying costs stop and the
//! rent flow takes over.

use serde::{Deserialize, Serialize};

use crate::flows::{Books, TickContext};
use crate::model::{CASH_BUCKET, FlowKind};
use crate::taxes::TaxFlows;

/// Inflation categories for the escrow and upkeep components.
const TAXES_CATEGORY: &str = "Property Taxes";
const INSURANCE_CATEGORY: &str = "Property Insurance";
const MAINTENANCE_CATEGORY: &str = "Property Maintenance";
const RENT_CATEGORY: &str = "Rent";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyFlow {
    /// The bucket carrying the home's market value.
    property_bucket: String,
    /// Fixed monthly principal-and-interest payment.
    monthly_pi: f64,
    apr: f64,
    remaining_principal: f64,
    monthly_taxes: f64,
    monthly_insurance: f64,
    /// Annual upkeep as a fraction of market value.
    maintenance_rate: f64,
    #[serde(skip)]
    last: TaxFlows,
}

impl PropertyFlow {
    #[must_use]
    pub fn new(
        property_bucket: String,
        monthly_pi: f64,
        apr: f64,
        remaining_principal: f64,
        monthly_taxes: f64,
        monthly_insurance: f64,
        maintenance_rate: f64,
    ) -> Self {
        Self {
            property_bucket,
            monthly_pi,
            apr,
            remaining_principal,
            monthly_taxes,
            monthly_insurance,
            maintenance_rate,
            last: TaxFlows::default(),
        }
    }

    #[must_use]
    pub fn remaining_principal(&self) -> f64 {
        self.remaining_principal
    }

    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        self.last = TaxFlows::default();
        let market_value = books.buckets.balance_of(&self.property_bucket);
        if market_value <= 0.0 {
            // Sold; carrying costs end.
            return;
        }
        let month = ctx.month;
        let year = month.year;

        // P&I runs until the principal is retired; escrow and upkeep outlive it.
        if self.remaining_principal > 0.0 {
            let interest = self.remaining_principal * self.apr / 12.0;
            let principal_part = (self.monthly_pi - interest).min(self.remaining_principal).max(0.0);
            self.remaining_principal -= principal_part;
            let payment = interest + principal_part;
            books.withdraw(CASH_BUCKET, payment, "Mortgage", month, FlowKind::Withdraw);
        }

        let taxes = self.monthly_taxes * ctx.categories.multiplier(TAXES_CATEGORY, year);
        books.withdraw(CASH_BUCKET, taxes, "Property Taxes", month, FlowKind::Withdraw);

        let insurance = self.monthly_insurance * ctx.categories.multiplier(INSURANCE_CATEGORY, year);
        books.withdraw(CASH_BUCKET, insurance, "Property Insurance", month, FlowKind::Withdraw);

        let maintenance = market_value * self.maintenance_rate / 12.0
            * ctx.categories.multiplier(MAINTENANCE_CATEGORY, year);
        books.withdraw(CASH_BUCKET, maintenance, "Property Maintenance", month, FlowKind::Withdraw);
    }

    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        self.last
    }
}

/// Housing cost after the property is sold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentFlow {
    property_bucket: String,
    /// Monthly rent in base-year dollars.
    monthly_rent: f64,
    #[serde(skip)]
    last: TaxFlows,
}

impl RentFlow {
    #[must_use]
    pub fn new(property_bucket: String, monthly_rent: f64) -> Self {
        Self { property_bucket, monthly_rent, last: TaxFlows::default() }
    }

    pub fn apply(&mut self, books: &mut Books, ctx: &TickContext<'_>) {
        self.last = TaxFlows::default();
        if books.buckets.balance_of(&self.property_bucket) > 0.0 {
            return;
        }
        let rent = self.monthly_rent * ctx.categories.multiplier(RENT_CATEGORY, ctx.month.year);
        books.withdraw(CASH_BUCKET, rent, "Rent", ctx.month, FlowKind::Withdraw);
    }

    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        self.last
    }
}
