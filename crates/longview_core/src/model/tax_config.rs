//! Raw tax bracket configuration.
//!
//! All dollar thresholds here are expressed in base-year dollars; the
//! calculator indexes them with the trial's cumulative inflation modifier
//! before evaluation. Brackets are (min income, rate) pairs sorted by min;
//! the top bracket extends to infinity.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One progressive bracket: the rate applied to income above `min_income`
/// (up to the next bracket's min).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: f64,
    pub rate: f64,
}

/// A jurisdiction's ordinary-income brackets (federal, state, local, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JurisdictionBrackets {
    pub jurisdiction: String,
    pub brackets: Vec<TaxBracket>,
}

/// One IRMAA tier: the MAGI ceiling it applies up to, and the monthly
/// Part B / Part D surcharges per covered person.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IrmaaTier {
    pub magi_cap: f64,
    pub part_b_surcharge: f64,
    pub part_d_surcharge: f64,
}

/// Monthly ACA marketplace plan premiums (pre-65 coverage).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MarketplacePremiums {
    pub family_monthly: f64,
    pub couple_monthly: f64,
}

/// The full bracket configuration shared read-only across trials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxTables {
    /// Standard deduction in base-year dollars.
    pub standard_deduction: f64,
    /// Ordinary-income brackets per jurisdiction, applied in order.
    pub ordinary: Vec<JurisdictionBrackets>,
    /// Social Security payroll brackets (rate up to the wage base, then 0).
    pub social_security_payroll: Vec<TaxBracket>,
    /// Medicare payroll brackets (base rate, surtax above the threshold).
    pub medicare_payroll: Vec<TaxBracket>,
    /// Long-term capital gains brackets.
    pub ltcg: Vec<TaxBracket>,
    /// Social Security taxability: provisional-income thresholds mapped to
    /// inclusion rates (0 / 0.5 / 0.85).
    pub ss_taxability: Vec<TaxBracket>,
    /// IRMAA tiers sorted by MAGI cap; the last tier should carry an
    /// effectively unbounded cap.
    pub irmaa_tiers: Vec<IrmaaTier>,
    /// Medicare base premiums per covered person per month.
    pub medicare_part_b_base: f64,
    pub medicare_part_d_base: f64,
    /// Early-withdrawal penalty rate on penalty-eligible amounts.
    pub penalty_rate: f64,
}

impl TaxTables {
    /// Find the IRMAA tier for a MAGI, with tier caps indexed by the
    /// cumulative inflation `modifier`. Falls back to the last tier when
    /// the MAGI exceeds every configured cap.
    #[must_use]
    pub fn irmaa_tier_for(&self, magi: f64, modifier: f64) -> Option<&IrmaaTier> {
        self.irmaa_tiers
            .iter()
            .find(|t| magi <= t.magi_cap * modifier)
            .or_else(|| self.irmaa_tiers.last())
    }
}

impl Default for TaxTables {
    fn default() -> Self {
        Self {
            standard_deduction: 0.0,
            ordinary: Vec::new(),
            social_security_payroll: Vec::new(),
            medicare_payroll: Vec::new(),
            ltcg: Vec::new(),
            ss_taxability: Vec::new(),
            irmaa_tiers: Vec::new(),
            medicare_part_b_base: 0.0,
            medicare_part_d_base: 0.0,
            penalty_rate: 0.10,
        }
    }
}

/// Year-to-date baselines as of simulation start, so the first simulated
/// year's taxes cover the whole calendar year.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct YtdBaseline {
    pub salary: f64,
    pub ordinary_withdrawals: f64,
    pub taxable_gains: f64,
    pub social_security: f64,
    pub fixed_income_interest: f64,
    pub unemployment: f64,
    pub tax_paid: f64,
}

/// Household profile consumed by premium gating and tax settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub birth: crate::month::Month,
    pub dependent_birth: Option<crate::month::Month>,
    pub end_month: crate::month::Month,
    /// Historical MAGI by calendar year, for IRMAA look-back and the
    /// marketplace premium cap. Years already simulated use the trial's own
    /// tax records instead.
    pub magi: FxHashMap<i16, f64>,
    pub ytd: YtdBaseline,
    /// Doubles Medicare premiums and selects couple marketplace plans.
    pub filing_jointly: bool,
}

impl Profile {
    /// Age in whole months at the given month.
    #[must_use]
    pub fn age_months(&self, month: crate::month::Month) -> i32 {
        month.months_since(self.birth)
    }

    /// Age in whole years at the given month.
    #[must_use]
    pub fn age_years(&self, month: crate::month::Month) -> i32 {
        self.age_months(month) / 12
    }

    /// Dependent's age in years, if a dependent is configured.
    #[must_use]
    pub fn dependent_age_years(&self, month: crate::month::Month) -> Option<i32> {
        self.dependent_birth.map(|b| month.months_since(b) / 12)
    }
}
