//! Trial configuration: everything the outer loaders hand the engine.
//!
//! A `SimulationConfig` is built once from parsed inputs (bucket layouts,
//! scheduled-flow tables, policies, tax brackets, market parameters) and
//! then shared read-only across every trial. Per-trial mutable state is
//! constructed fresh from it by the engine.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrialError};
use crate::model::{
    Bucket, BucketKind, Buckets, CASH_BUCKET, CategoryProfiles, GainTable, Holding,
    MarketplacePremiums, NormalParams, Profile, TaxTables,
};
use crate::month::Month;
use crate::policy::RefillPolicy;

/// Tolerance for holding weights summing to 1.
const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingConfig {
    pub asset_class: String,
    pub weight: f64,
    pub cost_basis: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    pub name: String,
    pub kind: BucketKind,
    pub holdings: Vec<HoldingConfig>,
    #[serde(default)]
    pub may_go_negative: bool,
    #[serde(default)]
    pub cash_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryConfig {
    pub annual_gross: f64,
    pub annual_bonus: f64,
    pub bonus_month: i8,
    pub merit_rate: f64,
    pub merit_month: i8,
    /// Bucket name -> share of each paycheck.
    pub targets: Vec<(String, f64)>,
    pub retirement_month: Month,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSecurityConfig {
    pub birth: Month,
    pub start_age_months: i32,
    pub full_age_months: i32,
    /// Monthly benefit at full retirement age, base-year dollars.
    pub full_benefit: f64,
    pub payout_pct: f64,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmdConfig {
    pub rmd_month: i8,
    pub start_age: u8,
    pub targets: Vec<(String, f64)>,
}

impl Default for RmdConfig {
    fn default() -> Self {
        Self {
            rmd_month: 12,
            start_age: 75,
            targets: vec![(CASH_BUCKET.to_string(), 1.0)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeppConfig {
    pub start: Month,
    pub end: Month,
    pub source: String,
    pub target: String,
    /// 72(t) amortization rate fixed at schedule creation.
    pub interest_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RothPhaseConfig {
    /// Age window (whole years, inclusive start, exclusive end).
    pub min_age: i32,
    pub max_age: i32,
    pub source: String,
    pub target: String,
    /// Conversions only run while the source holds at least this much.
    pub min_source_balance: f64,
    pub max_conversion: f64,
    /// Ceiling on the year's effective tax rate after conversion.
    pub max_tax_rate: f64,
    pub allow_conversion: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyConfig {
    pub property_bucket: String,
    pub monthly_pi: f64,
    pub apr: f64,
    pub remaining_principal: f64,
    pub monthly_taxes: f64,
    pub monthly_insurance: f64,
    pub maintenance_rate: f64,
    /// Monthly rent charged after the property is sold.
    pub monthly_rent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnemploymentConfig {
    pub start: Month,
    pub end: Month,
    pub monthly: f64,
    pub target: String,
}

/// Everything a trial needs, immutable and shareable across threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// First simulated month; its year is the indexing base year.
    pub start: Month,
    pub profile: Profile,

    pub buckets: Vec<BucketConfig>,
    /// Initial balances by bucket name (the last row of history).
    pub seed_balances: FxHashMap<String, f64>,

    pub fixed_flows: Vec<crate::flows::FlowRow>,
    pub recurring_flows: Vec<crate::flows::RecurringRow>,

    pub salary: Option<SalaryConfig>,
    pub social_security: Vec<SocialSecurityConfig>,
    pub rmd: Option<RmdConfig>,
    pub roth_phases: Vec<RothPhaseConfig>,
    pub sepp: Option<SeppConfig>,
    pub property: Option<PropertyConfig>,
    pub unemployment: Option<UnemploymentConfig>,

    pub policy: RefillPolicy,
    pub tax: TaxTables,

    pub inflation: NormalParams,
    pub category_inflation: CategoryProfiles,
    pub gain_table: GainTable,

    pub premiums: MarketplacePremiums,
}

impl SimulationConfig {
    /// Base year for inflation indexing.
    #[must_use]
    pub fn base_year(&self) -> i16 {
        self.start.year
    }

    /// Number of calendar years the simulation touches.
    #[must_use]
    pub fn simulated_years(&self) -> usize {
        (self.profile.end_month.year - self.start.year + 1).max(1) as usize
    }

    /// Up-front fatal checks; anything that survives validation is at worst
    /// a runtime warning.
    pub fn validate(&self) -> Result<()> {
        if !self.buckets.iter().any(|b| b.name == CASH_BUCKET) {
            return Err(TrialError::MissingBucket(CASH_BUCKET.to_string()));
        }
        for bucket in &self.buckets {
            let sum: f64 = bucket.holdings.iter().map(|h| h.weight).sum();
            if bucket.holdings.is_empty() || (sum - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(TrialError::InvalidWeights { bucket: bucket.name.clone(), sum });
            }
            for holding in &bucket.holdings {
                if !self.gain_table.assets.contains_key(&holding.asset_class) {
                    return Err(TrialError::UnknownAssetClass(holding.asset_class.clone()));
                }
            }
        }
        for (target, sources) in &self.policy.sources {
            for source in sources {
                if !self.buckets.iter().any(|b| &b.name == source) {
                    return Err(TrialError::UnknownPolicySource {
                        target: target.clone(),
                        source: source.clone(),
                    });
                }
            }
        }
        if let Some(sepp) = &self.sepp {
            let age = self.profile.age_years(sepp.start).clamp(0, 255) as u8;
            if sepp.end < sepp.start || crate::model::single_life_expectancy(age).is_none() {
                return Err(TrialError::InvalidSeppWindow { start: sepp.start, end: sepp.end });
            }
        }
        Ok(())
    }

    /// Construct the trial's buckets with seed balances distributed across
    /// holdings by weight; the last holding absorbs rounding residue.
    #[must_use]
    pub fn build_buckets(&self) -> Buckets {
        let buckets = self
            .buckets
            .iter()
            .map(|cfg| {
                let seed = self.seed_balances.get(&cfg.name).copied().unwrap_or(0.0);
                let n = cfg.holdings.len();
                let mut distributed = 0.0;
                let holdings = cfg
                    .holdings
                    .iter()
                    .enumerate()
                    .map(|(i, h)| {
                        let amount = if i + 1 == n {
                            seed - distributed
                        } else {
                            let share = seed * h.weight;
                            distributed += share;
                            share
                        };
                        Holding {
                            asset_class: h.asset_class.clone(),
                            weight: h.weight,
                            amount,
                            cost_basis: h.cost_basis,
                        }
                    })
                    .collect();
                Bucket {
                    name: cfg.name.clone(),
                    kind: cfg.kind,
                    holdings,
                    may_go_negative: cfg.may_go_negative,
                    cash_fallback: cfg.cash_fallback,
                }
            })
            .collect();
        Buckets::new(buckets)
    }
}
