//! Inflation draws and stochastic market returns.
//!
//! Each trial owns one `InflationSeries` (a realized rate per simulated year
//! plus the running cumulative modifier used to index dollar thresholds) and
//! one set of per-category multipliers for scheduled-flow inflation. Market
//! returns are sampled monthly per holding: the year's realized inflation
//! picks a regime (Low / Average / High) per asset class, and the holding's
//! amount is scaled by a Gaussian draw from that regime.
//!
//! Everything that feeds the RNG iterates in sorted order so a trial is
//! bit-identical given the same seed.

use rand::Rng;
use rand::distr::Distribution;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrialError};
use crate::model::bucket::{BucketKind, Buckets};
use crate::model::ledger::{FlowKind, Ledger};
use crate::month::Month;

/// Asset class whose gains in taxable buckets count as ordinary interest.
pub const FIXED_INCOME_CLASS: &str = "Fixed-Income";

/// Ledger label for taxable fixed-income gains.
pub const FIXED_INCOME_INTEREST_LABEL: &str = "Fixed Income Interest";

/// Mean/std-dev pair for a yearly Normal draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalParams {
    pub mean: f64,
    pub std_dev: f64,
}

impl Default for NormalParams {
    fn default() -> Self {
        Self { mean: 0.0, std_dev: 0.0 }
    }
}

impl NormalParams {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, what: &'static str) -> Result<f64> {
        rand_distr::Normal::new(self.mean, self.std_dev)
            .map(|d| d.sample(rng))
            .map_err(|_| TrialError::InvalidDistribution {
                what,
                mean: self.mean,
                std_dev: self.std_dev,
            })
    }
}

/// Per-year realized inflation for one trial.
///
/// `modifier(y)` is the cumulative product of (1 + rate) from the base year
/// through `y`, used to index tax brackets, deductions and benefit amounts.
#[derive(Debug, Clone)]
pub struct InflationSeries {
    base_year: i16,
    rates: Vec<f64>,
    cumulative: Vec<f64>,
}

impl InflationSeries {
    /// Draw `years` realized rates from Normal(mean, std_dev).
    pub fn generate<R: Rng + ?Sized>(
        base_year: i16,
        years: usize,
        params: NormalParams,
        rng: &mut R,
    ) -> Result<Self> {
        let mut rates = Vec::with_capacity(years);
        for _ in 0..years {
            rates.push(params.sample(rng, "inflation")?);
        }
        Ok(Self::from_rates(base_year, rates))
    }

    #[must_use]
    pub fn from_rates(base_year: i16, rates: Vec<f64>) -> Self {
        let mut cumulative = Vec::with_capacity(rates.len());
        let mut acc = 1.0;
        for r in &rates {
            acc *= 1.0 + r;
            cumulative.push(acc);
        }
        Self { base_year, rates, cumulative }
    }

    fn index_of(&self, year: i16) -> Result<usize> {
        let idx = i32::from(year) - i32::from(self.base_year);
        if idx < 0 || idx as usize >= self.rates.len() {
            return Err(TrialError::InflationOutOfRange { year });
        }
        Ok(idx as usize)
    }

    /// Realized rate for the given calendar year.
    pub fn rate(&self, year: i16) -> Result<f64> {
        Ok(self.rates[self.index_of(year)?])
    }

    /// Cumulative modifier from the base year through `year` inclusive.
    pub fn modifier(&self, year: i16) -> Result<f64> {
        Ok(self.cumulative[self.index_of(year)?])
    }

    #[must_use]
    pub fn base_year(&self) -> i16 {
        self.base_year
    }
}

/// Inflation profiles for scheduled-flow categories. Categories without an
/// explicit profile fall back to the baseline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryProfiles {
    pub baseline: NormalParams,
    pub overrides: FxHashMap<String, NormalParams>,
}

/// Per-trial cumulative multipliers per category per year.
#[derive(Debug, Clone)]
pub struct CategoryMultipliers {
    base_year: i16,
    baseline: Vec<f64>,
    by_category: FxHashMap<String, Vec<f64>>,
}

impl CategoryMultipliers {
    /// Draw category rate sequences for one trial. Categories are visited in
    /// sorted order so the draw sequence is reproducible.
    pub fn generate<R: Rng + ?Sized>(
        base_year: i16,
        years: usize,
        profiles: &CategoryProfiles,
        rng: &mut R,
    ) -> Result<Self> {
        let baseline = Self::draw_cumulative(years, profiles.baseline, rng)?;

        let mut names: Vec<&String> = profiles.overrides.keys().collect();
        names.sort();
        let mut by_category = FxHashMap::default();
        for name in names {
            let params = profiles.overrides[name];
            by_category.insert(name.clone(), Self::draw_cumulative(years, params, rng)?);
        }
        Ok(Self { base_year, baseline, by_category })
    }

    fn draw_cumulative<R: Rng + ?Sized>(
        years: usize,
        params: NormalParams,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(years);
        let mut acc = 1.0;
        for _ in 0..years {
            acc *= 1.0 + params.sample(rng, "category inflation")?;
            out.push(acc);
        }
        Ok(out)
    }

    /// Cumulative multiplier for a category from the simulation start year
    /// through `year`. Unknown categories use the baseline; years before the
    /// base year are unscaled.
    #[must_use]
    pub fn multiplier(&self, category: &str, year: i16) -> f64 {
        let idx = i32::from(year) - i32::from(self.base_year);
        if idx < 0 {
            return 1.0;
        }
        let series = self.by_category.get(category).unwrap_or(&self.baseline);
        let idx = (idx as usize).min(series.len().saturating_sub(1));
        series.get(idx).copied().unwrap_or(1.0)
    }
}

/// Return regime selected by the year's realized inflation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Low,
    Average,
    High,
}

/// Monthly return distributions for one asset class, one per regime, plus
/// the inflation cuts that pick between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetReturnProfile {
    pub low_cut: f64,
    pub high_cut: f64,
    pub low: NormalParams,
    pub average: NormalParams,
    pub high: NormalParams,
}

impl AssetReturnProfile {
    #[must_use]
    pub fn regime_for(&self, inflation_rate: f64) -> Regime {
        if inflation_rate < self.low_cut {
            Regime::Low
        } else if inflation_rate > self.high_cut {
            Regime::High
        } else {
            Regime::Average
        }
    }

    #[must_use]
    pub fn params(&self, regime: Regime) -> NormalParams {
        match regime {
            Regime::Low => self.low,
            Regime::Average => self.average,
            Regime::High => self.high,
        }
    }
}

/// Per-asset-class return profiles for the whole simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GainTable {
    pub assets: FxHashMap<String, AssetReturnProfile>,
}

impl GainTable {
    #[must_use]
    pub fn get(&self, asset_class: &str) -> Option<&AssetReturnProfile> {
        self.assets.get(asset_class)
    }
}

/// Metadata record for one tick of market returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReturnRecord {
    pub month: Month,
    pub inflation_rate: f64,
    /// Sampled monthly return per asset class, sorted by class name.
    pub returns: Vec<(String, f64)>,
}

/// Outcome of a market pass: the metadata record plus the slice of gains
/// that counts as ordinary interest for the year.
#[derive(Debug, Clone)]
pub struct MarketOutcome {
    pub record: MonthlyReturnRecord,
    pub fixed_income_interest: f64,
}

/// Apply one month of market returns to every holding of every bucket.
///
/// Gains are credited with the asset class as the ledger source; losses are
/// debited with the asset class as the target. Fixed-income gains inside
/// taxable buckets are labeled as interest and reported separately so the
/// tax log can pick them up as ordinary income.
pub fn apply_market_returns<R: Rng + ?Sized>(
    buckets: &mut Buckets,
    gains: &GainTable,
    month: Month,
    inflation_rate: f64,
    rng: &mut R,
    ledger: &mut Ledger,
) -> Result<MarketOutcome> {
    let mut sampled: FxHashMap<String, f64> = FxHashMap::default();
    let mut fixed_income_interest = 0.0;
    let mut moves: Vec<(String, String, f64, FlowKind)> = Vec::new();

    for bucket in buckets.iter_mut() {
        let taxable = bucket.kind == BucketKind::Taxable;
        let bucket_name = bucket.name.clone();
        for holding in &mut bucket.holdings {
            if holding.amount == 0.0 {
                continue;
            }
            let Some(profile) = gains.get(&holding.asset_class) else {
                return Err(TrialError::UnknownAssetClass(holding.asset_class.clone()));
            };
            let regime = profile.regime_for(inflation_rate);
            let delta = profile.params(regime).sample(rng, "market return")?;
            sampled.insert(holding.asset_class.clone(), delta);

            let change = holding.amount * delta;
            holding.amount += change;
            if change > 0.0 {
                let is_interest = taxable && holding.asset_class == FIXED_INCOME_CLASS;
                let label = if is_interest {
                    fixed_income_interest += change;
                    FIXED_INCOME_INTEREST_LABEL.to_string()
                } else {
                    holding.asset_class.clone()
                };
                moves.push((label, bucket_name.clone(), change, FlowKind::Gain));
            } else if change < 0.0 {
                moves.push((
                    bucket_name.clone(),
                    holding.asset_class.clone(),
                    -change,
                    FlowKind::Loss,
                ));
            }
        }
    }

    for (source, target, amount, kind) in moves {
        ledger.record(month, source, target, amount, kind);
    }

    let mut returns: Vec<(String, f64)> = sampled.into_iter().collect();
    returns.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(MarketOutcome {
        record: MonthlyReturnRecord { month, inflation_rate, returns },
        fixed_income_interest,
    })
}
