//! Integration tests for the forecasting engine.
//!
//! Tests are organized by topic:
//! - `batch` - multi-trial runs, aggregation, trial-level invariants
//! - `buckets` - bucket operations and ledger symmetry (incl. property tests)
//! - `flows` - salary, social security, property, scheduled routing
//! - `policy` - refill cascades and forced liquidations
//! - `sepp` - 72(t) schedule behavior over a full window
//! - `engine` - full-pipeline scenarios and year-end settlement
//! - `determinism` - bit-identical reruns per trial index

mod determinism;
mod flows;

use rustc_hash::FxHashMap;

use crate::config::{BucketConfig, HoldingConfig, SimulationConfig};
use crate::engine::TAX_COLLECTION_BUCKET;
use crate::model::{
    AssetReturnProfile, BucketKind, CASH_BUCKET, CategoryProfiles, GainTable,
    MarketplacePremiums, NormalParams, Profile, TaxBracket, TaxTables, YtdBaseline,
};
use crate::month::Month;
use crate::policy::RefillPolicy;

pub(crate) fn flat_profile(mean: f64) -> AssetReturnProfile {
    AssetReturnProfile {
        low_cut: 0.0,
        high_cut: 0.10,
        low: NormalParams { mean, std_dev: 0.0 },
        average: NormalParams { mean, std_dev: 0.0 },
        high: NormalParams { mean, std_dev: 0.0 },
    }
}

pub(crate) fn standard_gain_table() -> GainTable {
    let mut table = GainTable::default();
    for class in ["Cash", "Stocks", "Fixed-Income", "Property"] {
        table.assets.insert(class.to_string(), flat_profile(0.0));
    }
    table
}

pub(crate) fn single_holding(name: &str, kind: BucketKind, asset: &str) -> BucketConfig {
    BucketConfig {
        name: name.to_string(),
        kind,
        holdings: vec![HoldingConfig {
            asset_class: asset.to_string(),
            weight: 1.0,
            cost_basis: None,
        }],
        may_go_negative: name == CASH_BUCKET,
        cash_fallback: false,
    }
}

/// Deterministic baseline: zero inflation, zero returns, no taxes, a
/// 55-year-old household and the standard five buckets. Tests override the
/// pieces they exercise.
pub(crate) fn base_config() -> SimulationConfig {
    SimulationConfig {
        start: Month::new(2025, 1),
        profile: Profile {
            birth: Month::new(1970, 1),
            dependent_birth: None,
            end_month: Month::new(2025, 12),
            magi: FxHashMap::default(),
            ytd: YtdBaseline::default(),
            filing_jointly: false,
        },
        buckets: vec![
            single_holding(CASH_BUCKET, BucketKind::Cash, "Cash"),
            single_holding("Brokerage", BucketKind::Taxable, "Stocks"),
            single_holding("Deferred", BucketKind::TaxDeferred, "Stocks"),
            single_holding("Roth", BucketKind::TaxFree, "Stocks"),
            single_holding(TAX_COLLECTION_BUCKET, BucketKind::Other, "Cash"),
        ],
        seed_balances: FxHashMap::from_iter([(CASH_BUCKET.to_string(), 50_000.0)]),
        fixed_flows: Vec::new(),
        recurring_flows: Vec::new(),
        salary: None,
        social_security: Vec::new(),
        rmd: None,
        roth_phases: Vec::new(),
        sepp: None,
        property: None,
        unemployment: None,
        policy: RefillPolicy::default(),
        tax: TaxTables::default(),
        inflation: NormalParams::default(),
        category_inflation: CategoryProfiles::default(),
        gain_table: standard_gain_table(),
        premiums: MarketplacePremiums::default(),
    }
}

/// Single flat-rate federal bracket, handy for predictable settlements.
pub(crate) fn flat_tax(rate: f64) -> TaxTables {
    TaxTables {
        ordinary: vec![crate::model::JurisdictionBrackets {
            jurisdiction: "Federal".to_string(),
            brackets: vec![TaxBracket { min_income: 0.0, rate }],
        }],
        ..TaxTables::default()
    }
}
