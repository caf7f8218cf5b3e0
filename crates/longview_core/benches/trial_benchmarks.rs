//! Benchmarks for single-trial and small-batch forecasting.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rustc_hash::FxHashMap;

use longview_core::config::{BucketConfig, HoldingConfig, SimulationConfig};
use longview_core::model::{
    AssetReturnProfile, BucketKind, CASH_BUCKET, CategoryProfiles, GainTable,
    MarketplacePremiums, NormalParams, Profile, TaxTables, YtdBaseline,
};
use longview_core::month::Month;
use longview_core::policy::RefillPolicy;
use longview_core::{run_trial, run_trials};

fn bench_config() -> SimulationConfig {
    let mut gain_table = GainTable::default();
    for class in ["Cash", "Stocks", "Fixed-Income"] {
        gain_table.assets.insert(
            class.to_string(),
            AssetReturnProfile {
                low_cut: 0.02,
                high_cut: 0.05,
                low: NormalParams { mean: 0.002, std_dev: 0.01 },
                average: NormalParams { mean: 0.006, std_dev: 0.03 },
                high: NormalParams { mean: 0.004, std_dev: 0.04 },
            },
        );
    }

    let bucket = |name: &str, kind: BucketKind, asset: &str| BucketConfig {
        name: name.to_string(),
        kind,
        holdings: vec![HoldingConfig {
            asset_class: asset.to_string(),
            weight: 1.0,
            cost_basis: None,
        }],
        may_go_negative: name == CASH_BUCKET,
        cash_fallback: false,
    };

    SimulationConfig {
        start: Month::new(2025, 1),
        profile: Profile {
            birth: Month::new(1975, 6),
            dependent_birth: None,
            end_month: Month::new(2055, 12),
            magi: FxHashMap::from_iter((2023..2060).map(|y| (y as i16, 90_000.0))),
            ytd: YtdBaseline::default(),
            filing_jointly: true,
        },
        buckets: vec![
            bucket(CASH_BUCKET, BucketKind::Cash, "Cash"),
            bucket("Brokerage", BucketKind::Taxable, "Stocks"),
            bucket("401k", BucketKind::TaxDeferred, "Stocks"),
            bucket("Roth", BucketKind::TaxFree, "Stocks"),
            bucket("Tax Collection", BucketKind::Other, "Cash"),
        ],
        seed_balances: FxHashMap::from_iter([
            (CASH_BUCKET.to_string(), 80_000.0),
            ("Brokerage".to_string(), 400_000.0),
            ("401k".to_string(), 650_000.0),
            ("Roth".to_string(), 120_000.0),
        ]),
        fixed_flows: Vec::new(),
        recurring_flows: Vec::new(),
        salary: None,
        social_security: Vec::new(),
        rmd: None,
        roth_phases: Vec::new(),
        sepp: None,
        property: None,
        unemployment: None,
        policy: RefillPolicy {
            thresholds: vec![(CASH_BUCKET.to_string(), 30_000.0)],
            refill_amounts: vec![(CASH_BUCKET.to_string(), 20_000.0)],
            sources: vec![(
                CASH_BUCKET.to_string(),
                vec!["Brokerage".to_string(), "401k".to_string()],
            )],
            liquidation_threshold: 5_000.0,
            liquidation_sources: vec!["Brokerage".to_string(), "401k".to_string()],
            ..RefillPolicy::default()
        },
        tax: TaxTables::default(),
        inflation: NormalParams { mean: 0.03, std_dev: 0.012 },
        category_inflation: CategoryProfiles::default(),
        gain_table,
        premiums: MarketplacePremiums::default(),
    }
}

fn bench_single_trial(c: &mut Criterion) {
    let config = bench_config();
    c.bench_function("single_trial_30y", |b| {
        b.iter(|| run_trial(black_box(&config), 42).unwrap());
    });
}

fn bench_small_batch(c: &mut Criterion) {
    let config = bench_config();
    c.bench_function("batch_100_trials_30y", |b| {
        b.iter(|| run_trials(black_box(&config), 100));
    });
}

criterion_group!(benches, bench_single_trial, bench_small_batch);
criterion_main!(benches);
