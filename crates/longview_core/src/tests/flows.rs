//! Individual flow behavior: salary routing, social security activation,
//! property amortization, and scheduled-flow eligibility routing.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::flows::{
    Books, FixedFlows, FlowRow, PropertyFlow, RentFlow, SalaryFlow, SocialSecurityFlow,
    TickContext,
};
use crate::model::{CASH_BUCKET, CategoryMultipliers, CategoryProfiles};
use crate::month::Month;
use crate::tests::base_config;

fn zero_categories() -> CategoryMultipliers {
    let mut rng = SmallRng::seed_from_u64(0);
    CategoryMultipliers::generate(2025, 10, &CategoryProfiles::default(), &mut rng).unwrap()
}

fn books() -> Books {
    Books::new(base_config().build_buckets())
}

fn ctx<'a>(month: Month, categories: &'a CategoryMultipliers) -> TickContext<'a> {
    TickContext {
        month,
        modifier: 1.0,
        categories,
        taxable_eligibility: None,
        age_years: 55,
    }
}

#[test]
fn salary_splits_by_share_and_excludes_pretax() {
    let categories = zero_categories();
    let mut books = books();
    let mut salary = SalaryFlow::new(
        120_000.0,
        0.0,
        12,
        0.0,
        4,
        vec![(CASH_BUCKET.to_string(), 0.9), ("Deferred".to_string(), 0.1)],
        Month::new(2040, 1),
    );
    let m = Month::new(2025, 1);
    salary.apply(&mut books, &ctx(m, &categories));

    assert!((books.buckets.balance_of(CASH_BUCKET) - 59_000.0).abs() < 1e-6);
    assert!((books.buckets.balance_of("Deferred") - 1_000.0).abs() < 1e-6);
    // Only the after-tax share counts as salary income.
    assert!((salary.tax_flows().salary - 9_000.0).abs() < 1e-6);
}

#[test]
fn salary_stops_at_retirement() {
    let categories = zero_categories();
    let mut books = books();
    let mut salary = SalaryFlow::new(
        120_000.0,
        0.0,
        12,
        0.0,
        4,
        vec![(CASH_BUCKET.to_string(), 1.0)],
        Month::new(2025, 6),
    );
    salary.apply(&mut books, &ctx(Month::new(2025, 6), &categories));
    assert_eq!(salary.tax_flows().salary, 0.0);
    assert!((books.buckets.balance_of(CASH_BUCKET) - 50_000.0).abs() < 1e-6);
}

#[test]
fn merit_compounds_and_bonus_lands_once() {
    let categories = zero_categories();
    let mut books = books();
    let mut salary = SalaryFlow::new(
        120_000.0,
        6_000.0,
        3,
        0.10,
        2,
        vec![(CASH_BUCKET.to_string(), 1.0)],
        Month::new(2040, 1),
    );
    // January: plain month.
    salary.apply(&mut books, &ctx(Month::new(2025, 1), &categories));
    assert!((salary.tax_flows().salary - 10_000.0).abs() < 1e-6);
    // February: merit raise applies before payout.
    salary.apply(&mut books, &ctx(Month::new(2025, 2), &categories));
    assert!((salary.tax_flows().salary - 11_000.0).abs() < 1e-6);
    // March: bonus month.
    salary.apply(&mut books, &ctx(Month::new(2025, 3), &categories));
    assert!((salary.tax_flows().salary - 17_000.0).abs() < 1e-6);
}

#[test]
fn social_security_waits_for_claim_age() {
    let categories = zero_categories();
    let mut books = books();
    // Born 1963-01, claiming at 62 -> starts 2025-01.
    let mut ss = SocialSecurityFlow::new(
        Month::new(1963, 1),
        62 * 12,
        67 * 12,
        2_000.0,
        1.0,
        CASH_BUCKET.to_string(),
    );
    ss.apply(&mut books, &ctx(Month::new(2024, 12), &categories));
    assert_eq!(ss.tax_flows().social_security, 0.0);

    ss.apply(&mut books, &ctx(Month::new(2025, 1), &categories));
    // 60 months early: 30% reduction.
    assert!((ss.tax_flows().social_security - 1_400.0).abs() < 1e-6);
}

#[test]
fn property_amortizes_and_pays_escrow_from_cash() {
    let categories = zero_categories();
    let mut config = base_config();
    config.buckets.push(crate::tests::single_holding(
        "Home",
        crate::model::BucketKind::Property,
        "Property",
    ));
    config.seed_balances.insert("Home".to_string(), 600_000.0);
    let mut books = Books::new(config.build_buckets());

    let mut property = PropertyFlow::new(
        "Home".to_string(),
        2_000.0, // P&I
        0.06,
        300_000.0,
        500.0,
        200.0,
        0.01,
    );
    property.apply(&mut books, &ctx(Month::new(2025, 1), &categories));

    // Interest 1500, principal 500, escrow 700, maintenance 500.
    assert!((property.remaining_principal() - 299_500.0).abs() < 1e-6);
    assert!((books.buckets.balance_of(CASH_BUCKET) - (50_000.0 - 3_200.0)).abs() < 1e-6);
}

#[test]
fn paid_off_property_keeps_escrow_running() {
    let categories = zero_categories();
    let mut config = base_config();
    config.buckets.push(crate::tests::single_holding(
        "Home",
        crate::model::BucketKind::Property,
        "Property",
    ));
    config.seed_balances.insert("Home".to_string(), 600_000.0);
    let mut books = Books::new(config.build_buckets());

    let mut property =
        PropertyFlow::new("Home".to_string(), 2_000.0, 0.06, 0.0, 500.0, 200.0, 0.0);
    property.apply(&mut books, &ctx(Month::new(2025, 1), &categories));

    // No P&I, escrow only.
    assert!((books.buckets.balance_of(CASH_BUCKET) - (50_000.0 - 700.0)).abs() < 1e-6);
}

#[test]
fn rent_starts_only_after_sale() {
    let categories = zero_categories();
    let mut config = base_config();
    config.buckets.push(crate::tests::single_holding(
        "Home",
        crate::model::BucketKind::Property,
        "Property",
    ));
    config.seed_balances.insert("Home".to_string(), 600_000.0);
    let mut books = Books::new(config.build_buckets());

    let mut rent = RentFlow::new("Home".to_string(), 2_500.0);
    rent.apply(&mut books, &ctx(Month::new(2025, 1), &categories));
    assert!((books.buckets.balance_of(CASH_BUCKET) - 50_000.0).abs() < 1e-6);

    // Empty the property and rent kicks in.
    let mut sold = Books::new(base_config().build_buckets());
    rent.apply(&mut sold, &ctx(Month::new(2025, 2), &categories));
    assert!((sold.buckets.balance_of(CASH_BUCKET) - 47_500.0).abs() < 1e-6);
}

#[test]
fn locked_withdrawal_routes_to_cash_before_eligibility() {
    let categories = zero_categories();
    let mut config = base_config();
    config.seed_balances.insert("Deferred".to_string(), 100_000.0);
    let mut books = Books::new(config.build_buckets());

    let mut fixed = FixedFlows::new(vec![FlowRow {
        month: Month::new(2025, 3),
        bucket: "Deferred".to_string(),
        amount: -5_000.0,
        category: "Baseline".to_string(),
        description: "early pull".to_string(),
    }]);
    let ctx = TickContext {
        month: Month::new(2025, 3),
        modifier: 1.0,
        categories: &categories,
        taxable_eligibility: Some(Month::new(2030, 1)),
        age_years: 55,
    };
    fixed.apply(&mut books, &ctx);

    // The deferred account is untouched; liquidity absorbed the spend.
    assert!((books.buckets.balance_of("Deferred") - 100_000.0).abs() < 1e-6);
    assert!((books.buckets.balance_of(CASH_BUCKET) - 45_000.0).abs() < 1e-6);
}
