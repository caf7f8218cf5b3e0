//! Progressive tax evaluation over inflation-indexed brackets.
//!
//! The calculator is pure: it reads a yearly log of tax-relevant flows and
//! the bracket tables, indexes every dollar threshold by the trial's
//! cumulative inflation modifier, and produces the year's liability. The
//! same function backs both the monthly withholding drip (run on the
//! log-to-date) and the December settlement (run on the finalized log).

use serde::{Deserialize, Serialize};

use crate::model::{TaxBracket, TaxTables};

/// A single month's contribution to the tax-relevant flow categories.
///
/// Every transaction type reports one of these after `apply`; categories it
/// does not touch stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxFlows {
    pub salary: f64,
    pub unemployment: f64,
    pub social_security: f64,
    pub ordinary_withdrawal: f64,
    pub realized_gain: f64,
    pub taxable_gain: f64,
    pub tax_free_withdrawal: f64,
    pub fixed_income_interest: f64,
    pub fixed_income_withdrawal: f64,
    pub penalty_eligible_withdrawal: f64,
}

impl TaxFlows {
    pub fn merge(&mut self, other: &TaxFlows) {
        self.salary += other.salary;
        self.unemployment += other.unemployment;
        self.social_security += other.social_security;
        self.ordinary_withdrawal += other.ordinary_withdrawal;
        self.realized_gain += other.realized_gain;
        self.taxable_gain += other.taxable_gain;
        self.tax_free_withdrawal += other.tax_free_withdrawal;
        self.fixed_income_interest += other.fixed_income_interest;
        self.fixed_income_withdrawal += other.fixed_income_withdrawal;
        self.penalty_eligible_withdrawal += other.penalty_eligible_withdrawal;
    }
}

/// Running cumulative totals for the current calendar year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlyTaxLog {
    pub salary: f64,
    pub unemployment: f64,
    pub social_security: f64,
    pub ordinary_withdrawal: f64,
    pub roth_conversion: f64,
    pub realized_gain: f64,
    pub taxable_gain: f64,
    pub fixed_income_interest: f64,
    pub tax_free_withdrawal: f64,
    pub penalty_eligible_withdrawal: f64,
}

impl YearlyTaxLog {
    pub fn absorb(&mut self, flows: &TaxFlows) {
        self.salary += flows.salary;
        self.unemployment += flows.unemployment;
        self.social_security += flows.social_security;
        self.ordinary_withdrawal += flows.ordinary_withdrawal;
        self.realized_gain += flows.realized_gain;
        self.taxable_gain += flows.taxable_gain;
        self.fixed_income_interest += flows.fixed_income_interest;
        self.tax_free_withdrawal += flows.tax_free_withdrawal;
        self.penalty_eligible_withdrawal += flows.penalty_eligible_withdrawal;
    }

    /// AGI excluding the taxable portion of Social Security.
    #[must_use]
    pub fn agi_excluding_ss(&self) -> f64 {
        self.salary
            + self.unemployment
            + self.ordinary_withdrawal
            + self.roth_conversion
            + self.fixed_income_interest
            + self.taxable_gain
    }
}

/// The year's computed liability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualTax {
    pub agi: f64,
    pub taxable_income: f64,
    pub ordinary_tax: f64,
    pub payroll_tax: f64,
    pub capital_gains_tax: f64,
    pub penalty_tax: f64,
    pub total: f64,
    pub effective_rate: f64,
}

/// Piecewise-linear progressive tax over (min, rate) brackets whose minima
/// are scaled by `modifier`. The top bracket extends to infinity.
#[must_use]
pub fn bracket_progressive(income: f64, brackets: &[TaxBracket], modifier: f64) -> f64 {
    if income <= 0.0 || brackets.is_empty() {
        return 0.0;
    }
    let mut tax = 0.0;
    for (i, bracket) in brackets.iter().enumerate() {
        let floor = bracket.min_income * modifier;
        if income <= floor {
            break;
        }
        let ceiling = brackets
            .get(i + 1)
            .map_or(f64::INFINITY, |b| b.min_income * modifier);
        tax += (income.min(ceiling) - floor) * bracket.rate;
    }
    tax
}

/// Taxable portion of Social Security benefits via provisional income.
///
/// Provisional income is AGI excluding benefits plus half the benefits;
/// inclusion rates are evaluated progressively over the taxability
/// thresholds and the result is capped at 85% of benefits.
#[must_use]
pub fn taxable_social_security(
    agi_excluding_ss: f64,
    ss_benefits: f64,
    tables: &TaxTables,
    modifier: f64,
) -> f64 {
    if ss_benefits <= 0.0 {
        return 0.0;
    }
    let provisional = agi_excluding_ss + 0.5 * ss_benefits;
    let included = bracket_progressive(provisional, &tables.ss_taxability, modifier);
    included.min(0.85 * ss_benefits)
}

/// Evaluate the full year's liability from the log.
#[must_use]
pub fn compute_annual(log: &YearlyTaxLog, tables: &TaxTables, modifier: f64) -> AnnualTax {
    let agi_excl_ss = log.agi_excluding_ss();
    let taxable_ss = taxable_social_security(agi_excl_ss, log.social_security, tables, modifier);
    let agi = agi_excl_ss + taxable_ss;

    let taxable_income = (agi - tables.standard_deduction * modifier).max(0.0);

    let ordinary_tax: f64 = tables
        .ordinary
        .iter()
        .map(|j| bracket_progressive(taxable_income, &j.brackets, modifier))
        .sum();

    let payroll_tax = bracket_progressive(log.salary, &tables.social_security_payroll, modifier)
        + bracket_progressive(log.salary, &tables.medicare_payroll, modifier);

    // Long-term gains stack on top of ordinary income: the ordinary portion
    // fills the brackets first, gains are taxed on the span above it.
    let gains = log.taxable_gain.max(0.0);
    let floor = (taxable_income - gains).max(0.0);
    let capital_gains_tax = bracket_progressive(floor + gains, &tables.ltcg, modifier)
        - bracket_progressive(floor, &tables.ltcg, modifier);

    let penalty_tax = log.penalty_eligible_withdrawal * tables.penalty_rate;

    let total = ordinary_tax + payroll_tax + capital_gains_tax + penalty_tax;
    let effective_rate = if agi > 0.0 { total / agi } else { 0.0 };

    AnnualTax {
        agi,
        taxable_income,
        ordinary_tax,
        payroll_tax,
        capital_gains_tax,
        penalty_tax,
        total,
        effective_rate,
    }
}

/// Withholding transferred to the Tax Collection bucket this month:
/// the outstanding estimate spread over the months left in the year
/// (including this one). Never negative; over-withholding is settled as a
/// refund in December.
#[must_use]
pub fn monthly_drip(estimated_annual: f64, paid_ytd: f64, month_of_year: i8) -> f64 {
    let remaining = f64::from(12 - month_of_year + 1);
    ((estimated_annual - paid_ytd) / remaining).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JurisdictionBrackets;

    fn bracket(min_income: f64, rate: f64) -> TaxBracket {
        TaxBracket { min_income, rate }
    }

    fn federal_2023() -> Vec<TaxBracket> {
        vec![bracket(0.0, 0.10), bracket(22_000.0, 0.12), bracket(89_450.0, 0.22)]
    }

    #[test]
    fn progressive_single_jurisdiction() {
        // 22000*0.10 + (89450-22000)*0.12 + (100000-89450)*0.22 = 12,615
        let tax = bracket_progressive(100_000.0, &federal_2023(), 1.0);
        assert!((tax - 12_615.0).abs() < 0.01, "got {tax}");
    }

    #[test]
    fn progressive_below_first_threshold() {
        let brackets = vec![bracket(10_000.0, 0.10)];
        assert_eq!(bracket_progressive(5_000.0, &brackets, 1.0), 0.0);
    }

    #[test]
    fn progressive_indexing_scales_thresholds() {
        let nominal = bracket_progressive(100_000.0, &federal_2023(), 1.0);
        let indexed = bracket_progressive(110_000.0, &federal_2023(), 1.10);
        assert!((indexed - nominal * 1.10).abs() < 0.01);
    }

    #[test]
    fn social_security_inclusion() {
        let tables = TaxTables {
            ss_taxability: vec![bracket(0.0, 0.0), bracket(32_000.0, 0.5), bracket(44_000.0, 0.85)],
            ..TaxTables::default()
        };
        // Provisional 50000 + 15000 = 65000 -> 6000 + 17850 = 23,850
        let taxable = taxable_social_security(50_000.0, 30_000.0, &tables, 1.0);
        assert!((taxable - 23_850.0).abs() < 0.01, "got {taxable}");
    }

    #[test]
    fn social_security_inclusion_caps_at_85_pct() {
        let tables = TaxTables {
            ss_taxability: vec![bracket(0.0, 0.0), bracket(32_000.0, 0.5), bracket(44_000.0, 0.85)],
            ..TaxTables::default()
        };
        let taxable = taxable_social_security(500_000.0, 30_000.0, &tables, 1.0);
        assert!((taxable - 0.85 * 30_000.0).abs() < 0.01);
    }

    #[test]
    fn ltcg_stacks_on_ordinary_floor() {
        let tables = TaxTables {
            ltcg: vec![bracket(0.0, 0.0), bracket(44_625.0, 0.15), bracket(492_300.0, 0.20)],
            ..TaxTables::default()
        };
        let log = YearlyTaxLog {
            ordinary_withdrawal: 40_000.0,
            taxable_gain: 20_000.0,
            ..YearlyTaxLog::default()
        };
        let tax = compute_annual(&log, &tables, 1.0);
        // Floor 40,000; gains span 40,000..60,000; 4,625 at 0% + 15,375 at 15%.
        assert!((tax.capital_gains_tax - 15_375.0 * 0.15).abs() < 0.01, "got {}", tax.capital_gains_tax);
    }

    #[test]
    fn payroll_only_on_salary() {
        let tables = TaxTables {
            social_security_payroll: vec![bracket(0.0, 0.062), bracket(160_200.0, 0.0)],
            medicare_payroll: vec![bracket(0.0, 0.0145), bracket(200_000.0, 0.0235)],
            ..TaxTables::default()
        };
        let log = YearlyTaxLog {
            salary: 100_000.0,
            ordinary_withdrawal: 50_000.0,
            ..YearlyTaxLog::default()
        };
        let tax = compute_annual(&log, &tables, 1.0);
        assert!((tax.payroll_tax - (6_200.0 + 1_450.0)).abs() < 0.01);
    }

    #[test]
    fn payroll_ss_respects_wage_base() {
        let tables = TaxTables {
            social_security_payroll: vec![bracket(0.0, 0.062), bracket(160_200.0, 0.0)],
            ..TaxTables::default()
        };
        let log = YearlyTaxLog { salary: 300_000.0, ..YearlyTaxLog::default() };
        let tax = compute_annual(&log, &tables, 1.0);
        assert!((tax.payroll_tax - 160_200.0 * 0.062).abs() < 0.01);
    }

    #[test]
    fn effective_rate_zero_when_agi_zero() {
        let tables = TaxTables::default();
        let log = YearlyTaxLog::default();
        let tax = compute_annual(&log, &tables, 1.0);
        assert_eq!(tax.effective_rate, 0.0);
        assert_eq!(tax.total, 0.0);
    }

    #[test]
    fn penalty_is_ten_percent() {
        let tables = TaxTables::default();
        let log = YearlyTaxLog {
            penalty_eligible_withdrawal: 12_000.0,
            ..YearlyTaxLog::default()
        };
        let tax = compute_annual(&log, &tables, 1.0);
        assert!((tax.penalty_tax - 1_200.0).abs() < 0.01);
    }

    #[test]
    fn bounds_hold_for_positive_agi() {
        let tables = TaxTables {
            standard_deduction: 14_600.0,
            ordinary: vec![JurisdictionBrackets {
                jurisdiction: "Federal".to_string(),
                brackets: federal_2023(),
            }],
            ..TaxTables::default()
        };
        let log = YearlyTaxLog {
            salary: 80_000.0,
            ordinary_withdrawal: 30_000.0,
            social_security: 20_000.0,
            ..YearlyTaxLog::default()
        };
        let tax = compute_annual(&log, &tables, 1.0);
        assert!(tax.taxable_income <= tax.agi);
        assert!(tax.total <= tax.agi);
        assert!(tax.effective_rate >= 0.0 && tax.effective_rate <= 1.0);
    }

    #[test]
    fn drip_spreads_outstanding_over_remaining_months() {
        // January: 12 months left.
        assert!((monthly_drip(12_000.0, 0.0, 1) - 1_000.0).abs() < 1e-9);
        // July: estimate 12k, 6k paid, 6 months left.
        assert!((monthly_drip(12_000.0, 6_000.0, 7) - 1_000.0).abs() < 1e-9);
        // Overpaid: no negative drip.
        assert_eq!(monthly_drip(5_000.0, 8_000.0, 10), 0.0);
    }
}
