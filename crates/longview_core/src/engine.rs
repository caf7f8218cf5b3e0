//! The per-trial pipeline driver.
//!
//! The engine owns every piece of mutable trial state: buckets, ledger,
//! yearly tax log, snapshots, the RNG, and the inflation draws. Each tick
//! runs the fixed sequence - SEPP, premiums, scheduled flows, policy flows,
//! market returns, refills, liquidations, tax accrual, snapshot - and
//! December additionally runs Roth conversion and year-end settlement.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::SimulationConfig;
use crate::error::{Result, TrialError};
use crate::flows::{
    Books, FixedFlows, PropertyFlow, RecurringFlows, RentFlow, RmdFlow, SalaryFlow, SeppFlow,
    SocialSecurityFlow, TickContext, Transaction, UnemploymentFlow,
};
use crate::model::{
    CASH_BUCKET, CategoryMultipliers, FlowKind, InflationSeries, MonthlySnapshot, TaxRecord,
    TrialResult, apply_market_returns,
};
use crate::month::Month;
use crate::taxes::{TaxFlows, YearlyTaxLog, compute_annual, monthly_drip};

/// Bucket accumulating the monthly withholding drip for December settlement.
pub const TAX_COLLECTION_BUCKET: &str = "Tax Collection";

/// ACA cap: annual marketplace premiums are limited to this share of the
/// prior year's MAGI.
const MARKETPLACE_MAGI_CAP_RATE: f64 = 0.085;

/// Headroom search granularity for Roth conversions.
const CONVERSION_STEP: f64 = 1_000.0;

/// Medicare eligibility age in months.
const MEDICARE_AGE_MONTHS: i32 = 65 * 12;

/// Dependents under this age put the household on the family plan.
const FAMILY_PLAN_DEPENDENT_AGE: i32 = 25;

pub struct ForecastEngine<'a> {
    config: &'a SimulationConfig,
    trial_index: u64,
    rng: SmallRng,
    inflation: InflationSeries,
    categories: CategoryMultipliers,
    books: Books,
    transactions: Vec<Transaction>,
    sepp: Option<SeppFlow>,
    log: YearlyTaxLog,
    /// Withholding already transferred (or carried in from the YTD
    /// baseline) this calendar year.
    paid_ytd: f64,
    first_year: i16,
    snapshots: Vec<MonthlySnapshot>,
    tax_records: Vec<TaxRecord>,
    monthly_returns: Vec<crate::model::MonthlyReturnRecord>,
}

impl<'a> ForecastEngine<'a> {
    pub fn new(config: &'a SimulationConfig, trial_index: u64) -> Result<Self> {
        config.validate()?;

        let mut rng = SmallRng::seed_from_u64(trial_index);
        let years = config.simulated_years();
        let inflation =
            InflationSeries::generate(config.base_year(), years, config.inflation, &mut rng)?;
        let categories = CategoryMultipliers::generate(
            config.base_year(),
            years,
            &config.category_inflation,
            &mut rng,
        )?;

        let books = Books::new(config.build_buckets());
        let transactions = Self::build_transactions(config);
        let sepp = config.sepp.as_ref().map(|s| {
            let age_at_start = config.profile.age_years(s.start).clamp(0, 255) as u8;
            SeppFlow::new(s.start, s.end, s.source.clone(), s.target.clone(), s.interest_rate, age_at_start)
        });

        // Seed the first calendar year from the YTD baseline so January's
        // estimate already reflects income earned before the simulation.
        let ytd = config.profile.ytd;
        let log = YearlyTaxLog {
            salary: ytd.salary,
            unemployment: ytd.unemployment,
            social_security: ytd.social_security,
            ordinary_withdrawal: ytd.ordinary_withdrawals,
            taxable_gain: ytd.taxable_gains,
            fixed_income_interest: ytd.fixed_income_interest,
            ..YearlyTaxLog::default()
        };

        Ok(Self {
            config,
            trial_index,
            rng,
            inflation,
            categories,
            books,
            transactions,
            sepp,
            log,
            paid_ytd: ytd.tax_paid,
            first_year: config.start.year,
            snapshots: Vec::new(),
            tax_records: Vec::new(),
            monthly_returns: Vec::new(),
        })
    }

    fn build_transactions(config: &SimulationConfig) -> Vec<Transaction> {
        let mut transactions = Vec::new();
        if !config.fixed_flows.is_empty() {
            transactions.push(Transaction::Fixed(FixedFlows::new(config.fixed_flows.clone())));
        }
        if !config.recurring_flows.is_empty() {
            transactions.push(Transaction::Recurring(RecurringFlows::new(
                config.recurring_flows.clone(),
            )));
        }
        if let Some(s) = &config.salary {
            transactions.push(Transaction::Salary(SalaryFlow::new(
                s.annual_gross,
                s.annual_bonus,
                s.bonus_month,
                s.merit_rate,
                s.merit_month,
                s.targets.clone(),
                s.retirement_month,
            )));
        }
        for ss in &config.social_security {
            transactions.push(Transaction::SocialSecurity(SocialSecurityFlow::new(
                ss.birth,
                ss.start_age_months,
                ss.full_age_months,
                ss.full_benefit,
                ss.payout_pct,
                ss.target.clone(),
            )));
        }
        if let Some(r) = &config.rmd {
            transactions.push(Transaction::Rmd(RmdFlow::new(
                r.rmd_month,
                r.start_age,
                r.targets.clone(),
            )));
        }
        if let Some(p) = &config.property {
            transactions.push(Transaction::Property(PropertyFlow::new(
                p.property_bucket.clone(),
                p.monthly_pi,
                p.apr,
                p.remaining_principal,
                p.monthly_taxes,
                p.monthly_insurance,
                p.maintenance_rate,
            )));
            transactions.push(Transaction::Rent(RentFlow::new(
                p.property_bucket.clone(),
                p.monthly_rent,
            )));
        }
        if let Some(u) = &config.unemployment {
            transactions.push(Transaction::Unemployment(UnemploymentFlow::new(
                u.start,
                u.end,
                u.monthly,
                u.target.clone(),
            )));
        }
        transactions
    }

    /// Drive the full forecast and hand back the trial's tables.
    pub fn run(mut self) -> Result<TrialResult> {
        let months: Vec<Month> = self
            .config
            .start
            .iter_through(self.config.profile.end_month)
            .collect();
        for month in months {
            self.tick(month)?;
        }
        Ok(TrialResult {
            trial_index: self.trial_index,
            snapshots: self.snapshots,
            tax_records: self.tax_records,
            monthly_returns: self.monthly_returns,
            ledger: self.books.ledger.into_entries(),
            warnings: self.books.warnings,
        })
    }

    fn tick(&mut self, month: Month) -> Result<()> {
        let modifier = self.inflation.modifier(month.year)?;
        let inflation_rate = self.inflation.rate(month.year)?;
        let age_years = self.config.profile.age_years(month);
        let age_months = self.config.profile.age_months(month);
        let mut tick_flows = TaxFlows::default();

        // 1. SEPP runs ahead of everything else so frozen sources still
        //    make their scheduled payment.
        if let Some(sepp) = &mut self.sepp {
            let ctx = TickContext {
                month,
                modifier,
                categories: &self.categories,
                taxable_eligibility: self.config.policy.taxable_eligibility,
                age_years,
            };
            sepp.apply(&mut self.books, &ctx);
            tick_flows.merge(&sepp.tax_flows());
        }

        // 2-3. Health premiums.
        self.apply_premiums(month, modifier, age_months)?;

        // 4-5. Scheduled then policy flows, in construction order.
        {
            let ctx = TickContext {
                month,
                modifier,
                categories: &self.categories,
                taxable_eligibility: self.config.policy.taxable_eligibility,
                age_years,
            };
            for tx in &mut self.transactions {
                tx.apply(&mut self.books, &ctx);
                tick_flows.merge(&tx.tax_flows());
            }
        }

        // 6. Market returns on post-transaction balances.
        let outcome = apply_market_returns(
            &mut self.books.buckets,
            &self.config.gain_table,
            month,
            inflation_rate,
            &mut self.rng,
            &mut self.books.ledger,
        )?;
        tick_flows.fixed_income_interest += outcome.fixed_income_interest;
        self.monthly_returns.push(outcome.record);

        // 7-8. Threshold refills, then forced liquidations.
        for tx in self.config.policy.run_refills(&mut self.books, month) {
            tick_flows.merge(&tx.tax_flows());
        }
        for tx in self.config.policy.run_liquidations(&mut self.books, month, age_months) {
            tick_flows.merge(&tx.tax_flows());
        }

        // 9. Fold the month into the yearly log and drip withholding.
        self.log.absorb(&tick_flows);
        let estimate = compute_annual(&self.log, &self.config.tax, modifier);
        let drip = monthly_drip(estimate.total, self.paid_ytd, month.month);
        if drip > 0.0 {
            let moved = self.books.transfer(CASH_BUCKET, TAX_COLLECTION_BUCKET, drip, month);
            self.paid_ytd += moved;
        }

        // 10. Snapshot (whole dollars at the boundary).
        self.snapshots.push(MonthlySnapshot {
            month,
            balances: self
                .books
                .buckets
                .iter()
                .map(|b| (b.name.clone(), b.balance().round()))
                .collect(),
        });

        // 11. December settles the year.
        if month.is_december() {
            self.year_end(month, modifier, age_years)?;
        }
        Ok(())
    }

    /// Marketplace premiums before Medicare age, IRMAA-adjusted Medicare
    /// premiums after.
    fn apply_premiums(&mut self, month: Month, modifier: f64, age_months: i32) -> Result<()> {
        if age_months >= MEDICARE_AGE_MONTHS {
            let lookback_year = month.year - 2;
            let Some(magi) = self.magi_for(lookback_year) else {
                return Err(TrialError::MissingMagiYear { year: lookback_year, month });
            };
            let tax = &self.config.tax;
            let mut premium = tax.medicare_part_b_base + tax.medicare_part_d_base;
            if let Some(tier) = tax.irmaa_tier_for(magi, modifier) {
                premium += tier.part_b_surcharge + tier.part_d_surcharge;
            }
            if self.config.profile.filing_jointly {
                premium *= 2.0;
            }
            self.books
                .withdraw(CASH_BUCKET, premium, "Medicare Premiums", month, FlowKind::Withdraw);
            return Ok(());
        }

        let pre_retirement = self
            .config
            .salary
            .as_ref()
            .is_some_and(|s| month < s.retirement_month);
        if !pre_retirement {
            return Ok(());
        }

        let family_plan = self
            .config
            .profile
            .dependent_age_years(month)
            .is_some_and(|age| age < FAMILY_PLAN_DEPENDENT_AGE);
        let configured = if family_plan {
            self.config.premiums.family_monthly
        } else {
            self.config.premiums.couple_monthly
        };
        // The stricter of the configured plan price and the ACA cap.
        let premium = match self.magi_for(month.year - 1) {
            Some(magi) => configured.min(magi * MARKETPLACE_MAGI_CAP_RATE / 12.0),
            None => configured,
        };
        if premium > 0.0 {
            self.books
                .withdraw(CASH_BUCKET, premium, "Marketplace Premiums", month, FlowKind::Withdraw);
        }
        Ok(())
    }

    /// MAGI for a calendar year: simulated years use the trial's own tax
    /// records, earlier years the configured history.
    fn magi_for(&self, year: i16) -> Option<f64> {
        self.tax_records
            .iter()
            .find(|r| r.year == year)
            .map(|r| r.agi)
            .or_else(|| self.config.profile.magi.get(&year).copied())
    }

    fn year_end(&mut self, month: Month, modifier: f64, age_years: i32) -> Result<()> {
        self.attempt_roth_conversion(month, modifier, age_years);

        let annual = compute_annual(&self.log, &self.config.tax, modifier);

        // The YTD baseline's withholding covers tax already paid before the
        // simulation started; only the remainder is due in the first year.
        let already_paid = if month.year == self.first_year {
            self.config.profile.ytd.tax_paid
        } else {
            0.0
        };
        let due = (annual.total - already_paid).max(0.0);

        // Pay from Tax Collection first, then Cash (which may overdraw).
        if self.books.buckets.contains(TAX_COLLECTION_BUCKET) {
            self.books.withdraw_with_fallback(
                TAX_COLLECTION_BUCKET,
                due,
                "Taxes",
                month,
                FlowKind::Withdraw,
            );
        } else {
            self.books.withdraw(CASH_BUCKET, due, "Taxes", month, FlowKind::Withdraw);
        }

        // Over-withheld remainder comes back to Cash.
        let remainder = self.books.buckets.balance_of(TAX_COLLECTION_BUCKET);
        if remainder > 0.0 {
            self.books.transfer(TAX_COLLECTION_BUCKET, CASH_BUCKET, remainder, month);
        }

        let portfolio_value = self.books.buckets.portfolio_value();
        let withdrawal_rate = if portfolio_value > 0.0 {
            (self.log.ordinary_withdrawal + self.log.taxable_gain) / portfolio_value
        } else {
            0.0
        };
        self.tax_records.push(TaxRecord {
            year: month.year,
            agi: annual.agi.round(),
            taxable_income: annual.taxable_income.round(),
            ordinary_tax: annual.ordinary_tax.round(),
            payroll_tax: annual.payroll_tax.round(),
            capital_gains_tax: annual.capital_gains_tax.round(),
            penalty_tax: annual.penalty_tax.round(),
            total_tax: annual.total.round(),
            effective_rate: annual.effective_rate,
            withdrawal_rate,
            portfolio_value: portfolio_value.round(),
        });

        // New calendar year, fresh log and withholding counter.
        self.log = YearlyTaxLog::default();
        self.paid_ytd = 0.0;
        Ok(())
    }

    /// Fill remaining bracket headroom with a tax-deferred -> tax-free
    /// conversion, largest amount whose resulting effective rate stays
    /// under the phase's ceiling. The scan steps down in fixed increments
    /// rather than bisecting, since the effective-rate curve is not
    /// guaranteed monotone.
    fn attempt_roth_conversion(&mut self, month: Month, modifier: f64, age_years: i32) {
        for phase in &self.config.roth_phases {
            if !phase.allow_conversion
                || age_years < phase.min_age
                || age_years >= phase.max_age
            {
                continue;
            }
            let source_balance = self.books.buckets.balance_of(&phase.source);
            if source_balance < phase.min_source_balance {
                continue;
            }

            let ceiling = phase.max_conversion.min(source_balance);
            let mut conversion = 0.0;
            let mut candidate = ceiling;
            while candidate > 0.0 {
                let mut trial_log = self.log;
                trial_log.roth_conversion += candidate;
                let annual = compute_annual(&trial_log, &self.config.tax, modifier);
                if annual.effective_rate <= phase.max_tax_rate {
                    conversion = candidate;
                    break;
                }
                candidate -= CONVERSION_STEP;
            }
            if conversion <= 0.0 {
                continue;
            }

            let moved = self.books.transfer(&phase.source, &phase.target, conversion, month);
            // Ordinary income in the conversion year, never penalty-eligible.
            self.log.roth_conversion += moved;
        }
    }
}
