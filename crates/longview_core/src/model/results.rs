//! Per-trial outputs and batch aggregation.
//!
//! A trial produces four append-only tables (snapshots, tax records, monthly
//! returns, ledger) plus collected warnings. Batches keep per-trial results
//! separate; aggregation across trials is commutative (percentiles).

use serde::{Deserialize, Serialize};

use crate::error::TrialError;
use crate::model::ledger::LedgerEntry;
use crate::model::market::MonthlyReturnRecord;
use crate::month::Month;

/// Per-bucket balances at the end of one tick. Balances are rounded to
/// whole dollars at emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySnapshot {
    pub month: Month,
    pub balances: Vec<(String, f64)>,
}

impl MonthlySnapshot {
    #[must_use]
    pub fn balance_of(&self, bucket: &str) -> Option<f64> {
        self.balances
            .iter()
            .find(|(name, _)| name == bucket)
            .map(|(_, v)| *v)
    }

    #[must_use]
    pub fn portfolio_value(&self) -> f64 {
        self.balances.iter().map(|(_, v)| v).sum()
    }
}

/// Year-end tax settlement summary for one calendar year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRecord {
    pub year: i16,
    pub agi: f64,
    pub taxable_income: f64,
    pub ordinary_tax: f64,
    pub payroll_tax: f64,
    pub capital_gains_tax: f64,
    pub penalty_tax: f64,
    pub total_tax: f64,
    pub effective_rate: f64,
    pub withdrawal_rate: f64,
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    InsufficientFunds,
    UnknownBucket,
    RefillUnfunded,
    SkippedTransaction,
}

/// Non-fatal condition observed during a trial. The trial continues; the
/// warning documents the skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialWarning {
    pub month: Month,
    pub kind: WarningKind,
    pub message: String,
}

/// Complete output of one trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_index: u64,
    /// Strictly ascending by month.
    pub snapshots: Vec<MonthlySnapshot>,
    /// Ascending by year.
    pub tax_records: Vec<TaxRecord>,
    /// Tick order.
    pub monthly_returns: Vec<MonthlyReturnRecord>,
    /// Emission order.
    pub ledger: Vec<LedgerEntry>,
    pub warnings: Vec<TrialWarning>,
}

impl TrialResult {
    /// Portfolio value at the final snapshot, 0 for an empty trial.
    #[must_use]
    pub fn final_portfolio_value(&self) -> f64 {
        self.snapshots.last().map_or(0.0, MonthlySnapshot::portfolio_value)
    }

    /// Final balance of a named bucket.
    #[must_use]
    pub fn final_balance(&self, bucket: &str) -> Option<f64> {
        self.snapshots.last().and_then(|s| s.balance_of(bucket))
    }

    /// December snapshots as a (month, net worth) series.
    #[must_use]
    pub fn yearly_net_worth(&self) -> Vec<(Month, f64)> {
        self.snapshots
            .iter()
            .filter(|s| s.month.is_december())
            .map(|s| (s.month, s.portfolio_value()))
            .collect()
    }

    pub fn ledger_entries_of_kind(
        &self,
        kind: crate::model::ledger::FlowKind,
    ) -> impl Iterator<Item = &LedgerEntry> {
        self.ledger.iter().filter(move |e| e.kind == kind)
    }
}

/// One month's portfolio-value percentiles across a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileBand {
    pub month: Month,
    /// (percentile, portfolio value) pairs in the order requested.
    pub values: Vec<(f64, f64)>,
}

/// Summary statistics over a batch's final portfolio values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStats {
    pub num_trials: usize,
    pub num_failures: usize,
    /// Share of completed trials ending with a positive portfolio.
    pub success_rate: f64,
    pub mean_final_value: f64,
    pub std_dev_final_value: f64,
    pub min_final_value: f64,
    pub max_final_value: f64,
}

/// Results of running many independent trials. Failed trials are kept
/// keyed by index and never abort their siblings.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub trials: Vec<TrialResult>,
    pub failures: Vec<(u64, TrialError)>,
}

impl BatchResult {
    /// Nearest-rank percentile bands of portfolio value per month across all
    /// completed trials. Months are taken from the first trial's snapshot
    /// axis; trials share it by construction.
    #[must_use]
    pub fn percentile_bands(&self, percentiles: &[f64]) -> Vec<PercentileBand> {
        let Some(first) = self.trials.first() else {
            return Vec::new();
        };
        let mut bands = Vec::with_capacity(first.snapshots.len());
        for (i, snapshot) in first.snapshots.iter().enumerate() {
            let mut values: Vec<f64> = self
                .trials
                .iter()
                .filter_map(|t| t.snapshots.get(i))
                .map(MonthlySnapshot::portfolio_value)
                .collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let band = percentiles
                .iter()
                .map(|&p| {
                    let idx = ((values.len() as f64 * p).floor() as usize).min(values.len() - 1);
                    (p, values[idx])
                })
                .collect();
            bands.push(PercentileBand { month: snapshot.month, values: band });
        }
        bands
    }

    /// Summary statistics over completed trials' final portfolio values.
    #[must_use]
    pub fn stats(&self) -> BatchStats {
        let finals: Vec<f64> = self
            .trials
            .iter()
            .map(TrialResult::final_portfolio_value)
            .collect();
        let n = finals.len();
        if n == 0 {
            return BatchStats {
                num_trials: 0,
                num_failures: self.failures.len(),
                success_rate: 0.0,
                mean_final_value: 0.0,
                std_dev_final_value: 0.0,
                min_final_value: 0.0,
                max_final_value: 0.0,
            };
        }
        let mean = finals.iter().sum::<f64>() / n as f64;
        let variance = finals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let successes = finals.iter().filter(|v| **v > 0.0).count();
        BatchStats {
            num_trials: n,
            num_failures: self.failures.len(),
            success_rate: successes as f64 / n as f64,
            mean_final_value: mean,
            std_dev_final_value: variance.sqrt(),
            min_final_value: finals.iter().copied().fold(f64::INFINITY, f64::min),
            max_final_value: finals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}
