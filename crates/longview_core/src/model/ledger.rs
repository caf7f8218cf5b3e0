//! The audit ledger - an append-only record of every debit and credit.
//!
//! Every balance mutation in a trial lands here exactly once, in the order it
//! was applied. The ledger refers to buckets by name; flow direction is
//! carried by the entry kind, so `source` and `target` are always the
//! "money left" and "money arrived" sides respectively, with labels standing
//! in for the outside world ("Salary", "Stocks", "Tax Collection", ...).

use serde::{Deserialize, Serialize};

use crate::month::Month;

/// What kind of flow an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowKind {
    /// External money entering a bucket.
    Deposit,
    /// Money leaving a bucket for the outside world.
    Withdraw,
    /// Bucket-to-bucket movement (refills, liquidations, SEPP, conversions).
    Transfer,
    /// Market appreciation credited to a bucket.
    Gain,
    /// Market depreciation debited from a bucket.
    Loss,
}

/// One debit/credit pair. `amount` is always positive; direction comes from
/// the kind and the source/target labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub month: Month,
    pub source: String,
    pub target: String,
    pub amount: f64,
    pub kind: FlowKind,
}

/// Append-only for the duration of a trial.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        month: Month,
        source: impl Into<String>,
        target: impl Into<String>,
        amount: f64,
        kind: FlowKind,
    ) {
        if amount == 0.0 {
            return;
        }
        debug_assert!(amount > 0.0, "ledger amounts are positive by construction");
        self.entries.push(LedgerEntry {
            month,
            source: source.into(),
            target: target.into(),
            amount,
            kind,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }

    /// Net flow into the named bucket over the whole ledger: credits
    /// (deposits, incoming transfers, gains) minus debits (withdrawals,
    /// outgoing transfers, losses).
    #[must_use]
    pub fn net_flow_into(&self, bucket: &str) -> f64 {
        let mut net = 0.0;
        for e in &self.entries {
            match e.kind {
                FlowKind::Deposit | FlowKind::Gain => {
                    if e.target == bucket {
                        net += e.amount;
                    }
                }
                FlowKind::Withdraw | FlowKind::Loss => {
                    if e.source == bucket {
                        net -= e.amount;
                    }
                }
                FlowKind::Transfer => {
                    if e.target == bucket {
                        net += e.amount;
                    }
                    if e.source == bucket {
                        net -= e.amount;
                    }
                }
            }
        }
        net
    }
}
