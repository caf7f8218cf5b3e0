//! Threshold refill and forced liquidation policy.
//!
//! After market returns, the policy walks each refill target whose balance
//! fell below its threshold and pulls the configured refill amount from its
//! source list in order, honoring the taxable-eligibility gate and the SEPP
//! freeze on tax-deferred sources. If Cash still sits below the liquidation
//! floor afterwards, the liquidation ladder kicks in - selling Property
//! outright and splitting the proceeds, otherwise draining sources until
//! the shortfall is covered.

use serde::{Deserialize, Serialize};

use crate::flows::{Books, RefillTransaction};
use crate::model::{BucketKind, CASH_BUCKET, WarningKind};
use crate::month::Month;

/// Age (in months) below which tax-deferred withdrawals are
/// penalty-eligible: 59 years 6 months.
pub const PENALTY_AGE_MONTHS: i32 = 59 * 12 + 6;

/// Refill / liquidation configuration, shared read-only across trials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefillPolicy {
    /// Minimum balances per target bucket, checked in order.
    pub thresholds: Vec<(String, f64)>,
    /// Amount moved per refill pass per target.
    pub refill_amounts: Vec<(String, f64)>,
    /// Ordered source lists per target.
    pub sources: Vec<(String, Vec<String>)>,
    /// Cash floor below which forced liquidation begins.
    pub liquidation_threshold: f64,
    /// Ordered liquidation sources (Cash is skipped if listed).
    pub liquidation_sources: Vec<String>,
    /// Where Property sale proceeds land, by share.
    pub liquidation_targets: Vec<(String, f64)>,
    /// First month tax-advantaged sources may be tapped.
    pub taxable_eligibility: Option<Month>,
    /// While active, tax-deferred sources are frozen for refills.
    pub sepp_window: Option<(Month, Month)>,
}

impl RefillPolicy {
    fn refill_amount(&self, target: &str) -> f64 {
        self.refill_amounts
            .iter()
            .find(|(name, _)| name == target)
            .map_or(0.0, |(_, v)| *v)
    }

    fn sources_for(&self, target: &str) -> &[String] {
        match self.sources.iter().find(|(name, _)| name == target) {
            Some((_, list)) => list.as_slice(),
            None => &[],
        }
    }

    fn in_sepp_window(&self, month: Month) -> bool {
        self.sepp_window
            .is_some_and(|(start, end)| month >= start && month <= end)
    }

    fn pre_eligibility(&self, month: Month) -> bool {
        self.taxable_eligibility.is_some_and(|eligible| month < eligible)
    }

    /// Top up every underfunded target from its source ladder. Transfers
    /// are applied as they are planned so later targets see drained
    /// sources. Returns the applied transactions for tax accrual.
    pub fn run_refills(&self, books: &mut Books, month: Month) -> Vec<RefillTransaction> {
        let mut applied = Vec::new();
        for (target, threshold) in &self.thresholds {
            if books.buckets.balance_of(target) >= *threshold {
                continue;
            }
            let mut need = self.refill_amount(target);
            if need <= 0.0 {
                books.warn(
                    month,
                    WarningKind::RefillUnfunded,
                    format!("{target:?} below threshold but has no refill amount configured"),
                );
                continue;
            }
            for source in self.sources_for(target) {
                if need <= 0.0 {
                    break;
                }
                let Some(kind) = books.buckets.get(source).map(|b| b.kind) else {
                    books.warn(
                        month,
                        WarningKind::UnknownBucket,
                        format!("refill source {source:?} for {target:?} does not exist"),
                    );
                    continue;
                };
                let available = books.buckets.balance_of(source);
                if available <= 0.0 {
                    continue;
                }
                if kind.is_tax_advantaged() && self.pre_eligibility(month) {
                    continue;
                }
                if kind == BucketKind::TaxDeferred && self.in_sepp_window(month) {
                    continue;
                }
                let planned = need.min(available);
                let moved = books.transfer(source, target, planned, month);
                if moved <= 0.0 {
                    continue;
                }
                applied.push(RefillTransaction {
                    source: source.clone(),
                    target: target.clone(),
                    amount: moved,
                    source_kind: kind,
                    penalty: false,
                });
                need -= moved;
            }
        }
        applied
    }

    /// Cover a Cash shortfall by draining the liquidation ladder. Property
    /// is sold whole with proceeds split across the configured targets;
    /// other sources are drained up to the outstanding shortfall.
    pub fn run_liquidations(
        &self,
        books: &mut Books,
        month: Month,
        age_months: i32,
    ) -> Vec<RefillTransaction> {
        let mut applied = Vec::new();
        let mut shortfall = self.liquidation_threshold - books.buckets.balance_of(CASH_BUCKET);
        if shortfall <= 0.0 {
            return applied;
        }

        for source in &self.liquidation_sources {
            if shortfall <= 0.0 {
                break;
            }
            if source == CASH_BUCKET {
                continue;
            }
            let Some(kind) = books.buckets.get(source).map(|b| b.kind) else {
                books.warn(
                    month,
                    WarningKind::UnknownBucket,
                    format!("liquidation source {source:?} does not exist"),
                );
                continue;
            };
            let available = books.buckets.balance_of(source);
            if available <= 0.0 {
                continue;
            }
            if kind.is_tax_advantaged() && self.pre_eligibility(month) {
                continue;
            }

            if kind == BucketKind::Property {
                // The whole property goes; proceeds split by share, with
                // the last target absorbing rounding residue.
                let mut remaining = available;
                let n = self.liquidation_targets.len();
                for (i, (target, share)) in self.liquidation_targets.iter().enumerate() {
                    let part = if i + 1 == n { remaining } else { available * share };
                    let moved = books.transfer(source, target, part, month);
                    remaining -= moved;
                    if moved > 0.0 {
                        applied.push(RefillTransaction {
                            source: source.clone(),
                            target: target.clone(),
                            amount: moved,
                            source_kind: kind,
                            penalty: false,
                        });
                        if target == CASH_BUCKET {
                            shortfall -= moved;
                        }
                    }
                }
                continue;
            }

            let take = shortfall.min(available);
            let moved = books.transfer(source, CASH_BUCKET, take, month);
            if moved <= 0.0 {
                continue;
            }
            let penalty = kind == BucketKind::TaxDeferred && age_months < PENALTY_AGE_MONTHS;
            applied.push(RefillTransaction {
                source: source.clone(),
                target: CASH_BUCKET.to_string(),
                amount: moved,
                source_kind: kind,
                penalty,
            });
            shortfall -= moved;
        }
        applied
    }
}
