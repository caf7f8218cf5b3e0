//! Policy-generated transfer with tax classification.
//!
//! Refills and liquidations move money between buckets; what the movement
//! means for taxes depends entirely on the source's classification. Cost
//! basis is not tracked through policy transfers, so taxable sources use
//! the 50%-of-proceeds gain heuristic.

use serde::{Deserialize, Serialize};

use crate::model::BucketKind;
use crate::taxes::TaxFlows;

/// Estimated taxable share of proceeds from a taxable source when no cost
/// basis is available.
pub const TAXABLE_GAIN_ESTIMATE: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefillTransaction {
    pub source: String,
    pub target: String,
    pub amount: f64,
    pub source_kind: BucketKind,
    /// Set when the source is tax-deferred and the household is under 59.5;
    /// the year-end penalty accrues on the flagged amount.
    pub penalty: bool,
}

impl RefillTransaction {
    /// Classify the movement into tax categories. `amount` is what actually
    /// moved (the planned amount clamped by the source balance).
    #[must_use]
    pub fn tax_flows(&self) -> TaxFlows {
        let mut flows = TaxFlows::default();
        match self.source_kind {
            BucketKind::TaxDeferred => {
                flows.ordinary_withdrawal = self.amount;
                if self.penalty {
                    flows.penalty_eligible_withdrawal = self.amount;
                }
            }
            BucketKind::Taxable => {
                flows.realized_gain = self.amount;
                flows.taxable_gain = self.amount * TAXABLE_GAIN_ESTIMATE;
            }
            BucketKind::TaxFree => {
                flows.tax_free_withdrawal = self.amount;
            }
            BucketKind::Cash | BucketKind::Property | BucketKind::Other => {}
        }
        flows
    }
}
