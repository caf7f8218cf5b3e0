//! Fatal error taxonomy for a single trial.
//!
//! Anything here aborts the trial that hit it; sibling trials are unaffected.
//! Recoverable conditions (insufficient balance, unknown bucket in a flow)
//! are warnings collected on the trial result, never errors.

use crate::month::Month;

pub type Result<T> = std::result::Result<T, TrialError>;

#[derive(Debug, Clone, PartialEq)]
pub enum TrialError {
    /// A bucket the configuration requires (e.g. Cash) does not exist.
    MissingBucket(String),
    /// A refill or liquidation policy names a source bucket that does not exist.
    UnknownPolicySource { target: String, source: String },
    /// Holding weights within a bucket do not sum to 1.
    InvalidWeights { bucket: String, sum: f64 },
    /// IRMAA needs the MAGI for a look-back year that is neither configured
    /// nor already simulated.
    MissingMagiYear { year: i16, month: Month },
    /// A Normal distribution was configured with a non-finite or negative
    /// standard deviation.
    InvalidDistribution { what: &'static str, mean: f64, std_dev: f64 },
    /// The inflation series does not cover a simulated year.
    InflationOutOfRange { year: i16 },
    /// No gain-table entry exists for an asset class held by a bucket.
    UnknownAssetClass(String),
    /// The SEPP window is inverted or the start age has no life expectancy.
    InvalidSeppWindow { start: Month, end: Month },
}

impl std::fmt::Display for TrialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrialError::MissingBucket(name) => write!(f, "required bucket {name:?} not found"),
            TrialError::UnknownPolicySource { target, source } => {
                write!(f, "refill policy for {target:?} names unknown source {source:?}")
            }
            TrialError::InvalidWeights { bucket, sum } => {
                write!(f, "holding weights in {bucket:?} sum to {sum}, expected 1.0")
            }
            TrialError::MissingMagiYear { year, month } => {
                write!(f, "IRMAA at {month} needs MAGI for {year}, which is not available")
            }
            TrialError::InvalidDistribution { what, mean, std_dev } => {
                write!(f, "invalid {what} distribution (mean {mean}, std dev {std_dev})")
            }
            TrialError::InflationOutOfRange { year } => {
                write!(f, "inflation series does not cover year {year}")
            }
            TrialError::UnknownAssetClass(class) => {
                write!(f, "no gain-table entry for asset class {class:?}")
            }
            TrialError::InvalidSeppWindow { start, end } => {
                write!(f, "invalid SEPP window {start}..={end}")
            }
        }
    }
}

impl std::error::Error for TrialError {}
