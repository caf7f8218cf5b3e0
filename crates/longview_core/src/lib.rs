//! Policy-driven Monte Carlo forecasting for long-horizon personal finance.
//!
//! Each trial evolves a set of named balance containers ("buckets") across
//! monthly ticks: scheduled cash flows, policy income and withdrawals
//! (salary, Social Security, RMDs, SEPP, property costs), stochastic market
//! returns gated by realized inflation, threshold refills and forced
//! liquidations, and a monthly tax-withholding drip settled every December.
//! Every debit and credit lands in an append-only ledger, and trials are
//! reproducible from their index.
//!
//! # Running a forecast
//!
//! ```ignore
//! use longview_core::{SimulationConfig, run_trials};
//!
//! let config: SimulationConfig = load_config();
//! let batch = run_trials(&config, 1_000);
//! let bands = batch.percentile_bands(&[0.1, 0.5, 0.9]);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod flows;
pub mod month;
pub mod policy;
pub mod simulation;
pub mod taxes;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::SimulationConfig;
pub use engine::{ForecastEngine, TAX_COLLECTION_BUCKET};
pub use error::TrialError;
pub use model::{BatchResult, TrialResult};
pub use month::Month;
pub use simulation::{run_trial, run_trials};
