mod bucket;
mod ledger;
mod market;
mod results;
mod rmd;
mod tax_config;

pub use bucket::{Bucket, BucketKind, Buckets, CASH_BUCKET, Holding};
pub use ledger::{FlowKind, Ledger, LedgerEntry};
pub use market::{
    AssetReturnProfile, CategoryMultipliers, CategoryProfiles, FIXED_INCOME_CLASS,
    FIXED_INCOME_INTEREST_LABEL, GainTable, InflationSeries, MarketOutcome, MonthlyReturnRecord,
    NormalParams, Regime, apply_market_returns,
};
pub use results::{
    BatchResult, BatchStats, MonthlySnapshot, PercentileBand, TaxRecord, TrialResult,
    TrialWarning, WarningKind,
};
pub use rmd::{single_life_expectancy, uniform_lifetime_divisor};
pub use tax_config::{
    IrmaaTier, JurisdictionBrackets, MarketplacePremiums, Profile, TaxBracket, TaxTables,
    YtdBaseline,
};
