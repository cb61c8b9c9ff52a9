//! Valuation engine and the runner that drives it over tickers

pub mod report;
pub mod runner;
pub mod valuation;

pub use report::{RunReport, SkippedTicker, ValuationRecord};
pub use runner::ValuationRunner;
pub use valuation::{Valuation, ValuationInput, exponential_value, graham_value, normalize_ticker};
