//! Stock valuation over market data providers
//!
//! This crate fetches price, trailing earnings-per-share and 5-year EPS growth
//! for a ticker and turns them into two intrinsic value estimates:
//!
//! - a Graham-style linear estimate, `eps * (8.5 + 2 * g * 100)`
//! - an exponential-growth estimate, `eps * 12 * (1 + g)^5`
//!
//! plus the price/value ratio against the exponential estimate. Growth rates
//! are fractions (`0.08` is 8%).
//!
//! # Architecture
//!
//! - [`api`]: the [`DataProvider`] trait with Financial Modeling Prep and
//!   Alpha Vantage adapters
//! - [`engine`]: the pure valuation math and the [`ValuationRunner`] that
//!   drives it over tickers, collecting a [`RunReport`]
//! - [`output`]: CSV sink and console formatters
//!
//! # Example
//!
//! ```rust,ignore
//! use valuer_stock::{ValuationConfig, ValuationRunner, api::provider_from_config, output::DiscardSink};
//!
//! #[tokio::main]
//! async fn main() -> valuer_stock::Result<()> {
//!     let config = ValuationConfig::builder().with_env_api_key().build()?;
//!     let provider = provider_from_config(&config)?;
//!     let runner = ValuationRunner::from_config(provider, &config);
//!
//!     let report = runner.run_batch(["AAPL", "MSFT"], &mut DiscardSink).await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod retry;
pub mod tickers;

// Re-export main types for convenience
pub use api::{CompanyProfile, DataProvider, KeyMetrics};
pub use config::{DataProviderKind, ValuationConfig};
pub use engine::{RunReport, SkippedTicker, Valuation, ValuationInput, ValuationRecord, ValuationRunner};
pub use error::{ErrorKind, Result, ValuationError};
pub use retry::RetryPolicy;
