//! Drives fetch-then-value over one or many tickers
//!
//! Tickers are processed strictly one after another. In batch mode a failed
//! ticker is recorded in the [`RunReport`] and the loop moves on; output
//! failures still abort, since every later row would fail the same way.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::report::{RunReport, SkippedTicker, ValuationRecord};
use super::valuation::{Valuation, normalize_ticker};
use crate::api::DataProvider;
use crate::config::ValuationConfig;
use crate::error::Result;
use crate::output::RecordSink;
use crate::retry::RetryPolicy;

/// Fetches inputs from a provider and values them
pub struct ValuationRunner {
    provider: Arc<dyn DataProvider>,
    retry: RetryPolicy,
    fetch_profile: bool,
}

impl ValuationRunner {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::no_retry(),
            fetch_profile: false,
        }
    }

    /// Runner using the retry and profile settings of `config`
    pub fn from_config(provider: Arc<dyn DataProvider>, config: &ValuationConfig) -> Self {
        Self::new(provider)
            .with_retry(config.retry.clone())
            .with_profile(config.fetch_profile)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_profile(mut self, enabled: bool) -> Self {
        self.fetch_profile = enabled;
        self
    }

    /// Fetch and value one ticker.
    ///
    /// The result always carries the requested ticker, whatever symbol the
    /// provider echoes back.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn value_ticker(&self, ticker: &str) -> Result<ValuationRecord> {
        let ticker = normalize_ticker(ticker)?;
        let provider = self.provider.as_ref();
        let symbol = ticker.as_str();

        let mut input = self
            .retry
            .execute("fetch_input", move || provider.fetch_input(symbol))
            .await?;

        if input.ticker != ticker {
            warn!(returned = %input.ticker, "provider returned a different symbol");
            input.ticker.clone_from(&ticker);
        }

        let valuation = Valuation::compute(input)?;
        if let Err(e) = valuation.price_to_value_ratio() {
            warn!("{e}; ratio reported as undefined");
        }

        let mut record = ValuationRecord::new(valuation);

        if self.fetch_profile {
            match self
                .retry
                .execute("fetch_profile", move || provider.fetch_profile(symbol))
                .await
            {
                Ok(profile) => record = record.with_profile(profile),
                Err(e) => warn!("profile unavailable: {e}"),
            }

            match self
                .retry
                .execute("fetch_metrics", move || provider.fetch_metrics(symbol))
                .await
            {
                Ok(metrics) => record = record.with_metrics(metrics),
                Err(e) => warn!("key metrics unavailable: {e}"),
            }
        }

        Ok(record)
    }

    /// Value a single ticker and write it; any failure is returned.
    pub async fn run_single(&self, ticker: &str, sink: &mut dyn RecordSink) -> Result<ValuationRecord> {
        let record = self.value_ticker(ticker).await?;
        sink.write_record(&record)?;
        sink.flush()?;
        Ok(record)
    }

    /// Value every ticker, skipping the ones that fail.
    ///
    /// Returns `Err` only for failures that are not about a particular
    /// ticker (configuration, writing output).
    pub async fn run_batch<I, S>(&self, tickers: I, sink: &mut dyn RecordSink) -> Result<RunReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = RunReport::new();

        for raw in tickers {
            let raw = raw.as_ref().trim();

            match self.value_ticker(raw).await {
                Ok(record) => {
                    sink.write_record(&record)?;
                    info!(ticker = record.ticker(), "valued");
                    report.records.push(record);
                }
                Err(e) if e.is_skippable() => {
                    warn!(ticker = raw, "skipping: {e}");
                    report.skipped.push(SkippedTicker::new(raw.to_uppercase(), &e));
                }
                Err(e) => return Err(e),
            }
        }

        sink.flush()?;
        info!("batch finished: {}", report.summary());
        Ok(report)
    }
}
