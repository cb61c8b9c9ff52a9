//! Alpha Vantage API client
//!
//! Alpha Vantage has no ready-made 5-year EPS growth figure, so the growth
//! rate is derived from the annual earnings history: the compound annual rate
//! between the latest reported EPS and the one five years before it.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};
use url::Url;

use super::{
    CompanyProfile, DataProvider, KeyMetrics, get_json, number_field, optional_number, parse_base_url, text_field,
};
use crate::engine::{ValuationInput, normalize_ticker};
use crate::engine::valuation::GROWTH_HORIZON_YEARS;
use crate::error::{Result, ValuationError};

pub const BASE_URL: &str = "https://www.alphavantage.co/query";

const PROVIDER: &str = "Alpha Vantage";

/// Annual EPS entries needed: the latest plus one per growth year
const EARNINGS_YEARS: usize = GROWTH_HORIZON_YEARS.unsigned_abs() as usize + 1;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client against the public endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_client(Client::new(), None, api_key)
    }

    /// Create a client with a prepared HTTP client and an optional base URL override
    ///
    /// The override is the server root; `query` is appended to it.
    pub fn with_client(client: Client, base_url: Option<&str>, api_key: impl Into<String>) -> Result<Self> {
        let endpoint = match base_url {
            Some(root) => parse_base_url(root)?
                .join("query")
                .map_err(|e| ValuationError::Config(e.to_string()))?,
            None => Url::parse(BASE_URL).map_err(|e| ValuationError::Config(e.to_string()))?,
        };

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    /// Create from environment variable ALPHA_VANTAGE_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            ValuationError::Config("ALPHA_VANTAGE_API_KEY environment variable not set".to_string())
        })?;

        Self::new(api_key)
    }

    async fn query(&self, function: &str, symbol: &str) -> Result<Value> {
        let mut params = HashMap::new();
        params.insert("function", function);
        params.insert("symbol", symbol);
        params.insert("apikey", self.api_key.as_str());

        let data = get_json(self.client.get(self.endpoint.clone()).query(&params)).await?;

        // Check for API error messages
        if let Some(error) = data.get("Error Message") {
            return Err(ValuationError::Provider {
                provider: PROVIDER,
                message: error.as_str().unwrap_or_default().to_string(),
            });
        }

        // Throttling and premium notices come back as 200 with one of these
        for notice in ["Note", "Information"] {
            if let Some(message) = data.get(notice).and_then(Value::as_str) {
                return Err(ValuationError::Provider {
                    provider: PROVIDER,
                    message: message.to_string(),
                });
            }
        }

        Ok(data)
    }

    /// Current price from GLOBAL_QUOTE
    pub async fn get_price(&self, symbol: &str) -> Result<f64> {
        let data = self.query("GLOBAL_QUOTE", symbol).await?;
        let quote = data
            .get("Global Quote")
            .ok_or_else(|| ValuationError::missing(symbol, "Global Quote"))?;
        number_field(symbol, "05. price", quote.get("05. price"))
    }

    /// Up to `years` annual reported EPS figures, latest first
    ///
    /// Older entries are never parsed, so a gap further back in the history
    /// does not matter.
    pub async fn get_annual_eps(&self, symbol: &str, years: usize) -> Result<Vec<f64>> {
        let data = self.query("EARNINGS", symbol).await?;
        let annual = data
            .get("annualEarnings")
            .and_then(Value::as_array)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| ValuationError::missing(symbol, "annualEarnings"))?;

        annual
            .iter()
            .take(years)
            .map(|entry| number_field(symbol, "reportedEPS", entry.get("reportedEPS")))
            .collect()
    }

    /// Company OVERVIEW; unknown symbols come back as an empty object
    async fn overview(&self, symbol: &str) -> Result<Value> {
        let data = self.query("OVERVIEW", symbol).await?;
        if data.as_object().is_none_or(serde_json::Map::is_empty) {
            return Err(ValuationError::missing(symbol, "OVERVIEW"));
        }
        Ok(data)
    }
}

/// Compound annual growth between the latest EPS and the one `years` back.
///
/// Undefined when either end is not positive or the history is too short.
pub fn compound_growth(symbol: &str, annual_eps: &[f64], years: i32) -> Result<f64> {
    let field = "5y EPS growth";
    let span = usize::try_from(years).map_err(|_| ValuationError::InvalidInput(format!("bad horizon {years}")))?;

    let (Some(&latest), Some(&oldest)) = (annual_eps.first(), annual_eps.get(span)) else {
        return Err(ValuationError::missing(symbol, field));
    };

    if latest <= 0.0 || oldest <= 0.0 {
        return Err(ValuationError::missing(symbol, field));
    }

    Ok((latest / oldest).powf(1.0 / f64::from(years)) - 1.0)
}

#[async_trait]
impl DataProvider for AlphaVantageClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn fetch_input(&self, ticker: &str) -> Result<ValuationInput> {
        let ticker = normalize_ticker(ticker)?;

        let annual_eps = self.get_annual_eps(&ticker, EARNINGS_YEARS).await?;
        let eps = annual_eps
            .first()
            .copied()
            .ok_or_else(|| ValuationError::missing(&ticker, "reportedEPS"))?;
        let growth = compound_growth(&ticker, &annual_eps, GROWTH_HORIZON_YEARS)?;
        let price = self.get_price(&ticker).await?;

        debug!(price, eps, growth, "fetched valuation input");
        ValuationInput::new(&ticker, price, eps, growth)
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile> {
        let ticker = normalize_ticker(ticker)?;
        let data = self.overview(&ticker).await?;

        Ok(CompanyProfile {
            name: text_field(data.get("Name")),
            sector: text_field(data.get("Sector")),
            industry: text_field(data.get("Industry")),
        })
    }

    /// OVERVIEW carries no cash-flow multiples, leverage or research spend
    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn fetch_metrics(&self, ticker: &str) -> Result<KeyMetrics> {
        let ticker = normalize_ticker(ticker)?;
        let data = self.overview(&ticker).await?;
        let metric = |field: &str| optional_number(&ticker, field, data.get(field));

        Ok(KeyMetrics {
            pe_ratio: metric("PERatio"),
            ps_ratio: metric("PriceToSalesRatioTTM"),
            pb_ratio: metric("PriceToBookRatio"),
            operating_margin: metric("OperatingMarginTTM"),
            net_margin: metric("ProfitMargin"),
            ..KeyMetrics::default()
        })
    }
}
