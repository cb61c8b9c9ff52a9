//! Financial Modeling Prep API client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::{
    CompanyProfile, DataProvider, KeyMetrics, get_json, number_field, optional_number, parse_base_url, text_field,
};
use crate::engine::{ValuationInput, normalize_ticker};
use crate::error::{Result, ValuationError};

pub const BASE_URL: &str = "https://financialmodelingprep.com/api/v3/";

const PROVIDER: &str = "Financial Modeling Prep";

/// Field holding the trailing EPS in `financials/income-statement`
const EPS_FIELD: &str = "EPS";

/// Field holding the 5-year per-share growth in `financial-statement-growth`
const GROWTH_FIELD: &str = "5Y Net Income Growth (per Share)";

/// Field holding research spend, in dollars, in `financials/income-statement`
const RESEARCH_FIELD: &str = "R&D Expenses";

/// Financial Modeling Prep API client
#[derive(Debug, Clone)]
pub struct FinancialModelingPrepClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl FinancialModelingPrepClient {
    /// Create a client against the public endpoint
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_client(Client::new(), None, api_key)
    }

    /// Create a client with a prepared HTTP client and an optional base URL override
    pub fn with_client(client: Client, base_url: Option<&str>, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url.unwrap_or(BASE_URL))?,
            api_key,
        })
    }

    async fn get(&self, path: &str, ticker: &str) -> Result<Value> {
        let url = self
            .base_url
            .join(&format!("{path}/{ticker}"))
            .map_err(|e| ValuationError::InvalidInput(format!("bad ticker {ticker:?}: {e}")))?;

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }

        let data = get_json(request).await?;

        // FMP reports failures as 200 with an "Error Message" body
        if let Some(message) = data.get("Error Message").and_then(Value::as_str) {
            return Err(ValuationError::Provider {
                provider: PROVIDER,
                message: message.to_string(),
            });
        }

        Ok(data)
    }

    /// Latest trailing EPS from the annual income statement
    pub async fn get_eps(&self, ticker: &str) -> Result<f64> {
        let data = self.get("financials/income-statement", ticker).await?;
        let latest = data
            .get("financials")
            .and_then(|f| f.get(0))
            .ok_or_else(|| ValuationError::missing(ticker, "financials[0]"))?;
        number_field(ticker, EPS_FIELD, latest.get(EPS_FIELD))
    }

    /// 5-year per-share growth, as a fraction
    pub async fn get_eps_growth(&self, ticker: &str) -> Result<f64> {
        let data = self.get("financial-statement-growth", ticker).await?;
        let latest = data
            .get("growth")
            .and_then(|g| g.get(0))
            .ok_or_else(|| ValuationError::missing(ticker, "growth[0]"))?;
        number_field(ticker, GROWTH_FIELD, latest.get(GROWTH_FIELD))
    }

    /// Current quoted price
    pub async fn get_price(&self, ticker: &str) -> Result<f64> {
        let data = self.get("quote", ticker).await?;
        let quote = data
            .get(0)
            .ok_or_else(|| ValuationError::missing(ticker, "quote[0]"))?;
        number_field(ticker, "price", quote.get("price"))
    }

    /// Latest entry of `array` in an FMP statement response, or `Null`
    async fn latest(&self, path: &str, array: &str, ticker: &str) -> Result<Value> {
        let mut data = self.get(path, ticker).await?;
        Ok(data
            .get_mut(array)
            .and_then(|entries| entries.get_mut(0))
            .map(Value::take)
            .unwrap_or_default())
    }
}

#[async_trait]
impl DataProvider for FinancialModelingPrepClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn fetch_input(&self, ticker: &str) -> Result<ValuationInput> {
        let ticker = normalize_ticker(ticker)?;

        let eps = self.get_eps(&ticker).await?;
        let growth = self.get_eps_growth(&ticker).await?;
        let price = self.get_price(&ticker).await?;

        debug!(price, eps, growth, "fetched valuation input");
        ValuationInput::new(&ticker, price, eps, growth)
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile> {
        let ticker = normalize_ticker(ticker)?;
        let data = self.get("company/profile", &ticker).await?;
        let profile = data
            .get("profile")
            .ok_or_else(|| ValuationError::missing(&ticker, "profile"))?;

        Ok(CompanyProfile {
            name: text_field(profile.get("companyName")),
            sector: text_field(profile.get("sector")),
            industry: text_field(profile.get("industry")),
        })
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn fetch_metrics(&self, ticker: &str) -> Result<KeyMetrics> {
        let ticker = normalize_ticker(ticker)?;
        let t = ticker.as_str();

        let metrics = self.latest("company-key-metrics", "metrics", t).await?;
        let ratios = self.latest("financial-ratios", "ratios", t).await?;
        let statement = self.latest("financials/income-statement", "financials", t).await?;

        let profitability = ratios.get("profitabilityIndicatorRatios");
        let margin = |field: &str| optional_number(t, field, profitability.and_then(|p| p.get(field)));
        let metric = |field: &str| optional_number(t, field, metrics.get(field));

        Ok(KeyMetrics {
            research_expense: optional_number(t, RESEARCH_FIELD, statement.get(RESEARCH_FIELD))
                .map(|dollars| dollars / 1_000_000.0),
            pe_ratio: metric("PE ratio"),
            ps_ratio: metric("Price to Sales Ratio"),
            pb_ratio: metric("PB ratio"),
            pcf_ratio: metric("POCF ratio"),
            pfcf_ratio: metric("PFCF ratio"),
            operating_margin: margin("operatingProfitMargin"),
            net_margin: margin("netProfitMargin"),
            debt_to_equity: metric("Debt to Equity"),
        })
    }
}
