//! Market data providers
//!
//! Every provider answers the same questions for a ticker: the facts the
//! valuation needs, plus an optional descriptive profile and key metrics.
//! The two adapters are interchangeable behind [`DataProvider`].

pub mod alpha_vantage;
pub mod fmp;

pub use alpha_vantage::AlphaVantageClient;
pub use fmp::FinancialModelingPrepClient;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::config::{DataProviderKind, ValuationConfig};
use crate::engine::ValuationInput;
use crate::error::{Result, ValuationError};

/// Descriptive company data, shown next to a valuation when requested
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

/// Valuation multiples and margins reported next to the estimates.
///
/// Every field is optional; providers disagree on what they publish.
/// Margins are fractions, `research_expense` is in millions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub research_expense: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub pcf_ratio: Option<f64>,
    pub pfcf_ratio: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

impl KeyMetrics {
    /// True when the provider reported none of the metrics
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Source of market data for valuations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Human readable provider name, used in logs and errors
    fn name(&self) -> &'static str;

    /// Fetch price, trailing EPS and 5-year EPS growth (as a fraction)
    async fn fetch_input(&self, ticker: &str) -> Result<ValuationInput>;

    /// Fetch name, sector and industry
    async fn fetch_profile(&self, ticker: &str) -> Result<CompanyProfile>;

    /// Fetch ratios, margins and research spend
    async fn fetch_metrics(&self, ticker: &str) -> Result<KeyMetrics>;
}

/// Build the provider selected by `config`
pub fn provider_from_config(config: &ValuationConfig) -> Result<Arc<dyn DataProvider>> {
    let http = build_http_client(config)?;
    let provider: Arc<dyn DataProvider> = match config.provider {
        DataProviderKind::FinancialModelingPrep => Arc::new(FinancialModelingPrepClient::with_client(
            http,
            config.base_url.as_deref(),
            config.api_key.clone(),
        )?),
        DataProviderKind::AlphaVantage => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                ValuationError::Config("Alpha Vantage requires an API key".to_string())
            })?;
            Arc::new(AlphaVantageClient::with_client(
                http,
                config.base_url.as_deref(),
                api_key,
            )?)
        }
    };
    Ok(provider)
}

pub(crate) fn build_http_client(config: &ValuationConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("valuer/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    // Url::join drops the last path segment unless the base ends in '/'
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash)
        .map_err(|e| ValuationError::Config(format!("invalid base URL {raw:?}: {e}")))
}

/// GET `url` and decode the body as JSON, mapping non-2xx to [`ValuationError::Http`]
pub(crate) async fn get_json(request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let url = redact(response.url());

    debug!(%url, status = status.as_u16(), "provider response");

    if !status.is_success() {
        return Err(ValuationError::Http {
            status: status.as_u16(),
            url,
        });
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Strip the api key so URLs can be logged and reported
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "apikey")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(pairs);
    }
    clean.to_string()
}

/// Read a numeric field that may be a JSON number or a numeric string.
///
/// Providers use `null`, `"None"`, `"-"` and `""` for "not reported"; those
/// count as missing rather than malformed.
pub(crate) fn number_field(ticker: &str, field: &str, value: Option<&Value>) -> Result<f64> {
    let malformed = |raw: String| ValuationError::MalformedNumber {
        ticker: ticker.to_string(),
        field: field.to_string(),
        value: raw,
    };

    match value {
        None | Some(Value::Null) => Err(ValuationError::missing(ticker, field)),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| malformed(n.to_string())),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if matches!(trimmed, "" | "-" | "None" | "null") {
                return Err(ValuationError::missing(ticker, field));
            }
            trimmed.parse::<f64>().map_err(|_| malformed(s.clone()))
        }
        Some(other) => Err(malformed(other.to_string())),
    }
}

/// Read a numeric field that is allowed to be absent
pub(crate) fn optional_number(ticker: &str, field: &str, value: Option<&Value>) -> Option<f64> {
    match number_field(ticker, field, value) {
        Ok(n) => Some(n),
        Err(e) => {
            debug!("{e}");
            None
        }
    }
}

/// Read an optional text field, treating provider placeholders as absent
pub(crate) fn text_field(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "None" && *s != "-")
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_number_field_accepts_numbers_and_strings() {
        let data = json!({"a": 1.5, "b": " 2.25 ", "c": -3});
        assert_eq!(number_field("T", "a", data.get("a")).unwrap(), 1.5);
        assert_eq!(number_field("T", "b", data.get("b")).unwrap(), 2.25);
        assert_eq!(number_field("T", "c", data.get("c")).unwrap(), -3.0);
    }

    #[test]
    fn test_number_field_missing_and_malformed() {
        let data = json!({"none": "None", "null": null, "dash": "-", "bad": "abc", "obj": {}});

        for field in ["none", "null", "dash", "absent"] {
            let err = number_field("T", field, data.get(field)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MissingData, "field {field}");
        }
        for field in ["bad", "obj"] {
            let err = number_field("T", field, data.get(field)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedNumber, "field {field}");
        }
    }

    #[test]
    fn test_optional_number() {
        let data = json!({"pe": "21.5", "pb": "None", "bad": "n/a"});
        assert_eq!(optional_number("T", "pe", data.get("pe")), Some(21.5));
        assert_eq!(optional_number("T", "pb", data.get("pb")), None);
        assert_eq!(optional_number("T", "bad", data.get("bad")), None);
        assert_eq!(optional_number("T", "ps", data.get("ps")), None);
    }

    #[test]
    fn test_key_metrics_is_empty() {
        assert!(KeyMetrics::default().is_empty());
        let metrics = KeyMetrics {
            pe_ratio: Some(12.0),
            ..Default::default()
        };
        assert!(!metrics.is_empty());
    }

    #[test]
    fn test_text_field() {
        let data = json!({"name": " Apple Inc ", "sector": "None", "n": 3});
        assert_eq!(text_field(data.get("name")), Some("Apple Inc".to_string()));
        assert_eq!(text_field(data.get("sector")), None);
        assert_eq!(text_field(data.get("n")), None);
        assert_eq!(text_field(data.get("missing")), None);
    }

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("http://localhost:1234/api/v3").unwrap();
        assert_eq!(url.join("quote/AAPL").unwrap().as_str(), "http://localhost:1234/api/v3/quote/AAPL");
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_redact_removes_api_key() {
        let url = Url::parse("http://x/query?function=OVERVIEW&apikey=secret&symbol=IBM").unwrap();
        let clean = redact(&url);
        assert!(!clean.contains("secret"));
        assert!(clean.contains("symbol=IBM"));

        let url = Url::parse("http://x/quote/AAPL?apikey=secret").unwrap();
        assert_eq!(redact(&url), "http://x/quote/AAPL");
    }
}
