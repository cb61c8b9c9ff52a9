//! Configuration for valuation runs

use crate::error::{Result, ValuationError};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Data provider for market data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataProviderKind {
    /// Financial Modeling Prep (default)
    #[default]
    FinancialModelingPrep,
    /// Alpha Vantage (requires API key)
    AlphaVantage,
}

impl DataProviderKind {
    /// Environment variable holding this provider's API key
    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::FinancialModelingPrep => "FMP_API_KEY",
            Self::AlphaVantage => "ALPHA_VANTAGE_API_KEY",
        }
    }
}

impl fmt::Display for DataProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FinancialModelingPrep => write!(f, "fmp"),
            Self::AlphaVantage => write!(f, "alpha-vantage"),
        }
    }
}

impl FromStr for DataProviderKind {
    type Err = ValuationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fmp" | "financial-modeling-prep" => Ok(Self::FinancialModelingPrep),
            "alpha-vantage" | "alphavantage" | "av" => Ok(Self::AlphaVantage),
            other => Err(ValuationError::Config(format!("unknown provider: {other}"))),
        }
    }
}

/// Configuration for valuation runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Which provider adapter to use
    pub provider: DataProviderKind,

    /// Provider API key, sent as a query parameter
    pub api_key: Option<String>,

    /// Override of the provider's base URL
    pub base_url: Option<String>,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Retry policy for provider requests
    pub retry: RetryPolicy,

    /// Also fetch the company profile and key metrics for each ticker
    pub fetch_profile: bool,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            provider: DataProviderKind::FinancialModelingPrep,
            api_key: None,
            base_url: None,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::no_retry(),
            fetch_profile: false,
        }
    }
}

impl ValuationConfig {
    /// Create a new configuration builder
    pub fn builder() -> ValuationConfigBuilder {
        ValuationConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.provider == DataProviderKind::AlphaVantage && self.api_key.is_none() {
            return Err(ValuationError::Config(
                "Alpha Vantage API key required when using AlphaVantage provider".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ValuationError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ValuationError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for ValuationConfig
#[derive(Debug, Default)]
pub struct ValuationConfigBuilder {
    provider: Option<DataProviderKind>,
    api_key: Option<String>,
    base_url: Option<String>,
    request_timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    fetch_profile: bool,
}

impl ValuationConfigBuilder {
    /// Set the data provider
    pub fn provider(mut self, provider: DataProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the provider base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Fetch company profiles alongside valuations
    pub fn fetch_profile(mut self, enabled: bool) -> Self {
        self.fetch_profile = enabled;
        self
    }

    /// Load the provider's API key from the environment unless one is set.
    ///
    /// Call after [`Self::provider`]; the variable depends on the provider.
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.is_none() {
            let var = self.provider.unwrap_or_default().api_key_env();
            if let Ok(key) = std::env::var(var) {
                self.api_key = Some(key);
            }
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ValuationConfig> {
        let defaults = ValuationConfig::default();

        let config = ValuationConfig {
            provider: self.provider.unwrap_or(defaults.provider),
            api_key: self.api_key.filter(|k| !k.trim().is_empty()),
            base_url: self.base_url,
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            retry: self.retry.unwrap_or(defaults.retry),
            fetch_profile: self.fetch_profile,
        };

        config.validate()?;
        Ok(config)
    }
}
