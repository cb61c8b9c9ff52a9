//! Error types for valuation operations

use thiserror::Error;

/// Coarse classification used to decide how a failure is handled.
///
/// Batch runs skip a ticker on `Network`, `MissingData` and `MalformedNumber`,
/// while `Config` and `Io` abort the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    MissingData,
    MalformedNumber,
    DivisionByZero,
    InvalidInput,
    Config,
    Io,
}

/// Valuation specific errors
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Transport level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Upstream answered 200 but reported an error in the body
    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// A required field is absent from the provider response
    #[error("Missing data for {ticker}: {field}")]
    MissingData { ticker: String, field: String },

    /// A field is present but not a number
    #[error("Malformed number for {ticker}: {field} = {value:?}")]
    MalformedNumber {
        ticker: String,
        field: String,
        value: String,
    },

    /// Price/value ratio requested while the exponential value is zero
    #[error("Division by zero: exponential value of {ticker} is 0")]
    DivisionByZero { ticker: String },

    /// Response body could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Caller supplied something unusable (empty ticker, non-finite input)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading tickers or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a CSV row failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ValuationError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Http { .. } | Self::Provider { .. } => ErrorKind::Network,
            Self::MissingData { .. } | Self::Json(_) => ErrorKind::MissingData,
            Self::MalformedNumber { .. } => ErrorKind::MalformedNumber,
            Self::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) | Self::Csv(_) => ErrorKind::Io,
        }
    }

    /// Whether a batch run may skip this ticker and carry on
    pub fn is_skippable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Config | ErrorKind::Io)
    }

    /// Whether repeating the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub(crate) fn missing(ticker: &str, field: impl Into<String>) -> Self {
        Self::MissingData {
            ticker: ticker.to_string(),
            field: field.into(),
        }
    }
}

/// Result type alias for valuation operations
pub type Result<T> = std::result::Result<T, ValuationError>;
