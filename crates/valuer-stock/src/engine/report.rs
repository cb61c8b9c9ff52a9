//! Per-ticker results and the per-run report

use serde::{Deserialize, Serialize};

use super::valuation::Valuation;
use crate::api::{CompanyProfile, KeyMetrics};
use crate::error::{ErrorKind, ValuationError};

/// One successfully valued ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRecord {
    pub valuation: Valuation,
    pub profile: Option<CompanyProfile>,
    pub metrics: Option<KeyMetrics>,
}

impl ValuationRecord {
    pub fn new(valuation: Valuation) -> Self {
        Self {
            valuation,
            profile: None,
            metrics: None,
        }
    }

    pub fn with_profile(mut self, profile: CompanyProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_metrics(mut self, metrics: KeyMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn ticker(&self) -> &str {
        self.valuation.ticker()
    }
}

/// A ticker a batch run could not value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
    #[serde(skip)]
    pub kind: Option<ErrorKind>,
}

impl SkippedTicker {
    pub fn new(ticker: impl Into<String>, error: &ValuationError) -> Self {
        Self {
            ticker: ticker.into(),
            reason: error.to_string(),
            kind: Some(error.kind()),
        }
    }
}

/// Outcome of a run: every ticker ends up in exactly one of the two lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub records: Vec<ValuationRecord>,
    pub skipped: Vec<SkippedTicker>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.records.len() + self.skipped.len()
    }

    /// True when nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Records whose price/value ratio is undefined
    pub fn undefined_ratios(&self) -> impl Iterator<Item = &ValuationRecord> {
        self.records
            .iter()
            .filter(|r| r.valuation.ratio_or_none().is_none())
    }

    /// One-line summary, e.g. `3 valued, 1 skipped`
    pub fn summary(&self) -> String {
        format!("{} valued, {} skipped", self.records.len(), self.skipped.len())
    }
}
