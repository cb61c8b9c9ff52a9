//! Intrinsic value estimates
//!
//! Growth rates are fractions throughout (`0.08` is 8%). The Graham formula
//! works in percentage points, so the rate is scaled by 100 inside it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};

/// No-growth P/E multiple of the Graham formula
pub const GRAHAM_BASE_MULTIPLE: f64 = 8.5;

/// Multiplier applied to growth (in percentage points) by the Graham formula
pub const GRAHAM_GROWTH_MULTIPLIER: f64 = 2.0;

/// Earnings multiple used to capitalize compounded EPS
pub const EXPONENTIAL_MULTIPLE: f64 = 12.0;

/// Number of periods the current growth rate is compounded over
pub const GROWTH_HORIZON_YEARS: i32 = 5;

/// Facts needed to value one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationInput {
    pub ticker: String,
    pub price: f64,
    pub eps: f64,
    pub eps_growth_rate: f64,
}

impl ValuationInput {
    /// Build a checked input.
    ///
    /// The ticker is trimmed and uppercased. Every number must be finite and
    /// the price must not be negative.
    pub fn new(ticker: &str, price: f64, eps: f64, eps_growth_rate: f64) -> Result<Self> {
        let ticker = normalize_ticker(ticker)?;

        for (field, value) in [
            ("price", price),
            ("eps", eps),
            ("eps_growth_rate", eps_growth_rate),
        ] {
            if !value.is_finite() {
                return Err(ValuationError::MalformedNumber {
                    ticker,
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }

        if price < 0.0 {
            return Err(ValuationError::InvalidInput(format!(
                "negative price {price} for {ticker}"
            )));
        }

        Ok(Self {
            ticker,
            price,
            eps,
            eps_growth_rate,
        })
    }
}

/// Trim and uppercase a symbol, rejecting empty ones.
pub fn normalize_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(ValuationError::InvalidInput("empty ticker".to_string()));
    }
    Ok(ticker)
}

/// `eps * (8.5 + 2 * g * 100)`
pub fn graham_value(eps: f64, eps_growth_rate: f64) -> f64 {
    eps * (GRAHAM_BASE_MULTIPLE + GRAHAM_GROWTH_MULTIPLIER * eps_growth_rate * 100.0)
}

/// `eps * 12 * (1 + g)^5`
pub fn exponential_value(eps: f64, eps_growth_rate: f64) -> f64 {
    eps * EXPONENTIAL_MULTIPLE * (1.0 + eps_growth_rate).powi(GROWTH_HORIZON_YEARS)
}

/// Both estimates for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub input: ValuationInput,
    pub graham_value: f64,
    pub exponential_value: f64,
}

impl Valuation {
    /// Compute both estimates. Pure; no I/O.
    ///
    /// Finite inputs large enough to overflow either estimate are rejected
    /// with `InvalidInput` instead of producing infinities.
    pub fn compute(input: ValuationInput) -> Result<Self> {
        let graham_value = graham_value(input.eps, input.eps_growth_rate);
        let exponential_value = exponential_value(input.eps, input.eps_growth_rate);

        if !graham_value.is_finite() || !exponential_value.is_finite() {
            return Err(ValuationError::InvalidInput(format!(
                "valuation of {} overflows (eps {}, growth {})",
                input.ticker, input.eps, input.eps_growth_rate
            )));
        }

        Ok(Self {
            input,
            graham_value,
            exponential_value,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.input.ticker
    }

    /// `price / exponential_value`
    pub fn price_to_value_ratio(&self) -> Result<f64> {
        if self.exponential_value == 0.0 {
            return Err(ValuationError::DivisionByZero {
                ticker: self.input.ticker.clone(),
            });
        }
        Ok(self.input.price / self.exponential_value)
    }

    /// Ratio for reporting; undefined ratios become `None`
    pub fn ratio_or_none(&self) -> Option<f64> {
        self.price_to_value_ratio().ok()
    }

    /// `(price, exponential_value, graham_value)`
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.input.price, self.exponential_value, self.graham_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const EPSILON: f64 = 1e-9;

    fn input(eps: f64, growth: f64, price: f64) -> ValuationInput {
        ValuationInput::new("test", price, eps, growth).unwrap()
    }

    #[test]
    fn test_growth_compounding_scenario() {
        let valuation = Valuation::compute(input(5.0, 0.08, 150.0)).unwrap();

        assert!((valuation.exponential_value - 88.159_684_608).abs() < 1e-6);
        assert!((valuation.graham_value - 122.5).abs() < EPSILON);

        let ratio = valuation.price_to_value_ratio().unwrap();
        assert!((ratio - 1.701_457_99).abs() < 1e-6);
        assert_eq!(valuation.as_tuple().0, 150.0);
    }

    #[test]
    fn test_zero_eps_has_undefined_ratio() {
        let valuation = Valuation::compute(input(0.0, 0.05, 100.0)).unwrap();

        assert_eq!(valuation.exponential_value, 0.0);
        assert_eq!(valuation.graham_value, 0.0);

        let err = valuation.price_to_value_ratio().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DivisionByZero);
        assert!(valuation.ratio_or_none().is_none());
    }

    #[test]
    fn test_formulas_match_direct_evaluation() {
        let eps_values: [f64; 6] = [-3.2, -0.01, 0.5, 1.0, 7.77, 120.0];
        let growth_values: [f64; 7] = [-0.9, -0.25, 0.0, 0.03, 0.15, 0.6, 2.0];

        for &eps in &eps_values {
            for &g in &growth_values {
                let expected_exp = eps * 12.0 * (1.0 + g).powf(5.0);
                let expected_graham = eps * (8.5 + 200.0 * g);

                let tolerance = EPSILON * expected_exp.abs().max(1.0);
                assert!((exponential_value(eps, g) - expected_exp).abs() < tolerance);
                assert!((graham_value(eps, g) - expected_graham).abs() < EPSILON * expected_graham.abs().max(1.0));
            }
        }
    }

    #[test]
    fn test_negative_eps_keeps_sign() {
        let valuation = Valuation::compute(input(-2.0, 0.1, 40.0)).unwrap();

        assert!(valuation.graham_value < 0.0);
        assert!(valuation.exponential_value < 0.0);
        assert!((valuation.graham_value - (-2.0 * 28.5)).abs() < EPSILON);
        assert!(valuation.price_to_value_ratio().unwrap() < 0.0);
    }

    #[test]
    fn test_ratio_is_price_over_exponential() {
        let valuation = Valuation::compute(input(2.0, 0.0, 48.0)).unwrap();
        assert!((valuation.exponential_value - 24.0).abs() < EPSILON);
        assert!((valuation.price_to_value_ratio().unwrap() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_overflowing_estimates_rejected() {
        let huge_eps = Valuation::compute(input(1e307, 0.5, 10.0)).unwrap_err();
        assert_eq!(huge_eps.kind(), ErrorKind::InvalidInput);

        let huge_growth = Valuation::compute(input(1.0, 1e100, 10.0)).unwrap_err();
        assert_eq!(huge_growth.kind(), ErrorKind::InvalidInput);

        let huge_loss = Valuation::compute(input(-1e307, 0.5, 10.0)).unwrap_err();
        assert_eq!(huge_loss.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_input_normalizes_ticker() {
        let input = ValuationInput::new("  aapl\n", 1.0, 1.0, 0.1).unwrap();
        assert_eq!(input.ticker, "AAPL");
    }

    #[test]
    fn test_input_rejects_bad_values() {
        assert_eq!(
            ValuationInput::new("", 1.0, 1.0, 0.1).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            ValuationInput::new("AAA", f64::NAN, 1.0, 0.1).unwrap_err().kind(),
            ErrorKind::MalformedNumber
        );
        assert_eq!(
            ValuationInput::new("AAA", 1.0, f64::INFINITY, 0.1).unwrap_err().kind(),
            ErrorKind::MalformedNumber
        );
        assert_eq!(
            ValuationInput::new("AAA", -1.0, 1.0, 0.1).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }
}
