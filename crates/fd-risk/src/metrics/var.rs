//! Value-at-Risk and Conditional Value-at-Risk estimators.
//!
//! All estimates are return quantiles at `1 - α`: a negative value is a loss.
//!
//! - Historical: empirical quantile with linear interpolation between order
//!   statistics.
//! - Historical CVaR: mean of observations at or below the historical VaR.
//! - Parametric normal: `μ + σ · Φ⁻¹(1 - α)`.
//! - Cornish-Fisher: `μ + σ · z_cf` with
//!   `z_cf = z + (z² - 1)s/6 + (z³ - 3z)k/24 - (2z³ - 5z)s²/36`.

use super::moments::{
    aggregate, excess_kurtosis, linear_quantile, mean, observed, population_std, skewness,
};
use crate::{TimeSeries, normal::inverse_normal_cdf};
use derive_more::Display;
use polars::prelude::lit;
use serde::{Deserialize, Serialize};

/// Estimator used to produce a [`RiskEstimate`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarMethod {
    /// Empirical quantile
    #[display("Historical VaR")]
    Historical,
    /// Empirical tail mean
    #[display("Historical CVaR")]
    HistoricalCvar,
    /// Normal-theory quantile
    #[display("Parametric VaR (Normal)")]
    ParametricNormal,
    /// Skew and kurtosis adjusted normal quantile
    #[display("Cornish-Fisher VaR")]
    CornishFisher,
}

impl VarMethod {
    /// All estimators in reporting order.
    pub const ALL: [Self; 4] = [
        Self::Historical,
        Self::HistoricalCvar,
        Self::ParametricNormal,
        Self::CornishFisher,
    ];

    /// Run this estimator on `returns` at confidence `confidence`.
    pub fn estimate(self, returns: &TimeSeries, confidence: f64) -> RiskEstimate {
        match self {
            Self::Historical => var_historical(returns, confidence),
            Self::HistoricalCvar => cvar_historical(returns, confidence),
            Self::ParametricNormal => var_parametric_normal(returns, confidence),
            Self::CornishFisher => var_cornish_fisher(returns, confidence),
        }
    }
}

/// A loss quantile or tail mean tagged with its confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskEstimate {
    /// Estimator that produced the value
    pub method: VarMethod,
    /// Confidence level α in (0, 1)
    pub confidence: f64,
    /// Estimated return; `None` when undefined for the input
    pub value: Option<f64>,
}

impl RiskEstimate {
    const fn new(method: VarMethod, confidence: f64, value: Option<f64>) -> Self {
        Self {
            method,
            confidence,
            value,
        }
    }

    /// Loss expressed as a positive number (`-value`).
    pub fn loss(&self) -> Option<f64> {
        self.value.map(|v| -v)
    }
}

/// Historical VaR: the `1 - α` empirical quantile.
pub fn var_historical(returns: &TimeSeries, confidence: f64) -> RiskEstimate {
    let value = valid_confidence(confidence)
        .and_then(|_| linear_quantile(&returns.observations(), 1.0 - confidence));
    RiskEstimate::new(VarMethod::Historical, confidence, value)
}

/// Historical CVaR: mean of observations at or below the historical VaR.
pub fn cvar_historical(returns: &TimeSeries, confidence: f64) -> RiskEstimate {
    let value = var_historical(returns, confidence).value.and_then(|threshold| {
        let tail = observed().filter(observed().lt_eq(lit(threshold))).mean();
        aggregate(&returns.observations(), tail)
    });
    RiskEstimate::new(VarMethod::HistoricalCvar, confidence, value)
}

/// Parametric VaR under a normal assumption.
pub fn var_parametric_normal(returns: &TimeSeries, confidence: f64) -> RiskEstimate {
    let value = valid_confidence(confidence).and_then(|_| {
        let obs = returns.observations();
        let (mu, sigma) = location_scale(&obs)?;
        Some(mu + sigma * inverse_normal_cdf(1.0 - confidence))
    });
    RiskEstimate::new(VarMethod::ParametricNormal, confidence, value)
}

/// Cornish-Fisher VaR using sample skewness and excess kurtosis.
pub fn var_cornish_fisher(returns: &TimeSeries, confidence: f64) -> RiskEstimate {
    let value = valid_confidence(confidence).and_then(|_| {
        let obs = returns.observations();
        let (mu, sigma) = location_scale(&obs)?;
        let z = inverse_normal_cdf(1.0 - confidence);
        let z_cf = cornish_fisher_quantile(z, skewness(&obs)?, excess_kurtosis(&obs)?);
        Some(mu + sigma * z_cf)
    });
    RiskEstimate::new(VarMethod::CornishFisher, confidence, value)
}

/// Cornish-Fisher adjusted standard normal quantile.
pub fn cornish_fisher_quantile(z: f64, skew: f64, kurt: f64) -> f64 {
    let z2 = z * z;
    let z3 = z2 * z;
    z + (z2 - 1.0) * skew / 6.0 + (z3 - 3.0 * z) * kurt / 24.0
        - (2.0 * z3 - 5.0 * z) * skew * skew / 36.0
}

fn valid_confidence(confidence: f64) -> Option<()> {
    (confidence > 0.0 && confidence < 1.0).then_some(())
}

/// Mean and population deviation; zero deviation is degenerate.
fn location_scale(obs: &[f64]) -> Option<(f64, f64)> {
    let sigma = population_std(obs)?;
    if sigma == 0.0 {
        return None;
    }
    Some((mean(obs)?, sigma))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| start + chrono::Days::new(i as u64))
            .collect();
        TimeSeries::new("r", dates, values.to_vec()).unwrap()
    }

    fn skewed_sample() -> TimeSeries {
        let values: Vec<f64> = (0..200)
            .map(|i| {
                let x = ((i * 37) % 101) as f64 / 100.0 - 0.5;
                if i % 17 == 0 { x * 0.08 - 0.03 } else { x * 0.02 }
            })
            .collect();
        series(&values)
    }

    #[test]
    fn test_historical_interpolates() {
        let r = series(&[0.05, -0.04, 0.01, -0.02, 0.03, -0.01, 0.0, 0.02, -0.03, 0.04, -0.05]);
        // sorted: -0.05 .. 0.05 in 0.01 steps; h = 10 * 0.05 = 0.5
        let var = var_historical(&r, 0.95);
        assert_eq!(var.method, VarMethod::Historical);
        assert_relative_eq!(var.confidence, 0.95);
        assert_relative_eq!(var.value.unwrap(), -0.045, epsilon = 1e-12);
        assert_relative_eq!(var.loss().unwrap(), 0.045, epsilon = 1e-12);
    }

    #[test]
    fn test_cvar_is_tail_mean() {
        let r = series(&[0.05, -0.04, 0.01, -0.02, 0.03, -0.01, 0.0, 0.02, -0.03, 0.04, -0.05]);
        let cvar = cvar_historical(&r, 0.75);
        // h = 10 * 0.25 = 2.5 -> VaR = -0.025; tail {-0.05, -0.04, -0.03}
        assert_relative_eq!(cvar.value.unwrap(), -0.04, epsilon = 1e-12);
    }

    #[rstest]
    #[case(0.90)]
    #[case(0.95)]
    #[case(0.99)]
    fn test_cvar_not_above_var(#[case] confidence: f64) {
        let r = skewed_sample();
        let var = var_historical(&r, confidence).value.unwrap();
        let cvar = cvar_historical(&r, confidence).value.unwrap();
        assert!(cvar <= var);
    }

    #[test]
    fn test_parametric_normal() {
        let r = series(&[0.02, 0.0, 0.02, 0.0]);
        let var = var_parametric_normal(&r, 0.975);
        assert_relative_eq!(var.value.unwrap(), 0.01 - 0.01 * 1.959_963_985, epsilon = 1e-10);
    }

    #[test]
    fn test_cornish_fisher_matches_normal_without_higher_moments() {
        // Symmetric four-point sample whose adjusted excess kurtosis is zero:
        // c² solves t² - 18t + 1 = 0.
        let c = (9.0 + 80.0_f64.sqrt()).sqrt();
        let r = series(&[
            0.001 - 0.01 * c,
            0.001 - 0.01,
            0.001 + 0.01,
            0.001 + 0.01 * c,
        ]);
        let obs = r.observations();
        assert_relative_eq!(skewness(&obs).unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(excess_kurtosis(&obs).unwrap(), 0.0, epsilon = 1e-9);

        let normal = var_parametric_normal(&r, 0.95).value.unwrap();
        let cf = var_cornish_fisher(&r, 0.95).value.unwrap();
        assert_relative_eq!(normal, cf, epsilon = 1e-10);
    }

    #[test]
    fn test_cornish_fisher_penalizes_left_skew() {
        let r = skewed_sample();
        let obs = r.observations();
        assert!(skewness(&obs).unwrap() < 0.0);

        let normal = var_parametric_normal(&r, 0.99).value.unwrap();
        let cf = var_cornish_fisher(&r, 0.99).value.unwrap();
        assert!(cf < normal);
    }

    #[test]
    fn test_cornish_fisher_quantile_identity() {
        assert_relative_eq!(cornish_fisher_quantile(-1.645, 0.0, 0.0), -1.645);
    }

    #[test]
    fn test_degenerate_inputs_are_undefined() {
        let empty = series(&[]);
        let flat = series(&[0.25; 20]);
        for method in VarMethod::ALL {
            assert_eq!(method.estimate(&empty, 0.95).value, None, "{method}");
        }
        assert_eq!(var_parametric_normal(&flat, 0.95).value, None);
        assert_eq!(var_cornish_fisher(&flat, 0.95).value, None);
        assert_relative_eq!(var_historical(&flat, 0.95).value.unwrap(), 0.25);
        assert_eq!(var_historical(&skewed_sample(), 1.0).value, None);
        assert_eq!(var_historical(&skewed_sample(), 0.0).value, None);
    }

    #[test]
    fn test_missing_values_dropped() {
        let r = series(&[f64::NAN, -0.02, 0.02, f64::INFINITY]);
        assert_relative_eq!(var_historical(&r, 0.5).value.unwrap(), 0.0, epsilon = 1e-12);
    }
}
