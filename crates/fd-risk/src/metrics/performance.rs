//! Performance ratios and drawdown.
//!
//! - Annualized return: `(∏(1 + r))^(p / n) - 1`
//! - Annualized volatility: `σ_pop · √p`
//! - Sharpe: `mean(r - rf/p) · p / (σ_pop(r - rf/p) · √p)`
//! - Sortino: as Sharpe, with the deviation of negative excess returns only
//! - Drawdown: `W_t / max_{s≤t} W_s - 1` on the wealth index `W`

use super::moments::{aggregate, mean, observed, population_std};
use crate::{Result, TimeSeries};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Trading days per year.
pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

const RETURN_COLUMN: &str = "return";
const DRAWDOWN: &str = "drawdown";

/// Compound annual growth rate.
pub fn annualize_return(returns: &TimeSeries, periods_per_year: f64) -> Option<f64> {
    let obs = returns.observations();
    if obs.is_empty() {
        return None;
    }
    let growth: f64 = obs.iter().map(|r| 1.0 + r).product();
    finite(growth.powf(periods_per_year / obs.len() as f64) - 1.0)
}

/// Annualized population volatility.
pub fn annualize_vol(returns: &TimeSeries, periods_per_year: f64) -> Option<f64> {
    population_std(&returns.observations()).map(|s| s * periods_per_year.sqrt())
}

/// Annualized Sharpe ratio against an annual risk-free rate.
///
/// `None` when the excess-return volatility is exactly zero.
pub fn sharpe(returns: &TimeSeries, risk_free: f64, periods_per_year: f64) -> Option<f64> {
    let excess = excess_returns(returns, risk_free, periods_per_year);
    let vol = population_std(&excess)? * periods_per_year.sqrt();
    if vol == 0.0 {
        return None;
    }
    finite(mean(&excess)? * periods_per_year / vol)
}

/// Annualized Sortino ratio against an annual risk-free rate.
///
/// `None` when there are no negative excess returns or their deviation is zero.
pub fn sortino(returns: &TimeSeries, risk_free: f64, periods_per_year: f64) -> Option<f64> {
    let excess = excess_returns(returns, risk_free, periods_per_year);
    let downside: Vec<f64> = excess.iter().copied().filter(|r| *r < 0.0).collect();
    let dd = population_std(&downside)? * periods_per_year.sqrt();
    if dd == 0.0 {
        return None;
    }
    finite(mean(&excess)? * periods_per_year / dd)
}

/// Drawdown path relative to the running peak of the wealth index.
///
/// Missing returns are dropped first, as for the wealth index itself.
pub fn drawdown(returns: &TimeSeries) -> Result<TimeSeries> {
    let clean = returns.dropna();
    if clean.is_empty() {
        return Ok(TimeSeries::empty(DRAWDOWN));
    }

    let frame = df!(RETURN_COLUMN => clean.values())?;
    let out = frame
        .lazy()
        .select([underwater(col(RETURN_COLUMN)).alias(DRAWDOWN)])
        .collect()?;
    let values = out.column(DRAWDOWN)?.f64()?.into_no_null_iter().collect();
    Ok(TimeSeries::from_parts(DRAWDOWN, clean.dates().to_vec(), values))
}

/// Deepest drawdown; `None` for an empty series.
pub fn max_drawdown(returns: &TimeSeries) -> Option<f64> {
    aggregate(&returns.observations(), underwater(observed()).min())
}

/// `W / cummax(W) - 1` with `W = cumprod(1 + r)`.
fn underwater(returns: Expr) -> Expr {
    let wealth = (lit(1.0) + returns).cum_prod(false);
    wealth.clone() / wealth.cum_max(false) - lit(1.0)
}

/// Fraction of strictly positive observations.
pub fn hit_rate(returns: &TimeSeries) -> Option<f64> {
    let obs = returns.observations();
    if obs.is_empty() {
        return None;
    }
    Some(obs.iter().filter(|r| **r > 0.0).count() as f64 / obs.len() as f64)
}

fn excess_returns(returns: &TimeSeries, risk_free: f64, periods_per_year: f64) -> Vec<f64> {
    let per_period = risk_free / periods_per_year;
    returns
        .observations()
        .into_iter()
        .map(|r| r - per_period)
        .collect()
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Headline performance statistics for one return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Compound annual growth rate
    pub annual_return: Option<f64>,
    /// Annualized volatility
    pub annual_vol: Option<f64>,
    /// Sharpe ratio
    pub sharpe: Option<f64>,
    /// Sortino ratio
    pub sortino: Option<f64>,
    /// Fraction of positive periods
    pub hit_rate: Option<f64>,
    /// Deepest drawdown (non-positive)
    pub max_drawdown: Option<f64>,
}

impl PerformanceSummary {
    /// Compute every statistic; each one degrades to `None` independently.
    pub fn compute(returns: &TimeSeries, risk_free: f64, periods_per_year: f64) -> Self {
        Self {
            annual_return: annualize_return(returns, periods_per_year),
            annual_vol: annualize_vol(returns, periods_per_year),
            sharpe: sharpe(returns, risk_free, periods_per_year),
            sortino: sortino(returns, risk_free, periods_per_year),
            hit_rate: hit_rate(returns),
            max_drawdown: max_drawdown(returns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| start + chrono::Days::new(i as u64))
            .collect();
        TimeSeries::new("r", dates, values.to_vec()).unwrap()
    }

    #[test]
    fn test_annualize_return() {
        let r = series(&[0.01; 252]);
        assert_relative_eq!(
            annualize_return(&r, 252.0).unwrap(),
            1.01_f64.powi(252) - 1.0,
            max_relative = 1e-12
        );

        // Two periods of 10% over a 2-periods-per-year calendar is one year.
        let r = series(&[0.10, 0.10]);
        assert_relative_eq!(annualize_return(&r, 2.0).unwrap(), 0.21, epsilon = 1e-12);
    }

    #[test]
    fn test_annualize_vol() {
        let r = series(&[0.01, -0.01, 0.01, -0.01]);
        assert_relative_eq!(
            annualize_vol(&r, 252.0).unwrap(),
            0.01 * 252.0_f64.sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sharpe() {
        let r = series(&[0.02, 0.0, 0.02, 0.0]);
        // mean 0.01, population std 0.01
        assert_relative_eq!(
            sharpe(&r, 0.0, 252.0).unwrap(),
            252.0_f64.sqrt(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_sharpe_zero_vol_is_undefined() {
        let r = series(&[0.25; 10]);
        assert_eq!(sharpe(&r, 0.0, 252.0), None);
        assert_eq!(sharpe(&series(&[]), 0.0, 252.0), None);
    }

    #[test]
    fn test_sortino() {
        let r = series(&[0.03, -0.01, 0.03, -0.03]);
        // downside [-0.01, -0.03]: population std 0.01; mean excess 0.005
        assert_relative_eq!(
            sortino(&r, 0.0, 252.0).unwrap(),
            0.005 * 252.0 / (0.01 * 252.0_f64.sqrt()),
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_sortino_undefined_without_dispersed_losses() {
        assert_eq!(sortino(&series(&[0.01, 0.02]), 0.0, 252.0), None);
        assert_eq!(sortino(&series(&[0.01, -0.02, -0.02]), 0.0, 252.0), None);
    }

    #[test]
    fn test_drawdown_path() {
        let r = series(&[0.10, -0.50, 0.20, 1.0]);
        let dd = drawdown(&r).unwrap();
        // wealth 1.1, 0.55, 0.66, 1.32
        assert_relative_eq!(dd.values()[0], 0.0);
        assert_relative_eq!(dd.values()[1], -0.5, epsilon = 1e-12);
        assert_relative_eq!(dd.values()[2], 0.66 / 1.1 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(dd.values()[3], 0.0);
        assert_relative_eq!(max_drawdown(&r).unwrap(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_drawdown_skips_missing_returns() {
        let r = series(&[0.10, f64::NAN, -0.10]);
        let dd = drawdown(&r).unwrap();
        assert_eq!(dd.len(), 2);
        assert_relative_eq!(dd.values()[1], -0.10, epsilon = 1e-12);
        assert!(drawdown(&series(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let r = series(&[0.01, 0.0, -0.01, 0.02, f64::NAN]);
        assert_relative_eq!(hit_rate(&r).unwrap(), 0.5);
        assert_eq!(hit_rate(&series(&[])), None);
    }

    #[test]
    fn test_summary_on_empty_series() {
        let summary = PerformanceSummary::compute(&series(&[]), 0.0, 252.0);
        assert_eq!(summary.annual_return, None);
        assert_eq!(summary.annual_vol, None);
        assert_eq!(summary.sharpe, None);
        assert_eq!(summary.sortino, None);
        assert_eq!(summary.hit_rate, None);
        assert_eq!(summary.max_drawdown, None);
    }
}
