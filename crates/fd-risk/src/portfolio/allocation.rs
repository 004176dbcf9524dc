//! Weighted portfolio return series under a rebalance policy.
//!
//! Buy and hold: each symbol's wealth path `∏(1 + r)` is weighted once at
//! the start and summed; daily returns are the percentage change of that
//! portfolio wealth, so weights drift with relative performance.
//!
//! Periodic: within each calendar period every symbol's returns compound to
//! `∏(1 + r) - 1`, the target weights combine them into one period return,
//! and that value is held for every day of the period.

use super::{RebalancePolicy, Weights};
use crate::{Result, ReturnMatrix, TimeSeries};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Name given to portfolio return series.
pub const PORTFOLIO_NAME: &str = "portfolio";

/// Builds portfolio returns from constituent returns.
#[derive(Debug, Clone, Default)]
pub struct PortfolioAllocator {
    weights: Weights,
    policy: RebalancePolicy,
}

/// Constituent returns restricted to weighted symbols, gaps as zero returns.
#[derive(Debug)]
struct Universe {
    dates: Vec<NaiveDate>,
    columns: Vec<Vec<f64>>,
    weights: Vec<f64>,
}

impl PortfolioAllocator {
    /// Create an allocator for `weights` rebalanced under `policy`.
    pub const fn new(weights: Weights, policy: RebalancePolicy) -> Self {
        Self { weights, policy }
    }

    /// Target weights as supplied.
    pub const fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Active rebalance policy.
    pub const fn policy(&self) -> RebalancePolicy {
        self.policy
    }

    /// Daily portfolio returns.
    ///
    /// Empty when `returns` is empty or none of the weighted symbols is present.
    pub fn allocate(&self, returns: &ReturnMatrix) -> Result<TimeSeries> {
        let Some(universe) = self.universe(returns)? else {
            return Ok(TimeSeries::empty(PORTFOLIO_NAME));
        };

        let values = match self.policy.period() {
            None => buy_and_hold(&universe),
            Some(period) => {
                let keys: Vec<i64> = universe.dates.iter().map(|d| period.key(*d)).collect();
                let mut values = Vec::with_capacity(universe.dates.len());
                for (range, period_return) in periods(&universe, &keys) {
                    values.extend(std::iter::repeat_n(period_return, range.len()));
                }
                values
            }
        };

        Ok(TimeSeries::from_parts(PORTFOLIO_NAME, universe.dates, values))
    }

    /// One compounded portfolio return per rebalance period, dated at the
    /// period's last observation.
    ///
    /// Buy and hold is a single period spanning the whole sample.
    pub fn period_returns(&self, returns: &ReturnMatrix) -> Result<TimeSeries> {
        let Some(universe) = self.universe(returns)? else {
            return Ok(TimeSeries::empty(PORTFOLIO_NAME));
        };

        let keys: Vec<i64> = match self.policy.period() {
            Some(period) => universe.dates.iter().map(|d| period.key(*d)).collect(),
            None => vec![0; universe.dates.len()],
        };

        let (dates, values): (Vec<NaiveDate>, Vec<f64>) = periods(&universe, &keys)
            .into_iter()
            .map(|(range, value)| (universe.dates[range.end - 1], value))
            .unzip();
        Ok(TimeSeries::from_parts(PORTFOLIO_NAME, dates, values))
    }

    fn universe(&self, returns: &ReturnMatrix) -> Result<Option<Universe>> {
        self.weights.validate()?;
        if returns.is_empty() {
            debug!("empty return matrix, portfolio is empty");
            return Ok(None);
        }

        let normalized = self.weights.normalized();
        let available = returns.symbols();
        let (present, missing): (Vec<_>, Vec<_>) = normalized
            .iter()
            .partition(|(symbol, _)| available.iter().any(|s| s == symbol));

        if !missing.is_empty() {
            let dropped: Vec<&str> = missing.iter().map(|(s, _)| *s).collect();
            warn!(?dropped, "weighted symbols missing from return matrix");
        }
        if present.is_empty() {
            return Ok(None);
        }

        let columns = present
            .iter()
            .map(|(symbol, _)| {
                Ok(returns
                    .column(symbol)?
                    .into_iter()
                    .map(|r| r.filter(|v| v.is_finite()).unwrap_or(0.0))
                    .collect())
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        debug!(
            symbols = present.len(),
            rows = returns.height(),
            policy = %self.policy,
            "allocating portfolio"
        );

        Ok(Some(Universe {
            dates: returns.dates()?,
            columns,
            weights: present.iter().map(|(_, w)| *w).collect(),
        }))
    }
}

/// Daily portfolio returns for `weights` rebalanced under `policy`.
pub fn allocate(
    returns: &ReturnMatrix,
    weights: &Weights,
    policy: RebalancePolicy,
) -> Result<TimeSeries> {
    PortfolioAllocator::new(weights.clone(), policy).allocate(returns)
}

fn buy_and_hold(universe: &Universe) -> Vec<f64> {
    let mut wealth = universe.weights.clone();
    let mut previous: f64 = wealth.iter().sum();

    (0..universe.dates.len())
        .map(|t| {
            for (w, column) in wealth.iter_mut().zip(&universe.columns) {
                *w *= 1.0 + column[t];
            }
            let current: f64 = wealth.iter().sum();
            // A zero-weight portfolio stays flat.
            let ret = if previous == 0.0 {
                0.0
            } else {
                current / previous - 1.0
            };
            previous = current;
            ret
        })
        .collect()
}

/// Contiguous runs of equal period keys with their weighted compounded return.
fn periods(universe: &Universe, keys: &[i64]) -> Vec<(std::ops::Range<usize>, f64)> {
    let mut out = Vec::new();
    let mut start = 0;
    while start < keys.len() {
        let end = keys[start..]
            .iter()
            .position(|k| *k != keys[start])
            .map_or(keys.len(), |offset| start + offset);

        let period_return = universe
            .columns
            .iter()
            .zip(&universe.weights)
            .map(|(column, w)| {
                let growth: f64 = column[start..end].iter().map(|r| 1.0 + r).product();
                w * (growth - 1.0)
            })
            .sum();

        out.push((start..end, period_return));
        start = end;
    }
    out
}
