//! Rolling beta against a benchmark.
//!
//! Beta measures the sensitivity of an asset's returns to benchmark returns
//! over a trailing window:
//! `β_t = Cov(R_a, R_b) / Var(R_b)`
//!
//! Both moments come from rolling means of the aligned pair,
//! `E[ab] - E[a]E[b]` over `E[b²] - E[b]²`, so they share the window and the
//! degrees-of-freedom convention.

use crate::{Result, TimeSeries};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Roughly one quarter of trading days.
pub const DEFAULT_BETA_WINDOW: usize = 63;

/// Benchmark variance at or below this fraction of `E[b²]` counts as zero.
const VARIANCE_FLOOR: f64 = 1e-10;

const ASSET: &str = "asset";
const BENCHMARK: &str = "benchmark";
const BETA: &str = "beta";

/// Configuration for rolling beta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingBetaConfig {
    /// Number of observations in the trailing window.
    pub window: usize,
    /// Minimum number of observations required for a valid estimate.
    ///
    /// Clamped to `2..=window` when the estimator is built.
    pub min_periods: usize,
}

impl Default for RollingBetaConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_BETA_WINDOW,
            min_periods: DEFAULT_BETA_WINDOW,
        }
    }
}

/// Rolling beta estimator.
///
/// The asset and benchmark are inner-joined on date first; the output shares
/// that joined index. Entries before the window fills, or where the benchmark
/// has zero variance, are `None`.
#[derive(Debug, Clone, Default)]
pub struct RollingBeta {
    config: RollingBetaConfig,
}

impl RollingBeta {
    /// Create a rolling beta estimator with the default 63-day window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rolling beta estimator with a custom window.
    pub const fn with_window(window: usize) -> Self {
        Self::with_config(RollingBetaConfig {
            window,
            min_periods: window,
        })
    }

    /// Create a rolling beta estimator from a full configuration.
    ///
    /// `min_periods` is clamped to `2..=window`; a window below 2 never
    /// yields an estimate.
    pub const fn with_config(config: RollingBetaConfig) -> Self {
        let mut min_periods = config.min_periods;
        if min_periods < 2 {
            min_periods = 2;
        }
        if min_periods > config.window {
            min_periods = config.window;
        }
        Self {
            config: RollingBetaConfig {
                window: config.window,
                min_periods,
            },
        }
    }

    /// Current configuration.
    pub const fn config(&self) -> &RollingBetaConfig {
        &self.config
    }

    /// Compute the beta path of `asset` against `benchmark`.
    pub fn compute(
        &self,
        asset: &TimeSeries,
        benchmark: &TimeSeries,
    ) -> Result<TimeSeries<Option<f64>>> {
        let (a, b) = asset.align(benchmark);
        let dates = a.dates().to_vec();
        if self.config.window < 2 || a.is_empty() {
            return Ok(TimeSeries::from_parts(BETA, dates, vec![None; a.len()]));
        }

        let options = RollingOptionsFixedWindow {
            window_size: self.config.window,
            min_periods: self.config.min_periods,
            ..Default::default()
        };
        let rolling = |expr: Expr| expr.rolling_mean(options.clone());

        let frame = df!(ASSET => a.values(), BENCHMARK => b.values())?;
        let out = frame
            .lazy()
            .with_columns([
                rolling(col(ASSET) * col(BENCHMARK)).alias("mean_ab"),
                rolling(col(BENCHMARK) * col(BENCHMARK)).alias("mean_bb"),
                rolling(col(ASSET)).alias("mean_a"),
                rolling(col(BENCHMARK)).alias("mean_b"),
            ])
            .with_columns([
                (col("mean_ab") - col("mean_a") * col("mean_b")).alias("cov"),
                (col("mean_bb") - col("mean_b") * col("mean_b")).alias("var"),
            ])
            .select([when(col("var").gt(lit(VARIANCE_FLOOR) * col("mean_bb")))
                .then(col("cov") / col("var"))
                .otherwise(lit(f64::NAN))
                .alias(BETA)])
            .collect()?;

        let values = out
            .column(BETA)?
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(TimeSeries::from_parts(BETA, dates, values))
    }
}

/// Rolling beta with a trailing window of `window` observations.
pub fn rolling_beta(
    asset: &TimeSeries,
    benchmark: &TimeSeries,
    window: usize,
) -> Result<TimeSeries<Option<f64>>> {
    RollingBeta::with_window(window).compute(asset, benchmark)
}
