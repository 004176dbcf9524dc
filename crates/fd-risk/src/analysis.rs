//! End-to-end analysis run.
//!
//! [`Analysis::run`] takes a price matrix plus optional benchmark and factor
//! proxy prices and produces an [`AnalysisReport`]. Every metric degrades on
//! its own: an undefined ratio, a failed regression or an unavailable
//! forecast is recorded in the report and the remaining sections are still
//! computed.

use crate::beta::{DEFAULT_BETA_WINDOW, rolling_beta};
use crate::forecast::{DEFAULT_FORECAST_HORIZON, ForecasterKind, VolatilityForecast, forecast_volatility};
use crate::metrics::{DEFAULT_PERIODS_PER_YEAR, PerformanceSummary, RiskEstimate, VarMethod, drawdown};
use crate::portfolio::{PortfolioAllocator, RebalancePolicy, Weights};
use crate::regression::{RegressionResult, factor_regression};
use crate::returns::{ReturnMethod, to_returns};
use crate::stress::StressScenario;
use crate::{PriceMatrix, Result, RiskError, TimeSeries};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn};

/// Default VaR confidence level.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// Complete configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Target weights; empty means equal weights over every priced symbol
    pub weights: Weights,
    /// Rebalance policy
    pub rebalance: RebalancePolicy,
    /// Return definition
    pub return_method: ReturnMethod,
    /// VaR/CVaR confidence level α
    pub confidence: f64,
    /// Periods per year used for annualization
    pub periods_per_year: f64,
    /// Annual risk-free rate
    pub risk_free_rate: f64,
    /// Rolling beta window in observations
    pub beta_window: usize,
    /// Volatility forecast horizon in days
    pub forecast_horizon: usize,
    /// Volatility model
    pub forecaster: ForecasterKind,
    /// Factor shock scenarios projected through the regression
    pub scenarios: Vec<StressScenario>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            rebalance: RebalancePolicy::default(),
            return_method: ReturnMethod::default(),
            confidence: DEFAULT_CONFIDENCE,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            risk_free_rate: 0.0,
            beta_window: DEFAULT_BETA_WINDOW,
            forecast_horizon: DEFAULT_FORECAST_HORIZON,
            forecaster: ForecasterKind::default(),
            scenarios: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Check ranges that would make the whole run meaningless.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(RiskError::InvalidInput(format!(
                "confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }
        if !(self.periods_per_year > 0.0 && self.periods_per_year.is_finite()) {
            return Err(RiskError::InvalidInput(format!(
                "periods per year must be positive, got {}",
                self.periods_per_year
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(RiskError::InvalidInput(
                "risk-free rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Projected return of one stress scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressProjection {
    /// Scenario name
    pub scenario: String,
    /// Predicted portfolio return
    pub portfolio_return: f64,
}

/// Factor regression section of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegressionOutcome {
    /// Regression fitted
    Fitted {
        /// Fitted model
        result: RegressionResult,
        /// Scenario projections under the fitted model
        stress: Vec<StressProjection>,
    },
    /// Regression could not be fitted; the run continued without it
    Failed {
        /// Display message
        error: String,
    },
}

/// Results of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Symbols that carried weight in the portfolio
    pub symbols: Vec<String>,
    /// Daily portfolio returns
    pub portfolio: TimeSeries,
    /// Portfolio wealth index
    pub wealth: TimeSeries,
    /// Benchmark wealth index
    pub benchmark_wealth: Option<TimeSeries>,
    /// Return and ratio statistics
    pub performance: PerformanceSummary,
    /// VaR and CVaR estimates at the configured confidence
    pub risk: Vec<RiskEstimate>,
    /// Drawdown path
    pub drawdown: TimeSeries,
    /// Rolling beta against the benchmark
    pub rolling_beta: Option<TimeSeries<Option<f64>>>,
    /// Factor regression
    pub regression: Option<RegressionOutcome>,
    /// Volatility forecast
    pub forecast: VolatilityForecast,
}

impl AnalysisReport {
    /// Estimate produced by `method`.
    pub fn risk_estimate(&self, method: VarMethod) -> Option<&RiskEstimate> {
        self.risk.iter().find(|r| r.method == method)
    }
}

/// Runs the full analytics pipeline for one configuration.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    config: AnalysisConfig,
}

impl Analysis {
    /// Create an analysis for `config`.
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the analysis.
    ///
    /// `benchmark` holds benchmark prices; `factors` holds one price column
    /// per factor proxy. Both are converted to returns with the configured
    /// method. Empty prices yield an empty, fully degraded report.
    ///
    /// # Errors
    ///
    /// Fails only on invalid configuration or malformed price data; per-metric
    /// and per-section problems are reported inside the report.
    pub fn run(
        &self,
        prices: &PriceMatrix,
        benchmark: Option<&TimeSeries>,
        factors: Option<&PriceMatrix>,
    ) -> Result<AnalysisReport> {
        let span = info_span!("analysis", symbols = prices.symbols().len(), rows = prices.height());
        let _guard = span.enter();

        let config = &self.config;
        config.validate()?;

        let weights = if config.weights.is_empty() {
            Weights::equal(prices.symbols())
        } else {
            config.weights.clone()
        };
        let symbols: Vec<String> = weights
            .symbols()
            .filter(|s| prices.symbols().iter().any(|p| p == s))
            .map(str::to_string)
            .collect();

        let returns = to_returns(prices, config.return_method)?;
        let portfolio =
            PortfolioAllocator::new(weights, config.rebalance).allocate(&returns)?;
        debug!(observations = portfolio.len(), "portfolio returns built");

        let benchmark_returns = benchmark.and_then(|b| self.benchmark_returns(b));
        let rolling_beta = benchmark_returns.as_ref().and_then(|b| {
            rolling_beta(&portfolio, b, config.beta_window)
                .inspect_err(|e| warn!(error = %e, "rolling beta skipped"))
                .ok()
        });

        let regression = factors.map(|f| self.regression(&portfolio, f));
        let forecaster = config.forecaster.build();
        let forecast = forecast_volatility(forecaster.as_ref(), &portfolio, config.forecast_horizon);

        Ok(AnalysisReport {
            symbols,
            wealth: portfolio.cumulative_wealth(),
            benchmark_wealth: benchmark_returns.as_ref().map(|b| b.cumulative_wealth()),
            performance: PerformanceSummary::compute(
                &portfolio,
                config.risk_free_rate,
                config.periods_per_year,
            ),
            risk: VarMethod::ALL
                .iter()
                .map(|m| m.estimate(&portfolio, config.confidence))
                .collect(),
            drawdown: drawdown(&portfolio)?,
            rolling_beta,
            regression,
            forecast,
            portfolio,
        })
    }

    fn benchmark_returns(&self, prices: &TimeSeries) -> Option<TimeSeries> {
        let name = prices.name().to_string();
        let values = prices
            .values()
            .iter()
            .map(|v| v.is_finite().then_some(*v))
            .collect();
        let converted = PriceMatrix::from_columns(prices.dates().to_vec(), vec![(name.clone(), values)])
            .and_then(|m| to_returns(&m, self.config.return_method))
            .and_then(|r| if r.is_empty() { Ok(TimeSeries::empty(&name)) } else { r.series(&name) });

        match converted {
            Ok(series) => Some(series),
            Err(e) => {
                warn!(error = %e, "benchmark skipped");
                None
            }
        }
    }

    fn regression(&self, portfolio: &TimeSeries, factor_prices: &PriceMatrix) -> RegressionOutcome {
        let fitted = to_returns(factor_prices, self.config.return_method)
            .and_then(|factors| factor_regression(portfolio, &factors));

        match fitted {
            Ok(result) => {
                let stress = self
                    .config
                    .scenarios
                    .iter()
                    .map(|s| StressProjection {
                        scenario: s.name.clone(),
                        portfolio_return: s.project(&result),
                    })
                    .collect();
                RegressionOutcome::Fitted { result, stress }
            }
            Err(e) => {
                warn!(error = %e, "factor regression failed");
                RegressionOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
