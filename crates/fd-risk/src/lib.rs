#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod beta;
pub mod error;
pub mod forecast;
pub mod frame;
pub mod metrics;
pub mod normal;
pub mod portfolio;
pub mod regression;
pub mod returns;
pub mod series;
pub mod stress;

// Re-export core types
pub use analysis::{Analysis, AnalysisConfig, AnalysisReport, RegressionOutcome};
pub use beta::{RollingBeta, RollingBetaConfig, rolling_beta};
pub use error::{Result, RiskError};
pub use forecast::{
    ForecastError, ForecasterKind, VolatilityForecast, VolatilityForecaster, forecast_volatility,
};
pub use frame::{PriceMatrix, ReturnMatrix};
pub use metrics::{PerformanceSummary, RiskEstimate, VarMethod};
pub use normal::inverse_normal_cdf;
pub use portfolio::{PortfolioAllocator, RebalancePolicy, Weights, allocate};
pub use regression::{RegressionResult, factor_regression};
pub use returns::{ReturnMethod, to_returns};
pub use series::TimeSeries;
pub use stress::{StressScenario, apply_factor_shocks};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
