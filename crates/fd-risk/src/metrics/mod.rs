//! Risk and performance metrics on a single return series.
//!
//! Every metric drops missing observations first. Degenerate input (empty
//! series, zero variance where the metric scales by it) yields `None`, which
//! callers render as "N/A"; no metric returns an error.

pub mod moments;
pub mod performance;
pub mod var;

pub use moments::{excess_kurtosis, mean, population_std, skewness};
pub use performance::{
    DEFAULT_PERIODS_PER_YEAR, PerformanceSummary, annualize_return, annualize_vol, drawdown,
    hit_rate, max_drawdown, sharpe, sortino,
};
pub use var::{
    RiskEstimate, VarMethod, cornish_fisher_quantile, cvar_historical, var_cornish_fisher,
    var_historical, var_parametric_normal,
};
