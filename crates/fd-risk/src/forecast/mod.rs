//! Conditional volatility forecasting.
//!
//! A [`VolatilityForecaster`] fits a model to a return series and the
//! resulting [`FittedVolatilityModel`] produces a forward path of daily
//! volatilities in the units of the input returns.
//!
//! Which implementation runs is decided once, by [`ForecasterKind`]. When no
//! model is compiled in (the `garch` feature is off) or fitting fails,
//! [`forecast_volatility`] reports [`VolatilityForecast::Unavailable`] and the
//! rest of the analysis carries on.

#[cfg(feature = "garch")]
pub mod garch;
#[cfg(feature = "garch")]
mod optimize;

#[cfg(feature = "garch")]
pub use garch::{Garch11Forecaster, Garch11Model, GarchConfig, GarchParameters};

use crate::TimeSeries;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;
use tracing::{debug, warn};

/// Default number of days to forecast.
pub const DEFAULT_FORECAST_HORIZON: usize = 20;

/// Reasons a volatility model could not be produced.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    /// No model implementation is available
    #[error("volatility model unavailable: {0}")]
    Unavailable(String),

    /// Too few observations to fit
    #[error("need at least {required} observations to fit, got {available}")]
    TooShort {
        /// Minimum number of observations
        required: usize,
        /// Observations supplied
        available: usize,
    },

    /// Input cannot identify the model, e.g. zero variance
    #[error("degenerate input: {0}")]
    Degenerate(String),

    /// Optimizer produced no usable parameters
    #[error("model fit failed: {0}")]
    FitFailed(String),
}

/// Fits a conditional volatility model to a return series.
pub trait VolatilityForecaster: Send + Sync + Debug {
    /// Model identifier used in reports.
    fn name(&self) -> &str;

    /// Fit the model; missing observations are dropped first.
    fn fit(&self, returns: &TimeSeries) -> Result<Box<dyn FittedVolatilityModel>, ForecastError>;
}

/// A fitted conditional volatility model.
pub trait FittedVolatilityModel: Send + Sync + Debug {
    /// Daily volatility for each of the next `horizon` days.
    fn forecast(&self, horizon: usize) -> Vec<f64>;
}

/// Forecaster used when no model is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableForecaster;

impl VolatilityForecaster for UnavailableForecaster {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn fit(&self, _returns: &TimeSeries) -> Result<Box<dyn FittedVolatilityModel>, ForecastError> {
        Err(ForecastError::Unavailable(
            "no volatility model is installed".to_string(),
        ))
    }
}

/// Forecaster selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecasterKind {
    /// GARCH(1,1) when compiled in, otherwise unavailable
    #[default]
    Garch,
    /// Never forecast
    Disabled,
}

impl ForecasterKind {
    /// Build the selected forecaster.
    pub fn build(self) -> Box<dyn VolatilityForecaster> {
        match self {
            #[cfg(feature = "garch")]
            Self::Garch => Box::new(Garch11Forecaster::default()),
            #[cfg(not(feature = "garch"))]
            Self::Garch => Box::new(UnavailableForecaster),
            Self::Disabled => Box::new(UnavailableForecaster),
        }
    }
}

/// Outcome of a volatility forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VolatilityForecast {
    /// Forecast path produced
    Available {
        /// Model that produced the path
        model: String,
        /// Daily volatility for days `1..=horizon`
        path: Vec<f64>,
    },
    /// No forecast; the reason is suitable for display
    Unavailable {
        /// Why no forecast was produced
        reason: String,
    },
}

impl VolatilityForecast {
    /// Whether a path was produced.
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    /// Forecast path, if any.
    pub fn path(&self) -> Option<&[f64]> {
        match self {
            Self::Available { path, .. } => Some(path),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Fit `forecaster` to `returns` and forecast `horizon` days ahead.
///
/// Every failure is folded into [`VolatilityForecast::Unavailable`].
pub fn forecast_volatility(
    forecaster: &dyn VolatilityForecaster,
    returns: &TimeSeries,
    horizon: usize,
) -> VolatilityForecast {
    if horizon == 0 {
        return unavailable("forecast horizon must be positive".to_string());
    }

    match forecaster.fit(returns) {
        Ok(model) => {
            let path = model.forecast(horizon);
            if path.len() != horizon || path.iter().any(|v| !v.is_finite()) {
                return unavailable(format!("{} produced a non-finite forecast", forecaster.name()));
            }
            debug!(model = forecaster.name(), horizon, "volatility forecast produced");
            VolatilityForecast::Available {
                model: forecaster.name().to_string(),
                path,
            }
        }
        Err(e) => unavailable(e.to_string()),
    }
}

fn unavailable(reason: String) -> VolatilityForecast {
    warn!(%reason, "volatility forecast unavailable");
    VolatilityForecast::Unavailable { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..values.len())
            .map(|i| start + chrono::Days::new(i as u64))
            .collect();
        TimeSeries::new("r", dates, values.to_vec()).unwrap()
    }

    #[derive(Debug)]
    struct Flat(f64);

    impl FittedVolatilityModel for Flat {
        fn forecast(&self, horizon: usize) -> Vec<f64> {
            vec![self.0; horizon]
        }
    }

    #[derive(Debug)]
    struct FlatForecaster(f64);

    impl VolatilityForecaster for FlatForecaster {
        fn name(&self) -> &str {
            "flat"
        }

        fn fit(&self, _: &TimeSeries) -> Result<Box<dyn FittedVolatilityModel>, ForecastError> {
            Ok(Box::new(Flat(self.0)))
        }
    }

    #[test]
    fn test_unavailable_forecaster() {
        let outcome = forecast_volatility(&UnavailableForecaster, &series(&[0.01; 50]), 10);
        assert!(!outcome.is_available());
        assert_eq!(outcome.path(), None);
        let VolatilityForecast::Unavailable { reason } = outcome else {
            panic!("expected unavailable");
        };
        assert!(reason.contains("installed"));
    }

    #[test]
    fn test_available_path() {
        let outcome = forecast_volatility(&FlatForecaster(0.01), &series(&[0.0; 5]), 3);
        assert_eq!(outcome.path(), Some(&[0.01, 0.01, 0.01][..]));
    }

    #[test]
    fn test_non_finite_path_is_unavailable() {
        let outcome = forecast_volatility(&FlatForecaster(f64::NAN), &series(&[0.0; 5]), 3);
        assert!(!outcome.is_available());
    }

    #[test]
    fn test_zero_horizon() {
        let outcome = forecast_volatility(&FlatForecaster(0.01), &series(&[0.0; 5]), 0);
        assert!(!outcome.is_available());
    }

    #[test]
    fn test_disabled_kind_never_forecasts() {
        let forecaster = ForecasterKind::Disabled.build();
        assert!(forecaster.fit(&series(&[0.01; 100])).is_err());
    }

    #[test]
    fn test_serialized_status() {
        let outcome = VolatilityForecast::Unavailable {
            reason: "x".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "unavailable");
    }

    #[cfg(not(feature = "garch"))]
    #[test]
    fn test_garch_kind_without_feature() {
        let forecaster = ForecasterKind::Garch.build();
        assert!(matches!(
            forecaster.fit(&series(&[0.01; 100])),
            Err(ForecastError::Unavailable(_))
        ));
    }
}
