//! GARCH(1,1) volatility model.
//!
//! Constant mean with normal innovations, fitted by maximum likelihood on
//! returns scaled by 100 (percent units):
//!
//! - `ε_t = r_t - μ`
//! - `σ²_t = ω + α·ε²_{t-1} + β·σ²_{t-1}`, started from the sample variance
//! - `-ln L = ½ Σ [ln 2π + ln σ²_t + ε²_t / σ²_t]`
//!
//! The optimizer works on `(μ, ln ω, ln a, ln b)` with
//! `α = a / (1 + a + b)` and `β = b / (1 + a + b)`, which keeps
//! `ω > 0`, `α, β > 0` and `α + β < 1` without explicit constraints.
//!
//! Forecasts follow `σ²_{T+h} = ω + (α + β)·σ²_{T+h-1}` and are reported as
//! daily volatility `√σ² / 100`.

use super::optimize::NelderMead;
use super::{FittedVolatilityModel, ForecastError, VolatilityForecaster};
use crate::TimeSeries;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Configuration for [`Garch11Forecaster`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GarchConfig {
    /// Minimum observations required to fit
    pub min_observations: usize,
    /// Multiplier applied to returns before fitting
    pub scale: f64,
    /// Optimizer iteration cap
    pub max_iterations: usize,
    /// Relative spread of the simplex values at convergence
    pub tolerance: f64,
}

impl Default for GarchConfig {
    fn default() -> Self {
        Self {
            min_observations: 30,
            scale: 100.0,
            max_iterations: 10_000,
            tolerance: 1e-10,
        }
    }
}

/// GARCH(1,1) parameters in scaled return units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GarchParameters {
    /// Constant mean μ
    pub mu: f64,
    /// Variance intercept ω
    pub omega: f64,
    /// ARCH coefficient α
    pub alpha: f64,
    /// GARCH coefficient β
    pub beta: f64,
}

impl GarchParameters {
    /// Persistence `α + β`.
    pub const fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Unconditional variance `ω / (1 - α - β)`.
    pub fn long_run_variance(&self) -> Option<f64> {
        let gap = 1.0 - self.persistence();
        (gap > 0.0).then(|| self.omega / gap)
    }

    fn from_unconstrained(theta: &[f64]) -> Self {
        let a = theta[2].exp();
        let b = theta[3].exp();
        let d = 1.0 + a + b;
        Self {
            mu: theta[0],
            omega: theta[1].exp(),
            alpha: a / d,
            beta: b / d,
        }
    }

    fn to_unconstrained(self) -> [f64; 4] {
        let gap = 1.0 - self.alpha - self.beta;
        [
            self.mu,
            self.omega.ln(),
            (self.alpha / gap).ln(),
            (self.beta / gap).ln(),
        ]
    }

    /// Conditional variances `σ²_0..=σ²_n`; the last entry is the one-step
    /// forecast.
    fn variances(&self, x: &[f64], initial: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(x.len() + 1);
        let mut sigma2 = initial;
        out.push(sigma2);
        for r in x {
            let eps = r - self.mu;
            sigma2 = self.omega + self.alpha * eps * eps + self.beta * sigma2;
            out.push(sigma2);
        }
        out
    }

    fn negative_log_likelihood(&self, x: &[f64], initial: f64) -> f64 {
        let sigma2 = self.variances(x, initial);
        x.iter()
            .zip(&sigma2)
            .map(|(r, s2)| {
                if *s2 <= 0.0 {
                    return f64::INFINITY;
                }
                let eps = r - self.mu;
                0.5 * ((2.0 * PI).ln() + s2.ln() + eps * eps / s2)
            })
            .sum()
    }
}

/// Fits [`Garch11Model`]s.
#[derive(Debug, Clone, Default)]
pub struct Garch11Forecaster {
    config: GarchConfig,
}

impl Garch11Forecaster {
    /// Create a forecaster with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecaster with custom settings.
    pub const fn with_config(config: GarchConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub const fn config(&self) -> &GarchConfig {
        &self.config
    }

    /// Fit and return the concrete model.
    pub fn fit_model(&self, returns: &TimeSeries) -> Result<Garch11Model, ForecastError> {
        let scale = self.config.scale;
        let x: Vec<f64> = returns.observations().iter().map(|r| r * scale).collect();

        if x.len() < self.config.min_observations {
            return Err(ForecastError::TooShort {
                required: self.config.min_observations,
                available: x.len(),
            });
        }

        let n = x.len() as f64;
        let mean = x.iter().sum::<f64>() / n;
        let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        if !(variance > 0.0 && variance.is_finite()) {
            return Err(ForecastError::Degenerate(
                "returns have zero variance".to_string(),
            ));
        }

        let start = GarchParameters {
            mu: mean,
            omega: 0.05 * variance,
            alpha: 0.05,
            beta: 0.90,
        };
        let solver = NelderMead {
            max_iterations: self.config.max_iterations,
            tolerance: self.config.tolerance,
            initial_step: 0.5,
        };
        let min = solver.minimize(
            |theta| GarchParameters::from_unconstrained(theta).negative_log_likelihood(&x, variance),
            &start.to_unconstrained(),
        );

        if !min.value.is_finite() {
            return Err(ForecastError::FitFailed(
                "likelihood is not finite at any candidate".to_string(),
            ));
        }
        let params = GarchParameters::from_unconstrained(&min.point);
        if ![params.mu, params.omega, params.alpha, params.beta]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ForecastError::FitFailed(
                "non-finite parameter estimates".to_string(),
            ));
        }

        let next_variance = params
            .variances(&x, variance)
            .last()
            .copied()
            .unwrap_or(variance);

        debug!(
            omega = params.omega,
            alpha = params.alpha,
            beta = params.beta,
            iterations = min.iterations,
            converged = min.converged,
            "fitted GARCH(1,1)"
        );

        Ok(Garch11Model {
            params,
            next_variance,
            scale,
            log_likelihood: -min.value,
        })
    }
}

impl VolatilityForecaster for Garch11Forecaster {
    fn name(&self) -> &str {
        "GARCH(1,1)"
    }

    fn fit(&self, returns: &TimeSeries) -> Result<Box<dyn FittedVolatilityModel>, ForecastError> {
        Ok(Box::new(self.fit_model(returns)?))
    }
}

/// Fitted GARCH(1,1) model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Garch11Model {
    params: GarchParameters,
    next_variance: f64,
    scale: f64,
    log_likelihood: f64,
}

impl Garch11Model {
    /// Estimated parameters, in scaled units.
    pub const fn params(&self) -> &GarchParameters {
        &self.params
    }

    /// Maximized log-likelihood.
    pub const fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Variance path `σ²_{T+1}..=σ²_{T+h}` in scaled units.
    pub fn variance_path(&self, horizon: usize) -> Vec<f64> {
        let persistence = self.params.persistence();
        std::iter::successors(Some(self.next_variance), |s2| {
            Some(self.params.omega + persistence * s2)
        })
        .take(horizon)
        .collect()
    }
}

impl FittedVolatilityModel for Garch11Model {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        self.variance_path(horizon)
            .into_iter()
            .map(|s2| s2.sqrt() / self.scale)
            .collect()
    }
}
