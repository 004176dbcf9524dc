//! Factor shock scenarios.
//!
//! A scenario maps factor names to hypothetical factor returns. Its projected
//! portfolio return is `intercept + Σ β_f · shock_f` under a fitted
//! regression.

use crate::regression::RegressionResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hypothetical factor returns keyed by factor name.
pub type FactorShocks = BTreeMap<String, f64>;

/// Named stress scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenario {
    /// Display name
    pub name: String,
    /// Factor shocks
    pub shocks: FactorShocks,
}

impl StressScenario {
    /// Create a scenario from `(factor, shock)` pairs.
    pub fn new<I, S>(name: impl Into<String>, shocks: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            shocks: shocks.into_iter().map(|(f, s)| (f.into(), s)).collect(),
        }
    }

    /// Projected portfolio return under `model`.
    pub fn project(&self, model: &RegressionResult) -> f64 {
        apply_factor_shocks(model, &self.shocks)
    }
}

/// Projected portfolio return for `shocks` under `model`.
///
/// Factors without a shock contribute nothing; shocks on factors the model
/// does not contain are ignored.
pub fn apply_factor_shocks(model: &RegressionResult, shocks: &FactorShocks) -> f64 {
    model.intercept()
        + model
            .factors()
            .map(|term| term.coefficient * shocks.get(&term.name).copied().unwrap_or(0.0))
            .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::{INTERCEPT, RegressionTerm};
    use approx::assert_relative_eq;

    fn model() -> RegressionResult {
        let term = |name: &str, coefficient: f64| RegressionTerm {
            name: name.to_string(),
            coefficient,
            std_error: 0.1,
            t_stat: Some(coefficient / 0.1),
        };
        RegressionResult {
            terms: vec![
                term(INTERCEPT, 0.001),
                term("OIL", 0.2),
                term("RATES", -1.5),
                term("USD", 0.4),
            ],
            r_squared: Some(0.5),
            residual_variance: 1e-4,
            df_resid: 100,
            observations: 104,
        }
    }

    #[test]
    fn test_projection() {
        let scenario = StressScenario::new("oil crash", [("OIL", -0.10), ("RATES", 0.005)]);
        assert_relative_eq!(
            scenario.project(&model()),
            0.001 + 0.2 * -0.10 + -1.5 * 0.005,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_unknown_factors_ignored() {
        let shocks = FactorShocks::from([("XLE".to_string(), -0.05)]);
        assert_relative_eq!(apply_factor_shocks(&model(), &shocks), 0.001);
    }

    #[test]
    fn test_empty_scenario_is_intercept() {
        assert_relative_eq!(apply_factor_shocks(&model(), &FactorShocks::new()), 0.001);
    }
}
