//! Target weight vectors.

use crate::{Result, RiskError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from symbol to target weight.
///
/// Raw weights need not sum to one; [`Weights::normalized`] rescales them by
/// their own sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(BTreeMap<String, f64>);

impl Weights {
    /// Build from `(symbol, weight)` pairs; a repeated symbol keeps the last weight.
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self(pairs.into_iter().map(|(s, w)| (s.into(), w)).collect())
    }

    /// Equal weights over `symbols`.
    pub fn equal<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(symbols.into_iter().map(|s| (s, 1.0))).normalized()
    }

    /// Reject negative or non-finite weights.
    pub fn validate(&self) -> Result<()> {
        match self.0.iter().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            Some((symbol, w)) => Err(RiskError::InvalidInput(format!(
                "weight for {symbol} must be a non-negative number, got {w}"
            ))),
            None => Ok(()),
        }
    }

    /// Weight for `symbol`.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.0.get(symbol).copied()
    }

    /// Symbols in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over `(symbol, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(s, w)| (s.as_str(), *w))
    }

    /// Sum of the raw weights.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Weights divided by their sum; all zero when the sum is zero.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        Self(
            self.0
                .iter()
                .map(|(s, w)| {
                    let scaled = if total == 0.0 { 0.0 } else { w / total };
                    (s.clone(), scaled)
                })
                .collect(),
        )
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no symbols.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Weights {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(&[0.5, 0.25, 0.25])]
    #[case(&[2.0, 1.0, 1.0])]
    #[case(&[0.1, 0.0, 7.3])]
    #[case(&[1e-9, 3e-9])]
    fn test_normalized_sums_to_one(#[case] raw: &[f64]) {
        let weights: Weights = raw
            .iter()
            .enumerate()
            .map(|(i, w)| (format!("S{i}"), *w))
            .collect();
        assert_relative_eq!(weights.normalized().total(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_sum_gives_zero_weights() {
        let weights = Weights::new([("A", 0.0), ("B", 0.0)]).normalized();
        assert!(weights.iter().all(|(_, w)| w == 0.0));
        assert_eq!(weights.len(), 2);
    }

    #[test]
    fn test_equal_weights() {
        let weights = Weights::equal(["A", "B", "C", "D"]);
        assert_relative_eq!(weights.get("C").unwrap(), 0.25);
    }

    #[test]
    fn test_validate() {
        assert!(Weights::new([("A", 0.5)]).validate().is_ok());
        assert!(Weights::new([("A", -0.5)]).validate().is_err());
        assert!(Weights::new([("A", f64::NAN)]).validate().is_err());
    }

    #[test]
    fn test_serde_as_map() {
        let weights = Weights::new([("SPY", 0.5), ("XLE", 0.5)]);
        let json = serde_json::to_string(&weights).unwrap();
        assert_eq!(json, r#"{"SPY":0.5,"XLE":0.5}"#);
        let back: Weights = serde_json::from_str(&json).unwrap();
        assert_eq!(back, weights);
    }
}
