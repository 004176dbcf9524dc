//! Sample moments used by the parametric estimators.
//!
//! Every statistic is a polars aggregation over a single `value` column.
//! Skewness and kurtosis are the bias-adjusted sample estimators (G1, G2),
//! matching what spreadsheet and dataframe tools report.

use polars::prelude::*;

const VALUE_COLUMN: &str = "value";

/// Evaluate a scalar aggregation of [`observed`] over `values`.
///
/// `None` for empty input, a null result or a non-finite result.
pub(crate) fn aggregate(values: &[f64], expr: Expr) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let frame = df!(VALUE_COLUMN => values).ok()?;
    let out = frame
        .lazy()
        .select([expr.alias(VALUE_COLUMN)])
        .collect()
        .ok()?;
    let result = out.column(VALUE_COLUMN).ok()?.f64().ok()?.get(0)?;
    result.is_finite().then_some(result)
}

/// The column [`aggregate`] evaluates against.
pub(crate) fn observed() -> Expr {
    col(VALUE_COLUMN)
}

/// Arithmetic mean, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    aggregate(values, observed().mean())
}

/// Population standard deviation (ddof = 0), `None` when empty.
pub fn population_std(values: &[f64]) -> Option<f64> {
    match values {
        [] => None,
        [_] => Some(0.0),
        _ => aggregate(values, observed().std(0)),
    }
}

/// Adjusted Fisher-Pearson sample skewness.
///
/// `None` with fewer than 3 observations or zero variance.
pub fn skewness(values: &[f64]) -> Option<f64> {
    if values.len() < 3 || population_std(values)? == 0.0 {
        return None;
    }
    aggregate(values, observed().skew(false))
}

/// Bias-adjusted sample excess kurtosis.
///
/// `None` with fewer than 4 observations or zero variance.
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    if values.len() < 4 || population_std(values)? == 0.0 {
        return None;
    }
    aggregate(values, observed().kurtosis(true, false))
}

/// Quantile with linear interpolation between the closest order statistics.
pub(crate) fn linear_quantile(values: &[f64], q: f64) -> Option<f64> {
    aggregate(values, observed().quantile(lit(q), QuantileMethod::Linear))
}
