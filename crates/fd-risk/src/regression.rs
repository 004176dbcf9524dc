//! Multi-factor OLS regression of portfolio returns.
//!
//! `y = Xβ + e` with an intercept column prepended to the factor returns,
//! solved through the normal equations:
//!
//! - `β = (XᵀX)⁻¹Xᵀy`
//! - `σ² = Σe² / (n - k)`
//! - `se = √diag(σ²(XᵀX)⁻¹)`, `t = β / se`
//! - `R² = 1 - Σe² / Σ(y - ȳ)²`

use crate::frame::{self, DATE_COLUMN};
use crate::{Result, ReturnMatrix, RiskError, TimeSeries};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Name of the intercept term.
pub const INTERCEPT: &str = "const";

/// Relative pivot size below which `XᵀX` is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

const RESPONSE_COLUMN: &str = "__response__";

/// Estimate and inference for one regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTerm {
    /// Factor name, or [`INTERCEPT`]
    pub name: String,
    /// Estimated coefficient
    pub coefficient: f64,
    /// Standard error of the coefficient
    pub std_error: f64,
    /// t-statistic; `None` when the standard error is zero
    pub t_stat: Option<f64>,
}

/// Fitted factor regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Intercept first, then factors in column order
    pub terms: Vec<RegressionTerm>,
    /// Coefficient of determination; `None` when `y` has no variance
    pub r_squared: Option<f64>,
    /// Residual variance `σ²`
    pub residual_variance: f64,
    /// Residual degrees of freedom `n - k`
    pub df_resid: usize,
    /// Number of overlapping observations used
    pub observations: usize,
}

impl RegressionResult {
    /// Intercept estimate.
    pub fn intercept(&self) -> f64 {
        self.coefficient(INTERCEPT).unwrap_or(0.0)
    }

    /// Term for `name`.
    pub fn term(&self, name: &str) -> Option<&RegressionTerm> {
        self.terms.iter().find(|t| t.name == name)
    }

    /// Coefficient for `name`.
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.term(name).map(|t| t.coefficient)
    }

    /// Factor terms, excluding the intercept.
    pub fn factors(&self) -> impl Iterator<Item = &RegressionTerm> + '_ {
        self.terms.iter().filter(|t| t.name != INTERCEPT)
    }
}

/// Regress `portfolio` on the columns of `factors`.
///
/// Only dates present in both with every value observed are used.
///
/// # Errors
///
/// - [`RiskError::NoOverlap`] when no such date exists
/// - [`RiskError::InsufficientDegreesOfFreedom`] when observations do not
///   exceed regressors (factors plus intercept)
/// - [`RiskError::SingularMatrix`] when the regressors are collinear
pub fn factor_regression(portfolio: &TimeSeries, factors: &ReturnMatrix) -> Result<RegressionResult> {
    let names = factors.symbols();
    let (y, x) = design(portfolio, factors, &names)?;
    let (n, k) = x.dim();

    debug!(observations = n, regressors = k, "fitting factor regression");

    if n == 0 {
        return Err(RiskError::NoOverlap);
    }
    if n <= k {
        return Err(RiskError::InsufficientDegreesOfFreedom {
            observations: n,
            regressors: k,
        });
    }

    let xtx_inv = invert(&x.t().dot(&x))?;
    let beta = xtx_inv.dot(&x.t().dot(&y));
    let resid = &y - &x.dot(&beta);

    let rss = resid.dot(&resid);
    let y_mean = y.mean().unwrap_or(0.0);
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = (tss > 0.0).then(|| 1.0 - rss / tss);

    let df_resid = n - k;
    let sigma2 = rss / df_resid as f64;

    let terms = std::iter::once(INTERCEPT.to_string())
        .chain(names)
        .zip(beta.iter())
        .zip(xtx_inv.diag().iter())
        .map(|((name, &coefficient), &v)| {
            let std_error = (sigma2 * v).max(0.0).sqrt();
            let t = coefficient / std_error;
            RegressionTerm {
                name,
                coefficient,
                std_error,
                t_stat: t.is_finite().then_some(t),
            }
        })
        .collect();

    Ok(RegressionResult {
        terms,
        r_squared,
        residual_variance: sigma2,
        df_resid,
        observations: n,
    })
}

/// Inner-join on date and keep fully observed rows, in date order.
fn design(
    portfolio: &TimeSeries,
    factors: &ReturnMatrix,
    names: &[String],
) -> Result<(Array1<f64>, Array2<f64>)> {
    if names.iter().any(|n| n == RESPONSE_COLUMN) {
        return Err(RiskError::InvalidInput(format!(
            "factor may not be named '{RESPONSE_COLUMN}'"
        )));
    }

    let response: Vec<Option<f64>> = portfolio
        .values()
        .iter()
        .map(|v| v.is_finite().then_some(*v))
        .collect();
    let left = frame::build_frame(
        portfolio.dates(),
        &[(RESPONSE_COLUMN.to_string(), response)],
    )?;

    let joined = left
        .lazy()
        .join(
            factors.frame().clone().lazy(),
            [col(DATE_COLUMN)],
            [col(DATE_COLUMN)],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;

    let dates = frame::dates(&joined)?;
    let y = frame::column_values(&joined, RESPONSE_COLUMN)?;
    let columns = names
        .iter()
        .map(|name| frame::column_values(&joined, name))
        .collect::<Result<Vec<_>>>()?;

    let mut rows: Vec<usize> = (0..dates.len())
        .filter(|&i| {
            y[i].is_some_and(f64::is_finite)
                && columns.iter().all(|c| c[i].is_some_and(f64::is_finite))
        })
        .collect();
    rows.sort_by_key(|&i| dates[i]);

    let k = names.len() + 1;
    let mut x = Array2::<f64>::ones((rows.len(), k));
    for (r, &i) in rows.iter().enumerate() {
        for (j, column) in columns.iter().enumerate() {
            x[[r, j + 1]] = column[i].unwrap_or(0.0);
        }
    }
    let y = rows.iter().map(|&i| y[i].unwrap_or(0.0)).collect();

    Ok((y, x))
}

/// Gauss-Jordan inverse with partial pivoting.
fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let n = matrix.nrows();
    let scale = matrix
        .diag()
        .iter()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(f64::MIN_POSITIVE);

    let mut a = matrix.clone();
    let mut inv = Array2::<f64>::eye(n);

    for c in 0..n {
        let pivot = (c..n)
            .max_by(|&i, &j| a[[i, c]].abs().total_cmp(&a[[j, c]].abs()))
            .unwrap_or(c);
        if a[[pivot, c]].abs() <= PIVOT_TOLERANCE * scale {
            return Err(RiskError::SingularMatrix);
        }
        if pivot != c {
            swap_rows(&mut a, pivot, c);
            swap_rows(&mut inv, pivot, c);
        }

        let p = a[[c, c]];
        a.row_mut(c).mapv_inplace(|v| v / p);
        inv.row_mut(c).mapv_inplace(|v| v / p);

        for r in (0..n).filter(|&r| r != c) {
            let factor = a[[r, c]];
            if factor == 0.0 {
                continue;
            }
            let a_c = a.row(c).to_owned();
            let inv_c = inv.row(c).to_owned();
            a.row_mut(r).scaled_add(-factor, &a_c);
            inv.row_mut(r).scaled_add(-factor, &inv_c);
        }
    }

    Ok(inv)
}

fn swap_rows(m: &mut Array2<f64>, i: usize, j: usize) {
    let row_i = m.index_axis(Axis(0), i).to_owned();
    let row_j = m.index_axis(Axis(0), j).to_owned();
    m.index_axis_mut(Axis(0), i).assign(&row_j);
    m.index_axis_mut(Axis(0), j).assign(&row_i);
}
