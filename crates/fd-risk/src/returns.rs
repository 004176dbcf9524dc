//! Price to return transform.
//!
//! Log returns: `r_t = ln(p_t / p_{t-1})`
//! Simple returns: `r_t = p_t / p_{t-1} - 1`
//!
//! The first row has no prior price and is dropped. Rows where no symbol has
//! two consecutive prices are dropped as well; partial rows keep their nulls.

use crate::{PriceMatrix, Result, ReturnMatrix, frame::DATE_COLUMN};
use derive_more::Display;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Return definition applied to consecutive prices.
#[derive(
    Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMethod {
    /// Logarithmic return
    #[default]
    #[display("log")]
    Log,
    /// Simple (arithmetic) return
    #[display("simple")]
    Simple,
}

/// Convert a price matrix into a return matrix.
///
/// Empty input yields an empty matrix rather than an error.
pub fn to_returns(prices: &PriceMatrix, method: ReturnMethod) -> Result<ReturnMatrix> {
    let symbols = prices.symbols();
    let Some(observed) = symbols
        .iter()
        .map(|s| col(s.as_str()).is_not_null().cast(DataType::UInt32))
        .reduce(|acc, e| acc + e)
    else {
        return ReturnMatrix::empty();
    };
    if prices.height() < 2 {
        return ReturnMatrix::empty();
    }

    let mut exprs = Vec::with_capacity(symbols.len() + 1);
    exprs.push(col(DATE_COLUMN));
    for symbol in &symbols {
        let ratio = col(symbol.as_str()) / col(symbol.as_str()).shift(lit(1));
        let ret = match method {
            ReturnMethod::Log => ratio.log(std::f64::consts::E),
            ReturnMethod::Simple => ratio - lit(1.0),
        };
        exprs.push(ret.alias(symbol.as_str()));
    }

    let frame = prices
        .frame()
        .clone()
        .lazy()
        .select(exprs)
        .slice(1, IdxSize::MAX)
        .filter(observed.gt(lit(0)))
        .collect()?;

    // Re-ingest so non-finite ratios become nulls like any other gap.
    ReturnMatrix::from_frame(&frame)
}
