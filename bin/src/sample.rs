//! Seeded synthetic market data for offline runs.
//!
//! Factor proxies and a market series are drawn first; each asset loads on
//! the market and on the oil factor with its own idiosyncratic noise, so the
//! regression and beta sections have something to find.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use fd_risk::{PriceMatrix, Result, TimeSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Benchmark symbol.
pub(crate) const BENCHMARK: &str = "SPY";

/// Factor proxy names with their daily volatility.
pub(crate) const FACTORS: [(&str, f64); 4] = [
    ("OIL", 0.020),
    ("RATES", 0.005),
    ("USD", 0.004),
    ("XLE", 0.015),
];

const MARKET_DRIFT: f64 = 0.08 / 252.0;
const MARKET_VOL: f64 = 0.15 / 15.874_507_866_387_544;
const ASSET_NOISE: f64 = 0.008;

/// Prices for the basket, the benchmark and the factor proxies.
#[derive(Debug)]
pub(crate) struct SampleMarket {
    pub(crate) prices: PriceMatrix,
    pub(crate) benchmark: TimeSeries,
    pub(crate) factors: PriceMatrix,
}

/// Generate `days` business days of prices for `symbols`.
pub(crate) fn generate(symbols: &[String], days: usize, seed: u64) -> Result<SampleMarket> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dates = business_days(start_date(), days);

    let market: Vec<f64> = (0..days)
        .map(|_| MARKET_DRIFT + MARKET_VOL * normal(&mut rng))
        .collect();
    let factor_returns: Vec<Vec<f64>> = FACTORS
        .iter()
        .map(|(_, vol)| (0..days).map(|_| vol * normal(&mut rng)).collect())
        .collect();
    let oil = &factor_returns[0];

    let columns = symbols
        .iter()
        .enumerate()
        .map(|(i, symbol)| {
            let market_loading = 0.6 + 0.2 * i as f64;
            let oil_loading = 0.15 * i as f64;
            let returns: Vec<f64> = (0..days)
                .map(|t| {
                    market_loading * market[t] + oil_loading * oil[t] + ASSET_NOISE * normal(&mut rng)
                })
                .collect();
            (symbol.clone(), price_path(&returns))
        })
        .collect();

    let factor_columns = FACTORS
        .iter()
        .zip(&factor_returns)
        .map(|((name, _), returns)| ((*name).to_string(), price_path(returns)))
        .collect();

    let benchmark_prices = price_path(&market).into_iter().flatten().collect();

    Ok(SampleMarket {
        prices: PriceMatrix::from_columns(dates.clone(), columns)?,
        benchmark: TimeSeries::new(BENCHMARK, dates.clone(), benchmark_prices)?,
        factors: PriceMatrix::from_columns(dates, factor_columns)?,
    })
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap_or_default()
}

fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    std::iter::successors(Some(start), |d| d.checked_add_days(Days::new(1)))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

fn price_path(returns: &[f64]) -> Vec<Option<f64>> {
    let mut price = 100.0;
    returns
        .iter()
        .map(|r| {
            price *= 1.0 + r;
            Some(price)
        })
        .collect()
}

/// Standard normal draw (Box-Muller).
fn normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.r#gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
