//! Full pipeline scenarios: prices to portfolio returns to report.

use approx::assert_relative_eq;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use fd_risk::forecast::ForecasterKind;
use fd_risk::metrics::VarMethod;
use fd_risk::{
    Analysis, AnalysisConfig, PortfolioAllocator, PriceMatrix, RebalancePolicy, RegressionOutcome,
    ReturnMethod, TimeSeries, Weights, to_returns,
};

const SYMBOLS: [&str; 3] = ["AAA", "BBB", "CCC"];

fn business_days(count: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    std::iter::successors(Some(start), |d| d.checked_add_days(Days::new(1)))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

/// Deterministic price paths with distinct drift and oscillation per symbol.
fn price_matrix(rows: usize) -> PriceMatrix {
    let columns = SYMBOLS
        .iter()
        .enumerate()
        .map(|(k, symbol)| {
            let mut price = 50.0 + 25.0 * k as f64;
            let prices = (0..rows)
                .map(|t| {
                    let r = 0.0003 * (k as f64 + 1.0)
                        + 0.012 * ((t as f64) * (0.31 + 0.17 * k as f64)).sin();
                    price *= 1.0 + r;
                    Some(price)
                })
                .collect();
            (symbol.to_string(), prices)
        })
        .collect();
    PriceMatrix::from_columns(business_days(rows), columns).unwrap()
}

#[test]
fn monthly_equal_weight_portfolio() {
    let prices = price_matrix(252);
    let returns = to_returns(&prices, ReturnMethod::Log).unwrap();
    assert_eq!(returns.height(), 251);

    let allocator = PortfolioAllocator::new(Weights::equal(SYMBOLS), RebalancePolicy::Monthly);
    let portfolio = allocator.allocate(&returns).unwrap();
    assert_eq!(portfolio.len(), 251);

    let mut months = Vec::new();
    for (date, value) in portfolio.iter() {
        let month = (date.year(), date.month());
        match months.last() {
            Some(&(m, v)) if m == month => assert_eq!(v, *value, "changed within {month:?}"),
            _ => months.push((month, *value)),
        }
    }
    assert_eq!(months.len(), 12);
    assert!(months.windows(2).all(|w| w[0].1 != w[1].1));

    let periods = allocator.period_returns(&returns).unwrap();
    assert_eq!(periods.len(), 12);
    for ((_, daily), period) in months.iter().zip(periods.values()) {
        assert_relative_eq!(*daily, *period);
    }
}

#[test]
fn buy_and_hold_tracks_weighted_wealth() {
    let prices = price_matrix(120);
    let returns = to_returns(&prices, ReturnMethod::Simple).unwrap();
    let weights = Weights::new([("AAA", 0.2), ("BBB", 0.3), ("CCC", 0.5)]);
    let portfolio = PortfolioAllocator::new(weights.clone(), RebalancePolicy::None)
        .allocate(&returns)
        .unwrap();

    // Terminal wealth of a never-rebalanced basket is the weighted sum of
    // each symbol's own price relative.
    let expected: f64 = SYMBOLS
        .iter()
        .map(|s| {
            let column = prices.column(s).unwrap();
            let first = column[0].unwrap();
            let last = column[column.len() - 1].unwrap();
            weights.get(s).unwrap() * last / first
        })
        .sum();
    let wealth = portfolio.cumulative_wealth();
    assert_relative_eq!(
        *wealth.values().last().unwrap(),
        expected,
        max_relative = 1e-10
    );
}

#[test]
fn full_analysis_report() {
    let rows = 252;
    let prices = price_matrix(rows);
    let dates = business_days(rows);

    let benchmark_prices: Vec<f64> = (0..rows)
        .scan(100.0, |p, t| {
            *p *= 1.0 + 0.0002 + 0.01 * ((t as f64) * 0.31).sin();
            Some(*p)
        })
        .collect();
    let benchmark = TimeSeries::new("SPY", dates.clone(), benchmark_prices).unwrap();

    let factor = |freq: f64, scale: f64| -> Vec<Option<f64>> {
        (0..rows)
            .scan(10.0, |p, t| {
                *p *= 1.0 + scale * ((t as f64) * freq).cos();
                Some(Some(*p))
            })
            .collect()
    };
    let factors = PriceMatrix::from_columns(
        dates,
        vec![
            ("OIL".to_string(), factor(0.29, 0.02)),
            ("RATES".to_string(), factor(0.53, 0.005)),
        ],
    )
    .unwrap();

    let config = AnalysisConfig {
        weights: Weights::equal(SYMBOLS),
        confidence: 0.99,
        forecaster: ForecasterKind::Disabled,
        ..Default::default()
    };
    let report = Analysis::new(config)
        .run(&prices, Some(&benchmark), Some(&factors))
        .unwrap();

    assert_eq!(report.symbols, SYMBOLS);
    assert_eq!(report.portfolio.len(), 251);
    assert_eq!(report.wealth.len(), 251);
    assert!(report.drawdown.values().iter().all(|d| *d <= 0.0));
    assert!(report.risk.iter().all(|r| r.confidence == 0.99));

    let var = report.risk_estimate(VarMethod::Historical).unwrap().value.unwrap();
    let cvar = report.risk_estimate(VarMethod::HistoricalCvar).unwrap().value.unwrap();
    assert!(cvar <= var);

    let beta = report.rolling_beta.as_ref().unwrap();
    assert_eq!(beta.dropna().len(), 251 - 62);

    match report.regression.as_ref().unwrap() {
        RegressionOutcome::Fitted { result, .. } => {
            assert_eq!(result.observations, 251);
            assert_eq!(result.df_resid, 248);
        }
        RegressionOutcome::Failed { error } => panic!("regression failed: {error}"),
    }
    assert!(!report.forecast.is_available());

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"status\":\"fitted\""));
}

#[test]
fn empty_prices_are_not_an_error() {
    let prices = PriceMatrix::from_columns(Vec::new(), Vec::new()).unwrap();
    let report = Analysis::default().run(&prices, None, None).unwrap();
    assert!(report.portfolio.is_empty());
    assert!(report.performance.annual_return.is_none());
}
