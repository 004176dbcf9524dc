//! CLI for the fd-risk portfolio analytics engine.
//!
//! `demo` runs the full analysis on seeded synthetic prices; `quantile`
//! evaluates the inverse standard normal CDF.

mod sample;

use clap::{Parser, Subcommand};
use fd_risk::analysis::StressProjection;
use fd_risk::forecast::VolatilityForecast;
use fd_risk::{
    Analysis, AnalysisConfig, AnalysisReport, RebalancePolicy, RegressionOutcome, RiskError,
    StressScenario, Weights, inverse_normal_cdf,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fd-risk")]
#[command(about = "Portfolio risk and performance analytics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis on synthetic sample prices
    Demo {
        /// JSON analysis configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Basket symbols, used when the configuration carries no weights
        #[arg(long, value_delimiter = ',', default_value = "SPY,XLE,CVX")]
        symbols: Vec<String>,
        /// Number of business days to simulate
        #[arg(long, default_value_t = 504)]
        days: usize,
        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the standard normal quantile for a probability
    Quantile {
        /// Probability in (0, 1)
        p: f64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Demo {
            config,
            symbols,
            days,
            seed,
            json,
        } => demo(config.as_deref(), &symbols, days, seed, json),
        Commands::Quantile { p } => {
            println!("{}", number(Some(inverse_normal_cdf(p))));
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Load the configuration, run the analysis on sample data and print it.
fn demo(
    config_path: Option<&Path>,
    symbols: &[String],
    days: usize,
    seed: u64,
    json: bool,
) -> fd_risk::Result<()> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => default_config(symbols),
    };
    let report = run_demo(config, symbols, days, seed)?;

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| RiskError::Computation(e.to_string()))?;
        println!("{text}");
    } else {
        print_report(&report);
    }
    Ok(())
}

fn load_config(path: &Path) -> fd_risk::Result<AnalysisConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RiskError::InvalidInput(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| RiskError::InvalidInput(format!("{}: {e}", path.display())))
}

/// Original dashboard defaults: half in the first symbol, the rest split
/// evenly, monthly rebalancing and an oil-led shock scenario.
fn default_config(symbols: &[String]) -> AnalysisConfig {
    let rest = symbols.len().saturating_sub(1).max(1) as f64;
    let weights = symbols
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), if i == 0 { 0.5 } else { 0.5 / rest }))
        .collect::<Weights>();

    AnalysisConfig {
        weights,
        rebalance: RebalancePolicy::Monthly,
        ..Default::default()
    }
}

fn default_scenario() -> StressScenario {
    StressScenario::new(
        "oil shock",
        [("OIL", -0.10), ("RATES", 0.02), ("USD", 0.02), ("XLE", -0.05)],
    )
}

fn run_demo(
    mut config: AnalysisConfig,
    symbols: &[String],
    days: usize,
    seed: u64,
) -> fd_risk::Result<AnalysisReport> {
    if config.scenarios.is_empty() {
        config.scenarios.push(default_scenario());
    }
    let universe: Vec<String> = if config.weights.is_empty() {
        symbols.to_vec()
    } else {
        config.weights.symbols().map(str::to_string).collect()
    };

    let market = sample::generate(&universe, days, seed)?;
    Analysis::new(config).run(&market.prices, Some(&market.benchmark), Some(&market.factors))
}

fn print_report(report: &AnalysisReport) {
    println!(
        "Portfolio: {} ({} observations)",
        report.symbols.join(", "),
        report.portfolio.len()
    );

    let perf = &report.performance;
    println!("\nPerformance");
    println!("  {:<16}{:>12}", "Ann. Return", percent(perf.annual_return));
    println!("  {:<16}{:>12}", "Ann. Vol", percent(perf.annual_vol));
    println!("  {:<16}{:>12}", "Sharpe", number(perf.sharpe));
    println!("  {:<16}{:>12}", "Sortino", number(perf.sortino));
    println!("  {:<16}{:>12}", "Hit Rate", percent(perf.hit_rate));
    println!("  {:<16}{:>12}", "Max Drawdown", percent(perf.max_drawdown));

    println!("\nRisk");
    for estimate in &report.risk {
        println!(
            "  {:<26} @ {:>4.0}%  {:>10}",
            estimate.method.to_string(),
            estimate.confidence * 100.0,
            percent(estimate.value)
        );
    }

    if let Some(beta) = &report.rolling_beta {
        let latest = beta.values().iter().rev().find_map(|b| *b);
        println!("\nRolling beta (latest): {}", number(latest));
    }

    match &report.regression {
        Some(RegressionOutcome::Fitted { result, stress }) => {
            println!(
                "\nFactor regression (R² {}, {} dof)",
                number(result.r_squared),
                result.df_resid
            );
            println!("  {:<8}{:>12}{:>12}{:>10}", "term", "coef", "stderr", "t");
            for term in &result.terms {
                println!(
                    "  {:<8}{:>12.6}{:>12.6}{:>10}",
                    term.name,
                    term.coefficient,
                    term.std_error,
                    number(term.t_stat)
                );
            }
            print_stress(stress);
        }
        Some(RegressionOutcome::Failed { error }) => {
            println!("\nFactor regression unavailable: {error}");
        }
        None => {}
    }

    match &report.forecast {
        VolatilityForecast::Available { model, path } => {
            println!("\nVolatility forecast ({model}, {} days)", path.len());
            for (day, vol) in path.iter().enumerate() {
                println!("  day {:>3}  {:>10}", day + 1, percent(Some(*vol)));
            }
        }
        VolatilityForecast::Unavailable { reason } => {
            println!("\nVolatility forecast unavailable: {reason}");
        }
    }
}

fn print_stress(stress: &[StressProjection]) {
    if stress.is_empty() {
        return;
    }
    println!("\nStress scenarios");
    for projection in stress {
        println!(
            "  {:<20}{:>10}",
            projection.scenario,
            percent(Some(projection.portfolio_return))
        );
    }
}

fn percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.2}%", v * 100.0),
        None => "N/A".to_string(),
    }
}

fn number(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{v:.6}"),
        None => "N/A".to_string(),
    }
}
