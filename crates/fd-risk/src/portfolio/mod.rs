//! Portfolio construction from constituent returns.
//!
//! A weight vector and a rebalance policy turn a return matrix into a single
//! daily portfolio return series, the input to every downstream metric.

pub mod allocation;
pub mod rebalance;
pub mod weights;

pub use allocation::{PORTFOLIO_NAME, PortfolioAllocator, allocate};
pub use rebalance::{CalendarPeriod, RebalancePolicy};
pub use weights::Weights;
