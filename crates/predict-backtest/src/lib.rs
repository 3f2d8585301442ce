//! Backtesting for classifier-driven long-or-flat strategies.
//!
//! Converts each trained model's predictions over the held-out test partition
//! into trading metrics: accuracy and confusion counts, annualized Sharpe,
//! compounded total return, max drawdown from the equity peak, and win rate
//! over long periods. Equity compounds in `Decimal`; ratios stay in `f64`.

pub mod engine;
pub mod metrics;
pub mod report;

pub use engine::{BacktestConfig, BacktestEngine};
pub use metrics::{ConfusionMatrix, ModelBacktest};
pub use report::BacktestReport;
