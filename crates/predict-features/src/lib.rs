//! Feature engineering for the prediction pipeline.
//!
//! Turns a validated [`predict_core::MarketDataset`] into a labeled
//! [`predict_core::FeatureMatrix`]: indicator columns computed over the full
//! series, binary next-period direction labels, warmup rows dropped from the
//! head of the train partition, and the unlabeled final bar removed.

pub mod engineer;
pub mod indicators;

pub use engineer::{FeatureConfig, FeatureEngineer, FeatureSummary};
