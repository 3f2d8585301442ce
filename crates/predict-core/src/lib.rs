//! Core types and traits for the prediction pipeline.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, MarketDataset)
//! - Feature matrix and trade signal types
//! - Pipeline stage tracking
//! - Core traits for data sources and model adapters

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    BacktestError, DataError, FeatureError, PipelineError, PipelineResult, TrainError,
};
pub use traits::*;
pub use types::*;
