//! Core traits for the prediction pipeline.

mod data_source;
mod model;

pub use data_source::DataSource;
pub use model::{FitOutcome, ModelAdapter};
