//! Core data types for the prediction pipeline.

mod bar;
mod dataset;
mod features;
mod interval;
mod signal;
mod stage;

pub use bar::Bar;
pub use dataset::MarketDataset;
pub use features::FeatureMatrix;
pub use interval::Interval;
pub use signal::TradeSignal;
pub use stage::Stage;
