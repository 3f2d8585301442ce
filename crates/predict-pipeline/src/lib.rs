//! Stage orchestration: the pipeline state machine over download, feature
//! engineering, training and backtest.

pub mod logging;
pub mod pipeline;

pub use pipeline::{Pipeline, PipelineConfig, PipelineStatus};
