//! Error types for the prediction pipeline.

use crate::types::Stage;
use thiserror::Error;

/// Top-level pipeline error.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Feature engineering error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Training error: {0}")]
    Train(#[from] TrainError),

    #[error("Backtest error: {0}")]
    Backtest(#[from] BacktestError),

    #[error("Prerequisite not met: stage must be at least {expected}, currently {actual}")]
    PrerequisiteNotMet { expected: Stage, actual: Stage },

    #[error("Stage conflict: {running} is currently running")]
    StageConflict { running: Stage },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download-stage errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data available: {0}")]
    Unavailable(String),

    #[error("Fetch timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Timestamps out of order at index {index}")]
    OutOfOrder { index: usize },

    #[error("Gap of {gap_millis}ms at index {index} exceeds {max_millis}ms")]
    Gap {
        index: usize,
        gap_millis: i64,
        max_millis: i64,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Feature-engineering errors.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),

    #[error("Insufficient history: need {required} train samples, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Non-finite value in column {column} at row {row}")]
    NonFiniteValue { column: String, row: usize },
}

/// Training-stage errors.
#[derive(Error, Debug)]
pub enum TrainError {
    /// Terminal for the stage: every adapter failed to fit.
    #[error("All models failed to train")]
    AllModelsFailed,

    /// Per-adapter failure, recorded in the outcome mapping and never
    /// propagated past the orchestrator.
    #[error("Model training failed: {0}")]
    Model(String),
}

/// Backtest-stage errors.
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Test partition is empty")]
    NoTestData,

    #[error("No trained models available")]
    NoTrainedModels,
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::PrerequisiteNotMet {
            expected: Stage::DataReady,
            actual: Stage::Empty,
        };
        let msg = err.to_string();
        assert!(msg.contains("data_ready"));
        assert!(msg.contains("empty"));
    }

    #[test]
    fn test_data_error_conversion() {
        let err: PipelineError = DataError::Unavailable("empty response".to_string()).into();
        assert!(matches!(err, PipelineError::Data(_)));
    }
}
