//! Pipeline stage tracking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline progress marker.
///
/// Stages advance monotonically on success; a failed stage leaves the
/// marker unchanged. Re-running an earlier stage moves the marker back
/// and invalidates all downstream artifacts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Empty,
    DataReady,
    FeaturesReady,
    ModelsReady,
    BacktestReady,
}

impl Stage {
    /// The stage that must be reached before this one may run.
    pub fn prerequisite(&self) -> Option<Stage> {
        match self {
            Stage::Empty => None,
            Stage::DataReady => None,
            Stage::FeaturesReady => Some(Stage::DataReady),
            Stage::ModelsReady => Some(Stage::FeaturesReady),
            Stage::BacktestReady => Some(Stage::ModelsReady),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Empty => "empty",
            Stage::DataReady => "data_ready",
            Stage::FeaturesReady => "features_ready",
            Stage::ModelsReady => "models_ready",
            Stage::BacktestReady => "backtest_ready",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Empty < Stage::DataReady);
        assert!(Stage::DataReady < Stage::FeaturesReady);
        assert!(Stage::FeaturesReady < Stage::ModelsReady);
        assert!(Stage::ModelsReady < Stage::BacktestReady);
    }

    #[test]
    fn test_prerequisites() {
        assert_eq!(Stage::DataReady.prerequisite(), None);
        assert_eq!(Stage::BacktestReady.prerequisite(), Some(Stage::ModelsReady));
    }
}
