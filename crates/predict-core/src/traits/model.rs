//! Model adapter trait definition.

use crate::error::TrainError;
use serde::{Deserialize, Serialize};

/// Capability interface for one trainable model family.
///
/// Each family (tree ensemble, gradient boosting, sequence model) is a
/// self-contained variant behind this interface: batch `fit` on the
/// training rows, then per-row `predict` / `predict_confidence` on
/// unseen rows. Input reshaping (feature scaling, sequence windowing)
/// is the adapter's own concern and invisible to callers.
///
/// `fit` must be deterministic for a fixed configured seed, and must
/// return `Err` rather than panic on any failure it can detect.
pub trait ModelAdapter: Send + Sync {
    /// Get the unique model name used as the key in result mappings.
    fn name(&self) -> &str;

    /// Train on feature rows and their direction labels.
    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), TrainError>;

    /// Predict one direction label per input row, aligned by index.
    fn predict(&self, rows: &[Vec<f64>]) -> Vec<bool>;

    /// Calibrated probability-like score in `[0, 1]` per input row,
    /// used for threshold-based signal generation.
    fn predict_confidence(&self, rows: &[Vec<f64>]) -> Vec<f64>;
}

/// Result of one adapter's `fit`, recorded in the training-stage
/// outcome mapping whether the fit succeeded or failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitOutcome {
    pub model_name: String,
    pub success: bool,
    /// Wall-clock training time in seconds.
    pub training_secs: f64,
    pub error: Option<String>,
}

impl FitOutcome {
    /// Record a successful fit.
    pub fn success(model_name: impl Into<String>, training_secs: f64) -> Self {
        Self {
            model_name: model_name.into(),
            success: true,
            training_secs,
            error: None,
        }
    }

    /// Record a failed fit.
    pub fn failure(
        model_name: impl Into<String>,
        training_secs: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            success: false,
            training_secs,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_records() {
        let ok = FitOutcome::success("forest", 1.25);
        assert!(ok.success);
        assert!(ok.error.is_none());

        let bad = FitOutcome::failure("lstm", 0.5, "no samples");
        assert!(!bad.success);
        assert_eq!(bad.error.as_deref(), Some("no samples"));
    }
}
