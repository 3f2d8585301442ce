//! Model adapters and the training orchestrator.
//!
//! Three families sit behind the [`predict_core::ModelAdapter`] interface: a
//! bootstrapped tree ensemble, gradient-boosted stumps, and a recurrent
//! sequence model. The orchestrator fits them over shared train data, in
//! parallel or sequentially, and isolates per-model failures.

pub mod boosted;
pub mod forest;
pub mod orchestrator;
pub mod scaler;
pub mod sequence;
pub mod tree;

use predict_core::ModelAdapter;
use serde::{Deserialize, Serialize};

pub use boosted::{BoostedConfig, GradientBoosted};
pub use forest::{ForestConfig, TreeEnsemble};
pub use orchestrator::{TrainedModels, TrainingOrchestrator};
pub use scaler::StandardScaler;
pub use sequence::{SequenceConfig, SequenceModel};

/// Settings for all three model families plus the orchestrator mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Fit adapters concurrently when true.
    pub parallel: bool,
    pub forest: ForestConfig,
    pub boosted: BoostedConfig,
    pub sequence: SequenceConfig,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            forest: ForestConfig::default(),
            boosted: BoostedConfig::default(),
            sequence: SequenceConfig::default(),
        }
    }
}

/// Fresh, unfitted adapters for every configured family.
pub fn default_adapters(config: &ModelsConfig) -> Vec<Box<dyn ModelAdapter>> {
    vec![
        Box::new(TreeEnsemble::new(config.forest.clone())),
        Box::new(GradientBoosted::new(config.boosted.clone())),
        Box::new(SequenceModel::new(config.sequence.clone())),
    ]
}
