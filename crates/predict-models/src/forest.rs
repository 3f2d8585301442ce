//! Random-forest adapter: bootstrapped CART trees with vote-ratio confidence.

use predict_core::{ModelAdapter, TrainError};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tree::{DecisionTree, TreeConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features per split. `None` defaults to sqrt of the feature count.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 6,
            min_samples_split: 10,
            min_samples_leaf: 5,
            max_features: None,
            seed: 42,
        }
    }
}

/// Ensemble of decision trees trained on bootstrap samples.
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
        }
    }

    /// Fraction of trees voting for the positive class.
    fn vote_ratio(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let votes = self
            .trees
            .iter()
            .filter(|t| t.predict_proba_one(features) > 0.5)
            .count();
        votes as f64 / self.trees.len() as f64
    }
}

fn bootstrap_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

impl ModelAdapter for TreeEnsemble {
    fn name(&self) -> &str {
        "tree_ensemble"
    }

    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), TrainError> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(TrainError::Model(format!(
                "tree_ensemble: {} rows and {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let n_features = rows[0].len();
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize);

        self.trees = (0..self.config.n_trees)
            .into_par_iter()
            .map(|i| {
                let tree_config = TreeConfig {
                    max_depth: self.config.max_depth,
                    min_samples_split: self.config.min_samples_split,
                    min_samples_leaf: self.config.min_samples_leaf,
                    max_features: Some(max_features),
                    seed: self.config.seed.wrapping_add(i as u64),
                };

                let sample = bootstrap_indices(rows.len(), self.config.seed.wrapping_add(i as u64));
                let sample_rows: Vec<Vec<f64>> = sample.iter().map(|&j| rows[j].clone()).collect();
                let sample_labels: Vec<bool> = sample.iter().map(|&j| labels[j]).collect();

                let mut tree = DecisionTree::new(tree_config);
                tree.fit(&sample_rows, &sample_labels);
                tree
            })
            .collect();

        debug!(trees = self.trees.len(), "fitted tree ensemble");
        Ok(())
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<bool> {
        rows.iter().map(|r| self.vote_ratio(r) >= 0.5).collect()
    }

    fn predict_confidence(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.vote_ratio(r)).collect()
    }
}
