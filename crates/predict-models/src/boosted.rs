//! Gradient-boosted stumps fit to probability residuals.

use predict_core::{ModelAdapter, TrainError};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostedConfig {
    /// Boosting rounds, one stump each.
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub min_samples_leaf: usize,
}

impl Default for BoostedConfig {
    fn default() -> Self {
        Self {
            n_rounds: 60,
            learning_rate: 0.1,
            min_samples_leaf: 5,
        }
    }
}

/// Depth-one regression tree: one feature, one threshold, two leaf values.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature_idx: usize,
    threshold: f64,
    left_value: f64,
    right_value: f64,
}

impl Stump {
    fn predict_one(&self, features: &[f64]) -> f64 {
        if features[self.feature_idx] <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Boosted ensemble predicting the positive-class probability directly.
///
/// The score starts at the train base rate and each round adds a shrunken
/// stump fit to the current residuals, squared-error style. The final score
/// is clamped to `[0, 1]` so it reads as a probability.
#[derive(Debug, Clone)]
pub struct GradientBoosted {
    config: BoostedConfig,
    base_score: f64,
    stumps: Vec<Stump>,
}

impl GradientBoosted {
    pub fn new(config: BoostedConfig) -> Self {
        Self {
            config,
            base_score: 0.5,
            stumps: Vec::new(),
        }
    }

    fn score_one(&self, features: &[f64]) -> f64 {
        let raw = self.base_score
            + self
                .stumps
                .iter()
                .map(|s| self.config.learning_rate * s.predict_one(features))
                .sum::<f64>();
        raw.clamp(0.0, 1.0)
    }

    /// Best single split on the residuals, or `None` if nothing reduces error.
    fn fit_stump(&self, rows: &[Vec<f64>], residuals: &[f64]) -> Option<Stump> {
        let n_features = rows[0].len();
        let total: f64 = residuals.iter().sum();
        let n = residuals.len() as f64;
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<(f64, Stump)> = None;

        for feature_idx in 0..n_features {
            let mut order: Vec<usize> = (0..rows.len()).collect();
            order.sort_by(|&a, &b| rows[a][feature_idx].total_cmp(&rows[b][feature_idx]));

            // Prefix sums over the sorted order let every split be scored in
            // constant time.
            let mut left_sum = 0.0;
            for (rank, &i) in order.iter().enumerate() {
                left_sum += residuals[i];
                let n_left = rank + 1;
                let n_right = rows.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let here = rows[i][feature_idx];
                let next = rows[order[rank + 1]][feature_idx];
                if here == next {
                    continue;
                }

                let right_sum = total - left_sum;
                let left_mean = left_sum / n_left as f64;
                let right_mean = right_sum / n_right as f64;
                // SSE after the split, up to a constant shared by all splits.
                let sse = -(left_mean * left_sum + right_mean * right_sum);

                if best.as_ref().map_or(true, |(b, _)| sse < *b) {
                    best = Some((
                        sse,
                        Stump {
                            feature_idx,
                            threshold: (here + next) / 2.0,
                            left_value: left_mean,
                            right_value: right_mean,
                        },
                    ));
                }
            }
        }

        let (sse_offset, stump) = best?;
        // Reject splits that do not beat predicting the mean residual. The
        // stored offset is the split SSE minus the shared sum of squares.
        let sum_squares: f64 = residuals.iter().map(|r| r * r).sum();
        let mean = total / n;
        let mean_sse: f64 = residuals.iter().map(|r| (r - mean).powi(2)).sum();
        if sum_squares + sse_offset < mean_sse - 1e-12 {
            Some(stump)
        } else {
            None
        }
    }
}

impl ModelAdapter for GradientBoosted {
    fn name(&self) -> &str {
        "gradient_boosted"
    }

    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), TrainError> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(TrainError::Model(format!(
                "gradient_boosted: {} rows and {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let targets: Vec<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        self.base_score = targets.iter().sum::<f64>() / targets.len() as f64;
        self.stumps.clear();

        let mut scores = vec![self.base_score; rows.len()];
        for _ in 0..self.config.n_rounds {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(&scores)
                .map(|(t, s)| t - s)
                .collect();

            let Some(stump) = self.fit_stump(rows, &residuals) else {
                break;
            };

            for (score, row) in scores.iter_mut().zip(rows) {
                *score += self.config.learning_rate * stump.predict_one(row);
            }
            self.stumps.push(stump);
        }

        debug!(rounds = self.stumps.len(), "fitted boosted ensemble");
        Ok(())
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<bool> {
        rows.iter().map(|r| self.score_one(r) >= 0.5).collect()
    }

    fn predict_confidence(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.score_one(r)).collect()
    }
}
