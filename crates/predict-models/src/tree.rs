//! CART decision tree for binary direction classification.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered at each split. `None` uses all of them.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_split: 10,
            min_samples_leaf: 5,
            max_features: None,
            seed: 42,
        }
    }
}

/// A node in the fitted tree. Leaves carry the positive-class fraction of the
/// train samples that reached them.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeNode {
    feature_idx: Option<usize>,
    threshold: Option<f64>,
    positive_fraction: f64,
    left: Option<Box<TreeNode>>,
    right: Option<Box<TreeNode>>,
}

impl TreeNode {
    fn leaf(positive_fraction: f64) -> Self {
        Self {
            feature_idx: None,
            threshold: None,
            positive_fraction,
            left: None,
            right: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Binary classification tree split on gini impurity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self { config, root: None }
    }

    /// Fit on row-major features and boolean labels.
    pub fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) {
        let indices: Vec<usize> = (0..rows.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.root = Some(self.build(rows, labels, &indices, 0, &mut rng));
    }

    fn build(
        &self,
        rows: &[Vec<f64>],
        labels: &[bool],
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let fraction = positive_fraction(labels, indices);
        let impurity = gini(fraction);

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity < 1e-10
        {
            return TreeNode::leaf(fraction);
        }

        let Some((feature_idx, threshold, left_idx, right_idx)) =
            self.find_best_split(rows, labels, indices, impurity, rng)
        else {
            return TreeNode::leaf(fraction);
        };

        if left_idx.len() < self.config.min_samples_leaf
            || right_idx.len() < self.config.min_samples_leaf
        {
            return TreeNode::leaf(fraction);
        }

        let left = self.build(rows, labels, &left_idx, depth + 1, rng);
        let right = self.build(rows, labels, &right_idx, depth + 1, rng);

        TreeNode {
            feature_idx: Some(feature_idx),
            threshold: Some(threshold),
            positive_fraction: fraction,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    fn find_best_split(
        &self,
        rows: &[Vec<f64>],
        labels: &[bool],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>)> {
        let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
        let max_features = self.config.max_features.unwrap_or(n_features).min(n_features);

        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        feature_indices.shuffle(rng);
        feature_indices.truncate(max_features);

        let mut best_gain = 0.0;
        let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>)> = None;

        for &feature_idx in &feature_indices {
            let mut values: Vec<f64> = indices.iter().map(|&i| rows[i][feature_idx]).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| rows[i][feature_idx] <= threshold);

                if left_idx.is_empty() || right_idx.is_empty() {
                    continue;
                }

                let left_impurity = gini(positive_fraction(labels, &left_idx));
                let right_impurity = gini(positive_fraction(labels, &right_idx));

                let n_left = left_idx.len() as f64;
                let n_right = right_idx.len() as f64;
                let weighted =
                    (n_left * left_impurity + n_right * right_impurity) / (n_left + n_right);
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature_idx, threshold, left_idx, right_idx));
                }
            }
        }

        best
    }

    /// Positive-class probability for one sample. Returns 0.5 before `fit`.
    pub fn predict_proba_one(&self, features: &[f64]) -> f64 {
        match &self.root {
            Some(root) => {
                let mut node = root;
                while !node.is_leaf() {
                    // Split nodes always carry both children and split params.
                    let (Some(idx), Some(threshold), Some(left), Some(right)) = (
                        node.feature_idx,
                        node.threshold,
                        node.left.as_deref(),
                        node.right.as_deref(),
                    ) else {
                        break;
                    };
                    node = if features[idx] <= threshold { left } else { right };
                }
                node.positive_fraction
            }
            None => 0.5,
        }
    }
}

fn positive_fraction(labels: &[bool], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.5;
    }
    let positives = indices.iter().filter(|&&i| labels[i]).count();
    positives as f64 / indices.len() as f64
}

fn gini(p: f64) -> f64 {
    2.0 * p * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f64>>, Vec<bool>) {
        let rows: Vec<Vec<f64>> = (0..100).map(|i| vec![i as f64 / 10.0]).collect();
        let labels: Vec<bool> = (0..100).map(|i| i as f64 / 10.0 > 5.0).collect();
        (rows, labels)
    }

    #[test]
    fn test_learns_step_function() {
        let (rows, labels) = step_data();
        let mut tree = DecisionTree::new(TreeConfig::default());
        tree.fit(&rows, &labels);

        assert!(tree.predict_proba_one(&[2.0]) < 0.5);
        assert!(tree.predict_proba_one(&[8.0]) > 0.5);
    }

    #[test]
    fn test_unfitted_returns_prior() {
        let tree = DecisionTree::new(TreeConfig::default());
        assert!((tree.predict_proba_one(&[1.0]) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_pure_node_stops_splitting() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let labels = vec![true; 20];
        let mut tree = DecisionTree::new(TreeConfig::default());
        tree.fit(&rows, &labels);

        assert!((tree.predict_proba_one(&[3.0]) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let (rows, labels) = step_data();
        let mut a = DecisionTree::new(TreeConfig::default());
        let mut b = DecisionTree::new(TreeConfig::default());
        a.fit(&rows, &labels);
        b.fit(&rows, &labels);

        for i in 0..100 {
            let f = [i as f64 / 10.0];
            assert_eq!(a.predict_proba_one(&f), b.predict_proba_one(&f));
        }
    }
}
