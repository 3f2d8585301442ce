//! Feature matrix aligned to a market dataset.

use serde::{Deserialize, Serialize};

/// Fixed-width matrix of technical-indicator values with one binary
/// label per row ("close rises next period").
///
/// Rows are time-ordered and carry the timestamp of their source bar
/// plus the realized next-period return, from which the label is
/// derived. The split index partitions rows into the train range
/// `[0, split)` and the test range `[split, len)`, inherited from the
/// dataset after warmup rows were dropped. No row may contain a NaN or
/// infinite value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Vec<bool>,
    timestamps: Vec<i64>,
    forward_returns: Vec<f64>,
    split: usize,
}

impl FeatureMatrix {
    /// Assemble a feature matrix. All sequences must have equal length
    /// and every row must be `columns.len()` wide.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
        labels: Vec<bool>,
        timestamps: Vec<i64>,
        forward_returns: Vec<f64>,
        split: usize,
    ) -> Self {
        debug_assert_eq!(rows.len(), labels.len());
        debug_assert_eq!(rows.len(), timestamps.len());
        debug_assert_eq!(rows.len(), forward_returns.len());
        debug_assert!(split <= rows.len());
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            columns,
            rows,
            labels,
            timestamps,
            forward_returns,
            split,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the matrix has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of feature columns.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// Feature column names, in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// First row index of the test range.
    #[inline]
    pub fn split_index(&self) -> usize {
        self.split
    }

    /// Training-range feature rows.
    pub fn train_rows(&self) -> &[Vec<f64>] {
        &self.rows[..self.split]
    }

    /// Training-range labels.
    pub fn train_labels(&self) -> &[bool] {
        &self.labels[..self.split]
    }

    /// Test-range feature rows.
    pub fn test_rows(&self) -> &[Vec<f64>] {
        &self.rows[self.split..]
    }

    /// Test-range labels (realized next-period direction).
    pub fn test_labels(&self) -> &[bool] {
        &self.labels[self.split..]
    }

    /// Test-range realized next-period returns, aligned to `test_rows`.
    pub fn test_forward_returns(&self) -> &[f64] {
        &self.forward_returns[self.split..]
    }

    /// Test-range timestamps, aligned to `test_rows`.
    pub fn test_timestamps(&self) -> &[i64] {
        &self.timestamps[self.split..]
    }

    /// All timestamps.
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_matrix(n: usize, split: usize) -> FeatureMatrix {
        FeatureMatrix::new(
            vec!["a".to_string(), "b".to_string()],
            (0..n).map(|i| vec![i as f64, -(i as f64)]).collect(),
            (0..n).map(|i| i % 2 == 0).collect(),
            (0..n).map(|i| i as i64 * 1000).collect(),
            (0..n).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect(),
            split,
        )
    }

    #[test]
    fn test_partitions() {
        let m = make_matrix(10, 7);
        assert_eq!(m.train_rows().len(), 7);
        assert_eq!(m.test_rows().len(), 3);
        assert_eq!(m.test_forward_returns().len(), 3);
        assert_eq!(m.n_features(), 2);
    }

    #[test]
    fn test_empty_test_partition() {
        let m = make_matrix(5, 5);
        assert!(m.test_rows().is_empty());
    }
}
