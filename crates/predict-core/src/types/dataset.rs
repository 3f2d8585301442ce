//! Immutable market dataset with a train/test split.

use serde::{Deserialize, Serialize};

use super::{Bar, Interval};

/// Timestamp-ordered OHLCV series with a train/test split boundary.
///
/// Bars `[0, split)` form the training range, `[split, len)` the test
/// range. A dataset is created once by the download stage and never
/// mutated; re-downloading produces a new dataset that supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataset {
    /// Symbol identifier (e.g. "BTCUSDT")
    pub symbol: String,
    /// Sampling interval of the bars
    pub interval: Interval,
    bars: Vec<Bar>,
    split: usize,
}

impl MarketDataset {
    /// Create a dataset from validated, time-ordered bars.
    ///
    /// The caller (the download stage) is responsible for validation;
    /// `split` must be within `0..=bars.len()`.
    pub fn new(symbol: String, interval: Interval, bars: Vec<Bar>, split: usize) -> Self {
        debug_assert!(split <= bars.len());
        Self {
            symbol,
            interval,
            bars,
            split,
        }
    }

    /// Total number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the dataset is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Split index: first bar of the test range.
    #[inline]
    pub fn split_index(&self) -> usize {
        self.split
    }

    /// All bars in time order.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Bars in the training range.
    pub fn train_bars(&self) -> &[Bar] {
        &self.bars[..self.split]
    }

    /// Bars in the test range.
    pub fn test_bars(&self) -> &[Bar] {
        &self.bars[self.split..]
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Extract high prices as a vector.
    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// Extract low prices as a vector.
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// Extract volumes as a vector.
    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Extract timestamps as a vector.
    pub fn timestamps(&self) -> Vec<i64> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset(n: usize, split: usize) -> MarketDataset {
        let bars: Vec<Bar> = (0..n)
            .map(|i| {
                let p = 100.0 + i as f64;
                Bar::new(i as i64 * 86_400_000, p, p + 1.0, p - 1.0, p + 0.5, 10.0)
            })
            .collect();
        MarketDataset::new("TEST".to_string(), Interval::Daily, bars, split)
    }

    #[test]
    fn test_partitions() {
        let ds = make_dataset(10, 8);
        assert_eq!(ds.train_bars().len(), 8);
        assert_eq!(ds.test_bars().len(), 2);
        assert_eq!(ds.train_bars().len() + ds.test_bars().len(), ds.len());
    }

    #[test]
    fn test_no_leakage() {
        let ds = make_dataset(10, 8);
        let last_train = ds.train_bars().last().unwrap().timestamp;
        let first_test = ds.test_bars().first().unwrap().timestamp;
        assert!(first_test > last_train);
    }
}
