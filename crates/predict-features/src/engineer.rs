//! Feature matrix construction from a validated market dataset.

use predict_core::{FeatureError, FeatureMatrix, MarketDataset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::indicators;

/// Tunables for the engineering stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Periods for simple moving average columns.
    pub sma_periods: Vec<usize>,
    /// Periods for exponential moving average columns.
    pub ema_periods: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
    /// Window for rolling volatility of returns.
    pub volatility_period: usize,
    /// Window for the volume moving-average ratio.
    pub volume_period: usize,
    /// Minimum rows the train partition must retain after warmup.
    pub min_train_samples: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sma_periods: vec![7, 14, 21],
            ema_periods: vec![7, 14, 21],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_k: 2.0,
            volatility_period: 20,
            volume_period: 20,
            min_train_samples: 100,
        }
    }
}

impl FeatureConfig {
    /// Reject parameter combinations the indicator kernels cannot compute.
    ///
    /// Runs before any column is built, so bad config-file input surfaces
    /// as an error instead of a panic deep in a kernel.
    pub fn validate(&self) -> Result<(), FeatureError> {
        let positive = [
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_signal", self.macd_signal),
            ("volume_period", self.volume_period),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(FeatureError::InvalidConfig(format!(
                    "{name} must be greater than 0"
                )));
            }
        }
        if self.sma_periods.iter().chain(&self.ema_periods).any(|&p| p == 0) {
            return Err(FeatureError::InvalidConfig(
                "moving-average periods must be greater than 0".to_string(),
            ));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(FeatureError::InvalidConfig(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        if self.bollinger_period < 2 || self.volatility_period < 2 {
            return Err(FeatureError::InvalidConfig(
                "bollinger_period and volatility_period must be at least 2".to_string(),
            ));
        }
        if !self.bollinger_k.is_finite() || self.bollinger_k <= 0.0 {
            return Err(FeatureError::InvalidConfig(
                "bollinger_k must be a positive finite number".to_string(),
            ));
        }
        Ok(())
    }

    /// Leading rows dropped before any row reaches a model.
    ///
    /// The slowest lookback wins. EMA-derived columns settle within their
    /// period even though they are defined from the first bar, so the MACD
    /// slow period covers them too.
    pub fn warmup(&self) -> usize {
        let rolling = self
            .sma_periods
            .iter()
            .chain(&self.ema_periods)
            .copied()
            .chain([
                self.rsi_period,
                self.macd_slow,
                self.bollinger_period,
                self.volatility_period,
                self.volume_period,
            ])
            .max()
            .unwrap_or(0);
        rolling.max(1)
    }
}

/// Summary of an engineering run, reported to the pipeline caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub total_features: usize,
    pub train_samples: usize,
}

/// Turns OHLCV bars into a labeled feature matrix.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Compute all feature columns over the full series, attach labels, and
    /// drop the rows no model may see.
    ///
    /// Indicators are computed across the train/test boundary in a single
    /// pass; only the row drops differ by partition. Warmup rows come off the
    /// head, which always lands in the train partition, and the final bar is
    /// dropped because its next-period label does not exist yet.
    pub fn engineer(
        &self,
        dataset: &MarketDataset,
    ) -> Result<(FeatureMatrix, FeatureSummary), FeatureError> {
        self.config.validate()?;
        let warmup = self.config.warmup();
        // Need warmup rows, at least one usable row, and the label bar after it.
        let required = warmup + 2;
        if dataset.len() < required {
            return Err(FeatureError::InsufficientHistory {
                required,
                available: dataset.len(),
            });
        }

        let closes = dataset.closes();
        let columns = self.build_columns(dataset);
        debug!(columns = columns.len(), "computed indicator columns");

        // Label and realized return both look one bar ahead.
        let n = dataset.len();
        let mut forward_returns = vec![f64::NAN; n];
        let mut labels = vec![false; n];
        for i in 0..n - 1 {
            let r = closes[i + 1] / closes[i] - 1.0;
            forward_returns[i] = r;
            labels[i] = r > 0.0;
        }

        let keep = warmup..n - 1;
        let timestamps = dataset.timestamps();
        let rows: Vec<Vec<f64>> = keep
            .clone()
            .map(|i| columns.iter().map(|(_, values)| values[i]).collect())
            .collect();

        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(FeatureError::NonFiniteValue {
                        column: columns[col_idx].0.clone(),
                        row: row_idx,
                    });
                }
            }
        }

        let split = dataset.split_index().saturating_sub(warmup).min(rows.len());
        if split < self.config.min_train_samples {
            return Err(FeatureError::InsufficientHistory {
                required: self.config.min_train_samples + warmup,
                available: dataset.split_index(),
            });
        }

        let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
        let summary = FeatureSummary {
            total_features: names.len(),
            train_samples: split,
        };

        let matrix = FeatureMatrix::new(
            names,
            rows,
            keep.clone().map(|i| labels[i]).collect(),
            keep.clone().map(|i| timestamps[i]).collect(),
            keep.map(|i| forward_returns[i]).collect(),
            split,
        );

        info!(
            total_features = summary.total_features,
            train_samples = summary.train_samples,
            test_samples = matrix.len() - split,
            "feature engineering complete"
        );
        Ok((matrix, summary))
    }

    fn build_columns(&self, dataset: &MarketDataset) -> Vec<(String, Vec<f64>)> {
        let closes = dataset.closes();
        let highs = dataset.highs();
        let lows = dataset.lows();
        let volumes = dataset.volumes();
        let cfg = &self.config;

        let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
        columns.push(("return_1".into(), indicators::returns(&closes)));
        columns.push(("log_return_1".into(), indicators::log_returns(&closes)));

        for &period in &cfg.sma_periods {
            // Price relative to its average rather than the raw average, so
            // the column is scale free.
            let sma = indicators::sma(&closes, period);
            let rel: Vec<f64> = closes
                .iter()
                .zip(&sma)
                .map(|(&c, &m)| if m.is_nan() { f64::NAN } else { c / m - 1.0 })
                .collect();
            columns.push((format!("sma_{period}_rel"), rel));
        }
        for &period in &cfg.ema_periods {
            let ema = indicators::ema(&closes, period);
            let rel: Vec<f64> = closes.iter().zip(&ema).map(|(&c, &m)| c / m - 1.0).collect();
            columns.push((format!("ema_{period}_rel"), rel));
        }

        columns.push((
            format!("rsi_{}", cfg.rsi_period),
            indicators::rsi(&closes, cfg.rsi_period),
        ));

        let (macd_line, macd_signal, macd_histogram) =
            indicators::macd(&closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
        let normalize = |raw: Vec<f64>| -> Vec<f64> {
            raw.iter().zip(&closes).map(|(&v, &c)| v / c).collect()
        };
        columns.push(("macd_line".into(), normalize(macd_line)));
        columns.push(("macd_signal".into(), normalize(macd_signal)));
        columns.push(("macd_histogram".into(), normalize(macd_histogram)));

        let (bb_width, bb_percent) =
            indicators::bollinger(&closes, cfg.bollinger_period, cfg.bollinger_k);
        columns.push(("bollinger_width".into(), bb_width));
        columns.push(("bollinger_percent_b".into(), bb_percent));

        let rets = indicators::returns(&closes);
        columns.push((
            format!("volatility_{}", cfg.volatility_period),
            indicators::rolling_std(&rets, cfg.volatility_period),
        ));
        columns.push((
            format!("volume_ratio_{}", cfg.volume_period),
            indicators::volume_ratio(&volumes, cfg.volume_period),
        ));
        columns.push((
            "range_ratio".into(),
            indicators::range_ratio(&highs, &lows, &closes),
        ));
        columns.push((
            "close_position".into(),
            indicators::close_position(&highs, &lows, &closes),
        ));

        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predict_core::{Bar, Interval, MarketDataset};

    fn dataset(bars: usize, split: usize) -> MarketDataset {
        let day = 86_400_000;
        let bars: Vec<Bar> = (0..bars)
            .map(|i| {
                let drift = 100.0 + i as f64 * 0.2;
                let wobble = (i as f64 * 0.9).sin() * 2.0;
                let close = drift + wobble;
                Bar::new(
                    i as i64 * day,
                    close - 0.5,
                    close + 1.0,
                    close - 1.0,
                    close,
                    1_000.0 + (i as f64 * 1.3).cos().abs() * 500.0,
                )
            })
            .collect();
        MarketDataset::new("BTCUSDT".into(), Interval::Daily, bars, split)
    }

    #[test]
    fn test_warmup_is_slowest_lookback() {
        assert_eq!(FeatureConfig::default().warmup(), 26);
    }

    #[test]
    fn test_engineer_row_accounting() {
        let engineer = FeatureEngineer::default();
        let (matrix, summary) = engineer.engineer(&dataset(500, 400)).expect("engineer");

        // 26 warmup rows and the unlabeled final row are dropped.
        assert_eq!(matrix.len(), 473);
        assert_eq!(summary.train_samples, 374);
        assert_eq!(matrix.split_index(), 374);
        assert_eq!(matrix.len() - matrix.split_index(), 99);
        assert_eq!(summary.total_features, matrix.n_features());
    }

    #[test]
    fn test_all_values_finite() {
        let engineer = FeatureEngineer::default();
        let (matrix, _) = engineer.engineer(&dataset(300, 250)).expect("engineer");

        for i in 0..matrix.len() {
            let row = if i < matrix.split_index() {
                &matrix.train_rows()[i]
            } else {
                &matrix.test_rows()[i - matrix.split_index()]
            };
            assert!(row.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_labels_match_forward_returns() {
        let engineer = FeatureEngineer::default();
        let (matrix, _) = engineer.engineer(&dataset(200, 160)).expect("engineer");

        for (label, ret) in matrix.test_labels().iter().zip(matrix.test_forward_returns()) {
            assert_eq!(*label, *ret > 0.0);
        }
    }

    #[test]
    fn test_insufficient_history_short_series() {
        let engineer = FeatureEngineer::default();
        let err = engineer.engineer(&dataset(20, 16)).unwrap_err();
        assert!(matches!(err, FeatureError::InsufficientHistory { .. }));
    }

    #[test]
    fn test_insufficient_train_partition() {
        let engineer = FeatureEngineer::default();
        // 110 train bars minus 26 warmup leaves 84, below the floor of 100.
        let err = engineer.engineer(&dataset(200, 110)).unwrap_err();
        assert!(matches!(err, FeatureError::InsufficientHistory { .. }));
    }

    #[test]
    fn test_zero_rsi_period_is_config_error() {
        let config = FeatureConfig {
            rsi_period: 0,
            ..Default::default()
        };
        let err = FeatureEngineer::new(config)
            .engineer(&dataset(500, 400))
            .unwrap_err();
        assert!(matches!(err, FeatureError::InvalidConfig(_)));
    }

    #[test]
    fn test_inverted_macd_periods_is_config_error() {
        let config = FeatureConfig {
            macd_fast: 26,
            macd_slow: 12,
            ..Default::default()
        };
        let err = FeatureEngineer::new(config)
            .engineer(&dataset(500, 400))
            .unwrap_err();
        assert!(matches!(err, FeatureError::InvalidConfig(_)));
    }

    #[test]
    fn test_degenerate_rolling_windows_are_config_errors() {
        for config in [
            FeatureConfig { volatility_period: 1, ..Default::default() },
            FeatureConfig { bollinger_period: 1, ..Default::default() },
            FeatureConfig { sma_periods: vec![0], ..Default::default() },
            FeatureConfig { bollinger_k: -2.0, ..Default::default() },
        ] {
            let err = FeatureEngineer::new(config)
                .engineer(&dataset(500, 400))
                .unwrap_err();
            assert!(matches!(err, FeatureError::InvalidConfig(_)));
        }
    }

    #[test]
    fn test_deterministic() {
        let engineer = FeatureEngineer::default();
        let ds = dataset(300, 250);
        let (a, _) = engineer.engineer(&ds).expect("engineer");
        let (b, _) = engineer.engineer(&ds).expect("engineer");
        assert_eq!(a.train_rows(), b.train_rows());
        assert_eq!(a.test_labels(), b.test_labels());
    }
}
