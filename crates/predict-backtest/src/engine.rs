//! Runs every trained model over the test partition.

use std::collections::HashMap;

use predict_core::{BacktestError, FeatureMatrix, Interval, ModelAdapter, TradeSignal};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::ModelBacktest;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_capital: Decimal,
    /// Confidence at or above this goes long, below stays flat.
    pub confidence_threshold: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10_000),
            confidence_threshold: 0.5,
        }
    }
}

/// Scores trained models on held-out test rows.
#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Backtest each model independently against the same test partition.
    pub fn run(
        &self,
        models: &[Box<dyn ModelAdapter>],
        matrix: &FeatureMatrix,
        interval: Interval,
    ) -> Result<HashMap<String, ModelBacktest>, BacktestError> {
        if models.is_empty() {
            return Err(BacktestError::NoTrainedModels);
        }
        let test_rows = matrix.test_rows();
        if test_rows.is_empty() {
            return Err(BacktestError::NoTestData);
        }

        let labels = matrix.test_labels();
        let forward_returns = matrix.test_forward_returns();
        let timestamps = matrix.test_timestamps();
        let periods_per_year = interval.periods_per_year();

        let mut results = HashMap::with_capacity(models.len());
        for model in models {
            let predicted = model.predict(test_rows);
            let long_signals: Vec<bool> = model
                .predict_confidence(test_rows)
                .into_iter()
                .map(|c| {
                    TradeSignal::from_confidence(c, self.config.confidence_threshold)
                        == TradeSignal::Long
                })
                .collect();

            let result = ModelBacktest::compute(
                model.name(),
                &predicted,
                &long_signals,
                labels,
                forward_returns,
                timestamps,
                self.config.initial_capital,
                periods_per_year,
            );

            info!(
                model = model.name(),
                accuracy = result.accuracy,
                total_return_pct = %result.total_return_pct,
                sharpe = result.sharpe_ratio,
                "backtest complete"
            );
            results.insert(model.name().to_string(), result);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predict_core::TrainError;

    struct OracleModel;

    impl ModelAdapter for OracleModel {
        fn name(&self) -> &str {
            "oracle"
        }

        fn fit(&mut self, _rows: &[Vec<f64>], _labels: &[bool]) -> Result<(), TrainError> {
            Ok(())
        }

        fn predict(&self, rows: &[Vec<f64>]) -> Vec<bool> {
            // First feature encodes the label for test purposes.
            rows.iter().map(|r| r[0] > 0.0).collect()
        }

        fn predict_confidence(&self, rows: &[Vec<f64>]) -> Vec<f64> {
            rows.iter().map(|r| if r[0] > 0.0 { 0.9 } else { 0.1 }).collect()
        }
    }

    fn matrix(train: usize, test: usize) -> FeatureMatrix {
        let n = train + test;
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![if i % 2 == 0 { 1.0 } else { -1.0 }])
            .collect();
        let labels: Vec<bool> = (0..n).map(|i| i % 2 == 0).collect();
        let forward_returns: Vec<f64> = (0..n)
            .map(|i| if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let timestamps: Vec<i64> = (0..n as i64).map(|i| i * 86_400_000).collect();
        FeatureMatrix::new(
            vec!["signal".to_string()],
            rows,
            labels,
            timestamps,
            forward_returns,
            train,
        )
    }

    #[test]
    fn test_oracle_beats_buy_and_hold() {
        let engine = BacktestEngine::default();
        let models: Vec<Box<dyn ModelAdapter>> = vec![Box::new(OracleModel)];

        let results = engine
            .run(&models, &matrix(10, 40), Interval::Daily)
            .expect("run");
        let oracle = &results["oracle"];

        assert!((oracle.accuracy - 1.0).abs() < 1e-10);
        assert_eq!(oracle.confusion.total(), 40);
        assert!(oracle.total_return_pct > oracle.buy_hold_return_pct);
        assert!(oracle.sharpe_ratio > 0.0);
        assert_eq!(oracle.win_rate_pct, dec!(100));
    }

    #[test]
    fn test_empty_test_partition() {
        let engine = BacktestEngine::default();
        let models: Vec<Box<dyn ModelAdapter>> = vec![Box::new(OracleModel)];

        let err = engine
            .run(&models, &matrix(20, 0), Interval::Daily)
            .unwrap_err();
        assert!(matches!(err, BacktestError::NoTestData));
    }

    #[test]
    fn test_no_models() {
        let engine = BacktestEngine::default();
        let err = engine
            .run(&[], &matrix(10, 10), Interval::Daily)
            .unwrap_err();
        assert!(matches!(err, BacktestError::NoTrainedModels));
    }
}
