//! Per-model backtest metrics.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Binary classification counts over the test partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positive += 1,
            (true, false) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
            (false, true) => self.false_negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.true_positive + self.true_negative) as f64 / total as f64
    }
}

/// Full metric set for one model over the test partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBacktest {
    pub model_name: String,
    /// Fraction of test labels the classifier got right.
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    /// Annualized mean-over-deviation of strategy returns. Zero when the
    /// return series has no variance.
    pub sharpe_ratio: f64,
    pub total_return_pct: Decimal,
    pub max_drawdown_pct: Decimal,
    /// Share of long periods that closed positive. Zero with no long periods.
    pub win_rate_pct: Decimal,
    /// Compounded return of holding through the whole test partition.
    pub buy_hold_return_pct: Decimal,
    pub final_equity: Decimal,
    pub equity_curve: Vec<(i64, Decimal)>,
}

impl ModelBacktest {
    /// Score one model's signals against realized next-period returns.
    ///
    /// Long signals earn the period's forward return, flat signals earn zero.
    /// Equity compounds in `Decimal`; ratio statistics stay in `f64`.
    pub fn compute(
        model_name: &str,
        predicted: &[bool],
        long_signals: &[bool],
        actual: &[bool],
        forward_returns: &[f64],
        timestamps: &[i64],
        initial_capital: Decimal,
        periods_per_year: f64,
    ) -> Self {
        let mut confusion = ConfusionMatrix::default();
        for (&p, &a) in predicted.iter().zip(actual) {
            confusion.record(p, a);
        }

        let strategy_returns: Vec<f64> = long_signals
            .iter()
            .zip(forward_returns)
            .map(|(&long, &r)| if long { r } else { 0.0 })
            .collect();

        let mut equity = initial_capital;
        let mut peak = initial_capital;
        let mut max_drawdown_pct = Decimal::ZERO;
        let mut equity_curve = Vec::with_capacity(strategy_returns.len());

        for (&r, &ts) in strategy_returns.iter().zip(timestamps) {
            let ret = Decimal::try_from(r).unwrap_or(Decimal::ZERO);
            equity *= Decimal::ONE + ret;
            if equity > peak {
                peak = equity;
            }
            if peak > Decimal::ZERO {
                let drawdown = (peak - equity) / peak * dec!(100);
                if drawdown > max_drawdown_pct {
                    max_drawdown_pct = drawdown;
                }
            }
            equity_curve.push((ts, equity));
        }

        let total_return_pct = if initial_capital > Decimal::ZERO {
            (equity - initial_capital) / initial_capital * dec!(100)
        } else {
            Decimal::ZERO
        };

        let long_periods = long_signals.iter().filter(|&&l| l).count();
        let win_rate_pct = if long_periods > 0 {
            let wins = long_signals
                .iter()
                .zip(forward_returns)
                .filter(|(&l, &r)| l && r > 0.0)
                .count();
            Decimal::from(wins * 100) / Decimal::from(long_periods)
        } else {
            Decimal::ZERO
        };

        let mut hold = Decimal::ONE;
        for &r in forward_returns {
            hold *= Decimal::ONE + Decimal::try_from(r).unwrap_or(Decimal::ZERO);
        }
        let buy_hold_return_pct = (hold - Decimal::ONE) * dec!(100);

        Self {
            model_name: model_name.to_string(),
            accuracy: confusion.accuracy(),
            confusion,
            sharpe_ratio: sharpe(&strategy_returns, periods_per_year),
            total_return_pct,
            max_drawdown_pct,
            win_rate_pct,
            buy_hold_return_pct,
            final_equity: equity,
            equity_curve,
        }
    }
}

/// Annualized Sharpe with a zero risk-free rate. Zero-variance series score 0.
fn sharpe(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev > 0.0 {
        mean / std_dev * periods_per_year.sqrt()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamps(n: usize) -> Vec<i64> {
        (0..n as i64).map(|i| i * 86_400_000).collect()
    }

    #[test]
    fn test_confusion_matrix_counts() {
        let mut m = ConfusionMatrix::default();
        m.record(true, true);
        m.record(true, false);
        m.record(false, false);
        m.record(false, true);
        m.record(true, true);

        assert_eq!(m.true_positive, 2);
        assert_eq!(m.false_positive, 1);
        assert_eq!(m.true_negative, 1);
        assert_eq!(m.false_negative, 1);
        assert_eq!(m.total(), 5);
        assert!((m.accuracy() - 0.6).abs() < 1e-10);
    }

    #[test]
    fn test_always_flat_keeps_capital() {
        let n = 10;
        let result = ModelBacktest::compute(
            "flat",
            &vec![false; n],
            &vec![false; n],
            &vec![true; n],
            &vec![0.01; n],
            &timestamps(n),
            dec!(10_000),
            365.0,
        );

        assert_eq!(result.final_equity, dec!(10_000));
        assert_eq!(result.total_return_pct, Decimal::ZERO);
        assert_eq!(result.max_drawdown_pct, Decimal::ZERO);
        // No long periods, so win rate reports zero rather than dividing by zero.
        assert_eq!(result.win_rate_pct, Decimal::ZERO);
        // Flat returns have no variance either.
        assert_eq!(result.sharpe_ratio, 0.0);
        assert!((result.accuracy - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_perfect_long_compounds() {
        let n = 3;
        let result = ModelBacktest::compute(
            "long",
            &vec![true; n],
            &vec![true; n],
            &vec![true; n],
            &[0.1, 0.1, 0.1],
            &timestamps(n),
            dec!(1_000),
            365.0,
        );

        assert_eq!(result.final_equity, dec!(1331.000));
        assert_eq!(result.win_rate_pct, dec!(100));
        assert!((result.accuracy - 1.0).abs() < 1e-10);
        assert_eq!(result.confusion.true_positive, 3);
        // Strategy equals buy and hold when always long.
        assert_eq!(result.total_return_pct, result.buy_hold_return_pct);
    }

    #[test]
    fn test_drawdown_from_peak() {
        let result = ModelBacktest::compute(
            "dd",
            &[true, true, true],
            &[true, true, true],
            &[true, false, true],
            &[0.10, -0.50, 0.10],
            &timestamps(3),
            dec!(1_000),
            365.0,
        );

        // Peak 1100, trough 550: a 50% drawdown.
        assert_eq!(result.max_drawdown_pct, dec!(50));
        assert!(result.total_return_pct < Decimal::ZERO);
    }

    #[test]
    fn test_confusion_sums_to_test_rows() {
        let predicted = [true, false, true, false, true];
        let actual = [true, true, false, false, true];
        let result = ModelBacktest::compute(
            "sum",
            &predicted,
            &predicted,
            &actual,
            &[0.01, -0.01, 0.02, -0.02, 0.01],
            &timestamps(5),
            dec!(10_000),
            365.0,
        );

        assert_eq!(result.confusion.total(), 5);
    }

    #[test]
    fn test_sharpe_zero_for_constant_nonzero_returns() {
        // Identical per-period returns have zero variance, so Sharpe is
        // defined as 0 whatever the common return value is.
        assert_eq!(sharpe(&[0.01; 20], 365.0), 0.0);
        assert_eq!(sharpe(&[-0.03; 20], 365.0), 0.0);

        let n = 10;
        let result = ModelBacktest::compute(
            "steady",
            &vec![true; n],
            &vec![true; n],
            &vec![true; n],
            &vec![0.01; n],
            &timestamps(n),
            dec!(10_000),
            365.0,
        );
        assert_eq!(result.sharpe_ratio, 0.0);
        assert!(result.total_return_pct > Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_positive_for_steady_gains() {
        let returns = [0.01, 0.02, 0.01, 0.015];
        assert!(sharpe(&returns, 365.0) > 0.0);
        assert_eq!(sharpe(&[], 365.0), 0.0);
    }
}
