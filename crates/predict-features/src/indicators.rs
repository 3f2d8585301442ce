//! Technical indicator kernels.
//!
//! Every function returns a vector aligned with its input: element `i` of the
//! output is the indicator value at bar `i`, with `NaN` filling positions
//! where the lookback window is not yet full. Alignment keeps column assembly
//! in the engineering stage a plain zip, with warmup rows dropped in one place.

/// Simple one-period percentage returns. Index 0 is `NaN`.
pub fn returns(data: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    for i in 1..data.len() {
        out[i] = data[i] / data[i - 1] - 1.0;
    }
    out
}

/// Natural-log returns. Index 0 is `NaN`.
pub fn log_returns(data: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    for i in 1..data.len() {
        out[i] = (data[i] / data[i - 1]).ln();
    }
    out
}

/// Simple moving average over `period` values. First `period - 1` outputs are `NaN`.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    assert!(period > 0, "Period must be greater than 0");
    let mut out = vec![f64::NAN; data.len()];
    if data.len() < period {
        return out;
    }

    let period_f64 = period as f64;
    let mut sum: f64 = data[..period].iter().sum();
    out[period - 1] = sum / period_f64;

    for i in period..data.len() {
        sum = sum - data[i - period] + data[i];
        out[i] = sum / period_f64;
    }
    out
}

/// Exponential moving average seeded from the first value.
///
/// Uses the recursive form `ema[i] = alpha * x[i] + (1 - alpha) * ema[i - 1]`
/// with `alpha = 2 / (period + 1)`, starting at index 0. Early values are
/// biased toward the seed but defined everywhere, so EMA columns contribute
/// nothing to the warmup row count.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    assert!(period > 0, "Period must be greater than 0");
    let mut out = Vec::with_capacity(data.len());
    let alpha = 2.0 / (period as f64 + 1.0);
    let one_minus_alpha = 1.0 - alpha;

    let mut current = f64::NAN;
    for (i, &value) in data.iter().enumerate() {
        current = if i == 0 {
            value
        } else {
            value * alpha + current * one_minus_alpha
        };
        out.push(current);
    }
    out
}

/// Rolling sample standard deviation. First `period - 1` outputs are `NaN`,
/// as is any window containing a `NaN` input.
pub fn rolling_std(data: &[f64], period: usize) -> Vec<f64> {
    assert!(period > 1, "Period must be greater than 1");
    let mut out = vec![f64::NAN; data.len()];
    if data.len() < period {
        return out;
    }

    for i in (period - 1)..data.len() {
        let window = &data[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let var = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        out[i] = var.sqrt();
    }
    out
}

/// Relative Strength Index over rolling mean gains and losses.
///
/// First `period` outputs are `NaN` (one bar for the price delta plus
/// `period - 1` to fill the window). An all-gain window maps to 100.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    assert!(period > 0, "Period must be greater than 0");
    let n = data.len();
    let mut out = vec![f64::NAN; n];
    if n <= period {
        return out;
    }

    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = data[i] - data[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    for i in period..n {
        let avg_gain: f64 = gains[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
        out[i] = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
    }
    out
}

/// MACD line, signal line and histogram.
///
/// The line is `ema(fast) - ema(slow)`; the signal is an EMA of the line.
/// All three are defined from index 0 because [`ema`] seeds from the first
/// value, though values before the slow period are unsettled.
pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    assert!(
        fast_period < slow_period,
        "Fast period must be shorter than slow period"
    );
    let fast = ema(data, fast_period);
    let slow = ema(data, slow_period);

    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema(&line, signal_period);
    let histogram: Vec<f64> = line.iter().zip(&signal).map(|(l, s)| l - s).collect();

    (line, signal, histogram)
}

/// Bollinger band width and %B position.
///
/// Width is `(upper - lower) / middle`, %B is the position of price between
/// the bands. A degenerate window with zero deviation yields %B of 0.5.
/// First `period - 1` outputs are `NaN`.
pub fn bollinger(data: &[f64], period: usize, k: f64) -> (Vec<f64>, Vec<f64>) {
    assert!(period > 1, "Period must be greater than 1");
    let middle = sma(data, period);
    let std = rolling_std(data, period);

    let mut width = vec![f64::NAN; data.len()];
    let mut percent_b = vec![f64::NAN; data.len()];

    for i in 0..data.len() {
        if middle[i].is_nan() || std[i].is_nan() {
            continue;
        }
        let upper = middle[i] + k * std[i];
        let lower = middle[i] - k * std[i];
        width[i] = (upper - lower) / middle[i];
        percent_b[i] = if upper == lower {
            0.5
        } else {
            (data[i] - lower) / (upper - lower)
        };
    }

    (width, percent_b)
}

/// Ratio of current volume to its rolling average. First `period - 1`
/// outputs are `NaN`; a flat-zero volume window yields 1.0.
pub fn volume_ratio(volume: &[f64], period: usize) -> Vec<f64> {
    let avg = sma(volume, period);
    volume
        .iter()
        .zip(&avg)
        .map(|(&v, &a)| {
            if a.is_nan() {
                f64::NAN
            } else if a == 0.0 {
                1.0
            } else {
                v / a
            }
        })
        .collect()
}

/// Per-bar high-low range relative to the close.
pub fn range_ratio(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    high.iter()
        .zip(low)
        .zip(close)
        .map(|((&h, &l), &c)| (h - l) / c)
        .collect()
}

/// Where the close sits inside the bar's high-low range, in `[0, 1]`.
/// A zero-range bar maps to 0.5.
pub fn close_position(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    high.iter()
        .zip(low)
        .zip(close)
        .map(|((&h, &l), &c)| {
            let range = h - l;
            if range == 0.0 {
                0.5
            } else {
                (c - l) / range
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_alignment() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 5);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!((result[2] - 2.0).abs() < 1e-10);
        assert!((result[3] - 3.0).abs() < 1e-10);
        assert!((result[4] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let result = sma(&[1.0, 2.0], 5);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_ema_defined_from_start() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let result = ema(&data, 3);

        assert_eq!(result.len(), 4);
        // alpha = 0.5, seed = first value
        assert!((result[0] - 1.0).abs() < 1e-10);
        assert!((result[1] - 1.5).abs() < 1e-10);
        assert!((result[2] - 2.25).abs() < 1e-10);
    }

    #[test]
    fn test_returns() {
        let data = vec![100.0, 110.0, 99.0];
        let result = returns(&data);

        assert!(result[0].is_nan());
        assert!((result[1] - 0.1).abs() < 1e-10);
        assert!((result[2] + 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let data: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let result = rsi(&data, 14);

        for v in &result[..14] {
            assert!(v.is_nan());
        }
        for v in &result[14..] {
            assert!((v - 100.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_rsi_bounded() {
        let data: Vec<f64> = (0..50)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        for v in rsi(&data, 14).iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn test_rolling_std_constant_series() {
        let data = vec![5.0; 10];
        let result = rolling_std(&data, 4);

        assert!(result[2].is_nan());
        for v in &result[3..] {
            assert!(v.abs() < 1e-12);
        }
    }

    #[test]
    fn test_rolling_std_propagates_nan_inputs() {
        let mut data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        data[1] = f64::NAN;
        let result = rolling_std(&data, 3);

        // Windows touching the NaN stay NaN; the first clean window is [3,4,5].
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(!result[4].is_nan());
    }

    #[test]
    fn test_macd_lengths_match() {
        let data: Vec<f64> = (0..100).map(|i| 100.0 + i as f64 * 0.3).collect();
        let (line, signal, histogram) = macd(&data, 12, 26, 9);

        assert_eq!(line.len(), 100);
        assert_eq!(signal.len(), 100);
        assert_eq!(histogram.len(), 100);
        for i in 0..100 {
            assert!((histogram[i] - (line[i] - signal[i])).abs() < 1e-10);
        }
    }

    #[test]
    fn test_bollinger_flat_window() {
        let data = vec![10.0; 25];
        let (width, percent_b) = bollinger(&data, 20, 2.0);

        assert!(width[18].is_nan());
        assert!(width[19].abs() < 1e-12);
        assert!((percent_b[19] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_bollinger_percent_b_centered_on_mean() {
        let data: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 9.0 } else { 11.0 }).collect();
        let (_, percent_b) = bollinger(&data, 20, 2.0);

        // Alternating series: price is always one std from a mean of 10,
        // so %B alternates symmetrically around 0.5.
        let a = percent_b[20];
        let b = percent_b[21];
        assert!((a + b - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_volume_ratio_zero_average() {
        let volume = vec![0.0; 10];
        let result = volume_ratio(&volume, 5);

        assert!(result[3].is_nan());
        assert!((result[4] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_close_position_range() {
        let high = vec![12.0, 10.0];
        let low = vec![8.0, 10.0];
        let close = vec![11.0, 10.0];
        let result = close_position(&high, &low, &close);

        assert!((result[0] - 0.75).abs() < 1e-10);
        assert!((result[1] - 0.5).abs() < 1e-10);
    }
}
