//! OHLCV bar type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compact OHLCV bar. Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Check that all prices are positive finite reals and the range is consistent.
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
            && self.high >= self.low
    }

    /// Calculate the bar's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Check if the bar is bullish (close > open).
    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed() {
        let bar = Bar::new(1000, 100.0, 110.0, 95.0, 105.0, 1000.0);
        assert!(bar.is_well_formed());
        assert!((bar.range() - 15.0).abs() < 0.001);
        assert!(bar.is_bullish());
    }

    #[test]
    fn test_malformed_bars() {
        // Negative price
        assert!(!Bar::new(1000, -1.0, 110.0, 95.0, 105.0, 0.0).is_well_formed());
        // NaN close
        assert!(!Bar::new(1000, 100.0, 110.0, 95.0, f64::NAN, 0.0).is_well_formed());
        // High below low
        assert!(!Bar::new(1000, 100.0, 90.0, 95.0, 92.0, 0.0).is_well_formed());
    }
}
