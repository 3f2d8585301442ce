//! Sampling interval for market data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling interval of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// Hourly bars
    #[serde(rename = "1h")]
    Hourly,
    /// Daily bars
    #[serde(rename = "1d")]
    #[default]
    Daily,
}

impl Interval {
    /// Duration of one interval in milliseconds.
    pub fn as_millis(&self) -> i64 {
        match self {
            Interval::Hourly => 3_600_000,
            Interval::Daily => 86_400_000,
        }
    }

    /// Number of periods in a calendar year, used to annualize the
    /// Sharpe ratio. Crypto trades every day, so daily bars annualize
    /// with 365 rather than the 252 used for equities.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Interval::Hourly => 365.0 * 24.0,
            Interval::Daily => 365.0,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Hourly => write!(f, "1h"),
            Interval::Daily => write!(f, "1d"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annualization() {
        assert_eq!(Interval::Daily.periods_per_year(), 365.0);
        assert_eq!(Interval::Hourly.periods_per_year(), 8760.0);
    }

    #[test]
    fn test_millis() {
        assert_eq!(Interval::Daily.as_millis(), 86_400_000);
    }
}
