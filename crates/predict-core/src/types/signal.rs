//! Trade signal derived from model confidence.

use serde::{Deserialize, Serialize};

/// Position taken for one test period.
///
/// The simulated strategy is single-position and long-only: `Long`
/// earns the next period's realized return, `Flat` earns zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSignal {
    Long,
    Flat,
}

impl TradeSignal {
    /// Derive a signal from a model confidence score and a threshold.
    pub fn from_confidence(confidence: f64, threshold: f64) -> Self {
        if confidence >= threshold {
            TradeSignal::Long
        } else {
            TradeSignal::Flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(
            TradeSignal::from_confidence(0.5, 0.5),
            TradeSignal::Long
        );
        assert_eq!(
            TradeSignal::from_confidence(0.4999, 0.5),
            TradeSignal::Flat
        );
    }
}
