//! Dataset validation for the download stage.

use predict_core::{Bar, DataError, Interval};

/// Validate a fetched bar sequence: non-empty, well-formed prices,
/// strictly increasing timestamps, and no gap larger than
/// `max_gap_factor` sampling intervals.
pub fn validate_bars(
    bars: &[Bar],
    interval: Interval,
    max_gap_factor: i64,
) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::Unavailable(
            "source returned no records".to_string(),
        ));
    }

    let max_gap = interval.as_millis() * max_gap_factor;

    for (index, bar) in bars.iter().enumerate() {
        if !bar.is_well_formed() {
            return Err(DataError::MalformedRecord {
                index,
                reason: "non-positive or non-finite price".to_string(),
            });
        }
        if index > 0 {
            let prev = bars[index - 1].timestamp;
            if bar.timestamp <= prev {
                return Err(DataError::OutOfOrder { index });
            }
            let gap = bar.timestamp - prev;
            if gap > max_gap {
                return Err(DataError::Gap {
                    index,
                    gap_millis: gap,
                    max_millis: max_gap,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn daily_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let p = 100.0 + i as f64;
                Bar::new(i as i64 * DAY_MS, p, p + 1.0, p - 1.0, p + 0.5, 10.0)
            })
            .collect()
    }

    #[test]
    fn test_accepts_clean_series() {
        let bars = daily_bars(30);
        assert!(validate_bars(&bars, Interval::Daily, 3).is_ok());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            validate_bars(&[], Interval::Daily, 3),
            Err(DataError::Unavailable(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_timestamp() {
        let mut bars = daily_bars(10);
        bars[5].timestamp = bars[4].timestamp;
        assert!(matches!(
            validate_bars(&bars, Interval::Daily, 3),
            Err(DataError::OutOfOrder { index: 5 })
        ));
    }

    #[test]
    fn test_rejects_wide_gap() {
        let mut bars = daily_bars(10);
        for bar in bars.iter_mut().skip(5) {
            bar.timestamp += 4 * DAY_MS;
        }
        assert!(matches!(
            validate_bars(&bars, Interval::Daily, 3),
            Err(DataError::Gap { index: 5, .. })
        ));
    }

    #[test]
    fn test_allows_small_gap() {
        let mut bars = daily_bars(10);
        // One missing day, within the factor-3 bound
        for bar in bars.iter_mut().skip(5) {
            bar.timestamp += DAY_MS;
        }
        assert!(validate_bars(&bars, Interval::Daily, 3).is_ok());
    }

    #[test]
    fn test_rejects_malformed_price() {
        let mut bars = daily_bars(10);
        bars[3].close = 0.0;
        assert!(matches!(
            validate_bars(&bars, Interval::Daily, 3),
            Err(DataError::MalformedRecord { index: 3, .. })
        ));
    }
}
