//! CSV-backed data source.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use predict_core::{Bar, DataError, DataSource, Interval};

/// CSV record format. Column aliases cover the common export styles.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Historical data source reading OHLCV rows from a CSV file.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    /// Create a source for an existing CSV file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(DataError::Unavailable(format!(
                "no such file: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    fn load(&self, lookback_days: u32) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| DataError::Parse(e.to_string()))?;

        let mut bars = Vec::new();
        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::Parse(e.to_string()))?;
            let timestamp = parse_timestamp(&record.date)?;
            bars.push(Bar::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            ));
        }

        bars.sort_by_key(|b| b.timestamp);

        // Keep only the requested trailing window.
        if let Some(last) = bars.last() {
            let cutoff = last.timestamp - lookback_days as i64 * 86_400_000;
            bars.retain(|b| b.timestamp >= cutoff);
        }

        Ok(bars)
    }
}

#[async_trait]
impl DataSource for CsvSource {
    async fn fetch(
        &self,
        _symbol: &str,
        _interval: Interval,
        lookback_days: u32,
    ) -> Result<Vec<Bar>, DataError> {
        self.load(lookback_days)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Parse a date cell: ISO date/datetime or a Unix timestamp.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        let dt = d.and_hms_opt(0, 0, 0).ok_or_else(|| {
            DataError::Parse(format!("invalid date: {}", date_str))
        })?;
        return Ok(dt.and_utc().timestamp_millis());
    }
    if let Ok(ts) = date_str.parse::<i64>() {
        // Heuristic: more than 10 digits means milliseconds.
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }
    Err(DataError::Parse(format!(
        "could not parse date: {}",
        date_str
    )))
}
