//! Download stage: fetch, validate and split historical price data.

mod csv_source;
mod synthetic;
mod validate;

pub use csv_source::CsvSource;
pub use synthetic::SyntheticSource;
pub use validate::validate_bars;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use predict_core::{DataError, DataSource, Interval, MarketDataset, PipelineError};

const DAYS_PER_YEAR: u32 = 365;

/// Parameters of one download-stage invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadRequest {
    pub symbol: String,
    /// How far back to fetch, in calendar days.
    pub lookback_days: u32,
    /// Years of history assigned to the training range.
    pub train_years: u32,
    /// Years of history assigned to the test range.
    pub test_years: u32,
}

impl Default for DownloadRequest {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            lookback_days: 1825,
            train_years: 4,
            test_years: 1,
        }
    }
}

/// Success payload of the download stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSummary {
    pub total_records: usize,
    pub train_records: usize,
    pub test_records: usize,
}

/// Download-stage tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Sampling interval expected from the source.
    pub interval: Interval,
    /// A gap larger than this multiple of the interval fails validation.
    pub max_gap_factor: i64,
    /// Fetch timeout in seconds; an elapsed timeout is `DataUnavailable`.
    pub fetch_timeout_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            interval: Interval::Daily,
            max_gap_factor: 3,
            fetch_timeout_secs: 30,
        }
    }
}

/// Fetch, validate and split a historical window.
///
/// Fails with `Config` when the requested train/test years cannot fit
/// in `lookback_days`, and with a `Data` error when the source returns
/// nothing, something malformed, or does not answer in time.
pub async fn download(
    source: &dyn DataSource,
    config: &DataConfig,
    request: &DownloadRequest,
) -> Result<(MarketDataset, DownloadSummary), PipelineError> {
    if request.lookback_days == 0 || request.train_years == 0 {
        return Err(PipelineError::Config(
            "lookback_days and train_years must be positive".to_string(),
        ));
    }
    let requested_days = (request.train_years + request.test_years) * DAYS_PER_YEAR;
    if requested_days > request.lookback_days {
        return Err(PipelineError::Config(format!(
            "train_years + test_years spans {} days but lookback_days is {}",
            requested_days, request.lookback_days
        )));
    }

    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    let fetch = source.fetch(&request.symbol, config.interval, request.lookback_days);
    let bars = tokio::time::timeout(timeout, fetch)
        .await
        .map_err(|_| DataError::Timeout {
            timeout_secs: config.fetch_timeout_secs,
        })??;

    validate_bars(&bars, config.interval, config.max_gap_factor)?;

    let split = split_index(
        &bars.iter().map(|b| b.timestamp).collect::<Vec<_>>(),
        request.train_years,
        request.test_years,
    );

    let summary = DownloadSummary {
        total_records: bars.len(),
        train_records: split,
        test_records: bars.len() - split,
    };
    info!(
        symbol = %request.symbol,
        source = source.name(),
        total = summary.total_records,
        train = summary.train_records,
        test = summary.test_records,
        "downloaded dataset"
    );

    let dataset = MarketDataset::new(request.symbol.clone(), config.interval, bars, split);
    Ok((dataset, summary))
}

/// Split boundary: the cutoff timestamp sits at the
/// `train / (train + test)` fraction of the fetched time span, so the
/// test range covers the trailing `test_years` share of the window.
fn split_index(timestamps: &[i64], train_years: u32, test_years: u32) -> usize {
    if timestamps.is_empty() || test_years == 0 {
        return timestamps.len();
    }
    let first = timestamps[0];
    let last = timestamps[timestamps.len() - 1];
    let span = (last - first) as f64;
    let fraction = train_years as f64 / (train_years + test_years) as f64;
    let cutoff = first + (span * fraction) as i64;
    timestamps.partition_point(|&ts| ts <= cutoff)
}
