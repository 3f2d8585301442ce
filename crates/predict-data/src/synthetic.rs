//! Seeded synthetic price source.
//!
//! Stands in for an exchange feed in tests and demo runs: a geometric
//! random walk with configurable drift, fully determined by its seed.

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use predict_core::{Bar, DataError, DataSource, Interval};

/// Fixed genesis timestamp so generated series are reproducible.
const GENESIS_MS: i64 = 1_500_000_000_000;

/// Synthetic OHLCV source producing a seeded random walk.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    start_price: f64,
    /// Mean per-period return.
    drift: f64,
    /// Half-width of the uniform per-period return noise.
    volatility: f64,
    /// When set, emit exactly this many bars instead of one per
    /// lookback day.
    bar_count: Option<usize>,
}

impl SyntheticSource {
    /// Create a source with neutral drift.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 30_000.0,
            drift: 0.0,
            volatility: 0.02,
            bar_count: None,
        }
    }

    /// A clearly upward-trending series of `bars` bars.
    pub fn trending(seed: u64, bars: usize) -> Self {
        Self {
            seed,
            start_price: 30_000.0,
            drift: 0.004,
            volatility: 0.01,
            bar_count: Some(bars),
        }
    }

    /// Override the per-period drift.
    pub fn with_drift(mut self, drift: f64) -> Self {
        self.drift = drift;
        self
    }

    /// Override the noise half-width.
    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    /// Emit exactly `bars` bars regardless of the requested lookback.
    pub fn with_bar_count(mut self, bars: usize) -> Self {
        self.bar_count = Some(bars);
        self
    }

    fn generate(&self, interval: Interval, n: usize) -> Vec<Bar> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let step = interval.as_millis();
        let mut close = self.start_price;
        let mut bars = Vec::with_capacity(n);

        for i in 0..n {
            let noise = (rng.gen::<f64>() - 0.5) * 2.0 * self.volatility;
            let ret = self.drift + noise;
            let open = close;
            close = (open * (1.0 + ret)).max(f64::MIN_POSITIVE);
            let high = open.max(close) * (1.0 + rng.gen::<f64>() * 0.005);
            let low = open.min(close) * (1.0 - rng.gen::<f64>() * 0.005);
            let volume = 500.0 + rng.gen::<f64>() * 1500.0;
            bars.push(Bar::new(
                GENESIS_MS + i as i64 * step,
                open,
                high,
                low,
                close,
                volume,
            ));
        }

        bars
    }
}

#[async_trait]
impl DataSource for SyntheticSource {
    async fn fetch(
        &self,
        _symbol: &str,
        interval: Interval,
        lookback_days: u32,
    ) -> Result<Vec<Bar>, DataError> {
        let n = self.bar_count.unwrap_or(match interval {
            Interval::Daily => lookback_days as usize,
            Interval::Hourly => lookback_days as usize * 24,
        });
        Ok(self.generate(interval, n))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
