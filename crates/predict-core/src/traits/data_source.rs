//! Data source trait definition.

use crate::error::DataError;
use crate::types::{Bar, Interval};
use async_trait::async_trait;

/// Trait for historical market data sources.
///
/// The download stage awaits one fetch per invocation under a
/// caller-supplied timeout; implementations must not block without
/// bound. Bars are returned oldest-first and are validated by the
/// download stage, not by the source.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch up to `lookback_days` worth of history for a symbol.
    async fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        lookback_days: u32,
    ) -> Result<Vec<Bar>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
