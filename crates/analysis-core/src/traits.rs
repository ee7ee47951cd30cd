use async_trait::async_trait;
use crate::{AnalysisError, PriceSeries};

/// Source of daily price history for a symbol
#[async_trait]
pub trait DailySeriesProvider: Send + Sync {
    async fn daily_series(&self, symbol: &str) -> Result<PriceSeries, AnalysisError>;
}
