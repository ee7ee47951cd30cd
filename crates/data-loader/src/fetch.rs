use alpha_vantage_client::{AlphaVantageClient, CompanyOverview};
use analysis_core::{AnalysisError, DailySeriesProvider};
use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::cleaning::{csv_error, filter_date_range, save_price_file};
use crate::config::LoaderConfig;

/// Source of company fundamentals, alongside [`DailySeriesProvider`].
#[async_trait]
pub trait OverviewProvider: Send + Sync {
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, AnalysisError>;
}

#[async_trait]
impl OverviewProvider for AlphaVantageClient {
    async fn company_overview(&self, symbol: &str) -> Result<CompanyOverview, AnalysisError> {
        self.get_company_overview(symbol).await
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FetchSummary {
    pub fetched: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub rows_written: usize,
    pub overviews_written: usize,
}

/// Writes a one-row CSV with a header of Alpha Vantage field names.
pub fn write_overview_csv<W: Write>(
    writer: W,
    overview: &CompanyOverview,
) -> Result<(), AnalysisError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.serialize(overview).map_err(csv_error)?;
    csv_writer.flush()?;
    Ok(())
}

fn save_overview_file(path: &Path, overview: &CompanyOverview) -> Result<(), AnalysisError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_overview_csv(File::create(path)?, overview)
}

/// Fetches every configured symbol one after another.
///
/// A symbol whose daily series fails (unknown ticker, throttling, network)
/// or has no bars inside the fetch window is logged and skipped, leaving its
/// existing file untouched; local file errors abort the run. A failed
/// overview does not fail the symbol.
pub async fn fetch_all<P>(
    provider: &P,
    config: &LoaderConfig,
    with_overview: bool,
) -> Result<FetchSummary, AnalysisError>
where
    P: DailySeriesProvider + OverviewProvider,
{
    let mut summary = FetchSummary::default();
    let total = config.sources.len();

    for (i, source) in config.sources.iter().enumerate() {
        let series = match provider.daily_series(&source.symbol).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!("[{}/{}] {} failed: {}", i + 1, total, source.symbol, e);
                summary.failed.push((source.symbol.clone(), e.to_string()));
                continue;
            }
        };

        let window = filter_date_range(&series, config.fetch_start, config.fetch_end);
        if window.is_empty() {
            // keep whatever is already on disk
            let reason = format!(
                "no bars between {} and {} ({} fetched)",
                config.fetch_start,
                config.fetch_end,
                series.len()
            );
            tracing::warn!("[{}/{}] {}: {}", i + 1, total, source.symbol, reason);
            summary.failed.push((source.symbol.clone(), reason));
            continue;
        }
        save_price_file(&source.path, &window)?;
        summary.rows_written += window.len();

        if with_overview {
            match provider.company_overview(&source.symbol).await {
                Ok(overview) => {
                    save_overview_file(&source.overview_path(), &overview)?;
                    summary.overviews_written += 1;
                }
                Err(e) => tracing::warn!("{}: overview unavailable: {}", source.symbol, e),
            }
        }

        tracing::info!(
            "[{}/{}] {} => {} rows -> {}",
            i + 1,
            total,
            source.symbol,
            window.len(),
            source.path.display()
        );
        summary.fetched.push(source.symbol.clone());
    }

    Ok(summary)
}
