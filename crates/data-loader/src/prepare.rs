use analysis_core::{AnalysisError, CombinedTable, PriceSeries};
use corporate_actions::SplitTable;
use std::collections::HashMap;

use crate::cleaning::{load_price_file, save_price_file};
use crate::combined::{load_combined_file, save_combined_file};
use crate::config::LoaderConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSymbol {
    pub symbol: String,
    pub rows: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepareSummary {
    pub symbols: Vec<PreparedSymbol>,
    pub missing: Vec<String>,
    pub combined_rows: usize,
}

/// Cleans every configured file in place and writes the combined file.
///
/// Daily files keep raw prices. With `splits`, the rescaled series goes to
/// each symbol's adjusted file and into the combined file; without, any
/// stale adjusted file is removed. Symbols without a file on disk are
/// reported, not fatal.
pub fn prepare(
    config: &LoaderConfig,
    splits: Option<&SplitTable>,
) -> Result<PrepareSummary, AnalysisError> {
    let mut summary = PrepareSummary::default();
    let mut cleaned: Vec<PriceSeries> = Vec::with_capacity(config.sources.len());

    for source in &config.sources {
        if !source.path.exists() {
            tracing::warn!("{}: {} not found, skipping", source.symbol, source.path.display());
            summary.missing.push(source.symbol.clone());
            continue;
        }

        let loaded = load_price_file(&source.path, &source.symbol)?;
        let dropped = loaded.dropped();
        save_price_file(&source.path, &loaded.series)?;

        let adjusted_path = source.adjusted_path();
        let series = match splits {
            Some(table) => {
                let adjusted = table.adjust_series(&loaded.series);
                save_price_file(&adjusted_path, &adjusted)?;
                adjusted
            }
            None => {
                if adjusted_path.exists() {
                    std::fs::remove_file(&adjusted_path)?;
                }
                loaded.series
            }
        };

        summary.symbols.push(PreparedSymbol {
            symbol: source.symbol.clone(),
            rows: series.len(),
            dropped,
        });
        cleaned.push(series);
    }

    if cleaned.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "no price files found under {}",
            config.data_dir.display()
        )));
    }

    let combined = CombinedTable::outer_join(&cleaned);
    save_combined_file(&config.combined_path(), &combined)?;
    summary.combined_rows = combined.len();

    tracing::info!(
        "combined {} symbols into {} rows at {}",
        cleaned.len(),
        combined.len(),
        config.combined_path().display()
    );
    Ok(summary)
}

/// Per-symbol series keyed by uppercase symbol, plus the combined table.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub series: HashMap<String, PriceSeries>,
    pub combined: CombinedTable,
}

impl Dataset {
    pub fn available_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

/// Loads what `compare` needs, preferring a symbol's adjusted file when
/// one exists. Missing per-symbol files are skipped; a missing combined
/// file is an error.
pub fn load_dataset(config: &LoaderConfig) -> Result<Dataset, AnalysisError> {
    let mut series = HashMap::new();
    for source in &config.sources {
        let adjusted_path = source.adjusted_path();
        let path = if adjusted_path.exists() { adjusted_path } else { source.path.clone() };

        match load_price_file(&path, &source.symbol) {
            Ok(cleaned) => {
                series.insert(source.symbol.clone(), cleaned.series);
            }
            Err(AnalysisError::Io(e)) => {
                tracing::warn!("{}: cannot read {}: {}", source.symbol, path.display(), e);
            }
            Err(e) => return Err(e),
        }
    }

    let combined = load_combined_file(&config.combined_path())?;
    Ok(Dataset { series, combined })
}
