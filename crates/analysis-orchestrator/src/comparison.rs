use analysis_core::{AnalysisError, ColumnKey, CombinedTable, PriceSeries};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::metrics::{compute_metrics, Metric, MetricSnapshot, MetricsConfig};

/// Where beta's benchmark prices come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenchmarkSource {
    /// Each symbol's own column in the combined table
    #[default]
    OwnColumn,
    /// One symbol's column used for both sides (e.g. an index ETF)
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCell {
    pub metric: Metric,
    pub value: Option<f64>,
    /// Set on the winning side of this metric
    pub best: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub symbol: String,
    pub cells: Vec<MetricCell>,
    pub points: u32,
}

impl ComparisonRow {
    pub fn cell(&self, metric: Metric) -> Option<&MetricCell> {
        self.cells.iter().find(|c| c.metric == metric)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub metrics: Vec<Metric>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonResult {
    pub fn row(&self, symbol: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Symbol that won `metric`, if anyone did.
    pub fn winner(&self, metric: Metric) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.cell(metric).map_or(false, |c| c.best))
            .map(|r| r.symbol.as_str())
    }

    pub fn total_points(&self) -> u32 {
        self.rows.iter().map(|r| r.points).sum()
    }

    /// Symbol with the most points; `None` on a draw.
    pub fn overall_winner(&self) -> Option<&str> {
        let [a, b] = self.rows.as_slice() else {
            return None;
        };
        match a.points.cmp(&b.points) {
            std::cmp::Ordering::Greater => Some(&a.symbol),
            std::cmp::Ordering::Less => Some(&b.symbol),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Index of the better side (0 = first, 1 = second).
///
/// A defined value beats an undefined one; ties go to the first symbol.
fn pick_winner(metric: Metric, a: Option<f64>, b: Option<f64>) -> Option<usize> {
    match (a, b) {
        (Some(x), Some(y)) => {
            let second_better = if metric.lower_is_better() { y < x } else { y > x };
            Some(if second_better { 1 } else { 0 })
        }
        (Some(_), None) => Some(0),
        (None, Some(_)) => Some(1),
        (None, None) => None,
    }
}

fn find_series<'a>(
    symbol: &str,
    series: &'a HashMap<String, PriceSeries>,
) -> Result<&'a PriceSeries, AnalysisError> {
    series
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(symbol))
        .map(|(_, s)| s)
        .ok_or_else(|| AnalysisError::UnknownSymbol(symbol.to_uppercase()))
}

fn benchmark_column(
    symbol: &str,
    source: &BenchmarkSource,
    table: &CombinedTable,
    config: &MetricsConfig,
) -> Result<ColumnKey, AnalysisError> {
    let key = match source {
        BenchmarkSource::OwnColumn => ColumnKey::new(symbol, config.field),
        BenchmarkSource::Symbol(benchmark) => ColumnKey::new(benchmark, config.field),
    };

    if !table.has_column(&key) {
        return Err(AnalysisError::UnknownSymbol(format!(
            "no '{}' column in combined table",
            key.header()
        )));
    }
    Ok(key)
}

/// Scores two symbols on every [`Metric`].
///
/// Both symbols must be present in `series` and have a benchmark column in
/// `table`; otherwise nothing is computed and `UnknownSymbol` is returned.
pub fn compare(
    symbol_a: &str,
    symbol_b: &str,
    series: &HashMap<String, PriceSeries>,
    table: &CombinedTable,
    benchmark: &BenchmarkSource,
    config: &MetricsConfig,
) -> Result<ComparisonResult, AnalysisError> {
    if symbol_a.eq_ignore_ascii_case(symbol_b) {
        return Err(AnalysisError::InvalidData(format!(
            "cannot compare {} with itself",
            symbol_a.to_uppercase()
        )));
    }

    let series_a = find_series(symbol_a, series)?;
    let series_b = find_series(symbol_b, series)?;
    let key_a = benchmark_column(symbol_a, benchmark, table, config)?;
    let key_b = benchmark_column(symbol_b, benchmark, table, config)?;

    let snapshots: [MetricSnapshot; 2] = [
        compute_metrics(series_a, &table.column(&key_a), config),
        compute_metrics(series_b, &table.column(&key_b), config),
    ];

    let mut rows: Vec<ComparisonRow> = [symbol_a, symbol_b]
        .iter()
        .map(|s| ComparisonRow {
            symbol: s.to_uppercase(),
            cells: Vec::with_capacity(Metric::ALL.len()),
            points: 0,
        })
        .collect();

    for metric in Metric::ALL {
        let values = [snapshots[0].get(metric), snapshots[1].get(metric)];
        let winner = pick_winner(metric, values[0], values[1]);

        match winner {
            Some(w) => rows[w].points += 1,
            None => tracing::warn!("{} undefined for both symbols, no point awarded", metric),
        }

        for (i, row) in rows.iter_mut().enumerate() {
            row.cells.push(MetricCell {
                metric,
                value: values[i],
                best: winner == Some(i),
            });
        }
    }

    tracing::debug!(
        "{} {} pts vs {} {} pts",
        rows[0].symbol,
        rows[0].points,
        rows[1].symbol,
        rows[1].points
    );

    Ok(ComparisonResult {
        metrics: Metric::ALL.to_vec(),
        rows,
    })
}
