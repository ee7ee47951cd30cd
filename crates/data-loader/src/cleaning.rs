//! Per-symbol price files: headerless `date,open,high,low,close,volume` rows.

use analysis_core::{AnalysisError, Bar, PriceSeries};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// A series read from disk plus what was thrown away on the way in.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSeries {
    pub series: PriceSeries,
    /// Rows with an unparseable date or number (including a header row)
    pub malformed: usize,
    /// Later rows repeating an already-seen date
    pub duplicates: usize,
    /// Rows with a negative or non-finite value
    pub invalid: usize,
}

impl CleanedSeries {
    pub fn dropped(&self) -> usize {
        self.malformed + self.duplicates + self.invalid
    }
}

pub(crate) fn csv_error(e: csv::Error) -> AnalysisError {
    AnalysisError::Csv(e.to_string())
}

fn parse_row_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok().map(|dt| dt.date()))
}

fn parse_row(record: &csv::StringRecord) -> Option<Bar> {
    if record.len() < 6 {
        return None;
    }
    let date = parse_row_date(record.get(0)?)?;
    let mut values = [0.0f64; 5];
    for (i, slot) in values.iter_mut().enumerate() {
        *slot = record.get(i + 1)?.trim().parse().ok()?;
    }
    let [open, high, low, close, volume] = values;

    Some(Bar { date, open, high, low, close, volume })
}

/// Reads and cleans one per-symbol file.
///
/// Rows are sorted by date; on duplicate dates the row that appeared first
/// in the file wins.
pub fn read_price_csv<R: Read>(reader: R, symbol: &str) -> Result<CleanedSeries, AnalysisError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    let mut malformed = 0;
    let mut invalid = 0;

    for record in csv_reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(csv_error(e)),
            Err(_) => {
                malformed += 1;
                continue;
            }
        };

        // blank lines come through as a single empty field
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        match parse_row(&record) {
            Some(bar) => {
                let values = [bar.open, bar.high, bar.low, bar.close, bar.volume];
                if values.iter().all(|v| v.is_finite() && *v >= 0.0) {
                    bars.push(bar);
                } else {
                    invalid += 1;
                }
            }
            None => {
                tracing::debug!("{}: dropping malformed row {:?}", symbol, record);
                malformed += 1;
            }
        }
    }

    // stable, so the first row per date survives the dedup
    bars.sort_by_key(|b| b.date);
    let before = bars.len();
    bars.dedup_by_key(|b| b.date);
    let duplicates = before - bars.len();

    let series = PriceSeries::new(symbol.trim().to_uppercase(), bars)?;
    if malformed + duplicates + invalid > 0 {
        tracing::info!(
            "{}: kept {} rows, dropped {} malformed, {} duplicate, {} invalid",
            series.symbol(),
            series.len(),
            malformed,
            duplicates,
            invalid
        );
    }

    Ok(CleanedSeries { series, malformed, duplicates, invalid })
}

pub fn write_price_csv<W: Write>(writer: W, series: &PriceSeries) -> Result<(), AnalysisError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    for bar in series.bars() {
        csv_writer
            .write_record([
                bar.date.format("%Y-%m-%d").to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ])
            .map_err(csv_error)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn load_price_file(path: &Path, symbol: &str) -> Result<CleanedSeries, AnalysisError> {
    let file = File::open(path)?;
    read_price_csv(file, symbol)
}

pub fn save_price_file(path: &Path, series: &PriceSeries) -> Result<(), AnalysisError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_price_csv(File::create(path)?, series)
}

/// Bars with `start <= date <= end`.
pub fn filter_date_range(series: &PriceSeries, start: NaiveDate, end: NaiveDate) -> PriceSeries {
    series.between(Some(start), Some(end))
}
