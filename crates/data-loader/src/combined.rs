//! The combined wide file: `date,<field> (<symbol>),...` with empty cells
//! where a symbol has no bar for that date.

use analysis_core::{AnalysisError, ColumnKey, CombinedTable};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::cleaning::csv_error;

pub fn write_combined_csv<W: Write>(writer: W, table: &CombinedTable) -> Result<(), AnalysisError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["date".to_string()];
    header.extend(table.columns().iter().map(|c| c.header()));
    csv_writer.write_record(&header).map_err(csv_error)?;

    for (date, cells) in table.rows() {
        let mut record = Vec::with_capacity(cells.len() + 1);
        record.push(date.format("%Y-%m-%d").to_string());
        record.extend(cells.iter().map(|c| c.map(|v| v.to_string()).unwrap_or_default()));
        csv_writer.write_record(&record).map_err(csv_error)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Reads a combined file. Columns whose header is not `<field> (<symbol>)`
/// are ignored, as are rows with an unparseable date.
pub fn read_combined_csv<R: Read>(reader: R) -> Result<CombinedTable, AnalysisError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(csv_error)?.clone();
    let columns: Vec<Option<ColumnKey>> = headers
        .iter()
        .skip(1)
        .map(|h| {
            let key = ColumnKey::parse_header(h);
            if key.is_none() {
                tracing::warn!("ignoring combined column '{}'", h);
            }
            key
        })
        .collect();

    let mut table = CombinedTable::new();
    for key in columns.iter().flatten() {
        table.add_column(key.clone());
    }

    for record in csv_reader.records() {
        let record = record.map_err(csv_error)?;
        let Some(date) = record
            .get(0)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        else {
            tracing::debug!("skipping combined row {:?}", record);
            continue;
        };

        for (cell, key) in record.iter().skip(1).zip(&columns) {
            let (Some(key), Ok(value)) = (key, cell.trim().parse::<f64>()) else {
                continue;
            };
            if value.is_finite() {
                table.insert(date, key.clone(), value);
            }
        }
    }

    Ok(table)
}

pub fn load_combined_file(path: &Path) -> Result<CombinedTable, AnalysisError> {
    read_combined_csv(File::open(path)?)
}

pub fn save_combined_file(path: &Path, table: &CombinedTable) -> Result<(), AnalysisError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_combined_csv(File::create(path)?, table)
}
