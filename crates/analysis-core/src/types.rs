use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// Daily OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn get(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
        }
    }

    fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Numeric column of a price series. Lowercase names are the file column names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
}

impl PriceField {
    pub const ALL: [PriceField; 5] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::Volume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceField {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "volume" => Ok(PriceField::Volume),
            other => Err(AnalysisError::Parse(format!("unknown price field '{}'", other))),
        }
    }
}

/// Date-ordered daily bars for one symbol.
///
/// Dates are strictly increasing and every numeric field is finite and
/// non-negative; [`PriceSeries::new`] rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, AnalysisError> {
        let symbol = symbol.into();

        if let Some(bad) = bars.iter().find(|b| !b.is_well_formed()) {
            return Err(AnalysisError::InvalidData(format!(
                "{}: negative or non-finite value on {}",
                symbol, bad.date
            )));
        }

        if let Some(w) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(AnalysisError::InvalidData(format!(
                "{}: dates not strictly increasing ({} then {})",
                symbol, w[0].date, w[1].date
            )));
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Values of one field in date order.
    pub fn column(&self, field: PriceField) -> Vec<f64> {
        self.bars.iter().map(|b| b.get(field)).collect()
    }

    /// `(date, value)` pairs of one field in date order.
    pub fn dated_column(&self, field: PriceField) -> Vec<(NaiveDate, f64)> {
        self.bars.iter().map(|b| (b.date, b.get(field))).collect()
    }

    pub fn bar_on(&self, date: NaiveDate) -> Option<&Bar> {
        self.bars
            .binary_search_by(|b| b.date.cmp(&date))
            .ok()
            .map(|i| &self.bars[i])
    }

    /// Bars with `start <= date <= end`. Either bound may be open.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> PriceSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| start.map_or(true, |s| b.date >= s))
            .filter(|b| end.map_or(true, |e| b.date <= e))
            .copied()
            .collect();

        PriceSeries {
            symbol: self.symbol.clone(),
            bars,
        }
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

/// Column identity in the combined wide table: a field of one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    pub symbol: String,
    pub field: PriceField,
}

impl ColumnKey {
    /// Symbols are stored lowercase, matching the `<field> (<symbol>)` headers.
    pub fn new(symbol: &str, field: PriceField) -> Self {
        Self {
            symbol: symbol.trim().to_lowercase(),
            field,
        }
    }

    pub fn header(&self) -> String {
        format!("{} ({})", self.field, self.symbol)
    }

    /// Parses a header of the form `close (amzn)`.
    pub fn parse_header(header: &str) -> Option<Self> {
        let header = header.trim();
        let open = header.find('(')?;
        let inner = header[open + 1..].strip_suffix(')')?;
        let field = header[..open].parse::<PriceField>().ok()?;
        if inner.trim().is_empty() {
            return None;
        }
        Some(Self::new(inner, field))
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header())
    }
}

/// Wide table keyed by date, one column per (symbol, field).
///
/// Built by outer-joining price series on date, so a row may be missing
/// cells for symbols that did not trade that day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedTable {
    columns: Vec<ColumnKey>,
    rows: BTreeMap<NaiveDate, HashMap<ColumnKey, f64>>,
}

impl CombinedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outer join on date. Columns follow the series order, then field order.
    pub fn outer_join<'a, I>(series: I) -> Self
    where
        I: IntoIterator<Item = &'a PriceSeries>,
    {
        let mut table = Self::new();
        for s in series {
            for field in PriceField::ALL {
                table.add_column(ColumnKey::new(s.symbol(), field));
            }
            for bar in s.bars() {
                for field in PriceField::ALL {
                    table.insert(bar.date, ColumnKey::new(s.symbol(), field), bar.get(field));
                }
            }
        }
        table
    }

    pub fn add_column(&mut self, key: ColumnKey) {
        if !self.columns.contains(&key) {
            self.columns.push(key);
        }
    }

    pub fn insert(&mut self, date: NaiveDate, key: ColumnKey, value: f64) {
        self.add_column(key.clone());
        self.rows.entry(date).or_default().insert(key, value);
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn has_column(&self, key: &ColumnKey) -> bool {
        self.columns.contains(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.rows.keys()
    }

    pub fn get(&self, date: NaiveDate, key: &ColumnKey) -> Option<f64> {
        self.rows.get(&date).and_then(|row| row.get(key)).copied()
    }

    /// Present values of one column in date order; missing cells are skipped.
    pub fn column(&self, key: &ColumnKey) -> Vec<(NaiveDate, f64)> {
        self.rows
            .iter()
            .filter_map(|(date, row)| row.get(key).map(|v| (*date, *v)))
            .collect()
    }

    /// Rows in date order as `(date, cells aligned with columns())`.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, Vec<Option<f64>>)> + '_ {
        self.rows.iter().map(move |(date, row)| {
            let cells = self.columns.iter().map(|c| row.get(c).copied()).collect();
            (*date, cells)
        })
    }
}
