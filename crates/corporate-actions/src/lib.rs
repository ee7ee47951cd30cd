//! Stock split normalisation.
//!
//! Raw daily prices from the data API are not split-adjusted, so a 20:1 split
//! shows up as a 95% overnight drop. A [`SplitTable`] lists known splits per
//! ticker and rescales historical prices to today's share count: a price on
//! `trade_date` is divided by the product of the ratios of every split whose
//! effective date is strictly after `trade_date`.

use analysis_core::{Bar, PriceSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// One split: from `date` on, each old share became `ratio` shares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitEvent {
    pub date: NaiveDate,
    pub ratio: f64,
}

impl SplitEvent {
    pub fn new(date: NaiveDate, ratio: f64) -> Self {
        Self { date, ratio }
    }
}

/// Splits keyed by uppercase ticker, each list sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, Vec<SplitEvent>>", into = "HashMap<String, Vec<SplitEvent>>")]
pub struct SplitTable {
    splits: HashMap<String, Vec<SplitEvent>>,
}

impl From<HashMap<String, Vec<SplitEvent>>> for SplitTable {
    fn from(map: HashMap<String, Vec<SplitEvent>>) -> Self {
        map.into_iter()
            .flat_map(|(ticker, events)| events.into_iter().map(move |e| (ticker.clone(), e)))
            .fold(SplitTable::new(), |table, (ticker, e)| {
                table.with_split(&ticker, e.date, e.ratio)
            })
    }
}

impl From<SplitTable> for HashMap<String, Vec<SplitEvent>> {
    fn from(table: SplitTable) -> Self {
        table.splits
    }
}

impl SplitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits for the tracked equities between 12/2019 and 11/2024.
    /// ORCL and META did not split in that period.
    pub fn builtin() -> Self {
        Self::new()
            .with_split("AMZN", ymd(2022, 6, 6), 20.0)
            .with_split("GOOG", ymd(2022, 7, 18), 20.0)
            .with_split("NVDA", ymd(2021, 7, 20), 4.0)
            .with_split("NVDA", ymd(2024, 6, 10), 10.0)
            .with_split("TSLA", ymd(2020, 8, 31), 5.0)
            .with_split("TSLA", ymd(2022, 8, 25), 3.0)
    }

    pub fn from_events<I, S>(events: I) -> Self
    where
        I: IntoIterator<Item = (S, SplitEvent)>,
        S: AsRef<str>,
    {
        events
            .into_iter()
            .fold(Self::new(), |table, (ticker, e)| {
                table.with_split(ticker.as_ref(), e.date, e.ratio)
            })
    }

    /// Adds a split. Non-positive or non-finite ratios are ignored.
    pub fn with_split(mut self, ticker: &str, date: NaiveDate, ratio: f64) -> Self {
        if !ratio.is_finite() || ratio <= 0.0 {
            return self;
        }
        let events = self.splits.entry(normalize(ticker)).or_default();
        events.push(SplitEvent::new(date, ratio));
        events.sort_by(|a, b| a.date.cmp(&b.date));
        self
    }

    /// Splits for `ticker` in date order (empty for unknown tickers).
    pub fn events(&self, ticker: &str) -> &[SplitEvent] {
        self.splits
            .get(&normalize(ticker))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn last_split_date(&self, ticker: &str) -> Option<NaiveDate> {
        self.events(ticker).last().map(|e| e.date)
    }

    /// Product of the ratios of all splits strictly after `trade_date`.
    /// A trade on the split date itself already reflects that split.
    pub fn cumulative_factor(&self, ticker: &str, trade_date: NaiveDate) -> f64 {
        self.events(ticker)
            .iter()
            .filter(|e| trade_date < e.date)
            .map(|e| e.ratio)
            .product()
    }

    pub fn adjust_price(&self, ticker: &str, trade_date: NaiveDate, price: f64) -> f64 {
        price / self.cumulative_factor(ticker, trade_date)
    }

    /// Rescales a whole series: prices are divided by the split factor and
    /// volume multiplied by it.
    pub fn adjust_series(&self, series: &PriceSeries) -> PriceSeries {
        let bars: Vec<Bar> = series
            .bars()
            .iter()
            .map(|bar| {
                let factor = self.cumulative_factor(series.symbol(), bar.date);
                Bar {
                    date: bar.date,
                    open: bar.open / factor,
                    high: bar.high / factor,
                    low: bar.low / factor,
                    close: bar.close / factor,
                    volume: bar.volume * factor,
                }
            })
            .collect();

        // factors are positive, so the rescaled bars stay valid
        PriceSeries::new(series.symbol(), bars).unwrap_or_else(|_| series.clone())
    }
}

fn normalize(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn builtin_table() -> &'static SplitTable {
    static TABLE: OnceLock<SplitTable> = OnceLock::new();
    TABLE.get_or_init(SplitTable::builtin)
}

/// Split-adjusted price using the built-in split table.
///
/// Ticker is case-insensitive; unknown tickers pass through unchanged.
pub fn adjust_for_splits(ticker: &str, trade_date: NaiveDate, price: f64) -> f64 {
    builtin_table().adjust_price(ticker, trade_date, price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::PriceField;
    use approx::assert_relative_eq;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_amzn_before_and_on_split_date() {
        assert_relative_eq!(adjust_for_splits("AMZN", d("2022-06-05"), 100.0), 5.0);
        assert_relative_eq!(adjust_for_splits("AMZN", d("2022-06-06"), 100.0), 100.0);
    }

    #[test]
    fn test_ticker_is_case_insensitive() {
        assert_relative_eq!(adjust_for_splits("goog", d("2021-01-04"), 1800.0), 90.0);
        assert_relative_eq!(adjust_for_splits(" Goog ", d("2021-01-04"), 1800.0), 90.0);
    }

    #[test]
    fn test_nvda_cumulative_factor() {
        assert_relative_eq!(adjust_for_splits("NVDA", d("2020-12-31"), 400.0), 10.0);
        assert_relative_eq!(adjust_for_splits("NVDA", d("2021-07-20"), 400.0), 40.0);
        assert_relative_eq!(adjust_for_splits("NVDA", d("2023-05-01"), 400.0), 40.0);
        assert_relative_eq!(adjust_for_splits("NVDA", d("2024-06-10"), 400.0), 400.0);
    }

    #[test]
    fn test_tsla_cumulative_factor() {
        let table = SplitTable::builtin();
        assert_relative_eq!(table.cumulative_factor("TSLA", d("2020-08-28")), 15.0);
        assert_relative_eq!(table.cumulative_factor("TSLA", d("2021-03-01")), 3.0);
        assert_relative_eq!(table.cumulative_factor("TSLA", d("2022-08-25")), 1.0);
    }

    #[test]
    fn test_unknown_ticker_passes_through() {
        assert_eq!(adjust_for_splits("ORCL", d("2020-01-02"), 55.5), 55.5);
        assert_eq!(adjust_for_splits("ZZZZ", d("2020-01-02"), 12.0), 12.0);
    }

    #[test]
    fn test_no_adjustment_on_or_after_last_split() {
        let table = SplitTable::builtin();
        for ticker in ["AMZN", "GOOG", "NVDA", "TSLA"] {
            let last = table.last_split_date(ticker).unwrap();
            for offset in [0, 1, 400] {
                let date = last + chrono::Duration::days(offset);
                assert_eq!(table.adjust_price(ticker, date, 123.45), 123.45);
            }
        }
        assert_eq!(table.last_split_date("META"), None);
    }

    #[test]
    fn test_adjustment_is_product_of_later_ratios() {
        let table = SplitTable::new()
            .with_split("ABC", d("2021-01-01"), 2.0)
            .with_split("ABC", d("2020-01-01"), 3.0)
            .with_split("ABC", d("2022-01-01"), 5.0);

        assert_eq!(table.events("abc")[0].date, d("2020-01-01"));
        assert_relative_eq!(table.adjust_price("ABC", d("2019-06-01"), 300.0), 10.0);
        assert_relative_eq!(table.adjust_price("ABC", d("2020-06-01"), 300.0), 30.0);
        assert_relative_eq!(table.adjust_price("ABC", d("2021-06-01"), 300.0), 60.0);
    }

    #[test]
    fn test_from_events_and_serde() {
        let table = SplitTable::from_events([("xyz", SplitEvent::new(d("2023-03-01"), 4.0))]);
        assert_relative_eq!(table.cumulative_factor("XYZ", d("2023-01-01")), 4.0);

        let json = r#"{"aapl": [{"date": "2020-08-31", "ratio": 4.0}]}"#;
        let parsed: SplitTable = serde_json::from_str(json).unwrap();
        assert_relative_eq!(parsed.adjust_price("AAPL", d("2020-08-28"), 500.0), 125.0);
    }

    #[test]
    fn test_adjust_series() {
        let bars = vec![
            Bar {
                date: d("2022-06-03"),
                open: 2400.0,
                high: 2500.0,
                low: 2300.0,
                close: 2447.0,
                volume: 100.0,
            },
            Bar {
                date: d("2022-06-06"),
                open: 125.0,
                high: 128.0,
                low: 121.0,
                close: 124.8,
                volume: 2_000.0,
            },
        ];
        let series = PriceSeries::new("AMZN", bars).unwrap();

        let adjusted = SplitTable::builtin().adjust_series(&series);
        let closes = adjusted.column(PriceField::Close);
        assert_relative_eq!(closes[0], 122.35);
        assert_relative_eq!(closes[1], 124.8);
        assert_relative_eq!(adjusted.bars()[0].volume, 2_000.0);
        assert_relative_eq!(adjusted.bars()[0].high, 125.0);
    }
}
