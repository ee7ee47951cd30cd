//! File and network plumbing behind the `data-loader` binary: price files,
//! the combined wide file, the Alpha Vantage fetch loop and report output.

pub mod cleaning;
pub mod combined;
pub mod config;
pub mod fetch;
pub mod prepare;
pub mod report;

pub use cleaning::{filter_date_range, read_price_csv, write_price_csv, CleanedSeries};
pub use combined::{read_combined_csv, write_combined_csv};
pub use config::{LoaderConfig, SymbolSource};
pub use fetch::{fetch_all, FetchSummary, OverviewProvider};
pub use prepare::{load_dataset, prepare, Dataset, PrepareSummary};
pub use report::render_comparison;
