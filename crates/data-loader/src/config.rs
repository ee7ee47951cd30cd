use analysis_orchestrator::MetricsConfig;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SYMBOLS: &[&str] = &["AMZN", "GOOG", "META", "NVDA", "ORCL", "TSLA"];
pub const DEFAULT_DATA_DIR: &str = "data";
pub const COMBINED_FILE: &str = "combined_stocks.csv";

/// Where one symbol's daily prices live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSource {
    pub symbol: String,
    pub path: PathBuf,
}

impl SymbolSource {
    /// `<dir>/<symbol>_daily.csv`
    pub fn in_dir(dir: &Path, symbol: &str) -> Self {
        let symbol = symbol.trim().to_uppercase();
        let path = dir.join(format!("{}_daily.csv", symbol.to_lowercase()));
        Self { symbol, path }
    }

    /// Sibling file holding the company overview.
    pub fn overview_path(&self) -> PathBuf {
        self.path
            .with_file_name(format!("{}_overview.csv", self.symbol.to_lowercase()))
    }

    /// Sibling file holding split-adjusted prices; the daily file stays raw.
    pub fn adjusted_path(&self) -> PathBuf {
        self.path
            .with_file_name(format!("{}_adjusted.csv", self.symbol.to_lowercase()))
    }
}

/// Runtime configuration for every subcommand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub data_dir: PathBuf,
    pub sources: Vec<SymbolSource>,
    pub fetch_start: NaiveDate,
    pub fetch_end: NaiveDate,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from(DEFAULT_DATA_DIR);
        let sources = DEFAULT_SYMBOLS
            .iter()
            .map(|s| SymbolSource::in_dir(&data_dir, s))
            .collect();

        Self {
            api_key: None,
            data_dir,
            sources,
            fetch_start: NaiveDate::from_ymd_opt(2019, 11, 30).unwrap_or_default(),
            fetch_end: NaiveDate::from_ymd_opt(2024, 11, 30).unwrap_or_default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Reads `ALPHA_VANTAGE_API_KEY`, `STOCK_DATA_DIR`, `STOCK_SYMBOLS`,
    /// `FETCH_START` and `FETCH_END`; anything unset keeps its default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.api_key = lookup("ALPHA_VANTAGE_API_KEY").filter(|k| !k.trim().is_empty());

        if let Some(dir) = lookup("STOCK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        let symbols: Vec<String> = match lookup("STOCK_SYMBOLS") {
            Some(list) => parse_symbol_list(&list),
            None => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };
        config.sources = symbols
            .iter()
            .map(|s| SymbolSource::in_dir(&config.data_dir, s))
            .collect();

        if let Some(start) = lookup("FETCH_START") {
            config.fetch_start = parse_date(&start).context("invalid FETCH_START")?;
        }
        if let Some(end) = lookup("FETCH_END") {
            config.fetch_end = parse_date(&end).context("invalid FETCH_END")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON config; the API key still comes from the environment.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;

        config.api_key = std::env::var("ALPHA_VANTAGE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        for source in &mut config.sources {
            source.symbol = source.symbol.trim().to_uppercase();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.fetch_start > self.fetch_end {
            anyhow::bail!(
                "fetch window is empty: {} is after {}",
                self.fetch_start,
                self.fetch_end
            );
        }
        if self.sources.is_empty() {
            anyhow::bail!("no symbols configured");
        }
        Ok(())
    }

    /// Restricts the sources to `symbols`, adding default paths for any
    /// symbol not already configured.
    pub fn with_symbols(mut self, symbols: &[String]) -> Self {
        if symbols.is_empty() {
            return self;
        }
        self.sources = symbols
            .iter()
            .map(|s| {
                self.source(s)
                    .cloned()
                    .unwrap_or_else(|| SymbolSource::in_dir(&self.data_dir, s))
            })
            .collect();
        self
    }

    /// Moves the data directory. Sources under the old directory follow it;
    /// explicit paths elsewhere are kept as they are.
    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        for source in &mut self.sources {
            if let Ok(relative) = source.path.strip_prefix(&self.data_dir) {
                source.path = dir.join(relative);
            }
        }
        self.data_dir = dir;
        self
    }

    pub fn source(&self, symbol: &str) -> Option<&SymbolSource> {
        self.sources
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol.trim()))
    }

    pub fn symbols(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.symbol.clone()).collect()
    }

    pub fn combined_path(&self) -> PathBuf {
        self.data_dir.join(COMBINED_FILE)
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("ALPHA_VANTAGE_API_KEY must be set to fetch data")
    }
}

fn parse_symbol_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.api_key, None);
        assert_eq!(config.symbols(), vec!["AMZN", "GOOG", "META", "NVDA", "ORCL", "TSLA"]);
        assert_eq!(config.source("amzn").unwrap().path, PathBuf::from("data/amzn_daily.csv"));
        assert_eq!(config.combined_path(), PathBuf::from("data/combined_stocks.csv"));
        assert_eq!(config.fetch_start.to_string(), "2019-11-30");
        assert_eq!(config.fetch_end.to_string(), "2024-11-30");
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = LoaderConfig::from_lookup(lookup_from(&[
            ("ALPHA_VANTAGE_API_KEY", "demo"),
            ("STOCK_DATA_DIR", "/tmp/prices"),
            ("STOCK_SYMBOLS", " aapl, msft ,,"),
            ("FETCH_START", "2021-01-01"),
        ]))
        .unwrap();

        assert_eq!(config.require_api_key().unwrap(), "demo");
        assert_eq!(config.symbols(), vec!["AAPL", "MSFT"]);
        assert_eq!(
            config.source("MSFT").unwrap().path,
            PathBuf::from("/tmp/prices/msft_daily.csv")
        );
        assert_eq!(
            config.source("msft").unwrap().overview_path(),
            PathBuf::from("/tmp/prices/msft_overview.csv")
        );
        assert_eq!(config.fetch_start.to_string(), "2021-01-01");
    }

    #[test]
    fn test_bad_dates_are_rejected() {
        assert!(LoaderConfig::from_lookup(lookup_from(&[("FETCH_END", "30/11/2024")])).is_err());
        assert!(LoaderConfig::from_lookup(lookup_from(&[
            ("FETCH_START", "2024-01-01"),
            ("FETCH_END", "2023-01-01"),
        ]))
        .is_err());
    }

    #[test]
    fn test_with_symbols_keeps_explicit_paths() {
        let mut config = LoaderConfig::default();
        config.sources[0].path = PathBuf::from("elsewhere/amazon.csv");

        let config = config.with_symbols(&["amzn".to_string(), "IBM".to_string()]);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].path, PathBuf::from("elsewhere/amazon.csv"));
        assert_eq!(config.sources[1].path, PathBuf::from("data/ibm_daily.csv"));
    }

    #[test]
    fn test_with_data_dir_keeps_explicit_paths() {
        let symbols = ["AMZN".to_string(), "NVDA".to_string()];
        let mut config = LoaderConfig::default().with_symbols(&symbols);
        config.sources[1].path = PathBuf::from("/mnt/vendor/nvidia.csv");

        let config = config.with_data_dir(PathBuf::from("/srv/prices"));
        assert_eq!(config.combined_path(), PathBuf::from("/srv/prices/combined_stocks.csv"));
        assert_eq!(
            config.source("AMZN").unwrap().path,
            PathBuf::from("/srv/prices/amzn_daily.csv")
        );
        assert_eq!(config.source("NVDA").unwrap().path, PathBuf::from("/mnt/vendor/nvidia.csv"));
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.json");
        std::fs::write(
            &path,
            r#"{
                "data_dir": "prices",
                "sources": [{"symbol": "nvda", "path": "prices/nvidia.csv"}],
                "fetch_start": "2020-01-01",
                "fetch_end": "2020-12-31",
                "metrics": {"ma_window": 20}
            }"#,
        )
        .unwrap();

        let config = LoaderConfig::from_json_file(&path).unwrap();
        assert_eq!(config.symbols(), vec!["NVDA"]);
        assert_eq!(config.metrics.ma_window, 20);
        assert_eq!(config.metrics.rsi_window, 14);
        assert_eq!(config.combined_path(), PathBuf::from("prices/combined_stocks.csv"));
    }
}
