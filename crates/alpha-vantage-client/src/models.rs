use serde::{Deserialize, Serialize};

/// `outputsize` parameter of `TIME_SERIES_DAILY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSize {
    /// Latest 100 data points
    Compact,
    /// Full 20+ year history
    #[default]
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// Company fundamentals returned by the `OVERVIEW` function.
///
/// Alpha Vantage reports every number as a string (and sometimes `"None"`),
/// so fields are kept as strings and written out verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Exchange", default)]
    pub exchange: Option<String>,
    #[serde(rename = "Sector", default)]
    pub sector: Option<String>,
    #[serde(rename = "Industry", default)]
    pub industry: Option<String>,
    #[serde(rename = "MarketCapitalization", default)]
    pub market_capitalization: Option<String>,
    #[serde(rename = "PERatio", default)]
    pub pe_ratio: Option<String>,
    #[serde(rename = "PEGRatio", default)]
    pub peg_ratio: Option<String>,
    #[serde(rename = "BookValue", default)]
    pub book_value: Option<String>,
    #[serde(rename = "DividendYield", default)]
    pub dividend_yield: Option<String>,
    #[serde(rename = "EPS", default)]
    pub eps: Option<String>,
    #[serde(rename = "ProfitMargin", default)]
    pub profit_margin: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM", default)]
    pub roe: Option<String>,
    #[serde(rename = "Beta", default)]
    pub beta: Option<String>,
    #[serde(rename = "52WeekHigh", default)]
    pub week_52_high: Option<String>,
    #[serde(rename = "52WeekLow", default)]
    pub week_52_low: Option<String>,
}
