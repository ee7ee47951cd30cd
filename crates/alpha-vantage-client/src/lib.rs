mod models;
mod rate_limit;

pub use models::{CompanyOverview, OutputSize};

use analysis_core::{AnalysisError, Bar, DailySeriesProvider, PriceSeries};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use rate_limit::RateLimiter;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
    output_size: OutputSize,
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> Self {
        // Free tier allows 5 requests per minute. Premium keys can raise it
        // with ALPHA_VANTAGE_RATE_LIMIT.
        let rate_limit: usize = std::env::var("ALPHA_VANTAGE_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
            output_size: OutputSize::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Output size used by the [`DailySeriesProvider`] impl.
    pub fn with_output_size(mut self, output_size: OutputSize) -> Self {
        self.output_size = output_size;
        self
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, AnalysisError> {
        self.rate_limiter.acquire().await;

        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        check_api_error(&json)?;
        Ok(json)
    }

    /// Get daily OHLCV history (`TIME_SERIES_DAILY`)
    pub async fn get_daily_series(
        &self,
        symbol: &str,
        output_size: OutputSize,
    ) -> Result<PriceSeries, AnalysisError> {
        tracing::debug!("Fetching TIME_SERIES_DAILY for {} ({})", symbol, output_size.as_str());
        let json = self
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", output_size.as_str()),
            ])
            .await?;

        parse_daily_series(symbol, &json)
    }

    /// Get company fundamentals overview (`OVERVIEW`)
    pub async fn get_company_overview(
        &self,
        symbol: &str,
    ) -> Result<CompanyOverview, AnalysisError> {
        tracing::debug!("Fetching OVERVIEW for {}", symbol);
        let json = self
            .query(&[("function", "OVERVIEW"), ("symbol", symbol)])
            .await?;

        parse_company_overview(symbol, json)
    }
}

#[async_trait]
impl DailySeriesProvider for AlphaVantageClient {
    async fn daily_series(&self, symbol: &str) -> Result<PriceSeries, AnalysisError> {
        self.get_daily_series(symbol, self.output_size).await
    }
}

/// Maps Alpha Vantage's in-band error payloads to errors.
///
/// The API answers HTTP 200 for bad symbols (`Error Message`) and for
/// throttling (`Note` / `Information`).
pub fn check_api_error(json: &Value) -> Result<(), AnalysisError> {
    if let Some(error) = json.get("Error Message") {
        return Err(AnalysisError::ApiError(format!("Alpha Vantage error: {}", error)));
    }

    if let Some(note) = json.get("Note").or_else(|| json.get("Information")) {
        return Err(AnalysisError::RateLimited(format!("Alpha Vantage: {}", note)));
    }

    Ok(())
}

/// Converts a `TIME_SERIES_DAILY` payload into a date-ordered series.
///
/// Entries with an unparseable date or number are skipped.
pub fn parse_daily_series(symbol: &str, json: &Value) -> Result<PriceSeries, AnalysisError> {
    check_api_error(json)?;

    let series = json
        .get(DAILY_SERIES_KEY)
        .and_then(|v| v.as_object())
        .ok_or_else(|| AnalysisError::ApiError(format!("No daily series found for {}", symbol)))?;

    fn field(values: &Value, key: &str) -> Option<f64> {
        values.get(key)?.as_str()?.trim().parse::<f64>().ok()
    }

    let mut bars = Vec::with_capacity(series.len());
    let mut skipped = 0usize;
    for (date, values) in series {
        let bar = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().and_then(|date| {
            Some(Bar {
                date,
                open: field(values, "1. open")?,
                high: field(values, "2. high")?,
                low: field(values, "3. low")?,
                close: field(values, "4. close")?,
                volume: field(values, "5. volume")?,
            })
        });

        match bar {
            Some(bar)
                if [bar.open, bar.high, bar.low, bar.close, bar.volume]
                    .iter()
                    .all(|v| v.is_finite() && *v >= 0.0) =>
            {
                bars.push(bar)
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!("{}: skipped {} malformed daily entries", symbol, skipped);
    }

    bars.sort_by(|a, b| a.date.cmp(&b.date));
    bars.dedup_by_key(|b| b.date);

    PriceSeries::new(symbol.to_uppercase(), bars)
}

fn parse_company_overview(symbol: &str, json: Value) -> Result<CompanyOverview, AnalysisError> {
    if json.as_object().map_or(true, |o| o.is_empty()) {
        return Err(AnalysisError::ApiError(format!("No overview data for {}", symbol)));
    }

    serde_json::from_value(json).map_err(|e| AnalysisError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::PriceField;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "Meta Data": {
                "1. Information": "Daily Prices (open, high, low, close) and Volumes",
                "2. Symbol": "AMZN"
            },
            "Time Series (Daily)": {
                "2024-11-29": {
                    "1. open": "205.8300",
                    "2. high": "208.2000",
                    "3. low": "204.5900",
                    "4. close": "207.8900",
                    "5. volume": "24892400"
                },
                "2024-11-27": {
                    "1. open": "206.9800",
                    "2. high": "207.6400",
                    "3. low": "200.1500",
                    "4. close": "205.7400",
                    "5. volume": "28061600"
                },
                "2024-11-26": {
                    "1. open": "201.9000",
                    "2. high": "208.0000",
                    "3. low": "201.7900",
                    "4. close": "207.8600",
                    "5. volume": "41673700"
                }
            }
        })
    }

    #[test]
    fn test_parse_daily_series_sorts_ascending() {
        let series = parse_daily_series("amzn", &sample_payload()).unwrap();

        assert_eq!(series.symbol(), "AMZN");
        assert_eq!(series.len(), 3);
        assert_eq!(series.first().unwrap().date.to_string(), "2024-11-26");
        assert_eq!(series.last().unwrap().date.to_string(), "2024-11-29");
        assert_relative_eq!(series.column(PriceField::Close)[1], 205.74);
        assert_relative_eq!(series.last().unwrap().volume, 24_892_400.0);
    }

    #[test]
    fn test_parse_daily_series_skips_malformed_entries() {
        let mut payload = sample_payload();
        payload["Time Series (Daily)"]["2024-11-25"] = json!({
            "1. open": "n/a",
            "2. high": "1",
            "3. low": "1",
            "4. close": "1",
            "5. volume": "1"
        });
        payload["Time Series (Daily)"]["not-a-date"] = json!({});

        let series = parse_daily_series("AMZN", &payload).unwrap();
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_error_message_payload() {
        let payload = json!({ "Error Message": "Invalid API call." });
        assert!(matches!(
            parse_daily_series("XXXX", &payload),
            Err(AnalysisError::ApiError(_))
        ));
    }

    #[test]
    fn test_rate_limit_payloads() {
        let note = json!({ "Note": "Thank you for using Alpha Vantage!" });
        let info = json!({ "Information": "Our standard API rate limit is 25 requests per day." });
        assert!(matches!(check_api_error(&note), Err(AnalysisError::RateLimited(_))));
        assert!(matches!(check_api_error(&info), Err(AnalysisError::RateLimited(_))));
    }

    #[test]
    fn test_missing_series_is_an_error() {
        let payload = json!({ "Meta Data": {} });
        assert!(parse_daily_series("AMZN", &payload).is_err());
    }

    #[test]
    fn test_parse_company_overview() {
        let payload = json!({
            "Symbol": "ORCL",
            "Name": "Oracle Corporation",
            "Sector": "TECHNOLOGY",
            "PERatio": "48.1",
            "Beta": "1.014",
            "52WeekHigh": "192.24"
        });

        let overview = parse_company_overview("ORCL", payload).unwrap();
        assert_eq!(overview.symbol, "ORCL");
        assert_eq!(overview.name.as_deref(), Some("Oracle Corporation"));
        assert_eq!(overview.week_52_high.as_deref(), Some("192.24"));
        assert_eq!(overview.dividend_yield, None);
    }

    #[test]
    fn test_empty_overview_is_an_error() {
        assert!(parse_company_overview("ZZZZ", json!({})).is_err());
    }
}
