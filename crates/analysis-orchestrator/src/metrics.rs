use analysis_core::stats::round_to;
use analysis_core::{PriceField, PriceSeries};
use chrono::NaiveDate;
use quant_analysis::DEFAULT_RISK_FREE_RATE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use technical_analysis::{DEFAULT_MA_WINDOW, DEFAULT_RSI_WINDOW};

/// The seven statistics scored by the comparator, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    MovingAverage,
    SharpeRatio,
    Volatility,
    Cagr,
    Rsi,
    Beta,
    MaxDrawdown,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::MovingAverage,
        Metric::SharpeRatio,
        Metric::Volatility,
        Metric::Cagr,
        Metric::Rsi,
        Metric::Beta,
        Metric::MaxDrawdown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::MovingAverage => "Moving Average",
            Metric::SharpeRatio => "Sharpe Ratio",
            Metric::Volatility => "Volatility",
            Metric::Cagr => "CAGR",
            Metric::Rsi => "RSI",
            Metric::Beta => "Beta",
            Metric::MaxDrawdown => "Max Drawdown",
        }
    }

    /// Volatility, beta and drawdown are risk measures: the smaller one wins.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Metric::Volatility | Metric::Beta | Metric::MaxDrawdown)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Windows and column used when computing a [`MetricSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub field: PriceField,
    pub ma_window: usize,
    pub rsi_window: usize,
    pub risk_free_rate: f64,
    /// Decimal places kept in reported values (and compared on)
    pub decimals: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            field: PriceField::Close,
            ma_window: DEFAULT_MA_WINDOW,
            rsi_window: DEFAULT_RSI_WINDOW,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            decimals: 3,
        }
    }
}

/// Metric values for one symbol. `None` marks an undefined result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub symbol: String,
    pub values: BTreeMap<Metric, Option<f64>>,
}

impl MetricSnapshot {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied().flatten()
    }
}

/// Computes all seven metrics for `series`; `benchmark` feeds beta.
pub fn compute_metrics(
    series: &PriceSeries,
    benchmark: &[(NaiveDate, f64)],
    config: &MetricsConfig,
) -> MetricSnapshot {
    let field = config.field;

    let values = Metric::ALL
        .iter()
        .map(|&metric| {
            let raw = match metric {
                Metric::MovingAverage => {
                    technical_analysis::latest_moving_average(series, field, config.ma_window)
                }
                Metric::SharpeRatio => {
                    quant_analysis::sharpe_ratio(series, field, config.risk_free_rate)
                }
                Metric::Volatility => quant_analysis::volatility(series, field),
                Metric::Cagr => quant_analysis::cagr(series, field),
                Metric::Rsi => technical_analysis::latest_rsi(series, field, config.rsi_window),
                Metric::Beta => quant_analysis::beta(series, field, benchmark),
                Metric::MaxDrawdown => quant_analysis::max_drawdown(series, field),
            };
            let value = raw
                .filter(|v| v.is_finite())
                .map(|v| round_to(v, config.decimals));
            (metric, value)
        })
        .collect();

    MetricSnapshot {
        symbol: series.symbol().to_string(),
        values,
    }
}
