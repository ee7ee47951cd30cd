//! Return-based risk/performance metrics over daily price series.
//!
//! Every function reads one column of a [`PriceSeries`] (normally close) and
//! yields `None` when the figure is mathematically undefined for the input,
//! instead of propagating NaN or infinity.

use analysis_core::stats::{self, TRADING_DAYS_PER_YEAR};
use analysis_core::{PriceField, PriceSeries};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Default annual risk-free rate for the Sharpe ratio.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Daily percent returns of one column.
pub fn daily_returns(series: &PriceSeries, field: PriceField) -> Vec<f64> {
    stats::pct_change(&series.column(field))
}

/// Daily Sharpe ratio: `(mean(r) - rf / 252) / std(r)`.
///
/// Undefined for fewer than two returns or zero variance.
pub fn sharpe_ratio(series: &PriceSeries, field: PriceField, risk_free_rate: f64) -> Option<f64> {
    let returns = daily_returns(series, field);
    let mean = stats::mean(&returns)?;
    let std_dev = stats::sample_std_dev(&returns)?;

    if std_dev < 1e-12 {
        return None;
    }

    let excess = mean - risk_free_rate / TRADING_DAYS_PER_YEAR;
    Some(excess / std_dev)
}

/// Standard deviation of daily returns (not annualised).
pub fn volatility(series: &PriceSeries, field: PriceField) -> Option<f64> {
    stats::sample_std_dev(&daily_returns(series, field))
}

/// Compound annual growth rate: `(end / start)^(252 / rows) - 1`.
pub fn cagr(series: &PriceSeries, field: PriceField) -> Option<f64> {
    let start = series.first()?.get(field);
    let end = series.last()?.get(field);

    if start <= 0.0 {
        return None;
    }

    let years = series.len() as f64 / TRADING_DAYS_PER_YEAR;
    Some((end / start).powf(1.0 / years) - 1.0)
}

/// Worst peak-to-trough decline as a fraction: `min((p - peak) / peak)`.
///
/// Always `<= 0`. Leading zero prices are ignored until a positive peak exists.
pub fn max_drawdown(series: &PriceSeries, field: PriceField) -> Option<f64> {
    let prices = series.column(field);
    if prices.is_empty() {
        return None;
    }

    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0f64;

    for &price in &prices {
        if price > peak {
            peak = price;
        }
        if peak > 0.0 {
            let drawdown = (price - peak) / peak;
            if drawdown < max_dd {
                max_dd = drawdown;
            }
        }
    }

    Some(max_dd)
}

/// Returns of `stock` and `benchmark` over the dates both have a price.
///
/// A step where either previous price is zero is dropped from both sides so
/// the two vectors stay the same length.
pub fn aligned_returns(
    stock: &[(NaiveDate, f64)],
    benchmark: &[(NaiveDate, f64)],
) -> (Vec<f64>, Vec<f64>) {
    let bench_by_date: HashMap<NaiveDate, f64> = benchmark.iter().copied().collect();

    let pairs: Vec<(f64, f64)> = stock
        .iter()
        .filter_map(|(date, price)| bench_by_date.get(date).map(|b| (*price, *b)))
        .collect();

    pairs
        .windows(2)
        .filter(|w| w[0].0 != 0.0 && w[0].1 != 0.0)
        .map(|w| ((w[1].0 - w[0].0) / w[0].0, (w[1].1 - w[0].1) / w[0].1))
        .unzip()
}

/// OLS slope of stock daily returns regressed on benchmark daily returns.
///
/// Prices are aligned by date first. Undefined with fewer than two aligned
/// returns or a benchmark without variance.
pub fn beta(stock: &PriceSeries, field: PriceField, benchmark: &[(NaiveDate, f64)]) -> Option<f64> {
    let (stock_returns, bench_returns) = aligned_returns(&stock.dated_column(field), benchmark);
    ols_slope(&bench_returns, &stock_returns)
}

/// Least-squares slope of `y` on `x`.
pub fn ols_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }

    let x = &x[..n];
    let y = &y[..n];
    let x_mean = stats::mean(x)?;
    let y_mean = stats::mean(y)?;

    let mut covariance = 0.0;
    let mut x_variance = 0.0;

    for i in 0..n {
        let x_diff = x[i] - x_mean;
        covariance += x_diff * (y[i] - y_mean);
        x_variance += x_diff * x_diff;
    }

    if x_variance < 1e-18 {
        return None;
    }

    Some(covariance / x_variance)
}
