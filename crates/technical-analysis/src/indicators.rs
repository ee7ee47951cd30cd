use analysis_core::{PriceField, PriceSeries};

/// Default trailing window for the moving average metric.
pub const DEFAULT_MA_WINDOW: usize = 50;
/// Default look-back for RSI.
pub const DEFAULT_RSI_WINDOW: usize = 14;

/// Simple Moving Average
///
/// Returns one value per full window, starting at index `period - 1`.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Trailing mean aligned with `data`: `None` for the first `window - 1` rows.
pub fn rolling_mean(data: &[f64], window: usize) -> Vec<Option<f64>> {
    let means = sma(data, window);
    let lead = data.len() - means.len();
    std::iter::repeat(None)
        .take(lead)
        .chain(means.into_iter().map(Some))
        .collect()
}

/// Moving average of one column, aligned with the series rows.
pub fn moving_average(series: &PriceSeries, field: PriceField, window: usize) -> Vec<Option<f64>> {
    rolling_mean(&series.column(field), window)
}

/// Moving average on the last row, if the series covers a full window.
pub fn latest_moving_average(
    series: &PriceSeries,
    field: PriceField,
    window: usize,
) -> Option<f64> {
    moving_average(series, field, window).last().copied().flatten()
}

/// Relative Strength Index over simple rolling means, aligned with `data`.
///
/// Row `i` uses the `period` price changes ending at `i`, so the first
/// `period` rows are `None`. A window without any loss reads 100.
pub fn rsi_values(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut rsi_values = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return rsi_values;
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let avg_gains = sma(&gains, period);
    let avg_losses = sma(&losses, period);

    for (k, (avg_gain, avg_loss)) in avg_gains.iter().zip(avg_losses.iter()).enumerate() {
        let rsi = if *avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - (100.0 / (1.0 + rs))
        };
        // window k covers changes k..k + period, which end at row k + period
        rsi_values[k + period] = Some(rsi);
    }

    rsi_values
}

/// RSI of one column, aligned with the series rows.
pub fn rsi(series: &PriceSeries, field: PriceField, window: usize) -> Vec<Option<f64>> {
    rsi_values(&series.column(field), window)
}

/// RSI on the last row.
pub fn latest_rsi(series: &PriceSeries, field: PriceField, window: usize) -> Option<f64> {
    rsi(series, field, window).last().copied().flatten()
}
