//! Small numeric helpers shared by the metric crates.

use statrs::statistics::Statistics;

/// Trading days per year used to annualise daily figures.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Arithmetic mean; `None` for empty input.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.mean())
}

/// Sample standard deviation (n - 1); `None` for fewer than two points.
pub fn sample_std_dev(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    Some(data.std_dev())
}

/// Percent change between consecutive values. A zero previous value yields
/// no return for that step.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter_map(|w| {
            if w[0] != 0.0 {
                Some((w[1] - w[0]) / w[0])
            } else {
                None
            }
        })
        .collect()
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
