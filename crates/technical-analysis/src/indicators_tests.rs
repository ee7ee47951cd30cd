#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use analysis_core::{Bar, PriceField, PriceSeries};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    // Helper function to build a close-only series
    fn series_from(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000_000.0,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001); // (1+2+3)/3 = 2
        assert!((result[1] - 3.0).abs() < 0.001); // (2+3+4)/3 = 3
        assert!((result[2] - 4.0).abs() < 0.001); // (3+4+5)/3 = 4
    }

    #[test]
    fn test_sma_insufficient_data() {
        let data = vec![1.0, 2.0];
        let result = sma(&data, 5);

        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_rolling_mean_is_aligned() {
        let result = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3);

        assert_eq!(result.len(), 4);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_relative_eq!(result[2].unwrap(), 2.0);
        assert_relative_eq!(result[3].unwrap(), 3.0);
    }

    #[test]
    fn test_rolling_mean_short_input_is_all_none() {
        let result = rolling_mean(&[1.0, 2.0], 5);
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn test_moving_average_constant_series() {
        let series = series_from(&vec![42.0; 60]);
        let ma = moving_average(&series, PriceField::Close, 50);

        assert!(ma[..49].iter().all(|v| v.is_none()));
        for v in &ma[49..] {
            assert_relative_eq!(v.unwrap(), 42.0);
        }
        assert_relative_eq!(latest_moving_average(&series, PriceField::Close, 50).unwrap(), 42.0);
    }

    #[test]
    fn test_moving_average_needs_full_window() {
        let series = series_from(&[1.0, 2.0, 3.0]);
        assert!(latest_moving_average(&series, PriceField::Close, 50).is_none());
    }

    #[test]
    fn test_moving_average_column_override() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..3)
            .map(|i| Bar {
                date: start + chrono::Duration::days(i),
                open: 10.0,
                high: 20.0,
                low: 5.0,
                close: 15.0,
                volume: 100.0 * (i + 1) as f64,
            })
            .collect();
        let series = PriceSeries::new("TEST", bars).unwrap();

        assert_relative_eq!(latest_moving_average(&series, PriceField::Volume, 3).unwrap(), 200.0);
        assert_relative_eq!(latest_moving_average(&series, PriceField::High, 2).unwrap(), 20.0);
    }

    #[test]
    fn test_rsi_basic() {
        let prices = sample_prices();
        let result = rsi_values(&prices, 14);

        assert_eq!(result.len(), prices.len());
        assert!(result[..14].iter().all(|v| v.is_none()));
        // RSI should be between 0 and 100
        for value in result[14..].iter().map(|v| v.unwrap()) {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_rsi_known_value() {
        // changes: +1, -1, +2, +1 -> window 4: gains 4/4, losses 1/4 -> RS 4
        let result = rsi_values(&[10.0, 11.0, 10.0, 12.0, 13.0], 4);
        assert_relative_eq!(result[4].unwrap(), 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let data = vec![1.0, 2.0, 3.0];
        let result = rsi_values(&data, 14);

        assert!(result.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_rsi_without_losses_is_100() {
        let uptrend: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = series_from(&uptrend);

        assert_eq!(latest_rsi(&series, PriceField::Close, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_flat_prices_are_100() {
        let series = series_from(&vec![50.0; 20]);
        assert_eq!(latest_rsi(&series, PriceField::Close, 14), Some(100.0));
    }

    #[test]
    fn test_rsi_downtrend_is_zero() {
        let downtrend: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let series = series_from(&downtrend);

        assert_relative_eq!(latest_rsi(&series, PriceField::Close, 14).unwrap(), 0.0);
    }
}
