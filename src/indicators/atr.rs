/// Average True Range (ATR) series
///
/// Measures market volatility by smoothing true ranges over a period.
/// True Range is the greatest of:
/// - Current High - Current Low
/// - Abs(Current High - Previous Close)
/// - Abs(Current Low - Previous Close)
///
/// Uses Wilder's smoothing (same as RSI) for the moving average.
use crate::models::Candle;

/// Calculate an ATR series aligned 1:1 with `candles`
///
/// The first defined value sits at index `period` (the seed needs
/// `period` true ranges, each of which needs a previous close);
/// earlier entries are NaN.
pub fn atr_series(candles: &[Candle], period: usize) -> Vec<f64> {
    if candles.is_empty() || period == 0 {
        return Vec::new();
    }

    let mut series = vec![f64::NAN; candles.len()];
    if candles.len() < period + 1 {
        return series;
    }

    let mut true_ranges = Vec::with_capacity(candles.len() - 1);
    for i in 1..candles.len() {
        let high = candles[i].high;
        let low = candles[i].low;
        let prev_close = candles[i - 1].close;

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());

        true_ranges.push(tr);
    }

    // First ATR is a simple average of the first `period` true ranges
    let mut atr: f64 = true_ranges.iter().take(period).sum::<f64>() / period as f64;
    series[period] = atr;

    // Wilder's smoothing for subsequent values
    for i in period..true_ranges.len() {
        atr = (atr * (period as f64 - 1.0) + true_ranges[i]) / period as f64;
        series[i + 1] = atr;
    }

    series
}
