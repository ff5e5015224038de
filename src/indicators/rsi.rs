/// Calculate a Relative Strength Index series
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions, bounded 0-100.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// Uses Wilder's smoothing over gains and losses. The first defined
/// value sits at index `period` (one price change per sample, so the
/// warm-up spans `period` changes); earlier entries are NaN.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    if closes.is_empty() || period == 0 {
        return Vec::new();
    }

    let mut series = vec![f64::NAN; closes.len()];
    if closes.len() < period + 1 {
        return series;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    // Seed with the simple average of the first `period` changes
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss += change.abs();
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    series[period] = rsi_from_averages(avg_gain, avg_loss);

    // Wilder's smoothing for subsequent values
    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, change.abs())
        };

        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        series[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    series
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
