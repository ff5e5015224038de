use super::ema_series;

/// Moving Average Convergence/Divergence
///
/// Returns `(macd_line, signal_line)`, both aligned with `closes`.
/// The MACD line is fast EMA minus slow EMA, defined from index
/// `slow - 1`. The signal line is an EMA of the defined MACD values,
/// defined from index `slow + signal_period - 2`.
pub fn macd_series(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> (Vec<f64>, Vec<f64>) {
    if closes.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();

    // Signal line smooths only the defined portion of the MACD line
    let defined_start = macd_line.iter().position(|v| !v.is_nan());
    let mut signal_line = vec![f64::NAN; closes.len()];
    if let Some(start) = defined_start {
        let smoothed = ema_series(&macd_line[start..], signal_period);
        for (offset, value) in smoothed.into_iter().enumerate() {
            signal_line[start + offset] = value;
        }
    }

    (macd_line, signal_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_alignment_and_warm_up() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.5)).collect();
        let (macd, signal) = macd_series(&closes, 12, 26, 9);

        assert_eq!(macd.len(), 50);
        assert_eq!(signal.len(), 50);

        // MACD defined from slow - 1
        assert!(macd[24].is_nan());
        assert!(!macd[25].is_nan());

        // Signal defined from slow + signal_period - 2
        assert!(signal[32].is_nan());
        assert!(!signal[33].is_nan());
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let (macd, _) = macd_series(&closes, 12, 26, 9);

        // Fast EMA leads the slow EMA upward
        assert!(macd[59] > 0.0);
    }

    #[test]
    fn test_macd_zero_on_constant_series() {
        let closes = vec![100.0; 60];
        let (macd, signal) = macd_series(&closes, 12, 26, 9);

        assert!(macd[59].abs() < 1e-9);
        assert!(signal[59].abs() < 1e-9);
    }

    #[test]
    fn test_macd_empty_input() {
        let (macd, signal) = macd_series(&[], 12, 26, 9);
        assert!(macd.is_empty());
        assert!(signal.is_empty());
    }
}
