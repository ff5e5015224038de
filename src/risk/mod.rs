// Risk management module
// ATR-based volatility, lot sizing and stop-loss/take-profit placement

use crate::indicators::atr_series;
use crate::models::Candle;

/// Computes a volatility measure from price history and derives
/// position sizing and bracket levels from it.
///
/// The ATR series is computed once at construction and shared by all
/// accessors; candles are not retained.
pub struct RiskManager {
    atr: Vec<f64>,
}

impl RiskManager {
    /// Build the smoothed true-range series for `candles`
    ///
    /// Warm-up entries are back-filled with the first defined value
    /// rather than left undefined: downstream sizing always needs a
    /// defined ATR, and the first stable reading is the best available
    /// estimate for the warm-up window. Deliberately lossy.
    pub fn new(candles: &[Candle], atr_period: usize) -> Self {
        let mut atr = atr_series(candles, atr_period);

        if let Some(first_defined) = atr.iter().copied().find(|v| !v.is_nan()) {
            for value in atr.iter_mut() {
                if value.is_nan() {
                    *value = first_defined;
                } else {
                    break;
                }
            }
        }

        Self { atr }
    }

    /// Latest ATR reading
    ///
    /// Defined whenever the input had at least `atr_period + 1`
    /// candles; None only when the series never left warm-up.
    pub fn latest_atr(&self) -> Option<f64> {
        let latest = *self.atr.last()?;
        if latest.is_nan() {
            return None;
        }
        tracing::debug!("latest ATR: {:.4}", latest);
        Some(latest)
    }

    /// ATR value at each candle index (back-filled, see `new`)
    pub fn atr_values(&self) -> &[f64] {
        &self.atr
    }

    /// Lot size from account balance, risk tolerance and stop distance
    ///
    /// Risks `balance * risk_ratio` across the stop distance, rounded
    /// down to 2 decimal places. A non-positive stop distance is a
    /// defined no-trade outcome: size 0, warning, never an error.
    pub fn calculate_lot_size(&self, balance: f64, risk_ratio: f64, stop_distance: f64) -> f64 {
        if stop_distance <= 0.0 {
            tracing::warn!(
                "non-positive stop distance ({:.4}), forcing lot size to 0",
                stop_distance
            );
            return 0.0;
        }

        let lot = (balance * risk_ratio / stop_distance * 100.0).floor() / 100.0;
        tracing::debug!("calculated lot size: {:.2}", lot);
        lot
    }

    /// Stop-loss and take-profit levels around an entry price
    ///
    /// Returns `(entry - atr * stop_multiplier, entry + atr * tp_multiplier)`.
    /// Precondition: callers pass positive multipliers; no validation here.
    pub fn set_stop_levels(
        &self,
        entry_price: f64,
        atr: f64,
        stop_multiplier: f64,
        tp_multiplier: f64,
    ) -> (f64, f64) {
        let stop_loss = entry_price - atr * stop_multiplier;
        let take_profit = entry_price + atr * tp_multiplier;
        tracing::debug!(
            "entry: {:.2}, stop loss: {:.2}, take profit: {:.2}",
            entry_price,
            stop_loss,
            take_profit
        );
        (stop_loss, take_profit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_candles(count: usize, range: f64) -> Vec<Candle> {
        (0..count)
            .map(|i| Candle {
                symbol: "TEST".to_string(),
                timestamp: Utc::now() + chrono::Duration::hours(i as i64),
                open: 100.0,
                high: 100.0 + range,
                low: 100.0 - range,
                close: 100.0,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_latest_atr_defined_with_enough_data() {
        let candles = create_test_candles(20, 1.0);
        let risk = RiskManager::new(&candles, 14);

        let atr = risk.latest_atr();
        assert!(atr.is_some());
        assert!((atr.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_latest_atr_none_without_data() {
        let candles = create_test_candles(5, 1.0);
        let risk = RiskManager::new(&candles, 14);

        assert!(risk.latest_atr().is_none());
    }

    #[test]
    fn test_warm_up_back_filled_with_first_defined_value() {
        let candles = create_test_candles(20, 1.0);
        let risk = RiskManager::new(&candles, 14);

        let values = risk.atr_values();
        assert_eq!(values.len(), 20);
        let first_defined = values[14];
        for value in &values[..14] {
            assert_eq!(*value, first_defined);
        }
    }

    #[test]
    fn test_lot_size_known_value() {
        let risk = RiskManager::new(&create_test_candles(20, 1.0), 14);

        let lot = risk.calculate_lot_size(1_000_000.0, 0.05, 1000.0);
        assert_eq!(lot, 50.0);
    }

    #[test]
    fn test_lot_size_rounds_down_to_cents() {
        let risk = RiskManager::new(&create_test_candles(20, 1.0), 14);

        // 1000 * 0.1 / 3 = 33.333... -> 33.33
        let lot = risk.calculate_lot_size(1000.0, 0.1, 3.0);
        assert_eq!(lot, 33.33);
    }

    #[test]
    fn test_zero_stop_distance_is_no_trade_not_error() {
        let risk = RiskManager::new(&create_test_candles(20, 1.0), 14);

        assert_eq!(risk.calculate_lot_size(1_000_000.0, 0.05, 0.0), 0.0);
        assert_eq!(risk.calculate_lot_size(1_000_000.0, 0.05, -5.0), 0.0);
    }

    #[test]
    fn test_stop_levels_known_values() {
        let risk = RiskManager::new(&create_test_candles(20, 1.0), 14);

        let (stop_loss, take_profit) = risk.set_stop_levels(100.0, 2.0, 1.5, 2.0);
        assert_eq!(stop_loss, 97.0);
        assert_eq!(take_profit, 104.0);
    }
}
