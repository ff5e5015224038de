use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV candle for a time interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Discrete trade action produced once per pipeline run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

/// Aggregated trading signal with an optional reference price
///
/// The price is the latest close at decision time and is only attached
/// when the action is Buy or Sell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub action: SignalAction,
    pub price: Option<f64>,
}

impl Signal {
    pub fn hold() -> Self {
        Self {
            action: SignalAction::Hold,
            price: None,
        }
    }

    /// True when the pipeline should submit a transaction for this signal
    pub fn is_actionable(&self) -> bool {
        self.action != SignalAction::Hold
    }
}

/// Side of a resting order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// A resting limit order at one grid level
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridOrder {
    pub side: OrderSide,
    pub price: f64,
    pub lot: f64,
}

/// Volatility-derived sizing and bracket levels for one run
///
/// Invariant: lot_size >= 0. A non-positive stop distance forces
/// lot_size to 0 (no-trade policy, not an error).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskProfile {
    pub atr: f64,
    pub lot_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Order book snapshot: (price, size) levels, best price first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<(f64, f64)>,
    pub asks: Vec<(f64, f64)>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|(price, _)| *price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|(price, _)| *price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_signal_has_no_price() {
        let signal = Signal::hold();
        assert_eq!(signal.action, SignalAction::Hold);
        assert!(signal.price.is_none());
        assert!(!signal.is_actionable());
    }

    #[test]
    fn test_buy_signal_is_actionable() {
        let signal = Signal {
            action: SignalAction::Buy,
            price: Some(100.0),
        };
        assert!(signal.is_actionable());
    }

    #[test]
    fn test_order_book_best_levels() {
        let book = OrderBook {
            bids: vec![(99.5, 1.0), (99.0, 2.0)],
            asks: vec![(100.5, 1.5), (101.0, 3.0)],
        };
        assert_eq!(book.best_bid(), Some(99.5));
        assert_eq!(book.best_ask(), Some(100.5));
    }

    #[test]
    fn test_empty_order_book() {
        let book = OrderBook::default();
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }
}
