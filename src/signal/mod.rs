// Signal aggregation module
// Combines the latest indicator values into one discrete trade action

use crate::models::{Signal, SignalAction};

/// Configuration for signal aggregation
#[derive(Debug, Clone)]
pub struct SignalConfig {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

/// Named indicator series aligned to the same candle index
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub sma: Vec<f64>,
    pub rsi: Vec<f64>,
    pub close: Vec<f64>,
}

/// Aggregate the latest indicator values into a single signal
///
/// Evaluated once against the two most recent points:
/// - Buy iff the SMA rose and the RSI is below the oversold band
/// - Sell iff the SMA fell and the RSI is above the overbought band
/// - Hold otherwise, including a flat SMA or any undefined input
///
/// Buy and Sell attach the latest close as reference price; Hold never
/// carries a price. The strict comparisons on the same two SMA points
/// make simultaneous Buy and Sell impossible.
pub fn aggregate_signals(indicators: &IndicatorSet, config: &SignalConfig) -> Signal {
    if indicators.sma.len() < 2 || indicators.rsi.is_empty() || indicators.close.is_empty() {
        return Signal::hold();
    }

    let sma_prev = indicators.sma[indicators.sma.len() - 2];
    let sma_last = indicators.sma[indicators.sma.len() - 1];
    let rsi_last = indicators.rsi[indicators.rsi.len() - 1];
    let close_last = indicators.close[indicators.close.len() - 1];

    // Warm-up NaN at any probed index means the decision is undefined
    if sma_prev.is_nan() || sma_last.is_nan() || rsi_last.is_nan() {
        return Signal::hold();
    }

    if sma_prev < sma_last && rsi_last < config.rsi_oversold {
        Signal {
            action: SignalAction::Buy,
            price: Some(close_last),
        }
    } else if sma_prev > sma_last && rsi_last > config.rsi_overbought {
        Signal {
            action: SignalAction::Sell,
            price: Some(close_last),
        }
    } else {
        Signal::hold()
    }
}
