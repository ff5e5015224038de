// Technical indicators module
// Implements SMA, EMA, RSI, RCI, MACD and ATR series for technical analysis
//
// All series functions return a vector aligned 1:1 with the input index.
// Warm-up entries are f64::NAN; callers decide how to treat them.

pub mod atr;
pub mod macd;
pub mod moving_average;
pub mod rci;
pub mod rsi;

pub use atr::atr_series;
pub use macd::macd_series;
pub use moving_average::{ema_series, sma_series};
pub use rci::rci_series;
pub use rsi::rsi_series;
