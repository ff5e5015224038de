// Pipeline orchestration module
// One run: market data -> indicators -> signal -> risk -> grid -> submission

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Duration;

use crate::api::MarketData;
use crate::error::PipelineError;
use crate::execution::{BundleExecutor, BundleRelay, BundleResult, ChainAccount, TransactionCall};
use crate::grid::GridManager;
use crate::indicators::{rsi_series, sma_series};
use crate::models::{Candle, GridOrder, OrderSide, RiskProfile, Signal, SignalAction};
use crate::risk::RiskManager;
use crate::signal::{aggregate_signals, IndicatorSet, SignalConfig};

/// Configuration for one pipeline instance
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub timeframe: String,
    pub candle_limit: usize,
    pub sma_period: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub account_balance: f64,
    pub risk_ratio: f64,
    pub stop_multiplier: f64,
    pub tp_multiplier: f64,
    pub grid_span_pct: f64,
    pub grid_count: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub signal: SignalConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeframe: "1h".to_string(),
            candle_limit: 200,
            sma_period: 25,
            rsi_period: 14,
            atr_period: 14,
            account_balance: 1_000_000.0,
            risk_ratio: 0.05,      // risk 5% of balance per trade
            stop_multiplier: 1.5,  // stop loss at 1.5 x ATR
            tp_multiplier: 2.0,    // take profit at 2.0 x ATR
            grid_span_pct: 0.05,   // grid spans +/-5% around entry
            grid_count: 5,
            max_retries: 3,
            retry_delay_ms: 1000,
            signal: SignalConfig::default(),
        }
    }
}

/// Snapshot of one pipeline run, emitted for observability
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub entry_price: f64,
    pub atr: f64,
    pub lot_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub grid_orders: Vec<GridOrder>,
    pub signal: Signal,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub submission: Option<BundleResult>,
}

/// Validate that candles carry strictly increasing timestamps
pub fn validate_candle_ordering(candles: &[Candle]) -> anyhow::Result<()> {
    for window in candles.windows(2) {
        if window[1].timestamp <= window[0].timestamp {
            anyhow::bail!(
                "candles are not strictly ordered: {} then {}",
                window[0].timestamp,
                window[1].timestamp
            );
        }
    }
    Ok(())
}

/// Sequences the full decision-and-execution pipeline for one symbol
///
/// Each invocation of `run` is an independent, single-pass run: fresh
/// market data, fresh derived series, and a fresh nonce fetch inside
/// the executor, so overlapping runs never share mutable state.
pub struct Pipeline<M, R, A> {
    market: M,
    executor: BundleExecutor<R, A>,
    config: PipelineConfig,
}

impl<M: MarketData, R: BundleRelay, A: ChainAccount> Pipeline<M, R, A> {
    pub fn new(market: M, relay: R, account: A, config: PipelineConfig) -> Self {
        let executor = BundleExecutor::new(relay, account)
            .with_max_retries(config.max_retries)
            .with_retry_delay(Duration::from_millis(config.retry_delay_ms));

        Self {
            market,
            executor,
            config,
        }
    }

    pub async fn run(&self, symbol: &str) -> crate::Result<RunStatus> {
        tracing::info!("pipeline run starting for {}", symbol);

        // 1. Market data; failure or emptiness terminates the run here
        let candles = match self
            .market
            .fetch_candles(symbol, &self.config.timeframe, self.config.candle_limit)
            .await
        {
            Ok(candles) if !candles.is_empty() => candles,
            Ok(_) => {
                return Err(PipelineError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "empty candle response".to_string(),
                }
                .into())
            }
            Err(e) => {
                return Err(PipelineError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
        };
        validate_candle_ordering(&candles)?;

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let entry_price = closes[closes.len() - 1];

        // 2. Indicators and signal
        let indicators = IndicatorSet {
            sma: sma_series(&closes, self.config.sma_period),
            rsi: rsi_series(&closes, self.config.rsi_period),
            close: closes,
        };
        let signal = aggregate_signals(&indicators, &self.config.signal);
        tracing::info!("signal for {}: {:?}", symbol, signal);

        // 3. Risk: volatility, sizing and bracket levels
        let risk = RiskManager::new(&candles, self.config.atr_period);
        let atr = risk
            .latest_atr()
            .ok_or_else(|| PipelineError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!(
                    "fewer than {} candles for ATR",
                    self.config.atr_period + 1
                ),
            })?;

        let stop_distance = atr * self.config.stop_multiplier;
        let lot_size =
            risk.calculate_lot_size(self.config.account_balance, self.config.risk_ratio, stop_distance);
        let (stop_loss, take_profit) =
            risk.set_stop_levels(entry_price, atr, self.config.stop_multiplier, self.config.tp_multiplier);
        let profile = RiskProfile {
            atr,
            lot_size,
            stop_loss,
            take_profit,
        };

        // 4. Grid ladder around the entry price
        let grid = GridManager::new(
            entry_price * (1.0 - self.config.grid_span_pct),
            entry_price * (1.0 + self.config.grid_span_pct),
            self.config.grid_count,
        );
        let grid_orders = grid.generate_grid_orders(entry_price, profile.lot_size);

        // 5. Submission, only when the signal says act and sizing allows it
        let submission = if signal.is_actionable() {
            if profile.lot_size > 0.0 {
                let side = match signal.action {
                    SignalAction::Buy => OrderSide::Buy,
                    SignalAction::Sell => OrderSide::Sell,
                    SignalAction::Hold => unreachable!("hold is not actionable"),
                };
                let call = TransactionCall::PlaceOrder {
                    side,
                    price: entry_price,
                    lot: profile.lot_size,
                };
                Some(self.executor.execute(call).await?)
            } else {
                // Zero sizing is a no-trade policy outcome, not a failure
                tracing::warn!("{} signal for {} skipped: lot size is 0", signal_name(&signal), symbol);
                None
            }
        } else {
            tracing::info!("hold signal for {}, no order submitted", symbol);
            None
        };

        // 6. Top of book for the snapshot; absence is not fatal
        let (best_bid, best_ask) = match self.market.fetch_order_book(symbol).await {
            Ok(book) => (book.best_bid(), book.best_ask()),
            Err(e) => {
                tracing::warn!("order book fetch failed for {}: {}", symbol, e);
                (None, None)
            }
        };

        let status = RunStatus {
            symbol: symbol.to_string(),
            timestamp: Utc::now(),
            entry_price,
            atr: profile.atr,
            lot_size: profile.lot_size,
            stop_loss: profile.stop_loss,
            take_profit: profile.take_profit,
            grid_orders,
            signal,
            best_bid,
            best_ask,
            submission,
        };

        tracing::info!("pipeline run finished for {}", symbol);
        Ok(status)
    }
}

fn signal_name(signal: &Signal) -> &'static str {
    match signal.action {
        SignalAction::Buy => "buy",
        SignalAction::Sell => "sell",
        SignalAction::Hold => "hold",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn candle_at(minutes: i64) -> Candle {
        Candle {
            symbol: "TEST".to_string(),
            timestamp: Utc::now() + chrono::Duration::minutes(minutes),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1000.0,
        }
    }

    #[test]
    fn test_validate_candle_ordering_accepts_increasing() {
        let candles = vec![candle_at(0), candle_at(5), candle_at(10)];
        assert!(validate_candle_ordering(&candles).is_ok());
    }

    #[test]
    fn test_validate_candle_ordering_rejects_duplicates() {
        let first = candle_at(0);
        let candles = vec![first.clone(), first];
        assert!(validate_candle_ordering(&candles).is_err());
    }

    #[test]
    fn test_validate_candle_ordering_rejects_reversed() {
        let candles = vec![candle_at(10), candle_at(0)];
        assert!(validate_candle_ordering(&candles).is_err());
    }

    #[test]
    fn test_default_config_matches_run_parameters() {
        let config = PipelineConfig::default();
        assert_eq!(config.sma_period, 25);
        assert_eq!(config.rsi_period, 14);
        assert_eq!(config.atr_period, 14);
        assert_eq!(config.grid_count, 5);
        assert_eq!(config.grid_span_pct, 0.05);
        assert_eq!(config.max_retries, 3);
    }
}
