use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{Candle, OrderBook};
use crate::Result;

const DEFAULT_API_BASE: &str = "https://api.kucoin.com";
const RATE_LIMIT_RPM: u32 = 60;

// Type alias for the rate limiter to simplify signatures
type MarketRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Market data collaborator: candles and order book for a symbol
///
/// Implementations may fail or return partial/empty data; callers
/// decide whether that terminates the run.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn fetch_candles(&self, symbol: &str, timeframe: &str, limit: usize)
        -> Result<Vec<Candle>>;

    async fn fetch_order_book(&self, symbol: &str) -> Result<OrderBook>;
}

#[derive(Debug, Deserialize)]
struct KlineResponse {
    code: String,
    #[serde(default)]
    data: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OrderBookResponse {
    code: String,
    data: OrderBookData,
}

#[derive(Debug, Deserialize)]
struct OrderBookData {
    #[serde(default)]
    bids: Vec<[String; 2]>,
    #[serde(default)]
    asks: Vec<[String; 2]>,
}

/// REST market data client with per-minute rate limiting
///
/// Clones share the same rate limiter.
#[derive(Clone)]
pub struct HttpMarketData {
    client: Client,
    base_url: String,
    rate_limiter: Arc<MarketRateLimiter>,
}

impl HttpMarketData {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(RATE_LIMIT_RPM).unwrap());
        Self {
            client: Client::new(),
            base_url,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Map a compact timeframe ("1h") onto the API's kline type ("1hour")
    fn kline_type(timeframe: &str) -> &str {
        match timeframe {
            "1m" => "1min",
            "5m" => "5min",
            "15m" => "15min",
            "30m" => "30min",
            "1h" => "1hour",
            "4h" => "4hour",
            "1d" => "1day",
            "1w" => "1week",
            other => other,
        }
    }

    fn parse_candle(symbol: &str, row: &[String]) -> Result<Candle> {
        if row.len() < 6 {
            return Err(format!("malformed candle row: {} fields", row.len()).into());
        }

        let seconds: i64 = row[0].parse()?;
        let timestamp = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| format!("invalid candle timestamp: {}", seconds))?;

        // Row layout: time, open, close, high, low, volume
        Ok(Candle {
            symbol: symbol.to_string(),
            timestamp,
            open: row[1].parse()?,
            close: row[2].parse()?,
            high: row[3].parse()?,
            low: row[4].parse()?,
            volume: row[5].parse()?,
        })
    }
}

impl Default for HttpMarketData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for HttpMarketData {
    /// Fetch up to `limit` candles, oldest first
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        self.rate_limiter.until_ready().await;

        let url = format!(
            "{}/api/v1/market/candles?type={}&symbol={}",
            self.base_url,
            Self::kline_type(timeframe),
            symbol
        );

        let response: KlineResponse = self.client.get(&url).send().await?.json().await?;
        if response.code != "200000" {
            return Err(format!("candle request rejected with code {}", response.code).into());
        }

        // The API returns rows newest first
        let mut candles = Vec::with_capacity(response.data.len());
        for row in response.data.iter().rev() {
            candles.push(Self::parse_candle(symbol, row)?);
        }

        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }

        tracing::debug!("fetched {} candles for {}", candles.len(), symbol);
        Ok(candles)
    }

    async fn fetch_order_book(&self, symbol: &str) -> Result<OrderBook> {
        self.rate_limiter.until_ready().await;

        let url = format!(
            "{}/api/v1/market/orderbook/level2_20?symbol={}",
            self.base_url, symbol
        );

        let response: OrderBookResponse = self.client.get(&url).send().await?.json().await?;
        if response.code != "200000" {
            return Err(format!("order book request rejected with code {}", response.code).into());
        }

        let parse_level = |level: &[String; 2]| -> Result<(f64, f64)> {
            Ok((level[0].parse()?, level[1].parse()?))
        };

        let mut book = OrderBook::default();
        for level in &response.data.bids {
            book.bids.push(parse_level(level)?);
        }
        for level in &response.data.asks {
            book.asks.push(parse_level(level)?);
        }

        Ok(book)
    }
}
