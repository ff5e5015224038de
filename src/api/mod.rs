pub mod market;

pub use market::{HttpMarketData, MarketData};
