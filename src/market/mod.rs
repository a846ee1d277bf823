/// CoinGecko market data source

pub mod client;
pub mod types;

pub use client::{CoinGeckoClient, MarketError};
pub use types::*;
