/// CoinGecko API client with request throttling and per-endpoint caching

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::CoinGeckoConfig;
use crate::util::cache::{CacheStats, TtlCache};

use super::types::{CoinDetail, CoinMarketData, MarketChart, OhlcBar, TrendingCoin};

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Api { endpoint: &'static str, status: u16 },
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("coin {id} not found in market data")]
    CoinNotFound { id: String },
}

#[derive(serde::Deserialize)]
struct TrendingItem {
    item: TrendingCoin,
}

#[derive(serde::Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    coins: Vec<TrendingItem>,
}

#[derive(serde::Deserialize)]
struct GlobalResponse {
    data: serde_json::Value,
}

pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    min_request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
    market_cache: TtlCache<Vec<CoinMarketData>>,
    detail_cache: TtlCache<CoinDetail>,
    ohlc_cache: TtlCache<Vec<OhlcBar>>,
    chart_cache: TtlCache<MarketChart>,
    trending_cache: TtlCache<Vec<TrendingCoin>>,
    global_cache: TtlCache<serde_json::Value>,
}

impl CoinGeckoClient {
    pub fn new(config: &CoinGeckoConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).context("invalid CoinGecko API key")?;
            headers.insert("x-cg-demo-api-key", value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        info!(base_url = %config.base_url, "CoinGecko client initialized");

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            min_request_interval: Duration::from_millis(config.request_interval_ms),
            last_request: Mutex::new(None),
            market_cache: TtlCache::new(Duration::from_secs(60)),
            detail_cache: TtlCache::new(Duration::from_secs(300)),
            ohlc_cache: TtlCache::new(Duration::from_secs(300)),
            chart_cache: TtlCache::new(Duration::from_secs(300)),
            trending_cache: TtlCache::new(Duration::from_secs(300)),
            global_cache: TtlCache::new(Duration::from_secs(120)),
        })
    }

    /// Space out upstream calls so the demo-tier rate limit is respected.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.min_request_interval {
                tokio::time::sleep(self.min_request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketError> {
        self.throttle().await;

        let url = format!("{}{}", self.base_url, path);
        debug!(endpoint = endpoint, url = %url, "Fetching from CoinGecko");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| MarketError::Http { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = endpoint, status = status.as_u16(), "Upstream returned error status");
            return Err(MarketError::Api {
                endpoint,
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|source| MarketError::Decode { endpoint, source })
    }

    /// Market listing ordered by market cap, optionally with 7d sparklines.
    pub async fn get_markets(
        &self,
        page: u32,
        per_page: usize,
        sparkline: bool,
    ) -> Result<Vec<CoinMarketData>, MarketError> {
        let cache_key = format!("market_{page}_{per_page}_{sparkline}");
        if let Some(cached) = self.market_cache.get(&cache_key) {
            return Ok(cached);
        }

        let data: Vec<CoinMarketData> = self
            .get_json(
                "markets",
                "/coins/markets",
                &[
                    ("vs_currency", "usd".to_string()),
                    ("order", "market_cap_desc".to_string()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                    ("sparkline", sparkline.to_string()),
                    ("price_change_percentage", "1h,24h,7d,14d,30d".to_string()),
                    ("locale", "en".to_string()),
                ],
            )
            .await?;

        self.market_cache.insert(cache_key, data.clone());
        Ok(data)
    }

    /// Community/developer/sentiment metadata for one coin.
    pub async fn get_coin_detail(&self, coin_id: &str) -> Result<CoinDetail, MarketError> {
        let cache_key = format!("detail_{coin_id}");
        if let Some(cached) = self.detail_cache.get(&cache_key) {
            return Ok(cached);
        }

        let data: CoinDetail = self
            .get_json(
                "coin_detail",
                &format!("/coins/{coin_id}"),
                &[
                    ("localization", "false".to_string()),
                    ("tickers", "false".to_string()),
                    ("market_data", "true".to_string()),
                    ("community_data", "true".to_string()),
                    ("developer_data", "true".to_string()),
                    ("sparkline", "false".to_string()),
                ],
            )
            .await?;

        self.detail_cache.insert(cache_key, data.clone());
        Ok(data)
    }

    /// Daily candles. The endpoint returns positional arrays.
    pub async fn get_ohlc(&self, coin_id: &str, days: u32) -> Result<Vec<OhlcBar>, MarketError> {
        let cache_key = format!("ohlc_{coin_id}_{days}");
        if let Some(cached) = self.ohlc_cache.get(&cache_key) {
            return Ok(cached);
        }

        let raw: Vec<[f64; 5]> = self
            .get_json(
                "ohlc",
                &format!("/coins/{coin_id}/ohlc"),
                &[
                    ("vs_currency", "usd".to_string()),
                    ("days", days.to_string()),
                ],
            )
            .await?;

        let bars: Vec<OhlcBar> = raw
            .into_iter()
            .map(|[timestamp, open, high, low, close]| OhlcBar {
                timestamp: timestamp as i64,
                open,
                high,
                low,
                close,
            })
            .collect();

        self.ohlc_cache.insert(cache_key, bars.clone());
        Ok(bars)
    }

    pub async fn get_market_chart(
        &self,
        coin_id: &str,
        days: u32,
    ) -> Result<MarketChart, MarketError> {
        let cache_key = format!("chart_{coin_id}_{days}");
        if let Some(cached) = self.chart_cache.get(&cache_key) {
            return Ok(cached);
        }

        let data: MarketChart = self
            .get_json(
                "market_chart",
                &format!("/coins/{coin_id}/market_chart"),
                &[
                    ("vs_currency", "usd".to_string()),
                    ("days", days.to_string()),
                ],
            )
            .await?;

        self.chart_cache.insert(cache_key, data.clone());
        Ok(data)
    }

    pub async fn get_trending(&self) -> Result<Vec<TrendingCoin>, MarketError> {
        if let Some(cached) = self.trending_cache.get("trending") {
            return Ok(cached);
        }

        let response: TrendingResponse = self
            .get_json("trending", "/search/trending", &[])
            .await?;
        let coins: Vec<TrendingCoin> = response.coins.into_iter().map(|c| c.item).collect();

        self.trending_cache.insert("trending", coins.clone());
        Ok(coins)
    }

    pub async fn get_global(&self) -> Result<serde_json::Value, MarketError> {
        if let Some(cached) = self.global_cache.get("global") {
            return Ok(cached);
        }

        let response: GlobalResponse = self.get_json("global", "/global", &[]).await?;

        self.global_cache.insert("global", response.data.clone());
        Ok(response.data)
    }

    /// Aggregate hit/miss counters across all endpoint caches.
    pub fn cache_stats(&self) -> CacheStats {
        let all = [
            self.market_cache.stats(),
            self.detail_cache.stats(),
            self.ohlc_cache.stats(),
            self.chart_cache.stats(),
            self.trending_cache.stats(),
            self.global_cache.stats(),
        ];
        CacheStats {
            keys: all.iter().map(|s| s.keys).sum(),
            hits: all.iter().map(|s| s.hits).sum(),
            misses: all.iter().map(|s| s.misses).sum(),
        }
    }
}
