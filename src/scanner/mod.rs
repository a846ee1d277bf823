/// Market scanner: runs the scoring pipeline over a market snapshot
///
/// Per-asset scoring is isolated: a malformed snapshot row falls back to
/// a degraded basic analysis and stays in the result set. One bad asset
/// never aborts a scan.

pub mod filter;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::analysis::{fundamental, scoring, technical};
use crate::analysis::{FundamentalAnalysis, MomentumScore, TechnicalIndicators};
use crate::config::ScannerConfig;
use crate::market::{CoinGeckoClient, CoinMarketData, MarketChart, MarketError, OhlcBar};
use crate::util::cache::TtlCache;

pub use filter::{ScanFilters, SortKey};

/// Ratio of 24h volume assumed as the running average when only the
/// market listing is available.
const AVG_VOLUME_ESTIMATE: f64 = 0.8;

/// Fully scored asset, the unit of scanner output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub market_cap_rank: Option<u32>,
    pub volume_24h: f64,
    pub price_change_24h: f64,
    pub price_change_7d: f64,
    pub price_change_30d: f64,
    /// Trailing window of the 7d sparkline, for rendering
    pub sparkline: Vec<f64>,
    pub technical_indicators: TechnicalIndicators,
    pub fundamental_analysis: FundamentalAnalysis,
    pub momentum_score: MomentumScore,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub prices: Vec<[f64; 2]>,
    pub volumes: Vec<[f64; 2]>,
    pub market_caps: Vec<[f64; 2]>,
}

/// Single-asset deep dive: scan output plus OHLC and chart series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedCoin {
    #[serde(flatten)]
    pub coin: ScannedCoin,
    pub ohlc: Vec<OhlcBar>,
    pub chart_data: ChartData,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("malformed market snapshot for {id}: {reason}")]
    MalformedSnapshot { id: String, reason: String },
}

fn sparkline_prices(coin: &CoinMarketData) -> Vec<f64> {
    coin.sparkline_in_7d
        .as_ref()
        .map(|s| s.price.clone())
        .unwrap_or_default()
}

fn validate_snapshot(coin: &CoinMarketData) -> Result<(), AnalysisError> {
    let check = |value: f64, field: &str| {
        if value.is_finite() {
            Ok(())
        } else {
            Err(AnalysisError::MalformedSnapshot {
                id: coin.id.clone(),
                reason: format!("non-finite {field}"),
            })
        }
    };

    check(coin.current_price, "current_price")?;
    check(coin.market_cap, "market_cap")?;
    check(coin.total_volume, "total_volume")?;

    if let Some(sparkline) = &coin.sparkline_in_7d {
        if sparkline.price.iter().any(|p| !p.is_finite()) {
            return Err(AnalysisError::MalformedSnapshot {
                id: coin.id.clone(),
                reason: "non-finite sparkline point".to_string(),
            });
        }
    }

    Ok(())
}

fn build_scanned(
    coin: &CoinMarketData,
    sparkline: Vec<f64>,
    ta: TechnicalIndicators,
    fa: FundamentalAnalysis,
    momentum: MomentumScore,
) -> ScannedCoin {
    let tail = sparkline.len().saturating_sub(48);
    ScannedCoin {
        id: coin.id.clone(),
        symbol: coin.symbol.clone(),
        name: coin.name.clone(),
        image: coin.image.clone(),
        current_price: coin.current_price,
        market_cap: coin.market_cap,
        market_cap_rank: coin.market_cap_rank,
        volume_24h: coin.total_volume,
        price_change_24h: coin.price_change_percentage_24h.unwrap_or(0.0),
        price_change_7d: coin.price_change_percentage_7d_in_currency.unwrap_or(0.0),
        price_change_30d: coin.price_change_percentage_30d_in_currency.unwrap_or(0.0),
        sparkline: sparkline[tail..].to_vec(),
        technical_indicators: ta,
        fundamental_analysis: fa,
        momentum_score: momentum,
        last_updated: coin.last_updated.clone(),
    }
}

/// Standard per-asset pipeline: sparkline TA with an estimated average
/// volume, FA without detail metadata, momentum over the 30d change.
pub fn analyze_coin(coin: &CoinMarketData) -> Result<ScannedCoin, AnalysisError> {
    validate_snapshot(coin)?;

    let sparkline = sparkline_prices(coin);
    let ta = technical::analyze_sparkline(
        &sparkline,
        Some(coin.total_volume),
        Some(coin.total_volume * AVG_VOLUME_ESTIMATE),
    );
    let fa = fundamental::analyze(coin, None);
    let price_change_30d = coin.price_change_percentage_30d_in_currency.unwrap_or(0.0);
    let momentum = scoring::calculate(&ta, &fa, price_change_30d);

    Ok(build_scanned(coin, sparkline, ta, fa, momentum))
}

/// Degraded fallback when the standard pipeline rejects a snapshot:
/// non-finite sparkline points are dropped, no volume context, and the
/// 30-day change is assumed flat.
pub fn basic_analysis(coin: &CoinMarketData) -> ScannedCoin {
    let sparkline: Vec<f64> = sparkline_prices(coin)
        .into_iter()
        .filter(|p| p.is_finite())
        .collect();

    let ta = technical::analyze_sparkline(&sparkline, None, None);
    let fa = fundamental::analyze(coin, None);
    let momentum = scoring::calculate(&ta, &fa, 0.0);

    let mut scanned = build_scanned(coin, sparkline, ta, fa, momentum);
    if !scanned.current_price.is_finite() {
        scanned.current_price = 0.0;
    }
    scanned
}

/// Pure scan over an already-fetched snapshot list.
pub fn scan_snapshot(coins: &[CoinMarketData], filters: &ScanFilters) -> Vec<ScannedCoin> {
    let mut results = Vec::with_capacity(coins.len());

    for coin in coins {
        if !filters.passes_pre_filters(coin) {
            continue;
        }

        match analyze_coin(coin) {
            Ok(scanned) => {
                if filters.passes_post_filters(&scanned) {
                    results.push(scanned);
                }
            }
            Err(e) => {
                warn!(coin_id = %coin.id, error = %e, "Scoring failed - keeping asset with basic analysis");
                results.push(basic_analysis(coin));
            }
        }
    }

    filter::sort_scanned(&mut results, filters.sort_by);
    results
}

pub struct Scanner {
    client: Arc<CoinGeckoClient>,
    scan_cache: TtlCache<Vec<ScannedCoin>>,
    detail_cache: TtlCache<DetailedCoin>,
}

impl Scanner {
    pub fn new(client: Arc<CoinGeckoClient>, config: &ScannerConfig) -> Self {
        Self {
            client,
            scan_cache: TtlCache::new(Duration::from_secs(config.scan_cache_ttl_secs)),
            detail_cache: TtlCache::new(Duration::from_secs(config.detail_cache_ttl_secs)),
        }
    }

    /// Scan the market-cap-ordered listing and return scored, filtered,
    /// sorted results. Results are cached per filter set.
    #[instrument(skip(self))]
    pub async fn scan_market(&self, filters: &ScanFilters) -> Result<Vec<ScannedCoin>, MarketError> {
        let cache_key = filters.cache_key();
        if let Some(cached) = self.scan_cache.get(&cache_key) {
            debug!(results = cached.len(), "Scan served from cache");
            return Ok(cached);
        }

        let per_page = filters.limit.clamp(1, 100);
        let market = self.client.get_markets(1, per_page, true).await?;

        let results = scan_snapshot(&market, filters);
        info!(
            scanned = market.len(),
            kept = results.len(),
            "🔍 Market scan complete"
        );

        self.scan_cache.insert(cache_key, results.clone());
        Ok(results)
    }

    /// Deep dive on one asset: OHLC-driven technical analysis (with the
    /// sparkline's volume signal merged in, since OHLC carries no
    /// volume) and fundamentals from the full detail metadata.
    #[instrument(skip(self))]
    pub async fn detailed_analysis(&self, coin_id: &str) -> Result<DetailedCoin, MarketError> {
        let cache_key = format!("detailed_{coin_id}");
        if let Some(cached) = self.detail_cache.get(&cache_key) {
            return Ok(cached);
        }

        let (market, detail, ohlc, chart) = tokio::try_join!(
            self.client.get_markets(1, 250, true),
            self.client.get_coin_detail(coin_id),
            self.client.get_ohlc(coin_id, 30),
            self.client.get_market_chart(coin_id, 30),
        )?;

        let coin = market
            .iter()
            .find(|c| c.id == coin_id)
            .ok_or_else(|| MarketError::CoinNotFound {
                id: coin_id.to_string(),
            })?;

        let sparkline = sparkline_prices(coin);
        let ta_sparkline = technical::analyze_sparkline(
            &sparkline,
            Some(coin.total_volume),
            Some(coin.total_volume * AVG_VOLUME_ESTIMATE),
        );
        let ta = TechnicalIndicators {
            volume_analysis: ta_sparkline.volume_analysis,
            ..technical::analyze_ohlc(&ohlc)
        };

        let fa = fundamental::analyze(coin, Some(&detail));
        let price_change_30d = coin.price_change_percentage_30d_in_currency.unwrap_or(0.0);
        let momentum = scoring::calculate(&ta, &fa, price_change_30d);

        let result = DetailedCoin {
            coin: build_scanned(coin, sparkline, ta, fa, momentum),
            ohlc,
            chart_data: chart_data(chart),
        };

        info!(coin_id = %coin_id, score = result.coin.momentum_score.overall_score, "Detailed analysis complete");
        self.detail_cache.insert(cache_key, result.clone());
        Ok(result)
    }

    pub fn client(&self) -> &CoinGeckoClient {
        &self.client
    }
}

fn chart_data(chart: MarketChart) -> ChartData {
    ChartData {
        prices: chart.prices,
        volumes: chart.total_volumes,
        market_caps: chart.market_caps,
    }
}
