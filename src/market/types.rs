/// CoinGecko wire types
///
/// Field names mirror the upstream JSON. Anything the API is known to
/// omit for long-tail assets is an Option; the analysis layer supplies
/// the documented neutral defaults.

use serde::{Deserialize, Serialize};

/// One row of the `/coins/markets` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinMarketData {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub market_cap: f64,
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub total_volume: f64,
    pub price_change_percentage_24h: Option<f64>,
    pub price_change_percentage_7d_in_currency: Option<f64>,
    pub price_change_percentage_30d_in_currency: Option<f64>,
    #[serde(default)]
    pub circulating_supply: f64,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    #[serde(default)]
    pub ath: f64,
    #[serde(default)]
    pub ath_change_percentage: f64,
    #[serde(default)]
    pub last_updated: String,
    pub sparkline_in_7d: Option<Sparkline>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

/// Subset of `/coins/{id}` used for fundamental scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinDetail {
    #[serde(default)]
    pub id: String,
    pub community_data: Option<CommunityData>,
    pub developer_data: Option<DeveloperData>,
    pub sentiment_votes_up_percentage: Option<f64>,
    pub watchlist_portfolio_users: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityData {
    pub twitter_followers: Option<f64>,
    pub reddit_subscribers: Option<f64>,
    pub reddit_average_posts_48h: Option<f64>,
    pub reddit_average_comments_48h: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeveloperData {
    pub forks: Option<f64>,
    pub stars: Option<f64>,
    pub total_issues: Option<f64>,
    pub closed_issues: Option<f64>,
    pub pull_requests_merged: Option<f64>,
    pub commit_count_4_weeks: Option<f64>,
}

/// Daily candle from `/coins/{id}/ohlc`. The endpoint has no volume.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OhlcBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// `/coins/{id}/market_chart` series as `[timestamp_ms, value]` pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<[f64; 2]>,
    #[serde(default)]
    pub market_caps: Vec<[f64; 2]>,
    #[serde(default)]
    pub total_volumes: Vec<[f64; 2]>,
}

/// Entry from `/search/trending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub thumb: String,
    #[serde(default)]
    pub small: String,
    #[serde(default)]
    pub large: String,
    #[serde(default)]
    pub slug: String,
    pub price_btc: Option<f64>,
    pub score: Option<i32>,
}
