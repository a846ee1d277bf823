/// Scan filter parameters and sorting

use serde::{Deserialize, Serialize};

use crate::analysis::TradeSignal;
use crate::market::CoinMarketData;

use super::ScannedCoin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Momentum,
    PriceChange,
    Volume,
    MarketCap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFilters {
    pub min_market_cap: Option<f64>,
    pub max_market_cap: Option<f64>,
    pub min_volume: Option<f64>,
    pub min_momentum_score: Option<f64>,
    /// Only keep assets whose trade signal is in this set
    pub signals: Option<Vec<TradeSignal>>,
    pub sort_by: SortKey,
    pub limit: usize,
}

impl Default for ScanFilters {
    fn default() -> Self {
        Self {
            min_market_cap: None,
            max_market_cap: None,
            min_volume: None,
            min_momentum_score: None,
            signals: None,
            sort_by: SortKey::Momentum,
            limit: 50,
        }
    }
}

impl ScanFilters {
    /// Cheap rejection before any scoring work happens.
    pub fn passes_pre_filters(&self, coin: &CoinMarketData) -> bool {
        if let Some(min) = self.min_market_cap {
            if coin.market_cap < min {
                return false;
            }
        }
        if let Some(max) = self.max_market_cap {
            if coin.market_cap > max {
                return false;
            }
        }
        if let Some(min) = self.min_volume {
            if coin.total_volume < min {
                return false;
            }
        }
        true
    }

    pub fn passes_post_filters(&self, scanned: &ScannedCoin) -> bool {
        if let Some(min) = self.min_momentum_score {
            if scanned.momentum_score.overall_score < min {
                return false;
            }
        }
        if let Some(signals) = &self.signals {
            if !signals.is_empty() && !signals.contains(&scanned.momentum_score.signal) {
                return false;
            }
        }
        true
    }

    pub fn cache_key(&self) -> String {
        format!(
            "scan_{}",
            serde_json::to_string(self).unwrap_or_else(|_| "default".to_string())
        )
    }
}

/// Descending sort on the selected key. `sort_by` is stable, so tied
/// assets keep their snapshot (market-cap) order.
pub fn sort_scanned(coins: &mut [ScannedCoin], key: SortKey) {
    coins.sort_by(|a, b| {
        let (va, vb) = match key {
            SortKey::Momentum => (a.momentum_score.overall_score, b.momentum_score.overall_score),
            SortKey::PriceChange => (a.price_change_24h, b.price_change_24h),
            SortKey::Volume => (a.volume_24h, b.volume_24h),
            SortKey::MarketCap => (a.market_cap, b.market_cap),
        };
        vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(market_cap: f64, volume: f64) -> CoinMarketData {
        CoinMarketData {
            id: "test".to_string(),
            symbol: "tst".to_string(),
            name: "Test".to_string(),
            image: String::new(),
            current_price: 1.0,
            market_cap,
            market_cap_rank: Some(100),
            total_volume: volume,
            price_change_percentage_24h: None,
            price_change_percentage_7d_in_currency: None,
            price_change_percentage_30d_in_currency: None,
            circulating_supply: 0.0,
            total_supply: None,
            max_supply: None,
            ath: 0.0,
            ath_change_percentage: 0.0,
            last_updated: String::new(),
            sparkline_in_7d: None,
        }
    }

    #[test]
    fn pre_filters_bound_market_cap_and_volume() {
        let filters = ScanFilters {
            min_market_cap: Some(1_000_000.0),
            max_market_cap: Some(1_000_000_000.0),
            min_volume: Some(10_000.0),
            ..ScanFilters::default()
        };

        assert!(filters.passes_pre_filters(&coin(5_000_000.0, 20_000.0)));
        assert!(!filters.passes_pre_filters(&coin(500_000.0, 20_000.0)));
        assert!(!filters.passes_pre_filters(&coin(2_000_000_000.0, 20_000.0)));
        assert!(!filters.passes_pre_filters(&coin(5_000_000.0, 5_000.0)));
    }

    #[test]
    fn no_filters_passes_everything() {
        let filters = ScanFilters::default();
        assert!(filters.passes_pre_filters(&coin(0.0, 0.0)));
    }

    #[test]
    fn cache_key_distinguishes_filter_sets() {
        let a = ScanFilters::default();
        let b = ScanFilters {
            min_momentum_score: Some(55.0),
            ..ScanFilters::default()
        };
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), ScanFilters::default().cache_key());
    }
}
