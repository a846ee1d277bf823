/// Fundamental analysis engine
///
/// Maps market structure and community/developer metadata into banded
/// 0-100 sub-scores and one weighted overall score. Detail metadata is
/// optional everywhere: a missing section degrades to its neutral
/// default, never to an error.

use serde::{Deserialize, Serialize};

use crate::market::{CoinDetail, CoinMarketData};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyMetrics {
    pub circulating_ratio: f64,
    pub is_deflationary: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalAnalysis {
    pub market_cap_score: f64,
    pub volume_to_market_cap_ratio: f64,
    pub supply_metrics: SupplyMetrics,
    pub community_score: f64,
    pub developer_score: f64,
    pub sentiment_score: f64,
    pub ath_recovery_potential: f64,
    pub overall_fundamental_score: f64,
}

/// Rank bands: top-10 assets score 95, unranked assets 0.
pub fn market_cap_score(rank: Option<u32>) -> f64 {
    match rank {
        None | Some(0) => 0.0,
        Some(r) if r <= 10 => 95.0,
        Some(r) if r <= 25 => 85.0,
        Some(r) if r <= 50 => 75.0,
        Some(r) if r <= 100 => 65.0,
        Some(r) if r <= 250 => 50.0,
        Some(r) if r <= 500 => 35.0,
        _ => 20.0,
    }
}

pub fn volume_to_market_cap(volume: f64, market_cap: f64) -> f64 {
    if market_cap == 0.0 {
        return 0.0;
    }
    volume / market_cap
}

/// Circulating ratio against the tightest known supply ceiling:
/// max supply, falling back to total supply, then circulating itself.
pub fn supply_metrics(
    circulating_supply: f64,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
) -> SupplyMetrics {
    let positive = |v: Option<f64>| v.filter(|s| *s > 0.0 && s.is_finite());
    let effective_total = positive(max_supply)
        .or_else(|| positive(total_supply))
        .unwrap_or(circulating_supply);

    let circulating_ratio = if effective_total > 0.0 {
        circulating_supply / effective_total
    } else {
        1.0
    };
    let is_deflationary = positive(max_supply).is_some();

    SupplyMetrics {
        circulating_ratio,
        is_deflationary,
    }
}

pub fn community_score(detail: Option<&CoinDetail>) -> f64 {
    let Some(detail) = detail else {
        return 50.0; // neutral default
    };

    let community = detail.community_data.as_ref();
    let mut score = 0.0;
    let mut factors = 0u32;

    let twitter = community
        .and_then(|c| c.twitter_followers)
        .unwrap_or(0.0);
    score += if twitter > 1_000_000.0 {
        100.0
    } else if twitter > 500_000.0 {
        85.0
    } else if twitter > 100_000.0 {
        70.0
    } else if twitter > 50_000.0 {
        55.0
    } else if twitter > 10_000.0 {
        40.0
    } else {
        20.0
    };
    factors += 1;

    let reddit_subs = community
        .and_then(|c| c.reddit_subscribers)
        .unwrap_or(0.0);
    score += if reddit_subs > 500_000.0 {
        100.0
    } else if reddit_subs > 100_000.0 {
        80.0
    } else if reddit_subs > 50_000.0 {
        60.0
    } else if reddit_subs > 10_000.0 {
        40.0
    } else {
        15.0
    };
    factors += 1;

    let posts = community
        .and_then(|c| c.reddit_average_posts_48h)
        .unwrap_or(0.0);
    let comments = community
        .and_then(|c| c.reddit_average_comments_48h)
        .unwrap_or(0.0);
    score += (posts * 5.0 + comments * 2.0).min(100.0);
    factors += 1;

    let watchlist = detail.watchlist_portfolio_users.unwrap_or(0.0);
    score += if watchlist > 1_000_000.0 {
        100.0
    } else if watchlist > 500_000.0 {
        80.0
    } else if watchlist > 100_000.0 {
        60.0
    } else if watchlist > 10_000.0 {
        40.0
    } else {
        15.0
    };
    factors += 1;

    (score / factors as f64).round()
}

pub fn developer_score(detail: Option<&CoinDetail>) -> f64 {
    let Some(detail) = detail else {
        return 50.0;
    };
    let Some(dev) = detail.developer_data.as_ref() else {
        return 30.0; // detail fetched, but no repository data
    };

    let mut score = 0.0;
    let mut factors = 0u32;

    let stars = dev.stars.unwrap_or(0.0);
    score += if stars > 10_000.0 {
        100.0
    } else if stars > 5_000.0 {
        85.0
    } else if stars > 1_000.0 {
        70.0
    } else if stars > 500.0 {
        50.0
    } else if stars > 100.0 {
        35.0
    } else {
        15.0
    };
    factors += 1;

    let forks = dev.forks.unwrap_or(0.0);
    score += if forks > 5_000.0 {
        100.0
    } else if forks > 1_000.0 {
        80.0
    } else if forks > 500.0 {
        60.0
    } else if forks > 100.0 {
        40.0
    } else {
        15.0
    };
    factors += 1;

    let commits = dev.commit_count_4_weeks.unwrap_or(0.0);
    score += if commits > 200.0 {
        100.0
    } else if commits > 100.0 {
        85.0
    } else if commits > 50.0 {
        70.0
    } else if commits > 20.0 {
        55.0
    } else if commits > 5.0 {
        35.0
    } else {
        10.0
    };
    factors += 1;

    // Issue resolution only counts when the project has issues at all
    let total_issues = dev.total_issues.unwrap_or(0.0);
    if total_issues > 0.0 {
        let closed = dev.closed_issues.unwrap_or(0.0);
        score += (closed / total_issues * 100.0).round();
        factors += 1;
    }

    let prs_merged = dev.pull_requests_merged.unwrap_or(0.0);
    score += if prs_merged > 1_000.0 {
        100.0
    } else if prs_merged > 500.0 {
        80.0
    } else if prs_merged > 100.0 {
        60.0
    } else if prs_merged > 50.0 {
        40.0
    } else {
        15.0
    };
    factors += 1;

    (score / factors as f64).round()
}

pub fn sentiment_score(detail: Option<&CoinDetail>) -> f64 {
    match detail.and_then(|d| d.sentiment_votes_up_percentage) {
        Some(up_pct) => up_pct.round(),
        None => 50.0,
    }
}

/// Distance from the all-time high, scored as room to recover:
/// the further below ATH, the higher the score.
pub fn ath_recovery_potential(ath: f64, ath_change_percent: f64) -> f64 {
    if ath == 0.0 {
        return 0.0;
    }
    let distance = ath_change_percent.abs();
    if distance > 90.0 {
        95.0
    } else if distance > 80.0 {
        85.0
    } else if distance > 70.0 {
        75.0
    } else if distance > 50.0 {
        60.0
    } else if distance > 30.0 {
        45.0
    } else if distance > 10.0 {
        30.0
    } else {
        15.0
    }
}

pub fn analyze(market: &CoinMarketData, detail: Option<&CoinDetail>) -> FundamentalAnalysis {
    let market_cap_score = market_cap_score(market.market_cap_rank);
    let volume_to_market_cap_ratio = volume_to_market_cap(market.total_volume, market.market_cap);
    let supply = supply_metrics(
        market.circulating_supply,
        market.total_supply,
        market.max_supply,
    );

    let community_score = community_score(detail);
    let developer_score = developer_score(detail);
    let sentiment_score = sentiment_score(detail);
    let ath_recovery = ath_recovery_potential(market.ath, market.ath_change_percentage);

    let overall = (market_cap_score * 0.20
        + (volume_to_market_cap_ratio * 500.0).min(100.0) * 0.15
        + (if supply.is_deflationary { 80.0 } else { 40.0 }) * 0.10
        + community_score * 0.15
        + developer_score * 0.15
        + sentiment_score * 0.10
        + ath_recovery * 0.15)
        .round();

    FundamentalAnalysis {
        market_cap_score,
        volume_to_market_cap_ratio,
        supply_metrics: supply,
        community_score,
        developer_score,
        sentiment_score,
        ath_recovery_potential: ath_recovery,
        overall_fundamental_score: overall.min(100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{CommunityData, DeveloperData};

    fn snapshot() -> CoinMarketData {
        CoinMarketData {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            image: String::new(),
            current_price: 60_000.0,
            market_cap: 1.2e12,
            market_cap_rank: Some(1),
            total_volume: 3.0e10,
            price_change_percentage_24h: Some(1.5),
            price_change_percentage_7d_in_currency: Some(4.0),
            price_change_percentage_30d_in_currency: Some(-2.0),
            circulating_supply: 19_000_000.0,
            total_supply: Some(21_000_000.0),
            max_supply: Some(21_000_000.0),
            ath: 69_000.0,
            ath_change_percentage: -13.0,
            last_updated: String::new(),
            sparkline_in_7d: None,
        }
    }

    #[test]
    fn market_cap_rank_bands() {
        assert_eq!(market_cap_score(Some(5)), 95.0);
        assert_eq!(market_cap_score(Some(10)), 95.0);
        assert_eq!(market_cap_score(Some(11)), 85.0);
        assert_eq!(market_cap_score(Some(50)), 75.0);
        assert_eq!(market_cap_score(Some(100)), 65.0);
        assert_eq!(market_cap_score(Some(250)), 50.0);
        assert_eq!(market_cap_score(Some(500)), 35.0);
        assert_eq!(market_cap_score(Some(501)), 20.0);
        assert_eq!(market_cap_score(None), 0.0);
    }

    #[test]
    fn volume_ratio_handles_zero_market_cap() {
        assert_eq!(volume_to_market_cap(1_000.0, 0.0), 0.0);
        assert!((volume_to_market_cap(50.0, 1_000.0) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn supply_prefers_max_then_total() {
        let m = supply_metrics(90.0, Some(100.0), Some(120.0));
        assert!((m.circulating_ratio - 0.75).abs() < 1e-12);
        assert!(m.is_deflationary);

        let m = supply_metrics(90.0, Some(100.0), None);
        assert!((m.circulating_ratio - 0.9).abs() < 1e-12);
        assert!(!m.is_deflationary);

        // Zero max supply is no cap at all
        let m = supply_metrics(90.0, None, Some(0.0));
        assert!((m.circulating_ratio - 1.0).abs() < 1e-12);
        assert!(!m.is_deflationary);

        // Nothing known: ratio pins to 1 rather than dividing by zero
        let m = supply_metrics(0.0, None, None);
        assert_eq!(m.circulating_ratio, 1.0);
    }

    #[test]
    fn community_defaults_neutral_without_detail() {
        assert_eq!(community_score(None), 50.0);
    }

    #[test]
    fn community_score_bands_large_project() {
        let detail = CoinDetail {
            community_data: Some(CommunityData {
                twitter_followers: Some(2_000_000.0),
                reddit_subscribers: Some(600_000.0),
                reddit_average_posts_48h: Some(10.0),
                reddit_average_comments_48h: Some(50.0),
            }),
            watchlist_portfolio_users: Some(1_500_000.0),
            ..CoinDetail::default()
        };
        // (100 + 100 + 100 + 100) / 4
        assert_eq!(community_score(Some(&detail)), 100.0);
    }

    #[test]
    fn community_score_low_but_nonzero_for_ghost_town() {
        let detail = CoinDetail::default();
        // (20 + 15 + 0 + 15) / 4 = 12.5 -> 13
        assert_eq!(community_score(Some(&detail)), 13.0);
    }

    #[test]
    fn developer_defaults() {
        assert_eq!(developer_score(None), 50.0);
        let detail = CoinDetail::default();
        assert_eq!(developer_score(Some(&detail)), 30.0);
    }

    #[test]
    fn developer_issue_ratio_only_counts_with_issues() {
        let detail = CoinDetail {
            developer_data: Some(DeveloperData {
                stars: Some(20_000.0),
                forks: Some(6_000.0),
                commit_count_4_weeks: Some(300.0),
                total_issues: Some(0.0),
                closed_issues: Some(0.0),
                pull_requests_merged: Some(2_000.0),
            }),
            ..CoinDetail::default()
        };
        // Four factors of 100 each; the issue factor is skipped entirely
        assert_eq!(developer_score(Some(&detail)), 100.0);

        let detail = CoinDetail {
            developer_data: Some(DeveloperData {
                stars: Some(20_000.0),
                forks: Some(6_000.0),
                commit_count_4_weeks: Some(300.0),
                total_issues: Some(100.0),
                closed_issues: Some(50.0),
                pull_requests_merged: Some(2_000.0),
            }),
            ..CoinDetail::default()
        };
        // (100 + 100 + 100 + 50 + 100) / 5
        assert_eq!(developer_score(Some(&detail)), 90.0);
    }

    #[test]
    fn sentiment_passthrough_and_default() {
        assert_eq!(sentiment_score(None), 50.0);
        let detail = CoinDetail {
            sentiment_votes_up_percentage: Some(73.4),
            ..CoinDetail::default()
        };
        assert_eq!(sentiment_score(Some(&detail)), 73.0);
    }

    #[test]
    fn ath_recovery_scores_distance() {
        assert_eq!(ath_recovery_potential(0.0, -50.0), 0.0);
        assert_eq!(ath_recovery_potential(100.0, -95.0), 95.0);
        assert_eq!(ath_recovery_potential(100.0, -85.0), 85.0);
        assert_eq!(ath_recovery_potential(100.0, -55.0), 60.0);
        assert_eq!(ath_recovery_potential(100.0, -5.0), 15.0);
    }

    #[test]
    fn overall_score_stays_in_range_on_extremes() {
        let mut market = snapshot();
        market.market_cap = 0.0;
        market.total_volume = 0.0;
        market.max_supply = Some(0.0);
        market.ath = 0.0;
        market.market_cap_rank = None;
        let fa = analyze(&market, None);
        assert!((0.0..=100.0).contains(&fa.overall_fundamental_score));

        // Everything maxed: the weighted sum still caps at 100
        let mut market = snapshot();
        market.total_volume = market.market_cap; // ratio * 500 saturates
        market.ath_change_percentage = -99.0;
        let fa = analyze(&market, None);
        assert!(fa.overall_fundamental_score <= 100.0);
    }

    #[test]
    fn rank_five_deflationary_scenario() {
        let mut market = snapshot();
        market.market_cap_rank = Some(5);
        market.max_supply = Some(21_000_000.0);
        market.circulating_supply = 19_000_000.0;

        let fa = analyze(&market, None);
        assert_eq!(fa.market_cap_score, 95.0);
        assert!(fa.supply_metrics.is_deflationary);
        assert!((fa.supply_metrics.circulating_ratio - 19.0 / 21.0).abs() < 1e-9);
        // No detail metadata at all: community and developer sit at 50
        assert_eq!(fa.community_score, 50.0);
        assert_eq!(fa.developer_score, 50.0);
        assert_eq!(fa.sentiment_score, 50.0);
    }
}
