/// Simulated portfolio construction
///
/// Selects up to five assets from a momentum scan under a risk profile
/// and allocates a hypothetical investment across them. Everything here
/// is a projection over the scanner's advisory scores; nothing is
/// executed.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::analysis::RiskLevel;
use crate::market::MarketError;
use crate::scanner::{ScanFilters, ScannedCoin, Scanner, SortKey};

/// Candidate pool width for portfolio scans.
const CANDIDATE_POOL: usize = 80;
const MAX_SELECTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Low,
    #[default]
    Medium,
    High,
}

impl std::str::FromStr for RiskProfile {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(()),
        }
    }
}

/// Per-profile constants, grouped so each profile can be tested as one
/// unit instead of scattering conditionals through the pipeline.
pub struct RiskProfileParams {
    pub min_momentum_score: f64,
    pub allowed_risk_levels: &'static [RiskLevel],
    pub allocation_exponent: f64,
    pub return_adjustment: f64,
    pub projection_horizon_days: f64,
    pub max_projected_days: i64,
}

static LOW_PROFILE: RiskProfileParams = RiskProfileParams {
    min_momentum_score: 58.0,
    allowed_risk_levels: &[RiskLevel::Low, RiskLevel::Medium],
    allocation_exponent: 0.9,
    return_adjustment: 0.88,
    projection_horizon_days: 60.0,
    max_projected_days: 90,
};

static MEDIUM_PROFILE: RiskProfileParams = RiskProfileParams {
    min_momentum_score: 55.0,
    allowed_risk_levels: &[RiskLevel::Low, RiskLevel::Medium, RiskLevel::High],
    allocation_exponent: 1.0,
    return_adjustment: 1.0,
    projection_horizon_days: 45.0,
    max_projected_days: 70,
};

static HIGH_PROFILE: RiskProfileParams = RiskProfileParams {
    min_momentum_score: 50.0,
    allowed_risk_levels: &[RiskLevel::Medium, RiskLevel::High, RiskLevel::Extreme],
    allocation_exponent: 1.24,
    return_adjustment: 1.12,
    projection_horizon_days: 30.0,
    max_projected_days: 50,
};

impl RiskProfile {
    pub fn params(self) -> &'static RiskProfileParams {
        match self {
            RiskProfile::Low => &LOW_PROFILE,
            RiskProfile::Medium => &MEDIUM_PROFILE,
            RiskProfile::High => &HIGH_PROFILE,
        }
    }
}

fn risk_bucket(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Low => 1.0,
        RiskLevel::Medium => 2.0,
        RiskLevel::High => 3.0,
        RiskLevel::Extreme => 4.0,
    }
}

fn risk_score(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Low => 20.0,
        RiskLevel::Medium => 40.0,
        RiskLevel::High => 65.0,
        RiskLevel::Extreme => 90.0,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub coin_id: String,
    pub symbol: String,
    pub name: String,
    pub allocation_percent: f64,
    pub invested_amount: f64,
    pub current_value: f64,
    pub return_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSimulation {
    pub initial_investment: f64,
    pub target_amount: f64,
    pub current_value: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub allocations: Vec<Allocation>,
    pub projected_days: i64,
    pub risk_score: f64,
    pub risk_profile: RiskProfile,
}

/// Profile-specific ranking of one scanned asset. Low profiles lean on
/// market cap and confidence and punish risk hard; high profiles chase
/// potential and volatility.
fn profile_score(profile: RiskProfile, coin: &ScannedCoin) -> f64 {
    let base = coin.momentum_score.overall_score;
    let confidence = coin.momentum_score.confidence;
    let potential = coin.momentum_score.potential_multiplier;
    let bucket = risk_bucket(coin.momentum_score.risk_level);
    let market_cap_strength = coin.market_cap.max(1.0).log10();
    let weekly_volatility = coin.price_change_7d.abs();

    match profile {
        RiskProfile::Low => {
            base * 0.58 + confidence * 0.26 + market_cap_strength * 3.2
                - bucket * 13.0
                - weekly_volatility * 0.16
        }
        RiskProfile::High => {
            base * 0.45
                + potential * 13.0
                + coin.price_change_7d.max(0.0) * 0.35
                + weekly_volatility * 0.18
                - bucket * 4.0
        }
        RiskProfile::Medium => {
            base * 0.57 + potential * 9.0 + confidence * 0.16
                - bucket * 7.0
                - weekly_volatility * 0.08
        }
    }
}

fn allocation_weight(profile: RiskProfile, score: f64, level: RiskLevel) -> f64 {
    let params = profile.params();
    // max(22, score + 70) keeps weights positive even for deeply
    // negative profile scores
    let base = (score + 70.0).max(22.0).powf(params.allocation_exponent);
    let bucket = risk_bucket(level);

    match profile {
        RiskProfile::Low => base * (1.0 - (bucket - 1.0) * 0.14).max(0.65),
        RiskProfile::High => base * (1.0 + (bucket - 2.0) * 0.12),
        RiskProfile::Medium => base,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn degenerate_result(
    initial_investment: f64,
    target_amount: f64,
    profile: RiskProfile,
) -> PortfolioSimulation {
    PortfolioSimulation {
        initial_investment,
        target_amount,
        current_value: initial_investment,
        total_return: 0.0,
        total_return_percent: 0.0,
        allocations: Vec::new(),
        projected_days: profile.params().max_projected_days,
        risk_score: 50.0,
        risk_profile: profile,
    }
}

/// Pure construction step over an already-scanned candidate list.
pub fn build_portfolio(
    scanned: &[ScannedCoin],
    initial_investment: f64,
    target_amount: f64,
    profile: RiskProfile,
) -> PortfolioSimulation {
    let params = profile.params();

    let scored: Vec<(&ScannedCoin, f64)> = scanned
        .iter()
        .map(|coin| (coin, profile_score(profile, coin)))
        .collect();

    let filtered: Vec<(&ScannedCoin, f64)> = scored
        .iter()
        .filter(|(coin, _)| {
            params
                .allowed_risk_levels
                .contains(&coin.momentum_score.risk_level)
        })
        .cloned()
        .collect();

    // Never under-fill below what the pool can supply: with too few
    // risk-eligible candidates the unfiltered ranking takes over
    let mut pool = if filtered.len() >= MAX_SELECTIONS {
        filtered
    } else {
        scored
    };
    pool.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let selected: Vec<(&ScannedCoin, f64)> = pool.into_iter().take(MAX_SELECTIONS).collect();
    if selected.is_empty() {
        return degenerate_result(initial_investment, target_amount, profile);
    }

    let weighted: Vec<(&ScannedCoin, f64)> = selected
        .iter()
        .map(|(coin, score)| {
            (
                *coin,
                allocation_weight(profile, *score, coin.momentum_score.risk_level),
            )
        })
        .collect();
    let total_weight: f64 = weighted.iter().map(|(_, w)| w).sum();

    let allocations: Vec<Allocation> = weighted
        .iter()
        .map(|(coin, weight)| {
            let allocation_percent = weight / total_weight * 100.0;
            let invested_amount = allocation_percent / 100.0 * initial_investment;
            let projected_return =
                coin.momentum_score.potential_multiplier * params.return_adjustment;
            let current_value = invested_amount * projected_return;

            Allocation {
                coin_id: coin.id.clone(),
                symbol: coin.symbol.clone(),
                name: coin.name.clone(),
                allocation_percent: round1(allocation_percent),
                invested_amount: round2(invested_amount),
                current_value: round2(current_value),
                return_percent: round2((projected_return - 1.0) * 100.0),
            }
        })
        .collect();

    let current_value: f64 = allocations.iter().map(|a| a.current_value).sum();
    let total_return = current_value - initial_investment;
    let total_return_percent = total_return / initial_investment * 100.0;

    // Treat the projected return as accrued over the profile horizon,
    // then solve compound growth for the target multiple
    let daily_return = total_return_percent / params.projection_horizon_days;
    let multiplier_needed = target_amount / initial_investment;
    let raw_projected_days = if daily_return > 0.0 {
        (multiplier_needed.ln() / (1.0 + daily_return / 100.0).ln()).ceil() as i64
    } else {
        params.max_projected_days
    };
    let projected_days = raw_projected_days.clamp(7, params.max_projected_days);

    let avg_risk = selected
        .iter()
        .map(|(coin, _)| risk_score(coin.momentum_score.risk_level))
        .sum::<f64>()
        / selected.len() as f64;

    PortfolioSimulation {
        initial_investment,
        target_amount,
        current_value: round2(current_value),
        total_return: round2(total_return),
        total_return_percent: round2(total_return_percent),
        allocations,
        projected_days,
        risk_score: avg_risk.round(),
        risk_profile: profile,
    }
}

/// Scan the market under the profile's momentum threshold and build the
/// allocation from the live results.
#[instrument(skip(scanner))]
pub async fn simulate(
    scanner: &Scanner,
    initial_investment: f64,
    target_amount: f64,
    profile: RiskProfile,
) -> Result<PortfolioSimulation, MarketError> {
    let filters = ScanFilters {
        min_momentum_score: Some(profile.params().min_momentum_score),
        sort_by: SortKey::Momentum,
        limit: CANDIDATE_POOL,
        ..ScanFilters::default()
    };

    let scanned = scanner.scan_market(&filters).await?;
    let simulation = build_portfolio(&scanned, initial_investment, target_amount, profile);

    info!(
        candidates = scanned.len(),
        selections = simulation.allocations.len(),
        projected_days = simulation.projected_days,
        "💼 Portfolio simulation complete"
    );

    Ok(simulation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fundamental::{FundamentalAnalysis, SupplyMetrics};
    use crate::analysis::scoring::{Grade, MomentumScore, TradeSignal};
    use crate::analysis::technical::{BandSignal, TechnicalIndicators};

    fn scanned(id: &str, overall: f64, risk: RiskLevel, potential: f64) -> ScannedCoin {
        ScannedCoin {
            id: id.to_string(),
            symbol: id.to_string(),
            name: id.to_string(),
            image: String::new(),
            current_price: 10.0,
            market_cap: 1.0e9,
            market_cap_rank: Some(40),
            volume_24h: 1.0e7,
            price_change_24h: 1.0,
            price_change_7d: 2.0,
            price_change_30d: -10.0,
            sparkline: Vec::new(),
            technical_indicators: TechnicalIndicators {
                rsi: None,
                rsi_signal: BandSignal::Neutral,
                macd: None,
                bollinger_bands: None,
                sma: None,
                ema: None,
                volume_analysis: None,
                atr: None,
                stochastic: None,
                momentum: None,
            },
            fundamental_analysis: FundamentalAnalysis {
                market_cap_score: 75.0,
                volume_to_market_cap_ratio: 0.01,
                supply_metrics: SupplyMetrics {
                    circulating_ratio: 0.9,
                    is_deflationary: false,
                },
                community_score: 50.0,
                developer_score: 50.0,
                sentiment_score: 50.0,
                ath_recovery_potential: 45.0,
                overall_fundamental_score: 55.0,
            },
            momentum_score: MomentumScore {
                technical_score: overall,
                fundamental_score: overall,
                overall_score: overall,
                grade: Grade::B,
                signal: TradeSignal::Buy,
                risk_level: risk,
                potential_multiplier: potential,
                confidence: 70.0,
            },
            last_updated: String::new(),
        }
    }

    #[test]
    fn empty_pool_returns_degenerate_result() {
        let sim = build_portfolio(&[], 100.0, 1000.0, RiskProfile::Medium);
        assert!(sim.allocations.is_empty());
        assert_eq!(sim.current_value, 100.0);
        assert_eq!(sim.total_return, 0.0);
        assert_eq!(sim.risk_score, 50.0);
        assert_eq!(sim.projected_days, 70);

        let sim = build_portfolio(&[], 100.0, 1000.0, RiskProfile::Low);
        assert_eq!(sim.projected_days, 90);
        let sim = build_portfolio(&[], 100.0, 1000.0, RiskProfile::High);
        assert_eq!(sim.projected_days, 50);
    }

    #[test]
    fn allocations_sum_to_one_hundred_percent() {
        let pool: Vec<ScannedCoin> = (0..8)
            .map(|i| {
                scanned(
                    &format!("coin{i}"),
                    60.0 + i as f64,
                    RiskLevel::Medium,
                    2.0,
                )
            })
            .collect();

        let sim = build_portfolio(&pool, 100.0, 1000.0, RiskProfile::Medium);
        assert_eq!(sim.allocations.len(), 5);
        let total: f64 = sim.allocations.iter().map(|a| a.allocation_percent).sum();
        assert!((total - 100.0).abs() < 0.5, "allocation sum was {total}");
    }

    #[test]
    fn low_profile_excludes_high_risk_when_pool_allows() {
        let mut pool: Vec<ScannedCoin> = (0..6)
            .map(|i| scanned(&format!("safe{i}"), 62.0, RiskLevel::Low, 1.5))
            .collect();
        // A screaming high-risk candidate that must still be passed over
        pool.push(scanned("degen", 95.0, RiskLevel::Extreme, 9.0));

        let sim = build_portfolio(&pool, 100.0, 1000.0, RiskProfile::Low);
        assert_eq!(sim.allocations.len(), 5);
        assert!(sim.allocations.iter().all(|a| a.coin_id != "degen"));
    }

    #[test]
    fn low_profile_falls_back_when_too_few_eligible() {
        let pool = vec![
            scanned("safe", 60.0, RiskLevel::Low, 1.5),
            scanned("risky1", 70.0, RiskLevel::High, 3.0),
            scanned("risky2", 72.0, RiskLevel::Extreme, 4.0),
        ];

        let sim = build_portfolio(&pool, 100.0, 1000.0, RiskProfile::Low);
        // Fewer than five LOW/MEDIUM candidates: the unfiltered ranked
        // pool is used rather than under-filling
        assert_eq!(sim.allocations.len(), 3);
    }

    #[test]
    fn high_profile_overweights_riskier_selections() {
        let pool = vec![
            scanned("medium", 70.0, RiskLevel::Medium, 3.0),
            scanned("extreme", 70.0, RiskLevel::Extreme, 3.0),
        ];
        let sim = build_portfolio(&pool, 100.0, 1000.0, RiskProfile::High);
        let medium = sim
            .allocations
            .iter()
            .find(|a| a.coin_id == "medium")
            .unwrap();
        let extreme = sim
            .allocations
            .iter()
            .find(|a| a.coin_id == "extreme")
            .unwrap();
        // Same profile score aside from the risk bucket terms; the
        // high-profile weight adjustment amplifies the riskier asset
        assert!(extreme.allocation_percent > medium.allocation_percent * 0.9);
    }

    #[test]
    fn projected_days_clamp_to_profile_bounds() {
        let pool: Vec<ScannedCoin> = (0..5)
            .map(|i| scanned(&format!("c{i}"), 80.0, RiskLevel::Medium, 8.0))
            .collect();
        let sim = build_portfolio(&pool, 100.0, 1000.0, RiskProfile::High);
        assert!((7..=50).contains(&sim.projected_days));

        // Negative projected return pins to the profile maximum
        let pool: Vec<ScannedCoin> = (0..5)
            .map(|i| scanned(&format!("c{i}"), 50.0, RiskLevel::Low, 1.0))
            .collect();
        let sim = build_portfolio(&pool, 100.0, 1000.0, RiskProfile::Low);
        // potential 1.0 * 0.88 adjustment: portfolio projects a loss
        assert_eq!(sim.projected_days, 90);
    }

    #[test]
    fn risk_score_is_mean_of_level_mapping() {
        let pool = vec![
            scanned("a", 70.0, RiskLevel::Low, 2.0),
            scanned("b", 70.0, RiskLevel::Medium, 2.0),
            scanned("c", 70.0, RiskLevel::High, 2.0),
            scanned("d", 70.0, RiskLevel::Extreme, 2.0),
            scanned("e", 70.0, RiskLevel::Medium, 2.0),
        ];
        let sim = build_portfolio(&pool, 100.0, 1000.0, RiskProfile::Medium);
        // (20 + 40 + 65 + 90 + 40) / 5 = 51
        assert_eq!(sim.risk_score, 51.0);
    }

    #[test]
    fn determinism_given_identical_input() {
        let pool: Vec<ScannedCoin> = (0..10)
            .map(|i| scanned(&format!("c{i}"), 55.0 + i as f64, RiskLevel::Medium, 2.5))
            .collect();
        let a = build_portfolio(&pool, 250.0, 2500.0, RiskProfile::Medium);
        let b = build_portfolio(&pool, 250.0, 2500.0, RiskProfile::Medium);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
