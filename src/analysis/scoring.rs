/// Momentum scoring engine
///
/// Fuses the technical indicator record with the fundamental analysis
/// into one 0-100 score plus grade, trade signal, risk tier, upside
/// multiplier, and confidence. The per-indicator weights and the
/// multiplier/confidence constants are a fixed policy; scores are only
/// comparable across assets because every asset goes through the same
/// tables.

use serde::{Deserialize, Serialize};

use super::fundamental::FundamentalAnalysis;
use super::technical::{BandSignal, TechnicalIndicators, TrendSignal, VolumeSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSignal {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
}

impl std::str::FromStr for TradeSignal {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "STRONG BUY" => Ok(Self::StrongBuy),
            "BUY" => Ok(Self::Buy),
            "HOLD" => Ok(Self::Hold),
            "SELL" => Ok(Self::Sell),
            "STRONG SELL" => Ok(Self::StrongSell),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "EXTREME")]
    Extreme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentumScore {
    pub technical_score: f64,
    pub fundamental_score: f64,
    pub overall_score: f64,
    pub grade: Grade,
    pub signal: TradeSignal,
    pub risk_level: RiskLevel,
    pub potential_multiplier: f64,
    pub confidence: f64,
}

/// Weighted average over whichever indicators are present. An absent
/// indicator drops out of both numerator and denominator, so the result
/// is always normalized over available weight; with nothing available
/// the score is a flat 50.
pub fn technical_score(ta: &TechnicalIndicators) -> f64 {
    let mut contributions: Vec<(f64, f64)> = Vec::with_capacity(8);

    if let Some(rsi) = ta.rsi {
        let score = if rsi < 30.0 {
            85.0 // oversold reads as a buying opportunity
        } else if rsi < 40.0 {
            70.0
        } else if rsi > 70.0 {
            25.0
        } else if rsi > 60.0 {
            40.0
        } else {
            55.0 // neutral leans slightly positive
        };
        contributions.push((score, 20.0));
    }

    if let Some(macd) = &ta.macd {
        let score = match macd.signal {
            TrendSignal::Bullish => {
                if macd.histogram > 0.0 {
                    80.0
                } else {
                    65.0
                }
            }
            TrendSignal::Bearish => {
                if macd.histogram < 0.0 {
                    20.0
                } else {
                    35.0
                }
            }
            TrendSignal::Neutral => 50.0,
        };
        contributions.push((score, 20.0));
    }

    if let Some(bands) = &ta.bollinger_bands {
        let score = match bands.signal {
            BandSignal::Oversold => 80.0,
            BandSignal::Overbought => 25.0,
            BandSignal::Neutral => 55.0,
        };
        contributions.push((score, 15.0));
    }

    if let Some(sma) = &ta.sma {
        let score = if sma.golden_cross {
            90.0
        } else if sma.death_cross {
            15.0
        } else {
            50.0
        };
        contributions.push((score, 15.0));
    }

    if let Some(ema) = &ta.ema {
        let score = if ema.signal == TrendSignal::Bullish {
            75.0
        } else {
            30.0
        };
        contributions.push((score, 10.0));
    }

    if let Some(volume) = &ta.volume_analysis {
        let score = match volume.signal {
            VolumeSignal::High => 80.0,
            VolumeSignal::Low => 30.0,
            VolumeSignal::Normal => 50.0,
        };
        contributions.push((score, 10.0));
    }

    if let Some(stochastic) = &ta.stochastic {
        let score = match stochastic.signal {
            BandSignal::Oversold => 80.0,
            BandSignal::Overbought => 25.0,
            BandSignal::Neutral => 50.0,
        };
        contributions.push((score, 5.0));
    }

    if let Some(momentum) = ta.momentum {
        let score = if momentum > 0.0 { 70.0 } else { 30.0 };
        contributions.push((score, 5.0));
    }

    let total_weight: f64 = contributions.iter().map(|(_, w)| w).sum();
    if total_weight == 0.0 {
        return 50.0;
    }
    let weighted: f64 = contributions.iter().map(|(s, w)| s * w).sum();
    (weighted / total_weight).round()
}

pub fn grade(score: f64) -> Grade {
    if score >= 90.0 {
        Grade::APlus
    } else if score >= 80.0 {
        Grade::A
    } else if score >= 70.0 {
        Grade::BPlus
    } else if score >= 60.0 {
        Grade::B
    } else if score >= 50.0 {
        Grade::CPlus
    } else if score >= 40.0 {
        Grade::C
    } else if score >= 30.0 {
        Grade::D
    } else {
        Grade::F
    }
}

pub fn signal(score: f64) -> TradeSignal {
    if score >= 80.0 {
        TradeSignal::StrongBuy
    } else if score >= 65.0 {
        TradeSignal::Buy
    } else if score >= 45.0 {
        TradeSignal::Hold
    } else if score >= 30.0 {
        TradeSignal::Sell
    } else {
        TradeSignal::StrongSell
    }
}

/// Additive risk score over four independent contributions, bucketed
/// into the four tiers.
pub fn risk_level(ta: &TechnicalIndicators, fa: &FundamentalAnalysis) -> RiskLevel {
    let mut risk = 0u32;

    if fa.market_cap_score < 30.0 {
        risk += 3;
    } else if fa.market_cap_score < 50.0 {
        risk += 2;
    } else if fa.market_cap_score < 70.0 {
        risk += 1;
    }

    if let Some(bands) = &ta.bollinger_bands {
        if bands.bandwidth > 0.15 {
            risk += 2;
        } else if bands.bandwidth > 0.08 {
            risk += 1;
        }
    }

    if let Some(rsi) = ta.rsi {
        if rsi > 85.0 || rsi < 15.0 {
            risk += 2;
        } else if rsi > 75.0 || rsi < 25.0 {
            risk += 1;
        }
    }

    if fa.developer_score < 30.0 {
        risk += 1;
    }
    if fa.community_score < 30.0 {
        risk += 1;
    }

    if risk >= 7 {
        RiskLevel::Extreme
    } else if risk >= 5 {
        RiskLevel::High
    } else if risk >= 3 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Speculative upside estimate, clamped to [1.0, 10.0] at one decimal.
pub fn potential_multiplier(
    ta: &TechnicalIndicators,
    fa: &FundamentalAnalysis,
    price_change_30d: f64,
) -> f64 {
    let mut base: f64 = 1.0;

    // Oversold with sound fundamentals is the strongest setup
    match ta.rsi {
        Some(rsi) if rsi < 30.0 && fa.overall_fundamental_score > 60.0 => base += 2.0,
        Some(rsi) if rsi < 40.0 => base += 1.0,
        _ => {}
    }

    if ta
        .macd
        .as_ref()
        .is_some_and(|m| m.signal == TrendSignal::Bullish)
    {
        base += 0.5;
    }

    if fa.ath_recovery_potential > 80.0 {
        base += 1.5;
    } else if fa.ath_recovery_potential > 60.0 {
        base += 0.8;
    }

    if ta
        .volume_analysis
        .as_ref()
        .is_some_and(|v| v.signal == VolumeSignal::High)
    {
        base += 0.5;
    }

    if price_change_30d < -30.0 {
        base += 1.0; // bounce potential
    } else if price_change_30d > 50.0 {
        base -= 0.5; // already extended
    }

    if fa.community_score > 70.0 && fa.developer_score > 70.0 {
        base += 0.5;
    }

    (base.clamp(1.0, 10.0) * 10.0).round() / 10.0
}

/// Confidence grows with indicator coverage and directional agreement,
/// clamped to [20, 95].
pub fn confidence(ta: &TechnicalIndicators, fa: &FundamentalAnalysis) -> f64 {
    let mut confidence: f64 = 50.0;

    if ta.rsi.is_some() {
        confidence += 5.0;
    }
    if ta.macd.is_some() {
        confidence += 5.0;
    }
    if ta.bollinger_bands.is_some() {
        confidence += 5.0;
    }
    if ta.sma.is_some() {
        confidence += 3.0;
    }
    if ta.ema.is_some() {
        confidence += 3.0;
    }
    if ta.volume_analysis.is_some() {
        confidence += 5.0;
    }
    if ta.stochastic.is_some() {
        confidence += 3.0;
    }

    // Directional agreement across RSI-lean, MACD, and EMA cross
    let mut signals: Vec<TrendSignal> = Vec::with_capacity(3);
    if let Some(rsi) = ta.rsi {
        signals.push(if rsi < 50.0 {
            TrendSignal::Bullish
        } else {
            TrendSignal::Bearish
        });
    }
    if let Some(macd) = &ta.macd {
        signals.push(macd.signal);
    }
    if let Some(ema) = &ta.ema {
        signals.push(ema.signal);
    }

    let bullish = signals.iter().filter(|s| **s == TrendSignal::Bullish).count();
    let bearish = signals.iter().filter(|s| **s == TrendSignal::Bearish).count();

    if bullish == signals.len() || bearish == signals.len() {
        confidence += 15.0;
    } else if bullish as f64 >= signals.len() as f64 * 0.7
        || bearish as f64 >= signals.len() as f64 * 0.7
    {
        confidence += 8.0;
    }

    if fa.community_score > 0.0 {
        confidence += 3.0;
    }
    if fa.developer_score > 0.0 {
        confidence += 3.0;
    }

    confidence.clamp(20.0, 95.0)
}

/// The terminal per-asset output: technical and fundamental sub-scores
/// fused 60/40 into the overall momentum score.
pub fn calculate(
    ta: &TechnicalIndicators,
    fa: &FundamentalAnalysis,
    price_change_30d: f64,
) -> MomentumScore {
    let technical = technical_score(ta);
    let fundamental = fa.overall_fundamental_score;
    let overall = (technical * 0.6 + fundamental * 0.4).round();

    MomentumScore {
        technical_score: technical,
        fundamental_score: fundamental,
        overall_score: overall,
        grade: grade(overall),
        signal: signal(overall),
        risk_level: risk_level(ta, fa),
        potential_multiplier: potential_multiplier(ta, fa, price_change_30d),
        confidence: confidence(ta, fa),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::technical::{
        BollingerBands, EmaCross, MacdResult, SmaBundle, VolumeAnalysis,
    };

    fn empty_ta() -> TechnicalIndicators {
        TechnicalIndicators {
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
        }
    }

    fn neutral_fa() -> FundamentalAnalysis {
        FundamentalAnalysis {
            market_cap_score: 75.0,
            volume_to_market_cap_ratio: 0.05,
            supply_metrics: crate::analysis::fundamental::SupplyMetrics {
                circulating_ratio: 0.9,
                is_deflationary: true,
            },
            community_score: 50.0,
            developer_score: 50.0,
            sentiment_score: 50.0,
            ath_recovery_potential: 45.0,
            overall_fundamental_score: 55.0,
        }
    }

    #[test]
    fn technical_score_defaults_to_50_with_no_indicators() {
        assert_eq!(technical_score(&empty_ta()), 50.0);
    }

    #[test]
    fn technical_score_renormalizes_over_available_weight() {
        // Only RSI present, deeply oversold: score must be exactly the
        // RSI rule value, not diluted by absent indicators
        let mut ta = empty_ta();
        ta.rsi = Some(25.0);
        assert_eq!(technical_score(&ta), 85.0);

        // RSI (85 @ 20) + bullish EMA (75 @ 10): (85*20 + 75*10) / 30
        ta.ema = Some(EmaCross {
            ema12: 2.0,
            ema26: 1.0,
            signal: TrendSignal::Bullish,
        });
        assert_eq!(technical_score(&ta), ((85.0 * 20.0 + 75.0 * 10.0) / 30.0_f64).round());
    }

    #[test]
    fn macd_scoring_distinguishes_histogram_sign() {
        let mut ta = empty_ta();
        ta.macd = Some(MacdResult {
            macd_line: 1.0,
            signal_line: 0.5,
            histogram: 0.5,
            signal: TrendSignal::Bullish,
        });
        assert_eq!(technical_score(&ta), 80.0);

        ta.macd = Some(MacdResult {
            macd_line: 1.0,
            signal_line: 1.2,
            histogram: -0.2,
            signal: TrendSignal::Bullish,
        });
        assert_eq!(technical_score(&ta), 65.0);
    }

    #[test]
    fn overall_is_rounded_60_40_blend() {
        let ta = empty_ta();
        let fa = neutral_fa();
        let score = calculate(&ta, &fa, 0.0);
        assert_eq!(
            score.overall_score,
            (score.technical_score * 0.6 + score.fundamental_score * 0.4).round()
        );
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(grade(95.0), Grade::APlus);
        assert_eq!(grade(90.0), Grade::APlus);
        assert_eq!(grade(89.0), Grade::A);
        assert_eq!(grade(70.0), Grade::BPlus);
        assert_eq!(grade(60.0), Grade::B);
        assert_eq!(grade(50.0), Grade::CPlus);
        assert_eq!(grade(40.0), Grade::C);
        assert_eq!(grade(30.0), Grade::D);
        assert_eq!(grade(29.0), Grade::F);
    }

    #[test]
    fn signal_thresholds() {
        assert_eq!(signal(80.0), TradeSignal::StrongBuy);
        assert_eq!(signal(65.0), TradeSignal::Buy);
        assert_eq!(signal(45.0), TradeSignal::Hold);
        assert_eq!(signal(30.0), TradeSignal::Sell);
        assert_eq!(signal(29.0), TradeSignal::StrongSell);
    }

    #[test]
    fn risk_buckets_accumulate() {
        let ta = empty_ta();
        let mut fa = neutral_fa();
        assert_eq!(risk_level(&ta, &fa), RiskLevel::Low);

        // Micro cap with dead community and repo: 3 + 1 + 1 = 5
        fa.market_cap_score = 20.0;
        fa.developer_score = 10.0;
        fa.community_score = 10.0;
        assert_eq!(risk_level(&ta, &fa), RiskLevel::High);

        // Add wide bands and an extreme RSI: 5 + 2 + 2 = 9
        let mut ta = empty_ta();
        ta.bollinger_bands = Some(BollingerBands {
            upper: 120.0,
            middle: 100.0,
            lower: 80.0,
            percent_b: 0.5,
            bandwidth: 0.4,
            signal: BandSignal::Neutral,
        });
        ta.rsi = Some(90.0);
        assert_eq!(risk_level(&ta, &fa), RiskLevel::Extreme);
    }

    #[test]
    fn multiplier_is_clamped_and_single_decimal() {
        let mut ta = empty_ta();
        ta.rsi = Some(25.0);
        ta.macd = Some(MacdResult {
            macd_line: 1.0,
            signal_line: 0.5,
            histogram: 0.5,
            signal: TrendSignal::Bullish,
        });
        ta.volume_analysis = Some(VolumeAnalysis {
            current_volume: 200.0,
            average_volume: 100.0,
            volume_ratio: 2.0,
            signal: VolumeSignal::High,
        });
        let mut fa = neutral_fa();
        fa.overall_fundamental_score = 80.0;
        fa.ath_recovery_potential = 90.0;
        fa.community_score = 80.0;
        fa.developer_score = 80.0;

        let value = potential_multiplier(&ta, &fa, -40.0);
        assert!((1.0..=10.0).contains(&value));
        assert_eq!((value * 10.0).round() / 10.0, value);
        // 1 + 2 + 0.5 + 1.5 + 0.5 + 1 + 0.5
        assert_eq!(value, 7.0);

        // Already-pumped asset with nothing going for it floors at 1.0
        let value = potential_multiplier(&empty_ta(), &neutral_fa(), 60.0);
        assert_eq!(value, 1.0);
    }

    #[test]
    fn confidence_rewards_coverage_and_agreement() {
        // No indicators at all still floors well above the clamp
        let base = confidence(&empty_ta(), &neutral_fa());
        assert!((20.0..=95.0).contains(&base));

        let mut ta = empty_ta();
        ta.rsi = Some(40.0); // bullish lean
        ta.macd = Some(MacdResult {
            macd_line: 1.0,
            signal_line: 0.5,
            histogram: 0.5,
            signal: TrendSignal::Bullish,
        });
        ta.ema = Some(EmaCross {
            ema12: 2.0,
            ema26: 1.0,
            signal: TrendSignal::Bullish,
        });
        ta.bollinger_bands = Some(BollingerBands {
            upper: 1.0,
            middle: 0.9,
            lower: 0.8,
            percent_b: 0.5,
            bandwidth: 0.05,
            signal: BandSignal::Neutral,
        });
        ta.sma = Some(SmaBundle {
            sma20: 1.0,
            sma50: 1.0,
            sma200: 1.0,
            golden_cross: false,
            death_cross: false,
        });

        // 50 + 5 + 5 + 5 + 3 + 3 (coverage) + 15 (unanimous) + 3 + 3
        let value = confidence(&ta, &neutral_fa());
        assert_eq!(value, 92.0);
    }

    #[test]
    fn confidence_never_leaves_bounds() {
        let mut fa = neutral_fa();
        fa.community_score = 0.0;
        fa.developer_score = 0.0;
        let value = confidence(&empty_ta(), &fa);
        assert!((20.0..=95.0).contains(&value));
    }
}
