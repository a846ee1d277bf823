/// Technical indicator engine
///
/// Pure calculations over price and OHLC series. Every indicator returns
/// `None` when the series is too short to compute it meaningfully, and
/// the per-indicator result structs carry their categorical signal next
/// to the raw values. Band boundaries are exclusive: %B of exactly 0.2
/// is neutral, RSI of exactly 70 is neutral.

use serde::{Deserialize, Serialize};

use crate::market::OhlcBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandSignal {
    Oversold,
    Neutral,
    Overbought,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSignal {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeSignal {
    High,
    Normal,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdResult {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
    pub signal: TrendSignal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub percent_b: f64,
    pub bandwidth: f64,
    pub signal: BandSignal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmaBundle {
    pub sma20: f64,
    pub sma50: f64,
    pub sma200: f64,
    pub golden_cross: bool,
    pub death_cross: bool,
}

/// Binary cross indicator: either bullish or bearish, never neutral.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmaCross {
    pub ema12: f64,
    pub ema26: f64,
    pub signal: TrendSignal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAnalysis {
    pub current_volume: f64,
    pub average_volume: f64,
    pub volume_ratio: f64,
    pub signal: VolumeSignal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StochasticResult {
    pub k: f64,
    pub d: f64,
    pub signal: BandSignal,
}

/// Full indicator record for one asset. Each field is independently
/// absent when the underlying series was too short to support it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalIndicators {
    pub rsi: Option<f64>,
    pub rsi_signal: BandSignal,
    pub macd: Option<MacdResult>,
    pub bollinger_bands: Option<BollingerBands>,
    pub sma: Option<SmaBundle>,
    pub ema: Option<EmaCross>,
    pub volume_analysis: Option<VolumeAnalysis>,
    pub atr: Option<f64>,
    pub stochastic: Option<StochasticResult>,
    pub momentum: Option<f64>,
}

/// RSI with Wilder smoothing. Needs at least `period + 1` points.
/// Returns exactly 100 when the lookback saw no losses at all.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..=period {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let mut avg_gain = gains / period as f64;
    let mut avg_loss = losses / period as f64;

    for i in (period + 1)..prices.len() {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            avg_gain = (avg_gain * (period as f64 - 1.0) + change) / period as f64;
            avg_loss = (avg_loss * (period as f64 - 1.0)) / period as f64;
        } else {
            avg_gain = (avg_gain * (period as f64 - 1.0)) / period as f64;
            avg_loss = (avg_loss * (period as f64 - 1.0) + change.abs()) / period as f64;
        }
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

fn rsi_signal(rsi: Option<f64>) -> BandSignal {
    match rsi {
        Some(v) if v < 30.0 => BandSignal::Oversold,
        Some(v) if v > 70.0 => BandSignal::Overbought,
        _ => BandSignal::Neutral,
    }
}

/// EMA series seeded with the SMA of the first `period` points.
/// Empty when the series is shorter than `period`.
pub fn ema_series(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(prices.len() - period + 1);

    let seed: f64 = prices[..period].iter().sum::<f64>() / period as f64;
    values.push(seed);

    for &price in &prices[period..] {
        let prev = values[values.len() - 1];
        values.push((price - prev) * multiplier + prev);
    }

    values
}

/// MACD over EMA(fast) and EMA(slow), aligned at offset `slow - fast`,
/// with an EMA(signal_period) signal line. Needs `slow + signal_period`
/// points.
pub fn macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Option<MacdResult> {
    if prices.len() < slow_period + signal_period {
        return None;
    }

    let fast_ema = ema_series(prices, fast_period);
    let slow_ema = ema_series(prices, slow_period);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return None;
    }

    let start = slow_period - fast_period;
    let macd_line: Vec<f64> = slow_ema
        .iter()
        .enumerate()
        .map(|(i, slow)| fast_ema[i + start] - slow)
        .collect();

    let signal_line = ema_series(&macd_line, signal_period);
    if signal_line.is_empty() {
        return None;
    }

    let last_macd = macd_line[macd_line.len() - 1];
    let last_signal = signal_line[signal_line.len() - 1];
    let histogram = last_macd - last_signal;

    let prev_macd = if macd_line.len() > 1 {
        macd_line[macd_line.len() - 2]
    } else {
        last_macd
    };
    let prev_signal = if signal_line.len() > 1 {
        signal_line[signal_line.len() - 2]
    } else {
        last_signal
    };

    // Crossover in the most recent step wins; otherwise histogram sign
    let signal = if prev_macd <= prev_signal && last_macd > last_signal {
        TrendSignal::Bullish
    } else if prev_macd >= prev_signal && last_macd < last_signal {
        TrendSignal::Bearish
    } else if histogram > 0.0 {
        TrendSignal::Bullish
    } else if histogram < 0.0 {
        TrendSignal::Bearish
    } else {
        TrendSignal::Neutral
    };

    Some(MacdResult {
        macd_line: last_macd,
        signal_line: last_signal,
        histogram,
        signal,
    })
}

/// Simple moving average of the last `period` points.
pub fn sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

pub fn bollinger_bands(prices: &[f64], period: usize, std_dev_multiplier: f64) -> Option<BollingerBands> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let window = &prices[prices.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|price| (price - middle).powi(2))
        .sum::<f64>()
        / period as f64;
    let std_dev = variance.sqrt();

    let upper = middle + std_dev_multiplier * std_dev;
    let lower = middle - std_dev_multiplier * std_dev;

    let current = prices[prices.len() - 1];
    let percent_b = (current - lower) / (upper - lower);
    let bandwidth = (upper - lower) / middle;

    let signal = if percent_b < 0.2 {
        BandSignal::Oversold
    } else if percent_b > 0.8 {
        BandSignal::Overbought
    } else {
        BandSignal::Neutral
    };

    Some(BollingerBands {
        upper,
        middle,
        lower,
        percent_b,
        bandwidth,
        signal,
    })
}

/// Stochastic oscillator. %K defaults to 50 in a flat window.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> Option<StochasticResult> {
    if k_period == 0 || d_period == 0 || closes.len() < k_period + d_period {
        return None;
    }

    let mut k_values = Vec::with_capacity(closes.len() - k_period + 1);
    for i in (k_period - 1)..closes.len() {
        let window = (i + 1 - k_period)..=i;
        let highest = highs[window.clone()]
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        let lowest = lows[window].iter().cloned().fold(f64::INFINITY, f64::min);

        let k = if highest == lowest {
            50.0
        } else {
            (closes[i] - lowest) / (highest - lowest) * 100.0
        };
        k_values.push(k);
    }

    let k = k_values[k_values.len() - 1];
    let d = k_values[k_values.len() - d_period..].iter().sum::<f64>() / d_period as f64;

    let signal = if k < 20.0 && d < 20.0 {
        BandSignal::Oversold
    } else if k > 80.0 && d > 80.0 {
        BandSignal::Overbought
    } else {
        BandSignal::Neutral
    };

    Some(StochasticResult { k, d, signal })
}

/// Average true range with Wilder smoothing. Needs `period + 1` closes.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut true_ranges = Vec::with_capacity(closes.len() - 1);
    for i in 1..closes.len() {
        let tr = (highs[i] - lows[i])
            .max((highs[i] - closes[i - 1]).abs())
            .max((lows[i] - closes[i - 1]).abs());
        true_ranges.push(tr);
    }

    let mut atr = true_ranges[..period].iter().sum::<f64>() / period as f64;
    for &tr in &true_ranges[period..] {
        atr = (atr * (period as f64 - 1.0) + tr) / period as f64;
    }

    Some(atr)
}

/// Raw momentum: last price minus the price `period` steps back.
pub fn momentum(prices: &[f64], period: usize) -> Option<f64> {
    if prices.len() < period + 1 {
        return None;
    }
    Some(prices[prices.len() - 1] - prices[prices.len() - 1 - period])
}

fn volume_analysis(volume_24h: Option<f64>, avg_volume: Option<f64>) -> Option<VolumeAnalysis> {
    match (volume_24h, avg_volume) {
        (Some(current), Some(average)) if current > 0.0 && average > 0.0 => {
            let ratio = current / average;
            let signal = if ratio > 1.5 {
                VolumeSignal::High
            } else if ratio < 0.5 {
                VolumeSignal::Low
            } else {
                VolumeSignal::Normal
            };
            Some(VolumeAnalysis {
                current_volume: current,
                average_volume: average,
                volume_ratio: ratio,
                signal,
            })
        }
        _ => None,
    }
}

fn sma_bundle(prices: &[f64], strict_sma20: bool) -> Option<SmaBundle> {
    let len = prices.len();
    let sma20 = if strict_sma20 {
        sma(prices, 20)?
    } else {
        sma(prices, 20.min(len))?
    };
    let sma50 = sma(prices, 50.min(len)).unwrap_or(sma20);
    let sma200 = sma(prices, 200.min(len)).unwrap_or(sma20);

    Some(SmaBundle {
        sma20,
        sma50,
        sma200,
        golden_cross: sma50 > sma200,
        death_cross: sma50 < sma200 && sma50 != 0.0,
    })
}

fn ema_cross(prices: &[f64], fast_period: usize, slow_period: usize) -> Option<EmaCross> {
    let fast = ema_series(prices, fast_period);
    let slow = ema_series(prices, slow_period);
    match (fast.last(), slow.last()) {
        (Some(&ema12), Some(&ema26)) => Some(EmaCross {
            ema12,
            ema26,
            signal: if ema12 > ema26 {
                TrendSignal::Bullish
            } else {
                TrendSignal::Bearish
            },
        }),
        _ => None,
    }
}

/// Analysis over a short high-resolution sparkline. ATR and stochastic
/// need OHLC context and stay absent; SMA/EMA periods shrink to the
/// series length so a 7-day sparkline still yields trend signals.
pub fn analyze_sparkline(
    prices: &[f64],
    volume_24h: Option<f64>,
    avg_volume: Option<f64>,
) -> TechnicalIndicators {
    let rsi = rsi(prices, 14);

    let len = prices.len();
    TechnicalIndicators {
        rsi,
        rsi_signal: rsi_signal(rsi),
        macd: macd(prices, 12, 26, 9),
        bollinger_bands: bollinger_bands(prices, 20, 2.0),
        sma: sma_bundle(prices, false),
        ema: ema_cross(prices, 12.min(len), 26.min(len)),
        volume_analysis: volume_analysis(volume_24h, avg_volume),
        atr: None,
        stochastic: None,
        momentum: momentum(prices, 10),
    }
}

/// Analysis over daily OHLC bars. Richer than the sparkline path but
/// volume-blind: the OHLC endpoint carries no volume, so the caller
/// merges in sparkline-derived volume analysis when it has one.
pub fn analyze_ohlc(bars: &[OhlcBar]) -> TechnicalIndicators {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let rsi = rsi(&closes, 14);

    let len = closes.len();
    TechnicalIndicators {
        rsi,
        rsi_signal: rsi_signal(rsi),
        macd: macd(&closes, 12, 26, 9),
        bollinger_bands: bollinger_bands(&closes, 20, 2.0),
        sma: sma_bundle(&closes, true),
        ema: ema_cross(&closes, 12, 26.min(len)),
        volume_analysis: None,
        atr: atr(&highs, &lows, &closes, 14),
        stochastic: stochastic(&highs, &lows, &closes, 14, 3),
        momentum: momentum(&closes, 10),
    }
}
