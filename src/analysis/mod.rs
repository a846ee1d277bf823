/// Scoring engines: technical indicators, fundamentals, momentum fusion

pub mod fundamental;
pub mod scoring;
pub mod technical;

pub use fundamental::FundamentalAnalysis;
pub use scoring::{Grade, MomentumScore, RiskLevel, TradeSignal};
pub use technical::TechnicalIndicators;
