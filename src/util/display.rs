/// Display utilities for terminal output

use colored::Colorize;

use crate::analysis::{Grade, RiskLevel, TradeSignal};
use crate::portfolio::PortfolioSimulation;
use crate::scanner::ScannedCoin;

fn colorize_change(change: f64) -> String {
    let text = format!("{change:+.2}%");
    if change >= 0.0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

fn colorize_signal(signal: TradeSignal) -> String {
    match signal {
        TradeSignal::StrongBuy => "STRONG BUY".bright_green().bold().to_string(),
        TradeSignal::Buy => "BUY".green().to_string(),
        TradeSignal::Hold => "HOLD".yellow().to_string(),
        TradeSignal::Sell => "SELL".red().to_string(),
        TradeSignal::StrongSell => "STRONG SELL".bright_red().bold().to_string(),
    }
}

fn colorize_grade(grade: Grade) -> String {
    match grade {
        Grade::APlus => "A+".bright_green().to_string(),
        Grade::A => "A".bright_green().to_string(),
        Grade::BPlus => "B+".green().to_string(),
        Grade::B => "B".green().to_string(),
        Grade::CPlus => "C+".yellow().to_string(),
        Grade::C => "C".yellow().to_string(),
        Grade::D => "D".red().to_string(),
        Grade::F => "F".red().to_string(),
    }
}

fn colorize_risk(level: RiskLevel) -> String {
    match level {
        RiskLevel::Low => "LOW".green().to_string(),
        RiskLevel::Medium => "MEDIUM".yellow().to_string(),
        RiskLevel::High => "HIGH".red().to_string(),
        RiskLevel::Extreme => "EXTREME".bright_red().bold().to_string(),
    }
}

pub fn print_scan_results(results: &[ScannedCoin]) {
    println!("\n{} {}", "🔍", "MARKET MOMENTUM SCAN".bold());
    println!("{}", "=".repeat(92));
    println!(
        "{:<4} {:<8} {:>12} {:>9} {:>7} {:>6} {:>6} {:>13} {:>9}",
        "#", "SYMBOL", "PRICE", "24H", "SCORE", "GRADE", "CONF", "SIGNAL", "RISK"
    );
    println!("{}", "-".repeat(92));

    for (i, coin) in results.iter().enumerate() {
        let score = &coin.momentum_score;
        println!(
            "{:<4} {:<8} {:>12} {:>18} {:>7.0} {:>15} {:>5.0}% {:>22} {:>18}",
            i + 1,
            coin.symbol.to_uppercase().bold(),
            format!("${:.4}", coin.current_price),
            colorize_change(coin.price_change_24h),
            score.overall_score,
            colorize_grade(score.grade),
            score.confidence,
            colorize_signal(score.signal),
            colorize_risk(score.risk_level),
        );
    }

    println!("{}", "=".repeat(92));
    println!("{} assets scored\n", results.len());
}

pub fn print_portfolio(simulation: &PortfolioSimulation) {
    println!("\n{} {}", "💼", "SIMULATED PORTFOLIO".bold());
    println!("{}", "=".repeat(72));
    println!(
        "   Initial: ${:.2}  →  Target: ${:.2}  ({:?} risk)",
        simulation.initial_investment, simulation.target_amount, simulation.risk_profile
    );

    if simulation.allocations.is_empty() {
        println!("{}", "   No eligible assets in the current market".bright_yellow());
        println!("{}", "=".repeat(72));
        return;
    }

    for allocation in &simulation.allocations {
        println!(
            "   {:<8} {:>5.1}%  invested ${:>8.2}  →  ${:>8.2}  ({})",
            allocation.symbol.to_uppercase().bold(),
            allocation.allocation_percent,
            allocation.invested_amount,
            allocation.current_value,
            colorize_change(allocation.return_percent),
        );
    }

    println!("{}", "-".repeat(72));
    println!(
        "   Projected value: ${:.2} ({})   Risk score: {:.0}   Est. days to target: {}",
        simulation.current_value,
        colorize_change(simulation.total_return_percent),
        simulation.risk_score,
        simulation.projected_days,
    );
    println!("{}", "=".repeat(72));
}
