use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lynx::config::Config;
use lynx::market::CoinGeckoClient;
use lynx::portfolio::{self, RiskProfile};
use lynx::scanner::{ScanFilters, Scanner};
use lynx::server;
use lynx::util::display;

fn init_tracing() -> Result<()> {
    // Create logs directory if it doesn't exist
    std::fs::create_dir_all("logs")?;

    // Create file appender for logs
    let file_appender = tracing_appender::rolling::daily("logs", "lynx.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);

    // Create console layer with formatting
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .compact();

    // Create file layer with JSON formatting
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    // Initialize subscriber with both console and file layers
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Leak the guard to prevent the file appender from being dropped
    std::mem::forget(_guard);

    Ok(())
}

/// One-shot scan printed to the terminal instead of serving HTTP.
async fn run_scan(scanner: &Scanner, limit: usize) -> Result<()> {
    let filters = ScanFilters {
        limit,
        ..ScanFilters::default()
    };
    let results = scanner.scan_market(&filters).await?;
    display::print_scan_results(&results);
    Ok(())
}

async fn run_portfolio(
    scanner: &Scanner,
    initial: f64,
    target: f64,
    profile: RiskProfile,
) -> Result<()> {
    let simulation = portfolio::simulate(scanner, initial, target, profile).await?;
    display::print_portfolio(&simulation);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    info!("🐱 Lynx Momentum Scanner");
    info!("========================");

    let config_path = std::env::var("LYNX_CONFIG").unwrap_or_else(|_| "lynx.toml".to_string());
    let config = Config::load(&config_path)?;

    let client = Arc::new(CoinGeckoClient::new(&config.coingecko)?);
    let scanner = Arc::new(Scanner::new(client, &config.scanner));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("scan") => {
            let limit = args
                .get(1)
                .and_then(|v| v.parse().ok())
                .unwrap_or(config.scanner.default_limit);
            run_scan(&scanner, limit).await?;
        }
        Some("portfolio") => {
            let initial = args.get(1).and_then(|v| v.parse().ok()).unwrap_or(100.0);
            let target = args.get(2).and_then(|v| v.parse().ok()).unwrap_or(1000.0);
            let profile = args
                .get(3)
                .and_then(|v| RiskProfile::from_str(v).ok())
                .unwrap_or_default();
            run_portfolio(&scanner, initial, target, profile).await?;
        }
        Some(other) => {
            error!("Unknown command: {other}");
            eprintln!("Usage: lynx [scan [limit] | portfolio [initial] [target] [low|medium|high]]");
            std::process::exit(2);
        }
        None => {
            server::serve(&config, scanner).await?;
            info!("👋 Lynx shutdown complete");
        }
    }

    Ok(())
}
