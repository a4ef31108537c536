use std::time::Duration;

use anyhow::Result;
use signal_service::config::ServiceConfig;
use signal_service::repository::InMemoryRepository;
use signal_service::{build_production_market_data, build_production_panel, build_production_sentiment, SignalService};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("starting signal engine");

    let config = ServiceConfig::from_env()?;
    tracing::info!(
        signal_deadline_seconds = config.signal_deadline_seconds,
        backtest_deadline_seconds = config.backtest_deadline_seconds,
        "configuration loaded"
    );

    let market = build_production_market_data(&config);
    let sentiment = build_production_sentiment(&config);
    let panel = build_production_panel(&config);
    let repository = InMemoryRepository::new();

    let service = SignalService::new(
        market,
        sentiment,
        panel,
        Default::default(),
        repository,
        Duration::from_secs(config.signal_deadline_seconds),
        Duration::from_secs(config.backtest_deadline_seconds),
    );

    // The core exposes operations only; invocation is driven by an
    // external scheduler or transport layer. This binary's job ends
    // at wiring — a real deployment pairs it with an HTTP or CLI front end
    // that calls `service.generate_signal(...)` etc. on demand.
    let watchlist = std::env::var("WATCHLIST").unwrap_or_default();
    if !watchlist.is_empty() {
        let tickers: Vec<String> = watchlist.split(',').map(|s| s.trim().to_string()).collect();
        tracing::info!(?tickers, "running one-shot scan over configured watchlist");
        let verdicts = service.generate_batch(&tickers).await;
        for verdict in &verdicts {
            tracing::info!(
                ticker = verdict.ticker.as_str(),
                signal = ?verdict.signal_type,
                confidence = verdict.confidence,
                "signal generated"
            );
        }
    } else {
        tracing::info!("no WATCHLIST configured, idling");
    }

    Ok(())
}
