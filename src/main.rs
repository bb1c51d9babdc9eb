use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use market_intel::app;
use market_intel::banner::print_banner;
use market_intel::config::AppConfig;
use market_intel::logging::init_logging;
use market_intel::services::market_data_service::MarketDataService;
use market_intel::services::refresh_scheduler::RefreshScheduler;
use market_intel::services::report_store::ReportStore;
use market_intel::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let market_data = Arc::new(
        MarketDataService::from_config(&config.llm, ReportStore::new(), config.default_topic.clone())
            .context("Failed to create market data service")?,
    );
    let state = AppState::new(market_data.clone());
    let app = app::create_app(state, &config.static_dir);

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    print_banner(config.port);
    info!("Default research topic: {}", market_data.default_topic());

    if let Some(topic) = config.startup_topic.clone() {
        let service = market_data.clone();
        tokio::spawn(async move {
            if let Err(e) = service.fetch(Some(&topic)).await {
                error!("Initial market data fetch failed: {}", e);
            }
        });
    }

    let mut scheduler = match &config.refresh_schedule {
        Some(schedule) => {
            let mut scheduler = RefreshScheduler::new(market_data.clone()).await?;
            scheduler.start(schedule, config.refresh_topic.clone()).await?;
            Some(scheduler)
        }
        None => None,
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.stop().await {
            warn!("{}", e);
        }
    }

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("🛑 Shutdown signal received");
}
