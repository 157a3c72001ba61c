// src/main.rs

// 🌍 Standard library
use std::process::ExitCode;
use std::sync::Arc;

// 📦 External crates
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// 🧠 Internal modules
use pricecast::async_actors::FetchCoordinator;
use pricecast::config::AppConfig;
use pricecast::domain::{AlphaVantageClient, MemoryCacheStore, PriceCache, SymbolCatalog};
use pricecast::http_api::{start_http_server, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    // Logging configuration
    tracing_subscriber::fmt::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let catalog = SymbolCatalog::default();
    let cache = PriceCache::with_ttl(Arc::new(MemoryCacheStore::new()), config.cache_ttl);
    let provider = Arc::new(AlphaVantageClient::new(
        config.base_url.clone(),
        config.api_key.clone(),
    ));
    let fetcher = Arc::new(FetchCoordinator::new(catalog, cache, provider));
    let (state, _broadcast) = AppState::new(fetcher, config.poll_interval);

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ Failed to bind {}: {e}", config.bind_addr);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("❌ Failed to listen for ctrl-c: {e}");
            }
            info!("🛑 Shutdown requested");
            shutdown.cancel();
        }
    });

    let served = start_http_server(listener, state.clone(), shutdown).await;
    state.watches.shutdown().await;

    match served {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("❌ Server failed: {e}");
            ExitCode::FAILURE
        }
    }
}
