use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use discussion_board::config::{self, Environment};
use discussion_board::database::{DatabaseManager, DiscussionStore, MemoryStore, PgDiscussionStore};
use discussion_board::views::{JsonViewEngine, ViewEngine};
use discussion_board::{app, is_production, AppState};

#[derive(Parser)]
#[command(name = "discussion-board")]
#[command(about = "Discussion board server - CRUD pipelines over HTTP")]
#[command(version)]
struct Args {
    #[arg(long, help = "Address to bind (overrides SERVER_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Port to listen on (overrides SERVER_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Use the in-memory store even when DATABASE_URL is set")]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are visible
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting discussion board in {:?} mode", config.environment);

    let store = open_store(&args, config).await?;

    let engine: Arc<dyn ViewEngine> = match config.environment {
        Environment::Development => Arc::new(JsonViewEngine::pretty()),
        _ => Arc::new(JsonViewEngine::new()),
    };

    let state = AppState::new(store, engine, &config.pipeline, config.security.clone());
    let app = app(state);

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Discussion board listening on http://{}", bind_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn open_store(args: &Args, config: &config::AppConfig) -> anyhow::Result<Arc<dyn DiscussionStore>> {
    match DatabaseManager::database_url().filter(|_| !args.memory) {
        Some(url) => {
            let pool = DatabaseManager::connect(&url, &config.database).await?;
            let store = PgDiscussionStore::new(pool);
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
        None => {
            if is_production!() {
                tracing::warn!("Running in production without DATABASE_URL; records will not survive a restart");
            } else {
                tracing::warn!("Using in-memory store; records will not survive a restart");
            }
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
