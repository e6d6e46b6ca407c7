use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use notes_api_rust::config::AppConfig;
use notes_api_rust::database::DatabaseManager;
use notes_api_rust::state::AppState;
use notes_api_rust::store::{MemoryNoteStore, NoteStore, PgNoteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notes_api_rust=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Notes API in {:?} mode", config.environment);

    let pool = match config.database.url {
        Some(_) => Some(
            DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to database")?,
        ),
        None if config.is_production() => {
            anyhow::bail!("DATABASE_URL is required in production");
        }
        None => None,
    };

    let store: Arc<dyn NoteStore> = match &pool {
        Some(pool) => Arc::new(PgNoteStore::new(pool.clone())),
        None => {
            tracing::warn!("DATABASE_URL not set; notes are kept in memory and lost on exit");
            Arc::new(MemoryNoteStore::new())
        }
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let app = notes_api_rust::app(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Notes API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pool) = pool {
        DatabaseManager::close(&pool).await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
