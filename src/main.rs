use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crochet_thumbnailer::catalog::Catalog;
use crochet_thumbnailer::config::Config;
use crochet_thumbnailer::web::{self, AppState};
use crochet_thumbnailer::ThumbnailResolver;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    info!("Starting crochet-thumbnailer");

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        storage = ?config.storage_backend,
        render_enabled = config.render_enabled,
        "Configuration loaded"
    );

    // Ensure data directories exist
    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create work directory: {}",
                config.work_dir.display()
            )
        })?;

    if let Some(parent) = config.catalog_path.parent() {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create catalog directory: {}", parent.display())
        })?;
    }

    let resolver = ThumbnailResolver::from_config(&config)
        .context("Failed to initialize thumbnail resolver")?;
    let catalog = Catalog::new(config.catalog_path.clone());

    info!(catalog = %config.catalog_path.display(), "Catalog ready");

    let state = AppState {
        config: Arc::new(config),
        resolver: Arc::new(resolver),
        catalog: Arc::new(catalog),
    };

    web::serve(state).await?;

    info!("Shutdown complete");

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,crochet_thumbnailer=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
