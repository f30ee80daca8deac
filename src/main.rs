use anyhow::Context;
use tracing_subscriber::EnvFilter;

use landmark_id::api;
use landmark_id::config::Config;
use landmark_id::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Catalog root: {}", config.catalog.root.display());
    tracing::info!(
        "Catalog version: {} (model {}, dim {})",
        config.catalog.version,
        config.catalog.model,
        config.catalog.embedding_dim
    );
    tracing::info!(
        "Classifier: top_k={} confidence={} backup={}",
        config.classifier.top_k,
        config.classifier.confidence_threshold,
        config.classifier.backup_threshold
    );

    // Refuse to serve without a complete catalog.
    let state = AppState::new(config.clone()).context("Startup aborted")?;
    let catalog = state.catalog();
    tracing::info!(
        "Loaded {} embeddings into memory (version {})",
        catalog.size(),
        catalog.version()
    );

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
