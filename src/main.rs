use gesture_ingest::core::config::Config;
use gesture_ingest::core::ingest::IngestionOrchestrator;
use gesture_ingest::core::store::HfDatasetStore;
use gesture_ingest::http::{router, AppState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    if config.storage_configured() {
        info!("storage configured, uploads enabled");
    } else {
        warn!("HF_TOKEN or DATASET_ID is missing, uploads will fail");
    }

    std::fs::create_dir_all(&config.staging_root)?;

    // Token is only read after the per-request configuration check passes,
    // so an unconfigured store is never exercised.
    let store = Arc::new(HfDatasetStore::new(
        config.hub_endpoint.clone(),
        config.storage_token.clone().unwrap_or_default(),
    ));

    let bind_addr = config.bind_addr;
    let orchestrator = Arc::new(IngestionOrchestrator::new(config, store));
    let app = router(AppState { orchestrator });

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
