//! HomeVault Server: personal file storage node tree.
//!
//! Main entry point that wires the crates together, runs the processing
//! worker pool and the optional reconciliation schedule, and shuts both
//! down cooperatively on Ctrl-C.

use tracing_subscriber::{EnvFilter, fmt};

use homevault_core::config::AppConfig;
use homevault_core::error::AppError;
use homevault_worker::{Runtime, ScanScheduler};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("HOMEVAULT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting HomeVault v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Catalog, migrations, data directories ────────────
    let (runtime, signals) = Runtime::connect(config).await?;
    tracing::info!(
        files = %runtime.layout.files_root().display(),
        thumbs = %runtime.layout.thumbs_root().display(),
        homes = %runtime.layout.home_root().display(),
        "Storage ready"
    );

    // ── Step 2: Processing worker pool ───────────────────────────
    let processor = if runtime.config.processing.enabled {
        let pending = runtime.queue.pending_count().await?;
        tracing::info!(pending, "Starting node processor");
        Some(tokio::spawn(runtime.processor.clone().run(signals)))
    } else {
        tracing::warn!("Processing disabled; requests will accumulate in the queue");
        None
    };

    // ── Step 3: Reconciliation schedule ──────────────────────────
    let mut scheduler = match &runtime.config.scan.schedule {
        Some(schedule) => {
            let scheduler = ScanScheduler::new(runtime.scanner.clone()).await?;
            scheduler.register(schedule).await?;
            scheduler.start().await?;
            Some(scheduler)
        }
        None => {
            tracing::info!("No scan schedule configured");
            None
        }
    };

    tracing::info!("HomeVault is running; press Ctrl-C to stop");

    // ── Step 4: Wait for shutdown ────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;
    tracing::info!("Shutdown signal received");

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    if let Some(handle) = processor {
        runtime.queue.stop().await;
        if let Err(e) = handle.await {
            tracing::error!("Node processor task failed: {}", e);
        }
    }

    runtime.db.close().await;
    tracing::info!("HomeVault stopped");
    Ok(())
}
