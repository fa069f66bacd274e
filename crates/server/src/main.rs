use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frameflow_core::{
    load_config, validate_config, HttpDownloader, JobStore, JsonJobStore, PipelineOrchestrator,
    RunwareClient,
};

use frameflow_server::api::create_router;
use frameflow_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = VERSION, "Starting frameflow server");

    // Determine config path
    let config_path = std::env::var("FRAMEFLOW_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Uploads directory: {:?}", config.storage.uploads_dir);
    info!("Videos directory: {:?}", config.storage.videos_dir);
    info!("State file: {:?}", config.storage.state_file);

    if config.soundtrack.is_some() {
        info!("Soundtrack service configured but not wired into the pipeline; ignoring");
    }

    // Create storage directories
    std::fs::create_dir_all(&config.storage.uploads_dir)
        .context("Failed to create uploads directory")?;
    std::fs::create_dir_all(&config.storage.videos_dir)
        .context("Failed to create videos directory")?;

    // Create job store
    let store = Arc::new(JsonJobStore::new(&config.storage.state_file));
    let incomplete = store.incomplete_jobs();
    if !incomplete.is_empty() {
        warn!(
            count = incomplete.len(),
            "Snapshot holds incomplete jobs from a previous run"
        );
    }
    info!("Job store initialized");

    // Create generation client
    let runware_config = config
        .generator
        .runware
        .clone()
        .context("Runware configuration missing")?;
    info!("Initializing Runware client at {}", runware_config.url);
    let generator = Arc::new(RunwareClient::new(runware_config));

    // Create downloader
    let downloader = Arc::new(HttpDownloader::new());

    // Create and start the orchestrator
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        config.orchestrator.clone(),
        Arc::clone(&store) as Arc<dyn JobStore>,
        generator,
        downloader,
        config.storage.videos_dir.clone(),
    ));
    orchestrator.start().await;
    info!("Pipeline orchestrator started");

    // Create app state
    let app_state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&store) as Arc<dyn JobStore>,
        Arc::clone(&orchestrator),
    ));

    // Create router
    let app = create_router(app_state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop in-flight pipelines, then write a final snapshot
    info!("Server shutting down...");
    orchestrator.stop().await;
    store.flush();
    info!("Job snapshot flushed");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
