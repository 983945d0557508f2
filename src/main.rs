//! ChatHub Server: real-time chat hub
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use chathub_api::{AppState, build_router};
use chathub_auth::JwtDecoder;
use chathub_core::config::AppConfig;
use chathub_core::error::AppError;
use chathub_core::traits::{ChangeFeed, ChatStore, MediaTranscoder};
use chathub_realtime::{MemoryChangeFeed, RealtimeEngine};
use chathub_storage::{ImageTranscoder, MemoryChatStore};
use chathub_worker::{CronScheduler, RetentionSweep};

/// Placeholder secret shipped in the default configuration.
const DEFAULT_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/default.toml`, the `CHATHUB_ENV` overlay
/// and `CHATHUB__SECTION__KEY` environment variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("CHATHUB_ENV").unwrap_or_else(|_| "development".to_string());
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
    tracing::info!("Starting ChatHub v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // ── Step 1: Storage collaborators ────────────────────────────
    if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
        tracing::warn!("auth.jwt_secret is the default placeholder; set CHATHUB__AUTH__JWT_SECRET");
    }
    let store: Arc<dyn ChatStore> = Arc::new(MemoryChatStore::new());
    let transcoder: Arc<dyn MediaTranscoder> =
        Arc::new(ImageTranscoder::from_config(&config.attachments));
    tracing::info!("In-memory store and image transcoder initialized");

    // ── Step 2: Auth ─────────────────────────────────────────────
    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

    // ── Step 3: Realtime engine ──────────────────────────────────
    let engine = Arc::new(RealtimeEngine::new(
        &config,
        Arc::clone(&store),
        Arc::clone(&transcoder),
    ));

    // ── Step 4: Change feed listener ─────────────────────────────
    let change_feed: Arc<dyn ChangeFeed> = Arc::new(MemoryChangeFeed::default());
    let listener = engine.listen(Arc::clone(&change_feed)).await?;

    // ── Step 5: Retention sweep ──────────────────────────────────
    let mut scheduler = if config.retention.enabled {
        let scheduler = CronScheduler::new().await?;
        let sweep = Arc::new(RetentionSweep::from_config(
            Arc::clone(&store),
            engine.deletions.clone(),
            &config.retention,
        )?);
        scheduler
            .register_retention_sweep(sweep, &config.retention.sweep_cron)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Retention sweep disabled");
        None
    };

    // ── Step 6: Build and start HTTP server ──────────────────────
    let state = AppState::new(
        Arc::clone(&config),
        store,
        transcoder,
        change_feed,
        jwt_decoder,
        Arc::clone(&engine),
    );
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener_socket = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let shutdown_engine = Arc::clone(&engine);
    axum::serve(listener_socket, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            // Closing every socket lets upgraded connections finish so
            // serve can return.
            if let Err(e) = shutdown_engine.shutdown().await {
                tracing::warn!("Real-time engine shutdown failed: {}", e);
            }
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 8: Wait for background tasks ────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, listener).await.is_err() {
        tracing::warn!("Change feed listener did not stop within {:?}", grace);
    }

    tracing::info!("ChatHub stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
