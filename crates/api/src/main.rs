use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackval_api::config::{LogFormat, ServerConfig};
use trackval_api::router::build_app_router;
use trackval_api::state::{AppState, Registry};
use trackval_core::ffmpeg::FfmpegChunkSource;
use trackval_core::segmentation::NoSegmentation;

const DEFAULT_LOG_FILTER: &str = "trackval_api=debug,trackval_session=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let subscriber = tracing_subscriber::registry().with(filter);
    match LogFormat::from_env() {
        LogFormat::Json => subscriber.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => subscriber.with(tracing_subscriber::fmt::layer()).init(),
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        videos_root = %config.videos_root.display(),
        "Loaded server configuration"
    );

    // --- Experiment registry ---
    let registry: Arc<Registry> = Arc::new(Registry::new(
        config.registry_config(),
        FfmpegChunkSource,
        Arc::new(NoSegmentation),
    ));

    if let Some(experiment) = &config.default_experiment {
        match registry.switch_to(experiment).await {
            Ok(_) => tracing::info!(%experiment, "Default experiment activated"),
            Err(e) => tracing::warn!(%experiment, error = %e, "Default experiment could not be activated"),
        }
    }

    // --- App state ---
    let state = AppState {
        registry: Arc::clone(&registry),
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain, registry.shutdown()).await.is_err() {
        tracing::warn!(timeout_secs = config.shutdown_timeout_secs, "Experiment release timed out");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
