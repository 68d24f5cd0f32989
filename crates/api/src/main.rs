use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use decora_events::{EmailNotifier, WebhookDelivery};
use decora_gemini::{GeminiApi, GenerationClient};
use decora_pipeline::Orchestrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use decora_api::config::ServerConfig;
use decora_api::router::build_app_router;
use decora_api::sessions::{SessionStore, SWEEP_INTERVAL};
use decora_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "decora_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        host = %config.host,
        port = config.port,
        text_model = %config.gemini.text_model,
        image_model = %config.gemini.image_model,
        "Loaded server configuration"
    );

    // --- Generation backend ---
    let gemini = match GeminiApi::new(&config.gemini) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build Gemini client");
            std::process::exit(1);
        }
    };
    let generation = GenerationClient::from_config(Arc::new(gemini), &config.gemini);

    // --- Notification sink ---
    let delivery = match WebhookDelivery::new() {
        Ok(delivery) => delivery,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build webhook client");
            std::process::exit(1);
        }
    };
    if config.notify_webhook_url.is_none() {
        tracing::warn!("NOTIFY_WEBHOOK_URL not set, emails will not be recorded");
    }
    let notifier = EmailNotifier::new(config.notify_webhook_url.clone(), delivery);

    // --- Session registry ---
    let sessions = Arc::new(SessionStore::new());
    tokio::spawn(sessions.clone().run_sweeper(
        Duration::from_secs(config.session_ttl_secs),
        SWEEP_INTERVAL,
    ));
    tracing::info!(ttl_secs = config.session_ttl_secs, "Idle session sweeper started");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        sessions,
        orchestrator: Orchestrator::new(Arc::new(generation), Arc::new(notifier)),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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
