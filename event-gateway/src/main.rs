//! Event Gateway web server.
//!
//! This binary:
//! - Receives signed events over HTTP
//! - Verifies the HMAC signature
//! - Publishes each event to Kafka and waits for the acknowledgment
//! - Flushes and closes the producer on shutdown

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use event_gateway::web::router;
use event_gateway::{AppState, Config, EventPublisher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("event_gateway_starting");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        kafka_brokers = ?config.broker.brokers(),
        kafka_topic = %config.broker.topic(),
        kafka_acks = %config.broker.acks(),
        kafka_retries = config.broker.retries(),
        signature_header = %config.signature_header,
        connect_on_startup = config.connect_on_startup,
        "config_loaded"
    );

    // Create Kafka publisher
    let publisher = EventPublisher::new(config.broker.clone());
    if config.connect_on_startup {
        // Handlers connect lazily, so a broker that is down at boot only
        // delays the first publish.
        if let Err(e) = publisher.connect().await {
            warn!(error = %e, "kafka_startup_connect_failed");
        }
    }

    // Create application state
    let state = AppState::new(config.clone(), publisher.clone());
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Flush and close producer connection
    publisher.close().await;

    info!("event_gateway_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
