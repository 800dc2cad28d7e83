use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::ServiceExt;
use tokio::net::TcpListener;

use facerec_rest::{build_app, tracing_init, AppState};
use facerec_service::{build_service, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let json_logs = config.log_format() == "json";

    // Set ENABLE_TRACING=true to export spans to Jaeger
    if tracing_init::tracing_enabled() {
        if let Err(e) = tracing_init::init_from_env(&config.logging.level, json_logs) {
            tracing_init::init_logging(&config.logging.level, json_logs);
            tracing::warn!("Failed to initialize tracing: {}. Falling back to basic logging.", e);
        } else {
            tracing::info!("Distributed tracing initialized");
        }
    } else {
        tracing_init::init_logging(&config.logging.level, json_logs);
    }

    tracing::info!(environment = %config.environment, backend = ?config.database.backend, "starting face registration server");

    let service = Arc::new(build_service(&config).await?);

    // Bring the gallery in line with the store before accepting traffic.
    let summary = service
        .export_gallery()
        .await
        .context("initial gallery export failed")?;
    tracing::info!(records = summary.records, path = %summary.path.display(), "gallery ready");

    let app = build_app(AppState::new(service), &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!("REST server listening on {}", addr);

    axum::serve(
        listener,
        ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");

    if tracing_init::tracing_enabled() {
        tracing_init::shutdown();
    }

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
