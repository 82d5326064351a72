//! dinq HTTP server.
//!
//! Loads the model and graph artifacts once and serves predictions and
//! analytics over REST; see [`dinq::server`] for the routes.
//!
//! Build and run: `cargo run --features server --bin dinq-server`

use std::sync::Arc;

use dinq::config::ServiceConfig;
use dinq::paths::DinqPaths;
use dinq::server::build_router;
use dinq::service::PredictionService;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let paths = DinqPaths::resolve().unwrap_or_else(|e| {
        tracing::error!("failed to resolve XDG paths: {e}");
        std::process::exit(1);
    });
    if let Err(e) = paths.ensure_dirs() {
        tracing::error!("failed to create XDG directories: {e}");
        std::process::exit(1);
    }

    let config = ServiceConfig::discover(None, &paths).unwrap_or_else(|e| {
        tracing::error!("failed to load config: {e}");
        std::process::exit(1);
    });

    let bind = std::env::var("DINQ_SERVER_BIND").unwrap_or_else(|_| config.server.bind.clone());
    let port = std::env::var("DINQ_SERVER_PORT").unwrap_or_else(|_| config.server.port.to_string());
    let addr = format!("{bind}:{port}");

    let service = PredictionService::load(config, &paths).unwrap_or_else(|e| {
        tracing::error!("failed to load prediction service: {e}");
        std::process::exit(1);
    });
    let app = build_router(Arc::new(service));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        });
    tracing::info!("dinq server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
