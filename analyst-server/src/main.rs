use analyst_api::{observability, AppState};
use analyst_workflow::AnalysisPipeline;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

mod config;
mod shutdown;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::load()?;

    observability::init_logging(&config.log)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;
    observability::init_metrics().context("failed to initialize metrics")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting data analyst agent");
    tracing::info!(
        datasets = config.pipeline.datasets.len(),
        max_upload_bytes = config.max_upload_bytes,
        request_timeout_secs = config.request_timeout_secs,
        "Configuration loaded"
    );

    let pipeline =
        AnalysisPipeline::from_config(&config.pipeline).context("failed to build pipeline")?;
    let state = AppState::new(pipeline);

    let app = analyst_api::routes(state, config.max_upload_bytes)
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
