use std::future::ready;

use axum::routing::get;

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    verifa::telemetry::setup_subscriber();

    let state = verifa::initialize_state().await?;
    let metrics = verifa::telemetry::setup_metrics_recorder()?;

    let app = verifa::app(state)
        .route("/metrics", get(move || ready(metrics.render())));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(%port, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install CTRL+C handler");
        return;
    }
    tracing::info!("shutting down");
}
