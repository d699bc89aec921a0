//! Document preview HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use entwine_compiler::ProjectLayout;
use tokio::net::TcpListener;

use crate::api::create_router;

/// Server configuration.
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub layout: ProjectLayout,
}

/// Run the server until interrupted.
///
/// The document is composed on every request, so fragment edits show up
/// without a restart.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(Arc::new(config.layout));

    let listener = TcpListener::bind(config.listen_addr).await?;
    entwine_telemetry::log_listening!(
        address = %config.listen_addr,
        "serving OpenAPI document at http://{}/openapi.json",
        config.listen_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    entwine_telemetry::log_shutdown!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
