use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{auth::MailDispatcher, config::ServerConfig, errors::StorefrontError};

use super::routes::{build_router, ApiState};

/// Serve the API until ctrl-c, then wait for queued activation emails.
pub async fn start_api_server(
    config: &ServerConfig,
    state: ApiState,
    mail: MailDispatcher,
) -> crate::Result<()> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| StorefrontError::config(format!("Invalid API address: {}", e)))?;

    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| StorefrontError::transport(format!("Failed to bind API server: {}", e)))?;

    info!(address = %addr, "Starting HTTP API server");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "API server shutdown listener failed");
            }
        })
        .await
        .map_err(|e| StorefrontError::transport(format!("API server error: {}", e)))?;

    info!(pending = mail.pending(), "Draining activation emails");
    mail.shutdown().await;

    info!("API server shutdown completed");
    Ok(())
}
