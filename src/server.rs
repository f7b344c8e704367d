use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Semaphore};
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::{Config, TunnelConfig};
use crate::error::TunnelError;
use crate::proxy::handle_connection;

/// Binds the configured address and serves connections until the process
/// is killed. Only a bind failure is returned.
pub async fn run(config: Config) -> Result<()> {
    let addr = config.listen.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {addr}"))?;

    info!(
        listen_addr = %addr,
        default_target = %config.tunnel.default_target,
        secret_configured = config.tunnel.requires_secret(),
        max_connections = config.listen.max_connections,
        "Tunnel listening"
    );

    serve(listener, Arc::new(config.tunnel), config.listen.max_connections).await;
    Ok(())
}

/// Accepts connections forever, handing each to its own task.
///
/// With `max_connections` set, accepting pauses while that many
/// connections are in flight.
pub async fn serve(listener: TcpListener, tunnel: Arc<TunnelConfig>, max_connections: Option<usize>) {
    let limit = max_connections.map(|max| Arc::new(Semaphore::new(max)));

    loop {
        let permit = match &limit {
            Some(limit) => limit.clone().acquire_owned().await.ok(),
            None => None,
        };

        let (stream, client_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
                continue;
            }
        };

        let tunnel = tunnel.clone();
        let span = info_span!("connection", client_addr = %client_addr);
        tokio::spawn(
            async move {
                let _permit = permit;
                if let Err(e) = handle_connection(stream, &tunnel).await {
                    match e.downcast_ref::<TunnelError>() {
                        Some(rejection) => warn!(reason = %rejection, "Tunnel rejected"),
                        None => error!(error = %format!("{e:#}"), "Connection failed"),
                    }
                }
            }
            .instrument(span),
        );
    }
}
