use anyhow::{Context, Result, bail};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::TunnelConfig;
use crate::dial::dial;
use crate::error::TunnelError;
use crate::headers::Handshake;
use crate::policy::authorize;
use crate::relay::relay;

/// Runs the whole pipeline for one inbound connection: read the handshake,
/// apply the access policy, dial the target, accept, then relay.
///
/// Refusals are answered with their fixed response and returned as a
/// [`TunnelError`]. Failures that leave nothing to answer (a failed first
/// read, a failed acceptance write) are returned without writing anything.
#[tracing::instrument(skip(stream, config))]
pub async fn handle_connection<S>(mut stream: S, config: &TunnelConfig) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut buffer = vec![0u8; config.buffer_size];
    let n = stream
        .read(&mut buffer)
        .await
        .context("Failed to read handshake from client")?;
    if n == 0 {
        bail!("Client closed the connection before sending a handshake");
    }

    let handshake = Handshake::parse(&buffer[..n]);
    debug!(
        bytes = n,
        real_host = handshake.real_host.as_deref(),
        split = handshake.split,
        "Handshake received"
    );

    if handshake.split {
        match stream.read(&mut buffer).await {
            Ok(discarded) => debug!(bytes = discarded, "Discarded split handshake segment"),
            Err(e) => warn!(error = %e, "Failed to read split handshake segment"),
        }
    }

    let target = match authorize(&handshake, config) {
        Ok(target) => target,
        Err(rejection) => return reject(&mut stream, rejection).await,
    };
    drop(handshake);
    drop(buffer);

    info!(target_addr = %target, "CONNECT");
    let upstream = match dial(&target).await {
        Ok(upstream) => upstream,
        Err(source) => return reject(&mut stream, TunnelError::BadGateway { target, source }).await,
    };
    info!(target_addr = %target, "Connected to target server");

    stream
        .write_all(config.accept_response().as_bytes())
        .await
        .context("Failed to send handshake acceptance to client")?;

    relay(stream, upstream, config.relay_settings()).await;
    Ok(())
}

async fn reject<S>(stream: &mut S, rejection: TunnelError) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    if let Err(e) = stream.write_all(rejection.response()).await {
        debug!(error = %e, "Failed to send rejection to client");
    }
    Err(rejection.into())
}
