//! Full-duplex byte relay between the client and the target.
//!
//! Each direction is its own copy loop with a per-read idle timeout. The
//! loops share a [`CloseSignal`]; whichever finishes first raises it, which
//! releases the other loop from any pending read or write.

use std::{fmt, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::watch,
    time::timeout,
};
use tracing::{debug, error, info};

use crate::config::{DEFAULT_BUFFER_SIZE, DEFAULT_IDLE_TIMEOUT_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySettings {
    /// Maximum time a single read may wait for data.
    pub idle_timeout: Duration,
    pub buffer_size: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub client_to_target: u64,
    pub target_to_client: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToTarget,
    TargetToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientToTarget => f.write_str("client->target"),
            Self::TargetToClient => f.write_str("target->client"),
        }
    }
}

/// Termination flag shared by the two halves of a tunnel.
#[derive(Debug, Clone)]
pub struct CloseSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CloseSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raises the signal. Closing twice is a no-op.
    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has been raised.
    pub async fn closed(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// Relays bytes between `client` and `target` until either side ends.
///
/// The target-to-client direction runs on its own task; this future waits
/// for both directions and drops both streams before returning.
pub async fn relay<C, T>(client: C, target: T, settings: RelaySettings) -> RelayStats
where
    C: AsyncRead + AsyncWrite + Send + 'static,
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    let (client_reader, client_writer) = tokio::io::split(client);
    let (target_reader, target_writer) = tokio::io::split(target);
    let signal = CloseSignal::new();

    let downstream = tokio::spawn(copy_direction(
        Direction::TargetToClient,
        target_reader,
        client_writer,
        signal.clone(),
        settings,
    ));

    let client_to_target = copy_direction(
        Direction::ClientToTarget,
        client_reader,
        target_writer,
        signal.clone(),
        settings,
    )
    .await;

    let target_to_client = match downstream.await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Relay task failed");
            signal.close();
            0
        }
    };

    let stats = RelayStats {
        client_to_target,
        target_to_client,
    };
    info!(
        client_to_target = stats.client_to_target,
        target_to_client = stats.target_to_client,
        "Tunnel closed"
    );
    stats
}

/// Copies `src` into `dst` until end of stream, an error, idle timeout, or
/// the shared signal. Always raises the signal and shuts `dst` down on exit.
pub async fn copy_direction<R, W>(
    direction: Direction,
    mut src: R,
    mut dst: W,
    signal: CloseSignal,
    settings: RelaySettings,
) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; settings.buffer_size];
    let mut total = 0u64;

    loop {
        let read = tokio::select! {
            () = signal.closed() => break,
            read = timeout(settings.idle_timeout, src.read(&mut buffer)) => read,
        };

        let n = match read {
            Ok(Ok(0)) => {
                debug!(%direction, "End of stream");
                break;
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                error!(%direction, error = %e, "Failed to read from source");
                break;
            }
            Err(_) => {
                error!(
                    %direction,
                    idle_secs = settings.idle_timeout.as_secs_f64(),
                    "Read timed out"
                );
                break;
            }
        };

        debug!(%direction, bytes = n, "Forwarding data");
        let written = tokio::select! {
            () = signal.closed() => break,
            written = dst.write_all(&buffer[..n]) => written,
        };
        if let Err(e) = written {
            error!(%direction, error = %e, bytes = n, "Failed to write to destination");
            break;
        }
        total += n as u64;
    }

    signal.close();
    let _ = dst.shutdown().await;
    total
}
