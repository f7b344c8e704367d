//! WebSocket-disguised TCP tunnel
//!
//! Accepts connections that open with a WebSocket-style upgrade request,
//! picks the target from the `X-Real-Host` header, optionally checks a shared
//! secret in `X-Pass`, then relays raw bytes between client and target.

pub mod config;
pub mod dial;
pub mod error;
pub mod headers;
pub mod policy;
pub mod proxy;
pub mod relay;
pub mod server;

// Re-export commonly used types and functions
pub use config::{Config, ListenConfig, TunnelConfig, load_config};
pub use dial::{dial, with_default_port};
pub use error::TunnelError;
pub use headers::{Handshake, HeaderBlock, lookup};
pub use policy::{authorize, is_loopback_target};
pub use proxy::handle_connection;
pub use relay::{CloseSignal, RelaySettings, RelayStats, relay};
pub use server::{run, serve};
