use std::io;
use thiserror::Error;

pub const WRONG_PASS_RESPONSE: &[u8] = b"HTTP/1.1 400 WrongPass!\r\n\r\n";
pub const FORBIDDEN_RESPONSE: &[u8] = b"HTTP/1.1 403 Forbidden!\r\n\r\n";
pub const BAD_GATEWAY_RESPONSE: &[u8] = b"HTTP/1.1 502 Bad Gateway\r\n\r\n";

/// Reasons a tunnel is refused before relaying starts.
#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("client presented a wrong credential")]
    WrongCredential,

    #[error("target {target} is not a loopback address and no secret is configured")]
    Forbidden { target: String },

    #[error("failed to connect to target {target}")]
    BadGateway {
        target: String,
        #[source]
        source: io::Error,
    },
}

impl TunnelError {
    /// Fixed bytes written to the client before the connection is dropped.
    #[must_use]
    pub const fn response(&self) -> &'static [u8] {
        match self {
            Self::WrongCredential => WRONG_PASS_RESPONSE,
            Self::Forbidden { .. } => FORBIDDEN_RESPONSE,
            Self::BadGateway { .. } => BAD_GATEWAY_RESPONSE,
        }
    }
}
