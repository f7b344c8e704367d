use std::borrow::Cow;
use std::io;
use tokio::net::TcpStream;
use tracing::debug;

pub const DEFAULT_TARGET_PORT: u16 = 443;

/// Appends the default port to a bare host. `host:port` is returned as is.
#[must_use]
pub fn with_default_port(target: &str) -> Cow<'_, str> {
    if target.contains(':') {
        Cow::Borrowed(target)
    } else {
        Cow::Owned(format!("{target}:{DEFAULT_TARGET_PORT}"))
    }
}

/// Opens the outbound connection, relying on the OS connect timeout.
pub async fn dial(target: &str) -> io::Result<TcpStream> {
    let address = with_default_port(target);
    debug!(target_addr = %address, "Attempting to connect to target server");
    TcpStream::connect(address.as_ref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn bare_host_gets_port_443() {
        assert_eq!(with_default_port("example.com"), "example.com:443");
        assert_eq!(with_default_port("127.0.0.1"), "127.0.0.1:443");
    }

    #[test]
    fn explicit_port_is_preserved() {
        assert_eq!(with_default_port("example.com:22"), "example.com:22");
        assert_eq!(with_default_port("localhost:0080"), "localhost:0080");
        assert!(matches!(with_default_port("localhost:1"), Cow::Borrowed(_)));
    }

    #[tokio::test]
    async fn connects_to_listening_target() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let stream = dial(&format!("127.0.0.1:{port}")).await.unwrap();
        let (accepted, _) = listener.accept().await.unwrap();
        assert_eq!(stream.peer_addr().unwrap(), accepted.local_addr().unwrap());
    }

    #[tokio::test]
    async fn fails_when_nothing_listens() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(dial(&format!("127.0.0.1:{port}")).await.is_err());
    }

    #[tokio::test]
    async fn fails_on_invalid_port() {
        assert!(dial("127.0.0.1:notaport").await.is_err());
    }
}
