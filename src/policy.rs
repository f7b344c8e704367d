use crate::config::TunnelConfig;
use crate::error::TunnelError;
use crate::headers::Handshake;

/// Checks whether a target may be reached without a shared secret.
///
/// This is a plain prefix test on `host[:port]`, so `localhost:22` and
/// `127.0.0.1` both qualify.
#[must_use]
pub fn is_loopback_target(target: &str) -> bool {
    target.starts_with("127.0.0.1") || target.starts_with("localhost")
}

/// Picks the target for a handshake, falling back to the configured default.
#[must_use]
pub fn resolve_target<'a>(handshake: &'a Handshake, config: &'a TunnelConfig) -> &'a str {
    handshake
        .real_host
        .as_deref()
        .filter(|host| !host.is_empty())
        .unwrap_or(config.default_target.as_str())
}

/// Decides whether the tunnel may be opened, returning the target to dial.
///
/// With a secret configured, `X-Pass` must match it exactly and any target is
/// allowed. Without one, only loopback targets are allowed so the tunnel
/// cannot be used as an open relay.
pub fn authorize(handshake: &Handshake, config: &TunnelConfig) -> Result<String, TunnelError> {
    let target = resolve_target(handshake, config);

    if config.requires_secret() {
        if handshake.pass.as_deref() != Some(config.secret.as_str()) {
            return Err(TunnelError::WrongCredential);
        }
        return Ok(target.to_owned());
    }

    if is_loopback_target(target) {
        Ok(target.to_owned())
    } else {
        Err(TunnelError::Forbidden {
            target: target.to_owned(),
        })
    }
}
