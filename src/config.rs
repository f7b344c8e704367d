use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

use crate::relay::RelaySettings;

pub const DEFAULT_LISTEN_IP: &str = "127.0.0.1";
pub const DEFAULT_LISTEN_PORT: u16 = 700;
pub const DEFAULT_TARGET: &str = "127.0.0.1:111";
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BUFFER_SIZE: usize = 4096 * 4;
pub const DEFAULT_BANNER: &str =
    "<b><i><font color=\"blue\">Assalamualaikum Kawann</font></b>";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: ListenConfig,
    pub tunnel: TunnelConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub ip: String,
    pub port: u16,
    /// Upper bound on concurrently handled connections. Unbounded when unset.
    pub max_connections: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    /// Target used when the client does not send `X-Real-Host`.
    pub default_target: String,
    /// Shared secret expected in `X-Pass`. Empty disables authentication.
    pub secret: String,
    pub idle_timeout_secs: u64,
    pub buffer_size: usize,
    /// Status text placed after `101` in the acceptance response.
    pub banner: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            ip: DEFAULT_LISTEN_IP.to_string(),
            port: DEFAULT_LISTEN_PORT,
            max_connections: None,
        }
    }
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            default_target: DEFAULT_TARGET.to_string(),
            secret: String::new(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            banner: DEFAULT_BANNER.to_string(),
        }
    }
}

impl ListenConfig {
    #[must_use]
    pub fn address(&self) -> String {
        if self.ip.contains(':') && !self.ip.starts_with('[') {
            format!("[{}]:{}", self.ip, self.port)
        } else {
            format!("{}:{}", self.ip, self.port)
        }
    }
}

impl TunnelConfig {
    #[must_use]
    pub fn requires_secret(&self) -> bool {
        !self.secret.is_empty()
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    #[must_use]
    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            idle_timeout: self.idle_timeout(),
            buffer_size: self.buffer_size,
        }
    }

    /// The fixed upgrade acceptance sent once before relaying starts.
    ///
    /// `Sec-WebSocket-Accept` is a constant; clients of this tunnel never
    /// verify it.
    #[must_use]
    pub fn accept_response(&self) -> String {
        format!(
            "HTTP/1.1 101 {}\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: foo\r\n\r\n",
            self.banner
        )
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.listen.max_connections == Some(0) {
            bail!("listen.max_connections must be greater than zero when set");
        }
        if self.tunnel.buffer_size == 0 {
            bail!("tunnel.buffer_size must be greater than zero");
        }
        if self.tunnel.idle_timeout_secs == 0 {
            bail!("tunnel.idle_timeout_secs must be greater than zero");
        }
        if self.tunnel.default_target.trim().is_empty() {
            bail!("tunnel.default_target must not be empty");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {} as valid TOML", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}
