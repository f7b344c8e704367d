use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ws_tunnel::{Config, load_config};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind to [default: 127.0.0.1]
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on [default: 700]
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML configuration file; command line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        if let Some(bind) = self.bind {
            config.listen.ip = bind;
        }
        if let Some(port) = self.port {
            config.listen.port = port;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_file = cli.config.clone();
    let config = cli.into_config()?;
    info!(
        config_file = ?config_file,
        listen_ip = %config.listen.ip,
        listen_port = config.listen.port,
        "Configuration loaded"
    );

    ws_tunnel::run(config).await
}
