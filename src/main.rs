//! wsgate - WebSocket session gateway
//!
//! Main entry point for the chat room demo server.

use std::path::PathBuf;

use clap::Parser;

use wsgate_config::ConfigLoader;

mod room;
mod server;

use server::{init_tracing, run_server};

/// wsgate CLI.
#[derive(Parser)]
#[command(name = "wsgate")]
#[command(about = "Chat room served over supervised WebSocket sessions")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Log directory (overrides config)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.log_dir {
        config.logging.dir = Some(dir);
    }

    init_tracing(&config.logging)?;
    run_server(config).await
}
