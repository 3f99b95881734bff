use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use rustygate::config::ServerConfig;
use rustygate::logging;
use rustygate::net::server::Server;
use rustygate::proxy::Forwarder;

/// Forwarding HTTP/1.1 proxy for GET requests.
#[derive(Debug, Parser)]
#[command(name = "http-proxy", version, about)]
struct Cli {
    /// TCP port to listen on
    port: u16,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connections handled at once; further ones wait in the accept loop
    #[arg(long, conflicts_with = "unbounded")]
    max_connections: Option<usize>,

    /// Admit every connection without a concurrency limit
    #[arg(long)]
    unbounded: bool,
}

#[async_std::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let mut config = match ServerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    config.port = cli.port;
    if let Some(max) = cli.max_connections {
        config.max_connections = Some(max);
    }
    if cli.unbounded {
        config.max_connections = None;
    }
    if let Err(err) = config.validate() {
        error!("{}", err);
        return ExitCode::FAILURE;
    }

    let config = Arc::new(config);
    if config.max_connections.is_none() {
        warn!("running without a connection limit");
    }
    info!(port = config.port, "proxy will start");

    let server = match Server::bind(Arc::clone(&config), Forwarder::new(Arc::clone(&config))).await {
        Ok(server) => server,
        Err(err) => {
            error!("failed to listen on {}: {}", config.socket_addr(), err);
            return ExitCode::FAILURE;
        }
    };

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("proxy stopped: {}", err);
            ExitCode::FAILURE
        }
    }
}
