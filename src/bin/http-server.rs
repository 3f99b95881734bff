use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use rustygate::config::ServerConfig;
use rustygate::handler::StaticFiles;
use rustygate::logging;
use rustygate::net::server::Server;

/// Serves files below a root directory (GET) and stores request bodies
/// into it (POST).
#[derive(Debug, Parser)]
#[command(name = "http-server", version, about)]
struct Cli {
    /// TCP port to listen on
    port: u16,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory files are served from and stored into
    #[arg(long)]
    root: Option<PathBuf>,

    /// Connections handled at once; further ones wait in the accept loop
    #[arg(long)]
    max_connections: Option<usize>,
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
    if let Some(root) = cli.root {
        config.static_files_root = root;
    }
    if let Some(max) = cli.max_connections {
        config.max_connections = Some(max);
    }
    if let Err(err) = config.validate() {
        error!("{}", err);
        return ExitCode::FAILURE;
    }

    let config = Arc::new(config);
    info!(
        port = config.port,
        root = %config.static_files_root.display(),
        "server will start"
    );

    let server = match Server::bind(Arc::clone(&config), StaticFiles::new(Arc::clone(&config))).await {
        Ok(server) => server,
        Err(err) => {
            error!("failed to listen on {}: {}", config.socket_addr(), err);
            return ExitCode::FAILURE;
        }
    };

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("server stopped: {}", err);
            ExitCode::FAILURE
        }
    }
}
