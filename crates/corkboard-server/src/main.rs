//! Corkboard server binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default port 26500
//! corkboard-server
//!
//! # Keep the board across restarts
//! corkboard-server --bind 127.0.0.1:26500 --board-file MessageBoard.txt
//! ```
//!
//! Ctrl-C starts the shutdown sequence: every client receives the shutdown
//! notice before the listener closes.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::Parser;
use corkboard_proto::{DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PORT};
use corkboard_server::{DEFAULT_BOARD_FILE, Server, ServerConfig, ServerState};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Corkboard message board server
#[derive(Parser, Debug)]
#[command(name = "corkboard-server")]
#[command(about = "Concurrent message board server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
    bind: SocketAddr,

    /// Pending connection queue length
    #[arg(long, default_value = "16")]
    backlog: u32,

    /// Largest accepted transmission in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message_size: usize,

    /// Load the board from this file at startup and save it at shutdown
    #[arg(long)]
    board_file: Option<PathBuf>,

    /// Persist the board to MessageBoard.txt in the working directory
    #[arg(long, conflicts_with = "board_file")]
    persist: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let board_file = args.board_file.or_else(|| args.persist.then(|| DEFAULT_BOARD_FILE.into()));
    let config = ServerConfig {
        bind_address: args.bind,
        backlog: args.backlog,
        max_message_size: args.max_message_size,
        board_file,
        ..ServerConfig::default()
    };

    let state = Arc::new(ServerState::new());
    let server = Server::bind(config, Arc::clone(&state)).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => state.request_shutdown(),
            Err(e) => tracing::warn!("Cannot listen for Ctrl-C: {e}"),
        }
    });

    server.run().await?;

    Ok(())
}
