//! Corkboard monitor entry point.
//!
//! Logs go to `--log-file` when given; the terminal belongs to the UI.

use std::{fs::File, net::SocketAddr, path::PathBuf, sync::Mutex};

use clap::Parser;
use corkboard_proto::DEFAULT_PORT;
use corkboard_server::{DEFAULT_BOARD_FILE, ServerConfig};
use corkboard_tui::Runtime;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Corkboard terminal monitor
#[derive(Parser, Debug)]
#[command(name = "corkboard-tui")]
#[command(about = "Run a corkboard server and watch it live")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
    bind: SocketAddr,

    /// Load the board from this file at startup and save it at shutdown
    #[arg(long)]
    board_file: Option<PathBuf>,

    /// Persist the board to MessageBoard.txt in the working directory
    #[arg(long, conflicts_with = "board_file")]
    persist: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let file_layer = match &args.log_file {
        Some(path) => {
            let file = File::create(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        },
        None => None,
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(file_layer).with(filter).init();

    let board_file = args.board_file.or_else(|| args.persist.then(|| DEFAULT_BOARD_FILE.into()));
    let config = ServerConfig { board_file, ..ServerConfig::with_bind_address(args.bind) };

    let runtime = Runtime::start(config).await?;
    Ok(runtime.run().await?)
}
