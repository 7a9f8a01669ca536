//! Corkboard message board server.
//!
//! A TCP server speaking the [`corkboard_proto`] text protocol. Every accepted
//! connection runs as its own task; all tasks share one [`ServerState`]: the
//! board, the event log, the connection registry and the lifecycle signal.
//!
//! # Architecture
//!
//! The codec and frame reassembly live in [`corkboard_proto`] and never touch
//! a socket. This crate supplies the I/O around them: [`FrameReader`] feeds a
//! reassembler from any `AsyncRead`, [`Session`] drives one connection, and
//! [`Server`] accepts connections and runs the shutdown sequence.
//!
//! # Components
//!
//! - [`Server`]: listener, accept loop, shutdown broadcast
//! - [`Session`]: per-connection state machine
//! - [`BoardStore`]: append-only board with atomic batches
//! - [`EventLog`]: bounded log of server events, mirrored to `tracing`
//! - [`ClientRegistry`]: live connections and their outbound halves
//! - [`ServerState`]: the shared bundle, plus the observer API used by the
//!   monitor

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod board;
mod config;
mod error;
pub mod event_log;
pub mod persistence;
pub mod registry;
mod session;
mod shutdown;
mod state;
pub mod transport;

use std::{net::SocketAddr, path::Path, sync::Arc};

pub use board::{BoardStore, StoredPost};
pub use config::{DEFAULT_BOARD_FILE, ServerConfig};
use corkboard_proto::Response;
pub use error::{BoardError, PersistError, ServerError};
pub use event_log::{EVENT_LOG_CAPACITY, EventKind, EventLog, EventRecord};
pub use registry::{ClientRegistry, ConnectionInfo};
pub use session::Session;
pub use shutdown::{Phase, Shutdown};
pub use state::{Observation, ServerState};
use tokio::{
    net::{TcpListener, TcpSocket},
    task::JoinSet,
};
pub use transport::{FrameReader, ReadOutcome, send_all};

/// Message board server bound to a listening socket.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl Server {
    /// Open the listening socket and restore the board file, if configured.
    ///
    /// Failures are also recorded as `ERROR` events in `state`.
    pub async fn bind(config: ServerConfig, state: Arc<ServerState>) -> Result<Self, ServerError> {
        let listener = match open_listener(&config, &state) {
            Ok(listener) => listener,
            Err(e) => {
                state.events().log(EventKind::Error, format!("Failed to start server: {e}"));
                return Err(e);
            },
        };

        if let Some(path) = &config.board_file {
            restore_board(&state, path)?;
        }

        Ok(Self { listener, state, config })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared state, for observers.
    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Accept connections until shutdown is requested, then shut down.
    ///
    /// Shutdown sends the shutdown notice to every live connection
    /// `shutdown_broadcast_attempts` times, waits `drain_grace`, closes the
    /// listener, and lets sessions close their connections. The board file,
    /// if configured, is written last.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self { listener, state, config } = self;
        let addr = listener.local_addr()?;
        state.events().log(EventKind::Server, format!("Server listening on {addr}"));

        let mut sessions = JoinSet::new();
        loop {
            tokio::select! {
                biased;

                () = state.shutdown().requested() => break,
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        state.events().log(EventKind::Error, format!("Session task failed: {e}"));
                    }
                },
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let session = Session::new(Arc::clone(&state), &config, peer.to_string());
                        sessions.spawn(session.run(stream));
                    },
                    Err(e) => {
                        state
                            .events()
                            .log(EventKind::Warning, format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(config.accept_backoff).await;
                    },
                },
            }
        }

        shut_down(listener, &state, &config, sessions).await
    }
}

fn open_listener(config: &ServerConfig, state: &ServerState) -> Result<TcpListener, ServerError> {
    let addr = config.bind_address;
    let socket = if addr.is_ipv4() { TcpSocket::new_v4() } else { TcpSocket::new_v6() };
    let socket = socket.map_err(ServerError::Socket)?;

    if let Err(e) = socket.set_reuseaddr(true) {
        state.events().log(EventKind::Warning, format!("Failed to set SO_REUSEADDR: {e}"));
    }

    socket.bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
    socket.listen(config.backlog).map_err(|source| ServerError::Listen { addr, source })
}

async fn shut_down(
    listener: TcpListener,
    state: &ServerState,
    config: &ServerConfig,
    mut sessions: JoinSet<u64>,
) -> Result<(), ServerError> {
    state.events().log(EventKind::Server, "Shutting down, notifying all clients");

    let notice = Response::Shutdown.to_bytes();
    let targets = state.registry().outbound_handles();
    for attempt in 1..=config.shutdown_broadcast_attempts {
        for (client_id, outbound) in &targets {
            let write = async {
                let mut writer = outbound.lock().await;
                send_all(&mut **writer, &notice).await
            };
            match tokio::time::timeout(config.broadcast_interval, write).await {
                Ok(Ok(_)) => {},
                Ok(Err(e)) => tracing::debug!(client_id, attempt, "shutdown notice failed: {e}"),
                Err(_) => tracing::debug!(client_id, attempt, "shutdown notice timed out"),
            }
        }
        if attempt < config.shutdown_broadcast_attempts {
            tokio::time::sleep(config.broadcast_interval).await;
        }
    }

    tokio::time::sleep(config.drain_grace).await;
    drop(listener);
    state.shutdown().close();
    state.events().log(
        EventKind::Server,
        format!("Listener closed after notifying {} client(s)", targets.len()),
    );
    drop(targets);

    let closed_in_time = tokio::time::timeout(config.session_close_timeout, async {
        while sessions.join_next().await.is_some() {}
    })
    .await
    .is_ok();
    if !closed_in_time {
        state.events().log(
            EventKind::Warning,
            format!("Aborting {} session(s) that did not close in time", sessions.len()),
        );
        sessions.abort_all();
    }

    let saved = match &config.board_file {
        Some(path) => save_board(state, path),
        None => Ok(()),
    };
    state.events().log(EventKind::Server, "Server shutdown complete");
    saved
}

fn restore_board(state: &ServerState, path: &Path) -> Result<(), ServerError> {
    let report = persistence::load(path).inspect_err(|e| {
        state.events().log(EventKind::Error, e.to_string());
    })?;

    for line in &report.skipped_lines {
        state.events().log(
            EventKind::Warning,
            format!("Skipped malformed line {line} of {}", path.display()),
        );
    }

    let count = report.posts.len();
    state.board().restore(report.posts);
    state.events().log(EventKind::Server, format!("Loaded {count} post(s) from {}", path.display()));
    Ok(())
}

fn save_board(state: &ServerState, path: &Path) -> Result<(), ServerError> {
    let posts = state.board().snapshot();
    match persistence::save(path, &posts) {
        Ok(report) => {
            for position in &report.skipped {
                state.events().log(
                    EventKind::Warning,
                    format!(
                        "Post {position} not saved to {}: author or title contains '|' or a field \
                         contains a newline",
                        path.display()
                    ),
                );
            }
            state.events().log(
                EventKind::Server,
                format!("Saved {} post(s) to {}", report.saved, path.display()),
            );
            Ok(())
        },
        Err(e) => {
            state.events().log(EventKind::Error, e.to_string());
            Err(e.into())
        },
    }
}
