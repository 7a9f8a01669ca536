//! Server configuration.

use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

use corkboard_proto::{DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PORT};

/// Board file used when persistence is switched on without an explicit path.
pub const DEFAULT_BOARD_FILE: &str = "MessageBoard.txt";

/// Runtime configuration for [`Server`](crate::Server).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_address: SocketAddr,
    /// Pending connection queue length passed to `listen`
    pub backlog: u32,
    /// Bytes requested from the socket per read
    pub read_chunk_size: usize,
    /// Longest accepted transmission, terminator excluded
    pub max_message_size: usize,
    /// How many times the shutdown notice is sent to every connection
    pub shutdown_broadcast_attempts: u32,
    /// Pause between shutdown notices; also bounds each notice write
    pub broadcast_interval: Duration,
    /// Time clients get to drain the notices before the listener closes
    pub drain_grace: Duration,
    /// How long sessions may take to wind down once the listener is closed
    pub session_close_timeout: Duration,
    /// Pause after a failed `accept` before trying again
    pub accept_backoff: Duration,
    /// Board file loaded at startup and written at shutdown
    pub board_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            backlog: 16,
            read_chunk_size: 4096,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            shutdown_broadcast_attempts: 3,
            broadcast_interval: Duration::from_millis(50),
            drain_grace: Duration::from_millis(200),
            session_close_timeout: Duration::from_secs(1),
            accept_backoff: Duration::from_millis(50),
            board_file: None,
        }
    }
}

impl ServerConfig {
    /// Default configuration listening on `addr`.
    pub fn with_bind_address(bind_address: SocketAddr) -> Self {
        Self { bind_address, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_service_contract() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.port(), 26500);
        assert!(config.bind_address.ip().is_unspecified());
        assert_eq!(config.read_chunk_size, 4096);
        assert_eq!(config.shutdown_broadcast_attempts, 3);
        assert_eq!(config.broadcast_interval, Duration::from_millis(50));
        assert_eq!(config.drain_grace, Duration::from_millis(200));
        assert!(config.board_file.is_none());
    }
}
