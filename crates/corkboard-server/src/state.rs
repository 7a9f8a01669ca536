//! State shared by the supervisor, sessions and the monitor.

use crate::{
    board::{BoardStore, StoredPost},
    event_log::{EventKind, EventLog, EventRecord},
    registry::{ClientRegistry, ConnectionInfo},
    shutdown::{Phase, Shutdown},
};

/// Everything a running server shares, usually held as `Arc<ServerState>`.
#[derive(Debug, Default)]
pub struct ServerState {
    board: BoardStore,
    events: EventLog,
    registry: ClientRegistry,
    shutdown: Shutdown,
}

/// Point-in-time view for observers.
///
/// Each part is read under its own lock, so the parts may be a few events
/// apart; each part on its own is consistent.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Board contents in board order
    pub posts: Vec<StoredPost>,
    /// Posts accepted from clients since startup
    pub total_received: u64,
    /// Live connections, ordered by client id
    pub connections: Vec<ConnectionInfo>,
    /// Id the next connection will receive
    pub next_client_id: u64,
    /// Event log, most recent first
    pub events: Vec<EventRecord>,
    /// Lifecycle phase
    pub phase: Phase,
}

impl Observation {
    /// Number of live connections.
    pub fn active_connections(&self) -> usize {
        self.connections.len()
    }
}

impl ServerState {
    /// Fresh state: empty board, empty log, no connections, running.
    pub fn new() -> Self {
        Self::default()
    }

    /// State with a custom event log capacity.
    pub fn with_event_capacity(capacity: usize) -> Self {
        Self { events: EventLog::with_capacity(capacity), ..Self::default() }
    }

    /// Shared message board.
    pub fn board(&self) -> &BoardStore {
        &self.board
    }

    /// Server event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Live connections.
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Lifecycle signal.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Whether the server is accepting connections.
    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    /// Ask the server to shut down. Repeated requests are ignored.
    pub fn request_shutdown(&self) {
        if self.shutdown.request() {
            self.events.log(EventKind::Server, "Shutdown requested");
        }
    }

    /// Append an operator-injected `TEST` event.
    pub fn log_test_event(&self, message: impl Into<String>) {
        self.events.log(EventKind::Test, message);
    }

    /// Snapshot every observable part of the server.
    pub fn observe(&self) -> Observation {
        let (posts, total_received) = self.board.snapshot_with_total();
        Observation {
            posts,
            total_received,
            connections: self.registry.connections(),
            next_client_id: self.registry.next_client_id(),
            events: self.events.newest_first(),
            phase: self.shutdown.phase(),
        }
    }
}
