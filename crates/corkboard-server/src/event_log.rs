//! Bounded, timestamped server event log.
//!
//! The log feeds the monitor. Each record is also emitted through `tracing`
//! so that a headless server still leaves a trail:
//!
//! | Kind                     | `tracing` level |
//! |--------------------------|-----------------|
//! | `ERROR`                  | error           |
//! | `WARNING`, `DISCONNECT`  | warn            |
//! | everything else          | info            |
//!
//! # Invariants
//!
//! - At most `capacity` records are retained; the oldest is evicted first.
//! - Records are kept in insertion order.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Records retained by [`EventLog::new`].
pub const EVENT_LOG_CAPACITY: usize = 100;

/// Category of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A client connected
    Connect,
    /// A client connection closed, for any reason
    Disconnect,
    /// A `POST` batch was stored
    Post,
    /// A `POST` batch was refused by the store
    PostError,
    /// A board snapshot was served
    GetBoard,
    /// A client asked to quit
    Quit,
    /// Protocol or socket error on a connection
    Error,
    /// Degraded but recoverable condition
    Warning,
    /// Server lifecycle
    Server,
    /// Injected by an operator
    Test,
}

impl EventKind {
    /// Label shown in the monitor.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
            Self::Post => "POST",
            Self::PostError => "POST_ERROR",
            Self::GetBoard => "GET_BOARD",
            Self::Quit => "QUIT",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Server => "SERVER",
            Self::Test => "TEST",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Local wall-clock time, `HH:MM:SS`
    pub timestamp: String,
    /// Event category
    pub kind: EventKind,
    /// Human-readable description
    pub message: String,
    /// Wire form of the transmission involved, when there is one
    pub raw: Option<String>,
}

/// Fixed-capacity FIFO of [`EventRecord`]s.
#[derive(Debug)]
pub struct EventLog {
    records: Mutex<VecDeque<EventRecord>>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Log retaining [`EVENT_LOG_CAPACITY`] records.
    pub fn new() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }

    /// Log retaining at most `capacity` records (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { records: Mutex::new(VecDeque::with_capacity(capacity)), capacity }
    }

    /// Record an event.
    pub fn log(&self, kind: EventKind, message: impl Into<String>) {
        self.record(kind, message, None);
    }

    /// Record an event together with the transmission that caused it.
    pub fn log_raw(&self, kind: EventKind, message: impl Into<String>, raw: impl Into<String>) {
        self.record(kind, message, Some(raw.into()));
    }

    /// Record an event whose wire form may be unknown.
    pub fn record(&self, kind: EventKind, message: impl Into<String>, raw: Option<String>) {
        let message = message.into();
        match kind {
            EventKind::Error => tracing::error!(kind = %kind, "{message}"),
            EventKind::Warning | EventKind::Disconnect => tracing::warn!(kind = %kind, "{message}"),
            _ => tracing::info!(kind = %kind, "{message}"),
        }
        if let Some(raw) = &raw {
            tracing::debug!(kind = %kind, raw = %raw, "wire form");
        }

        let record = EventRecord {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            kind,
            message,
            raw,
        };

        let mut records = self.lock();
        records.push_back(record);
        while records.len() > self.capacity {
            records.pop_front();
        }
    }

    /// Copy of the retained records, most recent first.
    pub fn newest_first(&self) -> Vec<EventRecord> {
        self.lock().iter().rev().cloned().collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of retained records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<EventRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
