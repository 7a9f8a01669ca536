//! Registry of live client connections.
//!
//! Sessions register on connect and unregister when they close. The registry
//! owns a handle to every connection's outbound half so the supervisor can
//! broadcast the shutdown notice. Each outbound half sits behind its own async
//! mutex; a session's reply and a broadcast never interleave on the wire.
//!
//! # Invariants
//!
//! - Client ids are unique and strictly increasing; they are never reused.
//! - `active_count()` equals the number of registered connections.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::io::AsyncWrite;

/// Type-erased outbound half of a connection.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared, serialized handle to a connection's outbound half.
pub type Outbound = Arc<tokio::sync::Mutex<BoxedWriter>>;

/// Wrap a writer into an [`Outbound`] handle.
pub fn outbound<W>(writer: W) -> Outbound
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    Arc::new(tokio::sync::Mutex::new(Box::new(writer)))
}

/// Descriptor of a registered connection, as shown by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Server-assigned id, starting at 1
    pub client_id: u64,
    /// Remote address of the peer
    pub peer: String,
    /// Local wall-clock time of registration, `HH:MM:SS`
    pub connected_at: String,
}

struct Entry {
    info: ConnectionInfo,
    outbound: Outbound,
}

struct RegistryInner {
    connections: BTreeMap<u64, Entry>,
    next_client_id: u64,
}

/// Thread-safe set of live connections.
pub struct ClientRegistry {
    inner: Mutex<RegistryInner>,
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ClientRegistry")
            .field("active", &inner.connections.len())
            .field("next_client_id", &inner.next_client_id)
            .finish()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    /// Empty registry; the first client gets id 1.
    pub fn new() -> Self {
        Self { inner: Mutex::new(RegistryInner { connections: BTreeMap::new(), next_client_id: 1 }) }
    }

    /// Register a connection and assign it the next client id.
    pub fn register(&self, peer: impl Into<String>, outbound: Outbound) -> u64 {
        let mut inner = self.lock();
        let client_id = inner.next_client_id;
        inner.next_client_id += 1;

        let info = ConnectionInfo {
            client_id,
            peer: peer.into(),
            connected_at: chrono::Local::now().format("%H:%M:%S").to_string(),
        };
        inner.connections.insert(client_id, Entry { info, outbound });
        client_id
    }

    /// Remove a connection. Returns `false` if it was not registered.
    pub fn unregister(&self, client_id: u64) -> bool {
        self.lock().connections.remove(&client_id).is_some()
    }

    /// Outbound handles of every live connection, by client id.
    ///
    /// The handles stay valid after the registry lock is released, so callers
    /// may write to them without blocking registration.
    pub fn outbound_handles(&self) -> Vec<(u64, Outbound)> {
        self.lock()
            .connections
            .iter()
            .map(|(id, entry)| (*id, Arc::clone(&entry.outbound)))
            .collect()
    }

    /// Descriptors of every live connection, ordered by client id.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.lock().connections.values().map(|entry| entry.info.clone()).collect()
    }

    /// Number of live connections.
    pub fn active_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Id the next connection will receive.
    pub fn next_client_id(&self) -> u64 {
        self.lock().next_client_id
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
