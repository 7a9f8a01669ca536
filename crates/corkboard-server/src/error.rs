//! Server error types.

use std::{io, net::SocketAddr, path::PathBuf};

use thiserror::Error;

/// Errors that stop the server as a whole.
///
/// Per-connection failures never surface here; sessions record them in the
/// event log and close their own connection.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be created or configured.
    #[error("failed to create listening socket: {0}")]
    Socket(#[source] io::Error),

    /// The listen address is unavailable (in use, not local, no permission).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested listen address
        addr: SocketAddr,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// `listen` failed on a bound socket.
    #[error("failed to listen on {addr}: {source}")]
    Listen {
        /// Bound address
        addr: SocketAddr,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Other socket I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Board file could not be loaded or saved.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Board store rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// `append_batch` was handed zero posts.
    #[error("No posts to add")]
    EmptyBatch,

    /// A post in the batch has an empty body.
    #[error("POST message cannot be empty.")]
    EmptyBody {
        /// Zero-based position of the post in its batch
        index: usize,
    },
}

/// Board file errors.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Reading the board file failed.
    #[error("failed to read board file {path}: {source}")]
    Read {
        /// Board file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Writing the board file failed.
    #[error("failed to write board file {path}: {source}")]
    Write {
        /// Board file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}
