//! Decoder errors.
//!
//! Every variant renders as the diagnostic the server sends back to the client
//! in an `INVALID_COMMAND` response, so the `Display` strings are part of the
//! wire contract.

use thiserror::Error;

/// Convenience alias for codec results.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Failed decode of a transmission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The transmission carried no bytes before its terminator.
    #[error("Empty message received.")]
    Empty,

    /// The first field is not a recognized command token.
    #[error("Invalid command: {0}")]
    UnknownCommand(String),

    /// `POST` carried no payload fields at all.
    #[error("POST contains no (Author, Title, Message) sets.")]
    NoPosts,

    /// `POST` payload field count is not a multiple of three.
    #[error("POST requires triples of Author, Title, Message.")]
    BadPostShape {
        /// Number of payload fields received after the command token
        fields: usize,
    },

    /// A triple in a `POST` batch has an empty body.
    #[error("POST message cannot be empty.")]
    EmptyBody {
        /// Zero-based position of the offending triple in the batch
        index: usize,
    },

    /// The transmission exceeded the configured size limit and was dropped.
    #[error("Message exceeds maximum size of {limit} bytes.")]
    Oversized {
        /// Configured limit in bytes
        limit: usize,
        /// Bytes received for the dropped transmission
        received: usize,
    },

    /// A server response did not match any response shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ParseError {
    /// Stable tag used in the event log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::UnknownCommand(_) => "UNKNOWN_COMMAND",
            Self::NoPosts | Self::BadPostShape { .. } => "BAD_POST_SHAPE",
            Self::EmptyBody { .. } => "EMPTY_BODY",
            Self::Oversized { .. } => "OVERSIZED",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
        }
    }
}
