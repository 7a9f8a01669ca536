//! Corkboard wire protocol.
//!
//! A text framing over a byte stream. Three fixed multi-byte separators carve a
//! transmission into records and fields:
//!
//! ```text
//! field separator   }+{
//! record separator  }#{
//! terminator        }}&{{
//! ```
//!
//! A transmission is zero or more records joined by the record separator and
//! closed by exactly one terminator. A record is a list of fields joined by
//! the field separator. The first field of the first record is the command
//! token. Fields are opaque bytes and are never escaped; callers must keep the
//! separators out of them.
//!
//! # Components
//!
//! - [`parse_message`]: pure decoder for client transmissions ([`Request`])
//! - [`Response`]: server responses with `encode`/`decode`
//! - [`FrameBuffer`]: sans-IO reassembler that extracts one transmission at a
//!   time from arbitrarily chunked input
//!
//! Nothing in this crate performs I/O. The server wraps [`FrameBuffer`] with a
//! socket reader.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
mod fields;
pub mod frame_buffer;
pub mod request;
pub mod response;

pub use errors::{ParseError, Result};
pub use fields::Post;
pub use frame_buffer::{DEFAULT_MAX_MESSAGE_SIZE, FrameBuffer};
pub use request::{Command, Request, parse_message};
pub use response::Response;

/// Separates fields within a record.
pub const FIELD_SEPARATOR: &[u8] = b"}+{";

/// Separates records within a transmission.
pub const RECORD_SEPARATOR: &[u8] = b"}#{";

/// Closes every transmission, in both directions.
pub const TERMINATOR: &[u8] = b"}}&{{";

/// Well-known TCP port of the message board service.
pub const DEFAULT_PORT: u16 = 26500;
