//! Incremental transmission reassembly.
//!
//! A byte stream delivers transmissions in arbitrary chunks: a terminator may
//! straddle two reads, and one read may carry several transmissions. The
//! [`FrameBuffer`] is the only state that survives between reads. Feed it with
//! [`FrameBuffer::push`] and drain it with [`FrameBuffer::next_message`] until
//! it returns `None`.
//!
//! # Invariants
//!
//! - Bytes after a terminator are never discarded; they stay buffered for the
//!   next call.
//! - Buffered bytes never exceed `max_message_size + TERMINATOR.len() - 1`
//!   plus the size of the chunk most recently pushed.

use bytes::{Buf, Bytes, BytesMut};

use crate::{TERMINATOR, errors::ParseError, fields::find_terminator};

/// Default upper bound for a single transmission (1 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Per-connection reassembly buffer.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: BytesMut,
    max_message_size: usize,
    /// Prefix of `buf` already searched without finding a terminator.
    scanned: usize,
    /// Bytes dropped from the transmission currently being received because
    /// it outgrew `max_message_size`. Non-zero means "discarding".
    discarded: usize,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Buffer with the default size limit.
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Buffer that refuses transmissions longer than `max_message_size` bytes
    /// (terminator excluded).
    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self { buf: BytesMut::with_capacity(4096), max_message_size, scanned: 0, discarded: 0 }
    }

    /// Configured size limit.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a chunk read from the stream.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Extract the next complete transmission, terminator stripped.
    ///
    /// Returns `None` when no terminator is buffered yet. An oversized
    /// transmission is reported once, as [`ParseError::Oversized`], when its
    /// terminator finally arrives; its bytes are gone by then.
    pub fn next_message(&mut self) -> Option<Result<Bytes, ParseError>> {
        // A terminator may straddle the boundary of the scanned prefix.
        let from = self.scanned.saturating_sub(TERMINATOR.len() - 1);

        let Some(offset) = find_terminator(&self.buf[from..]) else {
            self.scanned = self.buf.len();
            self.shed_oversized();
            return None;
        };

        let message = self.buf.split_to(from + offset).freeze();
        self.buf.advance(TERMINATOR.len());
        self.scanned = 0;

        let received = self.discarded + message.len();
        self.discarded = 0;

        if received > self.max_message_size {
            return Some(Err(ParseError::Oversized { limit: self.max_message_size, received }));
        }
        Some(Ok(message))
    }

    /// Drop bytes of an unterminated transmission that is already too long,
    /// keeping just enough of the tail to recognize a split terminator.
    fn shed_oversized(&mut self) {
        let keep = TERMINATOR.len() - 1;
        if self.buf.len() <= self.max_message_size + keep {
            return;
        }

        let drop = self.buf.len() - keep;
        self.buf.advance(drop);
        self.discarded += drop;
        self.scanned = self.buf.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut FrameBuffer) -> Vec<Result<Bytes, ParseError>> {
        std::iter::from_fn(|| buffer.next_message()).collect()
    }

    #[test]
    fn single_complete_message() {
        let mut buffer = FrameBuffer::new();
        buffer.push(b"GET_BOARD}}&{{");
        assert_eq!(drain(&mut buffer), vec![Ok(Bytes::from_static(b"GET_BOARD"))]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn terminator_split_across_two_chunks() {
        let mut buffer = FrameBuffer::new();
        buffer.push(b"QUIT}}&");
        assert_eq!(buffer.next_message(), None);
        buffer.push(b"{{");
        assert_eq!(buffer.next_message(), Some(Ok(Bytes::from_static(b"QUIT"))));
    }

    #[test]
    fn terminator_split_across_every_byte() {
        let mut buffer = FrameBuffer::new();
        let wire = b"POST}+{a}+{t}+{b}}&{{";
        let mut out = Vec::new();
        for byte in wire {
            buffer.push(std::slice::from_ref(byte));
            out.extend(drain(&mut buffer));
        }
        assert_eq!(out, vec![Ok(Bytes::from_static(b"POST}+{a}+{t}+{b"))]);
    }

    #[test]
    fn coalesced_messages_are_yielded_in_order() {
        let mut buffer = FrameBuffer::new();
        buffer.push(b"GET_BOARD}}&{{QUIT}}&{{GET_");
        assert_eq!(drain(&mut buffer), vec![
            Ok(Bytes::from_static(b"GET_BOARD")),
            Ok(Bytes::from_static(b"QUIT")),
        ]);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn empty_transmission() {
        let mut buffer = FrameBuffer::new();
        buffer.push(b"}}&{{");
        assert_eq!(buffer.next_message(), Some(Ok(Bytes::new())));
    }

    #[test]
    fn oversized_message_is_reported_and_stream_recovers() {
        let mut buffer = FrameBuffer::with_max_message_size(8);
        buffer.push(b"POST}+{0123456789");
        assert_eq!(buffer.next_message(), None);
        assert!(buffer.len() <= 8 + TERMINATOR.len() - 1);

        buffer.push(b"abcdef}}&{{QUIT}}&{{");
        assert_eq!(
            buffer.next_message(),
            Some(Err(ParseError::Oversized { limit: 8, received: 23 }))
        );
        assert_eq!(buffer.next_message(), Some(Ok(Bytes::from_static(b"QUIT"))));
    }

    #[test]
    fn oversized_message_in_one_chunk() {
        let mut buffer = FrameBuffer::with_max_message_size(4);
        buffer.push(b"GET_BOARD}}&{{");
        assert_eq!(
            buffer.next_message(),
            Some(Err(ParseError::Oversized { limit: 4, received: 9 }))
        );
    }

    #[test]
    fn message_at_limit_is_accepted() {
        let mut buffer = FrameBuffer::with_max_message_size(4);
        buffer.push(b"QUIT}}&{{");
        assert_eq!(buffer.next_message(), Some(Ok(Bytes::from_static(b"QUIT"))));
    }
}
