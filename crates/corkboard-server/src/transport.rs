//! Byte-stream plumbing for sessions.
//!
//! [`FrameReader`] pairs any `AsyncRead` with a [`FrameBuffer`] and yields one
//! transmission at a time; [`send_all`] writes a full response even when the
//! socket accepts it piecemeal. Neither knows about commands.

use std::io;

use bytes::Bytes;
use corkboard_proto::{FrameBuffer, ParseError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Result of waiting for the next transmission.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete transmission, terminator stripped, or the reason it was
    /// dropped during reassembly
    Message(Result<Bytes, ParseError>),
    /// The peer closed its sending side. Bytes of an unterminated
    /// transmission still buffered are discarded.
    Closed,
}

/// Reassembles transmissions from a byte stream.
///
/// Cancel-safe: dropping a pending [`FrameReader::read_next`] loses no data.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buffer: FrameBuffer,
    chunk: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Reader pulling at most `chunk_size` bytes per read.
    pub fn new(reader: R, max_message_size: usize, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: FrameBuffer::with_max_message_size(max_message_size),
            chunk: vec![0; chunk_size.max(1)],
        }
    }

    /// Wait for the next complete transmission.
    ///
    /// Transmissions already buffered are returned without touching the
    /// stream. Interrupted reads are retried.
    ///
    /// # Errors
    ///
    /// Any read error other than [`io::ErrorKind::Interrupted`].
    pub async fn read_next(&mut self) -> io::Result<ReadOutcome> {
        loop {
            if let Some(message) = self.buffer.next_message() {
                return Ok(ReadOutcome::Message(message));
            }

            match self.reader.read(&mut self.chunk).await {
                Ok(0) => return Ok(ReadOutcome::Closed),
                Ok(n) => self.buffer.push(&self.chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
                Err(e) => return Err(e),
            }
        }
    }

    /// Bytes waiting for a terminator.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Write all of `bytes`, retrying partial and interrupted writes.
///
/// Returns the number of bytes written, which is always `bytes.len()` on
/// success.
///
/// # Errors
///
/// - [`io::ErrorKind::WriteZero`] if the peer stops accepting data
/// - any other write or flush error
pub async fn send_all<W>(writer: &mut W, bytes: &[u8]) -> io::Result<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0;
    while written < bytes.len() {
        match writer.write(&bytes[written..]).await {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
            Err(e) => return Err(e),
        }
    }
    writer.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn reads_across_split_terminator() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server, 1024, 4);

        client.write_all(b"GET_BOARD}}").await.unwrap();
        client.write_all(b"&{{QUIT}}&{{").await.unwrap();
        drop(client);

        assert_eq!(
            reader.read_next().await.unwrap(),
            ReadOutcome::Message(Ok(Bytes::from_static(b"GET_BOARD")))
        );
        assert_eq!(
            reader.read_next().await.unwrap(),
            ReadOutcome::Message(Ok(Bytes::from_static(b"QUIT")))
        );
        assert_eq!(reader.read_next().await.unwrap(), ReadOutcome::Closed);
    }

    #[tokio::test]
    async fn partial_transmission_at_close_is_dropped() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server, 1024, 4096);

        client.write_all(b"POST}+{a}+{t").await.unwrap();
        drop(client);

        assert_eq!(reader.read_next().await.unwrap(), ReadOutcome::Closed);
    }

    #[tokio::test]
    async fn send_all_through_small_pipe() {
        let (mut a, mut b) = tokio::io::duplex(8);
        let payload = vec![b'x'; 1000];

        let expected = payload.clone();
        let reader = tokio::spawn(async move {
            let mut got = Vec::new();
            b.read_to_end(&mut got).await.unwrap();
            got
        });

        assert_eq!(send_all(&mut a, &payload).await.unwrap(), 1000);
        drop(a);
        assert_eq!(reader.await.unwrap(), expected);
    }
}
