//! Fuzz target for stream reassembly
//!
//! Prevent unbounded buffering and lost transmissions (HIGH priority)
//!
//! # Strategy
//!
//! - Stream: arbitrary bytes, optionally salted with terminators
//! - Chunking: arbitrary cut points, including single-byte reads
//! - Limit: small size limits so the discard path is exercised
//!
//! # Invariants
//!
//! - Output is identical however the stream is chunked
//! - Buffered bytes stay within `limit + TERMINATOR.len() - 1` plus one chunk
//! - Every accepted transmission is within the limit and has no terminator

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use corkboard_proto::{FrameBuffer, ParseError, TERMINATOR};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct ChunkedStream {
    segments: Vec<Segment>,
    cuts: Vec<u8>,
    limit: u8,
}

#[derive(Debug, Clone, Arbitrary)]
enum Segment {
    Bytes(Vec<u8>),
    Terminator,
    PartialTerminator(u8),
}

fn drain(buffer: &mut FrameBuffer) -> Vec<Result<Bytes, ParseError>> {
    std::iter::from_fn(|| buffer.next_message()).collect()
}

fuzz_target!(|input: ChunkedStream| {
    let mut stream = Vec::new();
    for segment in &input.segments {
        match segment {
            Segment::Bytes(bytes) => stream.extend_from_slice(bytes),
            Segment::Terminator => stream.extend_from_slice(TERMINATOR),
            Segment::PartialTerminator(n) => {
                let n = usize::from(*n) % TERMINATOR.len();
                stream.extend_from_slice(&TERMINATOR[..n]);
            },
        }
    }

    let limit = usize::from(input.limit).max(1);

    let mut whole = FrameBuffer::with_max_message_size(limit);
    whole.push(&stream);
    let expected = drain(&mut whole);

    let mut chunked = FrameBuffer::with_max_message_size(limit);
    let mut actual = Vec::new();
    let mut rest = &stream[..];
    let mut cuts = input.cuts.iter().map(|c| usize::from(*c).max(1));
    while !rest.is_empty() {
        let n = cuts.next().unwrap_or(rest.len()).min(rest.len());
        let (chunk, tail) = rest.split_at(n);
        chunked.push(chunk);
        rest = tail;
        actual.extend(drain(&mut chunked));
        assert!(chunked.len() <= limit + TERMINATOR.len() - 1 + n);
    }

    assert_eq!(actual, expected);
    for message in actual.into_iter().flatten() {
        assert!(message.len() <= limit);
        assert!(!message.windows(TERMINATOR.len()).any(|w| w == TERMINATOR));
    }
});
