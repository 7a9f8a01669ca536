//! Fuzz target for board file lines
//!
//! # Invariants
//!
//! - `parse_line` never panics
//! - A parsed line re-encodes to a line that parses to the same post

#![no_main]

use bytes::{Bytes, BytesMut};
use corkboard_server::persistence::{encode_line, parse_line};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let line = Bytes::copy_from_slice(data);
    let Some(stored) = parse_line(&line) else {
        return;
    };

    assert!(!stored.post.body.is_empty());

    let mut buf = BytesMut::new();
    encode_line(&stored, &mut buf);
    let encoded = buf.freeze();
    let reparsed = parse_line(&encoded.slice(..encoded.len() - 1));
    assert_eq!(reparsed, Some(stored));
});
