//! Fuzz target for the transmission decoders
//!
//! Feeds arbitrary bytes to both the request and the response decoder.
//!
//! # Invariants
//!
//! - Neither decoder ever panics
//! - A decoded `POST` batch is never empty and has no empty body
//! - A decoded response re-encodes to something that decodes to itself

#![no_main]

use bytes::Bytes;
use corkboard_proto::{Request, Response, TERMINATOR, parse_message};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let message = Bytes::copy_from_slice(data);

    if let Ok(Request::Post(posts)) = parse_message(message.clone()) {
        assert!(!posts.is_empty());
        assert!(posts.iter().all(|post| !post.body.is_empty()));
    }

    if let Ok(response) = Response::decode(message) {
        let wire = response.to_bytes();
        let body = wire.slice(..wire.len() - TERMINATOR.len());
        assert_eq!(Response::decode(body).ok(), Some(response));
    }
});
