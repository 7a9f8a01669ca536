//! Per-connection session engine.
//!
//! A session owns one connection from accept to close and runs a small state
//! machine:
//!
//! ```text
//! Reading ──message──▶ Dispatching ──reply sent──▶ Reading
//!    │                     │  │
//!    │ closed/error        │  └─QUIT──▶ ClosingGraceful ──┐
//!    │ listener closed     │ write error                  ├──▶ Terminated
//!    └─────────────────────┴──────────▶ ClosingAbrupt ────┘
//! ```
//!
//! Every transmission gets exactly one response, written in receive order.
//! Malformed transmissions are answered with `INVALID_COMMAND` and the
//! session keeps reading. Only `QUIT`, the peer going away, a socket error,
//! or server shutdown end a session.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use corkboard_proto::{ParseError, Request, Response, TERMINATOR, parse_message};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::{
    config::ServerConfig,
    event_log::EventKind,
    registry::{self, Outbound},
    state::ServerState,
    transport::{FrameReader, ReadOutcome, send_all},
};

#[derive(Debug)]
enum SessionState {
    Reading,
    Dispatching(Result<Bytes, ParseError>),
    ClosingGraceful,
    ClosingAbrupt(&'static str),
    Terminated,
}

/// One client connection.
#[derive(Debug)]
pub struct Session {
    state: Arc<ServerState>,
    peer: String,
    max_message_size: usize,
    read_chunk_size: usize,
}

impl Session {
    /// Session for a connection from `peer`.
    pub fn new(state: Arc<ServerState>, config: &ServerConfig, peer: impl Into<String>) -> Self {
        Self {
            state,
            peer: peer.into(),
            max_message_size: config.max_message_size,
            read_chunk_size: config.read_chunk_size,
        }
    }

    /// Serve `stream` until the session terminates.
    ///
    /// Registers the connection on entry and unregisters it on exit. Returns
    /// the client id the connection was given.
    pub async fn run<S>(self, stream: S) -> u64
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let outbound = registry::outbound(writer);
        let client_id = self.state.registry().register(self.peer.clone(), Arc::clone(&outbound));
        self.state
            .events()
            .log(EventKind::Connect, format!("Client #{client_id} connected from {}", self.peer));

        let mut reader = FrameReader::new(reader, self.max_message_size, self.read_chunk_size);
        let mut state = SessionState::Reading;

        loop {
            state = match state {
                SessionState::Reading => self.read(client_id, &mut reader).await,
                SessionState::Dispatching(message) => {
                    self.dispatch(client_id, message, &outbound).await
                },
                SessionState::ClosingGraceful => {
                    self.close(client_id, &outbound, "quit").await;
                    SessionState::Terminated
                },
                SessionState::ClosingAbrupt(reason) => {
                    self.close(client_id, &outbound, reason).await;
                    SessionState::Terminated
                },
                SessionState::Terminated => break,
            };
        }

        client_id
    }

    async fn read<R>(&self, client_id: u64, reader: &mut FrameReader<R>) -> SessionState
    where
        R: AsyncRead + Unpin,
    {
        tokio::select! {
            biased;

            () = self.state.shutdown().closed() => SessionState::ClosingAbrupt("server shutdown"),
            outcome = reader.read_next() => match outcome {
                Ok(ReadOutcome::Message(message)) => SessionState::Dispatching(message),
                Ok(ReadOutcome::Closed) => SessionState::ClosingAbrupt("connection closed by peer"),
                Err(e) => {
                    self.state
                        .events()
                        .log(EventKind::Error, format!("Client #{client_id} read failed: {e}"));
                    SessionState::ClosingAbrupt("read error")
                },
            },
        }
    }

    async fn dispatch(
        &self,
        client_id: u64,
        message: Result<Bytes, ParseError>,
        outbound: &Outbound,
    ) -> SessionState {
        let events = self.state.events();
        let raw = message.as_ref().ok().map(|m| wire_form(m));

        let (response, next) = match message.and_then(parse_message) {
            Err(e) => {
                events.record(
                    EventKind::Error,
                    format!("Client #{client_id} sent an invalid transmission [{}]: {e}", e.kind()),
                    raw,
                );
                (Response::InvalidCommand(e.to_string()), SessionState::Reading)
            },
            Ok(Request::Quit) => {
                events.record(
                    EventKind::Quit,
                    format!("Client #{client_id} requested disconnect"),
                    raw,
                );
                (Response::Goodbye, SessionState::ClosingGraceful)
            },
            Ok(Request::GetBoard { author_filter, title_filter }) => {
                let posts = self
                    .state
                    .board()
                    .snapshot_filtered(author_filter.as_deref(), title_filter.as_deref());
                events.record(
                    EventKind::GetBoard,
                    format!("Client #{client_id} requested board ({} posts)", posts.len()),
                    raw,
                );
                (Response::Board(posts), SessionState::Reading)
            },
            Ok(Request::Post(posts)) => match self.state.board().append_batch(posts, client_id) {
                Ok(added) => {
                    events.record(
                        EventKind::Post,
                        format!("Client #{client_id} posted {added} message(s)"),
                        raw,
                    );
                    (Response::PostOk, SessionState::Reading)
                },
                Err(e) => {
                    events.record(
                        EventKind::PostError,
                        format!("Client #{client_id} post rejected: {e}"),
                        raw,
                    );
                    (Response::PostError(e.to_string()), SessionState::Reading)
                },
            },
        };

        let bytes = response.to_bytes();
        let sent = {
            let mut writer = outbound.lock().await;
            send_all(&mut **writer, &bytes).await
        };

        match sent {
            Ok(_) => {
                tracing::debug!(client_id, raw = %String::from_utf8_lossy(&bytes), "sent response");
                next
            },
            Err(e) => {
                events.log(EventKind::Error, format!("Client #{client_id} write failed: {e}"));
                SessionState::ClosingAbrupt("write error")
            },
        }
    }

    async fn close(&self, client_id: u64, outbound: &Outbound, reason: &str) {
        self.state.registry().unregister(client_id);
        self.state
            .events()
            .log(EventKind::Disconnect, format!("Client #{client_id} disconnected ({reason})"));

        if let Err(e) = outbound.lock().await.shutdown().await {
            tracing::debug!(client_id, "shutdown of outbound half failed: {e}");
        }
    }
}

/// Transmission as it appeared on the wire, for the event log.
fn wire_form(message: &[u8]) -> String {
    let mut wire = BytesMut::with_capacity(message.len() + TERMINATOR.len());
    wire.extend_from_slice(message);
    wire.extend_from_slice(TERMINATOR);
    String::from_utf8_lossy(&wire).into_owned()
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, DuplexStream};

    use super::*;
    use crate::event_log::EventRecord;

    async fn start() -> (Arc<ServerState>, DuplexStream, tokio::task::JoinHandle<u64>) {
        let state = Arc::new(ServerState::new());
        let (client, server) = tokio::io::duplex(4096);
        let session = Session::new(Arc::clone(&state), &ServerConfig::default(), "test-peer");
        let handle = tokio::spawn(session.run(server));
        (state, client, handle)
    }

    async fn exchange(client: &mut DuplexStream, request: &[u8]) -> String {
        client.write_all(request).await.unwrap();
        let mut buf = vec![0u8; 4096];
        let mut got = Vec::new();
        while !got.ends_with(TERMINATOR) {
            let n = client.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before a full response");
            got.extend_from_slice(&buf[..n]);
        }
        String::from_utf8(got).unwrap()
    }

    fn kinds(events: &[EventRecord]) -> Vec<EventKind> {
        events.iter().rev().map(|e| e.kind).collect()
    }

    #[tokio::test]
    async fn quit_replies_and_closes() {
        let (state, mut client, handle) = start().await;

        let reply = exchange(&mut client, b"QUIT}}&{{").await;
        assert_eq!(reply, "QUIT}+{SERVER}+{BYE!!!}+{Server says: BYE!!!}}&{{");

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());

        assert_eq!(handle.await.unwrap(), 1);
        assert_eq!(state.registry().active_count(), 0);
        assert_eq!(kinds(&state.events().newest_first()), [
            EventKind::Connect,
            EventKind::Quit,
            EventKind::Disconnect
        ]);
    }

    #[tokio::test]
    async fn invalid_transmission_keeps_session_open() {
        let (state, mut client, _handle) = start().await;

        let reply = exchange(&mut client, b"FROBNICATE}}&{{").await;
        assert_eq!(reply, "INVALID_COMMAND}+{}+{}+{Invalid command: FROBNICATE}}&{{");

        let reply = exchange(&mut client, b"GET_BOARD}}&{{").await;
        assert_eq!(reply, "GET_BOARD}}&{{");

        let error = state
            .events()
            .newest_first()
            .into_iter()
            .find(|e| e.kind == EventKind::Error)
            .unwrap();
        assert_eq!(error.raw.as_deref(), Some("FROBNICATE}}&{{"));
        assert!(error.message.contains("UNKNOWN_COMMAND"));
    }

    #[tokio::test]
    async fn peer_hangup_unregisters() {
        let (state, client, handle) = start().await;
        drop(client);

        handle.await.unwrap();
        assert_eq!(state.registry().active_count(), 0);
        let last = &state.events().newest_first()[0];
        assert_eq!(last.kind, EventKind::Disconnect);
        assert!(last.message.contains("closed by peer"));
    }

    #[tokio::test]
    async fn listener_close_ends_idle_session() {
        let (state, _client, handle) = start().await;
        tokio::task::yield_now().await;

        state.shutdown().close();
        handle.await.unwrap();
        assert_eq!(state.registry().active_count(), 0);
    }

    #[test]
    fn wire_form_appends_terminator() {
        assert_eq!(wire_form(b"GET_BOARD}+{Alice"), "GET_BOARD}+{Alice}}&{{");
    }
}
