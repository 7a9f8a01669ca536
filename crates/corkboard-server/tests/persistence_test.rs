//! Board file round trip through a full server lifecycle.

use std::{sync::Arc, time::Duration};

use corkboard_proto::{Post, Request, Response, TERMINATOR};
use corkboard_server::{
    EventKind, Server, ServerConfig, ServerState, StoredPost,
    persistence::{self, SaveReport},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

fn config(board_file: std::path::PathBuf) -> ServerConfig {
    ServerConfig {
        board_file: Some(board_file),
        broadcast_interval: Duration::from_millis(5),
        drain_grace: Duration::from_millis(5),
        ..ServerConfig::with_bind_address("127.0.0.1:0".parse().unwrap())
    }
}

async fn roundtrip(stream: &mut TcpStream, request: &Request) -> Response {
    stream.write_all(&request.to_bytes()).await.unwrap();
    let mut got = Vec::new();
    let mut buf = [0u8; 1024];
    while !got.ends_with(TERMINATOR) {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0);
        got.extend_from_slice(&buf[..n]);
    }
    Response::decode(got.into()).unwrap()
}

#[tokio::test]
async fn board_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MessageBoard.txt");

    let posts = vec![
        Post::new("Alice", "Hi", "hello"),
        Post::new("", "", "pipes | are | fine"),
    ];

    {
        let state = Arc::new(ServerState::new());
        let server = Server::bind(config(path.clone()), Arc::clone(&state)).await.unwrap();
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(server.run());

        let mut stream = TcpStream::connect(addr).await.unwrap();
        assert_eq!(roundtrip(&mut stream, &Request::Post(posts.clone())).await, Response::PostOk);

        state.request_shutdown();
        handle.await.unwrap().unwrap();
    }

    let saved = std::fs::read_to_string(&path).unwrap();
    assert_eq!(saved, "Alice|Hi|hello|1\n||pipes | are | fine|1\n");

    let state = Arc::new(ServerState::new());
    let server = Server::bind(config(path.clone()), Arc::clone(&state)).await.unwrap();
    let addr = server.local_addr().unwrap();
    let handle = tokio::spawn(server.run());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    assert_eq!(roundtrip(&mut stream, &Request::get_board()).await, Response::Board(posts));
    assert_eq!(state.board().total_received(), 0);

    state.request_shutdown();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_lines_are_skipped_with_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.txt");
    std::fs::write(&path, "a|t|ok|1\ngarbage\nb|t|also ok|2\r\n").unwrap();

    let state = Arc::new(ServerState::new());
    let server = Server::bind(config(path), Arc::clone(&state)).await.unwrap();

    assert_eq!(state.board().size(), 2);
    let warnings: Vec<_> = state
        .events()
        .newest_first()
        .into_iter()
        .filter(|e| e.kind == EventKind::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("line 2"));

    drop(server);
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let report = persistence::load(&dir.path().join("absent.txt")).unwrap();
    assert!(report.posts.is_empty());
    assert!(report.skipped_lines.is_empty());
}

#[test]
fn save_leaves_out_posts_the_format_cannot_hold() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MessageBoard.txt");
    let stored = |author: &'static str, title: &'static str, body: &'static str| StoredPost {
        post: Post::new(author, title, body),
        client_id: 1,
    };

    let board = [
        stored("ok", "t", "kept | with pipes"),
        stored("a|b", "t", "body"),
        stored("x", "y", "line1\nline2"),
    ];
    let report = persistence::save(&path, &board).unwrap();
    assert_eq!(report, SaveReport { saved: 1, skipped: vec![2, 3] });

    let loaded = persistence::load(&path).unwrap();
    assert!(loaded.skipped_lines.is_empty());
    assert_eq!(loaded.posts, vec![board[0].clone()]);
}

#[tokio::test]
async fn unsavable_posts_are_reported_at_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MessageBoard.txt");

    let state = Arc::new(ServerState::new());
    let server = Server::bind(config(path.clone()), Arc::clone(&state)).await.unwrap();
    let addr = server.local_addr().unwrap();
    let handle = tokio::spawn(server.run());

    let posts = vec![
        Post::new("Alice", "Hi", "hello"),
        Post::new("a|b", "t", "body"),
        Post::new("x", "y", "line1\nline2"),
    ];
    let mut stream = TcpStream::connect(addr).await.unwrap();
    assert_eq!(roundtrip(&mut stream, &Request::Post(posts)).await, Response::PostOk);

    state.request_shutdown();
    handle.await.unwrap().unwrap();

    let warnings: Vec<_> = state
        .events()
        .newest_first()
        .into_iter()
        .rev()
        .filter(|e| e.kind == EventKind::Warning)
        .map(|e| e.message)
        .collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].starts_with("Post 2 not saved"));
    assert!(warnings[1].starts_with("Post 3 not saved"));

    let reloaded = persistence::load(&path).unwrap();
    assert!(reloaded.skipped_lines.is_empty());
    let authors: Vec<_> = reloaded.posts.iter().map(|s| s.post.author.clone()).collect();
    assert_eq!(authors, ["Alice"]);
}
