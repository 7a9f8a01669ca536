//! Rendering tests against ratatui's in-memory backend.

use corkboard_proto::Post;
use corkboard_server::{EventKind, ServerState, registry::outbound};
use corkboard_tui::{App, AppEvent, KeyInput, ui};
use ratatui::{Terminal, backend::TestBackend};
use tokio::io::sink;

fn screen(app: &App, width: u16, height: u16) -> Vec<String> {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|frame| ui::render(frame, app)).unwrap();

    let buffer = terminal.backend().buffer();
    (0..height)
        .map(|y| {
            let row: String = (0..width).map(|x| buffer[(x, y)].symbol()).collect();
            row.trim_end().to_string()
        })
        .collect()
}

fn contains(rows: &[String], needle: &str) -> bool {
    rows.iter().any(|row| row.contains(needle))
}

fn populated_state() -> ServerState {
    let state = ServerState::new();
    state.registry().register("127.0.0.1:5000", outbound(sink()));
    state
        .board()
        .append_batch(vec![Post::new("Alice", "Hi", "hello"), Post::new("", "", "whisper")], 1)
        .unwrap();
    state.log_test_event("Test event #1 from monitor");
    state
}

fn app_for(state: &ServerState) -> App {
    let mut app = App::new();
    app.handle(AppEvent::Snapshot(state.observe()));
    app
}

#[test]
fn status_bar_counters() {
    let state = populated_state();
    let rows = screen(&app_for(&state), 100, 24);
    insta::assert_snapshot!(rows[0].trim(), @"RUNNING | Clients: 1 | Posts: 2 | Received: 2 | Next id: 2");
}

#[test]
fn status_bar_before_first_snapshot() {
    let rows = screen(&App::new(), 80, 24);
    assert_eq!(rows[0], " Starting...");
}

#[test]
fn board_pane_lists_posts() {
    let state = populated_state();
    let rows = screen(&app_for(&state), 120, 24);

    assert!(contains(&rows, " Board (2) "));
    assert!(contains(&rows, "Alice [Hi] hello"));
    assert!(contains(&rows, "(anonymous) [] whisper"));
}

#[test]
fn board_pane_follows_tail() {
    let state = ServerState::new();
    let posts = (0..30).map(|i| Post::new("a", "t", format!("post-{i:02}"))).collect();
    state.board().append_batch(posts, 1).unwrap();

    let rows = screen(&app_for(&state), 120, 24);
    assert!(contains(&rows, "post-29"));
    assert!(!contains(&rows, "post-00"));
}

#[test]
fn scrolling_back_reveals_older_posts() {
    let state = ServerState::new();
    let posts = (0..30).map(|i| Post::new("a", "t", format!("post-{i:02}"))).collect();
    state.board().append_batch(posts, 1).unwrap();

    let mut app = app_for(&state);
    app.handle(AppEvent::Key(KeyInput::PageUp));
    app.handle(AppEvent::Key(KeyInput::PageUp));

    let rows = screen(&app, 120, 24);
    assert!(contains(&rows, "post-00"));
    assert!(!contains(&rows, "post-29"));
}

#[test]
fn filter_narrows_board_and_shows_prompt() {
    let state = populated_state();
    let mut app = app_for(&state);
    app.handle(AppEvent::Key(KeyInput::Char('/')));
    for c in "whis".chars() {
        app.handle(AppEvent::Key(KeyInput::Char(c)));
    }

    let rows = screen(&app, 120, 24);
    assert!(contains(&rows, " Board (1/2) filter: whis "));
    assert!(!contains(&rows, "Alice [Hi] hello"));
    assert_eq!(rows[23], " Filter: whis_");
}

#[test]
fn event_pane_shows_newest_first() {
    let state = populated_state();
    state.events().log_raw(EventKind::Error, "bad input", "FROB}}&{{");
    let rows = screen(&app_for(&state), 160, 24);

    let error_row = rows.iter().position(|row| row.contains("ERROR bad input"));
    let test_row = rows.iter().position(|row| row.contains("TEST Test event #1 from monitor"));
    assert!(error_row.is_some() && test_row.is_some());
    assert!(error_row < test_row);
    assert!(contains(&rows, "FROB}}&{{"));
}

#[test]
fn connections_pane() {
    let state = populated_state();
    let rows = screen(&app_for(&state), 120, 24);
    assert!(contains(&rows, " Connections (1) "));
    assert!(contains(&rows, "#1 127.0.0.1:5000 since "));

    let rows = screen(&app_for(&ServerState::new()), 120, 24);
    assert!(contains(&rows, "No clients connected"));
}

#[test]
fn footer_shows_help_then_status_message() {
    let state = populated_state();
    let mut app = app_for(&state);
    let rows = screen(&app, 100, 24);
    assert!(rows[23].contains("q quit"));

    app.handle(AppEvent::Key(KeyInput::Char('q')));
    let rows = screen(&app, 100, 24);
    assert!(rows[23].contains("Shutting down, notifying clients..."));
}

#[test]
fn tiny_terminal_does_not_panic() {
    let state = populated_state();
    let app = app_for(&state);
    screen(&app, 10, 3);
    screen(&app, 1, 1);
}
