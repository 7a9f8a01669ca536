//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O).

mod board;
mod connections;
mod events;
mod help;
mod status;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders},
};

use crate::{App, app::Focus};

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    const STATUS_HEIGHT: u16 = 1;
    const MAIN_AREA_MIN_HEIGHT: u16 = 5;
    const CONNECTIONS_HEIGHT: u16 = 6;
    const HELP_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(CONNECTIONS_HEIGHT),
            Constraint::Length(HELP_HEIGHT),
        ])
        .split(frame.area());

    let [status_area, main_area, connections_area, help_area] = chunks.as_ref() else {
        return;
    };

    status::render(frame, app, *status_area);
    render_main_area(frame, app, *main_area);
    connections::render(frame, app, *connections_area);
    help::render(frame, app, *help_area);
}

/// Render the main area (board + event log).
fn render_main_area(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let [board_area, events_area] = chunks.as_ref() else {
        return;
    };

    board::render(frame, app, *board_area);
    events::render(frame, app, *events_area);
}

/// Bordered pane, highlighted when it has focus.
fn pane(app: &App, which: Focus, title: String) -> Block<'static> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if app.focus() == which {
        block.border_style(Style::default().fg(Color::Yellow))
    } else {
        block
    }
}
