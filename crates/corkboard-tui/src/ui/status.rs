//! Status bar
//!
//! Server lifecycle phase and counters.

use corkboard_server::Phase;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::App;

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let status_line = match app.observation() {
        None => Line::from(vec![
            Span::raw(" "),
            Span::styled("Starting...", Style::default().fg(Color::Yellow)),
        ]),
        Some(view) => {
            let phase = match view.phase {
                Phase::Running => Span::styled(
                    "RUNNING",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Phase::Draining => Span::styled("DRAINING", Style::default().fg(Color::Yellow)),
                Phase::Closed => Span::styled("CLOSED", Style::default().fg(Color::Red)),
            };

            let counters = format!(
                " | Clients: {} | Posts: {} | Received: {} | Next id: {}",
                view.active_connections(),
                view.posts.len(),
                view.total_received,
                view.next_client_id,
            );

            Line::from(vec![Span::raw(" "), phase, Span::raw(counters)])
        },
    };

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
