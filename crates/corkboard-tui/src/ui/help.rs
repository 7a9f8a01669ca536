//! Footer
//!
//! Key help, the filter prompt while editing, or the latest status message.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{App, app::InputMode};

const HELP: &str = " q quit | t test event | / filter | Tab focus | arrows scroll";

/// Render the footer.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let line = match (app.mode(), app.status_message()) {
        (InputMode::EditingFilter, _) => Line::from(vec![
            Span::styled(" Filter: ", Style::default().fg(Color::Yellow)),
            Span::raw(app.filter().to_string()),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ]),
        (InputMode::Normal, Some(message)) => Line::from(vec![
            Span::raw(" "),
            Span::styled(message.to_string(), Style::default().fg(Color::Cyan)),
            Span::styled(" | q quit", Style::default().fg(Color::DarkGray)),
        ]),
        (InputMode::Normal, None) => Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
    };

    frame.render_widget(Paragraph::new(line), area);
}
