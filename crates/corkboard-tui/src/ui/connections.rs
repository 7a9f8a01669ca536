//! Connection list pane

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::{App, app::Focus};

/// Render the connection list.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let connections = app.observation().map_or(&[][..], |view| view.connections.as_slice());
    let title = format!(" Connections ({}) ", connections.len());

    let items: Vec<ListItem> = if connections.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No clients connected",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        connections
            .iter()
            .skip(app.scroll().connections)
            .map(|info| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("#{}", info.client_id), Style::default().fg(Color::Yellow)),
                    Span::raw(format!(" {} since {}", info.peer, info.connected_at)),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(super::pane(app, Focus::Connections, title));

    frame.render_widget(list, area);
}
