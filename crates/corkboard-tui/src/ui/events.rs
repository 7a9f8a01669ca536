//! Event log pane
//!
//! Most recent event first. Events that carry a raw transmission show it on
//! a second, dimmed line.

use corkboard_server::{EventKind, EventRecord};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::{App, app::Focus};

/// Render the event log pane.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let events = app.observation().map_or(&[][..], |view| view.events.as_slice());
    let title = format!(" Events ({}) ", events.len());

    let items: Vec<ListItem> =
        events.iter().skip(app.scroll().events).map(event_item).collect();

    let list = List::new(items).block(super::pane(app, Focus::Events, title));

    frame.render_widget(list, area);
}

fn event_item(record: &EventRecord) -> ListItem<'static> {
    let mut lines = vec![Line::from(vec![
        Span::styled(record.timestamp.clone(), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(record.kind.as_str(), kind_style(record.kind)),
        Span::raw(" "),
        Span::raw(record.message.clone()),
    ])];

    if let Some(raw) = &record.raw {
        lines.push(Line::from(Span::styled(
            format!("  {raw}"),
            Style::default().fg(Color::DarkGray),
        )));
    }

    ListItem::new(lines)
}

fn kind_style(kind: EventKind) -> Style {
    let color = match kind {
        EventKind::Connect | EventKind::Post | EventKind::GetBoard => Color::Green,
        EventKind::Disconnect | EventKind::Quit => Color::Blue,
        EventKind::PostError | EventKind::Error => Color::Red,
        EventKind::Warning => Color::Yellow,
        EventKind::Server => Color::Magenta,
        EventKind::Test => Color::Cyan,
    };
    Style::default().fg(color)
}
