//! Board pane
//!
//! Posts in board order, newest at the bottom. The pane follows the tail
//! unless the operator scrolls back.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::{App, app::Focus};

const BORDER_SIZE: u16 = 2;
const ANONYMOUS: &str = "(anonymous)";

/// Render the board pane.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let posts = app.visible_posts();
    let total = app.observation().map_or(0, |view| view.posts.len());

    let title = if app.filter().is_empty() {
        format!(" Board ({total}) ")
    } else {
        format!(" Board ({}/{total}) filter: {} ", posts.len(), app.filter())
    };

    let items: Vec<ListItem> = posts
        .iter()
        .map(|stored| {
            let post = &stored.post;
            let author = if post.author.is_empty() {
                ANONYMOUS.to_string()
            } else {
                String::from_utf8_lossy(&post.author).into_owned()
            };

            ListItem::new(Line::from(vec![
                Span::styled(author, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::styled(
                    format!("[{}]", String::from_utf8_lossy(&post.title)),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(" "),
                Span::raw(String::from_utf8_lossy(&post.body).into_owned()),
            ]))
        })
        .collect();

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let end = items.len().saturating_sub(app.scroll().board);
    let skip = end.saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().take(end).skip(skip).collect();

    let list = List::new(visible_items).block(super::pane(app, Focus::Board, title));

    frame.render_widget(list, area);
}
