//! Monitor state machine.
//!
//! [`App`] holds everything the monitor displays and reacts to input. It is a
//! pure state machine: it consumes [`AppEvent`]s and returns [`AppAction`]s
//! for the runtime to execute, so it is tested without a terminal or a
//! server.
//!
//! # Responsibilities
//!
//! - Keeps the latest [`Observation`] of the hosted server.
//! - Tracks pane focus, scroll positions and the board filter.
//! - Turns operator keys into the two mutations the monitor may perform:
//!   requesting shutdown and injecting `TEST` events.

mod action;
mod event;
mod state;

pub use action::AppAction;
use corkboard_server::{Observation, StoredPost};
pub use event::{AppEvent, KeyInput};
pub use state::{Focus, InputMode, ScrollOffsets};

/// Items moved by PageUp/PageDown.
const PAGE: isize = 10;

/// Monitor state machine.
#[derive(Debug, Clone, Default)]
pub struct App {
    /// Latest server view. `None` until the first snapshot arrives.
    observation: Option<Observation>,
    focus: Focus,
    mode: InputMode,
    /// Case-insensitive substring applied to the board.
    filter: String,
    scroll: ScrollOffsets,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// `TEST` events injected so far.
    test_events: u64,
    shutting_down: bool,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Monitor with no server view yet.
    pub fn new() -> Self {
        Self { terminal_size: (80, 24), ..Self::default() }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::Snapshot(observation) => {
                self.observation = Some(observation);
                self.clamp_scroll();
                vec![AppAction::Render]
            },
            AppEvent::ServerStopped { error: None } => {
                self.status_message = Some("Server stopped".into());
                vec![AppAction::Render, AppAction::Quit]
            },
            AppEvent::ServerStopped { error: Some(error) } => {
                self.status_message = Some(format!("Server failed: {error}"));
                vec![AppAction::Render, AppAction::Quit]
            },
            AppEvent::Key(key) => match self.mode {
                InputMode::Normal => self.handle_command_key(key),
                InputMode::EditingFilter => self.handle_filter_key(key),
            },
        }
    }

    fn handle_command_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Char('q') | KeyInput::Esc if self.shutting_down => vec![AppAction::Quit],
            KeyInput::Char('q') | KeyInput::Esc => {
                self.shutting_down = true;
                self.status_message = Some("Shutting down, notifying clients...".into());
                vec![AppAction::RequestShutdown, AppAction::Render]
            },
            KeyInput::Char('t') => {
                self.test_events += 1;
                let message = format!("Test event #{} from monitor", self.test_events);
                self.status_message = Some(format!("Injected: {message}"));
                vec![AppAction::InjectTestEvent { message }, AppAction::Render]
            },
            KeyInput::Char('/') => {
                self.mode = InputMode::EditingFilter;
                vec![AppAction::Render]
            },
            KeyInput::Tab => {
                self.focus = self.focus.next();
                vec![AppAction::Render]
            },
            KeyInput::Up => self.scroll_by(-1),
            KeyInput::Down => self.scroll_by(1),
            KeyInput::PageUp => self.scroll_by(-PAGE),
            KeyInput::PageDown => self.scroll_by(PAGE),
            KeyInput::Home => self.scroll_by(isize::MIN),
            KeyInput::End => self.scroll_by(isize::MAX),
            KeyInput::Char(_) | KeyInput::Enter | KeyInput::Backspace => vec![],
        }
    }

    fn handle_filter_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Char(c) => self.filter.push(c),
            KeyInput::Backspace => {
                self.filter.pop();
            },
            KeyInput::Enter => self.mode = InputMode::Normal,
            KeyInput::Esc => {
                self.filter.clear();
                self.mode = InputMode::Normal;
            },
            _ => return vec![],
        }
        self.scroll.board = 0;
        vec![AppAction::Render]
    }

    /// Move the focused pane. Positive `delta` means "down the screen".
    fn scroll_by(&mut self, delta: isize) -> Vec<AppAction> {
        let posts = self.visible_posts_len();
        let (events, connections) =
            self.observation.as_ref().map_or((0, 0), |o| (o.events.len(), o.connections.len()));

        // The board is drawn bottom-up, so "down" moves towards offset 0.
        let (offset, len, delta) = match self.focus {
            Focus::Board => (&mut self.scroll.board, posts, delta.saturating_neg()),
            Focus::Events => (&mut self.scroll.events, events, delta),
            Focus::Connections => (&mut self.scroll.connections, connections, delta),
        };

        *offset = offset.saturating_add_signed(delta).min(len.saturating_sub(1));
        vec![AppAction::Render]
    }

    fn clamp_scroll(&mut self) {
        let posts = self.visible_posts_len();
        let (events, connections) =
            self.observation.as_ref().map_or((0, 0), |o| (o.events.len(), o.connections.len()));
        self.scroll.board = self.scroll.board.min(posts.saturating_sub(1));
        self.scroll.events = self.scroll.events.min(events.saturating_sub(1));
        self.scroll.connections = self.scroll.connections.min(connections.saturating_sub(1));
    }

    fn visible_posts_len(&self) -> usize {
        self.visible_posts().len()
    }

    /// Latest server view.
    pub fn observation(&self) -> Option<&Observation> {
        self.observation.as_ref()
    }

    /// Posts matching the filter, in board order.
    ///
    /// The filter is a case-insensitive substring matched against author,
    /// title and body. An empty filter matches everything.
    pub fn visible_posts(&self) -> Vec<&StoredPost> {
        let Some(observation) = &self.observation else {
            return Vec::new();
        };
        if self.filter.is_empty() {
            return observation.posts.iter().collect();
        }

        let needle = self.filter.to_lowercase();
        observation
            .posts
            .iter()
            .filter(|stored| {
                let post = &stored.post;
                [&post.author, &post.title, &post.body]
                    .iter()
                    .any(|field| String::from_utf8_lossy(field).to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Pane receiving scroll keys.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Current input mode.
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Board filter text.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Scroll offsets of every pane.
    pub fn scroll(&self) -> ScrollOffsets {
        self.scroll
    }

    /// Terminal dimensions.
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Whether shutdown has been requested from the monitor.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Transient status message, if any.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
