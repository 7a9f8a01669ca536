//! Monitor view state
//!
//! Pane focus, input mode and per-pane scroll positions.

/// Pane receiving scroll keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Board pane.
    #[default]
    Board,
    /// Event log pane.
    Events,
    /// Connection list pane.
    Connections,
}

impl Focus {
    /// Next pane in Tab order.
    pub fn next(self) -> Self {
        match self {
            Self::Board => Self::Events,
            Self::Events => Self::Connections,
            Self::Connections => Self::Board,
        }
    }
}

/// What keystrokes currently mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Single-key commands.
    #[default]
    Normal,
    /// Typing the board filter.
    EditingFilter,
}

/// Scroll offsets, in list items.
///
/// The board follows its tail, so its offset counts items hidden below the
/// view. The event log and connection list count items hidden above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOffsets {
    /// Items scrolled back from the newest post.
    pub board: usize,
    /// Items scrolled past the newest event.
    pub events: usize,
    /// Items scrolled past the first connection.
    pub connections: usize,
}
