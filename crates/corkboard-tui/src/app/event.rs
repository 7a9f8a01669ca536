//! Monitor events
//!
//! Inputs fed into the [`App`](super::App) state machine from the terminal
//! and from the hosted server.

use corkboard_server::Observation;

/// Key input, decoupled from the terminal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Tab key.
    Tab,
    /// Escape key.
    Esc,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Home key.
    Home,
    /// End key.
    End,
}

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Fresh view of the server state.
    Snapshot(Observation),

    /// The server task finished.
    ServerStopped {
        /// Failure description, `None` on a clean shutdown.
        error: Option<String>,
    },
}
