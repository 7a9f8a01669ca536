//! Monitor actions
//!
//! Instructions produced by the [`App`](super::App) state machine for the
//! runtime to execute.

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Redraw the screen.
    Render,

    /// Ask the hosted server to shut down.
    RequestShutdown,

    /// Append a `TEST` event to the server's event log.
    InjectTestEvent {
        /// Event text.
        message: String,
    },

    /// Leave the monitor.
    Quit,
}
