//! Terminal monitor for Corkboard
//!
//! Hosts a [`corkboard_server::Server`] in-process and shows its board, event
//! log and connections live. The operator can inject `TEST` events and shut
//! the server down.
//!
//! The [`App`] state machine is pure; [`runtime::Runtime`] owns all I/O.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod app;
pub mod runtime;
pub mod terminal;
pub mod ui;

pub use app::{App, AppAction, AppEvent, KeyInput};
pub use runtime::{Runtime, RuntimeError};
