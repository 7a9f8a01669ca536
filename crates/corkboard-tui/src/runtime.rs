//! Async runtime
//!
//! Hosts the server in a background task and drives the monitor. One
//! `tokio::select!` loop multiplexes terminal input, a periodic snapshot tick
//! and the completion of the server task.
//!
//! The server is bound before the terminal enters raw mode, so a bind failure
//! is reported on a normal terminal.

use std::{io, sync::Arc, time::Duration};

use corkboard_server::{Server, ServerConfig, ServerError, ServerState};
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};

use crate::{
    App,
    app::{AppAction, AppEvent},
    terminal::{self, TerminalError, Tui},
};

/// Snapshot and redraw period.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// I/O error from terminal input.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Terminal setup or drawing failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] TerminalError),

    /// The hosted server failed.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// The server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Join(#[from] JoinError),
}

/// Monitor runtime.
pub struct Runtime {
    tui: Tui,
    app: App,
    state: Arc<ServerState>,
    server_task: JoinHandle<Result<(), ServerError>>,
    /// Outcome of the server task once it has finished.
    server_result: Option<Result<(), RuntimeError>>,
}

impl Runtime {
    /// Bind the server, start it and take over the terminal.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::Server`] if the listener cannot be set up
    /// - [`RuntimeError::Terminal`] if the terminal cannot enter raw mode
    pub async fn start(config: ServerConfig) -> Result<Self, RuntimeError> {
        let state = Arc::new(ServerState::new());
        let server = Server::bind(config, Arc::clone(&state)).await?;
        let server_task = tokio::spawn(server.run());

        let tui = match Tui::new() {
            Ok(tui) => tui,
            Err(e) => {
                state.request_shutdown();
                if let Err(server_err) = join_server(server_task).await {
                    tracing::warn!("server stopped with error after terminal setup failed: {server_err}");
                }
                return Err(e.into());
            },
        };

        Ok(Self { tui, app: App::new(), state, server_task, server_result: None })
    }

    /// Run until the operator quits or the server stops.
    ///
    /// Leaving the loop while the server is still running requests shutdown
    /// and waits for it, after the terminal has been restored.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        let (cols, rows) = self.tui.size()?;
        let mut actions = self.app.handle(AppEvent::Resize(cols, rows));
        actions.extend(self.app.handle(AppEvent::Snapshot(self.state.observe())));
        let mut outcome = self.process_actions(actions);

        let mut event_stream = EventStream::new();
        let mut tick_interval = tokio::time::interval(TICK_INTERVAL);

        while let Ok(false) = outcome {
            let actions = tokio::select! {
                maybe_event = event_stream.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_terminal_event(event),
                    Some(Err(e)) => {
                        outcome = Err(e.into());
                        break;
                    },
                    None => vec![AppAction::Quit],
                },

                joined = &mut self.server_task, if self.server_result.is_none() => {
                    let result = match joined {
                        Ok(result) => result.map_err(RuntimeError::from),
                        Err(e) => Err(RuntimeError::from(e)),
                    };
                    let error = result.as_ref().err().map(ToString::to_string);
                    self.server_result = Some(result);

                    let mut actions = self.app.handle(AppEvent::Snapshot(self.state.observe()));
                    actions.extend(self.app.handle(AppEvent::ServerStopped { error }));
                    actions
                },

                _ = tick_interval.tick() => {
                    let mut actions = self.app.handle(AppEvent::Snapshot(self.state.observe()));
                    actions.extend(self.app.handle(AppEvent::Tick));
                    actions
                },
            };

            outcome = self.process_actions(actions);
        }

        let Self { tui, state, server_task, server_result, .. } = self;
        drop(tui);

        let server_result = match server_result {
            Some(result) => result,
            None => {
                state.request_shutdown();
                join_server(server_task).await
            },
        };

        outcome?;
        server_result
    }

    fn handle_terminal_event(&mut self, event: Event) -> Vec<AppAction> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                terminal::convert_key(key).map_or_else(Vec::new, |key| self.app.handle(AppEvent::Key(key)))
            },
            Event::Resize(cols, rows) => self.app.handle(AppEvent::Resize(cols, rows)),
            _ => vec![],
        }
    }

    /// Execute actions returned by the app. Returns true if should quit.
    fn process_actions(&mut self, actions: Vec<AppAction>) -> Result<bool, RuntimeError> {
        for action in actions {
            match action {
                AppAction::Render => self.tui.draw(&self.app)?,
                AppAction::Quit => return Ok(true),
                AppAction::RequestShutdown => {
                    tracing::info!("shutdown requested from monitor");
                    self.state.request_shutdown();
                },
                AppAction::InjectTestEvent { message } => self.state.log_test_event(message),
            }
        }
        Ok(false)
    }
}

/// Wait for the server task and fold its outcome into a [`RuntimeError`].
async fn join_server(task: JoinHandle<Result<(), ServerError>>) -> Result<(), RuntimeError> {
    match task.await {
        Ok(result) => result.map_err(RuntimeError::from),
        Err(e) => Err(RuntimeError::from(e)),
    }
}
