//! Terminal input events.
//!
//! Events flow INTO the application from the TUI layer; results of async work
//! flow through [`PageMsg`](super::PageMsg) instead.

use crossterm::event::KeyEvent;

/// Events from the terminal.
#[derive(Clone, Debug)]
pub enum Event {
    /// Terminal initialized
    Init,
    /// Quit requested (Ctrl+C or SIGTERM)
    Quit,
    /// Error occurred in the event loop
    Error(String),
    /// Periodic tick, drives the loading spinner
    Tick,
    /// Render frame requested
    Render,
    Key(KeyEvent),
    Resize(u16, u16),
}
