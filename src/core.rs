//! Core framework for modalframe.
//!
//! This module contains the foundational types and traits the page and the
//! terminal host are built on:
//! - [`Event`](event::Event) - Input events from the terminal
//! - [`PageMsg`] - Results of async work flowing back into the page
//! - [`Command`] - Async side effect operations
//! - [`Tui`](tui::Tui) - Terminal wrapper

pub mod command;
pub mod event;
pub mod message;
pub mod tui;

pub use command::Command;
pub use message::{PageMsg, PageNotice};
