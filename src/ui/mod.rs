//! Terminal views of the page.
//!
//! - [`Component`] - Interactive building blocks driven by key events
//! - [`Handled`] - Result of handling an input event
//! - [`TriggerList`], [`DialogView`], [`StatusBar`] - The pieces the app draws

mod component;
mod dialog;
pub mod markup;
mod spinner;
mod status_bar;
mod trigger_list;

pub use component::Component;
pub use dialog::DialogView;
pub use spinner::Spinner;
pub use status_bar::StatusBar;
pub use trigger_list::{TriggerEvent, TriggerList};

pub type Result<T> = std::result::Result<T, color_eyre::Report>;

/// Result of handling an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled<E> {
    /// Input was not handled, parent should process it.
    Ignored,
    /// Input was consumed but produced no event.
    Consumed,
    /// Input was consumed and produced an event.
    Event(E),
}

impl<E> Handled<E> {
    pub fn event(self) -> Option<E> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<E> for Handled<E> {
    fn from(event: E) -> Self {
        Self::Event(event)
    }
}
