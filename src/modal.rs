//! Modal dialogs bound to content regions.
//!
//! A [`ModalController`] owns one dialog: its open/close state machine, the
//! token of its in-flight load, and the force-close switch. It never awaits.
//! Everything that takes time is spawned as a command through the
//! [`ControllerCx`] and comes back to the page as a message.

mod context;
mod controller;
mod hooks;
mod intercept;
mod state;

pub use context::{ControllerCx, Effect};
pub use controller::{CloseOutcome, ModalController};
pub use hooks::{DispatchFlags, Origin, ResponseMode};
pub use state::{InvalidTransition, ModalMachine, ModalState};

/// Painted into a region while its content loads.
pub const LOADING_PLACEHOLDER: &str =
    r#"<div class="text-center" data-loading><div role="status"><span class="sr-only">Loading...</span></div></div>"#;
