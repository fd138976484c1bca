//! Page-level messages.
//!
//! Messages carry the results of async work back into the page. The page
//! handles them one at a time in [`Page::update`](crate::page::Page::update),
//! which is the only place controller state changes.
//!
//! # Terminology
//! - **Event**: Input from the terminal - see [`crate::core::event::Event`]
//! - **Message**: Completion of async work, routed to a controller
//! - **Command**: Async side effect operations - see [`crate::core::command::Command`]
//! - **Notice**: Outward notification for whoever hosts the page

use crate::modal::Origin;
use crate::stream::StreamAction;
use crate::sync::AbortSignal;
use crate::transport::{FetchResponse, TransportError};

#[derive(Debug)]
pub enum PageMsg {
    // === Modal lifecycle ===
    /// Show animation finished
    OpenSettled { region: String },
    /// Hide animation finished
    HideSettled { region: String },
    /// Settle watcher finished and released the close lock
    CloseSettled { region: String, settled: bool },
    /// Delayed open after a form submission
    DeferredOpen { region: String, signal: AbortSignal },
    /// Next iteration of the force-close loop
    ForceCloseTick { region: String },
    /// Force-close cooldown elapsed
    ReleaseForceClose { region: String, generation: u64 },
    /// Delayed close after a transport failure
    TransportCloseDue { region: String },

    // === Out-of-band updates ===
    /// Watch on a region marked as awaiting replacement finished
    RegionReplaced {
        watcher: String,
        target: String,
        own: bool,
        replaced: bool,
    },
    /// Stream actions to apply
    Stream(Vec<StreamAction>),

    // === Network ===
    Response {
        origin: Origin,
        signal: AbortSignal,
        response: FetchResponse,
    },
    TransportFailed {
        origin: Origin,
        signal: AbortSignal,
        error: TransportError,
    },
}

impl PageMsg {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OpenSettled { .. } => "open-settled",
            Self::HideSettled { .. } => "hide-settled",
            Self::CloseSettled { .. } => "close-settled",
            Self::DeferredOpen { .. } => "deferred-open",
            Self::ForceCloseTick { .. } => "force-close-tick",
            Self::ReleaseForceClose { .. } => "release-force-close",
            Self::TransportCloseDue { .. } => "transport-close-due",
            Self::RegionReplaced { .. } => "region-replaced",
            Self::Stream(_) => "stream",
            Self::Response { .. } => "response",
            Self::TransportFailed { .. } => "transport-failed",
        }
    }
}

/// Notifications the page emits for its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageNotice {
    /// A controller took charge of a load into its region.
    ModalTarget { region: String },
    /// A load failed at the transport level.
    LoadFailed { region: String, reason: String },
}
