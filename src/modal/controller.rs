use tracing::{debug, info, warn};

use super::context::ControllerCx;
use super::state::{ModalMachine, ModalState};
use super::LOADING_PLACEHOLDER;
use crate::core::command::AwaitSettleCmd;
use crate::core::PageMsg;
use crate::document::{Element, NodeId, Scope, ZLayer, attr};
use crate::interpret::interpret;
use crate::sync::{AbortSignal, CancellationManager, CloseAcquire, OWN_ABORT_REASON};
use crate::transport::FetchResponse;

/// What happened to a close request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The show animation is still running.
    Dropped,
    /// Already closed.
    Ignored,
    AlreadyClosing,
    /// Another dialog is closing.
    Rejected { holder: String },
    Accepted,
}

impl CloseOutcome {
    /// Whether a force-close loop should try again later.
    pub const fn should_retry(&self) -> bool {
        matches!(self, Self::Dropped | Self::Rejected { .. })
    }
}

#[derive(Debug)]
pub struct ModalController {
    pub(super) region: String,
    pub(super) layer: ZLayer,
    pub(super) machine: ModalMachine,
    pub(super) cancellation: CancellationManager,
    /// The element that started the last load, as it was when it fired.
    pub(super) trigger: Option<Element>,
    /// The last load asked to open only once its response arrived.
    pub(super) suppress_auto_open: bool,
    pub(super) force_close: bool,
    pub(super) force_generation: u64,
    pub(super) force_loop_running: bool,
}

impl ModalController {
    pub fn new(region: impl Into<String>, layer: ZLayer) -> Self {
        Self {
            region: region.into(),
            layer,
            machine: ModalMachine::new(),
            cancellation: CancellationManager::new(),
            trigger: None,
            suppress_auto_open: false,
            force_close: false,
            force_generation: 0,
            force_loop_running: false,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub const fn layer(&self) -> ZLayer {
        self.layer
    }

    pub const fn state(&self) -> ModalState {
        self.machine.state()
    }

    pub const fn machine(&self) -> &ModalMachine {
        &self.machine
    }

    /// Visible in any form: showing, shown or hiding.
    pub const fn is_open(&self) -> bool {
        !matches!(self.machine.state(), ModalState::Closed)
    }

    pub const fn is_transitioning(&self) -> bool {
        self.machine.is_transitioning()
    }

    pub const fn force_close_pending(&self) -> bool {
        self.force_close
    }

    pub fn trigger(&self) -> Option<NodeId> {
        self.trigger.as_ref().map(|element| element.node)
    }

    pub const fn has_active_request(&self) -> bool {
        self.cancellation.has_active()
    }

    /// Called once when the page attaches the controller. Regions rendered
    /// empty get the loading placeholder.
    pub fn connect(&self, cx: &ControllerCx<'_>) {
        let empty = cx
            .document
            .region_content(&self.region)
            .is_some_and(|content| content.trim().is_empty());
        if empty {
            self.set_loading(cx);
        }
        debug!(region = %self.region, layer = %self.layer, "controller attached");
    }

    /// Called when the page detaches the controller.
    pub fn disconnect(&mut self) {
        if self.cancellation.cancel_active(OWN_ABORT_REASON) {
            debug!(region = %self.region, "aborted load on detach");
        }
        self.force_close = false;
    }

    // ===== Opening =====

    /// Show the dialog. No-op unless it is fully closed.
    pub fn open(&mut self, cx: &mut ControllerCx<'_>, show_loading: bool) -> bool {
        if self.is_open() {
            return false;
        }
        if let Err(error) = self.machine.enter(ModalState::Opening) {
            warn!(region = %self.region, %error, "cannot open");
            return false;
        }

        if show_loading {
            self.set_loading(cx);
        }
        cx.document.set_dialog_hidden(&self.region, false);
        cx.after(
            cx.timing.transition_window(),
            PageMsg::OpenSettled {
                region: self.region.clone(),
            },
        );
        debug!(region = %self.region, "opening");

        if self.force_close {
            self.start_force_loop(cx);
        }
        true
    }

    pub fn on_open_settled(&mut self) {
        if self.machine.state() == ModalState::Opening
            && let Err(error) = self.machine.enter(ModalState::Open)
        {
            warn!(region = %self.region, %error, "open did not settle");
        }
    }

    pub(super) fn open_with_placeholder(&mut self, cx: &mut ControllerCx<'_>) -> bool {
        let complete = cx.document.region_has_attribute(&self.region, attr::COMPLETE);
        self.open(cx, !complete)
    }

    pub fn on_deferred_open(&mut self, cx: &mut ControllerCx<'_>, signal: &AbortSignal) {
        if signal.is_aborted() {
            debug!(region = %self.region, "deferred open skipped, load was aborted");
            return;
        }
        self.open_with_placeholder(cx);
    }

    // ===== Closing =====

    pub fn close(&mut self, cx: &mut ControllerCx<'_>) -> CloseOutcome {
        match self.machine.state() {
            ModalState::Closed => return CloseOutcome::Ignored,
            ModalState::Opening => {
                debug!(region = %self.region, "close dropped while opening");
                return CloseOutcome::Dropped;
            }
            ModalState::Closing => return CloseOutcome::AlreadyClosing,
            ModalState::Open => {}
        }

        let guard = match cx.close_lock.try_acquire(&self.region) {
            CloseAcquire::Acquired(guard) => Some(guard),
            CloseAcquire::Reentrant => None,
            CloseAcquire::Busy(holder) => {
                debug!(region = %self.region, %holder, "close rejected, another dialog is closing");
                return CloseOutcome::Rejected { holder };
            }
        };

        if self.cancellation.cancel_active(OWN_ABORT_REASON) {
            info!(region = %self.region, "aborted in-flight load");
            self.release_trigger(cx);
        }
        self.force_close = false;

        if let Err(error) = self.machine.enter(ModalState::Closing) {
            warn!(region = %self.region, %error, "cannot close");
            return CloseOutcome::Ignored;
        }
        cx.after(
            cx.timing.transition_window(),
            PageMsg::HideSettled {
                region: self.region.clone(),
            },
        );
        if let Some(guard) = guard {
            cx.spawn(AwaitSettleCmd::new(
                cx.document.clone(),
                guard,
                cx.timing.settle_poll(),
                cx.sender(),
            ));
        }
        debug!(region = %self.region, "closing");
        CloseOutcome::Accepted
    }

    pub fn on_hide_settled(&mut self, cx: &mut ControllerCx<'_>) {
        if self.machine.state() != ModalState::Closing {
            return;
        }
        cx.document.set_dialog_hidden(&self.region, true);
        if let Err(error) = self.machine.enter(ModalState::Closed) {
            warn!(region = %self.region, %error, "close did not settle");
        }
    }

    pub fn on_close_settled(&self, settled: bool) {
        if settled {
            debug!(region = %self.region, "dialog settled to hidden");
        } else {
            warn!(region = %self.region, "dialog did not settle to hidden in time");
        }
    }

    // ===== Force close =====

    /// Raise the force-close switch. Returns the generation to release later.
    pub(super) const fn request_force_close(&mut self) -> u64 {
        self.force_close = true;
        self.force_generation += 1;
        self.force_generation
    }

    /// Close now if possible and keep retrying while the switch is raised,
    /// then lower it after the cooldown.
    pub(super) fn force_close_now(&mut self, cx: &mut ControllerCx<'_>) {
        let generation = self.request_force_close();
        if self.is_open() && self.close(cx).should_retry() {
            self.start_force_loop(cx);
        }
        self.schedule_force_release(cx, generation);
    }

    pub(super) fn schedule_force_release(&self, cx: &ControllerCx<'_>, generation: u64) {
        cx.after(
            cx.timing.force_close_cooldown(),
            PageMsg::ReleaseForceClose {
                region: self.region.clone(),
                generation,
            },
        );
    }

    fn start_force_loop(&mut self, cx: &ControllerCx<'_>) {
        if self.force_loop_running {
            return;
        }
        self.force_loop_running = true;
        cx.after(
            cx.timing.force_close_interval(),
            PageMsg::ForceCloseTick {
                region: self.region.clone(),
            },
        );
    }

    pub fn on_force_close_tick(&mut self, cx: &mut ControllerCx<'_>) {
        if !self.force_close {
            self.force_loop_running = false;
            return;
        }

        self.close(cx);
        if self.force_close {
            cx.after(
                cx.timing.force_close_interval(),
                PageMsg::ForceCloseTick {
                    region: self.region.clone(),
                },
            );
        } else {
            self.force_loop_running = false;
        }
    }

    pub fn on_release_force_close(&mut self, generation: u64) {
        // A newer request restarted the cooldown.
        if generation == self.force_generation {
            self.force_close = false;
        }
    }

    pub fn on_transport_close_due(&mut self, cx: &mut ControllerCx<'_>) {
        if self.close(cx).should_retry() && self.force_close {
            self.start_force_loop(cx);
        }
        self.schedule_force_release(cx, self.force_generation);
    }

    // ===== Content =====

    pub fn set_loading(&self, cx: &ControllerCx<'_>) {
        cx.document
            .set_region_content(&self.region, LOADING_PLACEHOLDER);
    }

    pub fn hide_error_banners(&self, cx: &ControllerCx<'_>) {
        cx.document.set_banners_visible(&self.region, false);
    }

    pub fn show_error(&self, cx: &ControllerCx<'_>, response: &FetchResponse) {
        let fragment = interpret(response);
        warn!(
            region = %self.region,
            status = %response.status,
            headline = fragment.headline.as_deref().unwrap_or_default(),
            "load failed"
        );
        cx.document
            .set_region_content(&self.region, &fragment.html);
        if fragment.reveal_banners {
            cx.document.set_banners_visible(&self.region, true);
        }
    }

    /// Re-enable the recorded trigger unless it asked to stay disabled.
    pub fn release_trigger(&self, cx: &ControllerCx<'_>) {
        let Some(trigger) = self.trigger() else {
            return;
        };
        let keep_disabled = cx
            .document
            .element(trigger)
            .is_some_and(|element| element.flags.keep_disabled);
        if !keep_disabled {
            cx.document.set_disabled(trigger, false);
        }
    }

    /// The trigger to activate again on retry.
    ///
    /// Re-rendering may have replaced the recorded node. Then an element with
    /// the same identity is looked up, and failing that the recorded copy is
    /// used so the original action still goes out.
    pub fn retry_trigger(&self, cx: &ControllerCx<'_>) -> Option<Element> {
        let Some(recorded) = &self.trigger else {
            debug!(region = %self.region, "nothing to retry");
            return None;
        };
        if let Some(live) = cx.document.element(recorded.node) {
            return Some(live);
        }

        let resolved = cx
            .document
            .triggers(&Scope::Document)
            .into_iter()
            .find(|element| element.same_trigger(recorded));
        debug!(
            region = %self.region,
            resolved = resolved.is_some(),
            "recorded trigger left the page"
        );
        Some(resolved.unwrap_or_else(|| {
            let mut copy = recorded.clone();
            copy.disabled = recorded.flags.disable_on_request && recorded.flags.keep_disabled;
            copy
        }))
    }
}
