//! Load lifecycle hooks.
//!
//! The page forwards every stage of a load to the controllers bound to it:
//! first the controller bound to the element that started it, then the one
//! bound to the region around that element. Hooks share one
//! [`DispatchFlags`] value per event.

use tracing::{debug, warn};

use super::context::{ControllerCx, Effect};
use super::controller::ModalController;
use crate::core::{PageMsg, PageNotice};
use crate::document::{Element, Scope, TriggerFlags, attr};
use crate::sync::{AbortSignal, OWN_ABORT_REASON};
use crate::transport::{FetchResponse, TransportError};

/// Where a load came from.
#[derive(Debug, Clone)]
pub enum Origin {
    /// A navigation into a region, started by a link or button.
    Region(String),
    /// A form submission.
    Form(Element),
}

impl Origin {
    /// The region the load renders into.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Region(region) => Some(region),
            Self::Form(form) => form.target.as_deref(),
        }
    }

    pub fn flags(&self) -> TriggerFlags {
        match self {
            Self::Region(_) => TriggerFlags::default(),
            Self::Form(form) => form.flags,
        }
    }

    pub const fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }
}

/// Per-event state shared by every controller the event reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchFlags {
    /// Skip the default render.
    pub default_prevented: bool,
    /// Do not forward the event to further controllers.
    pub propagation_stopped: bool,
    /// A controller already handled this form response.
    pub processing: bool,
    /// A controller rendered the response itself.
    pub handled: bool,
}

impl DispatchFlags {
    pub const fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub const fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

/// How a load decides when the dialog opens and how its response resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Open when the load starts.
    InPlace,
    /// Open only once a successful response arrived.
    Deferred,
    /// Open when the load starts, resolve by which region the form targets.
    ByTarget,
    /// Never open up front, resolve by target.
    DeferredByTarget,
}

impl ResponseMode {
    pub const fn from_flags(open_on_response: bool, resolve_by_target: bool) -> Self {
        match (open_on_response, resolve_by_target) {
            (false, false) => Self::InPlace,
            (true, false) => Self::Deferred,
            (false, true) => Self::ByTarget,
            (true, true) => Self::DeferredByTarget,
        }
    }

    pub const fn defers_open(self) -> bool {
        matches!(self, Self::Deferred | Self::DeferredByTarget)
    }

    pub const fn resolves_by_target(self) -> bool {
        matches!(self, Self::ByTarget | Self::DeferredByTarget)
    }
}

impl ModalController {
    fn trigger_element(&self, cx: &ControllerCx<'_>) -> Option<Element> {
        self.trigger
            .as_ref()
            .and_then(|recorded| cx.document.element(recorded.node))
    }

    /// Open-on-response can come from the trigger or the form itself;
    /// resolve-by-target only from the form.
    pub fn response_mode(&self, cx: &ControllerCx<'_>, origin: &Origin) -> ResponseMode {
        let trigger = self
            .trigger_element(cx)
            .map(|element| element.flags)
            .unwrap_or_default();
        let origin = origin.flags();
        ResponseMode::from_flags(
            trigger.open_on_response || origin.open_on_response,
            origin.resolve_by_target,
        )
    }

    // ===== Activation =====

    pub fn on_click(&mut self, cx: &ControllerCx<'_>, trigger: &Element) {
        self.trigger = Some(trigger.clone());
        if trigger.flags.disable_on_request {
            cx.document.set_disabled(trigger.node, true);
        }
    }

    pub fn on_submit_start(&mut self, submitter: &Element) {
        self.trigger = Some(submitter.clone());
    }

    // ===== Request =====

    /// Take charge of a load into this region. Returns the load's token, or
    /// `None` if the load is not for this controller.
    pub fn on_before_request(
        &mut self,
        cx: &mut ControllerCx<'_>,
        origin: &Origin,
    ) -> Option<AbortSignal> {
        if let Origin::Form(form) = origin {
            let trigger_target = self.trigger_element(cx).and_then(|element| element.target);
            if let Some(trigger_target) = trigger_target
                && form.target.as_deref() != Some(trigger_target.as_str())
            {
                return None;
            }
            if form.target.as_deref() != Some(self.region.as_str()) {
                return None;
            }
        }

        cx.document
            .remove_region_attribute(&self.region, attr::COMPLETE);
        self.hide_error_banners(cx);
        let signal = self.cancellation.begin_request();
        cx.notify(PageNotice::ModalTarget {
            region: self.region.clone(),
        });

        self.suppress_auto_open = self.response_mode(cx, origin).defers_open();
        if !self.suppress_auto_open {
            if origin.is_form() {
                cx.after(
                    cx.timing.form_open_delay(),
                    PageMsg::DeferredOpen {
                        region: self.region.clone(),
                        signal: signal.clone(),
                    },
                );
            } else {
                self.open_with_placeholder(cx);
            }
        }
        Some(signal)
    }

    // ===== Response =====

    pub fn on_before_response(
        &mut self,
        cx: &mut ControllerCx<'_>,
        origin: &Origin,
        signal: &AbortSignal,
        response: &FetchResponse,
        flags: &mut DispatchFlags,
    ) {
        self.cancellation.finish(signal.id());

        match origin {
            Origin::Region(_) => self.on_region_response(cx, origin, response, flags),
            Origin::Form(form) if form.flags.resolve_by_target => {
                self.on_by_target_response(cx, form, response, flags);
            }
            Origin::Form(form) => self.on_form_response(cx, origin, form, response, flags),
        }
    }

    fn fail(&mut self, cx: &mut ControllerCx<'_>, response: &FetchResponse, flags: &mut DispatchFlags) {
        flags.prevent_default();
        self.open(cx, false);
        self.show_error(cx, response);
    }

    fn on_region_response(
        &mut self,
        cx: &mut ControllerCx<'_>,
        origin: &Origin,
        response: &FetchResponse,
        flags: &mut DispatchFlags,
    ) {
        self.release_trigger(cx);
        if !response.is_success() {
            self.fail(cx, response, flags);
            return;
        }
        if self.response_mode(cx, origin).defers_open() {
            self.open(cx, true);
        }
    }

    fn on_by_target_response(
        &mut self,
        cx: &mut ControllerCx<'_>,
        form: &Element,
        response: &FetchResponse,
        flags: &mut DispatchFlags,
    ) {
        let targets_self = form.declared_target() == Some(self.region.as_str());
        let inside_other = form
            .region
            .as_deref()
            .is_some_and(|region| region != self.region);

        if targets_self || inside_other {
            if response.is_success() {
                self.force_close_now(cx);
                return;
            }
            if targets_self {
                flags.stop_propagation();
            }
            self.fail(cx, response, flags);
            return;
        }

        // The form sits in this dialog's own region.
        if !response.is_success() {
            self.fail(cx, response, flags);
            return;
        }
        if response.is_stream() {
            return;
        }
        cx.document
            .set_region_content(&self.region, &response.text());
        cx.document
            .set_region_attribute(&self.region, attr::COMPLETE, "");
        cx.effect(Effect::Rebind(Scope::Region(self.region.clone())));
        flags.handled = true;
    }

    fn on_form_response(
        &mut self,
        cx: &mut ControllerCx<'_>,
        origin: &Origin,
        form: &Element,
        response: &FetchResponse,
        flags: &mut DispatchFlags,
    ) {
        if form.declared_target() != Some(self.region.as_str()) {
            return;
        }
        if flags.processing {
            debug!(region = %self.region, "form response already processed");
            return;
        }
        flags.processing = true;

        if !response.is_success() {
            self.fail(cx, response, flags);
            return;
        }
        if response.is_stream() && self.suppress_auto_open {
            self.suppress_auto_open = false;
            return;
        }
        if self.response_mode(cx, origin).defers_open() {
            self.open(cx, true);
        }
    }

    // ===== Failure =====

    pub fn on_transport_error(&mut self, cx: &mut ControllerCx<'_>, error: &TransportError) {
        if error.abort_reason() == Some(OWN_ABORT_REASON) {
            debug!(region = %self.region, "own abort, ignoring");
            return;
        }

        warn!(region = %self.region, %error, "load failed at the transport");
        cx.notify(PageNotice::LoadFailed {
            region: self.region.clone(),
            reason: error.to_string(),
        });
        self.release_trigger(cx);
        self.request_force_close();
        cx.after(
            cx.timing.transport_error_close_delay(),
            PageMsg::TransportCloseDue {
                region: self.region.clone(),
            },
        );
    }
}
