//! Interception of out-of-band region replacements.

use tracing::{debug, warn};

use super::context::{ControllerCx, Effect};
use super::controller::ModalController;
use crate::core::command::AwaitReplacementCmd;
use crate::document::{Scope, attr};
use crate::stream::{StreamAction, StreamVerb};

impl ModalController {
    /// Look at a stream action before it is applied.
    ///
    /// A replacement of this dialog's own region while it is open keeps the
    /// dialog around the new content. A replacement anywhere else means the
    /// page moved on, so once it lands this dialog closes.
    pub fn intercept_stream(&mut self, cx: &mut ControllerCx<'_>, action: &mut StreamAction) {
        if action.verb != StreamVerb::Replace {
            return;
        }
        if !self.is_open() {
            self.watch_sibling(cx, &action.target);
            return;
        }
        let Some(payload) = action.payload.as_mut() else {
            return;
        };
        if action.target != self.region {
            self.watch_sibling(cx, &action.target);
            return;
        }

        cx.document
            .set_region_attribute(&self.region, attr::AWAITING_REPLACEMENT, "true");
        payload.wrap_for(&self.region);
        cx.spawn(AwaitReplacementCmd::new(
            cx.document.clone(),
            self.region.clone(),
            self.region.clone(),
            true,
            cx.timing.replace_poll(),
            cx.sender(),
        ));
        debug!(region = %self.region, "awaiting replacement of own region");
    }

    fn watch_sibling(&self, cx: &ControllerCx<'_>, target: &str) {
        if target == self.region || cx.document.region(target).is_none() {
            return;
        }

        cx.document
            .set_region_attribute(target, attr::AWAITING_REPLACEMENT, "true");
        cx.spawn(AwaitReplacementCmd::new(
            cx.document.clone(),
            self.region.clone(),
            target,
            false,
            cx.timing.replace_poll(),
            cx.sender(),
        ));
    }

    pub fn on_region_replaced(
        &mut self,
        cx: &mut ControllerCx<'_>,
        target: &str,
        own: bool,
        replaced: bool,
    ) {
        if !replaced {
            warn!(region = %self.region, replaced_region = %target, "region was not replaced in time");
            cx.document
                .remove_region_attribute(target, attr::AWAITING_REPLACEMENT);
            return;
        }

        if own {
            debug!(region = %self.region, "own region replaced, rebinding");
            cx.effect(Effect::BindRegion(self.region.clone()));
            cx.effect(Effect::Rebind(Scope::Region(self.region.clone())));
        } else {
            debug!(region = %self.region, replaced_region = %target, "sibling region replaced, closing");
            self.force_close_now(cx);
            cx.effect(Effect::Rebind(Scope::Region(target.to_string())));
        }
    }
}
