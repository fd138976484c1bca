//! Page coordinator.
//!
//! The [`Page`] owns the document, every modal controller and the binding
//! table. It turns element activations into loads, dispatches load hooks to
//! the bound controllers, applies the default render when no controller
//! claimed the response, and feeds completed async work back into the
//! controllers one message at a time through [`Page::update`].

use std::sync::Arc;

use color_eyre::eyre::eyre;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::config::TimingConfig;
use crate::core::command::{self, FetchCmd};
use crate::core::{PageMsg, PageNotice};
use crate::document::{Document, Element, NodeId, Scope, ZLayer, attr, extract_region};
use crate::modal::{
    CloseOutcome, ControllerCx, DispatchFlags, Effect, ModalController, Origin,
};
use crate::registry::{Binding, ModalRegistry};
use crate::stream::{StreamAction, StreamVerb, parse_stream};
use crate::sync::{AbortSignal, CloseLock, OWN_ABORT_REASON};
use crate::transport::{FetchRequest, FetchResponse, Transport, TransportError};

pub struct Page {
    document: Document,
    registry: ModalRegistry,
    close_lock: CloseLock,
    transport: Arc<dyn Transport>,
    timing: TimingConfig,
    default_layer: ZLayer,
    msg_tx: UnboundedSender<PageMsg>,
    msg_rx: UnboundedReceiver<PageMsg>,
    notices: Vec<PageNotice>,
}

impl Page {
    /// Attach a controller to every dialog of `document` and bind its triggers.
    pub fn new(
        document: Document,
        transport: Arc<dyn Transport>,
        timing: TimingConfig,
        default_layer: ZLayer,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let mut page = Self {
            document,
            registry: ModalRegistry::new(),
            close_lock: CloseLock::new(),
            transport,
            timing,
            default_layer,
            msg_tx,
            msg_rx,
            notices: Vec::new(),
        };

        page.sync_controllers();
        let bound = page.registry.bind_all(&page.document, &Scope::Document);
        info!(
            dialogs = page.registry.regions().len(),
            bound, "page attached"
        );
        page
    }

    /// Fetch `url` and build a page from the returned markup.
    pub async fn load(
        transport: Arc<dyn Transport>,
        url: &str,
        timing: TimingConfig,
        default_layer: ZLayer,
    ) -> color_eyre::Result<Self> {
        let response = transport
            .fetch(FetchRequest::get(url), AbortSignal::detached())
            .await?;
        if !response.is_success() {
            return Err(eyre!("loading {url} failed with status {}", response.status));
        }

        let document = Document::parse(&response.text());
        Ok(Self::new(document, transport, timing, default_layer))
    }

    // ===== Accessors =====

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn registry(&self) -> &ModalRegistry {
        &self.registry
    }

    pub fn controller(&self, region: &str) -> Option<&ModalController> {
        self.registry.get(region)
    }

    pub const fn close_lock(&self) -> &CloseLock {
        &self.close_lock
    }

    pub fn take_notices(&mut self) -> Vec<PageNotice> {
        std::mem::take(&mut self.notices)
    }

    /// The visible dialog on the highest layer.
    pub fn topmost_open(&self) -> Option<&ModalController> {
        self.registry
            .controllers()
            .filter(|controller| controller.is_open())
            .max_by_key(|controller| controller.layer())
    }

    // ===== Lifecycle =====

    pub fn attach(&mut self, controller: ModalController) {
        let region = controller.region().to_string();
        if let Some(mut previous) = self.registry.attach(controller) {
            previous.disconnect();
        }
        self.with_controller(&region, |controller, cx| controller.connect(cx));
        self.registry.bind_region(&self.document, &region);
    }

    pub fn detach(&mut self, region: &str) -> Option<ModalController> {
        let mut controller = self.registry.detach(region)?;
        controller.disconnect();
        Some(controller)
    }

    fn with_controller<R>(
        &mut self,
        region: &str,
        f: impl FnOnce(&mut ModalController, &mut ControllerCx<'_>) -> R,
    ) -> Option<R> {
        let controller = self.registry.get_mut(region)?;
        let mut cx = ControllerCx::new(
            &self.document,
            &self.close_lock,
            &self.timing,
            &self.msg_tx,
            &mut self.notices,
        );
        let result = f(controller, &mut cx);
        let effects = cx.into_effects();
        self.apply_effects(effects);
        Some(result)
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Rebind(scope) => self.rebind(&scope),
                Effect::BindRegion(region) => {
                    self.registry.bind_region(&self.document, &region);
                }
            }
        }
    }

    /// Attach a controller to every dialog without one and detach those
    /// whose dialog left the document. Returns whether anything was attached.
    fn sync_controllers(&mut self) -> bool {
        let dialogs = self.document.dialogs();
        for region in self.registry.regions() {
            if !dialogs.iter().any(|dialog| dialog.region == region) {
                info!(%region, "dialog left the page");
                self.detach(&region);
            }
        }

        let mut attached = false;
        for dialog in dialogs {
            if self.registry.contains(&dialog.region) {
                continue;
            }
            let layer = dialog.layer.unwrap_or(self.default_layer);
            self.attach(ModalController::new(dialog.region, layer));
            attached = true;
        }
        attached
    }

    fn rebind(&mut self, scope: &Scope) {
        // a new controller may be the target of triggers anywhere on the page
        let whole_page = Scope::Document;
        let scope = if self.sync_controllers() { &whole_page } else { scope };
        let pruned = self.registry.prune(&self.document);
        let bound = self.registry.bind_all(&self.document, scope);
        debug!(?scope, pruned, bound, "rebound triggers");
    }

    // ===== User actions =====

    /// Activate a trigger: click a link or button, or submit a form.
    pub fn activate(&mut self, node: NodeId) -> bool {
        let Some(element) = self.document.element(node) else {
            warn!(%node, "activated node is gone");
            return false;
        };
        self.activate_element(element)
    }

    fn activate_element(&mut self, element: Element) -> bool {
        let node = element.node;
        if element.disabled {
            debug!(%node, "ignoring disabled trigger");
            return false;
        }
        let Some(request) = FetchRequest::for_element(&element) else {
            warn!(%node, "trigger has no destination");
            return false;
        };

        // a trigger re-issued after it left the page reports to its target
        let bound_to = self
            .registry
            .binding(node)
            .map(|binding| binding.region().to_string())
            .or_else(|| {
                element
                    .declared_target()
                    .filter(|target| self.registry.contains(target))
                    .map(str::to_string)
            });
        let origin = if element.is_form() {
            if let Some(region) = &bound_to {
                self.with_controller(region, |controller, _| controller.on_submit_start(&element));
            }
            Origin::Form(element)
        } else {
            if let Some(region) = &bound_to {
                self.with_controller(region, |controller, cx| controller.on_click(cx, &element));
            }
            match element.target {
                Some(target) => Origin::Region(target),
                None => return false,
            }
        };

        let signal = self
            .dispatch_before_request(&origin)
            .unwrap_or_else(AbortSignal::detached);
        command::spawn(Box::new(FetchCmd::new(
            Arc::clone(&self.transport),
            request,
            signal,
            origin,
            self.msg_tx.clone(),
        )));
        true
    }

    pub fn close(&mut self, region: &str) -> Option<CloseOutcome> {
        self.with_controller(region, ModalController::close)
    }

    /// Issue the dialog's last load again. Returns whether a load started;
    /// when none did, the region keeps what it shows.
    pub fn retry(&mut self, region: &str) -> bool {
        let Some(trigger) = self
            .with_controller(region, |controller, cx| controller.retry_trigger(cx))
            .flatten()
        else {
            return false;
        };
        if !self.activate_element(trigger) {
            return false;
        }
        self.with_controller(region, |controller, cx| controller.set_loading(cx));
        true
    }

    /// Apply out-of-band stream actions as if a response had carried them.
    pub fn push_stream(&mut self, actions: Vec<StreamAction>) {
        self.apply_stream(actions);
    }

    // ===== Messages =====

    pub async fn next_message(&mut self) -> Option<PageMsg> {
        self.msg_rx.recv().await
    }

    pub fn update(&mut self, msg: PageMsg) {
        debug!(msg = msg.label(), "page update");
        match msg {
            PageMsg::OpenSettled { region } => {
                self.with_controller(&region, |controller, _| controller.on_open_settled());
            }
            PageMsg::HideSettled { region } => {
                self.with_controller(&region, ModalController::on_hide_settled);
            }
            PageMsg::CloseSettled { region, settled } => {
                self.with_controller(&region, |controller, _| controller.on_close_settled(settled));
            }
            PageMsg::DeferredOpen { region, signal } => {
                self.with_controller(&region, |controller, cx| {
                    controller.on_deferred_open(cx, &signal);
                });
            }
            PageMsg::ForceCloseTick { region } => {
                self.with_controller(&region, ModalController::on_force_close_tick);
            }
            PageMsg::ReleaseForceClose { region, generation } => {
                self.with_controller(&region, |controller, _| {
                    controller.on_release_force_close(generation);
                });
            }
            PageMsg::TransportCloseDue { region } => {
                self.with_controller(&region, ModalController::on_transport_close_due);
            }
            PageMsg::RegionReplaced {
                watcher,
                target,
                own,
                replaced,
            } => {
                self.with_controller(&watcher, |controller, cx| {
                    controller.on_region_replaced(cx, &target, own, replaced);
                });
            }
            PageMsg::Stream(actions) => self.apply_stream(actions),
            PageMsg::Response {
                origin,
                signal,
                response,
            } => self.handle_response(&origin, &signal, &response),
            PageMsg::TransportFailed {
                origin,
                signal: _,
                error,
            } => self.handle_transport_error(&origin, &error),
        }
    }

    // ===== Dispatch =====

    /// Controllers an event from `origin` reaches, in dispatch order.
    fn listeners(&self, origin: &Origin) -> Vec<String> {
        let region_listener = |region: &str| {
            let node = self.document.region(region)?.node;
            match self.registry.binding(node)? {
                Binding::Region { region } => Some(region.clone()),
                Binding::Form { .. } | Binding::Navigation { .. } => None,
            }
        };

        let mut listeners = Vec::new();
        match origin {
            Origin::Region(region) => listeners.extend(region_listener(region)),
            Origin::Form(form) => {
                if let Some(binding) = self.registry.binding(form.node) {
                    listeners.push(binding.region().to_string());
                }
                if let Some(enclosing) = form.region.as_deref().and_then(region_listener)
                    && !listeners.contains(&enclosing)
                {
                    listeners.push(enclosing);
                }
            }
        }
        listeners
    }

    fn dispatch_before_request(&mut self, origin: &Origin) -> Option<AbortSignal> {
        let mut signal = None;
        for region in self.listeners(origin) {
            if let Some(claimed) = self
                .with_controller(&region, |controller, cx| controller.on_before_request(cx, origin))
                .flatten()
            {
                signal = Some(claimed);
            }
        }
        signal
    }

    fn handle_response(&mut self, origin: &Origin, signal: &AbortSignal, response: &FetchResponse) {
        if signal.is_aborted() {
            let reason = signal.reason().unwrap_or(OWN_ABORT_REASON).to_string();
            self.handle_transport_error(origin, &TransportError::Aborted(reason));
            return;
        }

        let mut flags = DispatchFlags::default();
        for region in self.listeners(origin) {
            if flags.propagation_stopped {
                break;
            }
            self.with_controller(&region, |controller, cx| {
                controller.on_before_response(cx, origin, signal, response, &mut flags);
            });
        }

        if flags.default_prevented || flags.handled {
            return;
        }
        self.render_response(origin, response);
    }

    fn handle_transport_error(&mut self, origin: &Origin, error: &TransportError) {
        let listeners = self.listeners(origin);
        if listeners.is_empty() {
            warn!(region = ?origin.target(), %error, "unclaimed load failed");
        }
        for region in listeners {
            self.with_controller(&region, |controller, cx| controller.on_transport_error(cx, error));
        }
    }

    // ===== Default render =====

    fn render_response(&mut self, origin: &Origin, response: &FetchResponse) {
        if response.is_stream() {
            self.apply_stream(parse_stream(&response.text()));
            return;
        }

        let Some(target) = origin.target().map(str::to_string) else {
            return;
        };
        if self.document.region(&target).is_none() {
            warn!(region = %target, "response targets a region that is not on the page");
            return;
        }

        let body = response.text();
        let content = extract_region(&body, &target).unwrap_or(body);
        self.document.set_region_content(&target, &content);
        self.document
            .set_region_attribute(&target, attr::COMPLETE, "");
        self.rebind(&Scope::Region(target));
    }

    fn apply_stream(&mut self, actions: Vec<StreamAction>) {
        for mut action in actions {
            for region in self.registry.regions() {
                self.with_controller(&region, |controller, cx| {
                    controller.intercept_stream(cx, &mut action);
                });
            }
            self.render_stream(&action);
        }
    }

    fn render_stream(&mut self, action: &StreamAction) {
        let Some(payload) = &action.payload else {
            debug!(region = %action.target, "stream action without template");
            return;
        };

        let applied = match action.verb {
            StreamVerb::Replace => self
                .document
                .replace_region(&action.target, payload)
                .is_some(),
            StreamVerb::Update => self
                .document
                .set_region_content(&action.target, &payload.content),
        };
        if !applied {
            warn!(region = %action.target, verb = %action.verb, "stream target is not on the page");
            return;
        }

        self.registry.bind_region(&self.document, &action.target);
        self.rebind(&Scope::Region(action.target.clone()));
    }

    /// Process messages until `duration` has passed.
    #[cfg(test)]
    pub(crate) async fn run_for(&mut self, duration: std::time::Duration) {
        let deadline = tokio::time::Instant::now() + duration;
        loop {
            let msg = tokio::select! {
                biased;
                msg = self.msg_rx.recv() => msg,
                () = tokio::time::sleep_until(deadline) => None,
            };
            match msg {
                Some(msg) => self.update(msg),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests;
