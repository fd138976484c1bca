use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::TimingConfig;
use crate::core::command::{self, Command, DelayCmd};
use crate::core::{PageMsg, PageNotice};
use crate::document::{Document, Scope};
use crate::sync::CloseLock;

/// Follow-up work a controller asks the page to do once its hook returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Bind the triggers found in `scope`.
    Rebind(Scope),
    /// Bind the region node itself to its controller.
    BindRegion(String),
}

/// What a controller may touch while handling a hook.
pub struct ControllerCx<'a> {
    pub document: &'a Document,
    pub close_lock: &'a CloseLock,
    pub timing: &'a TimingConfig,
    tx: &'a UnboundedSender<PageMsg>,
    notices: &'a mut Vec<PageNotice>,
    effects: Vec<Effect>,
}

impl<'a> ControllerCx<'a> {
    pub const fn new(
        document: &'a Document,
        close_lock: &'a CloseLock,
        timing: &'a TimingConfig,
        tx: &'a UnboundedSender<PageMsg>,
        notices: &'a mut Vec<PageNotice>,
    ) -> Self {
        Self {
            document,
            close_lock,
            timing,
            tx,
            notices,
            effects: Vec::new(),
        }
    }

    pub fn sender(&self) -> UnboundedSender<PageMsg> {
        self.tx.clone()
    }

    pub fn spawn(&self, command: impl Command) {
        command::spawn(Box::new(command));
    }

    /// Deliver `msg` back to the page after `delay`.
    pub fn after(&self, delay: Duration, msg: PageMsg) {
        self.spawn(DelayCmd::new(delay, msg, self.sender()));
    }

    pub fn notify(&mut self, notice: PageNotice) {
        self.notices.push(notice);
    }

    pub fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn into_effects(self) -> Vec<Effect> {
        self.effects
    }
}
