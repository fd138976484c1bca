use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::config::actions::{GlobalAction, ModalAction, NavAction};
use crate::config::key::KeyBinding;
use crate::config::keybindings::KeybindingsConfig;

pub struct KeyResolver {
    pub keybindings: Arc<KeybindingsConfig>,
}

impl KeyResolver {
    pub const fn new(keybindings: Arc<KeybindingsConfig>) -> Self {
        Self { keybindings }
    }

    fn global(&self, action: GlobalAction) -> &KeyBinding {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => &kb.quit,
        }
    }

    fn nav(&self, action: NavAction) -> &KeyBinding {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => &kb.up,
            NavAction::Down => &kb.down,
            NavAction::Select => &kb.select,
        }
    }

    fn modal(&self, action: ModalAction) -> &KeyBinding {
        let kb = &self.keybindings.modal;
        match action {
            ModalAction::Close => &kb.close,
            ModalAction::Retry => &kb.retry,
        }
    }

    pub fn matches_global(&self, event: &KeyEvent, action: GlobalAction) -> bool {
        self.global(action).matches(event)
    }

    pub fn matches_nav(&self, event: &KeyEvent, action: NavAction) -> bool {
        self.nav(action).matches(event)
    }

    pub fn matches_modal(&self, event: &KeyEvent, action: ModalAction) -> bool {
        self.modal(action).matches(event)
    }

    pub fn display_global(&self, action: GlobalAction) -> String {
        self.global(action).display()
    }

    pub fn display_nav(&self, action: NavAction) -> String {
        self.nav(action).display()
    }

    pub fn display_modal(&self, action: ModalAction) -> String {
        self.modal(action).display()
    }
}
