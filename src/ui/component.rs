use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::theme::Theme;
use crate::ui::{Handled, Result};

/// Interactive UI building block.
///
/// Components handle key events and emit generic outputs; they know nothing
/// about the page.
pub trait Component {
    type Output;

    /// Returns `Ignored` when the parent should process the key instead.
    fn handle_key(&mut self, key: KeyEvent) -> Result<Handled<Self::Output>> {
        _ = key;
        Ok(Handled::Ignored)
    }

    /// Called on each tick for animations.
    fn on_tick(&mut self) {}

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);
}
