use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use crate::config::{KeyResolver, NavAction};
use crate::document::{Element, NodeId};
use crate::theme::Theme;
use crate::ui::{Component, Handled, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Activate(NodeId),
}

/// Selectable list of the links, buttons and forms that start loads.
pub struct TriggerList {
    title: &'static str,
    items: Vec<Element>,
    state: ListState,
    resolver: Arc<KeyResolver>,
}

impl TriggerList {
    pub fn new(title: &'static str, resolver: Arc<KeyResolver>) -> Self {
        Self {
            title,
            items: Vec::new(),
            state: ListState::default(),
            resolver,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> Option<&Element> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    /// Replace the rows, keeping the selection on the same node when it survived.
    pub fn set_items(&mut self, items: Vec<Element>) {
        let selected = self.selected().map(|element| element.node);
        self.items = items;

        let index = selected
            .and_then(|node| self.items.iter().position(|element| element.node == node))
            .or_else(|| {
                let previous = self.state.selected()?;
                (!self.items.is_empty()).then(|| previous.min(self.items.len() - 1))
            })
            .or_else(|| (!self.items.is_empty()).then_some(0));
        self.state.select(index);
    }

    fn row(element: &Element, theme: &Theme) -> ListItem<'static> {
        let label = if element.label.is_empty() {
            element.action.clone().unwrap_or_default()
        } else {
            element.label.clone()
        };
        let target = element.target.as_deref().unwrap_or("-");
        let label_style = if element.disabled {
            Style::default()
                .fg(theme.overlay)
                .add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default().fg(theme.text)
        };
        let kind = if element.is_form() { "form" } else { "link" };

        ListItem::new(Line::from(vec![
            Span::styled(label, label_style),
            Span::styled(format!("  {kind} → {target}"), Style::default().fg(theme.subtext)),
        ]))
    }
}

impl Component for TriggerList {
    type Output = TriggerEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<Handled<Self::Output>> {
        if self.resolver.matches_nav(&key, NavAction::Down) {
            self.state.select_next();
            return Ok(Handled::Consumed);
        }
        if self.resolver.matches_nav(&key, NavAction::Up) {
            self.state.select_previous();
            return Ok(Handled::Consumed);
        }
        if self.resolver.matches_nav(&key, NavAction::Select) {
            return Ok(self
                .selected()
                .map_or(Handled::Ignored, |element| {
                    TriggerEvent::Activate(element.node).into()
                }));
        }
        Ok(Handled::Ignored)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|element| Self::row(element, theme))
            .collect();

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(theme.title())
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(theme.border));

        let list = List::new(items)
            .block(block)
            .highlight_style(theme.selection())
            .highlight_symbol("> ");

        frame.render_stateful_widget(list, area, &mut self.state);
    }
}
