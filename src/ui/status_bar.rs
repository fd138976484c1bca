use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::config::{GlobalAction, KeyResolver, ModalAction, NavAction};
use crate::core::PageNotice;
use crate::modal::ModalState;
use crate::theme::Theme;

pub struct StatusBar {
    last_notice: Option<PageNotice>,
    resolver: Arc<KeyResolver>,
}

impl StatusBar {
    pub const fn new(resolver: Arc<KeyResolver>) -> Self {
        Self {
            last_notice: None,
            resolver,
        }
    }

    pub fn push(&mut self, notice: PageNotice) {
        self.last_notice = Some(notice);
    }

    pub const fn last_notice(&self) -> Option<&PageNotice> {
        self.last_notice.as_ref()
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        topmost: Option<(&str, ModalState)>,
    ) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(theme.border));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [status_area, keys_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(inner);

        let label_style = Style::default().fg(theme.overlay);
        let mut spans = match topmost {
            Some((region, state)) => vec![
                Span::styled("dialog ", label_style),
                Span::styled(
                    region.to_string(),
                    Style::default()
                        .fg(theme.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {state}"), Style::default().fg(theme.text)),
            ],
            None => vec![Span::styled("no dialog open", label_style)],
        };
        if let Some(notice) = &self.last_notice {
            let (text, color) = match notice {
                PageNotice::ModalTarget { region } => (format!("loading into {region}"), theme.secondary),
                PageNotice::LoadFailed { region, reason } => (format!("{region}: {reason}"), theme.error),
            };
            spans.push(Span::styled("  │  ", label_style));
            spans.push(Span::styled(text, Style::default().fg(color)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), status_area);

        let hints = [
            (self.resolver.display_nav(NavAction::Select), "open"),
            (self.resolver.display_modal(ModalAction::Close), "close"),
            (self.resolver.display_modal(ModalAction::Retry), "retry"),
            (self.resolver.display_global(GlobalAction::Quit), "quit"),
        ];
        let hints: Vec<Span> = hints
            .into_iter()
            .flat_map(|(key, action)| {
                [
                    Span::styled(format!("<{key}>"), Style::default().fg(theme.accent)),
                    Span::styled(format!(" {action}  "), label_style),
                ]
            })
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(hints)).alignment(ratatui::layout::Alignment::Right),
            keys_area,
        );
    }
}
