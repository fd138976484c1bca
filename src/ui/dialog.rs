use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::document::ZLayer;
use crate::modal::ModalState;
use crate::theme::Theme;
use crate::ui::{Component, Spinner, TriggerList, markup};

/// One visible dialog, drawn as an overlay. Deeper layers sit further inset.
pub struct DialogView<'a> {
    pub region: &'a str,
    pub layer: ZLayer,
    pub state: ModalState,
    pub content: &'a str,
    pub banners_visible: bool,
    pub focused: bool,
}

impl DialogView<'_> {
    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        depth: u16,
        theme: &Theme,
        spinner: &mut Spinner,
        triggers: Option<&mut TriggerList>,
    ) {
        let inset = depth.saturating_mul(4).min(30);
        let popup_area = area.centered(
            Constraint::Percentage(80 - inset),
            Constraint::Percentage(80 - inset),
        );
        frame.render_widget(Clear, popup_area);

        let border = if self.focused {
            theme.border_focused
        } else {
            theme.border
        };
        let block = Block::default()
            .title(format!(" {} · {} · {} ", self.region, self.state, self.layer))
            .title_style(theme.title())
            .borders(Borders::ALL)
            .border_type(theme.border_type)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(theme.base));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let trigger_rows = triggers.as_ref().map_or(0, |list| list.len());
        let [banner_area, content_area, triggers_area] = Layout::vertical([
            Constraint::Length(u16::from(self.banners_visible)),
            Constraint::Fill(1),
            Constraint::Length(if trigger_rows == 0 {
                0
            } else {
                u16::try_from(trigger_rows + 2).unwrap_or(u16::MAX).min(8)
            }),
        ])
        .areas(inner);

        if self.banners_visible {
            frame.render_widget(
                Paragraph::new("The request failed").style(
                    Style::default()
                        .fg(theme.base)
                        .bg(theme.error)
                        .add_modifier(Modifier::BOLD),
                ),
                banner_area,
            );
        }

        if markup::is_loading(self.content) {
            spinner.render(frame, content_area, theme);
        } else {
            let lines: Vec<Line> = markup::text_lines(self.content)
                .into_iter()
                .map(Line::from)
                .collect();
            frame.render_widget(
                Paragraph::new(lines)
                    .style(Style::default().fg(theme.text))
                    .wrap(Wrap { trim: true }),
                content_area,
            );
        }

        if let Some(triggers) = triggers
            && trigger_rows > 0
        {
            triggers.render(frame, triggers_area, theme);
        }
    }
}
