use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Block;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, GlobalAction, KeyResolver, ModalAction};
use crate::core::PageMsg;
use crate::core::event::Event;
use crate::core::tui::Tui;
use crate::document::{Element, Scope, ZLayer};
use crate::modal::ModalState;
use crate::page::Page;
use crate::theme::Theme;
use crate::ui::{Component, DialogView, Spinner, StatusBar, TriggerEvent, TriggerList};

const FRAME_RATE: f64 = 30.0;
const TICK_RATE: f64 = 8.0;

enum Input {
    Terminal(Event),
    Page(PageMsg),
    Closed,
}

pub struct App {
    page: Page,
    theme: Theme,
    resolver: Arc<KeyResolver>,
    page_triggers: TriggerList,
    dialog_triggers: TriggerList,
    spinner: Spinner,
    status_bar: StatusBar,
    should_quit: bool,
}

impl App {
    pub fn new(page: Page, config: &AppConfig) -> Self {
        let resolver = Arc::new(KeyResolver::new(Arc::new(config.keybindings.clone())));
        let mut app = Self {
            page,
            theme: Theme::named(&config.theme.name),
            page_triggers: TriggerList::new("Page", Arc::clone(&resolver)),
            dialog_triggers: TriggerList::new("Actions", Arc::clone(&resolver)),
            spinner: Spinner::default(),
            status_bar: StatusBar::new(Arc::clone(&resolver)),
            resolver,
            should_quit: false,
        };
        app.sync();
        app
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = Tui::new(FRAME_RATE, TICK_RATE)?;
        tui.enter()?;
        info!("terminal ready");

        while !self.should_quit {
            let input = tokio::select! {
                event = tui.next_event() => event.map_or(Input::Closed, Input::Terminal),
                msg = self.page.next_message() => msg.map_or(Input::Closed, Input::Page),
            };

            match input {
                Input::Terminal(Event::Render) => {
                    tui.draw(|frame| self.render(frame))?;
                }
                Input::Terminal(Event::Resize(width, height)) => {
                    tui.resize(Rect::new(0, 0, width, height))?;
                }
                Input::Terminal(event) => self.handle_event(event)?,
                Input::Page(msg) => self.page.update(msg),
                Input::Closed => break,
            }
            self.sync();
        }

        tui.exit()?;
        info!("terminal closed");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> color_eyre::Result<()> {
        match event {
            Event::Quit => self.should_quit = true,
            Event::Tick => self.spinner.on_tick(),
            Event::Key(key) => self.handle_key(key)?,
            Event::Error(error) => warn!(%error, "terminal event error"),
            Event::Init | Event::Render | Event::Resize(..) => {}
        }
        Ok(())
    }

    /// The topmost open dialog takes keys first; otherwise they drive the page list.
    fn handle_key(&mut self, key: KeyEvent) -> color_eyre::Result<()> {
        if self.resolver.matches_global(&key, GlobalAction::Quit) {
            self.should_quit = true;
            return Ok(());
        }

        let topmost = self
            .page
            .topmost_open()
            .map(|controller| controller.region().to_string());
        let handled = match topmost {
            Some(region) => {
                if self.resolver.matches_modal(&key, ModalAction::Close) {
                    let outcome = self.page.close(&region);
                    debug!(%region, ?outcome, "close requested");
                    return Ok(());
                }
                if self.resolver.matches_modal(&key, ModalAction::Retry) {
                    self.page.retry(&region);
                    return Ok(());
                }
                self.dialog_triggers.handle_key(key)?
            }
            None => self.page_triggers.handle_key(key)?,
        };

        if let Some(TriggerEvent::Activate(node)) = handled.event() {
            self.page.activate(node);
        }
        Ok(())
    }

    /// Pull notices and refresh both trigger lists from the document.
    fn sync(&mut self) {
        for notice in self.page.take_notices() {
            self.status_bar.push(notice);
        }

        let dialogs = self.page.registry().regions();
        let document = self.page.document();
        let outside: Vec<Element> = document
            .triggers(&Scope::Document)
            .into_iter()
            .filter(|element| {
                element
                    .region
                    .as_ref()
                    .is_none_or(|region| !dialogs.contains(region))
            })
            .collect();
        let inside = self
            .page
            .topmost_open()
            .map(|controller| document.triggers(&Scope::Region(controller.region().to_string())))
            .unwrap_or_default();

        self.page_triggers.set_items(outside);
        self.dialog_triggers.set_items(inside);
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(self.theme.base)), area);
        let [body, status] = Layout::vertical([Constraint::Fill(1), Constraint::Length(2)]).areas(area);

        self.page_triggers.render(frame, body, &self.theme);

        let mut open: Vec<(String, ZLayer, ModalState)> = self
            .page
            .registry()
            .controllers()
            .filter(|controller| controller.is_open())
            .map(|controller| (controller.region().to_string(), controller.layer(), controller.state()))
            .collect();
        open.sort_by_key(|(_, layer, _)| *layer);

        let document = self.page.document();
        let last = open.len().saturating_sub(1);
        for (depth, (region, layer, state)) in open.iter().enumerate() {
            let content = document.region_content(region).unwrap_or_default();
            let banners_visible = document
                .dialog(region)
                .is_some_and(|dialog| dialog.banners_visible);
            let focused = depth == last;
            let view = DialogView {
                region,
                layer: *layer,
                state: *state,
                content: &content,
                banners_visible,
                focused,
            };
            view.render(
                frame,
                body,
                u16::try_from(depth).unwrap_or(u16::MAX),
                &self.theme,
                &mut self.spinner,
                focused.then_some(&mut self.dialog_triggers),
            );
        }

        let topmost = open.last().map(|(region, _, state)| (region.as_str(), *state));
        self.status_bar.render(frame, status, &self.theme, topmost);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyModifiers};
    use http::StatusCode;

    use super::*;
    use crate::config::TimingConfig;
    use crate::core::PageNotice;
    use crate::document::Document;
    use crate::modal::CloseOutcome;
    use crate::transport::scripted::ScriptedTransport;
    use crate::transport::{FetchResponse, Transport};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let transport = Arc::new(ScriptedTransport::new(Duration::from_millis(50)));
        transport.respond(
            "/help",
            FetchResponse::new(
                StatusCode::OK,
                r#"<p>Help</p><a href="/help/more" data-target-region="help">More</a>"#,
            )
            .with_content_type("text/html"),
        );
        let page = Page::new(
            Document::parse(
                r#"
                <a href="/help" data-target-region="help">Help</a>
                <div data-modal><section data-content-region id="help"></section></div>
                "#,
            ),
            transport as Arc<dyn Transport>,
            TimingConfig::default(),
            ZLayer::DEFAULT,
        );
        App::new(page, &AppConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_open_and_close_topmost_dialog() {
        let mut app = app();
        assert_eq!(app.page_triggers.len(), 1);

        app.handle_key(key(KeyCode::Enter)).unwrap();
        app.sync();
        assert!(matches!(
            app.status_bar.last_notice(),
            Some(PageNotice::ModalTarget { region }) if region == "help"
        ));
        // Still opening, the close is dropped.
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.page.controller("help").unwrap().state(), ModalState::Opening);

        app.page.run_for(Duration::from_millis(300)).await;
        app.sync();
        assert_eq!(app.dialog_triggers.len(), 1);

        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.page.controller("help").unwrap().state(), ModalState::Closing);
        assert_eq!(app.page.close("help"), Some(CloseOutcome::AlreadyClosing));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_key_stops_the_app() {
        let mut app = app();

        app.handle_key(key(KeyCode::Char('q'))).unwrap();

        assert!(app.should_quit);
    }
}
