//! Application state and update logic for the chatbox TUI.
//!
//! [`App`] turns terminal input into controller calls. Every handler
//! returns the [`Effect`]s the controller asked for; the session runs them.

use crate::event::{key_to_action, Action, Event};
use crate::layout::AppLayout;
use crate::theme::Theme;
use crate::widgets::{
    Composer, ComposerOutcome, ComposerState, MessageListState, ToastStack, WHEEL_LINES,
};
use chatbox_engine::{
    AssistantError, AssistantReply, Config, ConversationController, Effect, Notification,
    SpeechEvent,
};
use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use tracing::debug;

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// Conversation and request lifecycle.
    pub controller: ConversationController,
    /// Message being typed.
    pub composer: ComposerState,
    /// Scroll position of the message list.
    pub messages: MessageListState,
    /// Live notifications.
    pub toasts: ToastStack,
    pub theme: Theme,
    /// Ticks since start, drives the composing animation.
    pub tick: u64,
    pub show_help: bool,
    pub should_quit: bool,
    /// Whether the terminal reports modified Enter keys.
    pub keyboard_enhanced: bool,
    /// Last known terminal area.
    area: Rect,
}

impl App {
    /// Create the app from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            controller: ConversationController::new(config.auto_speak),
            composer: ComposerState::new(),
            messages: MessageListState::new(),
            toasts: ToastStack::new(config.tick_rate_ms),
            theme: Theme::from_name(config.theme),
            tick: 0,
            show_help: false,
            should_quit: false,
            keyboard_enhanced: false,
            area: Rect::default(),
        }
    }

    /// Record the terminal area the next frame is drawn into.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    /// Screen regions for the last known terminal area.
    pub fn layout(&self) -> AppLayout {
        self.layout_in(self.area)
    }

    /// Screen regions for `area`.
    pub fn layout_in(&self, area: Rect) -> AppLayout {
        AppLayout::new(area, Composer::content_rows(&self.composer, area.width))
    }

    /// Handle one terminal event.
    pub fn handle_event(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Paste(text) => {
                self.handle_paste(&text);
                Vec::new()
            }
            Event::Tick => {
                self.on_tick();
                Vec::new()
            }
            Event::Resize(width, height) => {
                self.set_area(Rect::new(0, 0, width, height));
                Vec::new()
            }
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let action = key_to_action(key);

        if self.show_help {
            // Any key closes help; quit still quits.
            self.show_help = false;
            return if action == Action::Quit {
                self.handle_action(action)
            } else {
                Vec::new()
            };
        }

        if action != Action::None {
            return self.handle_action(action);
        }

        match self.composer.handle_key(key, self.controller.is_loading()) {
            ComposerOutcome::Submitted(text) => self.send(&text),
            ComposerOutcome::Handled | ComposerOutcome::Ignored => Vec::new(),
        }
    }

    /// Handle an application action.
    pub fn handle_action(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Quit => {
                self.should_quit = true;
                return self.controller.shutdown();
            }
            Action::Help => self.show_help = !self.show_help,
            Action::Back => {
                self.toasts.dismiss_latest();
            }
            Action::ToggleVoice => return self.controller.toggle_auto_speak(),
            Action::ScrollUp => self.messages.scroll_up(1),
            Action::ScrollDown => self.messages.scroll_down(1),
            Action::PageUp => self.messages.page_up(),
            Action::PageDown => self.messages.page_down(),
            Action::ScrollToBottom => self.messages.scroll_to_bottom(),
            Action::None => {}
        }
        Vec::new()
    }

    /// Handle a mouse event: wheel scrolling and clicks on `[ Send ]`.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Vec<Effect> {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.messages.scroll_up(WHEEL_LINES),
            MouseEventKind::ScrollDown => self.messages.scroll_down(WHEEL_LINES),
            MouseEventKind::Down(MouseButton::Left) => {
                let at = Position::new(mouse.column, mouse.row);
                if self.layout().send_button.contains(at) {
                    return self.click_send();
                }
            }
            _ => {}
        }
        Vec::new()
    }

    /// Insert pasted text into the composer.
    pub fn handle_paste(&mut self, text: &str) {
        if !self.controller.is_loading() {
            self.composer.insert_str(text);
        }
    }

    /// Same as pressing Enter in the composer.
    pub fn click_send(&mut self) -> Vec<Effect> {
        match self.composer.submit(self.controller.is_loading()) {
            Some(text) => self.send(&text),
            None => Vec::new(),
        }
    }

    fn send(&mut self, text: &str) -> Vec<Effect> {
        let effects = self.controller.submit(text);
        self.messages.observe(self.controller.conversation().len());
        effects
    }

    /// Resolve the pending assistant request.
    pub fn receive_reply(
        &mut self,
        result: Result<AssistantReply, AssistantError>,
    ) -> Vec<Effect> {
        let effects = self.controller.receive_reply(result);
        self.messages.observe(self.controller.conversation().len());
        effects
    }

    /// Apply a speech lifecycle signal.
    pub fn speech_event(&mut self, event: SpeechEvent) {
        self.controller.speech_event(event);
    }

    /// Show a notification.
    pub fn notify(&mut self, notification: Notification) {
        debug!(title = %notification.title, "notification");
        self.toasts.push(notification);
    }

    /// Advance animations and expire toasts.
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        self.toasts.tick();
    }
}
