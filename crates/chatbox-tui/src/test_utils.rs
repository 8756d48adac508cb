//! Test utilities for chatbox-tui rendering and integration testing.
//!
//! This module provides helper functions for creating test terminals,
//! rendering the chat screen, converting buffers to strings, and a
//! scripted stand-in for the remote assistant.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chatbox_engine::{AssistantClient, AssistantError, AssistantReply, AssistantRequest, Config};
use ratatui::{backend::TestBackend, Terminal};

use crate::app::App;
use crate::layout::render_shell;

pub use crate::headless::buffer_to_string;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Create a test terminal with custom dimensions.
pub fn create_test_terminal_sized(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).expect("Failed to create test terminal")
}

/// Create a test app with default configuration.
pub fn create_test_app() -> App {
    let mut app = App::new(&Config::default());
    app.set_area(ratatui::layout::Rect::new(0, 0, TEST_WIDTH, TEST_HEIGHT));
    app
}

/// Render the chat screen at the default size and return it as text.
pub fn render_app_to_string(app: &mut App) -> String {
    render_app_to_string_sized(app, TEST_WIDTH, TEST_HEIGHT)
}

/// Render the chat screen at a custom size and return it as text.
pub fn render_app_to_string_sized(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = create_test_terminal_sized(width, height);
    terminal
        .draw(|frame| {
            app.set_area(frame.area());
            render_shell(frame, app);
        })
        .expect("Failed to draw");
    buffer_to_string(terminal.backend().buffer())
}

enum Scripted {
    Reply(String, Duration),
    Fail(String),
}

/// Assistant that answers from a script, one entry per request.
#[derive(Default)]
pub struct ScriptedAssistant {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    #[must_use]
    pub fn reply(self, text: &str) -> Self {
        self.delayed_reply(text, Duration::ZERO)
    }

    /// Queue a successful reply that arrives after `delay`.
    #[must_use]
    pub fn delayed_reply(self, text: &str, delay: Duration) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(text.to_string(), delay));
        self
    }

    /// Queue a failure carrying `message`.
    #[must_use]
    pub fn fail(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(message.to_string()));
        self
    }

    /// Messages received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssistantClient for ScriptedAssistant {
    async fn send(&self, request: AssistantRequest) -> Result<AssistantReply, AssistantError> {
        self.requests.lock().unwrap().push(request.message);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(text, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(AssistantReply::new(text))
            }
            Some(Scripted::Fail(message)) => Err(AssistantError::Remote(message)),
            None => Err(AssistantError::Remote("no scripted reply".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::{
        Composer, ComposerState, EMPTY_SUBTITLE, EMPTY_TITLE, SPEAKING_MARKER, WAITING_TEXT,
    };
    use chatbox_engine::{Effect, SpeechEvent};
    use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

    #[test]
    fn test_render_empty_screen() {
        let mut app = create_test_app();
        let screen = render_app_to_string(&mut app);
        assert!(screen.contains("Virtual AI Chat Box"));
        assert!(screen.contains("Ready to help"));
        assert!(screen.contains(EMPTY_TITLE));
        assert!(screen.contains(EMPTY_SUBTITLE));
        assert!(screen.contains("Type your message..."));
        assert!(screen.contains("[Enter] send"));
    }

    #[test]
    fn test_render_conversation_with_composing_bubble() {
        let mut app = create_test_app();
        app.controller.submit("Hello");
        let screen = render_app_to_string(&mut app);

        assert!(screen.contains("You"));
        assert!(screen.contains("Hello"));
        assert!(screen.contains(WAITING_TEXT));
        assert!(screen.contains("Assistant"));
        assert!(!screen.contains(EMPTY_TITLE));
    }

    #[test]
    fn test_render_speaking_reply() {
        let mut app = create_test_app();
        app.controller.submit("Hello");
        let effects = app
            .controller
            .receive_reply(Ok(AssistantReply::new("Hi there!")));
        let Some(Effect::Speak { id, .. }) = effects.last() else {
            panic!("expected a speak effect");
        };
        app.speech_event(SpeechEvent::Started(*id));

        let screen = render_app_to_string(&mut app);
        assert!(screen.contains("Speaking..."));
        assert_eq!(screen.matches(SPEAKING_MARKER).count(), 1);

        app.speech_event(SpeechEvent::Ended(*id));
        let screen = render_app_to_string(&mut app);
        assert!(screen.contains("Ready to help"));
        assert!(!screen.contains(SPEAKING_MARKER));
    }

    #[test]
    fn test_render_help_overlay() {
        let mut app = create_test_app();
        app.show_help = true;
        let screen = render_app_to_string(&mut app);
        assert!(screen.contains("Help"));
        assert!(screen.contains("Toggle voice"));
    }

    #[test]
    fn test_render_too_small() {
        let mut app = create_test_app();
        let screen = render_app_to_string_sized(&mut app, 20, 5);
        assert!(screen.contains("Terminal too"));
    }

    #[test]
    fn test_composer_snapshot() {
        let state = ComposerState::new();
        let theme = crate::theme::Theme::default();
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        Composer::new(&state, &theme).render(area, &mut buf);

        insta::assert_snapshot!(buffer_to_string(&buf), @r"
        ┌────────────────────────────┐
        │> █Type your messag [ Send ]│
        └────────────────────────────┘
        ");
    }

    #[tokio::test]
    async fn test_scripted_assistant_replays_in_order() {
        let assistant = ScriptedAssistant::new().reply("one").fail("two");
        let first = assistant.send(AssistantRequest::new("a")).await.unwrap();
        assert_eq!(first.message, "one");
        let second = assistant.send(AssistantRequest::new("b")).await.unwrap_err();
        assert_eq!(second.to_string(), "two");
        assert!(assistant.send(AssistantRequest::new("c")).await.is_err());
        assert_eq!(assistant.requests(), vec!["a", "b", "c"]);
    }
}
