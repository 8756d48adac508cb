//! Headless mode for the chatbox TUI.
//!
//! This module provides a way to run the TUI without a real terminal,
//! enabling E2E testing and automation. Terminal events are sent via
//! channels and screen state is captured after each render.

use std::sync::Arc;
use std::time::Duration;

use chatbox_engine::{
    AssistantClient, ChatTurn, Config, Notification, SpeechEventReceiver, SpeechSynthesizer,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::app::App;
use crate::event::Event;
use crate::layout::{render_shell, AppLayout};
use crate::session::Session;

/// Default terminal dimensions for headless mode.
pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

/// State captured from the headless TUI after each render.
#[derive(Debug, Clone, Default)]
pub struct HeadlessState {
    /// Text contents of the terminal buffer.
    pub screen_contents: String,
    /// Conversation so far.
    pub turns: Vec<ChatTurn>,
    /// Whether a reply is pending.
    pub loading: bool,
    /// Whether speech is playing.
    pub speaking: bool,
    /// Auto-speak preference.
    pub auto_speak: bool,
    /// Live toasts, oldest first.
    pub toasts: Vec<Notification>,
    /// Text in the composer.
    pub composer: String,
    /// Screen regions of the last frame.
    pub layout: AppLayout,
    /// Whether the TUI should quit.
    pub should_quit: bool,
    /// Whether help overlay is visible.
    pub show_help: bool,
}

/// Handle to control a headless TUI instance.
///
/// Use this to send events and observe state changes.
pub struct HeadlessHandle {
    event_tx: mpsc::UnboundedSender<Event>,
    state_rx: watch::Receiver<HeadlessState>,
}

impl HeadlessHandle {
    /// Send a terminal event to the TUI.
    ///
    /// Returns `true` if the event was sent successfully.
    pub fn send_event(&self, event: Event) -> bool {
        self.event_tx.send(event).is_ok()
    }

    /// Send a key press.
    pub fn send_key(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.send_event(Event::Key(KeyEvent::new(code, modifiers)))
    }

    /// Type text one character at a time.
    pub fn type_text(&self, text: &str) -> bool {
        text.chars()
            .all(|c| self.send_key(KeyCode::Char(c), KeyModifiers::NONE))
    }

    /// Left-click a cell.
    pub fn click(&self, column: u16, row: u16) -> bool {
        self.send_event(Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }))
    }

    /// Get the current state of the TUI.
    pub fn state(&self) -> HeadlessState {
        self.state_rx.borrow().clone()
    }

    /// Wait until a condition is met on the state.
    ///
    /// Returns the state when the condition is met, or `None` if timed out.
    pub async fn wait_for<F>(&mut self, condition: F, timeout: Duration) -> Option<HeadlessState>
    where
        F: Fn(&HeadlessState) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let state = self.state();
            if condition(&state) {
                return Some(state);
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }

            // A closed channel means the TUI stopped; the last state was
            // already checked above.
            match tokio::time::timeout(remaining, self.state_rx.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) | Err(_) => return None,
            }
        }
    }

    /// Wait for specific text to appear on screen.
    pub async fn wait_for_text(&mut self, text: &str, timeout: Duration) -> Option<HeadlessState> {
        let text = text.to_string();
        self.wait_for(|s| s.screen_contents.contains(&text), timeout)
            .await
    }

    /// Check if the TUI has quit.
    pub fn has_quit(&self) -> bool {
        self.state().should_quit
    }
}

/// Configuration for headless mode.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Terminal width.
    pub width: u16,
    /// Terminal height.
    pub height: u16,
    /// Tick rate in milliseconds.
    pub tick_rate_ms: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tick_rate_ms: 50, // Faster tick rate for testing
        }
    }
}

/// Run the TUI in headless mode.
///
/// Returns a handle to control the TUI and a join handle for the background task.
///
/// # Example
///
/// ```ignore
/// let (mut handle, task) =
///     run_tui_headless(&config, HeadlessConfig::default(), assistant, speech, speech_rx);
///
/// handle.type_text("Hello");
/// handle.send_key(KeyCode::Enter, KeyModifiers::NONE);
/// let state = handle.wait_for_text("Hi there!", Duration::from_secs(1)).await;
///
/// handle.send_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
/// task.await.unwrap();
/// ```
pub fn run_tui_headless(
    config: &Config,
    headless: HeadlessConfig,
    assistant: Arc<dyn AssistantClient>,
    speech: Box<dyn SpeechSynthesizer>,
    speech_events: SpeechEventReceiver,
) -> (HeadlessHandle, JoinHandle<Result<(), String>>) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(HeadlessState::default());

    let app = App::new(config);
    let session = Session::new(assistant, speech, speech_events);

    let task = tokio::spawn(async move {
        run_headless_loop(app, session, headless, event_rx, state_tx)
            .await
            .map_err(|e| e.to_string())
    });

    let handle = HeadlessHandle { event_tx, state_rx };

    (handle, task)
}

async fn run_headless_loop(
    mut app: App,
    mut session: Session,
    config: HeadlessConfig,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    state_tx: watch::Sender<HeadlessState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let backend = TestBackend::new(config.width, config.height);
    let mut terminal = Terminal::new(backend)?;

    let tick_duration = Duration::from_millis(config.tick_rate_ms);

    loop {
        terminal.draw(|frame| {
            app.set_area(frame.area());
            render_shell(frame, &app);
        })?;

        let _ = state_tx.send(capture_state(&app, terminal.backend().buffer()));

        if app.should_quit {
            session.shutdown(&mut app);
            break;
        }

        session.poll(&mut app).await;

        // Wait for an event or tick
        let event = tokio::select! {
            Some(event) = event_rx.recv() => event,
            () = tokio::time::sleep(tick_duration) => Event::Tick,
        };

        let effects = app.handle_event(event);
        session.apply(&mut app, effects);
    }

    Ok(())
}

fn capture_state(app: &App, buffer: &Buffer) -> HeadlessState {
    let controller = &app.controller;
    HeadlessState {
        screen_contents: buffer_to_string(buffer),
        turns: controller.conversation().turns().to_vec(),
        loading: controller.is_loading(),
        speaking: controller.is_speaking(),
        auto_speak: controller.auto_speak(),
        toasts: app.toasts.iter().cloned().collect(),
        composer: app.composer.content().to_string(),
        layout: app.layout(),
        should_quit: app.should_quit,
        show_help: app.show_help,
    }
}

/// Convert a terminal buffer to a string representation.
///
/// Trailing whitespace is trimmed from every row.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buffer.cell((x, y)) {
                result.push_str(cell.symbol());
            }
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}
