//! chatbox-tui: Terminal UI for the chatbox client
//!
//! This crate provides the TUI layer for chatbox, including:
//! - The chat screen (header, message list, composer, toasts)
//! - Effect execution against the assistant and speech backends
//! - Headless mode for testing and automation

mod app;
mod event;
pub mod headless;
mod layout;
mod session;
#[cfg(test)]
pub mod test_utils;
mod text;
mod theme;
pub mod widgets;

pub use app::App;
pub use event::{key_to_action, Action, Event, EventHandler};
pub use chatbox_engine;
pub use layout::AppLayout;
pub use session::Session;
pub use theme::Theme;

use std::io::{self, stdout};
use std::sync::Arc;

use chatbox_engine::{AssistantClient, Config, SpeechEventReceiver, SpeechSynthesizer};
use crossterm::{
    cursor::Show as ShowCursor,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

/// RAII guard for terminal state restoration.
struct TerminalGuard {
    keyboard_enhanced: bool,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.keyboard_enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(
            stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen,
            ShowCursor
        );
    }
}

/// Run the TUI application.
///
/// This is the main entry point for the TUI. It sets up the terminal,
/// runs the event loop, and restores the terminal on exit.
pub async fn run_tui(
    config: &Config,
    assistant: Arc<dyn AssistantClient>,
    speech: Box<dyn SpeechSynthesizer>,
    speech_events: SpeechEventReceiver,
) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let mut guard = TerminalGuard {
        keyboard_enhanced: false,
    };

    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;

    // Shift+Enter is only distinguishable from Enter with the kitty protocol
    if matches!(supports_keyboard_enhancement(), Ok(true)) {
        guard.keyboard_enhanced = execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .is_ok();
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    app.keyboard_enhanced = guard.keyboard_enhanced;
    let mut session = Session::new(assistant, speech, speech_events);
    let mut events = EventHandler::new(config.tick_rate_ms);

    info!(
        keyboard_enhanced = app.keyboard_enhanced,
        auto_speak = config.auto_speak,
        "starting chat UI"
    );

    let result = run_loop(&mut terminal, &mut app, &mut session, &mut events).await;

    session.shutdown(&mut app);

    // Restore cursor before guard drops
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    session: &mut Session,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| {
            app.set_area(frame.area());
            layout::render_shell(frame, app);
        })?;

        if app.should_quit {
            break;
        }

        // Ticks arrive at least every tick_rate_ms, so a finished reply is
        // picked up promptly.
        if let Some(event) = events.next().await {
            let effects = app.handle_event(event);
            session.apply(app, effects);
        } else {
            break;
        }

        session.poll(app).await;
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
