//! Event handling for the chatbox TUI.

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Events that can occur in the TUI.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// A mouse event occurred.
    Mouse(MouseEvent),
    /// Text was pasted (bracketed paste).
    Paste(String),
    /// A tick event for UI updates.
    Tick,
    /// Terminal was resized.
    Resize(u16, u16),
}

/// Event handler that runs in a background thread.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Create a new event handler with the specified tick rate.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tx_clone = tx.clone();

        // crossterm polling is blocking, so it gets its own thread
        std::thread::spawn(move || {
            let mut clock = TickClock::new(Duration::from_millis(tick_rate_ms), Instant::now());
            loop {
                if event::poll(clock.until_next(Instant::now())).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        let event = match evt {
                            // Release/repeat reports only arrive with keyboard enhancement
                            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                                Some(Event::Key(key))
                            }
                            CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
                            CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
                            CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
                            _ => None,
                        };
                        if let Some(e) = event {
                            if tx_clone.send(e).is_err() {
                                break;
                            }
                        }
                    }
                }
                // Tick on elapsed time, not only on idle polls.
                if clock.due(Instant::now()) && tx_clone.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Get the next event, waiting until one is available.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Schedules ticks at a fixed rate regardless of input traffic.
#[derive(Debug, Clone, Copy)]
struct TickClock {
    rate: Duration,
    last: Instant,
}

impl TickClock {
    fn new(rate: Duration, now: Instant) -> Self {
        Self {
            rate: rate.max(Duration::from_millis(1)),
            last: now,
        }
    }

    /// How long to wait for input before the next tick is due.
    fn until_next(&self, now: Instant) -> Duration {
        self.rate.saturating_sub(now.saturating_duration_since(self.last))
    }

    /// Whether a tick is due at `now`; consumes it if so.
    fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.rate {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Application-level action bound to a key. Keys without a binding go to
/// the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Help,
    Back,
    ToggleVoice,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollToBottom,
    None,
}

/// Map a key to an application action.
///
/// Printable characters, Enter and editing keys always map to
/// [`Action::None`] so they reach the composer.
pub fn key_to_action(key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c' | 'q') if ctrl => Action::Quit,
        KeyCode::Char('t') if ctrl => Action::ToggleVoice,
        KeyCode::F(1) => Action::Help,
        KeyCode::F(2) => Action::ToggleVoice,
        KeyCode::Esc => Action::Back,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Up if ctrl => Action::ScrollUp,
        KeyCode::Down if ctrl => Action::ScrollDown,
        KeyCode::End if ctrl => Action::ScrollToBottom,
        _ => Action::None,
    }
}
