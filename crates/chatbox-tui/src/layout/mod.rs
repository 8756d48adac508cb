//! Layout components for the TUI.
//!
//! This module provides:
//! - [`AppLayout`] - Regions of the chat screen
//! - [`render_shell`] - Renders the whole screen for an [`App`](crate::App)
//! - [`centered_fixed`] - Rect helper for overlays

mod shell;

pub use shell::render_shell;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::widgets::Composer;

/// Minimum terminal width.
pub const MIN_WIDTH: u16 = 30;
/// Minimum terminal height.
pub const MIN_HEIGHT: u16 = 10;

/// Composer text lines shown before it starts scrolling.
const MAX_COMPOSER_LINES: u16 = 5;

/// Regions of the chat screen.
///
/// ```text
/// ● Virtual AI Chat Box │ Ready to help      ♪ Voice on [F2]   header
///                                                             messages
/// ┌────────────────────────────────────────────────────────┐
/// │> Type your message...                          [ Send ]│  composer
/// └────────────────────────────────────────────────────────┘
/// [Enter] send │ [Ctrl+J] newline │ ...                        footer
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppLayout {
    pub header: Rect,
    pub messages: Rect,
    pub composer: Rect,
    pub send_button: Rect,
    pub footer: Rect,
}

impl AppLayout {
    /// Split `area`, sizing the composer for `composer_lines` lines of text.
    pub fn new(area: Rect, composer_lines: usize) -> Self {
        let lines = u16::try_from(composer_lines)
            .unwrap_or(MAX_COMPOSER_LINES)
            .clamp(1, MAX_COMPOSER_LINES);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),         // Header
                Constraint::Min(0),            // Messages (expands)
                Constraint::Length(lines + 2), // Composer
                Constraint::Length(1),         // Footer hints
            ])
            .split(area);

        Self {
            header: chunks[0],
            messages: chunks[1],
            composer: chunks[2],
            send_button: Composer::send_button_area(chunks[2]),
            footer: chunks[3],
        }
    }

    /// Whether `area` is big enough for the chat screen.
    pub fn fits(area: Rect) -> bool {
        area.width >= MIN_WIDTH && area.height >= MIN_HEIGHT
    }
}

/// Create a centered rect with fixed dimensions.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
