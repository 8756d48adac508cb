//! Footer keybinding hints.
//!
//! Format: `[Enter] send │ [Shift+Enter] newline │ [F2] voice │ [F1] help`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::Theme;

/// A single keybinding hint.
#[derive(Debug, Clone)]
pub struct KeyHint {
    /// The key or key combination (e.g., "Enter", "Ctrl+Q").
    pub key: String,
    /// The action description (e.g., "send", "quit").
    pub action: String,
}

impl KeyHint {
    /// Create a new key hint.
    pub fn new(key: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            action: action.into(),
        }
    }
}

/// Footer hints widget.
pub struct FooterHints<'a> {
    hints: &'a [KeyHint],
    theme: &'a Theme,
}

impl<'a> FooterHints<'a> {
    /// Create a new footer hints widget.
    pub fn new(hints: &'a [KeyHint], theme: &'a Theme) -> Self {
        Self { hints, theme }
    }

    /// Hints for the chat screen.
    ///
    /// `keyboard_enhanced` indicates whether the terminal reports Shift+Enter;
    /// otherwise Ctrl+J is advertised for newlines.
    pub fn chat_hints(keyboard_enhanced: bool) -> Vec<KeyHint> {
        let newline = if keyboard_enhanced {
            KeyHint::new("Shift+Enter", "newline")
        } else {
            KeyHint::new("Ctrl+J", "newline")
        };
        vec![
            KeyHint::new("Enter", "send"),
            newline,
            KeyHint::new("PgUp/PgDn", "scroll"),
            KeyHint::new("F2", "voice"),
            KeyHint::new("F1", "help"),
            KeyHint::new("Ctrl+Q", "quit"),
        ]
    }
}

impl Widget for FooterHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![Span::raw(" ")];
        for (i, hint) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", Style::default().fg(self.theme.muted)));
            }
            spans.push(Span::styled("[", Style::default().fg(self.theme.muted)));
            spans.push(Span::styled(&hint.key, Style::default().fg(self.theme.primary)));
            spans.push(Span::styled("] ", Style::default().fg(self.theme.muted)));
            spans.push(Span::styled(&hint.action, Style::default().fg(self.theme.subtext)));
        }

        let paragraph =
            Paragraph::new(Line::from(spans)).style(Style::default().bg(self.theme.surface));
        paragraph.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_hints_newline_key() {
        let enhanced = FooterHints::chat_hints(true);
        assert!(enhanced.iter().any(|h| h.key == "Shift+Enter"));

        let plain = FooterHints::chat_hints(false);
        assert!(plain.iter().any(|h| h.key == "Ctrl+J"));
        assert!(plain.iter().all(|h| h.key != "Shift+Enter"));
    }

    #[test]
    fn test_render_hints() {
        let theme = Theme::default();
        let hints = FooterHints::chat_hints(false);
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        FooterHints::new(&hints, &theme).render(area, &mut buf);
        let text = crate::test_utils::buffer_to_string(&buf);
        assert!(text.contains("[Enter] send"));
        assert!(text.contains("[F2] voice"));
    }
}
