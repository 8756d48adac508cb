//! Header bar widget for the top of the TUI.
//!
//! Format: `● Virtual AI Chat Box │ Ready to help            ♪ Voice on [F2]`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::text::visual_width;
use crate::theme::Theme;

/// Application title.
pub const TITLE: &str = "Virtual AI Chat Box";

/// Status while speech is playing.
pub const STATUS_SPEAKING: &str = "Speaking...";

/// Status otherwise.
pub const STATUS_READY: &str = "Ready to help";

/// Header bar widget.
pub struct StatusBar<'a> {
    theme: &'a Theme,
    speaking: bool,
    voice_enabled: bool,
}

impl<'a> StatusBar<'a> {
    /// Create a new header bar.
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            theme,
            speaking: false,
            voice_enabled: true,
        }
    }

    #[must_use]
    pub fn speaking(mut self, speaking: bool) -> Self {
        self.speaking = speaking;
        self
    }

    #[must_use]
    pub fn voice_enabled(mut self, enabled: bool) -> Self {
        self.voice_enabled = enabled;
        self
    }

    fn voice_spans(&self) -> Vec<Span<'static>> {
        let (label, color) = if self.voice_enabled {
            ("♪ Voice on", self.theme.success)
        } else {
            ("✕ Voice off", self.theme.muted)
        };
        vec![
            Span::styled(label, Style::default().fg(color)),
            Span::styled(" [F2]", Style::default().fg(self.theme.muted)),
        ]
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (status, status_color) = if self.speaking {
            (STATUS_SPEAKING, self.theme.speaking)
        } else {
            (STATUS_READY, self.theme.subtext)
        };
        let dot_color = if self.speaking {
            self.theme.speaking
        } else {
            self.theme.primary
        };

        let mut spans = vec![
            Span::styled(" ● ", Style::default().fg(dot_color)),
            Span::styled(
                TITLE,
                Style::default()
                    .fg(self.theme.text)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" │ ", Style::default().fg(self.theme.muted)),
            Span::styled(status, Style::default().fg(status_color)),
        ];

        let right = self.voice_spans();
        let left_width: usize = spans.iter().map(|s| visual_width(&s.content)).sum();
        let right_width: usize = right.iter().map(|s| visual_width(&s.content)).sum();
        let padding = usize::from(area.width).saturating_sub(left_width + right_width + 1);
        if padding > 0 {
            spans.push(Span::raw(" ".repeat(padding)));
            spans.extend(right);
        }

        let line = Line::from(spans);
        let paragraph = Paragraph::new(line).style(Style::default().bg(self.theme.surface));
        paragraph.render(area, buf);
    }
}
