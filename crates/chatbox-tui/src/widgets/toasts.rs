//! Toast notifications stacked in the top-right corner.

use chatbox_engine::Notification;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::text::truncate_to_width;
use crate::theme::Theme;

/// How long a toast stays on screen.
pub const TOAST_DURATION_MS: u64 = 5_000;

/// Toasts shown at once; older ones are dropped first.
pub const MAX_VISIBLE: usize = 3;

const TOAST_WIDTH: u16 = 40;

#[derive(Debug, Clone)]
struct Toast {
    notification: Notification,
    remaining: u64,
}

/// Live toasts, newest last.
#[derive(Debug, Clone)]
pub struct ToastStack {
    toasts: Vec<Toast>,
    ttl_ticks: u64,
}

impl ToastStack {
    /// Create a stack whose toasts expire after [`TOAST_DURATION_MS`] at the
    /// given tick rate.
    pub fn new(tick_rate_ms: u64) -> Self {
        Self {
            toasts: Vec::new(),
            ttl_ticks: (TOAST_DURATION_MS / tick_rate_ms.max(1)).max(1),
        }
    }

    pub fn push(&mut self, notification: Notification) {
        self.toasts.push(Toast {
            notification,
            remaining: self.ttl_ticks,
        });
        if self.toasts.len() > MAX_VISIBLE {
            self.toasts.remove(0);
        }
    }

    /// Age every toast by one tick and drop the expired ones.
    pub fn tick(&mut self) {
        for toast in &mut self.toasts {
            toast.remaining = toast.remaining.saturating_sub(1);
        }
        self.toasts.retain(|t| t.remaining > 0);
    }

    /// Dismiss the newest toast. Returns false when there was none.
    pub fn dismiss_latest(&mut self) -> bool {
        self.toasts.pop().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Notification> {
        self.toasts.iter().map(|t| &t.notification)
    }
}

/// Toast overlay widget.
pub struct Toasts<'a> {
    stack: &'a ToastStack,
    theme: &'a Theme,
}

impl<'a> Toasts<'a> {
    pub fn new(stack: &'a ToastStack, theme: &'a Theme) -> Self {
        Self { stack, theme }
    }
}

impl Widget for Toasts<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = TOAST_WIDTH.min(area.width);
        if width < 8 {
            return;
        }
        let text_width = usize::from(width - 2);

        let mut y = area.y;
        for notification in self.stack.iter().rev() {
            let description = textwrap::wrap(&notification.description, text_width);
            #[allow(clippy::cast_possible_truncation)]
            let height = (description.len() as u16 + 2).min(6);
            if y + height > area.bottom() {
                break;
            }

            let accent = if notification.is_error() {
                self.theme.error
            } else {
                self.theme.primary
            };
            let rect = Rect::new(area.right() - width, y, width, height);
            Clear.render(rect, buf);

            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent))
                .title(Span::styled(
                    format!(" {} ", truncate_to_width(&notification.title, text_width - 2)),
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                ))
                .style(Style::default().bg(self.theme.overlay));
            let lines: Vec<Line<'_>> = description
                .into_iter()
                .map(|l| Line::from(Span::styled(l, Style::default().fg(self.theme.text))))
                .collect();
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .render(rect, buf);

            y += height;
        }
    }
}
