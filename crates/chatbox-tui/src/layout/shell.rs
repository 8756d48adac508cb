//! Chat screen renderer.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

use super::{centered_fixed, AppLayout};
use crate::app::App;
use crate::theme::Theme;
use crate::widgets::{Composer, FooterHints, MessageList, StatusBar, Toasts};

/// Render the whole chat screen.
pub fn render_shell(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();
    let buf = frame.buffer_mut();

    Block::default()
        .style(Style::default().bg(app.theme.base))
        .render(area, buf);

    if !AppLayout::fits(area) {
        render_too_small(area, buf, &app.theme);
        return;
    }

    let layout = app.layout_in(area);
    let controller = &app.controller;

    StatusBar::new(&app.theme)
        .speaking(controller.is_speaking())
        .voice_enabled(controller.auto_speak())
        .render(layout.header, buf);

    MessageList::new(controller.conversation().turns(), &app.messages, &app.theme)
        .loading(controller.is_loading())
        .speaking_turn(controller.speaking_turn())
        .tick(app.tick)
        .render(layout.messages, buf);

    Composer::new(&app.composer, &app.theme)
        .disabled(controller.is_loading())
        .render(layout.composer, buf);

    let hints = FooterHints::chat_hints(app.keyboard_enhanced);
    FooterHints::new(&hints, &app.theme).render(layout.footer, buf);

    Toasts::new(&app.toasts, &app.theme).render(layout.messages, buf);

    if app.show_help {
        render_help_overlay(area, buf, &app.theme);
    }
}

/// Render the help overlay.
fn render_help_overlay(area: Rect, buf: &mut Buffer, theme: &Theme) {
    let help_text = r"
  Chat
    Enter             Send message
    Shift+Enter       New line (also Alt+Enter, Ctrl+J)
    Up/Down           Previous messages (empty input)

  View
    PgUp/PgDn         Scroll conversation
    Ctrl+Up/Down      Scroll one line
    Ctrl+End          Jump to newest

  General
    F2 / Ctrl+T       Toggle voice
    Esc               Dismiss notification
    Ctrl+Q / Ctrl+C   Quit
    F1                Toggle this help

  [Press any key to close]
";

    let width = 56.min(area.width.saturating_sub(4));
    let height = 21.min(area.height.saturating_sub(2));
    let overlay_area = centered_fixed(width, height, area);

    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Help ")
        .title_style(
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().fg(theme.text).bg(theme.surface));

    Paragraph::new(help_text).block(block).render(overlay_area, buf);
}

/// Render "terminal too small" warning.
fn render_too_small(area: Rect, buf: &mut Buffer, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled("Terminal too small", Style::default().fg(theme.warning)),
        Span::styled(
            format!(" (min {}x{})", super::MIN_WIDTH, super::MIN_HEIGHT),
            Style::default().fg(theme.muted),
        ),
    ]);
    Paragraph::new(line).render(area, buf);
}
