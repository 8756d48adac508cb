//! Message composer: a multi-line input with a send affordance.
//!
//! Enter submits, Shift+Enter inserts a newline. Terminals that cannot
//! report Shift+Enter can use Alt+Enter, Ctrl+Enter or Ctrl+J instead.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::text::char_width;
use crate::theme::Theme;

/// Placeholder shown while the buffer is empty.
pub const PLACEHOLDER: &str = "Type your message...";

/// Shown instead of the input while a reply is pending.
pub const WAITING_TEXT: &str = "● Waiting for the assistant...";

/// Label of the send affordance.
pub const SEND_LABEL: &str = "[ Send ]";

/// Columns reserved for the send affordance (label plus a gap).
const SEND_WIDTH: u16 = 9;

/// Prompt prefix on the first line; continuation lines are indented to match.
const PROMPT: &str = "> ";

/// What the composer did with a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerOutcome {
    /// Trimmed text to send.
    Submitted(String),
    /// The key was consumed without submitting.
    Handled,
    /// The key means nothing to the composer.
    Ignored,
}

/// Editable text buffer with a cursor and submission history.
#[derive(Debug, Clone, Default)]
pub struct ComposerState {
    content: String,
    /// Cursor position as a character index.
    cursor: usize,
    history: Vec<String>,
    /// Position in `history` counted from the newest entry.
    history_index: Option<usize>,
    /// Input saved while browsing history.
    saved_input: String,
}

impl ComposerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Whether the buffer is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Whether the send affordance is enabled.
    pub fn can_submit(&self, disabled: bool) -> bool {
        !disabled && !self.is_blank()
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(i, _)| i)
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor.
    pub fn insert_str(&mut self, s: &str) {
        let normalized = s.replace("\r\n", "\n").replace('\r', "\n");
        let at = self.byte_index(self.cursor);
        self.content.insert_str(at, &normalized);
        self.cursor += normalized.chars().count();
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    /// Delete the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_index(self.cursor);
            self.content.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Take the trimmed text and clear the buffer.
    ///
    /// Returns `None`, leaving the buffer untouched, when disabled or blank.
    pub fn submit(&mut self, disabled: bool) -> Option<String> {
        if !self.can_submit(disabled) {
            return None;
        }
        let text = self.content.trim().to_string();
        self.clear();
        self.history.push(text.clone());
        self.history_index = None;
        self.saved_input.clear();
        Some(text)
    }

    /// Recall the previous submission.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next = match self.history_index {
            None => {
                self.saved_input = self.content.clone();
                0
            }
            Some(i) if i + 1 < self.history.len() => i + 1,
            Some(_) => return,
        };
        self.history_index = Some(next);
        self.content = self.history[self.history.len() - 1 - next].clone();
        self.move_end();
    }

    /// Move towards the newest submission, restoring the saved input last.
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.history_index = None;
                self.content = std::mem::take(&mut self.saved_input);
                self.move_end();
            }
            Some(i) => {
                self.history_index = Some(i - 1);
                self.content = self.history[self.history.len() - i].clone();
                self.move_end();
            }
        }
    }

    /// Apply a key press.
    pub fn handle_key(&mut self, key: KeyEvent, disabled: bool) -> ComposerOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        let newline = match key.code {
            KeyCode::Enter => shift || alt || ctrl,
            KeyCode::Char('j') => ctrl,
            _ => false,
        };
        if newline {
            if !disabled {
                self.insert('\n');
            }
            return ComposerOutcome::Handled;
        }

        if key.code == KeyCode::Enter {
            return match self.submit(disabled) {
                Some(text) => ComposerOutcome::Submitted(text),
                None => ComposerOutcome::Handled,
            };
        }

        if disabled || ctrl || alt {
            return ComposerOutcome::Ignored;
        }

        match key.code {
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            KeyCode::Up if self.is_empty() || self.history_index.is_some() => self.history_prev(),
            KeyCode::Down if self.history_index.is_some() => self.history_next(),
            _ => return ComposerOutcome::Ignored,
        }
        ComposerOutcome::Handled
    }
}

/// Composer widget.
pub struct Composer<'a> {
    state: &'a ComposerState,
    theme: &'a Theme,
    disabled: bool,
}

impl<'a> Composer<'a> {
    pub fn new(state: &'a ComposerState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            disabled: false,
        }
    }

    /// Disable input while a reply is pending.
    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Where the send affordance is drawn for a composer occupying `area`.
    pub fn send_button_area(area: Rect) -> Rect {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        if inner.width <= SEND_WIDTH || inner.height == 0 {
            return Rect::default();
        }
        let y = inner.y + inner.height.saturating_sub(1) / 2;
        #[allow(clippy::cast_possible_truncation)]
        let width = SEND_LABEL.len() as u16;
        Rect::new(inner.right() - width, y, width, 1)
    }

    /// Visual rows the buffer needs in a composer `width` columns wide.
    pub fn content_rows(state: &ComposerState, width: u16) -> usize {
        if state.is_empty() {
            return 1;
        }
        wrap_rows(state.content(), state.cursor(), Self::text_width(width)).len()
    }

    /// Cells available for text on each row, after borders, the send
    /// affordance and the prompt.
    fn text_width(width: u16) -> usize {
        let inner = width.saturating_sub(2);
        let input = if inner > SEND_WIDTH {
            inner - SEND_WIDTH
        } else {
            inner
        };
        usize::from(input).saturating_sub(PROMPT.len()).max(1)
    }

    /// Rows of the input text with the cursor drawn in, plus the row the
    /// cursor is on.
    fn input_lines(&self, width: u16) -> (Vec<Line<'static>>, usize) {
        let text_style = Style::default().fg(self.theme.text);
        let prompt_style = Style::default().fg(self.theme.primary);
        let cursor_style = Style::default().fg(self.theme.primary);

        if self.state.is_empty() {
            let line = Line::from(vec![
                Span::styled(PROMPT, prompt_style),
                Span::styled("█", cursor_style),
                Span::styled(PLACEHOLDER, Style::default().fg(self.theme.muted)),
            ]);
            return (vec![line], 0);
        }

        let rows = wrap_rows(
            self.state.content(),
            self.state.cursor(),
            Self::text_width(width),
        );
        let mut lines = Vec::with_capacity(rows.len());
        let mut cursor_line = 0;
        for (idx, row) in rows.into_iter().enumerate() {
            let prefix = if idx == 0 { PROMPT } else { "  " };
            let mut spans = vec![Span::styled(prefix, prompt_style)];
            match row.cursor {
                Some(col) => {
                    cursor_line = idx;
                    let before: String = row.text.chars().take(col).collect();
                    let after: String = row.text.chars().skip(col).collect();
                    spans.push(Span::styled(before, text_style));
                    spans.push(Span::styled("█", cursor_style));
                    spans.push(Span::styled(after, text_style));
                }
                None => spans.push(Span::styled(row.text, text_style)),
            }
            lines.push(Line::from(spans));
        }
        (lines, cursor_line)
    }
}

/// One visual row of input; `cursor` is the char offset of the cursor
/// within `text` when the cursor sits on this row.
#[derive(Debug, Default, PartialEq, Eq)]
struct InputRow {
    text: String,
    cursor: Option<usize>,
}

/// Break `content` into rows of at most `width` cells, hard-wrapping long
/// lines. The cursor block occupies a cell of its own.
fn wrap_rows(content: &str, cursor: usize, width: usize) -> Vec<InputRow> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut offset = 0;

    for line in content.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        let cursor_col = cursor
            .checked_sub(offset)
            .filter(|col| *col <= chars.len());
        let mut row = InputRow::default();
        let mut used = 0;

        for i in 0..=chars.len() {
            if cursor_col == Some(i) {
                if used + 1 > width && used > 0 {
                    rows.push(std::mem::take(&mut row));
                    used = 0;
                }
                row.cursor = Some(row.text.chars().count());
                used += 1;
            }
            if let Some(&ch) = chars.get(i) {
                let w = char_width(ch);
                if used + w > width && used > 0 {
                    rows.push(std::mem::take(&mut row));
                    used = 0;
                }
                row.text.push(ch);
                used += w;
            }
        }
        rows.push(row);
        offset += chars.len() + 1;
    }
    rows
}

impl Widget for Composer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.disabled {
            Style::default().fg(self.theme.border)
        } else {
            Style::default().fg(self.theme.border_focused)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(self.theme.base));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let button = Self::send_button_area(area);
        let input_area = if button.width > 0 {
            Rect::new(inner.x, inner.y, inner.width - SEND_WIDTH, inner.height)
        } else {
            inner
        };

        if self.disabled {
            Paragraph::new(WAITING_TEXT)
                .style(Style::default().fg(self.theme.muted))
                .render(input_area, buf);
        } else {
            let (lines, cursor_line) = self.input_lines(area.width);
            let visible = usize::from(input_area.height);
            let scroll = cursor_line.saturating_sub(visible.saturating_sub(1));
            #[allow(clippy::cast_possible_truncation)]
            Paragraph::new(lines)
                .scroll((scroll as u16, 0))
                .render(input_area, buf);
        }

        if button.width > 0 {
            let style = if self.state.can_submit(self.disabled) {
                Style::default()
                    .fg(self.theme.user_text)
                    .bg(self.theme.primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted).bg(self.theme.surface)
            };
            buf.set_string(button.x, button.y, SEND_LABEL, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    fn press(state: &mut ComposerState, code: KeyCode, modifiers: KeyModifiers) -> ComposerOutcome {
        state.handle_key(KeyEvent::new(code, modifiers), false)
    }

    fn type_str(state: &mut ComposerState, s: &str) {
        for c in s.chars() {
            press(state, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_typing_and_editing() {
        let mut state = ComposerState::new();
        type_str(&mut state, "Hi");
        assert_eq!(state.content(), "Hi");
        assert_eq!(state.cursor(), 2);

        state.backspace();
        assert_eq!(state.content(), "H");

        state.move_home();
        state.insert('>');
        assert_eq!(state.content(), ">H");
        state.delete();
        assert_eq!(state.content(), ">");
    }

    #[test]
    fn test_multibyte_editing() {
        let mut state = ComposerState::new();
        state.insert_str("héllo");
        state.move_left();
        state.move_left();
        state.move_left();
        state.backspace();
        assert_eq!(state.content(), "hllo");
        state.insert('é');
        assert_eq!(state.content(), "héllo");
    }

    #[test]
    fn test_enter_submits_trimmed_text_and_clears() {
        let mut state = ComposerState::new();
        state.insert_str("  Hello  ");
        let outcome = press(&mut state, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(outcome, ComposerOutcome::Submitted("Hello".into()));
        assert!(state.is_empty());
    }

    #[test]
    fn test_enter_on_blank_buffer_does_nothing() {
        let mut state = ComposerState::new();
        state.insert_str("   ");
        let outcome = press(&mut state, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(outcome, ComposerOutcome::Handled);
        assert_eq!(state.content(), "   ");
        assert!(!state.content().contains('\n'));
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut state = ComposerState::new();
        type_str(&mut state, "line one");
        let outcome = press(&mut state, KeyCode::Enter, KeyModifiers::SHIFT);
        assert_eq!(outcome, ComposerOutcome::Handled);
        type_str(&mut state, "line two");
        assert_eq!(state.content(), "line one\nline two");

        press(&mut state, KeyCode::Char('j'), KeyModifiers::CONTROL);
        press(&mut state, KeyCode::Enter, KeyModifiers::ALT);
        assert_eq!(state.content(), "line one\nline two\n\n");
    }

    #[test]
    fn test_disabled_composer_never_submits() {
        let mut state = ComposerState::new();
        state.insert_str("Hello");
        let outcome = state.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), true);
        assert_eq!(outcome, ComposerOutcome::Handled);
        assert_eq!(state.content(), "Hello");

        let typed = state.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE), true);
        assert_eq!(typed, ComposerOutcome::Ignored);
        assert_eq!(state.content(), "Hello");
        assert!(!state.can_submit(true));
        assert!(state.can_submit(false));
    }

    #[test]
    fn test_history_navigation() {
        let mut state = ComposerState::new();
        state.insert_str("first");
        state.submit(false);
        state.insert_str("second");
        state.submit(false);

        state.insert_str("draft");
        state.history_prev();
        assert_eq!(state.content(), "second");
        state.history_prev();
        assert_eq!(state.content(), "first");
        state.history_prev();
        assert_eq!(state.content(), "first");

        state.history_next();
        assert_eq!(state.content(), "second");
        state.history_next();
        assert_eq!(state.content(), "draft");
    }

    #[test]
    fn test_paste_normalizes_line_endings() {
        let mut state = ComposerState::new();
        state.insert_str("a\r\nb\rc");
        assert_eq!(state.content(), "a\nb\nc");
        assert_eq!(state.cursor(), 5);
    }

    #[test]
    fn test_render_placeholder_and_send_button() {
        let state = ComposerState::new();
        let theme = Theme::default();
        let area = Rect::new(0, 0, 50, 4);
        let mut buf = Buffer::empty(area);
        Composer::new(&state, &theme).render(area, &mut buf);

        let text = buffer_to_string(&buf);
        assert!(text.contains("> █Type your message..."));
        assert!(text.contains(SEND_LABEL));

        let button = Composer::send_button_area(area);
        assert_eq!(button, Rect::new(41, 1, 8, 1));
        // Blank buffer: the send affordance is drawn disabled.
        assert_eq!(buf[(button.x, button.y)].bg, theme.surface);
    }

    #[test]
    fn test_render_disabled_shows_waiting() {
        let mut state = ComposerState::new();
        state.insert_str("draft");
        let theme = Theme::default();
        let area = Rect::new(0, 0, 50, 4);
        let mut buf = Buffer::empty(area);
        Composer::new(&state, &theme).disabled(true).render(area, &mut buf);

        let text = buffer_to_string(&buf);
        assert!(text.contains(WAITING_TEXT));
        let button = Composer::send_button_area(area);
        assert_eq!(buf[(button.x, button.y)].bg, theme.surface);
    }

    #[test]
    fn test_render_enabled_send_button() {
        let mut state = ComposerState::new();
        state.insert_str("Hello");
        let theme = Theme::default();
        let area = Rect::new(0, 0, 50, 4);
        let mut buf = Buffer::empty(area);
        Composer::new(&state, &theme).render(area, &mut buf);

        let button = Composer::send_button_area(area);
        assert_eq!(buf[(button.x, button.y)].bg, theme.primary);
        assert!(buffer_to_string(&buf).contains("> Hello█"));
    }

    #[test]
    fn test_wrap_rows_keeps_cursor_position() {
        let rows = wrap_rows("abcdef", 6, 4);
        let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "ef"]);
        assert_eq!(rows[1].cursor, Some(2));
        assert_eq!(rows[0].cursor, None);

        // A cursor that would overflow a full row starts the next one.
        let rows = wrap_rows("abcd", 4, 4);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], InputRow { text: String::new(), cursor: Some(0) });

        let rows = wrap_rows("ab\ncd", 1, 10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cursor, Some(1));
        assert_eq!(rows[1].cursor, None);
    }

    #[test]
    fn test_wrap_rows_counts_wide_characters() {
        let rows = wrap_rows("你好世界", 0, 5);
        let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["你好", "世界"]);
        assert_eq!(rows[0].cursor, Some(0));
    }

    #[test]
    fn test_render_long_line_keeps_tail_and_cursor_visible() {
        let mut state = ComposerState::new();
        state.insert_str(&format!("{}TAILEND", "a".repeat(60)));
        let theme = Theme::default();
        let area = Rect::new(0, 0, 50, 3);
        let mut buf = Buffer::empty(area);
        Composer::new(&state, &theme).render(area, &mut buf);

        let text = buffer_to_string(&buf);
        assert!(text.contains("TAILEND█"), "tail hidden:\n{text}");
    }

    #[test]
    fn test_content_rows_follow_wrapping() {
        let mut state = ComposerState::new();
        assert_eq!(Composer::content_rows(&state, 50), 1);

        // 37 cells per row at width 50, one of them taken by the cursor.
        state.insert_str(&"a".repeat(36));
        assert_eq!(Composer::content_rows(&state, 50), 1);
        state.insert('a');
        assert_eq!(Composer::content_rows(&state, 50), 2);

        state.insert_str("\nx\ny");
        assert_eq!(Composer::content_rows(&state, 50), 3);
    }
}
