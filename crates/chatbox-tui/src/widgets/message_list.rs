//! Message list: chat bubbles with follow mode.
//!
//! ```text
//! Assistant
//!  Hi there! How can I help?            <- bubble background
//!
//!                                     You
//!                         Tell me a joke
//! ```
//!
//! The list is laid out bottom-anchored. `scroll` counts lines from the
//! bottom, so following the conversation means `scroll == 0`.

use std::cell::Cell;

use chatbox_engine::ChatTurn;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::text::{visual_width, widest_line, wrap_text};
use crate::theme::Theme;

/// Empty-state heading.
pub const EMPTY_TITLE: &str = "Hello! I'm your virtual assistant";

/// Empty-state subheading.
pub const EMPTY_SUBTITLE: &str = "Ask me anything and I'll respond with voice!";

pub const USER_LABEL: &str = "You";
pub const ASSISTANT_LABEL: &str = "Assistant";

/// Suffix on the label of the turn being read aloud.
pub const SPEAKING_MARKER: &str = "♪ speaking";

/// Share of the pane width a bubble may take, in percent.
const BUBBLE_PERCENT: usize = 70;

/// Lines scrolled per mouse wheel tick.
pub const WHEEL_LINES: usize = 3;

/// Scroll position of the message list.
#[derive(Debug, Default)]
pub struct MessageListState {
    /// Lines scrolled up from the bottom.
    scroll: usize,
    /// Number of turns seen at the last [`observe`](Self::observe).
    seen_len: usize,
    /// Largest valid `scroll`, recorded at render time.
    max_scroll: Cell<usize>,
    /// Viewport height, recorded at render time.
    viewport: Cell<usize>,
}

impl MessageListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Whether the newest content is pinned to the bottom.
    pub fn is_following(&self) -> bool {
        self.scroll == 0
    }

    /// Note the current conversation length. Growth jumps back to the bottom.
    pub fn observe(&mut self, len: usize) {
        if len > self.seen_len {
            self.scroll = 0;
        }
        self.seen_len = len;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = (self.scroll + lines).min(self.max_scroll.get());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page_size());
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page_size());
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    fn page_size(&self) -> usize {
        self.viewport.get().saturating_sub(1).max(1)
    }
}

/// Message list widget.
pub struct MessageList<'a> {
    turns: &'a [ChatTurn],
    state: &'a MessageListState,
    theme: &'a Theme,
    loading: bool,
    speaking_turn: Option<usize>,
    tick: u64,
}

impl<'a> MessageList<'a> {
    pub fn new(turns: &'a [ChatTurn], state: &'a MessageListState, theme: &'a Theme) -> Self {
        Self {
            turns,
            state,
            theme,
            loading: false,
            speaking_turn: None,
            tick: 0,
        }
    }

    /// Show the composing bubble after the last turn.
    #[must_use]
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    /// Mark a turn as being read aloud.
    ///
    /// Only honored for the last turn when it is an assistant turn.
    #[must_use]
    pub fn speaking_turn(mut self, index: Option<usize>) -> Self {
        self.speaking_turn = index.filter(|&i| {
            i + 1 == self.turns.len() && self.turns.get(i).is_some_and(ChatTurn::is_assistant)
        });
        self
    }

    /// Animation frame for the composing bubble.
    #[must_use]
    pub fn tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }

    fn bubble_lines(
        label: Line<'static>,
        body: &[String],
        style: Style,
        alignment: Alignment,
        out: &mut Vec<Line<'static>>,
    ) {
        out.push(label.alignment(alignment));
        let inner = widest_line(body);
        for text in body {
            let pad = inner - visual_width(text);
            let content = format!(" {text}{} ", " ".repeat(pad));
            out.push(Line::from(Span::styled(content, style)).alignment(alignment));
        }
        out.push(Line::default());
    }

    fn turn_lines(
        &self,
        index: usize,
        turn: &ChatTurn,
        wrap_width: usize,
        out: &mut Vec<Line<'static>>,
    ) {
        let body = wrap_text(turn.text(), wrap_width);
        if turn.is_user() {
            let label = Line::from(Span::styled(
                USER_LABEL,
                Style::default().fg(self.theme.subtext),
            ));
            let style = Style::default()
                .fg(self.theme.user_text)
                .bg(self.theme.user_bubble);
            Self::bubble_lines(label, &body, style, Alignment::Right, out);
        } else {
            let speaking = self.speaking_turn == Some(index);
            let mut spans = vec![Span::styled(
                ASSISTANT_LABEL,
                Style::default().fg(self.theme.secondary),
            )];
            let mut style = Style::default()
                .fg(self.theme.text)
                .bg(self.theme.assistant_bubble);
            if speaking {
                spans.push(Span::styled(
                    format!(" {SPEAKING_MARKER}"),
                    Style::default()
                        .fg(self.theme.speaking)
                        .add_modifier(Modifier::BOLD),
                ));
                style = style.fg(self.theme.speaking);
            }
            Self::bubble_lines(Line::from(spans), &body, style, Alignment::Left, out);
        }
    }

    fn composing_lines(&self, out: &mut Vec<Line<'static>>) {
        #[allow(clippy::cast_possible_truncation)]
        let frame = (self.tick % 3) as usize;
        let dots: String = (0..3)
            .map(|i| if i <= frame { '●' } else { '○' })
            .collect();
        let label = Line::from(Span::styled(
            ASSISTANT_LABEL,
            Style::default().fg(self.theme.secondary),
        ));
        let style = Style::default()
            .fg(self.theme.muted)
            .bg(self.theme.assistant_bubble);
        Self::bubble_lines(label, &[dots], style, Alignment::Left, out);
    }

    /// All lines of the list, top to bottom.
    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        // Two columns of bubble padding.
        let wrap_width = (usize::from(width) * BUBBLE_PERCENT / 100)
            .saturating_sub(2)
            .max(1);
        let mut lines = Vec::new();
        for (index, turn) in self.turns.iter().enumerate() {
            self.turn_lines(index, turn, wrap_width, &mut lines);
        }
        if self.loading {
            self.composing_lines(&mut lines);
        }
        lines
    }

    fn render_empty(&self, area: Rect, buf: &mut Buffer) {
        let lines = vec![
            Line::from(Span::styled(
                EMPTY_TITLE,
                Style::default()
                    .fg(self.theme.primary)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(Span::styled(
                EMPTY_SUBTITLE,
                Style::default().fg(self.theme.muted),
            )),
        ];
        #[allow(clippy::cast_possible_truncation)]
        let height = lines.len() as u16;
        let top = area.y + area.height.saturating_sub(height) / 2;
        let rect = Rect::new(area.x, top, area.width, height.min(area.height));
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(rect, buf);
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.state.viewport.set(usize::from(area.height));
        if area.width == 0 || area.height == 0 {
            return;
        }

        if self.turns.is_empty() && !self.loading {
            self.state.max_scroll.set(0);
            self.render_empty(area, buf);
            return;
        }

        let lines = self.lines(area.width);
        let max_scroll = lines.len().saturating_sub(usize::from(area.height));
        self.state.max_scroll.set(max_scroll);
        let scroll = self.state.scroll.min(max_scroll);
        let top = max_scroll - scroll;

        #[allow(clippy::cast_possible_truncation)]
        Paragraph::new(lines)
            .scroll((top.min(usize::from(u16::MAX)) as u16, 0))
            .render(area, buf);

        if scroll > 0 {
            let hint = "▼ more below";
            #[allow(clippy::cast_possible_truncation)]
            let width = visual_width(hint) as u16;
            if area.width > width {
                buf.set_string(
                    area.right() - width - 1,
                    area.bottom() - 1,
                    hint,
                    Style::default().fg(self.theme.muted),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    fn render(list: MessageList<'_>, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        list.render(area, &mut buf);
        buf
    }

    #[test]
    fn test_empty_state() {
        let state = MessageListState::new();
        let theme = Theme::default();
        let buf = render(MessageList::new(&[], &state, &theme), 60, 10);
        let text = buffer_to_string(&buf);
        assert!(text.contains(EMPTY_TITLE));
        assert!(text.contains(EMPTY_SUBTITLE));
        assert!(!text.contains(USER_LABEL));
    }

    #[test]
    fn test_bubbles_are_aligned_by_author() {
        let turns = vec![ChatTurn::user("Hello"), ChatTurn::assistant("Hi there!")];
        let state = MessageListState::new();
        let theme = Theme::default();
        let buf = render(MessageList::new(&turns, &state, &theme), 40, 10);
        let text = buffer_to_string(&buf);
        let rows: Vec<&str> = text.lines().collect();

        let user_row = rows.iter().find(|r| r.contains("Hello")).unwrap();
        assert!(user_row.trim_end().ends_with("Hello"));
        assert!(user_row.starts_with("   "));

        let assistant_row = rows.iter().find(|r| r.contains("Hi there!")).unwrap();
        assert!(assistant_row.starts_with(" Hi there!"));
        assert!(text.contains(ASSISTANT_LABEL));
        assert!(!text.contains(EMPTY_TITLE));
    }

    #[test]
    fn test_bubble_width_is_capped() {
        let long = "word ".repeat(40);
        let turns = vec![ChatTurn::assistant(long)];
        let state = MessageListState::new();
        let theme = Theme::default();
        let buf = render(MessageList::new(&turns, &state, &theme), 50, 30);

        for y in 0..buf.area.height {
            let styled = (0..buf.area.width)
                .filter(|&x| buf[(x, y)].bg == theme.assistant_bubble)
                .count();
            assert!(styled <= 35, "row {y} has {styled} bubble cells");
        }
    }

    #[test]
    fn test_composing_bubble_only_while_loading() {
        let turns = vec![ChatTurn::user("Hello")];
        let state = MessageListState::new();
        let theme = Theme::default();

        let idle = buffer_to_string(&render(MessageList::new(&turns, &state, &theme), 40, 10));
        assert!(!idle.contains(ASSISTANT_LABEL));

        let loading = buffer_to_string(&render(
            MessageList::new(&turns, &state, &theme).loading(true).tick(1),
            40,
            10,
        ));
        assert!(loading.contains(ASSISTANT_LABEL));
        assert!(loading.contains("●●○"));
    }

    #[test]
    fn test_speaking_marker_only_on_last_assistant_turn() {
        let turns = vec![
            ChatTurn::user("Hello"),
            ChatTurn::assistant("Hi"),
            ChatTurn::user("Again"),
        ];
        let state = MessageListState::new();
        let theme = Theme::default();

        let list = MessageList::new(&turns, &state, &theme).speaking_turn(Some(1));
        assert_eq!(list.speaking_turn, None);

        let turns = &turns[..2];
        let list = MessageList::new(turns, &state, &theme).speaking_turn(Some(1));
        let text = buffer_to_string(&render(list, 40, 10));
        assert_eq!(text.matches(SPEAKING_MARKER).count(), 1);
    }

    #[test]
    fn test_follow_and_scroll() {
        let turns: Vec<ChatTurn> = (0..10)
            .map(|i| ChatTurn::user(format!("message {i}")))
            .collect();
        let mut state = MessageListState::new();
        let theme = Theme::default();
        state.observe(turns.len());

        let text = buffer_to_string(&render(MessageList::new(&turns, &state, &theme), 40, 6));
        assert!(text.contains("message 9"));
        assert!(!text.contains("message 0"));

        state.page_up();
        assert!(!state.is_following());
        let text = buffer_to_string(&render(MessageList::new(&turns, &state, &theme), 40, 6));
        assert!(!text.contains("message 9"));
        assert!(text.contains("more below"));

        state.scroll_up(1000);
        let text = buffer_to_string(&render(MessageList::new(&turns, &state, &theme), 40, 6));
        assert!(text.contains("message 0"));

        // A new turn snaps back to the bottom.
        state.observe(turns.len() + 1);
        assert!(state.is_following());
    }

    #[test]
    fn test_scroll_down_stops_at_bottom() {
        let mut state = MessageListState::new();
        state.max_scroll.set(10);
        state.scroll_up(4);
        state.scroll_down(10);
        assert_eq!(state.scroll(), 0);
        assert!(state.is_following());
    }
}
