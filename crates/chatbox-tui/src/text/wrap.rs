//! Text wrapping for chat bubbles.

use super::width::visual_width;

/// Wrap text to the specified width.
///
/// Explicit newlines are kept, so blank lines in a message survive.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(
            textwrap::wrap(paragraph, width)
                .into_iter()
                .map(std::borrow::Cow::into_owned),
        );
    }
    lines
}

/// Visual width of the widest line.
pub fn widest_line(lines: &[String]) -> usize {
    lines.iter().map(|l| visual_width(l)).max().unwrap_or(0)
}
