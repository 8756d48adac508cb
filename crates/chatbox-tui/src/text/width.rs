//! Unicode-aware width helpers.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Width of a string in terminal cells.
pub fn visual_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Width of a single character in terminal cells.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Cut a string down to `max_width` cells, ending with "..." when shortened.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if visual_width(s) <= max_width {
        return s.to_string();
    }

    let target = max_width.saturating_sub(3);
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let w = char_width(ch);
        if width + w > target {
            break;
        }
        result.push(ch);
        width += w;
    }
    result.push_str(&"...".chars().take(max_width.min(3)).collect::<String>());
    result
}
