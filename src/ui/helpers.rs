//! Text measuring and wrapping for terminal cells

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Wrap text on whitespace to fit `width` cells. Words wider than a line are
/// broken on character boundaries. Always returns at least one line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = display_width(word);

        if current_width > 0 && current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }

        if current_width > 0 {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }

        if word_width <= width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        // Force-break an over-long word
        for c in word.chars() {
            let w = c.width().unwrap_or(0);
            if current_width + w > width && current_width > 0 {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(c);
            current_width += w;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Cut `text` to at most `width` cells, ending in an ellipsis when cut.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Pad `text` with spaces to exactly `width` cells (truncating if needed).
pub fn pad_to_width(text: &str, width: usize) -> String {
    let mut out = truncate_to_width(text, width);
    let used = display_width(&out);
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_single_line() {
        assert_eq!(wrap_text("hello", 10), vec!["hello"]);
    }

    #[test]
    fn test_wrap_text_multiple_lines() {
        let result = wrap_text("hello world foo bar", 10);
        assert_eq!(result, vec!["hello", "world foo", "bar"]);
        for line in &result {
            assert!(display_width(line) <= 10);
        }
    }

    #[test]
    fn test_wrap_text_empty() {
        assert_eq!(wrap_text("", 10), vec![""]);
    }

    #[test]
    fn test_wrap_breaks_long_multibyte_words_safely() {
        let result = wrap_text("ééééééé", 3);
        assert_eq!(result, vec!["ééé", "ééé", "é"]);

        let wide = wrap_text("糖糖糖", 4);
        assert_eq!(wide, vec!["糖糖", "糖"]);
    }

    #[test]
    fn test_truncate_and_pad() {
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abc", 4), "abc");
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(display_width(&pad_to_width("abcdef", 4)), 4);
    }
}
