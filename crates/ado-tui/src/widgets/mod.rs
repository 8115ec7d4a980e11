pub mod filter_input;
pub mod form;
pub mod pane_chrome;
pub mod progress_bar;
pub mod scrollable_list;
pub mod status_bar;
pub mod toast;

use unicode_width::UnicodeWidthChar;

/// Cut `text` to at most `max` terminal columns, ending in `…` when cut.
pub fn fit_width(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::fit_width;

    #[test]
    fn test_fit_width() {
        assert_eq!(fit_width("short", 10), "short");
        assert_eq!(fit_width("exactly", 7), "exactly");
        assert_eq!(fit_width("truncated title", 6), "trunc…");
        assert_eq!(fit_width("anything", 0), "");
    }

    #[test]
    fn test_fit_width_counts_wide_chars() {
        // Each CJK character takes two columns.
        assert_eq!(fit_width("日本語の歌", 6), "日本…");
    }
}
