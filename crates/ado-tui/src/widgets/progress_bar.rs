//! Seek bar for the focused song card.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MUTED, C_SECONDARY};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Column offset and width of the bar itself inside a row of `width`,
/// leaving room for `pos` on the left and `dur` on the right.
fn bar_span(width: u16, position: f64, duration: f64) -> (u16, u16) {
    let left = fmt_time(position).len() as u16 + 1;
    let right = fmt_time(duration).len() as u16 + 1;
    (left, width.saturating_sub(left + right).max(4))
}

/// Render `position / duration` as an eighth-block bar with time labels.
pub fn draw_progress(frame: &mut Frame, area: Rect, position: f64, duration: f64, color: Color) {
    if area.width < 12 || area.height == 0 {
        return;
    }
    let (_, bar_w) = bar_span(area.width, position, duration);
    let bar_w = bar_w as usize;
    let fraction = if duration > 0.0 {
        (position / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let eighths = (fraction * bar_w as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    let mut bar = String::with_capacity(bar_w * 3);
    bar.extend(std::iter::repeat('█').take(full_blocks));
    if full_blocks < bar_w {
        bar.push(BLOCKS[partial]);
        bar.extend(std::iter::repeat('·').take(bar_w - full_blocks - 1));
    }

    let spans = vec![
        Span::styled(format!("{} ", fmt_time(position)), Style::default().fg(C_SECONDARY)),
        Span::styled(bar, Style::default().fg(color)),
        Span::styled(format!(" {}", fmt_time(duration)), Style::default().fg(C_MUTED)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Seconds targeted by a click at column `x` of a bar drawn in `area`.
pub fn seek_target(area: Rect, x: u16, position: f64, duration: f64) -> Option<f64> {
    let (offset, bar_w) = bar_span(area.width, position, duration);
    let start = area.x + offset;
    if x < start || x >= start + bar_w || bar_w == 0 {
        return None;
    }
    let fraction = (x - start) as f64 / bar_w as f64;
    Some(fraction * duration)
}

pub fn fmt_time(secs: f64) -> String {
    if secs.is_nan() || secs <= 0.0 {
        return "0:00".to_string();
    }
    let s = secs as u64;
    let h = s / 3600;
    let m = (s % 3600) / 60;
    let s = s % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_time() {
        assert_eq!(fmt_time(0.0), "0:00");
        assert_eq!(fmt_time(-3.0), "0:00");
        assert_eq!(fmt_time(f64::NAN), "0:00");
        assert_eq!(fmt_time(65.9), "1:05");
        assert_eq!(fmt_time(3725.0), "1:02:05");
    }

    #[test]
    fn test_seek_target_maps_columns_to_seconds() {
        // "0:00 " + 50-column bar + " 3:00"
        let area = Rect::new(10, 0, 60, 1);
        assert_eq!(seek_target(area, 15, 0.0, 180.0), Some(0.0));
        let mid = seek_target(area, 40, 0.0, 180.0).unwrap();
        assert!((mid - 90.0).abs() < 1e-9);
        assert_eq!(seek_target(area, 12, 0.0, 180.0), None);
        assert_eq!(seek_target(area, 65, 0.0, 180.0), None);
    }
}
