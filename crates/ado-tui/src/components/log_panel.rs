//! LogPanel: tail of the application log file.
//!
//! One summary line when collapsed; a scrollable pane when expanded.

use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_ERROR, C_LOADING, C_MUTED, C_SECONDARY},
    widgets::pane_chrome::pane_chrome,
};

#[derive(Default)]
pub struct LogPanel {
    pub expanded: bool,
    scroll: usize,
    last_log_count: usize,
}

impl LogPanel {
    fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta);
    }
}

impl Component for LogPanel {
    fn id(&self) -> ComponentId {
        ComponentId::LogPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-10),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::End | KeyCode::Char('G') => self.scroll = usize::MAX,
            KeyCode::Char('y') => {
                return vec![Action::CopyToClipboard(state.log_path.display().to_string())];
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll_by(-1),
            MouseEventKind::ScrollDown => self.scroll_by(1),
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ToggleLogs = action {
            self.expanded = !self.expanded;
            if self.expanded {
                self.scroll = usize::MAX;
            }
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        if area.height == 0 {
            return;
        }
        frame.render_widget(Clear, area);

        if !self.expanded || area.height <= 2 {
            let last = state
                .tui_log_lines
                .last()
                .map(|s| compact_log_line(s))
                .unwrap_or_else(|| "(no log)".to_string());
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(" log ", Style::default().fg(C_MUTED)),
                    Span::styled(last, Style::default().fg(C_SECONDARY)),
                ])),
                area,
            );
            return;
        }

        let block = pane_chrome("log", None, focused, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let logs = &state.tui_log_lines;
        let height = inner.height as usize;
        let max_scroll = logs.len().saturating_sub(height);

        // Follow the tail while the view is already at the bottom.
        if logs.len() > self.last_log_count {
            if self.scroll + 1 >= max_scroll {
                self.scroll = usize::MAX;
            }
            self.last_log_count = logs.len();
        }
        self.scroll = self.scroll.min(max_scroll);

        let lines: Vec<Line> = logs
            .iter()
            .skip(self.scroll)
            .take(height)
            .map(|raw| {
                let line = compact_log_line(raw);
                let color = if line.contains(" ERROR ") || line.starts_with("ERROR") {
                    C_ERROR
                } else if line.contains(" WARN ") || line.starts_with("WARN") {
                    C_LOADING
                } else {
                    C_MUTED
                };
                Line::from(vec![Span::raw(" "), Span::styled(line, Style::default().fg(color))])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// `2024-01-05T10:00:00.123Z  INFO ado_tui::app: loaded 3 songs`
/// becomes `10:00:00 INFO loaded 3 songs` (date kept when not today).
fn compact_log_line(raw: &str) -> String {
    let mut rest = raw.trim();
    let mut head: Vec<String> = Vec::new();

    if let Some((tok, rem)) = split_first_token(rest) {
        if let Some(ts) = compact_timestamp(tok) {
            head.push(ts);
            rest = rem.trim_start();
        }
    }

    if let Some((tok, rem)) = split_first_token(rest) {
        let upper = tok.to_ascii_uppercase();
        if matches!(upper.as_str(), "TRACE" | "DEBUG" | "INFO" | "WARN" | "ERROR") {
            head.push(upper);
            rest = rem.trim_start();
        }
    }

    // Module path target, e.g. "ado_core::api: "
    if let Some((target, msg)) = rest.split_once(": ") {
        if !target.is_empty()
            && target.len() <= 48
            && target
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':'))
        {
            rest = msg.trim_start();
        }
    }

    match (head.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => head.join(" "),
        (false, false) => format!("{} {}", head.join(" "), rest),
    }
}

fn compact_timestamp(token: &str) -> Option<String> {
    let dt = chrono::DateTime::parse_from_rfc3339(token).ok()?;
    let local = dt.with_timezone(&chrono::Local);
    let fmt = if local.date_naive() == chrono::Local::now().date_naive() {
        "%H:%M:%S"
    } else {
        "%m-%d %H:%M"
    };
    Some(local.format(fmt).to_string())
}

fn split_first_token(s: &str) -> Option<(&str, &str)> {
    let mut parts = s.splitn(2, char::is_whitespace);
    let first = parts.next()?.trim();
    if first.is_empty() {
        return None;
    }
    Some((first, parts.next().unwrap_or("")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_strips_level_padding_and_target() {
        assert_eq!(
            compact_log_line(" WARN ado_core::api: request failed"),
            "WARN request failed"
        );
    }

    #[test]
    fn test_compact_keeps_today_time_only() {
        let now = chrono::Local::now();
        let raw = format!("{}  INFO ado_tui::app: loaded 3 songs", now.to_rfc3339());
        let expected = format!("{} INFO loaded 3 songs", now.format("%H:%M:%S"));
        assert_eq!(compact_log_line(&raw), expected);
    }

    #[test]
    fn test_compact_plain_messages() {
        assert_eq!(compact_log_line("mpv: exited"), "exited");
        assert_eq!(compact_log_line("just a message"), "just a message");
        assert_eq!(compact_log_line("url http://x: y"), "url http://x: y");
    }
}
