//! HelpOverlay: centered popup listing the key bindings.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_OVERLAY_BG, C_PANEL_BORDER, C_PRIMARY, C_SECONDARY},
};

#[derive(Default)]
pub struct HelpOverlay {
    pub visible: bool,
}

impl Component for HelpOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::HelpOverlay
    }

    /// Swallows every key while open.
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => vec![Action::ToggleHelp],
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ToggleHelp = action {
            self.visible = !self.visible;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        if !self.visible {
            return;
        }
        let popup = centered_rect(70, 36, area);

        let mut lines = vec![
            Line::from(Span::styled(
                " keyboard shortcuts",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            section(" playback"),
            help_row("enter / space", "play or pause the selected song"),
            help_row("p", "play or pause the current song"),
            help_row(", / .", &format!("seek current song ∓{}s", state.seek_step)),
            help_row("click bar", "seek to that point"),
            help_row("+ / -", "volume up / down"),
            Line::from(""),
            section(" views"),
            help_row("1 / 2 / 3 / 4", "songs / artwork / news / upload"),
            help_row("tab / shift-tab", "next / previous pane"),
            help_row("r", "reload songs or news"),
            help_row("L", "toggle log panel"),
            Line::from(""),
            section(" songs & artwork"),
            help_row("↑ / ↓  or  j / k", "move selection"),
            help_row("f", "cycle all / originals / covers"),
            help_row("/", "search titles (esc clears + closes)"),
            help_row("enter on artwork", "open that song in the list"),
            help_row("y", "copy audio or artwork URL"),
            Line::from(""),
            section(" news"),
            help_row("enter", "read the selected post"),
            help_row("f / F / esc", "next category / featured / all"),
            help_row("n / d", "new post / delete post (admin)"),
            Line::from(""),
            section(" admin"),
            help_row("a", "admin login / logout"),
            help_row("s", "submit the focused form"),
            help_row("?", "toggle this help"),
            help_row("q / ctrl-c", "quit"),
            Line::from(""),
            Line::from(Span::styled(" press ? or esc to close", Style::default().fg(C_MUTED))),
        ];
        lines.truncate(popup.height.saturating_sub(2) as usize);

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines).block(overlay_block()),
            popup,
        );
    }
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(title, Style::default().fg(C_MUTED).add_modifier(Modifier::BOLD)))
}

fn help_row<'a>(key: &'a str, desc: &str) -> Line<'a> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{:<18}", key),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc.to_string(), Style::default().fg(C_SECONDARY)),
    ])
}

/// Border and background shared by popups.
pub fn overlay_block<'a>() -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_PANEL_BORDER))
        .style(Style::default().bg(C_OVERLAY_BG))
}

pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(height), Constraint::Min(0)])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}
