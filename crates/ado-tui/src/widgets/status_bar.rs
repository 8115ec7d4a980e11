//! Status bar: mode label, volume and the key hints for the current view.

use ado_core::library::View;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MODE_FILTER, C_MODE_INPUT, C_MODE_NORMAL, C_MUTED, C_SECONDARY, C_SEPARATOR};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
    /// Typing into a form field or the login prompt.
    Input,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Filter => "FILTER",
            Self::Input => "INPUT",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Filter => C_MODE_FILTER,
            Self::Input => C_MODE_INPUT,
        }
    }
}

pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn key_hints(mode: InputMode, view: View) -> &'static str {
    match mode {
        InputMode::Filter => "type to filter  ↑↓ move  Enter keep  Esc clear+close",
        InputMode::Input => "type  Enter/Esc done",
        InputMode::Normal => match view {
            View::Songs => {
                "↑↓/jk select  Enter play/pause  ,/. seek  +/- vol  f filter  / search  y copy  1-4 views  a admin  ? help  q quit"
            }
            View::Covers => "←→↑↓ move  Enter open song  y copy  1-4 views  ? help  q quit",
            View::News => {
                "↑↓ select  Enter read  f category  F featured  r reload  n new  d delete  ? help  q quit"
            }
            View::Upload => "↑↓ field  Enter edit  Space toggle  s submit  Tab form  ? help  q quit",
        },
    }
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, view: View, volume: f32) {
    let spans = vec![
        Span::styled(
            format!(" {} ", mode.label()),
            Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("vol {:>3}% ", (volume * 100.0).round() as u32),
            Style::default().fg(C_SECONDARY),
        ),
        Span::styled(key_hints(mode, view), Style::default().fg(C_MUTED)),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
