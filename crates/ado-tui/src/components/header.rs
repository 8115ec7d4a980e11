//! Header: two-row top bar.
//!
//! Row 1: app name, view tabs, admin badge.
//! Row 2: current song with its status, position and the volume.
//!
//! Not focusable.

use ado_core::library::View;
use ado_core::playback::CardStatus;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app_state::AppState,
    theme::{
        style_bold, style_muted, style_secondary, C_ACCENT, C_BADGE_ADMIN, C_ERROR, C_LOADING, C_MUTED,
        C_PLAYING, C_PRIMARY, C_SELECTION_BG,
    },
    widgets::{fit_width, progress_bar::fmt_time},
};

#[derive(Default)]
pub struct Header {
    /// `(view, first column, last column + 1)` of each tab as last drawn.
    tabs: Vec<(View, u16, u16)>,
    tab_row: u16,
}

impl Header {
    /// The view whose tab was drawn at (`x`, `y`).
    pub fn tab_at(&self, x: u16, y: u16) -> Option<View> {
        if y != self.tab_row {
            return None;
        }
        self.tabs
            .iter()
            .find(|(_, start, end)| x >= *start && x < *end)
            .map(|(view, _, _)| *view)
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        if area.height == 0 {
            return;
        }
        self.tab_row = area.y;
        self.tabs.clear();

        let library = &state.library;
        let mut spans = vec![Span::styled(" ado-music ", style_bold(C_ACCENT))];
        let mut x = area.x + " ado-music ".width() as u16;
        for (i, view) in View::ALL.iter().enumerate() {
            let label = format!(" {} {} ", i + 1, tab_label(*view));
            let style = if *view == library.view() {
                Style::default().fg(C_PRIMARY).bg(C_SELECTION_BG).add_modifier(Modifier::BOLD)
            } else if view.requires_admin() && !library.is_admin() {
                Style::default().fg(C_MUTED)
            } else {
                style_secondary()
            };
            let w = label.width() as u16;
            self.tabs.push((*view, x, x + w));
            x += w;
            spans.push(Span::styled(label, style));
        }
        if library.is_admin() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(" ADMIN ", style_bold(C_BADGE_ADMIN)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), Rect { height: 1, ..area });

        if area.height > 1 {
            let row2 = Rect::new(area.x, area.y + 1, area.width, 1);
            frame.render_widget(Paragraph::new(now_playing_line(state, row2.width as usize)), row2);
        }
    }
}

fn tab_label(view: View) -> &'static str {
    match view {
        View::Covers => "Artwork",
        other => other.label(),
    }
}

fn now_playing_line(state: &AppState, width: usize) -> Line<'static> {
    let playback = state.library.playback();
    let volume = format!("vol {}%", (playback.volume() * 100.0).round() as u32);

    let Some(card) = playback.current_card().or_else(|| playback.loaded().and_then(|id| playback.card(id))) else {
        return Line::from(vec![
            Span::styled(" nothing playing", style_muted()),
            Span::styled(format!("  ·  {}", volume), style_muted()),
        ]);
    };
    let title = state
        .library
        .song(card.song_id())
        .map(|s| s.title.clone())
        .unwrap_or_else(|| card.song_id().to_string());

    let (icon, color) = match card.status() {
        CardStatus::Playing => ("▶", C_PLAYING),
        CardStatus::Loading => ("…", C_LOADING),
        CardStatus::Paused => ("⏸", C_PRIMARY),
        CardStatus::Error(_) => ("✗", C_ERROR),
        CardStatus::Idle => ("·", C_MUTED),
    };
    let clock = format!(
        "{} / {}",
        fmt_time(card.progress()),
        fmt_time(card.effective_duration())
    );
    let tail = format!("  {}  ·  {}", clock, volume);
    let title = fit_width(&title, width.saturating_sub(tail.width() + 4));

    Line::from(vec![
        Span::styled(format!(" {} ", icon), Style::default().fg(color)),
        Span::styled(title, style_bold(C_PRIMARY)),
        Span::styled(tail, style_secondary()),
    ])
}
