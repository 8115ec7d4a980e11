//! SongList: the song cards of the current filter, with a detail strip and
//! seek bar for the selected card.

use ado_core::playback::CardStatus;
use ado_core::protocol::{Song, SongCategory};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_bold, style_muted, style_secondary, C_ACCENT, C_COVER, C_ERROR, C_LOADING, C_ORIGINAL,
        C_PLAYING, C_PRIMARY, C_SELECTION_BG,
    },
    widgets::{
        filter_input::{FilterAction, FilterInput},
        fit_width,
        pane_chrome::{pane_chrome, Badge},
        progress_bar::{draw_progress, seek_target},
        scrollable_list::ScrollableList,
    },
};

const DETAIL_HEIGHT: u16 = 5;

pub struct SongList {
    list: ScrollableList<Song>,
    filter_input: FilterInput,
    seen_rev: Option<u64>,
    /// Song to select once the list next rebuilds (artwork selection).
    pending_select: Option<String>,
    list_area: Rect,
    bar_area: Rect,
}

impl SongList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(|song: &Song, q: &str| {
                song.title.to_lowercase().contains(&q.to_lowercase())
            }),
            filter_input: FilterInput::new("search titles..."),
            seen_rev: None,
            pending_select: None,
            list_area: Rect::default(),
            bar_area: Rect::default(),
        }
    }

    /// Rebuild from the library when the collection or filter changed,
    /// keeping the selected song where possible.
    fn sync(&mut self, state: &AppState) {
        if self.seen_rev == Some(state.songs_rev) {
            return;
        }
        self.seen_rev = Some(state.songs_rev);
        let keep = self
            .pending_select
            .take()
            .or_else(|| self.list.selected_item().map(|s| s.id.clone()));
        let songs = state.library.visible_songs().into_iter().cloned().collect();
        self.list.set_items(songs);
        if let Some(id) = keep {
            self.list.select_where(|s| s.id == id);
        }
    }

    fn selected_id(&self) -> Option<String> {
        self.list.selected_item().map(|s| s.id.clone())
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Vec<Action> {
        match key.code {
            KeyCode::Up => self.list.select_up(1),
            KeyCode::Down => self.list.select_down(1),
            _ => match self.filter_input.handle_key(key) {
                FilterAction::Changed(q) => self.list.set_filter(&q),
                FilterAction::Confirmed => return vec![Action::CloseFilter],
                FilterAction::Cancelled => {
                    self.list.set_filter("");
                    return vec![Action::CloseFilter];
                }
            },
        }
        vec![]
    }
}

impl Default for SongList {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for SongList {
    fn id(&self) -> ComponentId {
        ComponentId::SongList
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        self.sync(state);
        if self.filter_input.is_active() {
            return self.handle_filter_key(key);
        }

        let step = if key.modifiers.contains(KeyModifiers::SHIFT) { 5 } else { 1 };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(step),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(id) = self.selected_id() {
                    return vec![Action::TogglePlay(id)];
                }
            }
            KeyCode::Left => {
                if let Some(id) = self.selected_id() {
                    return vec![Action::SeekBy(id, -state.seek_step)];
                }
            }
            KeyCode::Right => {
                if let Some(id) = self.selected_id() {
                    return vec![Action::SeekBy(id, state.seek_step)];
                }
            }
            KeyCode::Char('f') => return vec![Action::SetFilter(state.library.filter().next())],
            KeyCode::Char('/') => {
                self.filter_input.activate();
                return vec![Action::OpenFilter];
            }
            KeyCode::Esc if !self.list.filter.is_empty() => {
                self.filter_input.clear();
                self.list.set_filter("");
            }
            KeyCode::Char('y') => {
                if let Some(song) = self.list.selected_item() {
                    return vec![Action::CopyToClipboard(song.audio_url.clone())];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        self.sync(state);
        let (x, y) = (event.column, event.row);
        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(1),
            MouseEventKind::ScrollDown => self.list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                let in_bar = y == self.bar_area.y
                    && x >= self.bar_area.x
                    && x < self.bar_area.x + self.bar_area.width;
                if in_bar {
                    let Some(id) = self.selected_id() else {
                        return vec![];
                    };
                    let Some(card) = state.library.playback().card(&id) else {
                        return vec![];
                    };
                    let target = seek_target(self.bar_area, x, card.progress(), card.effective_duration());
                    return target.map(|secs| vec![Action::Seek(id, secs)]).unwrap_or_default();
                }
                let area = self.list_area;
                if y >= area.y && y < area.y + area.height && x >= area.x && x < area.x + area.width {
                    let before = self.list.selected;
                    if self.list.handle_click((y - area.y) as usize) && before == self.list.selected {
                        if let Some(id) = self.selected_id() {
                            return vec![Action::TogglePlay(id)];
                        }
                    }
                }
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::SelectCover(id) => {
                // A leftover title search could hide the chosen song.
                self.filter_input.clear();
                self.filter_input.deactivate();
                self.list.set_filter("");
                self.pending_select = Some(id.clone());
            }
            Action::CloseFilter => {
                self.filter_input.deactivate();
            }
            _ => {}
        }
        vec![]
    }

    fn is_editing(&self) -> bool {
        self.filter_input.is_active()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.sync(state);
        let library = &state.library;

        let title = format!("songs · {}", library.filter().label());
        let count = format!("{}/{}", self.list.len(), library.songs().len());
        let badge = if library.is_loading() {
            Badge { text: "LOADING", color: C_LOADING }
        } else if library.load_error().is_some() {
            Badge { text: "ERROR", color: C_ERROR }
        } else {
            Badge { text: &count, color: C_ACCENT }
        };
        let block = pane_chrome(&title, Some('1'), focused, Some(badge));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let show_filter = self.filter_input.is_active() || !self.list.filter.is_empty();
        let error_height = if library.load_error().is_some() { 2 } else { 0 };
        let [error_area, filter_area, list_area, detail_area] = Layout::vertical([
            Constraint::Length(error_height),
            Constraint::Length(u16::from(show_filter)),
            Constraint::Min(1),
            Constraint::Length(DETAIL_HEIGHT),
        ])
        .areas(inner);

        if let Some(err) = library.load_error() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(
                        fit_width(&format!(" ✗ could not load songs: {}", err), error_area.width as usize),
                        style_bold(C_ERROR),
                    )),
                    Line::from(Span::styled("   press r to retry", style_secondary())),
                ]),
                error_area,
            );
        }
        if show_filter {
            self.filter_input.draw(frame, filter_area);
        }

        self.list_area = list_area;
        let height = list_area.height as usize;
        self.list.ensure_visible(height);

        if self.list.is_empty() {
            let msg = if library.is_loading() {
                "  loading songs..."
            } else if library.songs().is_empty() {
                "  no songs yet"
            } else {
                "  no songs match"
            };
            frame.render_widget(Paragraph::new(Span::styled(msg, style_muted())), list_area);
        } else {
            let width = list_area.width as usize;
            let lines: Vec<Line> = self
                .list
                .visible_items(height)
                .into_iter()
                .map(|(selected, song)| song_row(song, selected, width, state))
                .collect();
            frame.render_widget(Paragraph::new(lines), list_area);
        }

        self.draw_detail(frame, detail_area, state);
    }
}

impl SongList {
    fn draw_detail(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        self.bar_area = Rect::default();
        if area.height < 3 {
            return;
        }
        let Some(song) = self.list.selected_item() else {
            return;
        };
        let card = state.library.playback().card(&song.id);
        let status = card.map(|c| c.status().clone()).unwrap_or(CardStatus::Idle);

        let separator = Line::from(Span::styled("─".repeat(area.width as usize), style_muted()));
        let mut status_spans = vec![
            Span::styled(format!(" {} ", status_icon(&status)), Style::default().fg(status_color(&status))),
            Span::styled(status.label().to_string(), Style::default().fg(status_color(&status))),
        ];
        if let Some(err) = card.and_then(|c| c.error()) {
            status_spans.push(Span::styled(format!(" · {}", err), Style::default().fg(C_ERROR)));
        }
        let description = song.description().unwrap_or("no description");
        let lines = vec![
            separator,
            Line::from(Span::styled(
                fit_width(&format!(" {}", song.title), area.width as usize),
                style_bold(C_PRIMARY),
            )),
            Line::from(status_spans),
            Line::from(Span::styled(format!(" {}", description), style_secondary())),
        ];
        let [text_area, bar_area] =
            Layout::vertical([Constraint::Length(area.height - 1), Constraint::Length(1)]).areas(area);
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), text_area);

        let bar_area = Rect::new(bar_area.x + 1, bar_area.y, bar_area.width.saturating_sub(2), 1);
        let (position, duration) = card
            .map(|c| (c.progress(), c.effective_duration()))
            .unwrap_or((0.0, 0.0));
        let color = if card.is_some_and(|c| c.is_active()) { C_PLAYING } else { C_ACCENT };
        draw_progress(frame, bar_area, position, duration, color);
        self.bar_area = bar_area;
    }
}

fn song_row(song: &Song, selected: bool, width: usize, state: &AppState) -> Line<'static> {
    let card = state.library.playback().card(&song.id);
    let status = card.map(|c| c.status().clone()).unwrap_or(CardStatus::Idle);
    let is_current = state.library.playback().current() == Some(song.id.as_str());

    let (tag, tag_color) = match song.category {
        Some(SongCategory::Original) => ("original", C_ORIGINAL),
        Some(SongCategory::Cover) => ("cover", C_COVER),
        None => ("", Color::Reset),
    };
    let title_width = width.saturating_sub(4 + tag.width() + 1);
    let title = fit_width(&song.title, title_width);
    let pad = title_width.saturating_sub(title.width());

    let title_style = if is_current {
        style_bold(C_ACCENT)
    } else if selected {
        Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_PRIMARY)
    };
    let bg = if selected { C_SELECTION_BG } else { Color::Reset };

    Line::from(vec![
        Span::styled(if selected { "▸" } else { " " }, Style::default().fg(C_ACCENT)),
        Span::styled(format!(" {} ", status_icon(&status)), Style::default().fg(status_color(&status))),
        Span::styled(title, title_style),
        Span::raw(" ".repeat(pad + 1)),
        Span::styled(tag, Style::default().fg(tag_color)),
    ])
    .style(Style::default().bg(bg))
}

fn status_icon(status: &CardStatus) -> &'static str {
    match status {
        CardStatus::Idle => "·",
        CardStatus::Loading => "…",
        CardStatus::Playing => "▶",
        CardStatus::Paused => "⏸",
        CardStatus::Error(_) => "✗",
    }
}

fn status_color(status: &CardStatus) -> Color {
    match status {
        CardStatus::Idle | CardStatus::Paused => C_PRIMARY,
        CardStatus::Loading => C_LOADING,
        CardStatus::Playing => C_PLAYING,
        CardStatus::Error(_) => C_ERROR,
    }
}
