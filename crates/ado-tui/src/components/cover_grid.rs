//! CoverGrid: artwork tiles for every song that has a cover.  Choosing a
//! tile jumps to that song in the list.

use ado_core::protocol::{Song, SongCategory};
use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        style_bold, style_muted, style_secondary, C_ACCENT, C_COVER, C_ORIGINAL, C_PANEL_BORDER,
        C_PANEL_BORDER_FOCUSED, C_PLAYING, C_PRIMARY,
    },
    widgets::{
        fit_width,
        pane_chrome::{pane_chrome, Badge},
    },
};

const TILE_WIDTH: u16 = 28;
const TILE_HEIGHT: u16 = 6;

#[derive(Default)]
pub struct CoverGrid {
    selected: usize,
    scroll_row: usize,
    columns: usize,
    grid_area: Rect,
}

impl CoverGrid {
    fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = self.selected.saturating_add_signed(delta).min(len - 1);
    }

    fn selected_song<'a>(&self, covers: &[&'a Song]) -> Option<&'a Song> {
        covers.get(self.selected).copied()
    }

    /// Index of the tile drawn at (`x`, `y`), if any.
    fn tile_at(&self, x: u16, y: u16, len: usize) -> Option<usize> {
        let area = self.grid_area;
        if x < area.x || y < area.y || x >= area.x + area.width || y >= area.y + area.height {
            return None;
        }
        let col = ((x - area.x) / TILE_WIDTH) as usize;
        let row = ((y - area.y) / TILE_HEIGHT) as usize + self.scroll_row;
        if col >= self.columns.max(1) {
            return None;
        }
        let idx = row * self.columns.max(1) + col;
        (idx < len).then_some(idx)
    }
}

impl Component for CoverGrid {
    fn id(&self) -> ComponentId {
        ComponentId::CoverGrid
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        let covers = state.library.covers();
        let cols = self.columns.max(1) as isize;
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.move_by(-1, covers.len()),
            KeyCode::Right | KeyCode::Char('l') => self.move_by(1, covers.len()),
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-cols, covers.len()),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(cols, covers.len()),
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => self.selected = covers.len().saturating_sub(1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(song) = self.selected_song(&covers) {
                    return vec![Action::SelectCover(song.id.clone())];
                }
            }
            KeyCode::Char('y') => {
                if let Some(song) = self.selected_song(&covers) {
                    return vec![Action::CopyToClipboard(state.cover_url(&song.id))];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        let covers = state.library.covers();
        match event.kind {
            MouseEventKind::ScrollUp => self.move_by(-(self.columns.max(1) as isize), covers.len()),
            MouseEventKind::ScrollDown => self.move_by(self.columns.max(1) as isize, covers.len()),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(idx) = self.tile_at(event.column, event.row, covers.len()) {
                    if idx == self.selected {
                        return vec![Action::SelectCover(covers[idx].id.clone())];
                    }
                    self.selected = idx;
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let covers = state.library.covers();
        let count = covers.len().to_string();
        let block = pane_chrome(
            "artwork",
            Some('2'),
            focused,
            Some(Badge { text: &count, color: C_ACCENT }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.grid_area = inner;

        if covers.is_empty() {
            let msg = if state.library.is_loading() {
                "  loading songs..."
            } else {
                "  no artwork yet"
            };
            frame.render_widget(Paragraph::new(Span::styled(msg, style_muted())), inner);
            return;
        }

        self.columns = (inner.width / TILE_WIDTH).max(1) as usize;
        self.selected = self.selected.min(covers.len() - 1);
        let visible_rows = (inner.height / TILE_HEIGHT).max(1) as usize;
        let selected_row = self.selected / self.columns;
        if selected_row < self.scroll_row {
            self.scroll_row = selected_row;
        } else if selected_row >= self.scroll_row + visible_rows {
            self.scroll_row = selected_row + 1 - visible_rows;
        }

        let current = state.library.playback().current();
        for (idx, song) in covers.iter().enumerate().skip(self.scroll_row * self.columns) {
            let row = idx / self.columns - self.scroll_row;
            let col = idx % self.columns;
            if row >= visible_rows {
                break;
            }
            let tile = Rect::new(
                inner.x + col as u16 * TILE_WIDTH,
                inner.y + row as u16 * TILE_HEIGHT,
                TILE_WIDTH.min(inner.width),
                TILE_HEIGHT.min(inner.height.saturating_sub(row as u16 * TILE_HEIGHT)),
            );
            let is_selected = idx == self.selected;
            let is_current = current == Some(song.id.as_str());
            draw_tile(frame, tile, song, is_selected, is_current, state);
        }
    }
}

fn draw_tile(frame: &mut Frame, area: Rect, song: &Song, selected: bool, current: bool, state: &AppState) {
    let border = if selected { C_PANEL_BORDER_FOCUSED } else { C_PANEL_BORDER };
    let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let (tag, tag_color) = match song.category {
        Some(SongCategory::Original) => ("original", C_ORIGINAL),
        Some(SongCategory::Cover) => ("cover", C_COVER),
        None => ("song", C_PRIMARY),
    };
    let title_style = if current { style_bold(C_PLAYING) } else { style_bold(C_PRIMARY) };
    let url = state.cover_url(&song.id);

    let lines = vec![
        Line::from(Span::styled(fit_width(&format!("▦ {}", song.title), width), title_style)),
        Line::from(Span::styled(tag, Style::default().fg(tag_color))),
        Line::from(Span::styled(fit_width(&url, width), style_secondary())),
        Line::from(Span::styled(if current { "▶ now playing" } else { "" }, Style::default().fg(C_PLAYING))),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_hit_testing() {
        let grid = CoverGrid {
            selected: 0,
            scroll_row: 0,
            columns: 2,
            grid_area: Rect::new(1, 1, 56, 12),
        };
        assert_eq!(grid.tile_at(1, 1, 3), Some(0));
        assert_eq!(grid.tile_at(30, 2, 3), Some(1));
        assert_eq!(grid.tile_at(2, 8, 3), Some(2));
        // Second tile of the second row does not exist.
        assert_eq!(grid.tile_at(30, 8, 3), None);
        assert_eq!(grid.tile_at(0, 0, 3), None);
    }

    #[test]
    fn test_move_is_clamped() {
        let mut grid = CoverGrid::default();
        grid.move_by(-1, 3);
        assert_eq!(grid.selected, 0);
        grid.move_by(5, 3);
        assert_eq!(grid.selected, 2);
        grid.move_by(1, 0);
        assert_eq!(grid.selected, 2);
    }
}
