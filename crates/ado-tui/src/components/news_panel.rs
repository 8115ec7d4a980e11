//! NewsPanel: filter chips and post cards.

use ado_core::library::View;
use ado_core::news::{NewsFilter, NewsStatus};
use ado_core::protocol::NewsPost;
use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{
        hex_color, style_bold, style_muted, style_secondary, C_ACCENT, C_ERROR, C_FEATURED, C_LOADING,
        C_PRIMARY, C_SELECTION_BG, C_TAG,
    },
    widgets::{
        fit_width,
        pane_chrome::{pane_chrome, Badge},
        toast::Severity,
    },
};

const CARD_HEIGHT: u16 = 4;

#[derive(Default)]
pub struct NewsPanel {
    scroll: usize,
    cards_area: Rect,
}

impl NewsPanel {
    fn card_at(&self, y: u16, len: usize) -> Option<usize> {
        let area = self.cards_area;
        if y < area.y || y >= area.y + area.height {
            return None;
        }
        let idx = ((y - area.y) / CARD_HEIGHT) as usize + self.scroll;
        (idx < len).then_some(idx)
    }
}

fn admin_only(state: &AppState, action: Action) -> Vec<Action> {
    if state.library.is_admin() {
        vec![action]
    } else {
        vec![Action::Toast(Severity::Warning, "admin mode required (press a)".to_string())]
    }
}

impl Component for NewsPanel {
    fn id(&self) -> ComponentId {
        ComponentId::NewsPanel
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => vec![Action::NewsPrev],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::NewsNext],
            KeyCode::Enter | KeyCode::Char(' ') => vec![Action::OpenDetail],
            KeyCode::Char('f') => vec![Action::CycleNewsFilter],
            KeyCode::Char('F') => vec![Action::SetNewsFilter(NewsFilter::Featured)],
            KeyCode::Esc => vec![Action::SetNewsFilter(NewsFilter::All)],
            KeyCode::Char('n') => {
                let mut actions = admin_only(state, Action::SwitchView(View::Upload));
                if state.library.is_admin() {
                    actions.push(Action::FocusPane(ComponentId::NewsForm));
                }
                actions
            }
            KeyCode::Char('d') => match state.news.selected_post() {
                Some(post) => admin_only(state, Action::DeletePost(post.id.clone())),
                None => vec![],
            },
            KeyCode::Char('y') => state
                .news
                .selected_post()
                .and_then(|p| p.source_url.clone())
                .map(|url| vec![Action::CopyToClipboard(url)])
                .unwrap_or_default(),
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => vec![Action::NewsPrev],
            MouseEventKind::ScrollDown => vec![Action::NewsNext],
            MouseEventKind::Down(MouseButton::Left) => {
                match self.card_at(event.row, state.news.posts().len()) {
                    Some(idx) if idx == state.news.selected_index() => vec![Action::OpenDetail],
                    Some(idx) => {
                        let current = state.news.selected_index();
                        let steps = idx.abs_diff(current);
                        let step = if idx > current { Action::NewsNext } else { Action::NewsPrev };
                        vec![step; steps]
                    }
                    None => vec![],
                }
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let news = &state.news;
        let badge = match news.status() {
            NewsStatus::Loading => Some(Badge { text: "LOADING", color: C_LOADING }),
            NewsStatus::Failed(_) => Some(Badge { text: "ERROR", color: C_ERROR }),
            _ => None,
        };
        let block = pane_chrome("news", Some('3'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [chips_area, _, cards_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .areas(inner);
        frame.render_widget(Paragraph::new(filter_chips(state)), chips_area);
        self.cards_area = cards_area;

        match news.status() {
            NewsStatus::Failed(err) => {
                let lines = vec![
                    Line::from(Span::styled(" ✗ could not load news", style_bold(C_ERROR))),
                    Line::from(Span::styled(
                        fit_width(&format!("   {}", err), cards_area.width as usize),
                        style_secondary(),
                    )),
                    Line::from(""),
                    Line::from(Span::styled("   press r to retry", style_muted())),
                ];
                frame.render_widget(Paragraph::new(lines), cards_area);
                return;
            }
            NewsStatus::Loading | NewsStatus::Idle if news.posts().is_empty() => {
                frame.render_widget(
                    Paragraph::new(Span::styled("  loading news...", style_muted())),
                    cards_area,
                );
                return;
            }
            _ => {}
        }
        if news.posts().is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  no posts in this category", style_muted())),
                cards_area,
            );
            return;
        }

        let per_page = (cards_area.height / CARD_HEIGHT).max(1) as usize;
        let selected = news.selected_index();
        if selected < self.scroll {
            self.scroll = selected;
        } else if selected >= self.scroll + per_page {
            self.scroll = selected + 1 - per_page;
        }

        for (slot, (idx, post)) in news.posts().iter().enumerate().skip(self.scroll).take(per_page).enumerate() {
            let card_area = Rect::new(
                cards_area.x,
                cards_area.y + slot as u16 * CARD_HEIGHT,
                cards_area.width,
                CARD_HEIGHT.min(cards_area.height.saturating_sub(slot as u16 * CARD_HEIGHT)),
            );
            draw_card(frame, card_area, post, idx == selected, state);
        }
    }
}

fn filter_chips(state: &AppState) -> Line<'static> {
    let current = state.news.filter();
    let chip = |label: String, active: bool, color: Color| {
        let style = if active {
            Style::default().fg(color).bg(C_SELECTION_BG).add_modifier(Modifier::BOLD)
        } else {
            style_muted()
        };
        Span::styled(format!(" {} ", label), style)
    };

    let mut spans = vec![
        chip("All".to_string(), *current == NewsFilter::All, C_PRIMARY),
        chip("★ Featured".to_string(), *current == NewsFilter::Featured, C_FEATURED),
    ];
    for category in state.news.categories() {
        let active = matches!(current, NewsFilter::Category(name) if *name == category.name);
        let color = hex_color(category.color()).unwrap_or(C_ACCENT);
        spans.push(chip(format!("{} {}", category.icon(), category.name), active, color));
    }
    Line::from(spans)
}

fn draw_card(frame: &mut Frame, area: Rect, post: &NewsPost, selected: bool, state: &AppState) {
    let width = area.width as usize;
    let (color, icon) = state.news.category_style(&post.category);
    let category_color = hex_color(color).unwrap_or(C_ACCENT);
    let bg = if selected { C_SELECTION_BG } else { Color::Reset };

    let date = post.display_date();
    let marker = if selected { "▸ " } else { "  " };
    let star = if post.is_featured { "★ " } else { "" };
    let title_width = width.saturating_sub(marker.width() + star.width() + date.width() + 2);
    let title = fit_width(&post.title, title_width);
    let pad = title_width.saturating_sub(title.width());

    let title_line = Line::from(vec![
        Span::styled(marker, Style::default().fg(C_ACCENT)),
        Span::styled(star, Style::default().fg(C_FEATURED)),
        Span::styled(title, style_bold(C_PRIMARY)),
        Span::raw(" ".repeat(pad + 1)),
        Span::styled(date, style_muted()),
    ]);

    let mut meta = vec![
        Span::raw("  "),
        Span::styled(format!("{} {}", icon, post.category), Style::default().fg(category_color)),
    ];
    if let Some(author) = post.author.as_deref().filter(|a| !a.is_empty()) {
        meta.push(Span::styled(format!(" · {}", author), style_secondary()));
    }
    for tag in post.card_tags() {
        meta.push(Span::styled(format!(" #{}", tag), Style::default().fg(C_TAG)));
    }

    let summary = fit_width(&post.summary().replace('\n', " "), width.saturating_sub(2));
    let lines = vec![
        title_line,
        Line::from(meta),
        Line::from(vec![Span::raw("  "), Span::styled(summary, style_secondary())]),
    ];
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}
