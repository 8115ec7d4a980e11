//! NewsDetail: full post popup over the news view.

use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::help_overlay::{centered_rect, overlay_block},
    theme::{hex_color, style_bold, style_muted, style_secondary, C_ACCENT, C_FEATURED, C_PRIMARY, C_TAG},
};

#[derive(Default)]
pub struct NewsDetail {
    scroll: u16,
}

impl Component for NewsDetail {
    fn id(&self) -> ComponentId {
        ComponentId::NewsDetail
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter | KeyCode::Backspace => {
                return vec![Action::CloseDetail];
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::Char('y') => {
                if let Some(url) = state.news.detail_post().and_then(|p| p.source_url.clone()) {
                    return vec![Action::CopyToClipboard(url)];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            MouseEventKind::ScrollDown => self.scroll = self.scroll.saturating_add(1),
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::OpenDetail = action {
            self.scroll = 0;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let Some(post) = state.news.detail_post() else {
            return;
        };
        let popup = centered_rect(80, area.height.saturating_sub(4), area);
        let (color, icon) = state.news.category_style(&post.category);

        let mut meta = vec![Span::styled(
            format!("{} {}", icon, post.category),
            style_bold(hex_color(color).unwrap_or(C_ACCENT)),
        )];
        if post.is_featured {
            meta.push(Span::styled("  ★ featured", Style::default().fg(C_FEATURED)));
        }
        meta.push(Span::styled(format!("  {}", post.display_date()), style_muted()));

        let mut lines = vec![
            Line::from(Span::styled(post.title.clone(), style_bold(C_PRIMARY))),
            Line::from(meta),
        ];
        if let Some(author) = post.author.as_deref().filter(|a| !a.is_empty()) {
            lines.push(Line::from(Span::styled(format!("by {}", author), style_secondary())));
        }
        let source = match (post.source_name.as_deref(), post.source_url.as_deref()) {
            (Some(name), Some(url)) => Some(format!("source: {} <{}>", name, url)),
            (Some(name), None) => Some(format!("source: {}", name)),
            (None, Some(url)) => Some(format!("source: {}", url)),
            (None, None) => None,
        };
        if let Some(source) = source {
            lines.push(Line::from(Span::styled(source, style_secondary())));
        }
        if let Some(image) = post.image_url.as_deref().filter(|u| !u.is_empty()) {
            lines.push(Line::from(Span::styled(format!("image: {}", image), style_muted())));
        }
        if !post.tags.is_empty() {
            let tags: Vec<Span> = post
                .tags
                .iter()
                .map(|t| Span::styled(format!("#{} ", t), Style::default().fg(C_TAG)))
                .collect();
            lines.push(Line::from(tags));
        }
        lines.push(Line::from(""));
        lines.extend(
            post.content
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(C_PRIMARY)))),
        );
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("esc close  ↑↓ scroll  y copy source", style_muted())));

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(overlay_block())
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            popup,
        );
    }
}
