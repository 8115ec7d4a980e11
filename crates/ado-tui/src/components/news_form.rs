//! NewsForm: admin news post creation.

use ado_core::news::NewsDraft;
use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_muted, style_secondary, C_LOADING},
    widgets::{
        form::{EditOutcome, Field, Form},
        pane_chrome::{pane_chrome, Badge},
    },
};

const TITLE: usize = 0;
const CONTENT: usize = 1;
const EXCERPT: usize = 2;
const CATEGORY: usize = 3;
const SOURCE_URL: usize = 4;
const SOURCE_NAME: usize = 5;
const AUTHOR: usize = 6;
const TAGS: usize = 7;
const IMAGE: usize = 8;
const FEATURED: usize = 9;

pub struct NewsForm {
    form: Form,
    fields_area: Rect,
}

impl NewsForm {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                Field::text("Title", "required"),
                Field::text("Content", "required"),
                Field::text("Excerpt", "optional, card summary"),
                Field::text("Category", "required, see below"),
                Field::text("Source URL", "optional"),
                Field::text("Source name", "optional"),
                Field::text("Author", "optional"),
                Field::text("Tags", "comma separated"),
                Field::text("Image file", "optional .jpg/.png/.webp"),
                Field::choice("Featured", &["no", "yes"]),
            ]),
            fields_area: Rect::default(),
        }
    }

    fn to_draft(&self) -> NewsDraft {
        NewsDraft {
            title: self.form.value(TITLE).to_string(),
            content: self.form.value(CONTENT).to_string(),
            excerpt: self.form.value(EXCERPT).to_string(),
            category: self.form.value(CATEGORY).to_string(),
            source_url: self.form.value(SOURCE_URL).to_string(),
            source_name: self.form.value(SOURCE_NAME).to_string(),
            author: self.form.value(AUTHOR).to_string(),
            is_featured: self.form.value(FEATURED) == "yes",
            tags: self.form.value(TAGS).to_string(),
            image_path: self.form.value(IMAGE).to_string(),
        }
    }
}

impl Default for NewsForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for NewsForm {
    fn id(&self) -> ComponentId {
        ComponentId::NewsForm
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if self.form.is_editing() {
            return match self.form.handle_edit_key(key) {
                EditOutcome::Done => vec![Action::EndInput],
                EditOutcome::Editing => vec![],
            };
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.form.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.form.select_next(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.form.activate() {
                    return vec![Action::BeginInput];
                }
            }
            KeyCode::Char('c') if self.form.selected() == CATEGORY => {
                // Cycle through the categories the server knows.
                let names: Vec<&str> = state.news.categories().iter().map(|c| c.name.as_str()).collect();
                if !names.is_empty() {
                    let pos = names.iter().position(|n| *n == self.form.value(CATEGORY));
                    let next = pos.map(|p| (p + 1) % names.len()).unwrap_or(0);
                    self.form.set_value(CATEGORY, names[next]);
                }
            }
            KeyCode::Char('s') if !state.news_submitting => {
                return vec![Action::SubmitNews(self.to_draft())];
            }
            KeyCode::Char('x') => return vec![Action::NewsFormCleared],
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            let area = self.fields_area;
            if event.row >= area.y && !self.form.is_editing() {
                self.form.select_row((event.row - area.y) as usize);
            }
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::NewsFormCleared = action {
            self.form.clear();
        }
        vec![]
    }

    fn is_editing(&self) -> bool {
        self.form.is_editing()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = state
            .news_submitting
            .then_some(Badge { text: "POSTING", color: C_LOADING });
        let block = pane_chrome("new post", None, focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [fields_area, _, hint_area] = Layout::vertical([
            Constraint::Length(FEATURED as u16 + 1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(inner);
        self.fields_area = fields_area;
        self.form.draw(frame, fields_area, focused);

        let categories: Vec<&str> = state.news.categories().iter().map(|c| c.name.as_str()).collect();
        let categories = if categories.is_empty() {
            "(none loaded)".to_string()
        } else {
            categories.join(", ")
        };
        let tags = if state.news_tags.is_empty() {
            "(none)".to_string()
        } else {
            state.news_tags.join(", ")
        };
        let lines = vec![
            Line::from(Span::styled(format!("  categories: {}", categories), style_secondary())),
            Line::from(Span::styled(format!("  known tags: {}", tags), style_secondary())),
            Line::from(""),
            Line::from(Span::styled(
                "  enter edit · c next category · space toggle · s post · x clear",
                style_muted(),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), hint_area);
    }
}
