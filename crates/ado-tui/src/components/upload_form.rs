//! UploadForm: admin song upload.  Input is kept after a failed upload so it
//! can be fixed and resubmitted.

use ado_core::protocol::SongCategory;
use ado_core::upload::UploadForm;
use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{style_muted, C_LOADING},
    widgets::{
        form::{EditOutcome, Field, Form},
        pane_chrome::{pane_chrome, Badge},
    },
};

const TITLE: usize = 0;
const AUDIO: usize = 1;
const COVER: usize = 2;
const DESCRIPTION: usize = 3;
const CATEGORY: usize = 4;

pub struct UploadFormPane {
    form: Form,
    fields_area: Rect,
}

impl UploadFormPane {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                Field::text("Title", "required"),
                Field::text("Audio file", "path to an .mp3 (required)"),
                Field::text("Cover image", "optional .jpg or .png"),
                Field::text("Description", "optional"),
                Field::choice("Category", &["original", "cover"]),
            ]),
            fields_area: Rect::default(),
        }
    }

    fn to_upload(&self) -> UploadForm {
        UploadForm {
            title: self.form.value(TITLE).to_string(),
            audio_path: self.form.value(AUDIO).to_string(),
            cover_path: self.form.value(COVER).to_string(),
            description: self.form.value(DESCRIPTION).to_string(),
            category: SongCategory::parse(self.form.value(CATEGORY)).unwrap_or_default(),
        }
    }
}

impl Default for UploadFormPane {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for UploadFormPane {
    fn id(&self) -> ComponentId {
        ComponentId::UploadForm
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
            KeyCode::Char('s') if !state.library.is_uploading() => {
                return vec![Action::SubmitUpload(self.to_upload())];
            }
            KeyCode::Char('x') => return vec![Action::UploadCleared],
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
        if let Action::UploadCleared = action {
            self.form.clear();
        }
        vec![]
    }

    fn is_editing(&self) -> bool {
        self.form.is_editing()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = state
            .library
            .is_uploading()
            .then_some(Badge { text: "UPLOADING", color: C_LOADING });
        let block = pane_chrome("upload song", Some('4'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [fields_area, _, hint_area] = Layout::vertical([
            Constraint::Length(CATEGORY as u16 + 1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(inner);
        self.fields_area = fields_area;
        self.form.draw(frame, fields_area, focused);

        let hint = if state.library.is_uploading() {
            "  upload in progress..."
        } else {
            "  enter edit · space toggle · s upload · x clear"
        };
        frame.render_widget(Paragraph::new(Line::from(Span::styled(hint, style_muted()))), hint_area);
    }
}
