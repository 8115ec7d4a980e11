//! LoginPrompt: the admin password popup.
//!
//! Cosmetic gate only.  The password sits in the client config and is
//! checked locally; it does not protect anything on the server.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    components::help_overlay::{centered_rect, overlay_block},
    theme::{style_bold, style_muted, C_ACCENT},
    widgets::form::{EditOutcome, Field, Form},
};

pub struct LoginPrompt {
    pub visible: bool,
    form: Form,
}

impl LoginPrompt {
    pub fn new() -> Self {
        Self {
            visible: false,
            form: Form::new(vec![Field::secret("Password")]),
        }
    }
}

impl Default for LoginPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for LoginPrompt {
    fn id(&self) -> ComponentId {
        ComponentId::LoginPrompt
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Esc => vec![Action::CloseLogin],
            KeyCode::Enter => {
                let password = self.form.value(0).to_string();
                self.form.clear();
                self.form.activate();
                vec![Action::Login(password)]
            }
            _ => {
                if !self.form.is_editing() {
                    self.form.activate();
                }
                if self.form.handle_edit_key(key) == EditOutcome::Done {
                    self.form.activate();
                }
                vec![]
            }
        }
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        match action {
            Action::OpenLogin => {
                self.visible = true;
                self.form.clear();
                self.form.activate();
            }
            Action::CloseLogin => {
                self.visible = false;
                self.form.clear();
            }
            _ => {}
        }
        vec![]
    }

    fn is_editing(&self) -> bool {
        self.visible
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        if !self.visible {
            return;
        }
        let popup = centered_rect(50, 9, area);
        frame.render_widget(Clear, popup);
        let block = overlay_block().title(Span::styled(" admin login ", style_bold(C_ACCENT)));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [field_area, _, note_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(inner);
        self.form.draw(frame, field_area, true);
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    "Cosmetic gate: checked locally against the client config, it does not secure the server.",
                    style_muted(),
                )),
                Line::from(Span::styled("enter log in · esc cancel", style_muted())),
            ])
            .wrap(Wrap { trim: true }),
            note_area,
        );
    }
}
