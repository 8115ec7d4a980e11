//! Form: a vertical list of labelled tui-input fields, edited one at a time.
//!
//! Choice fields cycle through fixed values with Space instead of taking text.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_ACCENT, C_FILTER_BG, C_MUTED, C_PRIMARY, C_SECONDARY, C_SELECTION_BG};

pub enum FieldKind {
    Text,
    /// Typed text rendered as bullets.
    Secret,
    Choice(&'static [&'static str]),
}

pub struct Field {
    pub label: &'static str,
    pub hint: &'static str,
    kind: FieldKind,
    input: Input,
}

impl Field {
    pub fn text(label: &'static str, hint: &'static str) -> Self {
        Self {
            label,
            hint,
            kind: FieldKind::Text,
            input: Input::default(),
        }
    }

    pub fn secret(label: &'static str) -> Self {
        Self {
            label,
            hint: "",
            kind: FieldKind::Secret,
            input: Input::default(),
        }
    }

    pub fn choice(label: &'static str, options: &'static [&'static str]) -> Self {
        let first = options.first().copied().unwrap_or_default();
        Self {
            label,
            hint: "space to change",
            kind: FieldKind::Choice(options),
            input: Input::new(first.to_string()),
        }
    }

    fn display(&self) -> String {
        match self.kind {
            FieldKind::Secret => "•".repeat(self.input.value().chars().count()),
            _ => self.input.value().to_string(),
        }
    }
}

/// What a key did while a field was being edited.
#[derive(Debug, PartialEq)]
pub enum EditOutcome {
    Editing,
    Done,
}

pub struct Form {
    fields: Vec<Field>,
    selected: usize,
    editing: bool,
    label_width: usize,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        let label_width = fields.iter().map(|f| f.label.width()).max().unwrap_or(0) + 2;
        Self {
            fields,
            selected: 0,
            editing: false,
            label_width,
        }
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map(|f| f.input.value()).unwrap_or_default()
    }

    pub fn set_value(&mut self, idx: usize, value: &str) {
        if let Some(field) = self.fields.get_mut(idx) {
            field.input = Input::new(value.to_string());
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        if !self.fields.is_empty() {
            self.selected = (self.selected + 1).min(self.fields.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Select the field drawn at `row` of the area passed to `draw`.
    pub fn select_row(&mut self, row: usize) -> bool {
        if row < self.fields.len() {
            self.selected = row;
            true
        } else {
            false
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Start editing the selected field.  Choice fields advance instead and
    /// return false.
    pub fn activate(&mut self) -> bool {
        let Some(field) = self.fields.get_mut(self.selected) else {
            return false;
        };
        match field.kind {
            FieldKind::Choice(options) => {
                let pos = options.iter().position(|o| *o == field.input.value());
                let next = pos.map(|p| (p + 1) % options.len()).unwrap_or(0);
                if let Some(option) = options.get(next) {
                    field.input = Input::new(option.to_string());
                }
                false
            }
            FieldKind::Text | FieldKind::Secret => {
                self.editing = true;
                true
            }
        }
    }

    pub fn handle_edit_key(&mut self, key: KeyEvent) -> EditOutcome {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Tab => {
                self.editing = false;
                EditOutcome::Done
            }
            _ => {
                if let Some(field) = self.fields.get_mut(self.selected) {
                    field.input.handle_event(&Event::Key(key));
                }
                EditOutcome::Editing
            }
        }
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.input = match field.kind {
                FieldKind::Choice(options) => Input::new(options.first().copied().unwrap_or_default().to_string()),
                FieldKind::Text | FieldKind::Secret => Input::default(),
            };
        }
        self.selected = 0;
        self.editing = false;
    }

    /// One row per field: label, value (or hint when empty).
    pub fn draw(&self, frame: &mut Frame, area: Rect, focused: bool) {
        for (i, field) in self.fields.iter().enumerate() {
            if i as u16 >= area.height {
                break;
            }
            let row = Rect::new(area.x, area.y + i as u16, area.width, 1);
            let is_selected = focused && i == self.selected;
            let is_editing = is_selected && self.editing;

            let marker = if is_selected { "▸ " } else { "  " };
            let label = format!("{:<width$}", field.label, width = self.label_width);
            let label_style = if is_selected {
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(C_SECONDARY)
            };

            let shown = field.display();
            let value_span = if shown.is_empty() && !is_editing {
                Span::styled(field.hint, Style::default().fg(C_MUTED))
            } else if matches!(field.kind, FieldKind::Choice(_)) {
                Span::styled(format!("‹ {} ›", shown), Style::default().fg(C_PRIMARY))
            } else {
                Span::styled(shown, Style::default().fg(C_PRIMARY))
            };

            let bg = if is_editing {
                C_FILTER_BG
            } else if is_selected {
                C_SELECTION_BG
            } else {
                ratatui::style::Color::Reset
            };
            let line = Line::from(vec![
                Span::styled(marker, label_style),
                Span::styled(label, label_style),
                value_span,
            ]);
            frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), row);

            if is_editing {
                let value_x = 2 + self.label_width as u16;
                let avail = row.width.saturating_sub(value_x + 1) as usize;
                let scroll = field.input.visual_scroll(avail);
                let cursor = field.input.visual_cursor().saturating_sub(scroll) as u16;
                frame.set_cursor_position((
                    (row.x + value_x + cursor).min(row.x + row.width.saturating_sub(1)),
                    row.y,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_text_field_editing() {
        let mut form = Form::new(vec![Field::text("Title", "required"), Field::text("Notes", "")]);
        assert!(form.activate());
        assert!(form.is_editing());
        form.handle_edit_key(key(KeyCode::Char('h')));
        form.handle_edit_key(key(KeyCode::Char('i')));
        assert_eq!(form.handle_edit_key(key(KeyCode::Enter)), EditOutcome::Done);
        assert!(!form.is_editing());
        assert_eq!(form.value(0), "hi");
    }

    #[test]
    fn test_choice_field_cycles() {
        let mut form = Form::new(vec![Field::choice("Category", &["original", "cover"])]);
        assert_eq!(form.value(0), "original");
        assert!(!form.activate());
        assert_eq!(form.value(0), "cover");
        form.activate();
        assert_eq!(form.value(0), "original");
    }

    #[test]
    fn test_clear_resets_fields() {
        let mut form = Form::new(vec![Field::text("Title", ""), Field::choice("Featured", &["no", "yes"])]);
        form.set_value(0, "draft");
        form.set_value(1, "yes");
        form.select_next();
        form.clear();
        assert_eq!(form.value(0), "");
        assert_eq!(form.value(1), "no");
        assert_eq!(form.selected(), 0);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut form = Form::new(vec![Field::text("A", ""), Field::secret("B")]);
        form.select_prev();
        assert_eq!(form.selected(), 0);
        form.select_next();
        form.select_next();
        assert_eq!(form.selected(), 1);
        assert!(form.select_row(0));
        assert!(!form.select_row(2));
    }
}
