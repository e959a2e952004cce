//! Modal form for adding a marker.

use crate::model::{Notice, Submission};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Name,
    Latitude,
    Longitude,
}

impl Field {
    const ALL: [Field; 3] = [Field::Name, Field::Latitude, Field::Longitude];

    fn next(self) -> Self {
        match self {
            Field::Name => Field::Latitude,
            Field::Latitude => Field::Longitude,
            Field::Longitude => Field::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            Field::Name => Field::Longitude,
            Field::Latitude => Field::Name,
            Field::Longitude => Field::Latitude,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Latitude => "Latitude",
            Field::Longitude => "Longitude",
        }
    }
}

/// What a key press inside the form asks the view to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    Edited,
    Submit(Submission),
    Cancel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub focus: Field,
}

impl FormState {
    fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Latitude => &self.latitude,
            Field::Longitude => &self.longitude,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Name => &mut self.name,
            Field::Latitude => &mut self.latitude,
            Field::Longitude => &mut self.longitude,
        }
    }

    pub fn submission(&self) -> Submission {
        Submission {
            name: self.name.clone(),
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn input(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return FormAction::Submit(self.submission()),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Backspace => {
                self.focused_mut().pop();
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.focused_mut().push(c);
            }
            _ => {}
        }
        FormAction::Edited
    }
}

/// Rectangle of `width` x `height` cells centered in `area`, clipped to it.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn draw_form(area: Rect, f: &mut Frame, form: &FormState, notice: Option<&Notice>) {
    let popup = centered(area, 60, 10);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Add marker")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let fields: Vec<Line> = Field::ALL
        .iter()
        .map(|&field| {
            let focused = form.focus == field;
            let label_style = if focused {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let mut spans = vec![
                Span::styled(format!("{:<10} ", field.label()), label_style),
                Span::raw(form.value(field).to_string()),
            ];
            if focused {
                spans.push(Span::styled(
                    "_",
                    Style::default().add_modifier(Modifier::SLOW_BLINK),
                ));
            }
            Line::from(spans)
        })
        .collect();
    f.render_widget(Paragraph::new(fields), rows[0]);

    if let Some(Notice::Error(text)) = notice {
        f.render_widget(
            Paragraph::new(Span::styled(text.as_str(), Style::default().fg(Color::Red)))
                .wrap(Wrap { trim: true }),
            rows[1],
        );
    }

    let hint = Line::from(vec![
        Span::styled("Enter", Style::default().fg(Color::Magenta)),
        Span::raw(" add  "),
        Span::styled("Tab", Style::default().fg(Color::Magenta)),
        Span::raw(" next field  "),
        Span::styled("Esc", Style::default().fg(Color::Magenta)),
        Span::raw(" cancel"),
    ]);
    f.render_widget(Paragraph::new(hint), rows[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(form: &mut FormState, s: &str) {
        for c in s.chars() {
            assert_eq!(form.input(key(KeyCode::Char(c))), FormAction::Edited);
        }
    }

    #[test]
    fn typing_fills_the_focused_field() {
        let mut form = FormState::default();
        type_str(&mut form, "Test Point");
        form.input(key(KeyCode::Tab));
        type_str(&mut form, "47.0");
        form.input(key(KeyCode::Tab));
        type_str(&mut form, "39.01");
        form.input(key(KeyCode::Backspace));

        assert_eq!(
            form.input(key(KeyCode::Enter)),
            FormAction::Submit(Submission {
                name: "Test Point".into(),
                latitude: "47.0".into(),
                longitude: "39.0".into(),
            })
        );
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = FormState::default();
        form.input(key(KeyCode::BackTab));
        assert_eq!(form.focus, Field::Longitude);
        form.input(key(KeyCode::Down));
        assert_eq!(form.focus, Field::Name);
    }

    #[test]
    fn control_chars_are_not_typed() {
        let mut form = FormState::default();
        form.input(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(form.name.is_empty());
    }

    #[test]
    fn escape_cancels_without_clearing() {
        let mut form = FormState::default();
        type_str(&mut form, "abc");
        assert_eq!(form.input(key(KeyCode::Esc)), FormAction::Cancel);
        assert_eq!(form.name, "abc");
        form.reset();
        assert_eq!(form, FormState::default());
    }

    #[test]
    fn centered_rect_is_clipped() {
        let area = Rect::new(0, 0, 40, 6);
        assert_eq!(centered(area, 60, 10), area);
        assert_eq!(centered(Rect::new(0, 0, 100, 40), 60, 10), Rect::new(20, 15, 60, 10));
    }
}
