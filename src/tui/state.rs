use crate::model::{Field, FormEvent, SelectEntry, Selection};
use crate::orchestrator::MessageBox;
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};
use std::time::Instant;

/// One selection input as rendered by the TUI.
#[derive(Debug, Default, Clone)]
pub struct SelectInput {
    pub entries: Vec<SelectEntry>,
    /// Index into `entries`; `None` shows the placeholder.
    pub selected: Option<usize>,
}

impl SelectInput {
    pub fn populated(entries: Vec<SelectEntry>) -> Self {
        Self {
            entries,
            selected: None,
        }
    }

    fn choices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.placeholder)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn choice_count(&self) -> usize {
        self.choices().len()
    }

    pub fn current(&self) -> Option<&SelectEntry> {
        self.selected
            .and_then(|i| self.entries.get(i))
            .filter(|e| !e.placeholder)
    }

    pub fn value(&self) -> Option<String> {
        self.current().map(|e| e.value.clone())
    }

    /// Text shown in the input: the chosen label, else the placeholder prompt.
    pub fn display(&self) -> &str {
        match self.current() {
            Some(e) => &e.label,
            None => self
                .entries
                .iter()
                .find(|e| e.placeholder)
                .map(|e| e.label.as_str())
                .unwrap_or("-"),
        }
    }

    /// Move to the next selectable entry, wrapping. Placeholders are skipped.
    pub fn select_next(&mut self) {
        let choices = self.choices();
        if choices.is_empty() {
            return;
        }
        let pos = self
            .selected
            .and_then(|s| choices.iter().position(|&c| c == s));
        self.selected = Some(match pos {
            Some(p) => choices[(p + 1) % choices.len()],
            None => choices[0],
        });
    }

    pub fn select_prev(&mut self) {
        let choices = self.choices();
        if choices.is_empty() {
            return;
        }
        let pos = self
            .selected
            .and_then(|s| choices.iter().position(|&c| c == s));
        self.selected = Some(match pos {
            Some(0) | None => choices[choices.len() - 1],
            Some(p) => choices[p - 1],
        });
    }

    pub fn reset(&mut self) {
        self.selected = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(Field),
    Start,
    End,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Field(Field::Operator),
        Focus::Field(Field::Commission),
        Focus::Field(Field::Phase),
        Focus::Start,
        Focus::End,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let n = Self::ORDER.len();
        Self::ORDER[(self.position() + n - 1) % n]
    }
}

pub struct UiState {
    pub tab: usize,
    pub loading: bool,
    pub inputs: [SelectInput; 3],
    pub focus: Focus,
    pub buttons_enabled: bool,
    pub messages: MessageBox,
    pub endpoint: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            // The controller starts loading immediately; don't flash an empty form.
            loading: true,
            inputs: Default::default(),
            focus: Focus::Field(Field::Operator),
            buttons_enabled: true,
            messages: MessageBox::default(),
            endpoint: String::new(),
        }
    }
}

impl UiState {
    pub fn input(&self, field: Field) -> &SelectInput {
        &self.inputs[field.index()]
    }

    pub fn input_mut(&mut self, field: Field) -> &mut SelectInput {
        &mut self.inputs[field.index()]
    }

    /// Snapshot of the three inputs, taken at submit time.
    pub fn selection(&self) -> Selection {
        Selection {
            operator: self.input(Field::Operator).value(),
            commission: self.input(Field::Commission).value(),
            phase: self.input(Field::Phase).value(),
        }
    }

    /// Whether the action buttons accept input right now.
    pub fn can_submit(&self) -> bool {
        self.buttons_enabled && !self.loading
    }
}

/// Apply one controller event to the UI state.
pub fn apply_event(state: &mut UiState, ev: FormEvent, now: Instant) {
    match ev {
        FormEvent::Loading(loading) => state.loading = loading,
        FormEvent::OptionsPopulated { field, entries } => {
            *state.input_mut(field) = SelectInput::populated(entries);
        }
        FormEvent::Message { text, kind } => state.messages.show(text, kind, now),
        FormEvent::MessageHidden => state.messages.hide(),
        FormEvent::ButtonsEnabled(enabled) => state.buttons_enabled = enabled,
        FormEvent::SelectionsReset => {
            for input in state.inputs.iter_mut() {
                input.reset();
            }
        }
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}
