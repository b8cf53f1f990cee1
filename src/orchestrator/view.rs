//! Presentation interface between the form controller and a rendering surface.

use crate::model::{Field, FormEvent, MessageKind, SelectEntry, SelectOption};
use tokio::sync::mpsc::UnboundedSender;

/// Everything the controller is allowed to do to the screen.
pub(crate) trait FormView {
    /// Show (true) or hide (false) the loading indicator. The form is hidden while it shows.
    fn show_loading(&mut self, loading: bool);
    /// Replace the entries of one selection input; the selection returns to the placeholder.
    fn populate_options(&mut self, field: Field, entries: Vec<SelectEntry>);
    fn show_message(&mut self, text: &str, kind: MessageKind);
    fn hide_message(&mut self);
    fn set_buttons_enabled(&mut self, enabled: bool);
    /// Put every selection input back on its placeholder.
    fn reset_selections(&mut self);
}

/// Entries for one input: the field's placeholder, then one row per option in order.
pub(crate) fn build_entries(field: Field, options: &[SelectOption]) -> Vec<SelectEntry> {
    let mut entries = Vec::with_capacity(options.len() + 1);
    entries.push(SelectEntry {
        value: String::new(),
        label: field.placeholder().to_string(),
        placeholder: true,
    });
    entries.extend(options.iter().map(|o| SelectEntry {
        value: o.value().to_string(),
        label: o.text().to_string(),
        placeholder: false,
    }));
    entries
}

/// Forwards view calls as `FormEvent`s to a UI running elsewhere (the TUI thread).
pub(crate) struct ChannelView {
    tx: UnboundedSender<FormEvent>,
}

impl ChannelView {
    pub fn new(tx: UnboundedSender<FormEvent>) -> Self {
        Self { tx }
    }

    fn emit(&self, ev: FormEvent) {
        // A closed receiver means the UI is gone; nothing left to update.
        let _ = self.tx.send(ev);
    }
}

impl FormView for ChannelView {
    fn show_loading(&mut self, loading: bool) {
        self.emit(FormEvent::Loading(loading));
    }

    fn populate_options(&mut self, field: Field, entries: Vec<SelectEntry>) {
        self.emit(FormEvent::OptionsPopulated { field, entries });
    }

    fn show_message(&mut self, text: &str, kind: MessageKind) {
        self.emit(FormEvent::Message {
            text: text.to_string(),
            kind,
        });
    }

    fn hide_message(&mut self) {
        self.emit(FormEvent::MessageHidden);
    }

    fn set_buttons_enabled(&mut self, enabled: bool) {
        self.emit(FormEvent::ButtonsEnabled(enabled));
    }

    fn reset_selections(&mut self) {
        self.emit(FormEvent::SelectionsReset);
    }
}
