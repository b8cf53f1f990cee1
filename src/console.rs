//! Headless presentation for text and JSON modes.
//!
//! Implements `FormView` by writing lines through the shared output writer, so
//! scripted runs follow exactly the same controller path as the TUI.

use crate::cli::OutputLine;
use crate::model::{Field, MessageKind, SelectEntry};
use crate::orchestrator::{clock_stamp, FormView};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsoleMode {
    Text,
    /// Human-readable lines are suppressed; the caller prints one JSON document.
    Json,
}

pub(crate) struct ConsoleView {
    out: UnboundedSender<OutputLine>,
    mode: ConsoleMode,
    list_options: bool,
    entries: [Vec<SelectEntry>; 3],
    last_message: Option<(MessageKind, String)>,
}

impl ConsoleView {
    pub fn new(out: UnboundedSender<OutputLine>, mode: ConsoleMode, list_options: bool) -> Self {
        Self {
            out,
            mode,
            list_options,
            entries: Default::default(),
            last_message: None,
        }
    }

    fn line(&self, line: OutputLine) {
        if self.mode == ConsoleMode::Text {
            let _ = self.out.send(line);
        }
    }

    pub fn last_message(&self) -> Option<(MessageKind, &str)> {
        self.last_message
            .as_ref()
            .map(|(kind, text)| (*kind, text.as_str()))
    }

    /// Map user input to an option value: exact value first, then display text (case-insensitive).
    pub fn resolve(&self, field: Field, input: &str) -> Option<String> {
        let input = input.trim();
        let choices = || self.entries[field.index()].iter().filter(|e| !e.placeholder);
        choices()
            .find(|e| e.value == input)
            .or_else(|| choices().find(|e| e.label.eq_ignore_ascii_case(input)))
            .map(|e| e.value.clone())
    }
}

impl FormView for ConsoleView {
    fn show_loading(&mut self, loading: bool) {
        if loading {
            self.line(OutputLine::Stderr("Loading form data…".into()));
        }
    }

    fn populate_options(&mut self, field: Field, entries: Vec<SelectEntry>) {
        if self.list_options {
            let mut lines = vec![format!("{}:", field.label())];
            let choices: Vec<_> = entries.iter().filter(|e| !e.placeholder).collect();
            if choices.is_empty() {
                lines.push("  (none)".into());
            }
            for e in choices {
                if e.value == e.label {
                    lines.push(format!("  {}", e.value));
                } else {
                    lines.push(format!("  {}  {}", e.value, e.label));
                }
            }
            for l in lines {
                self.line(OutputLine::Stdout(l));
            }
        }
        self.entries[field.index()] = entries;
    }

    fn show_message(&mut self, text: &str, kind: MessageKind) {
        let stamp = clock_stamp();
        match kind {
            MessageKind::Success => self.line(OutputLine::Stdout(format!("[{stamp}] {text}"))),
            MessageKind::Error => self.line(OutputLine::Stderr(format!("[{stamp}] error: {text}"))),
        }
        self.last_message = Some((kind, text.to_string()));
    }

    fn hide_message(&mut self) {}

    fn set_buttons_enabled(&mut self, enabled: bool) {
        tracing::trace!(enabled, "console buttons");
    }

    fn reset_selections(&mut self) {
        tracing::trace!("console selections reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SelectOption;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<OutputLine>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(line) = rx.try_recv() {
            out.push(match line {
                OutputLine::Stdout(s) => format!("out:{s}"),
                OutputLine::Stderr(s) => format!("err:{s}"),
            });
        }
        out
    }

    fn commission_entries() -> Vec<SelectEntry> {
        crate::orchestrator::build_entries(
            Field::Commission,
            &[
                SelectOption::Pair {
                    value: "C1".into(),
                    text: "Project One".into(),
                },
                SelectOption::Label("C2".into()),
            ],
        )
    }

    #[test]
    fn lists_options_without_placeholders() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut view = ConsoleView::new(tx, ConsoleMode::Text, true);
        view.populate_options(Field::Commission, commission_entries());
        view.populate_options(Field::Phase, Vec::new());

        assert_eq!(
            drain(&mut rx),
            vec![
                "out:Commission:",
                "out:  C1  Project One",
                "out:  C2",
                "out:Phase:",
                "out:  (none)",
            ]
        );
    }

    #[test]
    fn resolves_by_value_then_label() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut view = ConsoleView::new(tx, ConsoleMode::Text, false);
        view.populate_options(Field::Commission, commission_entries());

        assert_eq!(view.resolve(Field::Commission, "C1").as_deref(), Some("C1"));
        assert_eq!(
            view.resolve(Field::Commission, "project one").as_deref(),
            Some("C1")
        );
        assert_eq!(view.resolve(Field::Commission, "Select commission"), None);
        assert_eq!(view.resolve(Field::Operator, "C1"), None);
    }

    #[test]
    fn json_mode_stays_quiet_but_remembers_the_message() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut view = ConsoleView::new(tx, ConsoleMode::Json, true);
        view.show_loading(true);
        view.populate_options(Field::Commission, commission_entries());
        view.show_message("Operator already working", MessageKind::Error);

        assert!(drain(&mut rx).is_empty());
        assert_eq!(
            view.last_message(),
            Some((MessageKind::Error, "Operator already working"))
        );
    }

    #[test]
    fn errors_go_to_stderr_and_successes_to_stdout() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut view = ConsoleView::new(tx, ConsoleMode::Text, false);
        view.show_message("Started", MessageKind::Success);
        view.show_message("nope", MessageKind::Error);

        let lines = drain(&mut rx);
        assert!(lines[0].starts_with("out:[") && lines[0].ends_with("] Started"));
        assert!(lines[1].starts_with("err:[") && lines[1].ends_with("] error: nope"));
    }
}
