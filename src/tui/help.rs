use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(keys: &[&'static str], padding: usize, what: &'static str) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (i, k) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" or "));
        }
        spans.push(Span::styled(*k, Style::default().fg(Color::Magenta)));
    }
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(Span::raw(what));
    Line::from(spans)
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line(&["q", "Ctrl-C"], 2, "Quit"),
        key_line(&["tab"], 9, "Switch tabs"),
        key_line(&["?"], 11, "Show this help"),
        key_line(&["esc"], 9, "Back to the form"),
        Line::from(""),
        Line::from("Form tab:"),
        key_line(&["↑/↓", "j/k"], 2, "Move between fields and buttons"),
        key_line(&["←/→", "h/l"], 2, "Change the selected option"),
        key_line(&["enter"], 7, "Next field, or press the focused button"),
        key_line(&["s"], 11, "Start work"),
        key_line(&["e"], 11, "End work"),
        key_line(&["r"], 11, "Reload the option lists"),
        Line::from(""),
        Line::from("Messages hide themselves after five seconds."),
        Line::from(vec![
            Span::raw("Logs are written to "),
            Span::styled(
                crate::logging::log_file_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "nowhere (no cache directory)".into()),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
