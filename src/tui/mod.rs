mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::model::{Field, FormEvent, MessageKind, WorkAction};
use crate::orchestrator::{self, ChannelView, FormController, UiCommand};
use crate::remote::{RemoteApi, RemoteClient};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::{apply_event, push_wrapped_status_kv, Focus, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const FORM_TAB: usize = 0;
const HELP_TAB: usize = 1;

pub async fn run(args: Cli) -> Result<bool> {
    let cfg = build_config(&args);
    let api: Arc<dyn RemoteApi> = Arc::new(RemoteClient::new(&cfg)?);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<FormEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let controller = FormController::new(api, ChannelView::new(event_tx), cfg.busy_style);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_state = UiState {
        endpoint: cfg.endpoint.clone(),
        ..Default::default()
    };
    let ui_handle = std::thread::spawn(move || run_threaded(ui_state, event_rx, cmd_tx));

    let res = orchestrator::run_controller(controller, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res.map(|()| true)
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<FormEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();
    tracing::info!(endpoint = %state.endpoint, "form opened");

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut redraw = true;

    let res = loop {
        let now = Instant::now();
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev, now);
        }
        state.messages.expire(now);

        if redraw || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state, now)).ok();
            last_tick = Instant::now();
            redraw = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut state, k.modifiers, k.code) {
                    KeyOutcome::None => {}
                    KeyOutcome::Command(cmd) => {
                        if cmd_tx.send(cmd).is_err() {
                            break Err(anyhow::anyhow!("form controller stopped"));
                        }
                    }
                    KeyOutcome::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
                // Redraw right away so selection changes feel immediate.
                redraw = true;
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

#[derive(Debug)]
enum KeyOutcome {
    None,
    Command(UiCommand),
    Quit,
}

fn submit(state: &UiState, action: WorkAction) -> KeyOutcome {
    if !state.can_submit() {
        return KeyOutcome::None;
    }
    KeyOutcome::Command(UiCommand::Submit {
        action,
        selection: state.selection(),
    })
}

fn handle_key(state: &mut UiState, modifiers: KeyModifiers, code: KeyCode) -> KeyOutcome {
    match (modifiers, code) {
        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            return KeyOutcome::Quit
        }
        (_, KeyCode::Tab) => {
            state.tab = (state.tab + 1) % 2;
            return KeyOutcome::None;
        }
        (_, KeyCode::Char('?')) => {
            state.tab = HELP_TAB;
            return KeyOutcome::None;
        }
        (_, KeyCode::Esc) => {
            state.tab = FORM_TAB;
            return KeyOutcome::None;
        }
        _ => {}
    }

    if state.tab != FORM_TAB {
        return KeyOutcome::None;
    }
    if let KeyCode::Char('r') = code {
        return KeyOutcome::Command(UiCommand::Reload);
    }
    // The form is not interactive until its options are in.
    if state.loading {
        return KeyOutcome::None;
    }

    match code {
        KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
            state.focus = state.focus.prev();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.focus = state.focus.next();
        }
        KeyCode::Left | KeyCode::Char('h') => match state.focus {
            Focus::Field(field) => state.input_mut(field).select_prev(),
            Focus::End => state.focus = Focus::Start,
            Focus::Start => {}
        },
        KeyCode::Right | KeyCode::Char('l') => match state.focus {
            Focus::Field(field) => state.input_mut(field).select_next(),
            Focus::Start => state.focus = Focus::End,
            Focus::End => {}
        },
        KeyCode::Enter => match state.focus {
            Focus::Field(_) => state.focus = state.focus.next(),
            Focus::Start => return submit(state, WorkAction::StartWork),
            Focus::End => return submit(state, WorkAction::EndWork),
        },
        KeyCode::Char('s') => return submit(state, WorkAction::StartWork),
        KeyCode::Char('e') => return submit(state, WorkAction::EndWork),
        _ => {}
    }
    KeyOutcome::None
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Form"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("shopfloor-clock"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        FORM_TAB => draw_form(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
    draw_message(chunks[2], f, state, now);
    draw_status(chunks[3], f, state);
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Work log");
    if state.loading {
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Loading…",
                Style::default().fg(Color::Cyan),
            )),
        ])
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(p, area);
        return;
    }

    let focused = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from("")];
    for field in Field::ALL {
        let input = state.input(field);
        let is_focused = state.focus == Focus::Field(field);
        let value_style = match (is_focused, input.current().is_some()) {
            (true, _) => focused,
            (false, true) => Style::default(),
            (false, false) => Style::default().fg(Color::DarkGray),
        };
        lines.push(Line::from(vec![
            Span::raw(if is_focused { "▶ " } else { "  " }),
            Span::styled(
                format!("{:<12}", field.label()),
                Style::default().fg(Color::Gray),
            ),
            Span::styled(format!("‹ {} ›", input.display()), value_style),
            Span::styled(
                format!("  ({} options)", input.choice_count()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }
    lines.push(Line::from(""));

    let button = |label: &str, focus: Focus| {
        let style = if !state.can_submit() {
            Style::default().fg(Color::DarkGray)
        } else if state.focus == focus {
            focused.add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::White)
        };
        Span::styled(format!("[ {label} ]"), style)
    };
    lines.push(Line::from(vec![
        Span::raw("  "),
        button("Start work", Focus::Start),
        Span::raw("   "),
        button("End work", Focus::End),
    ]));
    if !state.buttons_enabled {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  Sending…",
            Style::default().fg(Color::Cyan),
        )));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_message(area: Rect, f: &mut ratatui::Frame, state: &UiState, now: Instant) {
    let block = Block::default().borders(Borders::ALL).title("Message");
    let line = match state.messages.visible(now) {
        Some(m) => {
            let color = match m.kind {
                MessageKind::Success => Color::Green,
                MessageKind::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(format!("[{}] ", m.stamp), Style::default().fg(Color::Gray)),
                Span::styled(m.text.clone(), Style::default().fg(color)),
            ])
        }
        None => Line::from(""),
    };
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines = vec![Line::from(vec![
        Span::styled("s", Style::default().fg(Color::Magenta)),
        Span::raw(" start  "),
        Span::styled("e", Style::default().fg(Color::Magenta)),
        Span::raw(" end  "),
        Span::styled("r", Style::default().fg(Color::Magenta)),
        Span::raw(" reload  "),
        Span::styled("?", Style::default().fg(Color::Magenta)),
        Span::raw(" help  "),
        Span::styled("q", Style::default().fg(Color::Magenta)),
        Span::raw(" quit"),
    ])];
    push_wrapped_status_kv(&mut lines, "Endpoint", &state.endpoint, area.width);
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status")),
        area,
    );
}
