use crate::console::{ConsoleMode, ConsoleView};
use crate::model::{
    BusyStyle, ClientConfig, Envelope, EnvelopeStatus, Field, Selection, WorkAction,
    DEFAULT_ENDPOINT,
};
use crate::orchestrator::{FormController, SubmitOutcome};
use crate::remote::{RemoteApi, RemoteClient};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
pub(crate) enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
pub(crate) fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "shopfloor-clock",
    version,
    about = "Record the start and end of shop-floor work against a remote script endpoint"
)]
pub struct Cli {
    /// URL of the deployed script endpoint
    #[arg(long, env = "SHOPFLOOR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// How the form signals a pending submission
    #[arg(long, value_enum, default_value_t = BusyStyle::DisableButtons)]
    pub busy_style: BusyStyle,

    /// Print JSON and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print plain text and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Submit this action without the TUI
    #[arg(long, value_enum)]
    pub action: Option<WorkAction>,

    /// Operator name (value or label as listed by --text)
    #[arg(long, requires = "action")]
    pub operator: Option<String>,

    /// Commission code or its display text
    #[arg(long, requires = "action")]
    pub commission: Option<String>,

    /// Work phase
    #[arg(long, requires = "action")]
    pub phase: Option<String>,
}

impl Cli {
    pub fn is_headless(&self) -> bool {
        self.json || self.text || self.action.is_some()
    }
}

/// Run the selected mode. `Ok(false)` means a failure was already shown to the user.
pub async fn run(args: Cli) -> Result<bool> {
    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_headless(args, ConsoleMode::Text).await;
        }
    }

    let mode = if args.json {
        ConsoleMode::Json
    } else {
        ConsoleMode::Text
    };
    run_headless(args, mode).await
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        endpoint: args.endpoint.clone(),
        user_agent: format!("shopfloor-clock/{}", env!("CARGO_PKG_VERSION")),
        busy_style: args.busy_style,
    }
}

async fn run_headless(args: Cli, mode: ConsoleMode) -> Result<bool> {
    let (out_tx, out_handle) = spawn_output_writer();
    let res = headless_session(&args, mode, out_tx).await;
    // Every sender is gone once the session returns, so this also flushes on error.
    let _ = out_handle.await;
    res
}

async fn headless_session(
    args: &Cli,
    mode: ConsoleMode,
    out_tx: mpsc::UnboundedSender<OutputLine>,
) -> Result<bool> {
    let cfg = build_config(args);
    let api: Arc<dyn RemoteApi> = Arc::new(RemoteClient::new(&cfg)?);

    if mode == ConsoleMode::Json && args.action.is_none() {
        return print_initial_data_json(api.as_ref(), &out_tx).await;
    }

    let view = ConsoleView::new(out_tx.clone(), mode, args.action.is_none());
    let mut controller = FormController::new(api, view, cfg.busy_style);
    let loaded = controller.load_initial_data().await;
    match args.action {
        Some(action) if loaded => submit_once(args, action, &mut controller, mode, &out_tx).await,
        Some(_) => {
            if mode == ConsoleMode::Json {
                emit_last_message_json(controller.view(), &out_tx)?;
            }
            Ok(false)
        }
        None => Ok(loaded),
    }
}

async fn print_initial_data_json(
    api: &dyn RemoteApi,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<bool> {
    let (envelope, ok) = match api.fetch_initial_data().await {
        Ok(data) => (
            Envelope {
                status: EnvelopeStatus::Success,
                message: None,
                data: Some(data),
            },
            true,
        ),
        Err(e) => (
            Envelope {
                status: EnvelopeStatus::Error,
                message: Some(e.to_string()),
                data: None,
            },
            false,
        ),
    };
    let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&envelope)?));
    Ok(ok)
}

fn message_json(status: EnvelopeStatus, message: String) -> Result<String> {
    let envelope: Envelope<()> = Envelope {
        status,
        message: Some(message),
        data: None,
    };
    serde_json::to_string_pretty(&envelope).context("encode JSON output")
}

fn emit_last_message_json(
    view: &ConsoleView,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    if let Some((_, text)) = view.last_message() {
        let _ = out_tx.send(OutputLine::Stdout(message_json(
            EnvelopeStatus::Error,
            text.to_string(),
        )?));
    }
    Ok(())
}

/// Resolve the CLI-provided values against the loaded lists, then submit once.
async fn submit_once(
    args: &Cli,
    action: WorkAction,
    controller: &mut FormController<ConsoleView>,
    mode: ConsoleMode,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<bool> {
    let resolve = |field: Field, input: &Option<String>| -> Result<Option<String>> {
        match input.as_deref() {
            None => Ok(None),
            Some(raw) => controller
                .view()
                .resolve(field, raw)
                .map(Some)
                .with_context(|| {
                    format!(
                        "unknown {} '{raw}'; run with --text to list the available options",
                        field.label().to_lowercase()
                    )
                }),
        }
    };
    let selection = Selection {
        operator: resolve(Field::Operator, &args.operator)?,
        commission: resolve(Field::Commission, &args.commission)?,
        phase: resolve(Field::Phase, &args.phase)?,
    };

    let outcome = controller.submit(action, &selection).await;
    if mode == ConsoleMode::Json {
        match &outcome {
            SubmitOutcome::Succeeded(msg) => {
                let _ = out_tx.send(OutputLine::Stdout(message_json(
                    EnvelopeStatus::Success,
                    msg.clone(),
                )?));
            }
            SubmitOutcome::Failed(msg) => {
                let _ = out_tx.send(OutputLine::Stdout(message_json(
                    EnvelopeStatus::Error,
                    msg.clone(),
                )?));
            }
            SubmitOutcome::Rejected => emit_last_message_json(controller.view(), out_tx)?,
        }
    }
    Ok(matches!(outcome, SubmitOutcome::Succeeded(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::get, Router};
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    const LISTS: &str = r#"{"status":"success","data":{"operatori":["Alice","Bob"],"commesse":[{"value":"C1","text":"Project One"}],"fasi":["Cut","Assemble"]}}"#;

    #[derive(Clone)]
    struct Endpoint {
        post_reply: &'static str,
        posted: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    async fn lists() -> (StatusCode, &'static str) {
        (StatusCode::OK, LISTS)
    }

    async fn action(State(ep): State<Endpoint>, body: String) -> (StatusCode, &'static str) {
        if let Ok(v) = serde_json::from_str(&body) {
            ep.posted.lock().unwrap().push(v);
        }
        (StatusCode::OK, ep.post_reply)
    }

    /// Serve the option lists on GET and `post_reply` on POST.
    async fn spawn_endpoint(post_reply: &'static str) -> (String, Arc<Mutex<Vec<serde_json::Value>>>) {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let posted = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/exec", get(lists).post(action))
            .with_state(Endpoint {
                post_reply,
                posted: posted.clone(),
            });
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}/exec"), posted)
    }

    /// Run one headless session and collect everything it printed.
    async fn session(argv: &[&str], mode: ConsoleMode) -> (Result<bool>, Vec<String>) {
        let mut full = vec!["shopfloor-clock"];
        full.extend_from_slice(argv);
        let args = Cli::parse_from(full);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let res = headless_session(&args, mode, tx).await;
        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(match line {
                OutputLine::Stdout(s) => format!("out:{s}"),
                OutputLine::Stderr(s) => format!("err:{s}"),
            });
        }
        (res, lines)
    }

    fn last_json(lines: &[String]) -> serde_json::Value {
        let out = lines
            .iter()
            .rev()
            .find_map(|l| l.strip_prefix("out:"))
            .expect("stdout line");
        serde_json::from_str(out).expect("json output")
    }

    #[tokio::test]
    async fn headless_submit_resolves_labels_and_prints_json() {
        let (url, posted) = spawn_endpoint(r#"{"status":"success","message":"Started"}"#).await;
        let (res, lines) = session(
            &[
                "--endpoint", url.as_str(), "--json", "--action", "start",
                "--operator", "alice", "--commission", "Project One", "--phase", "Cut",
            ],
            ConsoleMode::Json,
        )
        .await;

        assert!(res.expect("session"));
        assert_eq!(
            last_json(&lines),
            serde_json::json!({"status": "success", "message": "Started"})
        );
        assert_eq!(
            posted.lock().unwrap().as_slice(),
            &[serde_json::json!({
                "action": "startWork",
                "operatore": "Alice",
                "codiceCommessa": "C1",
                "fase": "Cut",
            })]
        );
    }

    #[tokio::test]
    async fn headless_server_error_reports_failure() {
        let (url, posted) =
            spawn_endpoint(r#"{"status":"error","message":"Operator already working"}"#).await;
        let (res, lines) = session(
            &[
                "--endpoint", url.as_str(), "--json", "--action", "end",
                "--operator", "Bob", "--commission", "C1", "--phase", "Assemble",
            ],
            ConsoleMode::Json,
        )
        .await;

        assert!(!res.expect("session"));
        assert_eq!(
            last_json(&lines),
            serde_json::json!({"status": "error", "message": "Operator already working"})
        );
        assert_eq!(posted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn headless_missing_field_is_rejected_locally() {
        let (url, posted) = spawn_endpoint(r#"{"status":"success"}"#).await;
        let (res, lines) = session(
            &["--endpoint", url.as_str(), "--json", "--action", "start", "--operator", "Alice"],
            ConsoleMode::Json,
        )
        .await;

        assert!(!res.expect("session"));
        assert_eq!(
            last_json(&lines),
            serde_json::json!({"status": "error", "message": "Please fill in all fields."})
        );
        assert!(posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn headless_unknown_value_is_a_usage_error() {
        let (url, posted) = spawn_endpoint(r#"{"status":"success"}"#).await;
        let (res, lines) = session(
            &[
                "--endpoint", url.as_str(), "--action", "start",
                "--operator", "Carol", "--commission", "C1", "--phase", "Cut",
            ],
            ConsoleMode::Text,
        )
        .await;

        let err = res.expect_err("unknown operator");
        assert!(err.to_string().contains("unknown operator 'Carol'"));
        assert!(posted.lock().unwrap().is_empty());
        // Lines queued before the error still reach the writer.
        assert!(lines.iter().any(|l| l.starts_with("err:Loading")));
    }

    #[tokio::test]
    async fn headless_text_mode_lists_options() {
        let (url, _) = spawn_endpoint(r#"{"status":"success"}"#).await;
        let (res, lines) = session(&["--endpoint", url.as_str(), "--text"], ConsoleMode::Text).await;

        assert!(res.expect("session"));
        assert!(lines.contains(&"out:Operator:".to_string()));
        assert!(lines.contains(&"out:  Alice".to_string()));
        assert!(lines.contains(&"out:  C1  Project One".to_string()));
    }

    #[test]
    fn headless_flags_and_config() {
        let args = Cli::parse_from([
            "shopfloor-clock",
            "--endpoint",
            "https://example.com/exec",
            "--action",
            "start",
            "--operator",
            "Alice",
            "--busy-style",
            "hide-form",
        ]);
        assert!(args.is_headless());
        assert_eq!(args.action, Some(WorkAction::StartWork));

        let cfg = build_config(&args);
        assert_eq!(cfg.endpoint, "https://example.com/exec");
        assert_eq!(cfg.busy_style, BusyStyle::HideForm);
        assert!(cfg.user_agent.starts_with("shopfloor-clock/"));
    }

    #[test]
    fn interactive_by_default() {
        let args = Cli::parse_from(["shopfloor-clock", "--endpoint", "https://example.com/x"]);
        assert!(!args.is_headless());
        assert_eq!(args.busy_style, BusyStyle::DisableButtons);
    }

    #[test]
    fn selection_flags_require_an_action() {
        let r = Cli::try_parse_from(["shopfloor-clock", "--operator", "Alice"]);
        assert!(r.is_err());
        let r = Cli::try_parse_from(["shopfloor-clock", "--json", "--text"]);
        assert!(r.is_err());
    }

    #[test]
    fn message_json_has_envelope_shape() {
        let s = message_json(EnvelopeStatus::Error, "Please fill in all fields.".into()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"status": "error", "message": "Please fill in all fields."})
        );
    }
}
