//! Form controller.
//!
//! Owns the load/submit state machine and drives the presentation layer through
//! `FormView`. The remote call itself is kept out of the state transitions
//! (`begin_*` / `finish_*`) so the same controller works both inline (`submit`)
//! and from the command loop, where requests run as spawned tasks.

use super::view::{build_entries, FormView};
use crate::error::RemoteError;
use crate::model::{ActionRequest, BusyStyle, Field, InitialData, MessageKind, Selection, WorkAction};
use crate::remote::RemoteApi;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

pub(crate) const FILL_ALL_FIELDS: &str = "Please fill in all fields.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormState {
    Loading,
    Idle,
    Submitting(WorkAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubmitOutcome {
    /// Nothing was sent: the form was busy or a field was empty.
    Rejected,
    Succeeded(String),
    Failed(String),
}

pub(crate) struct FormController<V: FormView> {
    api: Arc<dyn RemoteApi>,
    view: V,
    busy_style: BusyStyle,
    state: FormState,
}

impl<V: FormView> FormController<V> {
    pub fn new(api: Arc<dyn RemoteApi>, view: V, busy_style: BusyStyle) -> Self {
        Self {
            api,
            view,
            busy_style,
            state: FormState::Idle,
        }
    }

    pub fn api(&self) -> Arc<dyn RemoteApi> {
        self.api.clone()
    }

    #[cfg(test)]
    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Enter `Loading`. Returns false (and does nothing) unless the form is idle.
    pub fn begin_load(&mut self) -> bool {
        if self.state != FormState::Idle {
            tracing::debug!(state = ?self.state, "ignoring reload while busy");
            return false;
        }
        tracing::debug!("form state: loading");
        self.state = FormState::Loading;
        self.view.show_loading(true);
        true
    }

    /// Leave `Loading` and populate the inputs. Returns whether the lists were loaded.
    pub fn finish_load(&mut self, result: Result<InitialData, RemoteError>) -> bool {
        self.state = FormState::Idle;
        self.view.show_loading(false);
        match result {
            Ok(data) => {
                for field in Field::ALL {
                    let entries = build_entries(field, field.options(&data));
                    self.view.populate_options(field, entries);
                }
                true
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), error = %e, "loading form data failed");
                self.view.show_message(&e.to_string(), MessageKind::Error);
                false
            }
        }
    }

    pub async fn load_initial_data(&mut self) -> bool {
        if !self.begin_load() {
            return false;
        }
        let result = self.api.fetch_initial_data().await;
        self.finish_load(result)
    }

    /// Validate `selection` and enter `Submitting`. Returns the request to send, if any.
    pub fn begin_submit(&mut self, action: WorkAction, selection: &Selection) -> Option<ActionRequest> {
        if self.state != FormState::Idle {
            tracing::debug!(state = ?self.state, "ignoring submit while busy");
            return None;
        }
        let Some(request) = selection.to_request(action) else {
            tracing::debug!(missing = ?selection.missing_fields(), "submit rejected by validation");
            self.view.show_message(FILL_ALL_FIELDS, MessageKind::Error);
            return None;
        };

        tracing::debug!(?action, "form state: submitting");
        self.state = FormState::Submitting(action);
        self.view.hide_message();
        self.view.set_buttons_enabled(false);
        if self.busy_style == BusyStyle::HideForm {
            self.view.show_loading(true);
        }
        Some(request)
    }

    pub fn finish_submit(&mut self, result: Result<String, RemoteError>) -> SubmitOutcome {
        let action = match self.state {
            FormState::Submitting(a) => Some(a),
            _ => None,
        };
        self.state = FormState::Idle;
        if self.busy_style == BusyStyle::HideForm {
            self.view.show_loading(false);
        }
        self.view.set_buttons_enabled(true);

        match result {
            Ok(message) => {
                tracing::info!(action = ?action, %message, "submission succeeded");
                self.view.show_message(&message, MessageKind::Success);
                self.view.reset_selections();
                SubmitOutcome::Succeeded(message)
            }
            Err(e) => {
                tracing::warn!(action = ?action, kind = ?e.kind(), error = %e, "submission failed");
                let message = e.to_string();
                self.view.show_message(&message, MessageKind::Error);
                SubmitOutcome::Failed(message)
            }
        }
    }

    pub async fn submit(&mut self, action: WorkAction, selection: &Selection) -> SubmitOutcome {
        let Some(request) = self.begin_submit(action, selection) else {
            return SubmitOutcome::Rejected;
        };
        let result = self.api.submit_action(&request).await;
        self.finish_submit(result)
    }

    /// Return to `Idle` after an in-flight request was lost without a result.
    fn abandon(&mut self, reason: &str) {
        tracing::error!(state = ?self.state, reason, "request task lost");
        let was_submitting = matches!(self.state, FormState::Submitting(_));
        let was_loading = self.state == FormState::Loading;
        self.state = FormState::Idle;
        if was_loading || (was_submitting && self.busy_style == BusyStyle::HideForm) {
            self.view.show_loading(false);
        }
        if was_submitting {
            self.view.set_buttons_enabled(true);
        }
        self.view.show_message(reason, MessageKind::Error);
    }
}

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit {
        action: WorkAction,
        selection: Selection,
    },
    Reload,
    Quit,
}

enum Settled {
    Loaded(Result<InitialData, RemoteError>),
    Submitted(Result<String, RemoteError>),
}

fn spawn_load(api: Arc<dyn RemoteApi>) -> JoinHandle<Settled> {
    tokio::spawn(async move { Settled::Loaded(api.fetch_initial_data().await) })
}

fn spawn_submit(api: Arc<dyn RemoteApi>, request: ActionRequest) -> JoinHandle<Settled> {
    tokio::spawn(async move { Settled::Submitted(api.submit_action(&request).await) })
}

/// Load the form, then serve UI commands until `Quit` or the command channel closes.
///
/// At most one request is in flight; commands arriving meanwhile are handled by
/// the controller's state check.
pub(crate) async fn run_controller<V: FormView>(
    mut controller: FormController<V>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut in_flight: Option<JoinHandle<Settled>> = None;
    if controller.begin_load() {
        in_flight = Some(spawn_load(controller.api()));
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit { action, selection }) => {
                        if let Some(request) = controller.begin_submit(action, &selection) {
                            in_flight = Some(spawn_submit(controller.api(), request));
                        }
                    }
                    Some(UiCommand::Reload) => {
                        if controller.begin_load() {
                            in_flight = Some(spawn_load(controller.api()));
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // A pending request is dropped with the loop.
                        if let Some(handle) = in_flight.take() {
                            handle.abort();
                        }
                        break;
                    }
                }
            }
            // Keep the JoinHandle in place until this branch wins so it is never lost.
            settled = async {
                if let Some(handle) = in_flight.as_mut() {
                    return Some(handle.await);
                }
                futures::future::pending().await
            } => {
                in_flight = None;
                match settled {
                    Some(Ok(Settled::Loaded(result))) => {
                        controller.finish_load(result);
                    }
                    Some(Ok(Settled::Submitted(result))) => {
                        controller.finish_submit(result);
                    }
                    Some(Err(e)) => controller.abandon(&format!("Request failed: {e}")),
                    None => {}
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
