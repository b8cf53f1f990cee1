//! Client for the remote script endpoint.
//!
//! The endpoint speaks two calls: a read of the option lists and a write of a
//! start/end work action. Both answer with the same `{status, message?, data?}`
//! envelope, which is normalized here into `Result<_, RemoteError>`.

use crate::error::{non_empty, RemoteError};
use crate::model::{
    ActionRequest, ClientConfig, Envelope, EnvelopeStatus, InitialData,
    ENDPOINT_PLACEHOLDER_MARKER,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use url::Url;

const LOAD_FALLBACK: &str = "Failed to load form data.";
const ACTION_FALLBACK: &str = "An error occurred.";
const ACTION_SUCCESS_FALLBACK: &str = "Operation completed.";

/// The endpoint rejects `application/json` on cross-origin calls, so bodies go out as plain text.
const PLAIN_TEXT_UTF8: &str = "text/plain;charset=utf-8";

#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Fetch the operator, commission and phase lists.
    async fn fetch_initial_data(&self) -> Result<InitialData, RemoteError>;

    /// Submit one start/end action and return the server's confirmation message.
    async fn submit_action(&self, request: &ActionRequest) -> Result<String, RemoteError>;
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RemoteClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.trim().to_string(),
        })
    }

    fn endpoint_url(&self) -> Result<Url, RemoteError> {
        resolve_endpoint(&self.endpoint)
    }
}

/// Validate the configured endpoint without touching the network.
pub fn resolve_endpoint(raw: &str) -> Result<Url, RemoteError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains(ENDPOINT_PLACEHOLDER_MARKER) {
        return Err(RemoteError::Configuration(
            "Endpoint URL is not configured; pass --endpoint or set SHOPFLOOR_ENDPOINT.".into(),
        ));
    }
    let url = Url::parse(raw).map_err(|e| {
        RemoteError::Configuration(format!("Endpoint URL '{raw}' is invalid: {e}"))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RemoteError::Configuration(format!(
            "Endpoint URL must use http or https, got '{other}'"
        ))),
    }
}

/// Read the envelope without interpreting `data`, so an error status always keeps its message.
async fn read_envelope(resp: reqwest::Response) -> Result<Envelope<Value>, RemoteError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(RemoteError::HttpStatus { status });
    }
    let body = resp.text().await.map_err(RemoteError::Transport)?;
    serde_json::from_str(&body).map_err(|e| RemoteError::Protocol(e.to_string()))
}

#[async_trait]
impl RemoteApi for RemoteClient {
    async fn fetch_initial_data(&self) -> Result<InitialData, RemoteError> {
        let mut url = self.endpoint_url()?;
        url.query_pairs_mut().append_pair("action", "getInitialData");
        tracing::debug!(%url, "fetching initial data");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(RemoteError::Transport)?;
        let envelope = read_envelope(resp).await?;

        match envelope.status {
            EnvelopeStatus::Success => {
                let data = envelope.data.filter(|v| !v.is_null()).ok_or_else(|| {
                    RemoteError::Protocol("success response without data".into())
                })?;
                let data: InitialData = serde_json::from_value(data)
                    .map_err(|e| RemoteError::Protocol(e.to_string()))?;
                tracing::info!(
                    operators = data.operatori.len(),
                    commissions = data.commesse.len(),
                    phases = data.fasi.len(),
                    "initial data loaded"
                );
                Ok(data)
            }
            EnvelopeStatus::Error => Err(RemoteError::application(envelope.message, LOAD_FALLBACK)),
        }
    }

    async fn submit_action(&self, request: &ActionRequest) -> Result<String, RemoteError> {
        let url = self.endpoint_url()?;
        let body =
            serde_json::to_string(request).map_err(|e| RemoteError::Protocol(e.to_string()))?;
        tracing::debug!(action = request.action.as_wire_str(), "submitting action");

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, PLAIN_TEXT_UTF8)
            .body(body)
            .send()
            .await
            .map_err(RemoteError::Transport)?;
        let envelope = read_envelope(resp).await?;

        match envelope.status {
            EnvelopeStatus::Success => {
                tracing::info!(action = request.action.as_wire_str(), "action accepted");
                Ok(non_empty(envelope.message).unwrap_or_else(|| ACTION_SUCCESS_FALLBACK.into()))
            }
            EnvelopeStatus::Error => Err(RemoteError::application(envelope.message, ACTION_FALLBACK)),
        }
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
