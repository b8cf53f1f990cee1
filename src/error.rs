use reqwest::StatusCode;
use thiserror::Error;

/// Coarse classification of remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Network,
    Protocol,
    Application,
}

/// Failure of a single remote call. The `Display` text is what the user sees.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Network error: {status}")]
    HttpStatus { status: StatusCode },
    #[error("Unexpected response from endpoint: {0}")]
    Protocol(String),
    #[error("{0}")]
    Application(String),
}

impl RemoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoteError::Configuration(_) => ErrorKind::Configuration,
            RemoteError::Transport(_) | RemoteError::HttpStatus { .. } => ErrorKind::Network,
            RemoteError::Protocol(_) => ErrorKind::Protocol,
            RemoteError::Application(_) => ErrorKind::Application,
        }
    }

    /// Server-reported failure, preferring its own message over `fallback`.
    pub fn application(message: Option<String>, fallback: &str) -> Self {
        RemoteError::Application(non_empty(message).unwrap_or_else(|| fallback.to_string()))
    }
}

pub(crate) fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}
