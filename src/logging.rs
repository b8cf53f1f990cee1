//! Tracing setup.
//!
//! The TUI owns the terminal, so interactive runs log to a file in the user's
//! cache directory. Headless runs log to stderr.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn log_file_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("shopfloor-clock").join("shopfloor-clock.log"))
}

pub fn init(interactive: bool) -> Result<()> {
    if !interactive {
        return tracing_subscriber::fmt()
            .with_env_filter(filter("warn"))
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!(e));
    }

    let Some(path) = log_file_path() else {
        return tracing_subscriber::fmt()
            .with_env_filter(filter("info"))
            .with_writer(std::io::sink)
            .try_init()
            .map_err(|e| anyhow!(e));
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter("info"))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!(e))
}
