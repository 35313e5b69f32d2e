//! Logging setup.
//!
//! The terminal belongs to the UI in TUI mode, so logs go to a file there;
//! CLI mode logs to stderr. The level comes from `RUST_LOG` (default `info`).

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use rand::Rng;
use tracing_subscriber::EnvFilter;

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Returns a fresh log file path in `dir`.
pub fn default_log_path(dir: &Path) -> PathBuf {
    let suffix: u32 = rand::rng().random();
    dir.join(format!("codonfinder-{suffix:08x}.log"))
}

/// Opens a log file for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file {}", path.display()))
}

/// Installs the global subscriber.
pub fn init(target: &LogTarget) -> Result<()> {
    let installed = match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .try_init(),
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    installed.map_err(|e| anyhow::anyhow!("Could not install logger: {e}"))
}
