//! Structured JSONL logging for AI agents plus human-readable stderr.
//!
//! Dual-output:
//! - **JSONL to file** (`~/.mctrl/logs/mctrl.jsonl`) — structured, info
//!   level, for agents that want to audit what a command actually ran.
//! - **Compact to stderr** — warnings and errors only unless `RUST_LOG`
//!   says otherwise. stderr is part of the CLI's error contract, so nothing
//!   decorative is printed there.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Guard that must be kept alive for the duration of the process; dropping
/// it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
pub fn init() -> LoggingGuard {
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(stderr_filter);

    let (file_layer, file_guard) = match open_log_file() {
        Some(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_filter(EnvFilter::new("info"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    LoggingGuard {
        _file_guard: file_guard,
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = log_dir();
    fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mctrl.jsonl"))
        .ok()
}

fn log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".mctrl").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("mctrl-logs"))
}
