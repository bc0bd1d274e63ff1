//! Script execution engine.
//!
//! Everything mctrl does against the OS goes through here: a command handler
//! builds a source string (AppleScript, Swift, Python) or names an external
//! tool, and this module gets it onto the right interpreter with a timeout
//! and turns the outcome into either trimmed stdout or a classified
//! [`MctrlError`].
//!
//! The pipeline is strict: materialize (inline vs temp file) → dispatch →
//! classify/normalize → cleanup. Temp files never outlive their invocation.

pub mod sanitize;

mod classify;
mod runner;

use crate::config;
use crate::error::Result;
use std::time::Duration;
use tracing::{debug, instrument};

/// The closed set of script dialects mctrl can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `osascript -e <source>` — always inline.
    AppleScript,
    /// `swift <file>` — always file-backed; the interpreter only takes a path.
    Swift,
    /// `python3 -c <source>` for one-liners, file-backed for multi-line source.
    Python,
    /// A raw external tool (`screencapture`, `rg`, …); source is the program
    /// name and caller values travel as discrete argv elements, never as a
    /// shell string.
    Shell,
}

impl Dialect {
    /// Interpreter binary for this dialect. `Shell` carries its program in
    /// the invocation source instead.
    pub(crate) fn interpreter(self) -> Option<&'static str> {
        match self {
            Dialect::AppleScript => Some("osascript"),
            Dialect::Swift => Some("swift"),
            Dialect::Python => Some("python3"),
            Dialect::Shell => None,
        }
    }

    /// Default wall-clock timeout. Interpreters have very different startup
    /// costs; the config file can override each of these.
    pub fn default_timeout(self) -> Duration {
        let timeouts = &config::get().timeouts;
        let ms = match self {
            Dialect::AppleScript => timeouts.applescript_ms,
            Dialect::Swift => timeouts.swift_ms,
            Dialect::Python => timeouts.python_ms,
            Dialect::Shell => timeouts.shell_ms,
        };
        Duration::from_millis(ms)
    }

    pub(crate) fn extension(self) -> &'static str {
        match self {
            Dialect::AppleScript => "applescript",
            Dialect::Swift => "swift",
            Dialect::Python => "py",
            Dialect::Shell => "sh",
        }
    }
}

/// One request to run a source string under a dialect. Built by a command
/// handler, consumed exactly once by [`Invocation::run`].
#[derive(Debug)]
pub struct Invocation {
    dialect: Dialect,
    source: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Invocation {
    pub fn new(dialect: Dialect, source: impl Into<String>) -> Self {
        Self {
            dialect,
            source: source.into(),
            args: Vec::new(),
            timeout: dialect.default_timeout(),
        }
    }

    /// Append discrete argument-vector elements passed through to the child
    /// process after the source/script path.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Override the dialect's default timeout for this invocation.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn arg_slice(&self) -> &[String] {
        &self.args
    }

    pub(crate) fn limit(&self) -> Duration {
        self.timeout
    }

    /// The name the user sees in timeout/missing-binary messages: the
    /// interpreter for script dialects, the tool itself for `Shell`.
    pub(crate) fn program_name(&self) -> &str {
        self.dialect.interpreter().unwrap_or(&self.source)
    }

    /// Execute this invocation and return trimmed stdout, or a classified
    /// error. Never retries; any created temp file is removed before this
    /// returns, on every path.
    #[instrument(skip_all, fields(dialect = ?self.dialect))]
    pub fn run(self) -> Result<String> {
        let raw = runner::dispatch(&self)?;
        if raw.success() {
            debug!(stdout_bytes = raw.stdout.len(), "invocation succeeded");
            Ok(normalize(&raw.stdout))
        } else {
            Err(classify::classify(&self, &raw))
        }
    }
}

/// Run an AppleScript source string through `osascript`.
pub fn osascript(source: &str) -> Result<String> {
    Invocation::new(Dialect::AppleScript, source).run()
}

/// Run a Swift snippet through the `swift` interpreter.
pub fn swift(source: &str) -> Result<String> {
    Invocation::new(Dialect::Swift, source).run()
}

/// Run Python source through `python3`.
pub fn python(source: &str) -> Result<String> {
    Invocation::new(Dialect::Python, source).run()
}

/// Run an external tool with discrete arguments.
pub fn shell(program: &str, args: &[&str]) -> Result<String> {
    Invocation::new(Dialect::Shell, program)
        .args(args.iter().copied())
        .run()
}

/// Trim trailing whitespace so record parsing does not depend on whether the
/// interpreter appended a final newline. Leading whitespace is preserved;
/// some callers print indented trees.
fn normalize(stdout: &str) -> String {
    stdout.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MctrlError;

    #[test]
    fn normalize_strips_trailing_newline() {
        assert_eq!(normalize("abc\n"), "abc");
        assert_eq!(normalize("abc"), "abc");
        assert_eq!(normalize("abc\r\n"), "abc");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("line one\nline two\n\n");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_keeps_leading_indentation() {
        assert_eq!(normalize("  AXButton \"OK\"\n"), "  AXButton \"OK\"");
    }

    #[test]
    fn dialect_timeouts_are_ordered_by_startup_cost() {
        assert!(Dialect::Python.default_timeout() < Dialect::AppleScript.default_timeout());
        assert!(Dialect::AppleScript.default_timeout() < Dialect::Swift.default_timeout());
        assert!(Dialect::Swift.default_timeout() < Dialect::Shell.default_timeout());
    }

    #[test]
    fn timeout_override_sticks() {
        let inv = Invocation::new(Dialect::Shell, "sleep").timeout(Duration::from_secs(90));
        assert_eq!(inv.limit(), Duration::from_secs(90));
    }

    #[test]
    fn program_name_is_tool_for_shell() {
        let inv = Invocation::new(Dialect::Shell, "screencapture");
        assert_eq!(inv.program_name(), "screencapture");
        let inv = Invocation::new(Dialect::AppleScript, "return 1");
        assert_eq!(inv.program_name(), "osascript");
    }

    #[cfg(unix)]
    #[test]
    fn shell_dialect_runs_a_real_tool() {
        let out = shell("echo", &["hello", "world"]).unwrap();
        assert_eq!(out, "hello world");
    }

    #[cfg(unix)]
    #[test]
    fn missing_tool_is_classified_not_a_crash() {
        let err = shell("mctrl-definitely-not-installed", &[]).unwrap_err();
        match err {
            MctrlError::InterpreterMissing { program } => {
                assert_eq!(program, "mctrl-definitely-not-installed")
            }
            other => panic!("expected InterpreterMissing, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_the_child_within_a_grace_period() {
        use std::time::Instant;
        let start = Instant::now();
        let err = Invocation::new(Dialect::Shell, "sleep")
            .args(["30"])
            .timeout(Duration::from_millis(300))
            .run()
            .unwrap_err();
        // Bounded: configured timeout plus the reap grace, never the full sleep.
        assert!(start.elapsed() < Duration::from_secs(5));
        match err {
            MctrlError::Timeout { interpreter, limit } => {
                assert_eq!(interpreter, "sleep");
                assert_eq!(limit, Duration::from_millis(300));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[cfg(all(target_os = "macos", feature = "system-tests"))]
    #[test]
    fn osascript_round_trips_an_escaped_literal() {
        let value = "He said \"hi\"\\now";
        let src = format!("return {}", sanitize::quoted(value));
        assert_eq!(osascript(&src).unwrap(), value);
    }
}
