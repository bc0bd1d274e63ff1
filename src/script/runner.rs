//! Materialization and dispatch.
//!
//! Decides, per dialect, whether source travels inline on the argument
//! vector or through a uniquely-named temp file, then spawns the interpreter
//! in its own process group and enforces the invocation's wall-clock
//! timeout. Children are always spawned argv-style; no shell ever
//! interprets a composed command string.

use crate::error::{MctrlError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

use super::{Dialect, Invocation};

/// Captured outcome of one child process.
#[derive(Debug)]
pub(crate) struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

impl RawOutput {
    pub(crate) fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// A script written to the system temp directory for the duration of one
/// invocation. The name embeds pid and a nanosecond stamp so concurrent
/// invocations never collide; `Drop` removes the file on every exit path.
pub(crate) struct TempScript {
    path: PathBuf,
}

impl TempScript {
    pub(crate) fn create(source: &str, extension: &str) -> Result<Self> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!(
            "mctrl_{}_{}.{}",
            std::process::id(),
            nanos,
            extension
        ));
        std::fs::write(&path, source).map_err(|e| {
            MctrlError::Failed(format!("Failed to write temp script: {}", e))
        })?;
        debug!(path = %path.display(), bytes = source.len(), "temp script written");
        Ok(Self { path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempScript {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove temp script");
            }
        }
    }
}

/// Fully materialized invocation: the program to spawn, its argv, and the
/// temp file keeping the source alive until dispatch completes.
pub(crate) struct Plan {
    pub program: String,
    pub argv: Vec<String>,
    pub temp: Option<TempScript>,
}

/// Decide inline vs file transport and build the argv.
///
/// Inline is used where the interpreter has an evaluate-this-expression mode
/// and the source needs no multi-statement structure; a Python source with
/// embedded newlines cannot be guaranteed a single-expression context, so it
/// is forced onto file transport. Swift only accepts a path.
pub(crate) fn materialize(inv: &Invocation) -> Result<Plan> {
    let mut argv: Vec<String>;
    let program;
    let mut temp = None;

    match inv.dialect() {
        Dialect::AppleScript => {
            program = "osascript".to_string();
            argv = vec!["-e".to_string(), inv.source().to_string()];
        }
        Dialect::Swift => {
            let file = TempScript::create(inv.source(), inv.dialect().extension())?;
            program = "swift".to_string();
            argv = vec![file.path().to_string_lossy().into_owned()];
            temp = Some(file);
        }
        Dialect::Python => {
            program = "python3".to_string();
            if inv.source().contains('\n') {
                let file = TempScript::create(inv.source(), inv.dialect().extension())?;
                argv = vec![file.path().to_string_lossy().into_owned()];
                temp = Some(file);
            } else {
                argv = vec!["-c".to_string(), inv.source().to_string()];
            }
        }
        Dialect::Shell => {
            program = inv.source().to_string();
            argv = Vec::new();
        }
    }

    argv.extend(inv.arg_slice().iter().cloned());
    Ok(Plan { program, argv, temp })
}

/// Materialize and execute one invocation. The temp file (if any) is removed
/// when the plan drops — after the child has exited or been killed.
pub(crate) fn dispatch(inv: &Invocation) -> Result<RawOutput> {
    let plan = materialize(inv)?;
    debug!(program = %plan.program, args = ?plan.argv, "dispatching");
    run_with_timeout(&plan.program, &plan.argv, inv.limit())
}

/// Spawn `program` with `argv`, wait up to `limit`, and capture everything.
///
/// A monitor thread owns the blocking `wait_with_output`; the caller waits on
/// a channel with `recv_timeout`. On expiry the child's process group gets
/// SIGTERM, a short grace, then SIGKILL, and the reaped output (if any) is
/// reported with `timed_out` set. A timed-out invocation is never retried.
fn run_with_timeout(program: &str, argv: &[String], limit: Duration) -> Result<RawOutput> {
    let resolved = which::which(program).map_err(|_| MctrlError::InterpreterMissing {
        program: program.to_string(),
    })?;

    let mut command = Command::new(&resolved);
    command
        .args(argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // New process group so a timeout kill takes interpreter children with it.
    #[cfg(unix)]
    command.process_group(0);

    let child = command.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MctrlError::InterpreterMissing {
            program: program.to_string(),
        },
        _ => MctrlError::Failed(format!("Failed to spawn '{}': {}", program, e)),
    })?;

    let pid = child.id();
    let (tx, rx) = mpsc::channel();
    let monitor = thread::spawn(move || {
        let _ = tx.send(child.wait_with_output());
    });

    match rx.recv_timeout(limit) {
        Ok(result) => {
            let _ = monitor.join();
            let output = result
                .map_err(|e| MctrlError::Failed(format!("Failed to wait for '{}': {}", program, e)))?;
            Ok(RawOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code().unwrap_or(-1),
                timed_out: false,
            })
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(program = %program, pid = pid, limit_ms = limit.as_millis() as u64, "timeout, killing process group");
            kill_process_group(pid);
            // Reap whatever the child managed to emit before dying.
            let reaped = rx
                .recv_timeout(Duration::from_secs(1))
                .ok()
                .and_then(|r| r.ok());
            let _ = monitor.join();
            let (stdout, stderr) = reaped
                .map(|o| {
                    (
                        String::from_utf8_lossy(&o.stdout).into_owned(),
                        String::from_utf8_lossy(&o.stderr).into_owned(),
                    )
                })
                .unwrap_or_default();
            Ok(RawOutput {
                stdout,
                stderr,
                exit_code: -1,
                timed_out: true,
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(MctrlError::Failed(format!(
            "Monitor thread for '{}' exited unexpectedly",
            program
        ))),
    }
}

/// SIGTERM the process group, poll briefly for exit, escalate to SIGKILL.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    const TERM_GRACE_MS: u64 = 250;
    const POLL_INTERVAL_MS: u64 = 50;

    let pgid = -(pid as libc::pid_t);
    if unsafe { libc::kill(pgid, libc::SIGTERM) } != 0 {
        // ESRCH: already gone.
        return;
    }
    let deadline = std::time::Instant::now() + Duration::from_millis(TERM_GRACE_MS);
    while std::time::Instant::now() < deadline {
        if unsafe { libc::kill(pgid, 0) } != 0 {
            return;
        }
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
    let _ = unsafe { libc::kill(pgid, libc::SIGKILL) };
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_script_is_removed_on_drop() {
        let path = {
            let file = TempScript::create("print('hi')", "py").unwrap();
            assert!(file.path().exists());
            file.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn temp_names_are_unique_across_rapid_creation() {
        let a = TempScript::create("1", "swift").unwrap();
        let b = TempScript::create("2", "swift").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn applescript_is_always_inline() {
        let inv = Invocation::new(Dialect::AppleScript, "return 1");
        let plan = materialize(&inv).unwrap();
        assert_eq!(plan.program, "osascript");
        assert_eq!(plan.argv, vec!["-e".to_string(), "return 1".to_string()]);
        assert!(plan.temp.is_none());
    }

    #[test]
    fn single_line_python_is_inline() {
        let inv = Invocation::new(Dialect::Python, "print(1)");
        let plan = materialize(&inv).unwrap();
        assert_eq!(plan.argv[0], "-c");
        assert!(plan.temp.is_none());
    }

    #[test]
    fn multi_line_python_is_file_backed() {
        let inv = Invocation::new(Dialect::Python, "import sys\nprint(1)");
        let plan = materialize(&inv).unwrap();
        let temp = plan.temp.as_ref().expect("expected a temp file");
        assert_eq!(plan.argv[0], temp.path().to_string_lossy());
        assert_eq!(temp.path().extension().unwrap(), "py");
        assert_eq!(
            std::fs::read_to_string(temp.path()).unwrap(),
            "import sys\nprint(1)"
        );
    }

    #[test]
    fn swift_is_file_backed() {
        let inv = Invocation::new(Dialect::Swift, "print(1)");
        let plan = materialize(&inv).unwrap();
        assert!(plan.temp.is_some());
        assert_eq!(
            plan.temp.as_ref().unwrap().path().extension().unwrap(),
            "swift"
        );
    }

    #[test]
    fn shell_program_comes_from_source() {
        let inv = Invocation::new(Dialect::Shell, "screencapture").args(["-x", "/tmp/out.png"]);
        let plan = materialize(&inv).unwrap();
        assert_eq!(plan.program, "screencapture");
        assert_eq!(plan.argv, vec!["-x".to_string(), "/tmp/out.png".to_string()]);
        assert!(plan.temp.is_none());
    }

    #[test]
    fn temp_file_is_gone_when_the_plan_drops() {
        let inv = Invocation::new(Dialect::Swift, "print(1)");
        let path = {
            let plan = materialize(&inv).unwrap();
            plan.temp.as_ref().unwrap().path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn temp_file_is_gone_after_a_real_file_backed_run() {
        if which::which("python3").is_err() {
            eprintln!("Skipping test: python3 not available in test environment");
            return;
        }
        // Multi-line source forces file transport; the script reports its own
        // path, which must be gone by the time run() returns.
        let reported = Invocation::new(Dialect::Python, "import sys\nprint(__file__)")
            .run()
            .unwrap();
        assert!(reported.contains("mctrl_"));
        assert!(!std::path::Path::new(reported.trim()).exists());
    }

    #[cfg(unix)]
    #[test]
    fn captures_stderr_and_exit_code() {
        let out = run_with_timeout(
            "sh",
            &["-c".to_string(), "echo oops >&2; exit 3".to_string()],
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stderr.trim(), "oops");
        assert!(!out.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn timeout_sets_the_flag() {
        let out = run_with_timeout(
            "sleep",
            &["20".to_string()],
            Duration::from_millis(200),
        )
        .unwrap();
        assert!(out.timed_out);
        assert!(!out.success());
    }
}
