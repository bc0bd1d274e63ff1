//! Failure classification.
//!
//! Maps a failed invocation onto the fixed error taxonomy. Matching runs in
//! priority order: the permission denials outrank everything else because
//! their remediation differs (different System Settings panes), and a
//! generic "exit status 1" message would send the user down the wrong path.
//! `osascript` reports both denials on stderr with stable phrases and error
//! numbers (-1743 automation, -25211 assistive access).

use super::runner::RawOutput;
use super::Invocation;
use crate::error::MctrlError;
use tracing::debug;

const AUTOMATION_PHRASES: &[&str] = &["not authorized to send apple events", "-1743"];
const ACCESSIBILITY_PHRASES: &[&str] = &["not allowed assistive access", "-25211"];

pub(crate) fn classify(inv: &Invocation, raw: &RawOutput) -> MctrlError {
    let stderr_lower = raw.stderr.to_lowercase();
    debug!(
        exit_code = raw.exit_code,
        timed_out = raw.timed_out,
        stderr_bytes = raw.stderr.len(),
        "classifying failure"
    );

    if AUTOMATION_PHRASES.iter().any(|p| stderr_lower.contains(p)) {
        return MctrlError::AutomationDenied;
    }
    if ACCESSIBILITY_PHRASES.iter().any(|p| stderr_lower.contains(p)) {
        return MctrlError::AccessibilityDenied;
    }
    if raw.timed_out {
        return MctrlError::Timeout {
            interpreter: inv.program_name().to_string(),
            limit: inv.limit(),
        };
    }

    let stderr = raw.stderr.trim();
    if stderr.is_empty() {
        MctrlError::Failed(format!(
            "{} exited with status {}",
            inv.program_name(),
            raw.exit_code
        ))
    } else {
        MctrlError::Failed(stderr.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Dialect;
    use std::time::Duration;

    fn failed(stderr: &str, timed_out: bool) -> RawOutput {
        RawOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: 1,
            timed_out,
        }
    }

    fn applescript_inv() -> Invocation {
        Invocation::new(Dialect::AppleScript, "return 1")
    }

    #[test]
    fn automation_denial_beats_generic_error_text() {
        let raw = failed(
            "execution error: Not authorized to send Apple events to System Events. (-1743)\n\
             some other generic failure text",
            false,
        );
        assert!(matches!(
            classify(&applescript_inv(), &raw),
            MctrlError::AutomationDenied
        ));
    }

    #[test]
    fn automation_denial_beats_timeout() {
        let raw = failed("Not authorized to send Apple events to Finder. (-1743)", true);
        assert!(matches!(
            classify(&applescript_inv(), &raw),
            MctrlError::AutomationDenied
        ));
    }

    #[test]
    fn assistive_access_denial_is_specific() {
        let raw = failed(
            "execution error: mctrl is not allowed assistive access. (-25211)",
            false,
        );
        assert!(matches!(
            classify(&applescript_inv(), &raw),
            MctrlError::AccessibilityDenied
        ));
    }

    #[test]
    fn timeout_names_dialect_interpreter_and_limit() {
        let inv = Invocation::new(Dialect::Python, "print(1)").timeout(Duration::from_secs(2));
        let raw = failed("", true);
        match classify(&inv, &raw) {
            MctrlError::Timeout { interpreter, limit } => {
                assert_eq!(interpreter, "python3");
                assert_eq!(limit, Duration::from_secs(2));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[test]
    fn generic_failure_carries_raw_stderr() {
        let raw = failed("SyntaxError: invalid syntax", false);
        match classify(&applescript_inv(), &raw) {
            MctrlError::Failed(msg) => assert_eq!(msg, "SyntaxError: invalid syntax"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn silent_nonzero_exit_reports_the_status() {
        let raw = RawOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 7,
            timed_out: false,
        };
        match classify(&applescript_inv(), &raw) {
            MctrlError::Failed(msg) => {
                assert!(msg.contains("osascript"));
                assert!(msg.contains('7'));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        let raw = failed("NOT AUTHORIZED TO SEND APPLE EVENTS to Mail.", false);
        assert!(matches!(
            classify(&applescript_inv(), &raw),
            MctrlError::AutomationDenied
        ));
    }
}
