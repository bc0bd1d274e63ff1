use std::time::Duration;
use thiserror::Error;

/// Domain errors for mctrl.
///
/// Every failure a command can surface maps to one of these variants; the
/// CLI layer prints the message to stderr and exits with [`exit_code`].
/// Remediation texts are fixed so agents can match on them.
///
/// [`exit_code`]: MctrlError::exit_code
#[derive(Error, Debug)]
pub enum MctrlError {
    #[error("this command requires macOS.")]
    UnsupportedPlatform,

    #[error(
        "Automation access denied. Grant your terminal access in \
         System Settings > Privacy & Security > Automation, then re-run."
    )]
    AutomationDenied,

    #[error(
        "Accessibility access denied. Grant your terminal access in \
         System Settings > Privacy & Security > Accessibility, then re-run."
    )]
    AccessibilityDenied,

    #[error("{interpreter} timed out after {}s.", .limit.as_secs())]
    Timeout {
        interpreter: String,
        limit: Duration,
    },

    #[error("'{program}' not found. Install it or check your PATH.")]
    InterpreterMissing { program: String },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Failed(String),
}

impl MctrlError {
    /// Process exit code for this error. Success is 0; every classified
    /// failure exits 1.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub type Result<T> = std::result::Result<T, MctrlError>;
