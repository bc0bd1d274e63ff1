//! Output conventions shared by the command groups.
//!
//! Record-producing AppleScript snippets emit one record per line with `|||`
//! between fields; the helpers here split that deterministically (the engine
//! already trimmed the trailing newline). `--json` output is pretty-printed
//! so agents can parse it and humans can read it.

use serde::Serialize;
use tracing::error;

/// Field separator used inside AppleScript-produced records.
pub const FIELD_SEP: &str = "|||";

/// Pretty-print a value as JSON to stdout.
pub fn json_out<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => error!(error = %e, "failed to serialize output"),
    }
}

/// Non-empty record lines of a raw output block.
pub fn records(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().filter(|line| !line.trim().is_empty())
}

/// Split one record into its `|||`-separated fields.
pub fn fields(record: &str) -> Vec<&str> {
    record.split(FIELD_SEP).collect()
}
