use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::warn;

/// Default per-interpreter timeouts in milliseconds. Interpreters differ a
/// lot in startup cost: python one-liners are quick, `swift` has to compile,
/// and raw tools like `screencapture -v` can legitimately run for a while.
pub const DEFAULT_PYTHON_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_APPLESCRIPT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_SWIFT_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_SHELL_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default = "default_applescript_ms", rename = "applescriptMs")]
    pub applescript_ms: u64,
    #[serde(default = "default_swift_ms", rename = "swiftMs")]
    pub swift_ms: u64,
    #[serde(default = "default_python_ms", rename = "pythonMs")]
    pub python_ms: u64,
    #[serde(default = "default_shell_ms", rename = "shellMs")]
    pub shell_ms: u64,
}

fn default_applescript_ms() -> u64 {
    DEFAULT_APPLESCRIPT_TIMEOUT_MS
}
fn default_swift_ms() -> u64 {
    DEFAULT_SWIFT_TIMEOUT_MS
}
fn default_python_ms() -> u64 {
    DEFAULT_PYTHON_TIMEOUT_MS
}
fn default_shell_ms() -> u64 {
    DEFAULT_SHELL_TIMEOUT_MS
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            applescript_ms: DEFAULT_APPLESCRIPT_TIMEOUT_MS,
            swift_ms: DEFAULT_SWIFT_TIMEOUT_MS,
            python_ms: DEFAULT_PYTHON_TIMEOUT_MS,
            shell_ms: DEFAULT_SHELL_TIMEOUT_MS,
        }
    }
}

/// User configuration, read once from `~/.mctrl/config.json`. Everything is
/// optional; a missing or malformed file falls back to defaults with a
/// warning rather than failing the command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Default browser app for the `browser` commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".mctrl").join("config.json"))
}

fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return Config::default(),
    };
    match serde_json::from_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "malformed config, using defaults");
            Config::default()
        }
    }
}

/// Process-wide config snapshot.
pub fn get() -> &'static Config {
    static CONFIG: OnceLock<Config> = OnceLock::new();
    CONFIG.get_or_init(load_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_interpreter_startup_costs() {
        let t = Timeouts::default();
        assert_eq!(t.python_ms, 10_000);
        assert_eq!(t.applescript_ms, 15_000);
        assert_eq!(t.swift_ms, 20_000);
        assert_eq!(t.shell_ms, 30_000);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let config: Config =
            serde_json::from_str(r#"{"timeouts": {"swiftMs": 45000}}"#).unwrap();
        assert_eq!(config.timeouts.swift_ms, 45_000);
        assert_eq!(config.timeouts.python_ms, DEFAULT_PYTHON_TIMEOUT_MS);
        assert!(config.browser.is_none());
    }

    #[test]
    fn browser_override_round_trips() {
        let config: Config = serde_json::from_str(r#"{"browser": "Safari"}"#).unwrap();
        assert_eq!(config.browser.as_deref(), Some("Safari"));
    }
}
