//! OS-level actions: notifications, app lifecycle, frontmost app.

use crate::commands::clipboard;
use crate::error::{MctrlError, Result};
use crate::output;
use crate::platform;
use crate::script::{self, sanitize};
use clap::Subcommand;
use std::thread;
use std::time::Duration;

#[derive(Subcommand, Debug)]
pub enum Os {
    /// Show a macOS system notification
    Notify {
        /// Notification body
        text: String,
        /// Notification title
        #[arg(long, default_value = "mctrl")]
        title: String,
    },
    /// Open a macOS application by name
    OpenApp {
        /// Application name
        app: String,
    },
    /// Quit a macOS application by name
    QuitApp {
        /// Application name
        app: String,
    },
    /// Print the name of the frontmost application
    FrontmostApp {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open a URL in the default browser
    OpenUrl {
        /// URL to open
        url: String,
    },
    /// List running (visible) applications
    ListApps {
        #[arg(long)]
        json: bool,
    },
    /// Get the currently selected text (copies selection and reads clipboard)
    GetSelectedText,
}

impl Os {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Os::Notify { text, title } => {
                script::osascript(&format!(
                    "display notification {} with title {}",
                    sanitize::quoted(&text),
                    sanitize::quoted(&title)
                ))?;
                Ok(())
            }
            Os::OpenApp { app } => {
                script::shell("open", &["-a", &app])?;
                println!("Opened: {}", app);
                Ok(())
            }
            Os::QuitApp { app } => {
                script::osascript(&format!(
                    "tell application {} to quit",
                    sanitize::quoted(&app)
                ))?;
                println!("Quit: {}", app);
                Ok(())
            }
            Os::FrontmostApp { json } => {
                let name = script::osascript(
                    "tell application \"System Events\" to get name of first application process whose frontmost is true",
                )?;
                if json {
                    output::json_out(&serde_json::json!({ "app": name }));
                } else {
                    println!("{}", name);
                }
                Ok(())
            }
            Os::OpenUrl { url } => open::that(&url)
                .map_err(|e| MctrlError::Failed(format!("Failed to open '{}': {}", url, e))),
            Os::ListApps { json } => {
                let raw = script::osascript(
                    "tell application \"System Events\" to get name of every application process whose background only is false",
                )?;
                let apps = parse_app_list(&raw);
                if json {
                    output::json_out(&apps);
                } else {
                    for app in apps {
                        println!("{}", app);
                    }
                }
                Ok(())
            }
            Os::GetSelectedText => get_selected_text(),
        }
    }
}

/// AppleScript renders a list of names as a comma-separated line.
fn parse_app_list(raw: &str) -> Vec<String> {
    raw.split(", ")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Copy the current selection with Cmd+C, read it, then restore the
/// clipboard so the command leaves no trace.
fn get_selected_text() -> Result<()> {
    let previous = clipboard::read_text()?;
    script::osascript(
        "tell application \"System Events\" to keystroke \"c\" using {command down}",
    )?;
    // Give the frontmost app a moment to service the copy.
    thread::sleep(Duration::from_millis(200));
    let selected = clipboard::read_text()?;
    clipboard::write_text(&previous)?;
    println!("{}", selected);
    Ok(())
}
