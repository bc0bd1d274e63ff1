//! Window management: list via Quartz, manipulate via System Events.

use crate::error::{MctrlError, Result};
use crate::output;
use crate::platform;
use crate::script::{self, sanitize};
use clap::Subcommand;
use serde::{Deserialize, Serialize};

#[derive(Subcommand, Debug)]
pub enum Window {
    /// List all visible application windows
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bring an application window to the front
    Focus {
        /// Application name
        app: String,
    },
    /// Resize the frontmost window
    Resize {
        /// Width in pixels
        #[arg(long)]
        width: i64,
        /// Height in pixels
        #[arg(long)]
        height: i64,
        /// Target app (default: frontmost)
        #[arg(long)]
        app: Option<String>,
    },
    /// Move the frontmost window to a position
    Move {
        /// X position
        #[arg(long)]
        x: i64,
        /// Y position
        #[arg(long)]
        y: i64,
        /// Target app (default: frontmost)
        #[arg(long)]
        app: Option<String>,
    },
    /// Minimize the frontmost window
    Minimize {
        /// Target app
        #[arg(long)]
        app: Option<String>,
    },
    /// Toggle fullscreen for the frontmost window
    Fullscreen {
        /// Target app
        #[arg(long)]
        app: Option<String>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct WindowInfo {
    app: String,
    title: String,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

const LIST_WINDOWS_SRC: &str = r#"
import Quartz, json
wl = Quartz.CGWindowListCopyWindowInfo(Quartz.kCGWindowListOptionOnScreenOnly | Quartz.kCGWindowListExcludeDesktopElements, Quartz.kCGNullWindowID)
out = []
for w in wl:
    name = w.get('kCGWindowOwnerName', '')
    title = w.get('kCGWindowName', '')
    b = w.get('kCGWindowBounds', {})
    layer = w.get('kCGWindowLayer', 0)
    if layer == 0 and name:
        out.append({'app': name, 'title': title or '', 'x': int(b.get('X', 0)), 'y': int(b.get('Y', 0)), 'width': int(b.get('Width', 0)), 'height': int(b.get('Height', 0))})
print(json.dumps(out))
"#;

impl Window {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Window::List { json } => list(json),
            Window::Focus { app } => {
                script::osascript(&format!(
                    "tell application {} to activate",
                    sanitize::quoted(&app)
                ))?;
                println!("Focused: {}", app);
                Ok(())
            }
            Window::Resize { width, height, app } => {
                script::osascript(&format!(
                    "tell application \"System Events\" to set size of front window of {} to {{{}, {}}}",
                    target_fragment(app.as_deref()),
                    width,
                    height
                ))?;
                println!("Resized to {}x{}", width, height);
                Ok(())
            }
            Window::Move { x, y, app } => {
                script::osascript(&format!(
                    "tell application \"System Events\" to set position of front window of {} to {{{}, {}}}",
                    target_fragment(app.as_deref()),
                    x,
                    y
                ))?;
                println!("Moved to ({}, {})", x, y);
                Ok(())
            }
            Window::Minimize { app } => {
                script::osascript(&format!(
                    "tell application \"System Events\" to click (first button of front window of {} whose subrole is \"AXMinimizeButton\")",
                    target_fragment(app.as_deref())
                ))?;
                println!("Minimized.");
                Ok(())
            }
            Window::Fullscreen { app } => {
                script::osascript(&format!(
                    "tell application \"System Events\" to click (first button of front window of {} whose subrole is \"AXFullScreenButton\")",
                    target_fragment(app.as_deref())
                ))?;
                println!("Toggled fullscreen.");
                Ok(())
            }
        }
    }
}

/// System Events process specifier: a named app or the frontmost one. The
/// app name is escaped as a literal; it still selects the target process.
pub(crate) fn target_fragment(app: Option<&str>) -> String {
    match app {
        Some(app) => format!("application process {}", sanitize::quoted(app)),
        None => "first application process whose frontmost is true".to_string(),
    }
}

fn list(json: bool) -> Result<()> {
    let raw = script::python(LIST_WINDOWS_SRC)?;
    let windows: Vec<WindowInfo> = if raw.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| MctrlError::Failed(format!("unexpected window list output: {}", e)))?
    };
    if windows.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No windows found.");
        }
        return Ok(());
    }
    if json {
        output::json_out(&windows);
    } else {
        for w in &windows {
            println!(
                "  [{}] {}\n    Position: {},{} Size: {}x{}",
                w.app, w.title, w.x, w.y, w.width, w.height
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontmost_is_the_default_target() {
        assert_eq!(
            target_fragment(None),
            "first application process whose frontmost is true"
        );
    }

    #[test]
    fn named_target_is_escaped() {
        assert_eq!(
            target_fragment(Some("Google Chrome")),
            "application process \"Google Chrome\""
        );
        assert_eq!(
            target_fragment(Some("Fun\"App")),
            "application process \"Fun\\\"App\""
        );
    }

    #[test]
    fn window_list_parses_quartz_json() {
        let raw = r#"[{"app": "Finder", "title": "Downloads", "x": 0, "y": 25, "width": 800, "height": 600}]"#;
        let windows: Vec<WindowInfo> = serde_json::from_str(raw).unwrap();
        assert_eq!(windows[0].app, "Finder");
        assert_eq!(windows[0].height, 600);
    }
}
