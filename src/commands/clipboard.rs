//! Clipboard access. Text read/write goes through `arboard`; the
//! copy-current-selection and paste triggers are System Events keystrokes.

use crate::error::{MctrlError, Result};
use crate::platform;
use crate::script;
use arboard::Clipboard as SystemClipboard;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Clipboard {
    /// Print current clipboard contents to stdout
    View,
    /// Copy text to the clipboard. If no text given, triggers Cmd+C
    Copy {
        /// Text to copy
        text: Option<String>,
    },
    /// Trigger a paste action (Cmd+V)
    Paste,
}

impl Clipboard {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Clipboard::View => {
                let text = read_text()?;
                if text.ends_with('\n') {
                    print!("{}", text);
                } else {
                    println!("{}", text);
                }
                Ok(())
            }
            Clipboard::Copy { text: Some(text) } => write_text(&text),
            Clipboard::Copy { text: None } => {
                script::osascript(
                    "tell application \"System Events\" to keystroke \"c\" using {command down}",
                )?;
                Ok(())
            }
            Clipboard::Paste => {
                script::osascript(
                    "tell application \"System Events\" to keystroke \"v\" using {command down}",
                )?;
                Ok(())
            }
        }
    }
}

pub(crate) fn read_text() -> Result<String> {
    let mut clipboard = open_clipboard()?;
    match clipboard.get_text() {
        Ok(text) => Ok(text),
        // An empty or non-text clipboard is not an error for `view`.
        Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
        Err(e) => Err(MctrlError::Failed(format!("cannot read clipboard: {}", e))),
    }
}

pub(crate) fn write_text(text: &str) -> Result<()> {
    let mut clipboard = open_clipboard()?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| MctrlError::Failed(format!("cannot write clipboard: {}", e)))
}

fn open_clipboard() -> Result<SystemClipboard> {
    SystemClipboard::new().map_err(|e| MctrlError::Failed(format!("cannot open clipboard: {}", e)))
}

#[cfg(all(target_os = "macos", feature = "system-tests"))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_then_view_round_trips() {
        write_text("mctrl clipboard test").unwrap();
        assert_eq!(read_text().unwrap(), "mctrl clipboard test");
    }
}
