//! Simulated keyboard input via System Events.

use crate::error::{MctrlError, Result};
use crate::platform;
use crate::script::{self, sanitize};
use clap::Subcommand;
use std::thread;
use std::time::Duration;

#[derive(Subcommand, Debug)]
pub enum Keyboard {
    /// Type a string of text using simulated keystrokes
    #[command(name = "type")]
    Type {
        /// Text to type
        text: String,
        /// Milliseconds between characters
        #[arg(long, default_value_t = 0)]
        delay: u64,
    },
    /// Press a key by name: return, tab, space, delete, escape, arrows, f1-f12
    Press {
        /// Key name to press
        key: String,
        /// Number of times to press
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Press a key combination, e.g. `hotkey command shift z`
    Hotkey {
        /// Modifier(s) followed by a key
        #[arg(num_args = 1.., required = true)]
        keys: Vec<String>,
    },
    /// Hold a key down until explicitly released
    Down {
        /// Key to hold
        key: String,
    },
    /// Release a previously held key
    Up {
        /// Key to release
        key: String,
    },
}

impl Keyboard {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Keyboard::Type { text, delay } => type_text(&text, delay),
            Keyboard::Press { key, count } => press(&key, count),
            Keyboard::Hotkey { keys } => hotkey(&keys),
            Keyboard::Down { key } => {
                let code = key_code(&key)?;
                script::osascript(&format!(
                    "tell application \"System Events\" to key down {}",
                    code
                ))?;
                Ok(())
            }
            Keyboard::Up { key } => {
                let code = key_code(&key)?;
                script::osascript(&format!(
                    "tell application \"System Events\" to key up {}",
                    code
                ))?;
                Ok(())
            }
        }
    }
}

fn type_text(text: &str, delay_ms: u64) -> Result<()> {
    if delay_ms > 0 {
        for ch in text.chars() {
            script::osascript(&format!(
                "tell application \"System Events\" to keystroke {}",
                sanitize::quoted(&ch.to_string())
            ))?;
            thread::sleep(Duration::from_millis(delay_ms));
        }
    } else {
        script::osascript(&format!(
            "tell application \"System Events\" to keystroke {}",
            sanitize::quoted(text)
        ))?;
    }
    Ok(())
}

fn press(key: &str, count: u32) -> Result<()> {
    let code = key_code(key)?;
    for _ in 0..count {
        script::osascript(&format!(
            "tell application \"System Events\" to key code {}",
            code
        ))?;
    }
    Ok(())
}

fn hotkey(keys: &[String]) -> Result<()> {
    let Some((key, mods)) = keys.split_last() else {
        return Err(MctrlError::InvalidArgument(
            "hotkey needs at least a modifier and a key.".into(),
        ));
    };
    if mods.is_empty() {
        return Err(MctrlError::InvalidArgument(
            "hotkey needs at least a modifier and a key.".into(),
        ));
    }

    let mod_flags = mods
        .iter()
        .map(|m| modifier_flag(m))
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    script::osascript(&format!(
        "tell application \"System Events\" to {} using {{{}}}",
        keystroke_expr(key),
        mod_flags
    ))?;
    Ok(())
}

fn modifier_flag(modifier: &str) -> Result<&'static str> {
    match modifier.to_lowercase().as_str() {
        "command" | "cmd" => Ok("command down"),
        "shift" => Ok("shift down"),
        "option" | "alt" => Ok("option down"),
        "control" | "ctrl" => Ok("control down"),
        "fn" => Ok("fn down"),
        other => Err(MctrlError::InvalidArgument(format!(
            "Unknown modifier: {}",
            other
        ))),
    }
}

/// Either `key code N` for a named special key or `keystroke "<char>"`.
fn keystroke_expr(key: &str) -> String {
    match special_key_code(key) {
        Some(code) => format!("key code {}", code),
        None => format!("keystroke {}", sanitize::quoted(key)),
    }
}

fn special_key_code(key: &str) -> Option<u16> {
    let code = match key.to_lowercase().as_str() {
        "return" => 36,
        "enter" => 76,
        "tab" => 48,
        "space" => 49,
        "delete" => 51,
        "escape" => 53,
        "up" => 126,
        "down" => 125,
        "left" => 123,
        "right" => 124,
        "f1" => 122,
        "f2" => 120,
        "f3" => 99,
        "f4" => 118,
        "f5" => 96,
        "f6" => 97,
        "f7" => 98,
        "f8" => 100,
        "f9" => 101,
        "f10" => 109,
        "f11" => 103,
        "f12" => 111,
        "home" => 115,
        "end" => 119,
        "pageup" => 116,
        "pagedown" => 121,
        "forwarddelete" => 117,
        _ => return None,
    };
    Some(code)
}

fn key_code(key: &str) -> Result<u16> {
    if let Some(code) = special_key_code(key) {
        return Ok(code);
    }
    let code = match key.to_lowercase().as_str() {
        "a" => 0,
        "b" => 11,
        "c" => 8,
        "d" => 2,
        "e" => 14,
        "f" => 3,
        "g" => 5,
        "h" => 4,
        "i" => 34,
        "j" => 38,
        "k" => 40,
        "l" => 37,
        "m" => 46,
        "n" => 45,
        "o" => 31,
        "p" => 35,
        "q" => 12,
        "r" => 15,
        "s" => 1,
        "t" => 17,
        "u" => 32,
        "v" => 9,
        "w" => 13,
        "x" => 7,
        "y" => 16,
        "z" => 6,
        other => {
            return Err(MctrlError::InvalidArgument(format!(
                "Unknown key: {}",
                other
            )))
        }
    };
    Ok(code)
}
