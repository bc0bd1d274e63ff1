//! mctrl — fine-grained macOS control from the command line.
//!
//! Built for AI agents: every subcommand is a thin caller of the script
//! execution engine in [`script`], which owns interpolation sanitization,
//! interpreter dispatch with timeouts, temp-file lifecycle, and the
//! classified error taxonomy in [`error`].

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod platform;
pub mod script;
