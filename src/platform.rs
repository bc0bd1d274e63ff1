//! Host platform gates.
//!
//! Commands that drive macOS frameworks call [`ensure_macos`] before
//! building any script, so "wrong OS" is reported as its own error kind
//! rather than surfacing as a missing `osascript`. Accessibility-dependent
//! commands can additionally preflight the permission instead of waiting
//! for the interpreter's stderr.

use crate::error::{MctrlError, Result};

/// Fail with the platform-unsupported error on anything but macOS.
pub fn ensure_macos() -> Result<()> {
    if cfg!(target_os = "macos") {
        Ok(())
    } else {
        Err(MctrlError::UnsupportedPlatform)
    }
}

/// Check the accessibility trust state up front where a command is certain
/// to need it. The classifier still catches denials that only show up at
/// execution time.
#[cfg(target_os = "macos")]
pub fn ensure_accessibility() -> Result<()> {
    if macos_accessibility_client::accessibility::application_is_trusted() {
        Ok(())
    } else {
        Err(MctrlError::AccessibilityDenied)
    }
}

#[cfg(not(target_os = "macos"))]
pub fn ensure_accessibility() -> Result<()> {
    Err(MctrlError::UnsupportedPlatform)
}
