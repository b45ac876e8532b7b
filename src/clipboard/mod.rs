//! Clipboard access wrapping the platform's clipboard helper commands.
//!
//! Backends are thin wrappers around `pbcopy`/`pbpaste` (macOS),
//! `wl-copy`/`wl-paste` (Wayland) and `xclip` (X11). [`detect`] picks the
//! first backend whose helper commands and display environment are
//! available.

mod darwin;
mod wayland;
mod xclip;

pub use darwin::PbCopy;
pub use wayland::WlClipboard;
pub use xclip::{Selection, Xclip};

use crate::error::ClipboardError;

/// Common interface for clipboard backends.
pub trait Clipboard: std::fmt::Debug {
    /// Copy text to the clipboard.
    ///
    /// # Errors
    ///
    /// Returns a [`ClipboardError`] when the helper command fails.
    fn copy(&self, text: &str) -> Result<(), ClipboardError>;

    /// Paste the current clipboard contents.
    ///
    /// # Errors
    ///
    /// Returns a [`ClipboardError`] when the helper command fails.
    fn paste(&self) -> Result<String, ClipboardError>;

    /// Clear the clipboard.
    ///
    /// # Errors
    ///
    /// Returns a [`ClipboardError`] when the helper command fails.
    fn clear(&self) -> Result<(), ClipboardError> {
        self.copy("")
    }

    /// Whether this backend can be used in the current environment.
    fn available(&self) -> bool;
}

/// Detect the first available clipboard backend.
///
/// Tried in order: macOS `pbcopy`, Wayland `wl-clipboard`, X11 `xclip`.
///
/// # Errors
///
/// Returns [`ClipboardError::NoBackend`] when no helper command is
/// available.
pub fn detect() -> Result<Box<dyn Clipboard>, ClipboardError> {
    let backends: Vec<Box<dyn Clipboard>> = vec![
        Box::new(PbCopy::new()),
        Box::new(WlClipboard::new()),
        Box::new(Xclip::new()),
    ];
    for backend in backends {
        if backend.available() {
            tracing::debug!(backend = ?backend, "selected clipboard backend");
            return Ok(backend);
        }
    }
    Err(ClipboardError::NoBackend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_never_panics() {
        // Environment-dependent: either a backend or the typed error.
        match detect() {
            Ok(backend) => assert!(backend.available()),
            Err(error) => assert!(matches!(error, ClipboardError::NoBackend)),
        }
    }
}
