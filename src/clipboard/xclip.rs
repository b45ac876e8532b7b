//! X11 clipboard backend using `xclip`.

use super::Clipboard;
use crate::error::ClipboardError;
use crate::exec::{CommandRunner, SystemRunner, command_available};

/// Environment variable indicating a running X server.
const DISPLAY_ENV: &str = "DISPLAY";

/// X11 selection buffer to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// The clipboard selection (default, matches other platforms).
    #[default]
    Clipboard,
    /// The primary selection (middle-click paste).
    Primary,
}

impl Selection {
    const fn as_arg(self) -> &'static str {
        match self {
            Self::Clipboard => "clipboard",
            Self::Primary => "primary",
        }
    }
}

/// Clipboard backend wrapping the `xclip` command.
#[derive(Debug)]
pub struct Xclip {
    runner: Box<dyn CommandRunner>,
    selection: Selection,
}

impl Default for Xclip {
    fn default() -> Self {
        Self::new()
    }
}

impl Xclip {
    /// Backend using the real `xclip` command on the clipboard selection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_selection(Selection::default())
    }

    /// Backend operating on the given selection buffer.
    #[must_use]
    pub fn with_selection(selection: Selection) -> Self {
        Self {
            runner: Box::new(SystemRunner),
            selection,
        }
    }

    /// Backend using the given runner (mockable in tests).
    #[must_use]
    pub fn with_runner(runner: Box<dyn CommandRunner>, selection: Selection) -> Self {
        Self { runner, selection }
    }
}

impl Clipboard for Xclip {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        self.runner
            .run_with_input("xclip", &["-selection", self.selection.as_arg()], text)
            .map_err(ClipboardError::from)
    }

    fn paste(&self) -> Result<String, ClipboardError> {
        let lines = self
            .runner
            .run_lines("xclip", &["-selection", self.selection.as_arg(), "-o"])?;
        Ok(lines.join("\n"))
    }

    fn available(&self) -> bool {
        std::env::var_os(DISPLAY_ENV).is_some() && command_available("xclip")
    }
}
