//! Wayland clipboard backend using `wl-copy` and `wl-paste`.

use super::Clipboard;
use crate::error::ClipboardError;
use crate::exec::{CommandRunner, SystemRunner, command_available};

/// Environment variable indicating a running Wayland compositor.
const WAYLAND_DISPLAY_ENV: &str = "WAYLAND_DISPLAY";

/// Clipboard backend wrapping the `wl-clipboard` helper commands.
#[derive(Debug)]
pub struct WlClipboard {
    runner: Box<dyn CommandRunner>,
}

impl Default for WlClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl WlClipboard {
    /// Backend using the real `wl-copy`/`wl-paste` commands.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runner: Box::new(SystemRunner),
        }
    }

    /// Backend using the given runner (mockable in tests).
    #[must_use]
    pub fn with_runner(runner: Box<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Clipboard for WlClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        self.runner
            .run_with_input("wl-copy", &[], text)
            .map_err(ClipboardError::from)
    }

    fn paste(&self) -> Result<String, ClipboardError> {
        let lines = self.runner.run_lines("wl-paste", &["--no-newline"])?;
        Ok(lines.join("\n"))
    }

    fn clear(&self) -> Result<(), ClipboardError> {
        self.runner
            .run_with_input("wl-copy", &["--clear"], "")
            .map_err(ClipboardError::from)
    }

    fn available(&self) -> bool {
        std::env::var_os(WAYLAND_DISPLAY_ENV).is_some()
            && command_available("wl-copy")
            && command_available("wl-paste")
    }
}
