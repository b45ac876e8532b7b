//! macOS clipboard backend using `pbcopy` and `pbpaste`.

use super::Clipboard;
use crate::error::ClipboardError;
use crate::exec::{CommandRunner, SystemRunner, command_available};

/// Clipboard backend wrapping the macOS `pbcopy`/`pbpaste` commands.
#[derive(Debug)]
pub struct PbCopy {
    runner: Box<dyn CommandRunner>,
}

impl Default for PbCopy {
    fn default() -> Self {
        Self::new()
    }
}

impl PbCopy {
    /// Backend using the real `pbcopy`/`pbpaste` commands.
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

impl Clipboard for PbCopy {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        self.runner
            .run_with_input("pbcopy", &[], text)
            .map_err(ClipboardError::from)
    }

    fn paste(&self) -> Result<String, ClipboardError> {
        let lines = self.runner.run_lines("pbpaste", &[])?;
        Ok(lines.join("\n"))
    }

    fn available(&self) -> bool {
        command_available("pbcopy") && command_available("pbpaste")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::MockCommandRunner;

    #[test]
    fn copy_pipes_text_to_pbcopy() {
        let runner = std::sync::Arc::new(MockCommandRunner::default());
        let clipboard = PbCopy::with_runner(Box::new(runner.clone()));
        clipboard.copy("copied text").unwrap();
        assert_eq!(runner.calls(), vec!["pbcopy"]);
        assert_eq!(runner.inputs(), vec!["copied text"]);
    }

    #[test]
    fn paste_joins_lines() {
        let clipboard =
            PbCopy::with_runner(Box::new(MockCommandRunner::with_lines(&["one", "two"])));
        assert_eq!(clipboard.paste().unwrap(), "one\ntwo");
    }

    #[test]
    fn copy_failure_maps_to_clipboard_error() {
        let clipboard = PbCopy::with_runner(Box::new(MockCommandRunner::failing("denied")));
        assert!(matches!(
            clipboard.copy("text"),
            Err(ClipboardError::Command(_)),
        ));
    }
}
