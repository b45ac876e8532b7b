//! Test helpers for modules that consume command output.
//!
//! Ships with the library (not test-gated) so downstream users of the
//! [`CommandRunner`](crate::exec::CommandRunner) seam can exercise their own
//! code without spawning processes, the same way this crate's tests do.

use std::sync::Mutex;

use crate::error::CommandError;
use crate::exec::CommandRunner;

/// A [`CommandRunner`] that replays canned output instead of spawning
/// processes.
///
/// # Examples
///
/// ```
/// use syskit::exec::CommandRunner;
/// use syskit::testing::MockCommandRunner;
///
/// let runner = MockCommandRunner::with_lines(&["line one", "line two"]);
/// let lines = runner.run_lines("ps", &[]).unwrap();
/// assert_eq!(lines.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    lines: Vec<String>,
    failure: Option<String>,
    calls: Mutex<Vec<String>>,
    inputs: Mutex<Vec<String>>,
}

impl MockCommandRunner {
    /// A runner whose every `run_lines` call returns these stdout lines.
    #[must_use]
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|line| (*line).to_string()).collect(),
            ..Self::default()
        }
    }

    /// A runner whose every call fails with the given stderr message.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Command lines seen by this runner, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Stdin payloads received through `run_with_input`, in call order.
    #[must_use]
    pub fn inputs(&self) -> Vec<String> {
        self.inputs
            .lock()
            .map(|inputs| inputs.clone())
            .unwrap_or_default()
    }

    fn record_call(&self, program: &str, args: &[&str]) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(
                std::iter::once(program)
                    .chain(args.iter().copied())
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
    }

    fn check_failure(&self, program: &str) -> Result<(), CommandError> {
        match &self.failure {
            Some(message) => Err(CommandError::ExitStatus {
                command: program.to_string(),
                code: 1,
                stderr: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl CommandRunner for MockCommandRunner {
    fn run_lines(&self, program: &str, args: &[&str]) -> Result<Vec<String>, CommandError> {
        self.record_call(program, args);
        self.check_failure(program)?;
        Ok(self.lines.clone())
    }

    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> Result<(), CommandError> {
        self.record_call(program, args);
        self.check_failure(program)?;
        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(input.to_string());
        }
        Ok(())
    }
}

/// Shared handles delegate, so tests can keep a clone for inspection while
/// the backend owns the boxed runner.
impl CommandRunner for std::sync::Arc<MockCommandRunner> {
    fn run_lines(&self, program: &str, args: &[&str]) -> Result<Vec<String>, CommandError> {
        self.as_ref().run_lines(program, args)
    }

    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> Result<(), CommandError> {
        self.as_ref().run_with_input(program, args, input)
    }
}
