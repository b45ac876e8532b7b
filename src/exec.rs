//! Subprocess execution helpers.
//!
//! Thin wrapping around [`std::process::Command`] with the common string
//! output use cases handled: checked runs matched against a set of expected
//! return codes, working-directory validation before spawning, environment
//! injection, optional timeouts, line-split output and stdin piping.
//!
//! The [`CommandRunner`] trait is the seam consumers (process listing,
//! clipboard backends) go through so they can be exercised with the mock
//! runner from [`crate::testing`] instead of spawning real processes.

use std::io::{Read, Write as _};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt as _;

use crate::error::CommandError;

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Captured standard error, lossily decoded as UTF-8.
    pub stderr: String,
    /// Whether the command exited with status zero.
    pub success: bool,
    /// The exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Options for [`run_with`]: working directory, environment, expected
/// return codes and timeout.
#[derive(Debug, Clone)]
pub struct RunOptions {
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
    expected_codes: Vec<i32>,
    timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: Vec::new(),
            expected_codes: vec![0],
            timeout: None,
        }
    }
}

impl RunOptions {
    /// Default options: expect exit code zero, no timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the command in `dir`; the directory must exist at run time.
    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment variable for the child process.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Replace the set of exit codes treated as success.
    #[must_use]
    pub fn expected_codes(mut self, codes: &[i32]) -> Self {
        self.expected_codes = codes.to_vec();
        self
    }

    /// Abort the command after `timeout`, killing the child.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Run a command, failing unless it exits with code zero.
///
/// # Errors
///
/// Returns a [`CommandError`] when the command cannot be spawned or exits
/// with an unexpected code.
pub fn run(program: &str, args: &[&str]) -> Result<ExecResult, CommandError> {
    run_with(program, args, &RunOptions::default())
}

/// Run a command with explicit [`RunOptions`].
///
/// # Errors
///
/// Returns [`CommandError::MissingDirectory`] when the requested working
/// directory does not exist, [`CommandError::Timeout`] when the configured
/// timeout elapses, and [`CommandError::ExitStatus`] for unexpected exit
/// codes.
pub fn run_with(
    program: &str,
    args: &[&str],
    options: &RunOptions,
) -> Result<ExecResult, CommandError> {
    let label = command_label(program, args);
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(cwd) = &options.cwd {
        if !cwd.is_dir() {
            return Err(CommandError::MissingDirectory(cwd.clone()));
        }
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    let result = match options.timeout {
        None => {
            let output = cmd.output().map_err(|source| CommandError::Spawn {
                command: label.clone(),
                source,
            })?;
            ExecResult::from(output)
        }
        Some(timeout) => run_with_timeout(cmd, &label, timeout)?,
    };

    let code = result.code.unwrap_or(-1);
    if !options.expected_codes.contains(&code) {
        return Err(CommandError::ExitStatus {
            command: label,
            code,
            stderr: result.stderr.trim().to_string(),
        });
    }
    Ok(result)
}

/// Run a command, allowing failure (returns the result without an exit
/// code check).
///
/// # Errors
///
/// Returns [`CommandError::Spawn`] only when the command cannot be started.
pub fn run_unchecked(program: &str, args: &[&str]) -> Result<ExecResult, CommandError> {
    let label = command_label(program, args);
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| CommandError::Spawn {
            command: label,
            source,
        })?;
    Ok(ExecResult::from(output))
}

/// Run a command and split stdout and stderr into lines.
///
/// # Errors
///
/// Same failure modes as [`run_with`].
pub fn run_lines(
    program: &str,
    args: &[&str],
    options: &RunOptions,
) -> Result<(Vec<String>, Vec<String>), CommandError> {
    let result = run_with(program, args, options)?;
    Ok((
        result.stdout.lines().map(str::to_string).collect(),
        result.stderr.lines().map(str::to_string).collect(),
    ))
}

/// Run a command feeding `input` to its stdin, expecting exit code zero.
///
/// # Errors
///
/// Returns a [`CommandError`] when the command cannot be spawned, its stdin
/// cannot be written, or it exits non-zero.
pub fn run_with_input(
    program: &str,
    args: &[&str],
    input: &str,
) -> Result<ExecResult, CommandError> {
    let label = command_label(program, args);
    let spawn_error = |source| CommandError::Spawn {
        command: command_label(program, args),
        source,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).map_err(spawn_error)?;
    }
    let output = child.wait_with_output().map_err(spawn_error)?;
    let result = ExecResult::from(output);
    if !result.success {
        return Err(CommandError::ExitStatus {
            command: label,
            code: result.code.unwrap_or(-1),
            stderr: result.stderr.trim().to_string(),
        });
    }
    Ok(result)
}

/// Check if a program is available on `PATH`.
#[must_use]
pub fn command_available(program: &str) -> bool {
    which::which(program).is_ok()
}

fn run_with_timeout(
    mut cmd: Command,
    label: &str,
    timeout: Duration,
) -> Result<ExecResult, CommandError> {
    let spawn_error = |source| CommandError::Spawn {
        command: label.to_string(),
        source,
    };
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;
    match child.wait_timeout(timeout).map_err(spawn_error)? {
        Some(status) => {
            let stdout = read_pipe(child.stdout.take());
            let stderr = read_pipe(child.stderr.take());
            Ok(ExecResult {
                stdout,
                stderr,
                success: status.success(),
                code: status.code(),
            })
        }
        None => {
            child.kill().ok();
            child.wait().ok();
            Err(CommandError::Timeout {
                command: label.to_string(),
                timeout,
            })
        }
    }
}

fn read_pipe(pipe: Option<impl Read>) -> String {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buffer).ok();
    }
    String::from_utf8_lossy(&buffer).to_string()
}

fn command_label(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Seam for modules that consume command output, so they can be exercised
/// with a mock runner instead of spawning real processes.
pub trait CommandRunner: std::fmt::Debug {
    /// Run a command and return its stdout as lines, expecting exit code
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the command cannot be run or exits
    /// non-zero.
    fn run_lines(&self, program: &str, args: &[&str]) -> Result<Vec<String>, CommandError>;

    /// Run a command feeding `input` to its stdin, expecting exit code
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when the command cannot be run or exits
    /// non-zero.
    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> Result<(), CommandError>;
}

/// The default [`CommandRunner`]: spawns real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run_lines(&self, program: &str, args: &[&str]) -> Result<Vec<String>, CommandError> {
        let (stdout, _) = run_lines(program, args, &RunOptions::default())?;
        Ok(stdout)
    }

    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        input: &str,
    ) -> Result<(), CommandError> {
        run_with_input(program, args, input).map(|_| ())
    }
}
