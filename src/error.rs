//! Domain-specific error types for the syskit library.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Every module returns typed errors (e.g., [`ConfigError`], [`CommandError`])
//! and the top-level [`SyskitError`] aggregates them for callers that handle
//! the whole toolkit behind one type.
//!
//! # Error hierarchy
//!
//! ```text
//! SyskitError
//! ├── Config(ConfigError)       — configuration tree and file loaders
//! ├── Command(CommandError)     — subprocess execution
//! ├── Clipboard(ClipboardError) — clipboard backends
//! ├── Platform(PlatformError)   — platform family detection
//! └── TmpDir(TmpDirError)       — secure temporary directories
//! ```

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the syskit library.
///
/// Aggregates domain-specific sub-errors so that callers using several
/// toolkit modules can propagate a single error type with `?`.
#[derive(Error, Debug)]
pub enum SyskitError {
    /// Configuration tree or configuration file error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Subprocess execution error.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Clipboard backend error.
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] ClipboardError),

    /// Platform detection error.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Secure temporary directory error.
    #[error("Temporary directory error: {0}")]
    TmpDir(#[from] TmpDirError),
}

/// Errors raised by the configuration tree engine and the file loaders.
///
/// All tree failures are synchronous and abort the single operation in
/// progress; the engine never logs or swallows its own errors and never
/// retries.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A field name or dotted-path segment fails the identifier rules.
    #[error("Invalid attribute name '{0}'")]
    InvalidAttributeName(String),

    /// A registered child section loader has an empty or missing name.
    #[error("Section loader has no name")]
    InvalidSectionLoader,

    /// A required setting is null or absent after the full load sequence.
    #[error("Missing required setting '{0}'")]
    MissingRequiredSetting(String),

    /// A value cannot be stored in or coerced to the declared field type.
    #[error("Unsupported value for field '{field}': {detail}")]
    UnsupportedValueType {
        /// Field the value was being assigned to.
        field: String,
        /// Human-readable reason for the rejection.
        detail: String,
    },

    /// A per-field formatter hook rejected the value.
    #[error("Formatter for field '{field}' failed: {message}")]
    FormatterFailed {
        /// Field whose formatter hook raised.
        field: String,
        /// Message produced by the hook.
        message: String,
    },

    /// A per-field validator hook rejected the value.
    #[error("Validator for field '{field}' failed: {message}")]
    ValidatorFailed {
        /// Field whose validator hook raised.
        field: String,
        /// Message produced by the hook.
        message: String,
    },

    /// A section operation was performed on a node that is not a section.
    #[error("Node is not a configuration section")]
    NotASection,

    /// A list operation was performed on a node that is not a list.
    #[error("Node is not a configuration list")]
    NotAList,

    /// A node handle does not refer to a node of this tree.
    #[error("Unknown configuration node")]
    UnknownNode,

    /// A list index was outside the list bounds.
    #[error("List index {index} out of range for list of length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Current length of the list.
        len: usize,
    },

    /// An I/O error occurred while reading a configuration file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },

    /// The configuration path exists but is not a regular file.
    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    /// The configuration path is missing or not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Errors raised when executing subprocesses.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The requested working directory does not exist.
    #[error("No such directory: {0}")]
    MissingDirectory(PathBuf),

    /// The command could not be spawned at all.
    #[error("Failed to execute {command}: {source}")]
    Spawn {
        /// The command line that failed to start.
        command: String,
        /// Underlying I/O error from the spawn attempt.
        source: std::io::Error,
    },

    /// The command exited with a code outside the expected set.
    #[error("Error running {command}: returns {code}: {stderr}")]
    ExitStatus {
        /// The command line that was run.
        command: String,
        /// The unexpected exit code (`-1` when terminated by a signal).
        code: i32,
        /// Captured standard error output, trimmed.
        stderr: String,
    },

    /// The command did not finish within the configured timeout.
    #[error("Command {command} timed out after {timeout:?}")]
    Timeout {
        /// The command line that was run.
        command: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

/// Errors raised by clipboard backends.
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// No clipboard backend is available in this environment.
    #[error("No clipboard backend available")]
    NoBackend,

    /// The clipboard helper command failed.
    #[error("Clipboard command failed: {0}")]
    Command(#[from] CommandError),
}

/// Errors raised by platform family detection.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The operating system identifier is not recognized.
    #[error("Unsupported platform identifier: {0}")]
    UnknownPlatform(String),
}

/// Errors raised by secure temporary directory handling.
#[derive(Error, Debug)]
pub enum TmpDirError {
    /// The temporary directory could not be created or removed.
    #[error("Temporary directory error: {0}")]
    Io(#[from] std::io::Error),

    /// The directory permissions allow access to other users.
    #[error("Temporary directory has unsafe permissions: {0}")]
    InsecurePermissions(PathBuf),

    /// A ramdisk helper command failed.
    #[error("Ramdisk command failed: {0}")]
    Command(#[from] CommandError),
}
