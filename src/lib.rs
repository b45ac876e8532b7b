//! Cross-platform system utility toolkit.
//!
//! Classes and helpers for common scripting chores: a typed configuration
//! tree with file loaders, subprocess execution, clipboard access, secure
//! temporary directories, process listing and platform detection.
//!
//! The public API is organised into thin OS-wrapping modules around one
//! deeper core:
//!
//! - **[`config`]** — the configuration tree engine plus JSON/YAML/TOML/INI
//!   and directory loaders
//! - **[`exec`]** — subprocess execution with expected return codes,
//!   timeouts and a mockable runner seam
//! - **[`clipboard`]** — pluggable clipboard backends wrapping OS commands
//! - **[`tmpdir`]** — owner-only temporary directory storage
//! - **[`process`]** — process listing parsed from `ps` output
//! - **[`platform`]** — platform and toolchain family detection
//! - **[`logging`]** — tracing subscriber setup for embedding applications
//! - **[`testing`]** — mock command runner for exercising `exec` consumers
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod clipboard;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod platform;
pub mod process;
pub mod testing;
pub mod tmpdir;

pub use config::{ConfigTree, ListSchema, SectionSchema, Value};
pub use error::SyskitError;
