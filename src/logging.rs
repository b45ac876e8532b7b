//! Tracing subscriber initialisation for toolkit consumers.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the embedding application. These helpers cover the common
//! case of a stderr formatter whose level follows the debug/silent flags
//! the toolkit's constructors historically accepted, with `RUST_LOG`
//! overriding both.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Environment variable enabling debug output when set non-empty.
pub const DEBUG_ENV: &str = "DEBUG";

/// Environment variable silencing informational output when set non-empty.
pub const SILENT_ENV: &str = "SILENT";

/// Install a stderr tracing subscriber honouring the given flags.
///
/// `silent` wins over `debug`; `RUST_LOG` overrides both. Calling this more
/// than once is a no-op after the first successful installation.
pub fn init(debug: bool, silent: bool) {
    let level = if silent {
        LevelFilter::ERROR
    } else if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

/// Install a stderr tracing subscriber from the `DEBUG` / `SILENT`
/// environment variables.
pub fn init_from_env() {
    init(env_flag(DEBUG_ENV), env_flag(SILENT_ENV));
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| !value.is_empty() && value != "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_flag_requires_non_empty_value() {
        // Not set in the test environment.
        assert!(!env_flag("SYSKIT_TEST_UNSET_FLAG"));
    }

    #[test]
    fn init_is_idempotent() {
        init(false, false);
        init(true, false);
        init(false, true);
    }
}
