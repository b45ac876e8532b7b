//! System process listing parsed from `ps` output.

use std::fmt;

use chrono::NaiveDateTime;

use crate::error::CommandError;
use crate::exec::{CommandRunner, SystemRunner};

/// Columns requested from `ps`; `command` last so it can contain spaces.
const PS_COLUMNS: &str = "pid,ppid,ruid,user,lstart,command";

/// Number of whitespace tokens in a `lstart` timestamp
/// (`Wed Aug 6 10:11:12 2025`).
const LSTART_TOKENS: usize = 5;

/// Timestamp format produced by the `lstart` column.
const LSTART_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// One process from the system process list.
///
/// Fields the row did not provide, or that failed to parse, are `None`;
/// a malformed row never fails the whole listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    /// Process ID.
    pub pid: Option<u32>,
    /// Parent process ID.
    pub ppid: Option<u32>,
    /// Real user ID.
    pub user_id: Option<u32>,
    /// User name owning the process.
    pub username: Option<String>,
    /// Process start time, parsed from the `lstart` column.
    pub started: Option<NaiveDateTime>,
    /// The command line.
    pub command: Option<String>,
}

impl Process {
    /// Parse one `ps` output row.
    #[must_use]
    pub fn from_row(row: &str) -> Self {
        let tokens: Vec<&str> = row.split_whitespace().collect();
        let lstart = tokens
            .get(4..4 + LSTART_TOKENS)
            .map(|parts| parts.join(" "));
        let command = tokens.get(4 + LSTART_TOKENS..).and_then(|parts| {
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        });
        Self {
            pid: tokens.first().and_then(|t| t.parse().ok()),
            ppid: tokens.get(1).and_then(|t| t.parse().ok()),
            user_id: tokens.get(2).and_then(|t| t.parse().ok()),
            username: tokens.get(3).map(|t| (*t).to_string()),
            started: lstart.as_deref().and_then(parse_datetime),
            command,
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.pid.map_or_else(|| "-".to_string(), |pid| pid.to_string()),
            self.username.as_deref().unwrap_or("-"),
            self.command.as_deref().unwrap_or(""),
        )
    }
}

/// Parse a `lstart`-style timestamp, returning `None` for unparseable
/// input instead of an error.
#[must_use]
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(trimmed, LSTART_FORMAT).ok()
}

/// The system process list, loaded through a [`CommandRunner`].
#[derive(Debug)]
pub struct Processes {
    runner: Box<dyn CommandRunner>,
}

impl Default for Processes {
    fn default() -> Self {
        Self::new()
    }
}

impl Processes {
    /// A process list backed by real `ps` invocations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runner: Box::new(SystemRunner),
        }
    }

    /// A process list backed by the given runner (mockable in tests).
    #[must_use]
    pub fn with_runner(runner: Box<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Load the current process list.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] when `ps` cannot be run or exits
    /// non-zero.
    pub fn list(&self) -> Result<Vec<Process>, CommandError> {
        let lines = self.runner.run_lines("ps", &["-axww", "-o", PS_COLUMNS])?;
        Ok(lines
            .iter()
            .skip(1) // header row
            .filter(|line| !line.trim().is_empty())
            .map(|line| Process::from_row(line))
            .collect())
    }

    /// Processes owned by the given user name.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::list`].
    pub fn for_user(&self, username: &str) -> Result<Vec<Process>, CommandError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|process| process.username.as_deref() == Some(username))
            .collect())
    }

    /// Processes whose command line contains the given substring.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::list`].
    pub fn matching(&self, pattern: &str) -> Result<Vec<Process>, CommandError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|process| {
                process
                    .command
                    .as_deref()
                    .is_some_and(|command| command.contains(pattern))
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::MockCommandRunner;

    const MOCK_OUTPUT: &[&str] = &[
        "  PID  PPID  RUID USER             STARTED COMMAND",
        "    1     0     0 root  Wed Aug  6 10:11:12 2025 /sbin/init",
        " 4242     1  1000 tester  Wed Aug  6 11:00:00 2025 /usr/bin/daemon --flag value",
    ];

    fn mock_processes() -> Processes {
        Processes::with_runner(Box::new(MockCommandRunner::with_lines(MOCK_OUTPUT)))
    }

    #[test]
    fn list_parses_rows_and_skips_header() {
        let processes = mock_processes().list().unwrap();
        assert_eq!(processes.len(), 2);

        let first = processes.first().unwrap();
        assert_eq!(first.pid, Some(1));
        assert_eq!(first.user_id, Some(0));
        assert_eq!(first.username.as_deref(), Some("root"));
        assert!(first.started.is_some());
        assert_eq!(first.command.as_deref(), Some("/sbin/init"));
    }

    #[test]
    fn command_keeps_embedded_spaces() {
        let processes = mock_processes().list().unwrap();
        let daemon = processes.get(1).unwrap();
        assert_eq!(
            daemon.command.as_deref(),
            Some("/usr/bin/daemon --flag value"),
        );
    }

    #[test]
    fn for_user_filters_by_username() {
        let matched = mock_processes().for_user("tester").unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched.first().unwrap().pid, Some(4242));
    }

    #[test]
    fn matching_filters_by_command_substring() {
        let matched = mock_processes().matching("daemon").unwrap();
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn list_failure_propagates() {
        let processes = Processes::with_runner(Box::new(MockCommandRunner::failing("no ps")));
        assert!(matches!(
            processes.list(),
            Err(CommandError::ExitStatus { .. }),
        ));
    }

    #[test]
    fn malformed_row_yields_empty_fields() {
        let process = Process::from_row("not numbers");
        assert_eq!(process.pid, None);
        assert_eq!(process.user_id, None);
        assert_eq!(process.started, None);
        assert!(process.to_string().starts_with('-'));
    }

    #[test]
    fn parse_datetime_invalid_formats_return_none() {
        for value in ["", "   ", "not a date", "27Nov21"] {
            assert_eq!(parse_datetime(value), None, "{value}");
        }
    }

    #[test]
    fn parse_datetime_accepts_lstart_format() {
        let parsed = parse_datetime("Wed Aug  6 10:11:12 2025").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-08-06 10:11:12");
    }
}
