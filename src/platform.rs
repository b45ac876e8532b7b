//! Platform family and toolchain family detection.

use std::fmt;

use crate::error::PlatformError;

/// Detected operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    /// Linux distributions.
    Linux,
    /// macOS.
    Darwin,
    /// FreeBSD, NetBSD and DragonFly.
    Bsd,
    /// OpenBSD, kept separate from the other BSDs by its userland.
    OpenBsd,
    /// Windows.
    Windows,
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Darwin => write!(f, "darwin"),
            Self::Bsd => write!(f, "bsd"),
            Self::OpenBsd => write!(f, "openbsd"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Detected userland toolchain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainFamily {
    /// GNU userland (Linux).
    Gnu,
    /// BSD userland (macOS and the BSDs).
    Bsd,
    /// OpenBSD userland.
    OpenBsd,
    /// Windows tooling.
    Windows,
}

impl fmt::Display for ToolchainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gnu => write!(f, "gnu"),
            Self::Bsd => write!(f, "bsd"),
            Self::OpenBsd => write!(f, "openbsd"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Detect the platform family of the running system.
///
/// # Errors
///
/// Returns [`PlatformError::UnknownPlatform`] when the OS identifier is not
/// recognized.
pub fn detect_platform_family() -> Result<PlatformFamily, PlatformError> {
    platform_family_for(std::env::consts::OS)
}

/// Detect the toolchain family of the running system.
///
/// # Errors
///
/// Returns [`PlatformError::UnknownPlatform`] when the OS identifier is not
/// recognized.
pub fn detect_toolchain_family() -> Result<ToolchainFamily, PlatformError> {
    toolchain_family_for(std::env::consts::OS)
}

/// Map an OS identifier (e.g. `"linux"`, `"freebsd12"`, `"win32"`) to a
/// platform family.
///
/// Identifiers match by prefix so versioned values like `freebsd12` work.
///
/// # Errors
///
/// Returns [`PlatformError::UnknownPlatform`] for unrecognized identifiers.
pub fn platform_family_for(os: &str) -> Result<PlatformFamily, PlatformError> {
    if os.starts_with("linux") {
        Ok(PlatformFamily::Linux)
    } else if os.starts_with("darwin") || os.starts_with("macos") {
        Ok(PlatformFamily::Darwin)
    } else if os.starts_with("openbsd") {
        Ok(PlatformFamily::OpenBsd)
    } else if os.starts_with("freebsd") || os.starts_with("netbsd") || os.starts_with("dragonfly")
    {
        Ok(PlatformFamily::Bsd)
    } else if os.starts_with("windows") || os.starts_with("win32") {
        Ok(PlatformFamily::Windows)
    } else {
        Err(PlatformError::UnknownPlatform(os.to_string()))
    }
}

/// Map an OS identifier to a toolchain family.
///
/// # Errors
///
/// Returns [`PlatformError::UnknownPlatform`] for unrecognized identifiers.
pub fn toolchain_family_for(os: &str) -> Result<ToolchainFamily, PlatformError> {
    match platform_family_for(os)? {
        PlatformFamily::Linux => Ok(ToolchainFamily::Gnu),
        PlatformFamily::Darwin | PlatformFamily::Bsd => Ok(ToolchainFamily::Bsd),
        PlatformFamily::OpenBsd => Ok(ToolchainFamily::OpenBsd),
        PlatformFamily::Windows => Ok(ToolchainFamily::Windows),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PLATFORM_TESTS: &[(&str, PlatformFamily)] = &[
        ("darwin", PlatformFamily::Darwin),
        ("macos", PlatformFamily::Darwin),
        ("freebsd9", PlatformFamily::Bsd),
        ("freebsd12", PlatformFamily::Bsd),
        ("linux", PlatformFamily::Linux),
        ("linux2", PlatformFamily::Linux),
        ("openbsd6", PlatformFamily::OpenBsd),
        ("openbsd", PlatformFamily::OpenBsd),
        ("win32", PlatformFamily::Windows),
        ("windows", PlatformFamily::Windows),
    ];

    const TOOLCHAIN_TESTS: &[(&str, ToolchainFamily)] = &[
        ("darwin", ToolchainFamily::Bsd),
        ("freebsd9", ToolchainFamily::Bsd),
        ("freebsd12", ToolchainFamily::Bsd),
        ("linux", ToolchainFamily::Gnu),
        ("linux2", ToolchainFamily::Gnu),
        ("openbsd6", ToolchainFamily::OpenBsd),
        ("openbsd", ToolchainFamily::OpenBsd),
        ("win32", ToolchainFamily::Windows),
    ];

    #[test]
    fn platform_families_match_identifiers() {
        for (identifier, expected) in PLATFORM_TESTS {
            assert_eq!(platform_family_for(identifier).unwrap(), *expected);
        }
    }

    #[test]
    fn toolchain_families_match_identifiers() {
        for (identifier, expected) in TOOLCHAIN_TESTS {
            assert_eq!(toolchain_family_for(identifier).unwrap(), *expected);
        }
    }

    #[test]
    fn unknown_platform_fails() {
        assert!(matches!(
            platform_family_for("nothing_os"),
            Err(PlatformError::UnknownPlatform(_)),
        ));
        assert!(matches!(
            toolchain_family_for("nothing_os"),
            Err(PlatformError::UnknownPlatform(_)),
        ));
    }

    #[test]
    fn current_platform_detects() {
        // Whatever the build host is, it should be a known platform.
        assert!(detect_platform_family().is_ok());
        assert!(detect_toolchain_family().is_ok());
    }

    #[test]
    fn family_display() {
        assert_eq!(PlatformFamily::Linux.to_string(), "linux");
        assert_eq!(PlatformFamily::Darwin.to_string(), "darwin");
        assert_eq!(ToolchainFamily::Gnu.to_string(), "gnu");
    }
}
