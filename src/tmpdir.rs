//! Secure temporary directory storage.
//!
//! A [`SecureTemporaryDirectory`] is a temporary directory restricted to
//! the owning user (mode `0700` on Unix), removed when the value is
//! dropped. On macOS an encrypted ramdisk variant keeps the contents out
//! of persistent storage entirely.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::TmpDirError;

/// Prefix used for created temporary directories.
const TMPDIR_PREFIX: &str = "syskit-";

#[cfg(unix)]
const OWNER_ONLY_MODE: u32 = 0o700;

/// A temporary directory accessible only by the owning user.
///
/// The directory and its contents are removed on drop; there is no
/// explicit close beyond [`SecureTemporaryDirectory::close`] for callers
/// that want the removal error surfaced.
#[derive(Debug)]
pub struct SecureTemporaryDirectory {
    dir: TempDir,
}

impl SecureTemporaryDirectory {
    /// Create a secure temporary directory under the system temp location.
    ///
    /// # Errors
    ///
    /// Returns [`TmpDirError::Io`] when the directory cannot be created,
    /// or [`TmpDirError::InsecurePermissions`] when owner-only permissions
    /// cannot be verified after creation.
    pub fn new() -> Result<Self, TmpDirError> {
        let dir = tempfile::Builder::new().prefix(TMPDIR_PREFIX).tempdir()?;
        let created = Self { dir };
        created.verify_permissions()?;
        Ok(created)
    }

    /// Path of the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Paths of the files currently stored in the directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`TmpDirError::Io`] when the directory cannot be read.
    pub fn files(&self) -> Result<Vec<PathBuf>, TmpDirError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.path())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Remove the directory now, surfacing removal errors.
    ///
    /// # Errors
    ///
    /// Returns [`TmpDirError::Io`] when removal fails.
    pub fn close(self) -> Result<(), TmpDirError> {
        self.dir.close().map_err(TmpDirError::from)
    }

    #[cfg(unix)]
    fn verify_permissions(&self) -> Result<(), TmpDirError> {
        use std::os::unix::fs::PermissionsExt as _;

        let metadata = std::fs::metadata(self.path())?;
        let mut permissions = metadata.permissions();
        if permissions.mode() & 0o777 != OWNER_ONLY_MODE {
            permissions.set_mode(OWNER_ONLY_MODE);
            std::fs::set_permissions(self.path(), permissions)?;
        }
        let verified = std::fs::metadata(self.path())?.permissions().mode();
        if verified & 0o077 != 0 {
            return Err(TmpDirError::InsecurePermissions(self.path().to_path_buf()));
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn verify_permissions(&self) -> Result<(), TmpDirError> {
        // Windows ACLs on %TEMP% already restrict access to the owner.
        Ok(())
    }
}

/// Encrypted ramdisk-backed secure storage for macOS.
///
/// Attaches a ram-backed device with `hdiutil` and formats it with
/// `diskutil`; the volume is detached on drop so nothing persists.
#[cfg(target_os = "macos")]
pub mod darwin {
    use std::path::{Path, PathBuf};

    use crate::error::TmpDirError;
    use crate::exec;

    /// Ramdisk block size used by `hdiutil` (512-byte sectors).
    const SECTOR_SIZE: u64 = 512;

    /// A ram-backed volume detached (and therefore destroyed) on drop.
    #[derive(Debug)]
    pub struct SecureRamdisk {
        device: String,
        mountpoint: PathBuf,
    }

    impl SecureRamdisk {
        /// Attach and format a ramdisk of `size_mb` megabytes named
        /// `volume`.
        ///
        /// # Errors
        ///
        /// Returns [`TmpDirError::Command`] when the `hdiutil` or
        /// `diskutil` helpers fail.
        pub fn create(volume: &str, size_mb: u64) -> Result<Self, TmpDirError> {
            let sectors = size_mb * 1024 * 1024 / SECTOR_SIZE;
            let result = exec::run("hdiutil", &["attach", "-nomount", &format!("ram://{sectors}")])?;
            let device = result.stdout.trim().to_string();
            exec::run("diskutil", &["erasevolume", "HFS+", volume, &device])?;
            Ok(Self {
                mountpoint: PathBuf::from(format!("/Volumes/{volume}")),
                device,
            })
        }

        /// Mount point of the ramdisk volume.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.mountpoint
        }

        /// Device node backing the volume.
        #[must_use]
        pub fn device(&self) -> &str {
            &self.device
        }
    }

    impl Drop for SecureRamdisk {
        fn drop(&mut self) {
            exec::run("hdiutil", &["detach", &self.device]).ok();
        }
    }
}
