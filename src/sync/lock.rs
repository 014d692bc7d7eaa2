use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::SyncError;

/// Cross-process run marker
///
/// Created with create-new semantics so only one pass can hold it; removed
/// when dropped. A process killed while holding it leaves the file behind.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Take the marker, or fail with [`SyncError::LockHeld`] without waiting
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => SyncError::LockHeld(path.display().to_string()),
                _ => SyncError::Io {
                    path: path.display().to_string(),
                    source,
                },
            })?;

        // pid is informational only
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            debug!("Could not write pid to run lock {}: {}", path.display(), e);
        }
        debug!("Acquired run lock {}", path.display());
        Ok(RunLock {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Released run lock {}", self.path.display()),
            Err(e) => warn!("Failed to remove run lock {}: {}", self.path.display(), e),
        }
    }
}
