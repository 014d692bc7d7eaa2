use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::utils::file::remove_if_exists;

/// Lowercase hex MD5 of the node-list bytes
pub fn fingerprint(content: &[u8]) -> String {
    format!("{:x}", Md5::digest(content))
}

/// The persisted fingerprint of the last committed node list
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FingerprintStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored digest; `None` when nothing has been committed yet
    pub fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.trim().to_string()).filter(|s| !s.is_empty())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, digest: &str) -> io::Result<()> {
        fs::write(&self.path, digest)
    }

    /// Put back a digest returned by [`load`](Self::load)
    pub fn restore(&self, previous: Option<&str>) -> io::Result<()> {
        match previous {
            Some(digest) => self.save(digest),
            None => remove_if_exists(&self.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_known_value() {
        assert_eq!(fingerprint(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(fingerprint(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_store_round_trip_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("nodes.md5"));

        assert_eq!(store.load().unwrap(), None);
        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));

        store.restore(None).unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.restore(Some("def")).unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("def"));
    }
}
