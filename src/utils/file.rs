use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Checks if a file exists at the given path
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Reads a whole file into a string
pub fn file_get(path: impl AsRef<Path>) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Removes a file, treating "not found" as success
pub fn remove_if_exists(path: impl AsRef<Path>) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Sibling path used as the rename source when replacing `dest`
fn swap_path(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.swap", file_name))
}

/// Replaces `dest` with the content of `src` without exposing a partial file
///
/// The content is first copied next to `dest` and then renamed over it, so
/// the rename never crosses a filesystem boundary.
pub fn replace_file_atomically(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> io::Result<()> {
    let dest = dest.as_ref();
    let swap = swap_path(dest);
    fs::copy(src.as_ref(), &swap)?;
    if let Err(e) = fs::rename(&swap, dest) {
        let _ = fs::remove_file(&swap);
        return Err(e);
    }
    Ok(())
}
