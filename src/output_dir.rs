//! Output directory preparation.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::error::{Result, SieveError};

/// Ensure `dir` exists. With `clean`, remove everything inside it first.
///
/// Entries that cannot be removed (locked files, permissions) are logged and
/// skipped; only failing to create the directory is an error.
pub fn prepare(dir: &Path, clean: bool) -> Result<()> {
    if clean && dir.is_dir() {
        let removed = clear(dir)?;
        info!("Cleared {removed} entries from {}", dir.display());
    }
    fs::create_dir_all(dir).map_err(|err| SieveError::export(dir, err))?;
    Ok(())
}

/// Remove the contents of `dir`, returning how many entries were removed.
pub fn clear(dir: &Path) -> Result<usize> {
    let entries = fs::read_dir(dir).map_err(|err| SieveError::export(dir, err))?;
    let mut removed = 0;
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                warn!("Unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        let outcome = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match outcome {
            Ok(()) => {
                debug!("Removed {}", path.display());
                removed += 1;
            }
            Err(err) => warn!("Could not remove {}: {err}", path.display()),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a").join("outputs");
        prepare(&dir, true).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn clean_removes_files_and_subdirectories() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("outputs");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("old.csv"), "x").unwrap();
        fs::write(dir.join("nested").join("inner.csv"), "y").unwrap();

        prepare(&dir, true).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn keep_previous_leaves_contents() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("outputs");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("old.csv"), "x").unwrap();

        prepare(&dir, false).unwrap();
        assert!(dir.join("old.csv").exists());
    }
}
