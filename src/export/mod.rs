//! Export layer: per-condition CSV files, the consolidated workbook, and the
//! sheet-to-CSV utility.
//!
//! Every file is first written to a temporary file in the destination
//! directory and renamed into place only once it is complete, so a failed run
//! never leaves a truncated output behind.

pub mod delimited;
pub mod naming;
pub mod sheets;
pub mod workbook;

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ExportCause, Result, SieveError};

/// Write `path` through a temporary sibling file and rename it into place.
pub fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::result::Result<(), ExportCause>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".rusty-sieve-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|err| SieveError::export(path, err))?;

    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write(&mut out).map_err(|cause| SieveError::export(path, cause))?;
        out.flush().map_err(|err| SieveError::export(path, err))?;
    }

    tmp.persist(path)
        .map_err(|err| SieveError::export(path, err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");
        let err = write_atomically(&target, |out| {
            out.write_all(b"partial")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom").into())
        })
        .unwrap_err();

        assert!(matches!(err, SieveError::Export { .. }));
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn successful_write_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");
        std::fs::write(&target, "old").unwrap();
        write_atomically(&target, |out| Ok(out.write_all(b"new")?)).unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");
    }
}
