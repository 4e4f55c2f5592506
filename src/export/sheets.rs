//! Dump every sheet of a workbook to `<sheet>.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use super::delimited::write_grid_csv;
use super::naming::ILLEGAL_SHEET_CHARS;
use crate::data::loader::SourceWorkbook;
use crate::error::{Result, SieveError};

/// Outcome of [`sheets_to_csv`].
#[derive(Debug, Default)]
pub struct SheetDumpReport {
    pub written: Vec<PathBuf>,
    /// `(sheet, error message)` for sheets that could not be converted.
    pub failed: Vec<(String, String)>,
}

/// Convert each sheet independently; one failing sheet does not stop the
/// others. Opening the workbook or creating `out_dir` is still fatal.
pub fn sheets_to_csv(input: &Path, out_dir: &Path) -> Result<SheetDumpReport> {
    let mut workbook = SourceWorkbook::open(input)?;
    fs::create_dir_all(out_dir).map_err(|err| SieveError::export(out_dir, err))?;

    let mut report = SheetDumpReport::default();
    for sheet in workbook.sheet_names() {
        let path = out_dir.join(format!("{}.csv", file_stem_for(&sheet)));
        let outcome = workbook
            .grid(&sheet)
            .and_then(|grid| write_grid_csv(&path, &grid));
        match outcome {
            Ok(()) => {
                info!("Sheet '{sheet}' -> {}", path.display());
                report.written.push(path);
            }
            Err(err) => {
                error!("Sheet '{sheet}' failed: {err}");
                report.failed.push((sheet, err.to_string()));
            }
        }
    }
    Ok(report)
}

/// Sheet names may contain characters that are not valid in file names.
pub fn file_stem_for(sheet: &str) -> String {
    sheet
        .chars()
        .map(|c| {
            if ILLEGAL_SHEET_CHARS.contains(&c) || c == '"' || c == '<' || c == '>' || c == '|' {
                '_'
            } else {
                c
            }
        })
        .collect()
}
