//! Error taxonomy for the load -> filter -> export pipeline.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SieveError>;

#[derive(Error, Debug)]
pub enum SieveError {
    #[error("Input workbook not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Sheet '{sheet}' not found in workbook (available sheets: {})", .found.join(", "))]
    MissingSheet { sheet: String, found: Vec<String> },

    #[error("{0} is not loaded; extract the master data and filter sheets first")]
    DataNotLoaded(&'static str),

    #[error("{0} is already loaded for this run")]
    AlreadyLoaded(&'static str),

    #[error("Failed to export {}: {source}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: ExportCause,
    },

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Invalid configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

/// Underlying failure wrapped by [`SieveError::Export`].
#[derive(Error, Debug)]
pub enum ExportCause {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl SieveError {
    /// Wrap any export-side failure together with the path being written.
    pub fn export(path: impl Into<PathBuf>, cause: impl Into<ExportCause>) -> Self {
        SieveError::Export {
            path: path.into(),
            source: cause.into(),
        }
    }

    /// Short machine-readable code, used in the JSON run report.
    pub fn code(&self) -> &'static str {
        match self {
            SieveError::InputNotFound(_) => "INPUT_NOT_FOUND",
            SieveError::MissingSheet { .. } => "MISSING_SHEET",
            SieveError::DataNotLoaded(_) => "DATA_NOT_LOADED",
            SieveError::AlreadyLoaded(_) => "ALREADY_LOADED",
            SieveError::Export { .. } => "EXPORT_FAILED",
            SieveError::Workbook(_) => "WORKBOOK_ERROR",
            SieveError::Config { .. } => "CONFIG_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sheet_lists_found_sheets() {
        let err = SieveError::MissingSheet {
            sheet: "总表".to_string(),
            found: vec!["Sheet1".to_string(), "Sheet2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Sheet '总表' not found in workbook (available sheets: Sheet1, Sheet2)"
        );
        assert_eq!(err.code(), "MISSING_SHEET");
    }

    #[test]
    fn export_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = SieveError::export("outputs/condition_1.csv", io);
        assert!(err.to_string().contains("outputs/condition_1.csv"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
