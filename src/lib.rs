//! Split a workbook's master table into one result set per filter condition.
//!
//! The master sheet stores one field per row and one record per column; the
//! filter sheet stores one condition per row. Each condition produces a CSV
//! file, and all non-empty results are gathered into one workbook.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod logging;
pub mod output_dir;
pub mod pipeline;
pub mod session;

pub use config::AppConfig;
pub use error::{Result, SieveError};
pub use pipeline::{run, RunSummary};
pub use session::Session;
