//! Run coordinator: load -> filter -> export.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;
use serde::Serialize;

use crate::config::AppConfig;
use crate::data::filter::ConditionId;
use crate::data::loader::{load_filter_specs, load_row_store, SourceWorkbook};
use crate::error::Result;
use crate::export::delimited::{write_condition_csv, write_filter_conditions_csv, write_grid_csv};
use crate::export::naming::condition_file_name;
use crate::export::sheets::file_stem_for;
use crate::export::workbook::{write_workbook, SheetContent};
use crate::output_dir;
use crate::session::Session;

/// Name of the companion file listing every specification with its id.
pub const FILTER_CONDITIONS_FILE: &str = "filter_conditions.csv";

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ConditionSummary {
    pub id: String,
    pub records: usize,
    pub file: PathBuf,
    /// Sheet holding this condition in the workbook, if any.
    pub sheet: Option<String>,
}

/// What a run wrote, for the console report and `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub records: usize,
    pub master_csv: PathBuf,
    pub filter_conditions_csv: PathBuf,
    pub conditions: Vec<ConditionSummary>,
    pub workbook: PathBuf,
    pub sheets: Vec<String>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Process `input` with `config` and write every artifact to
/// `config.output.directory`.
pub fn run(config: &AppConfig, input: &Path) -> Result<RunSummary> {
    let sheets = &config.sheets;
    let out = &config.output;
    info!("=== Processing {} ===", input.display());

    let mut workbook = SourceWorkbook::open(input)?;
    output_dir::prepare(&out.directory, out.clean_before_run)?;
    let mut session = Session::new(&out.directory);

    info!("1. Extracting master data from '{}'", sheets.data_sheet);
    let master = load_row_store(&mut workbook, &sheets.data_sheet)?;
    let master_csv = session
        .output_dir()
        .join(format!("{}.csv", file_stem_for(&sheets.data_sheet)));
    write_grid_csv(&master_csv, &master.grid)?;
    info!("Saved master sheet to {}", master_csv.display());
    session.set_rows(master.rows)?;

    info!("2. Extracting filter conditions from '{}'", sheets.filter_sheet);
    session.set_specs(load_filter_specs(&mut workbook, &sheets.filter_sheet)?)?;
    let specs = session.specs()?;
    let ids: Vec<ConditionId> = (1..=specs.len())
        .map(|n| ConditionId::new(&out.condition_prefix, n))
        .collect();
    let filter_conditions_csv = session.output_dir().join(FILTER_CONDITIONS_FILE);
    write_filter_conditions_csv(&filter_conditions_csv, specs, &ids)?;
    info!("Saved filter conditions to {}", filter_conditions_csv.display());

    info!("3. Applying {} filter conditions", ids.len());
    session.apply_filters(&out.condition_prefix)?;

    let rows = session.rows()?;
    let specs = session.specs()?;
    let results = session.results()?;
    let fallback_header = rows.header_fields_without(&out.ordinal_field);
    let mut conditions = Vec::with_capacity(results.len());
    for ((id, records), spec) in results.iter().zip(&specs.specs) {
        let file = session.output_dir().join(condition_file_name(id));
        write_condition_csv(&file, id, records, spec, &fallback_header)?;
        info!("{id}: {} records saved to {}", records.len(), file.display());
        conditions.push(ConditionSummary {
            id: id.to_string(),
            records: records.len(),
            file,
            sheet: None,
        });
    }

    info!("4. Exporting consolidated workbook");
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    let workbook_path = session.output_dir().join(format!(
        "{stem}_filtered_{}.xlsx",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    let plan = write_workbook(
        &workbook_path,
        rows,
        specs,
        results,
        &sheets.data_sheet,
        &sheets.filter_sheet,
    )?;
    for sheet in &plan {
        if let SheetContent::Condition(id) = &sheet.content {
            if let Some(summary) = conditions.get_mut(id.number() - 1) {
                summary.sheet = Some(sheet.name.clone());
            }
        }
    }

    info!("=== Done, results saved in {} ===", session.output_dir().display());
    Ok(RunSummary {
        input: input.to_path_buf(),
        output_dir: session.output_dir().to_path_buf(),
        records: rows.len(),
        master_csv,
        filter_conditions_csv,
        conditions,
        workbook: workbook_path,
        sheets: plan.into_iter().map(|sheet| sheet.name).collect(),
    })
}
