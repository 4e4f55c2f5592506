//! CSV outputs: one file per condition, the filter-conditions index, and raw
//! sheet dumps.

use std::io::Write;
use std::path::Path;

use log::{debug, error};

use super::write_atomically;
use crate::data::filter::ConditionId;
use crate::data::model::{CellValue, FilterSpec, FilterSpecStore, Record};
use crate::error::{ExportCause, Result};

/// UTF-8 byte-order marker; spreadsheet tools need it to detect the encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Name of the condition-identifier column in `filter_conditions.csv`.
pub const CONDITION_GROUP_COLUMN: &str = "condition_group";

// ---------------------------------------------------------------------------
// Per-condition result file
// ---------------------------------------------------------------------------

/// Write one condition's result set.
///
/// Layout: BOM, `# filter: k=v ...` comment line, header row, data rows.
/// With no records the header comes from `fallback_header` so the schema is
/// still visible.
pub fn write_condition_csv(
    path: &Path,
    id: &ConditionId,
    records: &[Record],
    spec: &FilterSpec,
    fallback_header: &[String],
) -> Result<()> {
    write_atomically(path, |out| {
        write_condition_to(out, records, spec, fallback_header)
    })
    .inspect_err(|err| {
        let n_fields = records
            .first()
            .map(|r| r.fields().len())
            .unwrap_or(fallback_header.len());
        error!(
            "{id}: writing {} records x {n_fields} fields failed: {err}",
            records.len()
        );
    })?;
    debug!("{id}: wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Serialise one condition's result set into `out`.
pub fn write_condition_to(
    out: &mut dyn Write,
    records: &[Record],
    spec: &FilterSpec,
    fallback_header: &[String],
) -> std::result::Result<(), ExportCause> {
    out.write_all(UTF8_BOM)?;
    writeln!(out, "# filter: {}", spec.summary())?;

    let mut wtr = csv::Writer::from_writer(out);
    match records.first() {
        Some(first) => {
            wtr.write_record(first.fields())?;
            for record in records {
                wtr.write_record(record.values().iter().map(CellValue::canonical_text))?;
            }
        }
        None => wtr.write_record(fallback_header)?,
    }
    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Filter conditions index
// ---------------------------------------------------------------------------

/// Every specification with its condition id appended, for tracing outputs
/// back to the filter sheet.
pub fn write_filter_conditions_csv(
    path: &Path,
    store: &FilterSpecStore,
    ids: &[ConditionId],
) -> Result<()> {
    write_atomically(path, |out| {
        out.write_all(UTF8_BOM)?;
        let mut wtr = csv::Writer::from_writer(out);

        let mut header: Vec<&str> = store.fields.iter().map(String::as_str).collect();
        header.push(CONDITION_GROUP_COLUMN);
        wtr.write_record(&header)?;

        for (spec, id) in store.specs.iter().zip(ids) {
            let mut row: Vec<String> = store
                .fields
                .iter()
                .map(|field| spec.get(field).unwrap_or_default().to_string())
                .collect();
            row.push(id.to_string());
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Raw sheet dump
// ---------------------------------------------------------------------------

/// Write a sheet grid verbatim (first row is the header).
pub fn write_grid_csv(path: &Path, grid: &[Vec<CellValue>]) -> Result<()> {
    write_atomically(path, |out| {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(out);
        for row in grid {
            wtr.write_record(row.iter().map(CellValue::canonical_text))?;
        }
        wtr.flush()?;
        Ok(())
    })
}
