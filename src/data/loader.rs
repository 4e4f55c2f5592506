use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use log::{debug, info};

use super::model::{CellValue, FilterSpec, FilterSpecStore, Record, RowStore, Schema};
use crate::error::{Result, SieveError};

// ---------------------------------------------------------------------------
// Source workbook
// ---------------------------------------------------------------------------

/// An opened input workbook (`.xlsx`, `.xlsm`, `.xls`, `.ods`).
pub struct SourceWorkbook {
    inner: Sheets<BufReader<File>>,
}

impl SourceWorkbook {
    /// Open `path`, failing with [`SieveError::InputNotFound`] before any
    /// parsing when the file does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SieveError::InputNotFound(path.to_path_buf()));
        }
        let inner = open_workbook_auto(path)?;
        Ok(SourceWorkbook { inner })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    /// Read a whole sheet as a rectangular grid of cells.
    pub fn grid(&mut self, sheet: &str) -> Result<Vec<Vec<CellValue>>> {
        let found = self.sheet_names();
        if !found.iter().any(|name| name == sheet) {
            return Err(SieveError::MissingSheet {
                sheet: sheet.to_string(),
                found,
            });
        }
        let range = self.inner.worksheet_range(sheet)?;
        // The range starts at the first used cell; pad back to A1.
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or_default();
        let mut grid: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
        grid.extend(range.rows().map(|row| {
            std::iter::repeat(CellValue::Empty)
                .take(col_offset)
                .chain(row.iter().map(cell_from_data))
                .collect()
        }));
        Ok(grid)
    }
}

/// Convert a calamine cell into a [`CellValue`].
pub fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => CellValue::DateTime(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::DateTime(s.clone()),
        Data::Error(err) => CellValue::Text(format!("#{err:?}")),
    }
}

// ---------------------------------------------------------------------------
// Master data sheet (transposed layout)
// ---------------------------------------------------------------------------

/// The master sheet as read, plus the records extracted from it.
#[derive(Debug, Clone)]
pub struct MasterSheet {
    /// Raw cells, kept for the verbatim CSV export.
    pub grid: Vec<Vec<CellValue>>,
    pub rows: RowStore,
}

/// Load the master sheet into a [`RowStore`].
///
/// Sheet layout:
/// ```text
///   corner | label_1 | label_2 | ...      <- record labels
///   field  | value   | value   | ...      <- one row per field
///   field  | value   | value   | ...
/// ```
/// Column `j` (j ≥ 1) becomes record `j`. Field rows with a blank name are
/// skipped.
pub fn load_row_store(workbook: &mut SourceWorkbook, sheet: &str) -> Result<MasterSheet> {
    let grid = workbook.grid(sheet)?;
    let store = rows_from_grid(&grid);
    info!(
        "Loaded {} records with {} fields from sheet '{sheet}'",
        store.len(),
        store.schema.len()
    );
    if let Some(first) = store.records.first() {
        debug!("First record: {:?}", first.iter().collect::<Vec<_>>());
    }
    Ok(MasterSheet { grid, rows: store })
}

/// Transpose a master-sheet grid into records.
pub fn rows_from_grid(grid: &[Vec<CellValue>]) -> RowStore {
    let n_records = grid
        .iter()
        .filter_map(|row| row.iter().rposition(|cell| !cell.is_blank()))
        .max()
        .unwrap_or(0);

    let (corner_label, record_labels) = match grid.first() {
        Some(first) => (
            first.first().map(CellValue::canonical_text).unwrap_or_default(),
            (1..=n_records)
                .map(|j| first.get(j).map(CellValue::canonical_text).unwrap_or_default())
                .collect(),
        ),
        None => (String::new(), Vec::new()),
    };

    let mut schema = Schema::default();
    let mut columns: Vec<Vec<CellValue>> = vec![Vec::new(); n_records];
    let mut header_column = Vec::new();

    for (row_idx, row) in grid.iter().enumerate().skip(1) {
        let name = row.first().map(CellValue::canonical_text).unwrap_or_default();
        if name.is_empty() {
            debug!("Skipping master row {} with blank field name", row_idx + 1);
            continue;
        }
        header_column.push(name.clone());
        let pos = schema.push(name);
        for (j, column) in columns.iter_mut().enumerate() {
            let value = row.get(j + 1).cloned().unwrap_or(CellValue::Empty);
            if pos == column.len() {
                column.push(value);
            } else {
                column[pos] = value;
            }
        }
    }

    let schema = Arc::new(schema);
    let records = if schema.is_empty() {
        Vec::new()
    } else {
        columns
            .into_iter()
            .map(|values| Record::new(schema.clone(), values))
            .collect()
    };

    RowStore {
        schema,
        records,
        header_column,
        corner_label,
        record_labels,
    }
}

// ---------------------------------------------------------------------------
// Filter specification sheet (tabular layout)
// ---------------------------------------------------------------------------

/// Load the filter sheet: header row of field names, one spec per row,
/// every value coerced to text and blank cells normalised to `""`.
pub fn load_filter_specs(workbook: &mut SourceWorkbook, sheet: &str) -> Result<FilterSpecStore> {
    let grid = workbook.grid(sheet)?;
    let store = specs_from_grid(&grid);
    info!("Loaded {} filter specifications from sheet '{sheet}'", store.len());
    Ok(store)
}

pub fn specs_from_grid(grid: &[Vec<CellValue>]) -> FilterSpecStore {
    let Some(header) = grid.first() else {
        return FilterSpecStore::default();
    };

    let columns: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| {
            let name = cell.canonical_text();
            if name.is_empty() {
                debug!("Ignoring filter column {} with blank header", idx + 1);
                None
            } else {
                Some((idx, name))
            }
        })
        .collect();

    let mut specs = Vec::new();
    for (row_idx, row) in grid.iter().enumerate().skip(1) {
        if row.iter().all(CellValue::is_blank) {
            debug!("Skipping blank filter row {}", row_idx + 1);
            continue;
        }
        specs.push(FilterSpec::new(columns.iter().map(|(idx, name)| {
            let value = row.get(*idx).map(CellValue::canonical_text).unwrap_or_default();
            (name.clone(), value)
        })));
    }

    let mut fields: Vec<String> = Vec::with_capacity(columns.len());
    for (_, name) in columns {
        if !fields.contains(&name) {
            fields.push(name);
        }
    }

    FilterSpecStore { fields, specs }
}
