//! Consolidated multi-sheet workbook export.

use std::io::Write;
use std::path::Path;

use log::{info, warn};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};

use super::naming::{condition_sheet_name, sanitize_sheet_name};
use super::write_atomically;
use crate::data::filter::{ConditionId, FilteredResults};
use crate::data::model::{CellValue, FilterSpecStore, Record, RowStore};
use crate::error::{ExportCause, Result, SieveError};

// ---------------------------------------------------------------------------
// Sheet planning
// ---------------------------------------------------------------------------

/// What a planned sheet contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetContent {
    /// The master data, fields as rows and records as columns.
    Master,
    /// The filter specifications, one per row.
    FilterSpecs,
    /// One condition's (non-empty) result set, one record per row.
    Condition(ConditionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPlan {
    pub name: String,
    pub content: SheetContent,
}

/// Decide the workbook's sheets and their names.
///
/// Conditions with an empty result set get no sheet. When a condition's
/// name collides with an earlier condition's sheet, the later condition takes
/// that sheet's place and the earlier export is lost. A condition whose name
/// collides with the master or filter sheet is left out.
pub fn plan_sheets(
    data_sheet: &str,
    filter_sheet: &str,
    specs: &FilterSpecStore,
    results: &FilteredResults,
) -> Vec<SheetPlan> {
    let mut plan = vec![
        SheetPlan {
            name: sanitize_sheet_name(data_sheet),
            content: SheetContent::Master,
        },
        SheetPlan {
            name: sanitize_sheet_name(filter_sheet),
            content: SheetContent::FilterSpecs,
        },
    ];

    let n_fixed = plan.len();

    for ((id, records), spec) in results.iter().zip(&specs.specs) {
        if records.is_empty() {
            continue;
        }
        let name = condition_sheet_name(id, spec);
        let content = SheetContent::Condition(id.clone());
        // Excel compares sheet names case-insensitively.
        let key = name.to_lowercase();
        if let Some(fixed) = plan[..n_fixed].iter().find(|sheet| sheet.name.to_lowercase() == key) {
            warn!(
                "Sheet name '{name}' of {id} collides with {:?}; {id} is left out of the workbook",
                fixed.content
            );
            continue;
        }
        match plan[n_fixed..]
            .iter_mut()
            .find(|sheet| sheet.name.to_lowercase() == key)
        {
            Some(existing) => {
                warn!(
                    "Sheet name '{name}' of {id} collides with {:?}; the earlier sheet is replaced",
                    existing.content
                );
                existing.content = content;
            }
            None => plan.push(SheetPlan { name, content }),
        }
    }
    plan
}

// ---------------------------------------------------------------------------
// Workbook writer
// ---------------------------------------------------------------------------

/// Build and atomically save the consolidated workbook. Returns the sheet
/// plan that was written.
pub fn write_workbook(
    path: &Path,
    rows: &RowStore,
    specs: &FilterSpecStore,
    results: &FilteredResults,
    data_sheet: &str,
    filter_sheet: &str,
) -> Result<Vec<SheetPlan>> {
    if rows.is_empty() {
        return Err(SieveError::DataNotLoaded("master data"));
    }
    if specs.is_empty() {
        return Err(SieveError::DataNotLoaded("filter specifications"));
    }

    let plan = plan_sheets(data_sheet, filter_sheet, specs, results);
    let buffer = render_workbook(&plan, rows, specs, results)
        .map_err(|err| SieveError::export(path, err))?;
    write_atomically(path, |out| Ok(out.write_all(&buffer)?))?;

    info!("Wrote workbook {} with {} sheets", path.display(), plan.len());
    Ok(plan)
}

fn render_workbook(
    plan: &[SheetPlan],
    rows: &RowStore,
    specs: &FilterSpecStore,
    results: &FilteredResults,
) -> std::result::Result<Vec<u8>, ExportCause> {
    let mut workbook = Workbook::new();
    let fmt_header = Format::new().set_bold();

    for sheet in plan {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        match &sheet.content {
            SheetContent::Master => write_master(worksheet, rows)?,
            SheetContent::FilterSpecs => write_specs(worksheet, specs, &fmt_header)?,
            SheetContent::Condition(id) => {
                let records = results.get(id).unwrap_or_default();
                write_records(worksheet, records, &fmt_header)?;
            }
        }
        worksheet.autofit();
    }

    Ok(workbook.save_to_buffer()?)
}

/// Source orientation: label row, then one row per field with the original
/// first-column label in front.
fn write_master(worksheet: &mut Worksheet, rows: &RowStore) -> std::result::Result<(), XlsxError> {
    worksheet.write_string(0, 0, &rows.corner_label)?;
    for (j, label) in rows.record_labels.iter().enumerate() {
        if !label.is_empty() {
            worksheet.write_string(0, col_num(j + 1)?, label)?;
        }
    }

    for (i, field) in rows.header_column.iter().enumerate() {
        let row = row_num(i + 1)?;
        worksheet.write_string(row, 0, field)?;
        for (j, record) in rows.records.iter().enumerate() {
            if let Some(value) = record.get(field) {
                write_cell(worksheet, row, col_num(j + 1)?, value)?;
            }
        }
    }
    Ok(())
}

fn write_specs(
    worksheet: &mut Worksheet,
    specs: &FilterSpecStore,
    fmt_header: &Format,
) -> std::result::Result<(), XlsxError> {
    for (j, field) in specs.fields.iter().enumerate() {
        worksheet.write_string_with_format(0, col_num(j)?, field, fmt_header)?;
    }
    for (i, spec) in specs.specs.iter().enumerate() {
        let row = row_num(i + 1)?;
        for (j, field) in specs.fields.iter().enumerate() {
            match spec.get(field) {
                Some(value) if !value.is_empty() => {
                    worksheet.write_string(row, col_num(j)?, value)?;
                }
                _ => {}
            }
        }
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Source orientation, like the master sheet: a header row numbering the
/// records, then one row per field with the field name in front.
fn write_records(
    worksheet: &mut Worksheet,
    records: &[Record],
    fmt_header: &Format,
) -> std::result::Result<(), XlsxError> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    for j in 0..records.len() {
        worksheet.write_number_with_format(0, col_num(j + 1)?, (j + 1) as f64, fmt_header)?;
    }
    for (i, field) in first.fields().iter().enumerate() {
        let row = row_num(i + 1)?;
        worksheet.write_string_with_format(row, 0, field, fmt_header)?;
        for (j, record) in records.iter().enumerate() {
            if let Some(value) = record.get(field) {
                write_cell(worksheet, row, col_num(j + 1)?, value)?;
            }
        }
    }
    worksheet.set_freeze_panes(1, 1)?;
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &CellValue,
) -> std::result::Result<(), XlsxError> {
    match value {
        CellValue::Empty => {}
        CellValue::Text(s) | CellValue::DateTime(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Integer(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) if f.is_finite() => {
            worksheet.write_number(row, col, *f)?;
        }
        CellValue::Float(_) => {
            worksheet.write_string(row, col, value.canonical_text())?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

fn row_num(value: usize) -> std::result::Result<RowNum, XlsxError> {
    RowNum::try_from(value).map_err(|_| XlsxError::RowColumnLimitError)
}

fn col_num(value: usize) -> std::result::Result<ColNum, XlsxError> {
    ColNum::try_from(value).map_err(|_| XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::filter::apply;
    use crate::data::model::{FilterSpec, Schema};

    fn rows() -> RowStore {
        let schema = Arc::new(Schema::new(["年份", "品类"]));
        let record = |year: i64, cat: &str| Record::new(schema.clone(), vec![year.into(), cat.into()]);
        RowStore {
            records: vec![record(2024, "A"), record(2024, "B")],
            schema: schema.clone(),
            header_column: vec!["年份".to_string(), "品类".to_string()],
            corner_label: "字段".to_string(),
            record_labels: vec!["r1".to_string(), "r2".to_string()],
        }
    }

    fn store(specs: Vec<FilterSpec>) -> FilterSpecStore {
        FilterSpecStore {
            fields: vec!["年份".to_string(), "品类".to_string()],
            specs,
        }
    }

    #[test]
    fn empty_conditions_get_no_sheet() {
        let specs = store(vec![
            FilterSpec::new([("年份", "2024"), ("品类", "A")]),
            FilterSpec::new([("年份", "1999"), ("品类", "")]),
            FilterSpec::new([("年份", ""), ("品类", "")]),
        ]);
        let results = apply(&rows(), &specs.specs, "condition_").unwrap();
        let names: Vec<String> = plan_sheets("总表", "总表筛选", &specs, &results)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["总表", "总表筛选", "condition_1_2024_A", "condition_3_all"]);
    }

    #[test]
    fn colliding_names_keep_the_later_condition() {
        // A 30-character prefix leaves room for one digit: condition 10
        // truncates to the same name as condition 1.
        let prefix = "regional_quarterly_sales_cond_";
        let specs = store((0..10).map(|_| FilterSpec::new([("年份", ""), ("品类", "")])).collect());
        let results = apply(&rows(), &specs.specs, prefix).unwrap();
        let plan = plan_sheets("总表", "总表筛选", &specs, &results);

        assert_eq!(plan.len(), 2 + 9);
        assert_eq!(plan[2].name, "regional_quarterly_sales_cond_1");
        assert_eq!(
            plan[2].content,
            SheetContent::Condition(ConditionId::new(prefix, 10))
        );
        let ids: Vec<&SheetContent> = plan.iter().map(|s| &s.content).collect();
        assert!(!ids.contains(&&SheetContent::Condition(ConditionId::new(prefix, 1))));
    }

    #[test]
    fn condition_never_replaces_the_fixed_sheets() {
        let specs = store(vec![
            FilterSpec::new([("年份", "2024"), ("品类", "A")]),
            FilterSpec::new([("年份", "2024"), ("品类", "B")]),
        ]);
        let results = apply(&rows(), &specs.specs, "condition_").unwrap();
        // Data sheet named like condition 1's sheet, compared case-insensitively.
        let plan = plan_sheets("CONDITION_1_2024_A", "总表筛选", &specs, &results);

        let contents: Vec<&SheetContent> = plan.iter().map(|s| &s.content).collect();
        assert_eq!(
            contents,
            [
                &SheetContent::Master,
                &SheetContent::FilterSpecs,
                &SheetContent::Condition(ConditionId::new("condition_", 2)),
            ]
        );
        assert_eq!(plan[0].name, "CONDITION_1_2024_A");
    }

    #[test]
    fn rendered_workbook_is_a_zip_archive() {
        let rows = rows();
        let specs = store(vec![FilterSpec::new([("年份", "2024"), ("品类", "B")])]);
        let results = apply(&rows, &specs.specs, "condition_").unwrap();
        let plan = plan_sheets("总表", "总表筛选", &specs, &results);
        let bytes = render_workbook(&plan, &rows, &specs, &results).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn write_requires_loaded_data() {
        let dir = tempfile::tempdir().unwrap();
        let empty = FilterSpecStore::default();
        let err = write_workbook(
            &dir.path().join("out.xlsx"),
            &rows(),
            &empty,
            &FilteredResults::default(),
            "总表",
            "总表筛选",
        )
        .unwrap_err();
        assert!(matches!(err, SieveError::DataNotLoaded(_)));
    }
}
