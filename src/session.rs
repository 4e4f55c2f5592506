use std::path::{Path, PathBuf};

use crate::data::filter::{self, FilteredResults};
use crate::data::model::{FilterSpecStore, RowStore};
use crate::error::{Result, SieveError};

// ---------------------------------------------------------------------------
// Run session
// ---------------------------------------------------------------------------

/// State of one run: the output directory plus whatever has been loaded or
/// computed so far. Each slot is filled at most once.
#[derive(Debug)]
pub struct Session {
    output_dir: PathBuf,

    /// Master data (None until the data sheet is loaded).
    rows: Option<RowStore>,

    /// Filter specifications (None until the filter sheet is loaded).
    specs: Option<FilterSpecStore>,

    /// Per-condition result sets (None until the filter engine has run).
    results: Option<FilteredResults>,
}

impl Session {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            rows: None,
            specs: None,
            results: None,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn set_rows(&mut self, rows: RowStore) -> Result<()> {
        if self.rows.is_some() {
            return Err(SieveError::AlreadyLoaded("master data"));
        }
        self.rows = Some(rows);
        Ok(())
    }

    pub fn set_specs(&mut self, specs: FilterSpecStore) -> Result<()> {
        if self.specs.is_some() {
            return Err(SieveError::AlreadyLoaded("filter specifications"));
        }
        self.specs = Some(specs);
        Ok(())
    }

    pub fn rows(&self) -> Result<&RowStore> {
        self.rows.as_ref().ok_or(SieveError::DataNotLoaded("master data"))
    }

    pub fn specs(&self) -> Result<&FilterSpecStore> {
        self.specs
            .as_ref()
            .ok_or(SieveError::DataNotLoaded("filter specifications"))
    }

    pub fn results(&self) -> Result<&FilteredResults> {
        self.results
            .as_ref()
            .ok_or(SieveError::DataNotLoaded("filter results"))
    }

    /// Run the filter engine over the loaded data and keep the results.
    pub fn apply_filters(&mut self, prefix: &str) -> Result<&FilteredResults> {
        if self.results.is_some() {
            return Err(SieveError::AlreadyLoaded("filter results"));
        }
        let results = filter::apply(self.rows()?, &self.specs()?.specs, prefix)?;
        Ok(self.results.insert(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{rows_from_grid, specs_from_grid};
    use crate::data::model::CellValue;

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    fn rows() -> RowStore {
        rows_from_grid(&[
            vec![text("字段"), text("r1"), text("r2")],
            vec![text("年份"), CellValue::Integer(2024), CellValue::Integer(2023)],
            vec![text("品类"), text("A"), text("A")],
        ])
    }

    fn specs() -> FilterSpecStore {
        specs_from_grid(&[
            vec![text("年份"), text("品类")],
            vec![text("2024"), text("A")],
        ])
    }

    #[test]
    fn getters_fail_before_loading() {
        let session = Session::new("outputs");
        assert!(matches!(session.rows(), Err(SieveError::DataNotLoaded(_))));
        assert!(matches!(session.specs(), Err(SieveError::DataNotLoaded(_))));
        assert!(matches!(session.results(), Err(SieveError::DataNotLoaded(_))));
    }

    #[test]
    fn slots_are_filled_once() {
        let mut session = Session::new("outputs");
        session.set_rows(rows()).unwrap();
        session.set_specs(specs()).unwrap();
        assert!(matches!(
            session.set_rows(rows()),
            Err(SieveError::AlreadyLoaded(_))
        ));
        assert!(matches!(
            session.set_specs(specs()),
            Err(SieveError::AlreadyLoaded(_))
        ));
    }

    #[test]
    fn apply_requires_both_inputs() {
        let mut session = Session::new("outputs");
        session.set_rows(rows()).unwrap();
        assert!(matches!(
            session.apply_filters("condition_"),
            Err(SieveError::DataNotLoaded(_))
        ));
    }

    #[test]
    fn apply_stores_results() {
        let mut session = Session::new("outputs");
        session.set_rows(rows()).unwrap();
        session.set_specs(specs()).unwrap();
        assert_eq!(session.apply_filters("condition_").unwrap().len(), 1);

        let (_, first) = session.results().unwrap().by_number(1).unwrap();
        assert_eq!(first.len(), 1);
        assert!(session.apply_filters("condition_").is_err());
    }
}
