use std::fmt;

use log::{debug, info};

use super::model::{FilterSpec, Record, RowStore};
use crate::error::{Result, SieveError};

// ---------------------------------------------------------------------------
// Condition identifiers
// ---------------------------------------------------------------------------

/// Synthetic key of the Nth filter specification (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConditionId {
    prefix: String,
    number: usize,
}

impl ConditionId {
    pub fn new(prefix: &str, number: usize) -> Self {
        ConditionId {
            prefix: prefix.to_string(),
            number,
        }
    }

    /// 1-based position of the specification.
    pub fn number(&self) -> usize {
        self.number
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.number)
    }
}

// ---------------------------------------------------------------------------
// Match predicate
// ---------------------------------------------------------------------------

/// Result of evaluating one record against one specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched,
    /// First field that failed; `actual` is `None` for a blank or missing value.
    Mismatch {
        field: String,
        expected: String,
        actual: Option<String>,
    },
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched)
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Matched => write!(f, "matched"),
            MatchOutcome::Mismatch {
                field,
                expected,
                actual: None,
            } => write!(f, "{field} (expected: {expected}, actual: <blank>)"),
            MatchOutcome::Mismatch {
                field,
                expected,
                actual: Some(actual),
            } => write!(f, "{field} (expected: {expected}, actual: {actual})"),
        }
    }
}

/// Evaluate `spec` field by field, stopping at the first failing field.
///
/// * empty expected value → wildcard, field skipped
/// * blank or missing record value → mismatch
/// * otherwise canonical text of the record value must equal `expected`
pub fn match_record(record: &Record, spec: &FilterSpec) -> MatchOutcome {
    for (field, expected) in spec.entries() {
        if expected.is_empty() {
            continue;
        }
        let actual = match record.get(field) {
            Some(value) if !value.is_blank() => value.canonical_text(),
            _ => {
                return MatchOutcome::Mismatch {
                    field: field.clone(),
                    expected: expected.clone(),
                    actual: None,
                }
            }
        };
        if actual != *expected {
            return MatchOutcome::Mismatch {
                field: field.clone(),
                expected: expected.clone(),
                actual: Some(actual),
            };
        }
    }
    MatchOutcome::Matched
}

pub fn matches(record: &Record, spec: &FilterSpec) -> bool {
    match_record(record, spec).is_match()
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// One result set per specification, in specification order.
#[derive(Debug, Clone, Default)]
pub struct FilteredResults {
    entries: Vec<(ConditionId, Vec<Record>)>,
}

impl FilteredResults {
    pub fn get(&self, id: &ConditionId) -> Option<&[Record]> {
        self.entries
            .iter()
            .find(|(cid, _)| cid == id)
            .map(|(_, records)| records.as_slice())
    }

    /// Result set of the Nth specification (1-based).
    pub fn by_number(&self, number: usize) -> Option<(&ConditionId, &[Record])> {
        self.entries
            .iter()
            .find(|(cid, _)| cid.number() == number)
            .map(|(cid, records)| (cid, records.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConditionId, &[Record])> {
        self.entries
            .iter()
            .map(|(cid, records)| (cid, records.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply every specification independently to `rows`.
///
/// Both inputs must be non-empty; this is checked before any condition is
/// evaluated. Records are cloned unmodified into each matching result set,
/// so a record may appear under several conditions.
pub fn apply(rows: &RowStore, specs: &[FilterSpec], prefix: &str) -> Result<FilteredResults> {
    if rows.is_empty() {
        return Err(SieveError::DataNotLoaded("master data"));
    }
    if specs.is_empty() {
        return Err(SieveError::DataNotLoaded("filter specifications"));
    }

    let mut entries = Vec::with_capacity(specs.len());
    for (idx, spec) in specs.iter().enumerate() {
        let id = ConditionId::new(prefix, idx + 1);
        debug!("Applying {id}: {}", spec.summary());

        let mut selected = Vec::new();
        for record in &rows.records {
            match match_record(record, spec) {
                MatchOutcome::Matched => selected.push(record.clone()),
                // Only the first condition's misses are traced, to keep logs readable.
                miss if idx == 0 => debug!("{id} skipped record: {miss}"),
                _ => {}
            }
        }

        info!("{id}: {} of {} records matched", selected.len(), rows.len());
        entries.push((id, selected));
    }

    Ok(FilteredResults { entries })
}
