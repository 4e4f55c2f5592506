//! Output naming: condition sheet names and file names.

use crate::data::filter::ConditionId;
use crate::data::model::FilterSpec;

/// Excel sheet name maximum length (characters).
pub const SHEET_NAME_MAX_LEN: usize = 31;
/// Characters Excel does not allow in sheet names.
pub const ILLEGAL_SHEET_CHARS: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];
/// Suffix used when every value of a specification is a wildcard.
pub const UNCONSTRAINED_SUFFIX: &str = "all";

/// Replace illegal characters, cut to the Excel length limit and strip edge
/// apostrophes. Truncation drops characters from the end; the apostrophes
/// are stripped afterwards since truncation can expose one.
pub fn sanitize_sheet_name(name: &str) -> String {
    let truncated: String = name
        .trim()
        .chars()
        .map(|c| if ILLEGAL_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(SHEET_NAME_MAX_LEN)
        .collect();
    let trimmed = truncated.trim_matches('\'');
    if trimmed.trim().is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Non-wildcard values joined by `_`, or [`UNCONSTRAINED_SUFFIX`].
pub fn value_suffix(spec: &FilterSpec) -> String {
    if spec.is_unconstrained() {
        return UNCONSTRAINED_SUFFIX.to_string();
    }
    spec.constrained_values().collect::<Vec<_>>().join("_")
}

/// `<condition id>_<value suffix>`, sanitised and truncated.
///
/// Not injective: two specifications whose names only differ past the
/// length limit produce the same sheet name.
pub fn condition_sheet_name(id: &ConditionId, spec: &FilterSpec) -> String {
    sanitize_sheet_name(&format!("{id}_{}", value_suffix(spec)))
}

/// `<condition id>.csv`
pub fn condition_file_name(id: &ConditionId) -> String {
    format!("{id}.csv")
}
