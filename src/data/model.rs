use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the master sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as read from a workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Already rendered as `YYYY-MM-DD HH:MM:SS`.
    DateTime(String),
}

impl CellValue {
    /// Canonical textual form used for matching, CSV output and sheet names.
    ///
    /// Integral floats drop their fractional part so that a numeric `2024.0`
    /// read from one sheet equals the text `"2024"` read from another.
    pub fn canonical_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) | CellValue::DateTime(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => canonical_float(*f),
            CellValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        }
    }

    /// Empty cells and empty strings both count as "no value".
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// 2^63, the first float above the `i64` range.
const I64_UPPER_BOUND: f64 = 9.223372036854775808e18;

fn canonical_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f.is_sign_positive() { "inf" } else { "-inf" }.to_string();
    }
    // 2^63 itself is out of range; `i64::MAX as f64` rounds up to it.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < I64_UPPER_BOUND {
        return (f as i64).to_string();
    }
    f.to_string()
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_text())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

// ---------------------------------------------------------------------------
// Schema – ordered field names shared by every record of a store
// ---------------------------------------------------------------------------

/// Field names in source order plus a name → position index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<String>,
    positions: BTreeMap<String, usize>,
}

impl Schema {
    /// Build a schema; a repeated name keeps its first position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut schema = Schema::default();
        for name in names {
            schema.push(name.into());
        }
        schema
    }

    /// Append a field, returning its position (existing position if repeated).
    pub fn push(&mut self, name: String) -> usize {
        if let Some(&pos) = self.positions.get(&name) {
            return pos;
        }
        let pos = self.fields.len();
        self.positions.insert(name.clone(), pos);
        self.fields.push(name);
        pos
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Record – one column of the master sheet (after transposition)
// ---------------------------------------------------------------------------

/// A single data record: values aligned with a shared [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<CellValue>,
}

impl Record {
    /// Values beyond the schema width are dropped; missing ones become `Empty`.
    pub fn new(schema: Arc<Schema>, mut values: Vec<CellValue>) -> Self {
        values.resize(schema.len(), CellValue::Empty);
        Record { schema, values }
    }

    /// Build a record from `(field, value)` pairs with its own schema.
    /// Later pairs overwrite earlier pairs with the same field name.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        let mut schema = Schema::default();
        let mut values = Vec::new();
        for (key, value) in pairs {
            let pos = schema.push(key.into());
            if pos == values.len() {
                values.push(value.into());
            } else {
                values[pos] = value.into();
            }
        }
        Record {
            schema: Arc::new(schema),
            values,
        }
    }

    /// Look up a field; `None` when the field is not part of the schema.
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.schema.position(field).map(|pos| &self.values[pos])
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn fields(&self) -> &[String] {
        self.schema.fields()
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    /// `(field, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.schema
            .fields()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

// ---------------------------------------------------------------------------
// RowStore – the complete master dataset
// ---------------------------------------------------------------------------

/// Records extracted from the master sheet plus the labels needed to write
/// the sheet back in its original orientation.
#[derive(Debug, Clone)]
pub struct RowStore {
    pub schema: Arc<Schema>,
    pub records: Vec<Record>,
    /// First-column labels of the source sheet, one per field row, in order.
    pub header_column: Vec<String>,
    /// Top-left cell of the source sheet.
    pub corner_label: String,
    /// First-row labels of the source sheet, one per record.
    pub record_labels: Vec<String>,
}

impl RowStore {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Field names for header-only output, without the reserved ordinal field.
    pub fn header_fields_without(&self, ordinal_field: &str) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .filter(|f| f.as_str() != ordinal_field)
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FilterSpec – one row of the filter sheet
// ---------------------------------------------------------------------------

/// Ordered `(field, expected)` constraints. An empty expected value is a
/// wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    entries: Vec<(String, String)>,
}

impl FilterSpec {
    /// Later entries with a repeated field overwrite earlier ones in place.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut spec = FilterSpec::default();
        for (field, expected) in entries {
            let field = field.into();
            let expected = expected.into();
            match spec.entries.iter_mut().find(|(f, _)| *f == field) {
                Some(slot) => slot.1 = expected,
                None => spec.entries.push((field, expected)),
            }
        }
        spec
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Non-wildcard values in field order.
    pub fn constrained_values(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// True when every field is a wildcard (matches every record).
    pub fn is_unconstrained(&self) -> bool {
        self.constrained_values().next().is_none()
    }

    /// `field1=value1 field2=value2 ...` on a single line.
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(|(f, v)| format!("{}={}", single_line(f), single_line(v)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

/// All filter specifications in sheet order, plus the sheet's header fields.
#[derive(Debug, Clone, Default)]
pub struct FilterSpecStore {
    pub fields: Vec<String>,
    pub specs: Vec<FilterSpec>,
}

impl FilterSpecStore {
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_text_normalises_integral_floats() {
        assert_eq!(CellValue::Float(2024.0).canonical_text(), "2024");
        assert_eq!(CellValue::Integer(2024).canonical_text(), "2024");
        assert_eq!(CellValue::Float(0.5).canonical_text(), "0.5");
        assert_eq!(CellValue::Float(-3.0).canonical_text(), "-3");
        assert_eq!(CellValue::Float(f64::NAN).canonical_text(), "NaN");
        assert_eq!(CellValue::Bool(true).canonical_text(), "True");
        assert_eq!(CellValue::Empty.canonical_text(), "");
    }

    #[test]
    fn canonical_text_does_not_saturate_at_i64_bounds() {
        let two_pow_63 = 2f64.powi(63);
        assert_eq!(CellValue::Float(two_pow_63).canonical_text(), two_pow_63.to_string());
        assert_ne!(CellValue::Float(two_pow_63).canonical_text(), i64::MAX.to_string());
        assert_eq!(
            CellValue::Float(-two_pow_63).canonical_text(),
            i64::MIN.to_string()
        );
    }

    #[test]
    fn blank_covers_empty_and_empty_text() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text(String::new()).is_blank());
        assert!(!CellValue::Text(" ".to_string()).is_blank());
        assert!(!CellValue::Integer(0).is_blank());
    }

    #[test]
    fn record_preserves_insertion_order() {
        let record = Record::from_pairs([
            ("年份", CellValue::Integer(2024)),
            ("品类", CellValue::from("A")),
            ("Value", CellValue::Integer(10)),
        ]);
        assert_eq!(record.fields(), ["年份", "品类", "Value"]);
        assert_eq!(record.get("品类"), Some(&CellValue::from("A")));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn repeated_field_overwrites_in_place() {
        let record = Record::from_pairs([("a", 1_i64), ("b", 2), ("a", 3)]);
        assert_eq!(record.fields(), ["a", "b"]);
        assert_eq!(record.get("a"), Some(&CellValue::Integer(3)));

        let spec = FilterSpec::new([("x", "1"), ("y", ""), ("x", "2")]);
        assert_eq!(spec.entries().len(), 2);
        assert_eq!(spec.get("x"), Some("2"));
    }

    #[test]
    fn record_pads_short_value_rows() {
        let schema = Arc::new(Schema::new(["a", "b", "c"]));
        let record = Record::new(schema, vec![CellValue::Integer(1)]);
        assert_eq!(record.get("c"), Some(&CellValue::Empty));
    }

    #[test]
    fn spec_summary_is_single_line() {
        let spec = FilterSpec::new([("年份", "2024"), ("品类", ""), ("note", "a\nb")]);
        assert_eq!(spec.summary(), "年份=2024 品类= note=a b");
        assert_eq!(spec.constrained_values().collect::<Vec<_>>(), ["2024", "a\nb"]);
        assert!(!spec.is_unconstrained());
        assert!(FilterSpec::new([("a", ""), ("b", "")]).is_unconstrained());
    }
}
