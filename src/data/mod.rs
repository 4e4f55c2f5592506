/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///      input.xlsx
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  master sheet → RowStore (transposed)
///   │           │  filter sheet → FilterSpecStore (all text)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  one FilterSpec → one ordered result set
///   └──────────┘
///        │
///        ▼
///   FilteredResults  (condition_1, condition_2, ...)
/// ```
pub mod filter;
pub mod loader;
pub mod model;
