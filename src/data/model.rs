use std::collections::BTreeSet;
use std::fmt;

use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the dtypes a spreadsheet yields.
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed numeric columns (e.g. ATA 21 and 21.5) sort numerically.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(std::cmp::Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(std::cmp::Ordering::Greater),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Build a numeric cell, collapsing whole floats to integers.
    ///
    /// Spreadsheets store every number as a float, so a `YEAR` of 2023 comes
    /// back as `2023.0`; filters and group keys expect it as an integer.
    pub fn from_number(v: f64) -> Self {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
            CellValue::Integer(v as i64)
        } else {
            CellValue::Float(v)
        }
    }

    /// Try to interpret the value as an `f64` for arithmetic.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Dataframe-style `== True`: booleans and the numeric value one.
    pub fn is_true(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Integer(i) => *i == 1,
            CellValue::Float(v) => *v == 1.0,
            _ => false,
        }
    }

    /// Text used by the free-text search; nulls match nothing.
    pub fn search_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the spreadsheet
// ---------------------------------------------------------------------------

/// One row; cells are aligned with [`Table::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

impl Record {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at `idx`, treating short rows as trailing nulls.
    pub fn get(&self, idx: usize) -> &CellValue {
        static NULL: CellValue = CellValue::Null;
        self.cells.get(idx).unwrap_or(&NULL)
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded sheet
// ---------------------------------------------------------------------------

/// A loaded sheet with its column order preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in source order.
    pub columns: Vec<String>,
    /// All rows.
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Column position, or a [`DashboardError::MissingColumn`].
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| DashboardError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Iterate the cells of one column.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |r| r.get(idx))
    }

    /// Sorted distinct non-null values of a column (the selectable options).
    pub fn unique_values(&self, name: &str) -> Result<BTreeSet<CellValue>> {
        let idx = self.require_column(name)?;
        Ok(self
            .column_values(idx)
            .filter(|v| !v.is_null())
            .cloned()
            .collect())
    }

    /// A new table holding only the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a table from string headers and rows of cells.
    pub(crate) fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        Table::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.into_iter().map(Record::new).collect(),
        )
    }

    pub(crate) fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    #[test]
    fn whole_floats_become_integers() {
        assert_eq!(CellValue::from_number(2023.0), CellValue::Integer(2023));
        assert_eq!(CellValue::from_number(0.25), CellValue::Float(0.25));
        assert!(matches!(CellValue::from_number(f64::NAN), CellValue::Float(_)));
    }

    #[test]
    fn truthiness_follows_dataframe_equality() {
        assert!(CellValue::Bool(true).is_true());
        assert!(CellValue::Integer(1).is_true());
        assert!(CellValue::Float(1.0).is_true());
        assert!(!CellValue::Bool(false).is_true());
        assert!(!CellValue::Null.is_true());
        assert!(!s("TRUE").is_true());
    }

    #[test]
    fn mixed_numbers_sort_numerically() {
        let mut vals = vec![CellValue::Float(21.5), CellValue::Integer(32), CellValue::Integer(21)];
        vals.sort();
        assert_eq!(
            vals,
            vec![CellValue::Integer(21), CellValue::Float(21.5), CellValue::Integer(32)]
        );
    }

    #[test]
    fn unique_values_skip_nulls() {
        let t = table(
            &["YEAR"],
            vec![
                vec![CellValue::Integer(2024)],
                vec![CellValue::Null],
                vec![CellValue::Integer(2023)],
                vec![CellValue::Integer(2024)],
            ],
        );
        let vals: Vec<_> = t.unique_values("YEAR").unwrap().into_iter().collect();
        assert_eq!(vals, vec![CellValue::Integer(2023), CellValue::Integer(2024)]);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let t = table(&["ATA"], vec![]);
        match t.require_column("RATE") {
            Err(DashboardError::MissingColumn { column }) => assert_eq!(column, "RATE"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn short_rows_read_as_null() {
        let t = table(&["A", "B"], vec![vec![s("x")]]);
        assert_eq!(t.rows[0].get(1), &CellValue::Null);
        let sub = t.select_rows(&[0, 7]);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.columns, t.columns);
    }
}
