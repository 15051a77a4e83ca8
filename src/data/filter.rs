use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::model::{CellValue, Record, Table};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Filter predicate: which distinct values are selected per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// A column listed here with an empty set selects nothing.
pub type Selections = BTreeMap<String, BTreeSet<CellValue>>;

/// Tri-state filter on a boolean column such as `ETOPS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlagMode {
    #[default]
    ShowAll,
    Only,
    Exclude,
}

impl FlagMode {
    pub const ALL: [FlagMode; 3] = [FlagMode::ShowAll, FlagMode::Only, FlagMode::Exclude];

    /// UI label, e.g. "Only ETOPS".
    pub fn label(self, flag: &str) -> String {
        match self {
            FlagMode::ShowAll => "Show All".to_string(),
            FlagMode::Only => format!("Only {flag}"),
            FlagMode::Exclude => format!("Exclude {flag}"),
        }
    }

    /// Nulls never count as true, so they fail `Only` and pass `Exclude`.
    pub fn accepts(self, value: &CellValue) -> bool {
        match self {
            FlagMode::ShowAll => true,
            FlagMode::Only => value.is_true(),
            FlagMode::Exclude => !value.is_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagFilter {
    pub column: String,
    pub mode: FlagMode,
}

/// The complete, immutable set of user selections applied to a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub selections: Selections,
    pub flag: Option<FlagFilter>,
    pub search: Option<String>,
}

impl FilterCriteria {
    /// Criteria with every distinct value of `columns` selected (i.e., show everything).
    pub fn select_all(table: &Table, columns: &[String]) -> Result<Self> {
        let mut selections = Selections::new();
        for col in columns {
            selections.insert(col.clone(), table.unique_values(col)?);
        }
        Ok(Self {
            selections,
            ..Default::default()
        })
    }

    pub fn with_selection(mut self, column: &str, values: BTreeSet<CellValue>) -> Self {
        self.selections.insert(column.to_string(), values);
        self
    }

    pub fn with_flag(mut self, column: &str, mode: FlagMode) -> Self {
        self.flag = Some(FlagFilter {
            column: column.to_string(),
            mode,
        });
        self
    }

    pub fn with_search(mut self, term: &str) -> Self {
        self.search = Some(term.to_string());
        self
    }

    /// The search term, if it is non-blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Return indices of rows that pass all active filters.
///
/// A row passes a column selection when its value for that column is in
/// the selected set. An empty set therefore hides everything, and a null
/// cell never passes (null is not a selectable value).
pub fn filtered_indices(table: &Table, criteria: &FilterCriteria) -> Result<Vec<usize>> {
    let selections: Vec<(usize, &BTreeSet<CellValue>)> = criteria
        .selections
        .iter()
        .map(|(col, selected)| Ok((table.require_column(col)?, selected)))
        .collect::<Result<_>>()?;

    let flag = match &criteria.flag {
        Some(f) if f.mode != FlagMode::ShowAll => {
            Some((table.require_column(&f.column)?, f.mode))
        }
        _ => None,
    };

    let needle = criteria.search_term().map(str::to_lowercase);

    Ok(table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            selections
                .iter()
                .all(|(idx, selected)| selected.contains(row.get(*idx)))
        })
        .filter(|(_, row)| flag.map_or(true, |(idx, mode)| mode.accepts(row.get(idx))))
        .filter(|(_, row)| needle.as_deref().map_or(true, |n| matches_search(row, n)))
        .map(|(i, _)| i)
        .collect())
}

/// Apply `criteria` and return the surviving rows as a new table.
pub fn apply(table: &Table, criteria: &FilterCriteria) -> Result<Table> {
    let indices = filtered_indices(table, criteria)?;
    log::debug!("Filter kept {} of {} rows", indices.len(), table.len());
    Ok(table.select_rows(&indices))
}

/// Whether any cell's text contains `needle_lower` (already lowercased).
pub fn matches_search(row: &Record, needle_lower: &str) -> bool {
    row.cells
        .iter()
        .any(|c| c.search_text().to_lowercase().contains(needle_lower))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{s, table};
    use crate::error::DashboardError;

    fn san() -> Table {
        table(
            &["YEARS", "MONTH", "A/C TYPE", "ETOPS", "ATA"],
            vec![
                vec![CellValue::Integer(2023), CellValue::Integer(1), s("A320"), CellValue::Bool(true), CellValue::Integer(21)],
                vec![CellValue::Integer(2023), CellValue::Integer(2), s("B777"), CellValue::Bool(false), CellValue::Integer(32)],
                vec![CellValue::Integer(2024), CellValue::Integer(1), s("A320"), CellValue::Null, CellValue::Integer(21)],
                vec![CellValue::Integer(2024), CellValue::Integer(3), s("B737"), CellValue::Bool(true), CellValue::Integer(49)],
            ],
        )
    }

    fn all(t: &Table) -> FilterCriteria {
        FilterCriteria::select_all(t, &["YEARS".into(), "MONTH".into(), "A/C TYPE".into()]).unwrap()
    }

    #[test]
    fn everything_selected_keeps_every_row() {
        let t = san();
        assert_eq!(filtered_indices(&t, &all(&t)).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn selection_narrows_by_membership() {
        let t = san();
        let c = all(&t).with_selection("YEARS", BTreeSet::from([CellValue::Integer(2024)]));
        assert_eq!(filtered_indices(&t, &c).unwrap(), vec![2, 3]);
    }

    #[test]
    fn empty_selection_yields_no_rows() {
        let t = san();
        let c = all(&t).with_selection("YEARS", BTreeSet::new());
        let out = apply(&t, &c).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.columns, t.columns);
    }

    #[test]
    fn null_cells_never_match_a_selection() {
        let t = table(
            &["YEAR"],
            vec![vec![CellValue::Integer(2024)], vec![CellValue::Null]],
        );
        let c = FilterCriteria::select_all(&t, &["YEAR".into()]).unwrap();
        assert_eq!(filtered_indices(&t, &c).unwrap(), vec![0]);
    }

    #[test]
    fn flag_tri_state() {
        let t = san();
        let only = all(&t).with_flag("ETOPS", FlagMode::Only);
        assert_eq!(filtered_indices(&t, &only).unwrap(), vec![0, 3]);

        let exclude = all(&t).with_flag("ETOPS", FlagMode::Exclude);
        assert_eq!(filtered_indices(&t, &exclude).unwrap(), vec![1, 2]);

        let show = all(&t).with_flag("ETOPS", FlagMode::ShowAll);
        assert_eq!(filtered_indices(&t, &show).unwrap().len(), 4);
    }

    #[test]
    fn search_is_case_insensitive_across_columns() {
        let t = san();
        let c = all(&t).with_search("b7");
        assert_eq!(filtered_indices(&t, &c).unwrap(), vec![1, 3]);

        let c = all(&t).with_search("49");
        assert_eq!(filtered_indices(&t, &c).unwrap(), vec![3]);

        let blank = all(&t).with_search("   ");
        assert_eq!(filtered_indices(&t, &blank).unwrap().len(), 4);
    }

    #[test]
    fn result_is_subset_and_idempotent() {
        let t = san();
        let c = all(&t)
            .with_selection("A/C TYPE", BTreeSet::from([s("A320"), s("B737")]))
            .with_flag("ETOPS", FlagMode::Exclude);
        let once = apply(&t, &c).unwrap();
        let twice = apply(&once, &c).unwrap();
        assert_eq!(once, twice);
        assert!(once.rows.iter().all(|r| t.rows.contains(r)));
        assert_eq!(apply(&t, &c).unwrap(), once);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let t = san();
        let c = FilterCriteria::default().with_flag("ETOPS FLAG", FlagMode::Only);
        assert!(matches!(
            filtered_indices(&t, &c),
            Err(DashboardError::MissingColumn { .. })
        ));
    }

    #[test]
    fn flag_labels() {
        assert_eq!(FlagMode::ShowAll.label("ETOPS"), "Show All");
        assert_eq!(FlagMode::Only.label("ETOPS"), "Only ETOPS");
        assert_eq!(FlagMode::Exclude.label("ETOPS"), "Exclude ETOPS");
    }
}
