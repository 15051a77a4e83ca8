use std::collections::BTreeMap;

use super::aggregate::{round2, sort_by_value, SortOrder, TopN};
use super::model::{CellValue, Record, Table};
use crate::error::Result;

/// Per-group exceedance summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceedanceRow {
    pub key: CellValue,
    pub exceed_count: usize,
    pub total: usize,
    /// `100 × exceed_count / total`, rounded to two decimals; 0 when `total` is 0.
    pub percentage: f64,
}

/// Which figure [`rank_exceedance`] orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    Count,
    Percentage,
}

/// Strict comparison: equal to the threshold is not an exceedance, and a
/// missing or non-numeric side never exceeds.
pub fn exceeds(value: &CellValue, threshold: &CellValue) -> bool {
    match (value.as_f64(), threshold.as_f64()) {
        (Some(v), Some(t)) => v > t,
        _ => false,
    }
}

/// Column positions of an observed-value / threshold pair.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdColumns {
    pub value: usize,
    pub threshold: usize,
}

impl ThresholdColumns {
    pub fn resolve(table: &Table, value: &str, threshold: &str) -> Result<Self> {
        Ok(Self {
            value: table.require_column(value)?,
            threshold: table.require_column(threshold)?,
        })
    }

    pub fn row_exceeds(&self, row: &Record) -> bool {
        exceeds(row.get(self.value), row.get(self.threshold))
    }
}

/// Number of rows whose value exceeds their threshold.
pub fn count_exceeding(table: &Table, value: &str, threshold: &str) -> Result<usize> {
    let cols = ThresholdColumns::resolve(table, value, threshold)?;
    Ok(table.rows.iter().filter(|r| cols.row_exceeds(r)).count())
}

/// Safe percentage: a zero denominator gives 0 rather than NaN.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(part as f64 / total as f64 * 100.0)
    }
}

/// Exceedance count, group total and percentage for every non-null group,
/// in group-key order.
pub fn exceedance_by_group(
    table: &Table,
    group_by: &str,
    value: &str,
    threshold: &str,
) -> Result<Vec<ExceedanceRow>> {
    let key_idx = table.require_column(group_by)?;
    let cols = ThresholdColumns::resolve(table, value, threshold)?;

    let mut groups: BTreeMap<&CellValue, (usize, usize)> = BTreeMap::new();
    for row in &table.rows {
        let key = row.get(key_idx);
        if key.is_null() {
            continue;
        }
        let (exceed, total) = groups.entry(key).or_default();
        *total += 1;
        if cols.row_exceeds(row) {
            *exceed += 1;
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, (exceed_count, total))| ExceedanceRow {
            key: key.clone(),
            exceed_count,
            total,
            percentage: percentage(exceed_count, total),
        })
        .collect())
}

/// Order exceedance rows by count or percentage and apply a top-N limit.
pub fn rank_exceedance(
    mut rows: Vec<ExceedanceRow>,
    by: RankBy,
    order: SortOrder,
    limit: TopN,
) -> Vec<ExceedanceRow> {
    match by {
        RankBy::Count => sort_by_value(&mut rows, order, |r| r.exceed_count as f64),
        RankBy::Percentage => sort_by_value(&mut rows, order, |r| r.percentage),
    }
    limit.apply(&mut rows);
    rows
}
