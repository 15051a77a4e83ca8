use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{CellValue, Table};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Aggregation parameters
// ---------------------------------------------------------------------------

/// How a group's rows are reduced to one number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "column", rename_all = "snake_case")]
pub enum Metric {
    /// Number of rows in the group.
    Count,
    /// Sum of a numeric column; non-numeric cells are skipped.
    Sum(String),
    /// Mean of a numeric column; non-numeric cells are skipped.
    Mean(String),
}

impl Metric {
    pub fn column(&self) -> Option<&str> {
        match self {
            Metric::Count => None,
            Metric::Sum(c) | Metric::Mean(c) => Some(c),
        }
    }

    /// Render a value the way this metric is displayed.
    pub fn format_value(&self, value: f64) -> String {
        match self {
            Metric::Mean(_) => format!("{value:.2}"),
            _ => format_number(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

impl SortOrder {
    pub const ALL: [SortOrder; 2] = [SortOrder::Descending, SortOrder::Ascending];
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Descending => write!(f, "Descending"),
            SortOrder::Ascending => write!(f, "Ascending"),
        }
    }
}

/// Limit on the number of groups shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TopN {
    #[default]
    All,
    Top(usize),
}

impl TopN {
    /// The choices offered in the UI.
    pub const CHOICES: [TopN; 4] = [TopN::All, TopN::Top(3), TopN::Top(6), TopN::Top(10)];

    pub fn apply<T>(self, rows: &mut Vec<T>) {
        if let TopN::Top(n) = self {
            rows.truncate(n);
        }
    }
}

impl fmt::Display for TopN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopN::All => write!(f, "All"),
            TopN::Top(n) => write!(f, "Top {n}"),
        }
    }
}

/// Everything needed to turn a table into ranked groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    pub group_by: String,
    pub metric: Metric,
    pub order: SortOrder,
    pub limit: TopN,
}

/// One group and its metric value.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: CellValue,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Acc {
    rows: usize,
    sum: f64,
    numeric: usize,
}

/// Group, reduce, sort and truncate.
///
/// Rows with a null group key are skipped. Ties keep group-key order, and
/// NaN values (a mean over no numeric cells) sort last in either direction.
pub fn aggregate(table: &Table, spec: &AggregateSpec) -> Result<Vec<AggregateRow>> {
    let key_idx = table.require_column(&spec.group_by)?;
    let metric_idx = spec
        .metric
        .column()
        .map(|c| table.require_column(c))
        .transpose()?;

    let mut groups: BTreeMap<&CellValue, Acc> = BTreeMap::new();
    for row in &table.rows {
        let key = row.get(key_idx);
        if key.is_null() {
            continue;
        }
        let acc = groups.entry(key).or_default();
        acc.rows += 1;
        if let Some(v) = metric_idx.and_then(|i| row.get(i).as_f64()) {
            acc.sum += v;
            acc.numeric += 1;
        }
    }

    let mut out: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(key, acc)| {
            let value = match spec.metric {
                Metric::Count => acc.rows as f64,
                Metric::Sum(_) => acc.sum,
                Metric::Mean(_) if acc.numeric == 0 => f64::NAN,
                Metric::Mean(_) => acc.sum / acc.numeric as f64,
            };
            AggregateRow {
                key: key.clone(),
                value,
            }
        })
        .collect();

    sort_by_value(&mut out, spec.order, |r| r.value);
    spec.limit.apply(&mut out);
    Ok(out)
}

/// Stable sort on an `f64` key with NaN last regardless of direction.
pub fn sort_by_value<T>(rows: &mut [T], order: SortOrder, value: impl Fn(&T) -> f64) {
    rows.sort_by(|a, b| {
        let (va, vb) = (value(a), value(b));
        match (va.is_nan(), vb.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match order {
                SortOrder::Ascending => va.total_cmp(&vb),
                SortOrder::Descending => vb.total_cmp(&va),
            },
        }
    });
}

/// Record counts per distinct value, most frequent first.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<(CellValue, usize)>> {
    let rows = aggregate(
        table,
        &AggregateSpec {
            group_by: column.to_string(),
            metric: Metric::Count,
            order: SortOrder::Descending,
            limit: TopN::All,
        },
    )?;
    Ok(rows
        .into_iter()
        .map(|r| (r.key, r.value as usize))
        .collect())
}

/// Number of distinct non-null values in a column.
pub fn distinct_count(table: &Table, column: &str) -> Result<usize> {
    let idx = table.require_column(column)?;
    Ok(table
        .column_values(idx)
        .filter(|v| !v.is_null())
        .collect::<BTreeSet<_>>()
        .len())
}

/// Whole numbers without decimals, everything else to two places.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
