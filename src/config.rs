use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::{Metric, SortOrder};
use crate::report::Letterhead;

/// Config file looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "dashboard.json";

// ---------------------------------------------------------------------------
// Dataset schema
// ---------------------------------------------------------------------------

/// A categorical column offered as a multi-select filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterColumn {
    pub column: String,
    /// Plural label, e.g. "Years"; used in the panel and in reports.
    pub label: String,
}

/// An observed-rate column and the alert threshold it is compared with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    pub value: String,
    pub threshold: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Pie,
}

/// What a chart plots per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSource {
    Aggregate(Metric),
    /// Rows with value > threshold, per group; groups without any are omitted.
    Exceedance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub source: ChartSource,
    /// Axis / legend label for the plotted value.
    pub value_label: String,
    /// `#rrggbb`; pie charts use a sequential palette instead.
    #[serde(default = "default_chart_color")]
    pub color: String,
    /// When set, the sort selector is hidden and this order is used.
    #[serde(default)]
    pub fixed_order: Option<SortOrder>,
}

fn default_chart_color() -> String {
    "#1f77b4".to_string()
}

/// Everything that distinguishes one alert dataset from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSchema {
    /// Short code used in sheet and file names ("CAN").
    pub code: String,
    /// Human title ("Component Alert Notice").
    pub title: String,
    pub path: PathBuf,
    pub filters: Vec<FilterColumn>,
    /// Boolean column with a Show All / Only / Exclude selector.
    #[serde(default)]
    pub flag: Option<String>,
    pub group_by: String,
    /// Label for the distinct-group count in reports ("ATA Chapters").
    pub group_label: String,
    #[serde(default)]
    pub threshold: Option<ThresholdPair>,
    /// Part-number column for the per-part tables.
    #[serde(default)]
    pub part_column: Option<String>,
    #[serde(default)]
    pub charts: Vec<ChartSpec>,
    /// Show the "% exceeding per group" table.
    #[serde(default)]
    pub exceedance_table: bool,
}

impl DatasetSchema {
    /// Selector label, e.g. "CAN - Component Alert Notice".
    pub fn module_label(&self) -> String {
        format!("{} - {}", self.code, self.title)
    }

    pub fn report_title(&self) -> String {
        format!("{} ({}) Report", self.title, self.code)
    }

    /// Every column this schema refers to.
    pub fn expected_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = self.filters.iter().map(|f| f.column.as_str()).collect();
        cols.extend(self.flag.as_deref());
        cols.push(&self.group_by);
        if let Some(t) = &self.threshold {
            cols.push(&t.value);
            cols.push(&t.threshold);
        }
        cols.extend(self.part_column.as_deref());
        for chart in &self.charts {
            if let ChartSource::Aggregate(metric) = &chart.source {
                cols.extend(metric.column());
            }
        }
        cols.sort_unstable();
        cols.dedup();
        cols
    }

    /// Component Alert Notice defaults.
    pub fn component_alerts() -> Self {
        Self {
            code: "CAN".into(),
            title: "Component Alert Notice".into(),
            path: PathBuf::from("CAN.xlsx"),
            filters: vec![
                filter("YEAR", "Years"),
                filter("QUARTER NO", "Quarters"),
                filter("A/C TYPE", "A/C Types"),
            ],
            flag: None,
            group_by: "ATA".into(),
            group_label: "ATA Chapters".into(),
            threshold: Some(ThresholdPair {
                value: "REMOVAL RATE".into(),
                threshold: "REMOVAL ALERT".into(),
            }),
            part_column: Some("P/N".into()),
            charts: vec![
                ChartSpec {
                    title: "Number of Removals by ATA".into(),
                    kind: ChartKind::Bar,
                    source: ChartSource::Aggregate(Metric::Sum("NO OF REMOVAL".into())),
                    value_label: "NO OF REMOVAL".into(),
                    color: "#1f77b4".into(),
                    fixed_order: None,
                },
                ChartSpec {
                    title: "Average Removal Rate by ATA".into(),
                    kind: ChartKind::Bar,
                    source: ChartSource::Aggregate(Metric::Mean("REMOVAL RATE".into())),
                    value_label: "REMOVAL RATE".into(),
                    color: "#ff7f0e".into(),
                    fixed_order: None,
                },
                ChartSpec {
                    title: "CAN Distribution by ATA".into(),
                    kind: ChartKind::Pie,
                    source: ChartSource::Aggregate(Metric::Sum("NO OF REMOVAL".into())),
                    value_label: "NO OF REMOVAL".into(),
                    color: default_chart_color(),
                    fixed_order: Some(SortOrder::Descending),
                },
                ChartSpec {
                    title: "Number of CAN Entries per ATA Chapter".into(),
                    kind: ChartKind::HorizontalBar,
                    source: ChartSource::Aggregate(Metric::Count),
                    value_label: "CAN Count".into(),
                    color: "#2ca02c".into(),
                    fixed_order: None,
                },
            ],
            exceedance_table: false,
        }
    }

    /// System Alert Notice defaults.
    pub fn system_alerts() -> Self {
        Self {
            code: "SAN".into(),
            title: "System Alert Notice".into(),
            path: PathBuf::from("SAN.xlsx"),
            filters: vec![
                filter("YEARS", "Years"),
                filter("MONTH", "Months"),
                filter("A/C TYPE", "A/C Types"),
            ],
            flag: Some("ETOPS".into()),
            group_by: "ATA".into(),
            group_label: "ATA Chapters".into(),
            threshold: Some(ThresholdPair {
                value: "RATE".into(),
                threshold: "ALERT".into(),
            }),
            part_column: None,
            charts: vec![
                ChartSpec {
                    title: "Number of SAN per ATA Chapter".into(),
                    kind: ChartKind::HorizontalBar,
                    source: ChartSource::Aggregate(Metric::Count),
                    value_label: "Number of SAN".into(),
                    color: "#1f77b4".into(),
                    fixed_order: None,
                },
                ChartSpec {
                    title: "Exceeding Alert Threshold (RATE > ALERT) per ATA".into(),
                    kind: ChartKind::HorizontalBar,
                    source: ChartSource::Exceedance,
                    value_label: "Number of Exceeding Cases".into(),
                    color: "#d62728".into(),
                    fixed_order: None,
                },
            ],
            exceedance_table: true,
        }
    }
}

fn filter(column: &str, label: &str) -> FilterColumn {
    FilterColumn {
        column: column.into(),
        label: label.into(),
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub letterhead: Letterhead,
    #[serde(default = "default_datasets")]
    pub datasets: Vec<DatasetSchema>,
    /// Modules listed in the selector that are not built yet.
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,
    /// Footer lines; nothing is shown when empty.
    #[serde(default = "default_credits")]
    pub credits: Vec<String>,
}

fn default_datasets() -> Vec<DatasetSchema> {
    vec![
        DatasetSchema::component_alerts(),
        DatasetSchema::system_alerts(),
    ]
}

fn default_placeholders() -> Vec<String> {
    vec!["MP - Maintenance Program".into(), "Events".into()]
}

fn default_credits() -> Vec<String> {
    [
        "Developed by:",
        "- Eng. Mennat Allah Mostafa",
        "- Eng. Osama Ibrahim Beela",
        "",
        "Supervised by:",
        "- Eng. Hazem Fahmi El-Shafei",
        "Reliability Dept. Manager",
        "EGYPTAIR M&E",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            letterhead: Letterhead::default(),
            datasets: default_datasets(),
            placeholders: default_placeholders(),
            credits: default_credits(),
        }
    }
}

impl DashboardConfig {
    /// Parse a JSON config file. Omitted sections take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Use `path` when it exists and parses; otherwise the built-in defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No {} found, using built-in dataset schemas", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!(
                    "Loaded config from {} ({} datasets)",
                    path.display(),
                    config.datasets.len()
                );
                config
            }
            Err(e) => {
                log::error!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }
}
