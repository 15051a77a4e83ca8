use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::config::{DashboardConfig, DatasetSchema};
use crate::data::aggregate::{SortOrder, TopN};
use crate::data::filter::{self, FilterCriteria, FlagMode, Selections};
use crate::data::loader;
use crate::data::model::{CellValue, Table};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Per-dataset session state
// ---------------------------------------------------------------------------

/// Sort / top-N selectors attached to one chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChartControls {
    pub order: SortOrder,
    pub limit: TopN,
}

/// Selections and cached results for one alert dataset.
pub struct DatasetView {
    pub schema: DatasetSchema,

    /// Loaded sheet (None until the module is first opened, or on failure).
    pub table: Option<Table>,

    /// Selectable values per filter column.
    pub options: BTreeMap<String, BTreeSet<CellValue>>,

    /// Per-column filter selections.
    pub selections: Selections,

    pub flag_mode: FlagMode,

    /// Free-text table search.
    pub search: String,

    /// Rows passing the filter selections and flag (cached). Charts,
    /// part tables and report summaries read this.
    pub filtered: Table,

    /// `filtered` narrowed by the table search; shown in the data table
    /// and written to the spreadsheet export.
    pub displayed: Table,

    /// One entry per configured chart.
    pub chart_controls: Vec<ChartControls>,

    /// Top-N for the exceedance percentage table.
    pub exceedance_limit: TopN,

    /// Search within the per-part count table.
    pub part_search: String,

    /// Part number whose records are listed in detail.
    pub selected_part: Option<CellValue>,

    /// Load error or missing-column warning for the whole view.
    pub status_message: Option<String>,
}

impl DatasetView {
    pub fn new(schema: DatasetSchema) -> Self {
        let chart_controls = vec![ChartControls::default(); schema.charts.len()];
        Self {
            schema,
            table: None,
            options: BTreeMap::new(),
            selections: Selections::new(),
            flag_mode: FlagMode::ShowAll,
            search: String::new(),
            filtered: Table::default(),
            displayed: Table::default(),
            chart_controls,
            exceedance_limit: TopN::All,
            part_search: String::new(),
            selected_part: None,
            status_message: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    /// (Re)load the sheet from the schema path.
    pub fn load(&mut self) {
        match loader::load_file(&self.schema.path) {
            Ok(table) => self.set_table(table),
            Err(e) => {
                log::error!("Failed to load {}: {e}", self.schema.path.display());
                self.table = None;
                self.filtered = Table::default();
                self.displayed = Table::default();
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded table with every filter value selected.
    pub fn set_table(&mut self, table: Table) {
        let missing: Vec<&str> = self
            .schema
            .expected_columns()
            .into_iter()
            .filter(|c| !table.has_column(c))
            .collect();
        self.status_message = if missing.is_empty() {
            None
        } else {
            log::warn!("{} is missing columns {missing:?}", self.schema.code);
            Some(format!("Missing columns: {}", missing.join(", ")))
        };

        self.options = self
            .schema
            .filters
            .iter()
            .filter_map(|f| Some((f.column.clone(), table.unique_values(&f.column).ok()?)))
            .collect();
        self.selections = self.options.clone();
        self.flag_mode = FlagMode::ShowAll;
        self.search.clear();
        self.selected_part = None;
        self.table = Some(table);
        self.refilter();
    }

    /// Selections and flag mode. The table search is not part of these.
    pub fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria {
            selections: self.selections.clone(),
            ..Default::default()
        };
        if let Some(flag) = &self.schema.flag {
            if self.options_available(flag) {
                criteria = criteria.with_flag(flag, self.flag_mode);
            }
        }
        criteria
    }

    fn options_available(&self, column: &str) -> bool {
        self.table.as_ref().is_some_and(|t| t.has_column(column))
    }

    /// Recompute `filtered` and `displayed` after a selection change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        match filter::apply(table, &self.criteria()) {
            Ok(filtered) => self.filtered = filtered,
            Err(e) => {
                log::warn!("Filter failed: {e}");
                self.filtered = Table::new(table.columns.clone(), Vec::new());
                self.status_message = Some(format!("Filter error: {e}"));
            }
        }
        self.apply_search();
    }

    /// Recompute `displayed` from `filtered` and the search term.
    fn apply_search(&mut self) {
        let search = FilterCriteria::default().with_search(&self.search);
        self.displayed = match filter::apply(&self.filtered, &search) {
            Ok(displayed) => displayed,
            Err(e) => {
                log::warn!("Search failed: {e}");
                self.filtered.clone()
            }
        };
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &CellValue) {
        let selected = self.selections.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(all_vals) = self.options.get(column) {
            self.selections.insert(column.to_string(), all_vals.clone());
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.selections.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }

    pub fn set_flag_mode(&mut self, mode: FlagMode) {
        self.flag_mode = mode;
        self.refilter();
    }

    pub fn set_search(&mut self, term: String) {
        self.search = term;
        self.apply_search();
    }

    /// Rows of `filtered` for the selected part number.
    pub fn part_details(&self) -> Result<Option<Table>> {
        let (Some(col), Some(part)) = (&self.schema.part_column, &self.selected_part) else {
            return Ok(None);
        };
        let criteria =
            FilterCriteria::default().with_selection(col, BTreeSet::from([part.clone()]));
        filter::apply(&self.filtered, &criteria).map(Some)
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which entry of the module selector is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleChoice {
    #[default]
    None,
    Dataset(usize),
    Placeholder(usize),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    pub module: ModuleChoice,
    pub views: Vec<DatasetView>,
    /// Export / dialog message shown in the top bar.
    pub status_message: Option<String>,
    /// Date printed on the letterhead and in reports.
    pub today: NaiveDate,
}

impl AppState {
    pub fn new(config: DashboardConfig, today: NaiveDate) -> Self {
        let views = config
            .datasets
            .iter()
            .cloned()
            .map(DatasetView::new)
            .collect();
        Self {
            config,
            module: ModuleChoice::None,
            views,
            status_message: None,
            today,
        }
    }

    /// Switch modules, loading a dataset the first time it is shown.
    pub fn select_module(&mut self, choice: ModuleChoice) {
        self.module = choice;
        if let ModuleChoice::Dataset(i) = choice {
            if let Some(view) = self.views.get_mut(i) {
                if !view.is_loaded() {
                    view.load();
                }
            }
        }
    }

    pub fn active_view(&self) -> Option<&DatasetView> {
        match self.module {
            ModuleChoice::Dataset(i) => self.views.get(i),
            _ => None,
        }
    }

    pub fn active_view_mut(&mut self) -> Option<&mut DatasetView> {
        match self.module {
            ModuleChoice::Dataset(i) => self.views.get_mut(i),
            _ => None,
        }
    }

    /// Selector label of the current module.
    pub fn module_label(&self) -> String {
        match self.module {
            ModuleChoice::None => "-- Select --".to_string(),
            ModuleChoice::Dataset(i) => self
                .views
                .get(i)
                .map(|v| v.schema.module_label())
                .unwrap_or_default(),
            ModuleChoice::Placeholder(i) => {
                self.config.placeholders.get(i).cloned().unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{s, table};

    fn san_table() -> Table {
        table(
            &["YEARS", "MONTH", "A/C TYPE", "ETOPS", "ATA", "RATE", "ALERT"],
            vec![
                vec![CellValue::Integer(2023), CellValue::Integer(1), s("A320"), CellValue::Bool(true), CellValue::Integer(21), CellValue::Float(1.2), CellValue::Float(1.0)],
                vec![CellValue::Integer(2024), CellValue::Integer(1), s("B777"), CellValue::Bool(false), CellValue::Integer(32), CellValue::Float(0.4), CellValue::Float(1.0)],
                vec![CellValue::Integer(2024), CellValue::Integer(2), s("A320"), CellValue::Null, CellValue::Integer(21), CellValue::Float(0.9), CellValue::Float(1.0)],
            ],
        )
    }

    fn loaded_san() -> DatasetView {
        let mut view = DatasetView::new(DatasetSchema::system_alerts());
        view.set_table(san_table());
        view
    }

    #[test]
    fn new_table_selects_everything() {
        let view = loaded_san();
        assert_eq!(view.filtered.len(), 3);
        assert_eq!(view.selections["YEARS"].len(), 2);
        assert!(view.status_message.is_none());
    }

    #[test]
    fn select_none_then_all() {
        let mut view = loaded_san();
        view.select_none("YEARS");
        assert!(view.filtered.is_empty());
        view.select_all("YEARS");
        assert_eq!(view.filtered.len(), 3);
    }

    #[test]
    fn toggling_a_value_refilters() {
        let mut view = loaded_san();
        view.toggle_filter_value("YEARS", &CellValue::Integer(2023));
        assert_eq!(view.filtered.len(), 2);
        view.toggle_filter_value("YEARS", &CellValue::Integer(2023));
        assert_eq!(view.filtered.len(), 3);
    }

    #[test]
    fn flag_feeds_criteria_and_search_only_narrows_display() {
        let mut view = loaded_san();
        view.set_flag_mode(FlagMode::Exclude);
        assert_eq!(view.filtered.len(), 2);
        view.set_search("b777".into());
        assert_eq!(view.filtered.len(), 2);
        assert_eq!(view.displayed.len(), 1);
        let criteria = view.criteria();
        assert_eq!(criteria.search_term(), None);
        assert_eq!(criteria.flag.unwrap().mode, FlagMode::Exclude);
    }

    #[test]
    fn search_survives_a_selection_change() {
        let mut view = loaded_san();
        view.set_search("a320".into());
        assert_eq!(view.displayed.len(), 2);
        view.toggle_filter_value("YEARS", &CellValue::Integer(2023));
        assert_eq!(view.filtered.len(), 2);
        assert_eq!(view.displayed.len(), 1);
        view.set_search(String::new());
        assert_eq!(view.displayed, view.filtered);
    }

    #[test]
    fn missing_columns_are_reported_not_fatal() {
        let mut view = DatasetView::new(DatasetSchema::system_alerts());
        view.set_table(table(&["YEARS", "ATA"], vec![vec![CellValue::Integer(2024), CellValue::Integer(21)]]));
        let msg = view.status_message.clone().unwrap();
        assert!(msg.contains("ETOPS"), "{msg}");
        assert!(msg.contains("MONTH"), "{msg}");
        assert_eq!(view.filtered.len(), 1);
    }

    #[test]
    fn part_details_follow_selection() {
        let mut view = DatasetView::new(DatasetSchema::component_alerts());
        view.set_table(table(
            &["YEAR", "P/N", "ATA"],
            vec![
                vec![CellValue::Integer(2024), s("PN-1"), CellValue::Integer(21)],
                vec![CellValue::Integer(2024), s("PN-2"), CellValue::Integer(21)],
                vec![CellValue::Integer(2024), s("PN-1"), CellValue::Integer(32)],
            ],
        ));
        assert!(view.part_details().unwrap().is_none());
        view.selected_part = Some(s("PN-1"));
        assert_eq!(view.part_details().unwrap().unwrap().len(), 2);
    }

    #[test]
    fn missing_file_leaves_view_empty_with_message() {
        let mut schema = DatasetSchema::component_alerts();
        schema.path = "no/such/CAN.xlsx".into();
        let mut state = AppState::new(
            DashboardConfig {
                datasets: vec![schema],
                ..Default::default()
            },
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        );
        state.select_module(ModuleChoice::Dataset(0));
        let view = state.active_view().unwrap();
        assert!(!view.is_loaded());
        assert!(view.status_message.as_deref().unwrap().starts_with("Error"));
        assert_eq!(state.module_label(), "CAN - Component Alert Notice");
    }
}
