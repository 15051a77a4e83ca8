use chrono::NaiveDate;
use eframe::egui::{self, RichText, ScrollArea, Ui};

use super::{export, plot, table};
use crate::color::chart_color;
use crate::config::{ChartKind, ChartSource, ChartSpec, DatasetSchema, ThresholdPair};
use crate::data::aggregate::{aggregate, value_counts, AggregateSpec, SortOrder, TopN};
use crate::data::model::{CellValue, Table};
use crate::data::threshold::{
    count_exceeding, exceedance_by_group, rank_exceedance, RankBy, ThresholdColumns,
};
use crate::error::{DashboardError, Result};
use crate::report::{ExportFormat, Letterhead};
use crate::state::{ChartControls, DatasetView};

// ---------------------------------------------------------------------------
// View models
// ---------------------------------------------------------------------------

fn threshold_pair(schema: &DatasetSchema) -> Result<&ThresholdPair> {
    schema.threshold.as_ref().ok_or_else(|| DashboardError::Schema {
        dataset: schema.code.clone(),
        reason: "no value/threshold columns configured".into(),
    })
}

/// Group, rank and truncate `table` for one chart.
pub fn chart_series(
    table: &Table,
    schema: &DatasetSchema,
    chart: &ChartSpec,
    controls: ChartControls,
) -> Result<plot::Series> {
    let order = chart.fixed_order.unwrap_or(controls.order);
    match &chart.source {
        ChartSource::Aggregate(metric) => {
            let rows = aggregate(
                table,
                &AggregateSpec {
                    group_by: schema.group_by.clone(),
                    metric: metric.clone(),
                    order,
                    limit: controls.limit,
                },
            )?;
            Ok(plot::Series {
                labels: rows.iter().map(|r| r.key.to_string()).collect(),
                values: rows.iter().map(|r| r.value).collect(),
                value_text: rows.iter().map(|r| metric.format_value(r.value)).collect(),
            })
        }
        ChartSource::Exceedance => {
            let pair = threshold_pair(schema)?;
            let rows: Vec<_> =
                exceedance_by_group(table, &schema.group_by, &pair.value, &pair.threshold)?
                    .into_iter()
                    .filter(|r| r.exceed_count > 0)
                    .collect();
            let rows = rank_exceedance(rows, RankBy::Count, order, controls.limit);
            Ok(plot::Series {
                labels: rows.iter().map(|r| r.key.to_string()).collect(),
                values: rows.iter().map(|r| r.exceed_count as f64).collect(),
                value_text: rows.iter().map(|r| r.exceed_count.to_string()).collect(),
            })
        }
    }
}

/// Rows of the "% exceeding per group" table: group, total, exceed count, percent.
///
/// With a top-N limit the rows are ranked by percentage; otherwise they
/// stay in group order.
pub fn exceedance_table_rows(
    table: &Table,
    schema: &DatasetSchema,
    limit: TopN,
) -> Result<Vec<Vec<String>>> {
    let pair = threshold_pair(schema)?;
    let mut rows = exceedance_by_group(table, &schema.group_by, &pair.value, &pair.threshold)?;
    if limit != TopN::All {
        rows = rank_exceedance(rows, RankBy::Percentage, SortOrder::Descending, limit);
    }
    Ok(rows
        .into_iter()
        .map(|r| {
            vec![
                r.key.to_string(),
                r.total.to_string(),
                r.exceed_count.to_string(),
                format!("{:.2}", r.percentage),
            ]
        })
        .collect())
}

/// Record count per part number, narrowed by a case-insensitive search.
pub fn part_count_rows(
    table: &Table,
    part_column: &str,
    search: &str,
) -> Result<Vec<(CellValue, usize)>> {
    let needle = search.trim().to_lowercase();
    Ok(value_counts(table, part_column)?
        .into_iter()
        .filter(|(part, _)| {
            needle.is_empty() || part.search_text().to_lowercase().contains(&needle)
        })
        .collect())
}

/// Parts with at least one record over its threshold, most exceedances first.
pub fn parts_exceeding_rows(
    table: &Table,
    part_column: &str,
    pair: &ThresholdPair,
) -> Result<Vec<Vec<String>>> {
    let rows: Vec<_> = exceedance_by_group(table, part_column, &pair.value, &pair.threshold)?
        .into_iter()
        .filter(|r| r.exceed_count > 0)
        .collect();
    Ok(rank_exceedance(rows, RankBy::Count, SortOrder::Descending, TopN::All)
        .into_iter()
        .map(|r| vec![r.key.to_string(), r.exceed_count.to_string()])
        .collect())
}

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the whole dashboard for one dataset. Returns a status message
/// when an export finished or failed.
pub fn central_panel(
    ui: &mut Ui,
    view: &mut DatasetView,
    letterhead: &Letterhead,
    today: NaiveDate,
) -> Option<String> {
    let mut status = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(format!("{} Dashboard", view.schema.module_label()));
            if let Some(msg) = &view.status_message {
                plot::warning(ui, msg);
            }
            if !view.is_loaded() {
                return;
            }

            data_section(ui, view);
            if view.schema.part_column.is_some() {
                part_sections(ui, view);
            }

            ui.separator();
            ui.label(RichText::new("Visual Analytics").heading().strong());
            charts_section(ui, view);
            if view.schema.exceedance_table {
                exceedance_section(ui, view);
            }

            ui.separator();
            ui.label(RichText::new("Export Report").heading().strong());
            ui.horizontal(|ui: &mut Ui| {
                for format in ExportFormat::ALL {
                    if ui.button(format.button_label()).clicked() {
                        status = Some(export::run(format, view, letterhead, today));
                    }
                }
            });
        });

    status
}

fn data_section(ui: &mut Ui, view: &mut DatasetView) {
    ui.label(RichText::new(format!("Filtered {} Data", view.schema.code)).strong());

    let mut search = view.search.clone();
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Search inside table (by any keyword):");
        ui.text_edit_singleline(&mut search);
    });
    if search != view.search {
        view.set_search(search);
    }

    let highlight = view
        .schema
        .threshold
        .as_ref()
        .and_then(|p| ThresholdColumns::resolve(&view.displayed, &p.value, &p.threshold).ok());
    table::data_table(ui, "filtered_table", &view.displayed, highlight, 320.0);

    ui.label(format!(
        "Total {} Entries (after filter): {}",
        view.schema.code,
        view.displayed.len()
    ));
    if let Some(pair) = &view.schema.threshold {
        if let Ok(n) = count_exceeding(&view.filtered, &pair.value, &pair.threshold) {
            ui.label(format!("{} > {}: {n}", pair.value, pair.threshold));
        }
    }
}

fn part_sections(ui: &mut Ui, view: &mut DatasetView) {
    let Some(part_column) = view.schema.part_column.clone() else {
        return;
    };

    plot::chart_heading(ui, &format!("Count of {} per Part Number", view.schema.code));
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Search by Part Number:");
        ui.text_edit_singleline(&mut view.part_search);
    });

    match part_count_rows(&view.filtered, &part_column, &view.part_search) {
        Ok(parts) => {
            let rows: Vec<Vec<String>> = parts
                .iter()
                .map(|(p, n)| vec![p.to_string(), n.to_string()])
                .collect();
            let count_header = format!("No. of {}", view.schema.code);
            table::summary_table(ui, "part_counts", &["Part Number", count_header.as_str()], &rows);

            if !parts.is_empty() {
                let selected_text = view
                    .selected_part
                    .as_ref()
                    .map_or_else(|| "-- Select --".to_string(), |p| p.to_string());
                egui::ComboBox::from_id_salt("part_select")
                    .selected_text(selected_text)
                    .show_ui(ui, |ui: &mut Ui| {
                        ui.selectable_value(&mut view.selected_part, None, "-- Select --");
                        for (part, _) in &parts {
                            ui.selectable_value(
                                &mut view.selected_part,
                                Some(part.clone()),
                                part.to_string(),
                            );
                        }
                    });
            }
        }
        Err(e) => plot::warning(ui, &e.to_string()),
    }

    match view.part_details() {
        Ok(Some(details)) => {
            if let Some(part) = &view.selected_part {
                plot::chart_heading(
                    ui,
                    &format!("{} Details for P/N: {part}", view.schema.code),
                );
            }
            table::data_table(ui, "part_details", &details, None, 220.0);
        }
        Ok(None) => {}
        Err(e) => plot::warning(ui, &e.to_string()),
    }

    if let Some(pair) = &view.schema.threshold {
        plot::chart_heading(ui, &format!("Parts Exceeding {}", pair.threshold));
        match parts_exceeding_rows(&view.filtered, &part_column, pair) {
            Ok(rows) => {
                table::summary_table(ui, "parts_exceeding", &["Part Number", "Exceed Count"], &rows)
            }
            Err(_) => plot::warning(
                ui,
                &format!("Columns '{}' or '{}' not found.", pair.value, pair.threshold),
            ),
        }
    }
}

fn charts_section(ui: &mut Ui, view: &mut DatasetView) {
    let charts = view.schema.charts.clone();
    for (i, chart) in charts.iter().enumerate() {
        plot::chart_heading(ui, &chart.title);

        let controls = &mut view.chart_controls[i];
        ui.horizontal(|ui: &mut Ui| {
            if chart.fixed_order.is_none() {
                egui::ComboBox::from_id_salt(("sort", i))
                    .selected_text(format!("Sort: {}", controls.order))
                    .show_ui(ui, |ui: &mut Ui| {
                        for order in SortOrder::ALL {
                            ui.selectable_value(&mut controls.order, order, order.to_string());
                        }
                    });
            }
            egui::ComboBox::from_id_salt(("top", i))
                .selected_text(format!("Show: {}", controls.limit))
                .show_ui(ui, |ui: &mut Ui| {
                    for limit in TopN::CHOICES {
                        ui.selectable_value(&mut controls.limit, limit, limit.to_string());
                    }
                });
        });
        let controls = *controls;

        let series = match chart_series(&view.filtered, &view.schema, chart, controls) {
            Ok(series) => series,
            Err(e) => {
                plot::warning(ui, &format!("Chart skipped: {e}"));
                continue;
            }
        };
        if series.is_empty() {
            plot::no_data(ui);
            continue;
        }

        let id = format!("{}_chart_{i}", view.schema.code);
        let color = chart_color(&chart.color);
        match chart.kind {
            ChartKind::Bar => plot::bar_chart(ui, &id, &series, &chart.value_label, color),
            ChartKind::HorizontalBar => {
                plot::horizontal_bar_chart(ui, &id, &series, &chart.value_label, color)
            }
            ChartKind::Pie => plot::pie_chart(ui, &series),
        }
    }
}

fn exceedance_section(ui: &mut Ui, view: &mut DatasetView) {
    plot::chart_heading(
        ui,
        &format!("% of Exceeding Alert Threshold per {}", view.schema.group_by),
    );
    egui::ComboBox::from_id_salt("exceedance_top")
        .selected_text(format!("Show: {}", view.exceedance_limit))
        .show_ui(ui, |ui: &mut Ui| {
            for limit in TopN::CHOICES {
                ui.selectable_value(&mut view.exceedance_limit, limit, limit.to_string());
            }
        });

    match exceedance_table_rows(&view.filtered, &view.schema, view.exceedance_limit) {
        Ok(rows) => {
            let total_header = format!("Total {}", view.schema.code);
            table::summary_table(
                ui,
                "exceedance_pct",
                &[view.schema.group_by.as_str(), total_header.as_str(), "Exceed Count", "Exceed %"],
                &rows,
            );
        }
        Err(e) => plot::warning(ui, &e.to_string()),
    }
}
