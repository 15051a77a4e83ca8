use eframe::egui::{Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{CellValue, Table};
use crate::data::threshold::ThresholdColumns;

const ROW_HEIGHT: f32 = 18.0;

/// Cell text as shown in tables; nulls render blank.
fn cell_text(cell: &CellValue) -> String {
    cell.search_text()
}

/// Render a loaded table. When `highlight` is given, the observed-value
/// cell of every row exceeding its threshold is drawn red and bold.
pub fn data_table(
    ui: &mut Ui,
    id: &str,
    table: &Table,
    highlight: Option<ThresholdColumns>,
    max_height: f32,
) {
    if table.columns.is_empty() {
        ui.label("No data available.");
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(max_height)
            .columns(Column::auto().at_least(60.0), table.columns.len())
            .header(20.0, |mut header| {
                for name in &table.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, table.len(), |mut row| {
                    let record = &table.rows[row.index()];
                    let exceeded = highlight.filter(|h| h.row_exceeds(record));
                    for (idx, _) in table.columns.iter().enumerate() {
                        let text = cell_text(record.get(idx));
                        row.col(|ui: &mut Ui| match exceeded {
                            Some(h) if h.value == idx => {
                                ui.label(RichText::new(text).color(Color32::RED).strong());
                            }
                            _ => {
                                ui.label(text);
                            }
                        });
                    }
                });
            });
    });

    if table.is_empty() {
        ui.label("No records match the current filters.");
    }
}

/// Render a small two-or-more column summary given as rows of strings.
pub fn summary_table(ui: &mut Ui, id: &str, headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        ui.label("No data available.");
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(220.0)
            .columns(Column::auto().at_least(90.0), headers.len())
            .header(20.0, |mut header| {
                for name in headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(*name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let cells = &rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}
