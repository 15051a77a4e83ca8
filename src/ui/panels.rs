use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::FlagMode;
use crate::report::date_line;
use crate::state::{AppState, DatasetView, ModuleChoice};

// ---------------------------------------------------------------------------
// Top bar – letterhead and module selector
// ---------------------------------------------------------------------------

/// Render the letterhead, module selector and status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    let letterhead = &state.config.letterhead;
    ui.add_space(4.0);
    ui.label(RichText::new(&letterhead.organization).size(20.0).strong());
    ui.label(RichText::new(&letterhead.directorate).strong());
    ui.label(RichText::new(&letterhead.department).strong());
    ui.label(date_line(state.today));
    ui.separator();

    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Fleet Reliability Dashboard");
        ui.separator();

        let mut choice = state.module;
        egui::ComboBox::from_id_salt("module_selector")
            .selected_text(state.module_label())
            .width(280.0)
            .show_ui(ui, |ui: &mut Ui| {
                ui.selectable_value(&mut choice, ModuleChoice::None, "-- Select --");
                for (i, view) in state.views.iter().enumerate() {
                    ui.selectable_value(
                        &mut choice,
                        ModuleChoice::Dataset(i),
                        view.schema.module_label(),
                    );
                }
                for (i, name) in state.config.placeholders.iter().enumerate() {
                    ui.selectable_value(&mut choice, ModuleChoice::Placeholder(i), name);
                }
            });
        if choice != state.module {
            state.select_module(choice);
        }

        if let Some(view) = state.active_view_mut() {
            if ui.button("Reload").clicked() {
                view.load();
            }
            if let Some(table) = &view.table {
                ui.label(format!(
                    "{} records loaded, {} after filter",
                    table.len(),
                    view.filtered.len()
                ));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(msg);
        }
    });
    ui.add_space(4.0);
}

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel for the active dataset.
pub fn side_panel(ui: &mut Ui, view: &mut DatasetView) {
    ui.heading("Filters");
    ui.separator();

    if !view.is_loaded() {
        ui.label("No dataset loaded.");
        return;
    }

    // Clone what we need so we can mutate the view inside the loop.
    let filters = view.schema.filters.clone();
    let options = view.options.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for f in &filters {
                let Some(all_values) = options.get(&f.column) else {
                    ui.label(
                        RichText::new(format!("Column '{}' not found", f.column))
                            .color(Color32::YELLOW),
                    );
                    continue;
                };

                // Show count of selected / total in the header
                let n_selected = view.selections.get(&f.column).map_or(0, |s| s.len());
                let header_text = format!("{}  ({n_selected}/{})", f.label, all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(&f.column)
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                view.select_all(&f.column);
                            }
                            if ui.small_button("None").clicked() {
                                view.select_none(&f.column);
                            }
                        });

                        for val in all_values {
                            let mut checked = view
                                .selections
                                .get(&f.column)
                                .is_some_and(|s| s.contains(val));
                            if ui.checkbox(&mut checked, val.to_string()).changed() {
                                view.toggle_filter_value(&f.column, val);
                            }
                        }
                    });
            }

            if let Some(flag) = view.schema.flag.clone() {
                ui.separator();
                ui.strong(format!("Include {flag}?"));
                let mut mode = view.flag_mode;
                egui::ComboBox::from_id_salt("flag_mode")
                    .selected_text(mode.label(&flag))
                    .show_ui(ui, |ui: &mut Ui| {
                        for m in FlagMode::ALL {
                            ui.selectable_value(&mut mode, m, m.label(&flag));
                        }
                    });
                if mode != view.flag_mode {
                    view.set_flag_mode(mode);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Placeholders and footer
// ---------------------------------------------------------------------------

pub fn placeholder(ui: &mut Ui, name: &str) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading(format!("Module {name} is under development."));
    });
}

pub fn welcome(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading("Select a module to view its dashboard");
    });
}

pub fn credits(ui: &mut Ui, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    ui.separator();
    ui.strong("Project Credits");
    for line in lines {
        ui.label(line);
    }
}
