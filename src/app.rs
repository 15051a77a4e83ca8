use eframe::egui;

use crate::state::{AppState, ModuleChoice};
use crate::ui::{dashboard, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct FleetReliabilityApp {
    pub state: AppState,
}

impl FleetReliabilityApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for FleetReliabilityApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: letterhead and module selector ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: credits ----
        if !self.state.config.credits.is_empty() {
            egui::TopBottomPanel::bottom("credits").show(ctx, |ui| {
                panels::credits(ui, &self.state.config.credits);
            });
        }

        // ---- Left side panel: filters ----
        if let Some(view) = self.state.active_view_mut() {
            egui::SidePanel::left("filter_panel")
                .default_width(240.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, view);
                });
        }

        // ---- Central panel: dashboard ----
        let state = &mut self.state;
        egui::CentralPanel::default().show(ctx, |ui| match state.module {
            ModuleChoice::Dataset(i) => {
                let letterhead = &state.config.letterhead;
                let today = state.today;
                if let Some(view) = state.views.get_mut(i) {
                    if let Some(msg) = dashboard::central_panel(ui, view, letterhead, today) {
                        state.status_message = Some(msg);
                    }
                }
            }
            ModuleChoice::Placeholder(i) => {
                let name = state.config.placeholders.get(i).cloned().unwrap_or_default();
                panels::placeholder(ui, &name);
            }
            ModuleChoice::None => panels::welcome(ui),
        });
    }
}
