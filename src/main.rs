use std::path::Path;

use eframe::egui;
use fleet_reliability::app::FleetReliabilityApp;
use fleet_reliability::config::{DashboardConfig, CONFIG_FILE};
use fleet_reliability::state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load_or_default(Path::new(CONFIG_FILE));
    let state = AppState::new(config, chrono::Local::now().date_naive());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Fleet Reliability Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(FleetReliabilityApp::new(state)))),
    )
}
