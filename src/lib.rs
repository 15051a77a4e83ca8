//! Fleet reliability dashboard for component and system alert sheets.
//!
//! Loading, filtering, aggregation, threshold analysis and report export
//! live in [`data`] and [`report`] and have no UI dependency; [`app`] and
//! [`ui`] render them with egui.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod state;
pub mod ui;
