use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use eframe::egui::{Color32, Pos2, RichText, Sense, Shape, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, GridMark, Plot};

use crate::color::sequential_palette;

const PLOT_HEIGHT: f32 = 280.0;

/// Pie arcs are drawn in 64 segments per turn.
const ARC_STEP: f32 = TAU / 64.0;
const WEDGE_STEPS: usize = 16;

/// Labels and values of one chart, already sorted and truncated.
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Text shown on hover and beside pie slices.
    pub value_text: Vec<String>,
}

impl Series {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Axis formatter that maps bar positions back to category labels.
fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

/// One bar per value, placed at `position(i)` on the category axis.
fn bars(series: &Series, color: Color32, position: impl Fn(usize) -> f64) -> Vec<Bar> {
    series
        .values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            Bar::new(position(i), if v.is_nan() { 0.0 } else { v })
                .name(format!("{}: {}", series.labels[i], series.value_text[i]))
                .width(0.7)
                .fill(color)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// Vertical bars, categories left to right in series order.
pub fn bar_chart(ui: &mut Ui, id: &str, series: &Series, value_label: &str, color: Color32) {
    let chart = BarChart::new(bars(series, color, |i| i as f64))
        .name(value_label)
        .color(color);

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .y_axis_label(value_label)
        .x_axis_formatter(category_formatter(series.labels.clone()))
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Horizontal bars with the first category at the top.
pub fn horizontal_bar_chart(
    ui: &mut Ui,
    id: &str,
    series: &Series,
    value_label: &str,
    color: Color32,
) {
    // Plot y grows upwards, so reverse positions to keep series order top-down.
    let n = series.labels.len();
    let reversed: Vec<String> = series.labels.iter().rev().cloned().collect();
    let chart = BarChart::new(bars(series, color, |i| (n - 1 - i) as f64))
        .horizontal()
        .name(value_label)
        .color(color);

    Plot::new(id)
        .height(PLOT_HEIGHT.max(24.0 * n as f32))
        .x_axis_label(value_label)
        .y_axis_formatter(category_formatter(reversed))
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------

/// Start and end angle (radians, clockwise from 12 o'clock) and share of each value.
pub fn pie_slices(values: &[f64]) -> Vec<(f32, f32, f64)> {
    let total: f64 = values.iter().filter(|v| v.is_finite() && **v > 0.0).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut start = 0.0f32;
    values
        .iter()
        .map(|&v| {
            let share = if v.is_finite() && v > 0.0 { v / total } else { 0.0 };
            let end = start + share as f32 * TAU;
            let slice = (start, end, share);
            start = end;
            slice
        })
        .collect()
}

fn point_on_circle(center: Pos2, radius: f32, angle: f32) -> Pos2 {
    center + Vec2::new(angle.sin(), -angle.cos()) * radius
}

/// Pie with a legend of label, percent and value.
pub fn pie_chart(ui: &mut Ui, series: &Series) {
    let slices = pie_slices(&series.values);
    if slices.is_empty() {
        ui.label("No data available to display the Pie Chart.");
        return;
    }
    let colors = sequential_palette(slices.len());

    ui.horizontal(|ui: &mut Ui| {
        let size = Vec2::splat(PLOT_HEIGHT);
        let (response, painter) = ui.allocate_painter(size, Sense::hover());
        let center = response.rect.center();
        let radius = size.x * 0.45;

        for (&(start, end, _), color) in slices.iter().zip(&colors) {
            if end <= start {
                continue;
            }
            let steps = ((end - start) / ARC_STEP).ceil().max(1.0) as usize;
            let arc: Vec<Pos2> = (0..=steps)
                .map(|k| {
                    let angle = start + (end - start) * k as f32 / steps as f32;
                    point_on_circle(center, radius, angle)
                })
                .collect();
            // Convex wedges of at most a quarter turn each.
            let mut k = 0;
            while k < steps {
                let next = (k + WEDGE_STEPS).min(steps);
                let mut wedge = vec![center];
                wedge.extend_from_slice(&arc[k..=next]);
                painter.add(Shape::convex_polygon(wedge, *color, Stroke::NONE));
                k = next;
            }
        }

        ui.vertical(|ui: &mut Ui| {
            for (i, (_, _, share)) in slices.iter().enumerate() {
                ui.horizontal(|ui: &mut Ui| {
                    let (swatch, _) = ui.allocate_exact_size(Vec2::splat(12.0), Sense::hover());
                    ui.painter().rect_filled(swatch, 2.0, colors[i]);
                    ui.label(RichText::new(format!(
                        "{}  {:.1}%  ({})",
                        series.labels[i],
                        share * 100.0,
                        series.value_text[i]
                    )));
                });
            }
        });
    });
}

/// Section heading used above every chart and summary table.
pub fn chart_heading(ui: &mut Ui, title: &str) {
    ui.add_space(8.0);
    ui.label(RichText::new(title).heading());
}

/// Shown in place of a chart with no groups to draw.
pub fn no_data(ui: &mut Ui) {
    ui.label(RichText::new("No data available to display this chart.").color(Color32::YELLOW));
}

/// Shown in place of a feature whose columns are absent.
pub fn warning(ui: &mut Ui, msg: &str) {
    ui.label(RichText::new(msg).color(Color32::from_rgb(0xff, 0xa5, 0x00)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_cover_the_full_turn() {
        let slices = pie_slices(&[8.0, 2.0]);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].0, 0.0);
        assert!((slices[1].1 - TAU).abs() < 1e-5);
        assert!((slices[0].2 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn zero_or_nan_values_get_no_area() {
        let slices = pie_slices(&[3.0, 0.0, f64::NAN]);
        assert_eq!(slices[1].2, 0.0);
        assert_eq!(slices[2].2, 0.0);
        assert!(pie_slices(&[0.0, 0.0]).is_empty());
        assert!(pie_slices(&[]).is_empty());
    }
}
