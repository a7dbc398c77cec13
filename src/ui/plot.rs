use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Plot};

use crate::color::CategoryColors;
use crate::data::aggregate::{MonthlyGain, Summaries};
use crate::state::AppState;
use crate::ui::panels;

const CHART_HEIGHT: f32 = 240.0;
const CUSTOMER_BLUE: Color32 = Color32::from_rgb(0x36, 0xa2, 0xeb);
const PROFESSIONAL_PINK: Color32 = Color32::from_rgb(0xff, 0x63, 0x84);

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render KPI cards, charts and tables for the current view.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    ui.heading("Booking Dashboard");

    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            if state.table.is_some() {
                ui.heading("Fix the booking date range to see results");
            } else {
                ui.heading("Open a bookings file  (File → Open…)");
            }
        });
        return;
    };

    panels::kpi_cards(ui, &view.kpis);
    ui.separator();

    charts(ui, &view.summaries);

    ui.heading("🛑 Top Cancel Reasons");
    panels::top_reasons_table(
        ui,
        &view.summaries.by_cancel_reason,
        state.config.cancel_table_rows,
    );
    ui.separator();

    ui.heading("📋 Filtered Bookings");
    panels::bookings_table(ui, &view.filtered);
}

fn charts(ui: &mut Ui, summaries: &Summaries) {
    ui.heading("📊 Bookings by Hour");
    let hours: Vec<(String, f64)> = summaries
        .by_hour
        .iter()
        .enumerate()
        .map(|(h, &n)| (h.to_string(), n as f64))
        .collect();
    labelled_bar_chart(ui, "hour_chart", "Hour of Day", "Number of Bookings", &hours, |_| {
        Color32::LIGHT_BLUE
    });

    ui.heading("🌲 Booking Distribution by Place Size");
    category_chart(ui, "place_size_chart", "Place Size", &summaries.by_place_size);

    ui.heading("🥧 Cancellation Reasons");
    category_chart(ui, "cancel_reason_chart", "Reason", &summaries.by_cancel_reason);

    ui.heading("📈 Monthly New Customers");
    let customers = monthly_points(&summaries.by_month, |m| m.new_customers);
    labelled_bar_chart(ui, "monthly_customers", "Month", "New Customers", &customers, |_| {
        CUSTOMER_BLUE
    });

    ui.heading("👷 Monthly New Professionals");
    let professionals = monthly_points(&summaries.by_month, |m| m.new_professionals);
    labelled_bar_chart(
        ui,
        "monthly_professionals",
        "Month",
        "New Professionals",
        &professionals,
        |_| PROFESSIONAL_PINK,
    );
}

/// Counts per category, one colour per category.
fn category_chart(ui: &mut Ui, id: &str, x_label: &str, counts: &[(String, usize)]) {
    let colors = CategoryColors::new(counts.iter().map(|(label, _)| label.as_str()));
    let points: Vec<(String, f64)> = counts
        .iter()
        .map(|(label, n)| (label.clone(), *n as f64))
        .collect();
    labelled_bar_chart(ui, id, x_label, "Count", &points, |i| {
        colors.color_for(&points[i].0)
    });
}

fn monthly_points(months: &[MonthlyGain], value: impl Fn(&MonthlyGain) -> u64) -> Vec<(String, f64)> {
    months
        .iter()
        .map(|m| (m.month.to_string(), value(m) as f64))
        .collect()
}

/// Bar chart with one bar per `(label, value)` at x = 0, 1, 2, …, the x axis
/// showing the labels.
fn labelled_bar_chart(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    y_label: &str,
    points: &[(String, f64)],
    color_for: impl Fn(usize) -> Color32,
) {
    let bars: Vec<Bar> = points
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            Bar::new(i as f64, *value)
                .width(0.8)
                .name(label)
                .fill(color_for(i))
        })
        .collect();

    let labels: Vec<String> = points.iter().map(|(label, _)| label.clone()).collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .x_axis_formatter(move |mark: GridMark, _range| axis_label(&labels, mark.value))
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// Label for an x-axis grid mark; only whole positions carry a label.
fn axis_label(labels: &[String], value: f64) -> String {
    let pos = value.round();
    if (value - pos).abs() > 1e-6 || pos < 0.0 {
        return String::new();
    }
    labels.get(pos as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_labels_only_on_whole_positions() {
        let labels = vec!["S".to_string(), "M".to_string()];
        assert_eq!(axis_label(&labels, 0.0), "S");
        assert_eq!(axis_label(&labels, 1.0), "M");
        assert_eq!(axis_label(&labels, 0.5), "");
        assert_eq!(axis_label(&labels, 2.0), "");
        assert_eq!(axis_label(&labels, -1.0), "");
    }
}
