use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, DatePickerButton, TableBuilder};

use crate::data::aggregate::{KpiSet, format_reasons, format_thousands};
use crate::data::model::BookingTable;
use crate::state::{AppState, Category};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🔎 Filters");
    ui.separator();

    // The Arc keeps the category lists alive while `state` is mutated.
    let Some(table) = state.table.clone() else {
        ui.label("No bookings loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            category_filter(ui, state, Category::Province, "Province", table.provinces());
            category_filter(ui, state, Category::Status, "Booking Status", table.statuses());
            ui.separator();
            date_filter(ui, state);
        });
}

/// Multi-select checkbox list for one categorical column.
fn category_filter(
    ui: &mut Ui,
    state: &mut AppState,
    category: Category,
    title: &str,
    values: &[String],
) {
    let n_selected = match category {
        Category::Province => state.selection.provinces.len(),
        Category::Status => state.selection.statuses.len(),
    };
    let header_text = format!("{title}  ({n_selected}/{})", values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(category);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(category);
                }
            });

            for value in values {
                let mut checked = match category {
                    Category::Province => state.selection.provinces.contains(value),
                    Category::Status => state.selection.statuses.contains(value),
                };
                if ui.checkbox(&mut checked, value.as_str()).changed() {
                    state.toggle(category, value);
                }
            }
        });
}

/// From / to date pickers.  A reversed range is reported, not clamped.
fn date_filter(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Booking Date Range");

    let mut start = state.selection.start;
    let mut end = state.selection.end;
    let mut changed = false;

    ui.horizontal(|ui: &mut Ui| {
        ui.label("From");
        changed |= ui
            .push_id("date_from", |ui: &mut Ui| ui.add(DatePickerButton::new(&mut start)))
            .inner
            .changed();
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("To");
        changed |= ui
            .push_id("date_to", |ui: &mut Ui| ui.add(DatePickerButton::new(&mut end)))
            .inner
            .changed();
    });

    if changed {
        state.set_date_range(start, end);
    }
    if let Some(err) = &state.range_error {
        ui.colored_label(Color32::RED, err.as_str());
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.data_path.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(view) = &state.view {
            ui.label(format!(
                "{} bookings loaded, {} shown",
                view.total_rows,
                view.filtered.len()
            ));
        } else if let Some(table) = &state.table {
            ui.label(format!("{} bookings loaded", table.len()));
        }

        if let Some(path) = &state.data_path {
            ui.separator();
            ui.weak(path.display().to_string());
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open bookings")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open(path);
    }
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

/// Three columns of metric cards.
pub fn kpi_cards(ui: &mut Ui, kpis: &KpiSet) {
    let reasons = if kpis.top_cancel_reasons.is_empty() {
        "–".to_string()
    } else {
        format_reasons(&kpis.top_cancel_reasons)
    };

    ui.columns(3, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total Bookings", kpis.total_bookings.to_string());
        metric(&mut cols[0], "Revenue (฿)", format_thousands(kpis.revenue, 0));
        metric(
            &mut cols[0],
            "Average Booking Value (฿)",
            format_thousands(kpis.avg_booking_value, 2),
        );

        metric(&mut cols[1], "New Customers", kpis.new_customers.to_string());
        metric(
            &mut cols[1],
            "Conversion Rate (%)",
            format!("{:.2}%", kpis.conversion_rate),
        );
        metric(
            &mut cols[1],
            "Repeat Customer Rate (%)",
            format!("{:.2}%", kpis.repeat_customer_rate),
        );

        metric(&mut cols[2], "Cancellations", kpis.cancellations.to_string());
        metric(&mut cols[2], "Top Cancel Reasons", reasons);
        metric(
            &mut cols[2],
            "Customer Churn (%)",
            format!("{:.2}%", kpis.churn_rate),
        );
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(RichText::new(label).small().weak());
        ui.label(RichText::new(value).heading());
    });
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

const ROW_HEIGHT: f32 = 18.0;

/// First `limit` rows of the cancel reason counts.
pub fn top_reasons_table(ui: &mut Ui, reasons: &[(String, usize)], limit: usize) {
    ui.push_id("top_reasons_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(240.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong("Reason");
                });
                header.col(|ui: &mut Ui| {
                    ui.strong("Count");
                });
            })
            .body(|mut body| {
                for (reason, count) in reasons.iter().take(limit) {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.label(reason.as_str());
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(count.to_string());
                        });
                    });
                }
            });
    });
}

/// The filtered bookings, virtualised.
pub fn bookings_table(ui: &mut Ui, table: &BookingTable) {
    const HEADERS: [&str; 7] = [
        "Booking Date",
        "Province",
        "Status",
        "Total Price",
        "User",
        "Place Size",
        "Cancel Reason",
    ];

    ui.push_id("bookings_table", |ui: &mut Ui| {
        let mut builder = TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(320.0);
        for _ in 0..HEADERS.len() - 1 {
            builder = builder.column(Column::auto().at_least(70.0));
        }
        builder
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in HEADERS {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                let rows = table.rows();
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let b = &rows[row.index()];
                    let cells = [
                        b.booking_date.format("%Y-%m-%d %H:%M").to_string(),
                        b.province.clone(),
                        b.booking_status.clone(),
                        format_thousands(b.total_price, 2),
                        b.user_id.clone(),
                        b.place_size.clone().unwrap_or_default(),
                        b.cancel_reason.clone().unwrap_or_default(),
                    ];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}
