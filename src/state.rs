use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::data::aggregate::{KpiSet, Summaries, summaries, summarize_top};
use crate::data::cache::TableCache;
use crate::data::filter::{DateRange, FilterSpec, apply};
use crate::data::model::BookingTable;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Selection – raw widget values, validated into a FilterSpec on render
// ---------------------------------------------------------------------------

/// Current sidebar widget values.  The date pickers are free to hold a
/// reversed range; it is rejected when rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub provinces: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Selection {
    /// Everything selected, date pickers spanning the observed dates.
    pub fn select_all(table: &BookingTable) -> Self {
        let (start, end) = table.date_span().unwrap_or_default();
        Selection {
            provinces: table.provinces().iter().cloned().collect(),
            statuses: table.statuses().iter().cloned().collect(),
            start,
            end,
        }
    }

    pub fn to_spec(&self) -> Result<FilterSpec, DashboardError> {
        Ok(FilterSpec {
            provinces: self.provinces.clone(),
            statuses: self.statuses.clone(),
            date_range: DateRange::new(self.start, self.end)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ViewModel – everything one frame of the dashboard shows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub filtered: BookingTable,
    pub kpis: KpiSet,
    pub summaries: Summaries,
    /// Rows in the unfiltered table.
    pub total_rows: usize,
}

/// Filter `table` by `selection` and aggregate the result.
pub fn render(
    table: &BookingTable,
    selection: &Selection,
    config: &DashboardConfig,
) -> Result<ViewModel, DashboardError> {
    let spec = selection.to_spec()?;
    let filtered = apply(table, &spec)?;
    let kpis = summarize_top(&filtered, &config.completed_status, config.top_cancel_reasons);
    let summaries = summaries(&filtered);
    Ok(ViewModel {
        filtered,
        kpis,
        summaries,
        total_rows: table.len(),
    })
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which categorical filter a widget drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Province,
    Status,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    pub cache: TableCache,

    /// Path of the open bookings file.
    pub data_path: Option<PathBuf>,

    /// Loaded table (None until a file loads).
    pub table: Option<Arc<BookingTable>>,

    /// Sidebar filter values.
    pub selection: Selection,

    /// Result of the last successful render.
    pub view: Option<ViewModel>,

    /// Shown next to the date pickers while the range is reversed.
    pub range_error: Option<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: TableCache::new(),
            data_path: None,
            table: None,
            selection: Selection::default(),
            view: None,
            range_error: None,
            status_message: None,
        }
    }

    /// Load `path` (through the cache) and reset the filters.
    pub fn open(&mut self, path: PathBuf) {
        match self.cache.load(&path) {
            Ok(table) => {
                log::debug!("Table cache: {:?}", self.cache.stats());
                self.data_path = Some(path);
                self.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load file: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Drop the cached copy of the current file and read it again.
    pub fn reload(&mut self) {
        if let Some(path) = self.data_path.clone() {
            self.cache.invalidate(&path);
            self.open(path);
        }
    }

    /// Ingest a newly loaded table, select everything and render.
    pub fn set_table(&mut self, table: Arc<BookingTable>) {
        self.selection = Selection::select_all(&table);
        self.table = Some(table);
        self.status_message = None;
        self.refresh();
    }

    /// Recompute the view after a selection change.
    pub fn refresh(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        match render(table, &self.selection, &self.config) {
            Ok(view) => {
                self.view = Some(view);
                self.range_error = None;
            }
            Err(e) => {
                log::debug!("Render rejected: {e}");
                self.view = None;
                self.range_error = Some(e.to_string());
            }
        }
    }

    fn selected_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::Province => &mut self.selection.provinces,
            Category::Status => &mut self.selection.statuses,
        }
    }

    /// Toggle a single value in a category filter.
    pub fn toggle(&mut self, category: Category, value: &str) {
        let selected = self.selected_mut(category);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refresh();
    }

    /// Select all values of a category.
    pub fn select_all(&mut self, category: Category) {
        let Some(table) = &self.table else {
            return;
        };
        let all: BTreeSet<String> = match category {
            Category::Province => table.provinces().iter().cloned().collect(),
            Category::Status => table.statuses().iter().cloned().collect(),
        };
        *self.selected_mut(category) = all;
        self.refresh();
    }

    /// Deselect all values of a category.
    pub fn select_none(&mut self, category: Category) {
        self.selected_mut(category).clear();
        self.refresh();
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.selection.start = start;
        self.selection.end = end;
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::booking;

    fn config() -> DashboardConfig {
        DashboardConfig {
            completed_status: "done".to_string(),
            ..DashboardConfig::default()
        }
    }

    fn table() -> Arc<BookingTable> {
        Arc::new(BookingTable::from_rows(vec![
            booking("Bangkok", "done", "2024-01-01 08:00:00", 100.0, "u1"),
            booking("Phuket", "cancelled", "2024-01-15 13:00:00", 50.0, "u2"),
            booking("Bangkok", "done", "2024-02-01 09:30:00", 200.0, "u1"),
        ]))
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn render_with_everything_selected_covers_the_table() {
        let table = table();
        let view = render(&table, &Selection::select_all(&table), &config()).unwrap();
        assert_eq!(view.filtered, *table);
        assert_eq!(view.total_rows, 3);
        assert_eq!(view.kpis.total_bookings, 3);
        assert_eq!(view.kpis.conversion_rate, 66.67);
        assert_eq!(view.summaries.by_hour[8], 1);
    }

    #[test]
    fn render_rejects_reversed_range() {
        let table = table();
        let mut selection = Selection::select_all(&table);
        selection.start = date("2024-06-01");
        selection.end = date("2024-01-01");
        assert!(matches!(
            render(&table, &selection, &config()),
            Err(DashboardError::InvalidRange { .. })
        ));
    }

    #[test]
    fn toggles_refresh_the_view() {
        let mut state = AppState::new(config());
        state.set_table(table());
        assert_eq!(state.view.as_ref().unwrap().kpis.total_bookings, 3);

        state.toggle(Category::Province, "Phuket");
        let kpis = &state.view.as_ref().unwrap().kpis;
        assert_eq!(kpis.total_bookings, 2);
        assert_eq!(kpis.cancellations, 0);

        state.select_none(Category::Status);
        let kpis = &state.view.as_ref().unwrap().kpis;
        assert_eq!(kpis.total_bookings, 0);
        assert_eq!(kpis.conversion_rate, 0.0);
        assert_eq!(kpis.avg_booking_value, 0.0);

        state.select_all(Category::Status);
        state.toggle(Category::Province, "Phuket");
        assert_eq!(state.view.as_ref().unwrap().kpis.total_bookings, 3);
    }

    #[test]
    fn reversed_dates_clear_the_view_until_fixed() {
        let mut state = AppState::new(config());
        state.set_table(table());

        state.set_date_range(date("2024-02-01"), date("2024-01-01"));
        assert!(state.view.is_none());
        assert!(state.range_error.is_some());

        state.set_date_range(date("2024-01-01"), date("2024-01-31"));
        assert!(state.range_error.is_none());
        assert_eq!(state.view.as_ref().unwrap().kpis.total_bookings, 2);
    }

    #[test]
    fn open_reports_load_errors_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(config());
        state.open(dir.path().join("missing.csv"));
        assert!(state.table.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error"));
    }
}
