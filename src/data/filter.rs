use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{Booking, BookingTable};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Filter predicate: selected categories and a calendar-date window
// ---------------------------------------------------------------------------

/// Inclusive calendar-date window.  `start <= end` always holds for values
/// built through [`DateRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DashboardError> {
        if start > end {
            return Err(DashboardError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The user's filter selection.
///
/// An empty `provinces` or `statuses` set selects nothing; it is not
/// "no filter".
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub provinces: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub date_range: DateRange,
}

impl FilterSpec {
    /// Spec selecting every row of `table`: all provinces, all statuses and
    /// the full observed date span.  `None` for an empty table.
    pub fn select_all(table: &BookingTable) -> Option<Self> {
        let (start, end) = table.date_span()?;
        Some(FilterSpec {
            provinces: table.provinces().iter().cloned().collect(),
            statuses: table.statuses().iter().cloned().collect(),
            date_range: DateRange { start, end },
        })
    }

    fn matches(&self, row: &Booking) -> bool {
        self.provinces.contains(&row.province)
            && self.statuses.contains(&row.booking_status)
            && self.date_range.contains(row.date())
    }
}

/// Return a new table with the rows of `table` passing `spec`, in their
/// original order.
pub fn apply(table: &BookingTable, spec: &FilterSpec) -> Result<BookingTable, DashboardError> {
    let DateRange { start, end } = spec.date_range;
    if start > end {
        return Err(DashboardError::InvalidRange { start, end });
    }

    let rows: Vec<Booking> = table
        .rows()
        .iter()
        .filter(|row| spec.matches(row))
        .cloned()
        .collect();

    log::debug!("Filter kept {} of {} bookings", rows.len(), table.len());
    Ok(BookingTable::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::booking;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> BookingTable {
        BookingTable::from_rows(vec![
            booking("Bangkok", "done", "2024-01-01 08:00:00", 100.0, "u1"),
            booking("Phuket", "cancelled", "2024-01-15 23:59:59", 50.0, "u2"),
            booking("Bangkok", "cancelled", "2024-02-01 00:00:00", 75.0, "u1"),
            booking("Chiang Mai", "done", "2024-03-10 12:00:00", 200.0, "u3"),
        ])
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn select_all_returns_the_table_unchanged() {
        let table = sample();
        let spec = FilterSpec::select_all(&table).unwrap();
        assert_eq!(apply(&table, &spec).unwrap(), table);
    }

    #[test]
    fn empty_category_sets_select_nothing() {
        let table = sample();
        let mut spec = FilterSpec::select_all(&table).unwrap();
        spec.provinces.clear();
        assert!(apply(&table, &spec).unwrap().is_empty());

        let mut spec = FilterSpec::select_all(&table).unwrap();
        spec.statuses.clear();
        assert!(apply(&table, &spec).unwrap().is_empty());
    }

    #[test]
    fn keeps_matching_rows_in_order() {
        let table = sample();
        let spec = FilterSpec {
            provinces: set(&["Bangkok", "Phuket"]),
            statuses: set(&["cancelled"]),
            date_range: DateRange::new(date("2024-01-01"), date("2024-12-31")).unwrap(),
        };
        let out = apply(&table, &spec).unwrap();
        let prices: Vec<f64> = out.rows().iter().map(|r| r.total_price).collect();
        assert_eq!(prices, vec![50.0, 75.0]);
        // input untouched
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn date_bounds_are_inclusive_at_day_granularity() {
        let table = sample();
        let mut spec = FilterSpec::select_all(&table).unwrap();
        spec.date_range = DateRange::new(date("2024-01-15"), date("2024-02-01")).unwrap();
        let out = apply(&table, &spec).unwrap();
        // 23:59:59 on the start day and midnight on the end day both count
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn apply_is_idempotent() {
        let table = sample();
        let spec = FilterSpec {
            provinces: set(&["Bangkok"]),
            statuses: set(&["done", "cancelled"]),
            date_range: DateRange::new(date("2024-01-01"), date("2024-01-31")).unwrap(),
        };
        let once = apply(&table, &spec).unwrap();
        let twice = apply(&once, &spec).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = DateRange::new(date("2024-06-01"), date("2024-01-01")).unwrap_err();
        assert_eq!(
            err,
            DashboardError::InvalidRange {
                start: date("2024-06-01"),
                end: date("2024-01-01"),
            }
        );
    }

    #[test]
    fn select_all_on_empty_table_is_none() {
        assert!(FilterSpec::select_all(&BookingTable::default()).is_none());
    }
}
