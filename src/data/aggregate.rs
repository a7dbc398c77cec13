use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use chrono::{Datelike, Timelike};

use super::model::{Booking, BookingTable};

// ---------------------------------------------------------------------------
// KPI set
// ---------------------------------------------------------------------------

/// Number of entries in [`KpiSet::top_cancel_reasons`] by default.
pub const DEFAULT_TOP_REASONS: usize = 3;

/// Scalar KPIs for one table.  Rates are percentages rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSet {
    pub total_bookings: usize,
    pub revenue: f64,
    pub avg_booking_value: f64,
    pub new_customers: usize,
    pub conversion_rate: f64,
    pub repeat_customer_rate: f64,
    pub cancellations: usize,
    pub top_cancel_reasons: Vec<(String, usize)>,
    /// `100 - repeat_customer_rate`.  Not a true churn measure.
    pub churn_rate: f64,
}

/// Compute the KPI set.  Total: an empty table yields zeros.
///
/// `completed_status` is the status label of a fully completed booking;
/// every other status counts as a cancellation.
pub fn summarize(table: &BookingTable, completed_status: &str) -> KpiSet {
    summarize_top(table, completed_status, DEFAULT_TOP_REASONS)
}

/// [`summarize`] with a configurable number of top cancel reasons.
pub fn summarize_top(table: &BookingTable, completed_status: &str, top_n: usize) -> KpiSet {
    let rows = table.rows();
    let total_bookings = rows.len();

    let revenue: f64 = rows.iter().map(|r| r.total_price).sum();
    let avg_booking_value = if total_bookings == 0 {
        0.0
    } else {
        revenue / total_bookings as f64
    };

    let new_customers = rows
        .iter()
        .filter(|r| r.is_new_customer)
        .map(|r| r.user_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let completed = rows
        .iter()
        .filter(|r| r.booking_status == completed_status)
        .count();
    let cancellations = total_bookings - completed;

    // Occurrences of a user_id after its first appearance.
    let mut seen_users = HashSet::new();
    let mut repeat_occurrences = 0usize;
    for r in rows {
        if !seen_users.insert(r.user_id.as_str()) {
            repeat_occurrences += 1;
        }
    }

    let conversion_rate = percent(completed, total_bookings);
    let repeat_customer_rate = percent(repeat_occurrences, seen_users.len());
    let churn_rate = round2(100.0 - repeat_customer_rate);

    let mut top_cancel_reasons = value_counts(rows.iter().filter_map(|r| r.cancel_reason.as_deref()));
    top_cancel_reasons.truncate(top_n);

    KpiSet {
        total_bookings,
        revenue,
        avg_booking_value,
        new_customers,
        conversion_rate,
        repeat_customer_rate,
        cancellations,
        top_cancel_reasons,
        churn_rate,
    }
}

/// `100 * part / whole` rounded to 2 decimals, 0 when `whole` is 0.
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Count occurrences, most frequent first; ties keep first-seen order.
fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for v in values {
        match index.get(v) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(v, counts.len());
                counts.push((v.to_string(), 1));
            }
        }
    }
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

// ---------------------------------------------------------------------------
// Grouped summaries (chart inputs)
// ---------------------------------------------------------------------------

/// Calendar month bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(row: &Booking) -> Self {
        YearMonth {
            year: row.booking_date.year(),
            month: row.booking_date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyGain {
    pub month: YearMonth,
    pub new_customers: u64,
    pub new_professionals: u64,
}

/// The four grouped tables behind the dashboard charts.
#[derive(Debug, Clone, PartialEq)]
pub struct Summaries {
    /// Bookings per hour of day; always 24 entries, index == hour.
    pub by_hour: [u64; 24],
    pub by_place_size: Vec<(String, usize)>,
    pub by_cancel_reason: Vec<(String, usize)>,
    /// Chronological, gap-free between the first and last observed month.
    pub by_month: Vec<MonthlyGain>,
}

pub fn summaries(table: &BookingTable) -> Summaries {
    let rows = table.rows();
    Summaries {
        by_hour: bookings_by_hour(rows),
        by_place_size: value_counts(rows.iter().filter_map(|r| r.place_size.as_deref())),
        by_cancel_reason: value_counts(rows.iter().filter_map(|r| r.cancel_reason.as_deref())),
        by_month: monthly_gains(rows),
    }
}

fn bookings_by_hour(rows: &[Booking]) -> [u64; 24] {
    let mut hours = [0u64; 24];
    for r in rows {
        hours[r.booking_date.hour() as usize] += 1;
    }
    hours
}

fn monthly_gains(rows: &[Booking]) -> Vec<MonthlyGain> {
    let mut sums: BTreeMap<YearMonth, (u64, u64)> = BTreeMap::new();
    for r in rows {
        let entry = sums.entry(YearMonth::of(r)).or_default();
        entry.0 += u64::from(r.is_new_customer);
        entry.1 += u64::from(r.is_new_professional);
    }

    let (Some(&first), Some(&last)) = (sums.keys().next(), sums.keys().next_back()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut month = first;
    while month <= last {
        let (new_customers, new_professionals) = sums.get(&month).copied().unwrap_or_default();
        out.push(MonthlyGain {
            month,
            new_customers,
            new_professionals,
        });
        month = month.next();
    }
    out
}

// ---------------------------------------------------------------------------
// Display helpers for KPI cards
// ---------------------------------------------------------------------------

/// Group an integer part with commas: `1234567.891` → `"1,234,568"` for
/// zero decimals, `"1,234,567.89"` for two.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && text.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `"no-show (4), weather (2)"`.
pub fn format_reasons(reasons: &[(String, usize)]) -> String {
    reasons
        .iter()
        .map(|(reason, count)| format!("{reason} ({count})"))
        .collect::<Vec<_>>()
        .join(", ")
}
