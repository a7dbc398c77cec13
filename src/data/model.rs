use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const COL_PROVINCE: &str = "province";
pub const COL_STATUS: &str = "booking_status";
pub const COL_DATE: &str = "booking_date";
pub const COL_PRICE: &str = "total_price";
pub const COL_USER: &str = "user_id";
pub const COL_NEW_CUSTOMER: &str = "is_new_customer";
pub const COL_NEW_PROFESSIONAL: &str = "is_new_professional";
pub const COL_PLACE_SIZE: &str = "place_size";
pub const COL_CANCEL_REASON: &str = "cancel_reason";

/// Every column a bookings file must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_PROVINCE,
    COL_STATUS,
    COL_DATE,
    COL_PRICE,
    COL_USER,
    COL_NEW_CUSTOMER,
    COL_NEW_PROFESSIONAL,
    COL_PLACE_SIZE,
    COL_CANCEL_REASON,
];

// ---------------------------------------------------------------------------
// Booking – one row of the bookings table
// ---------------------------------------------------------------------------

/// A single booking record with its schema already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub province: String,
    pub booking_status: String,
    pub booking_date: NaiveDateTime,
    pub total_price: f64,
    pub user_id: String,
    pub is_new_customer: bool,
    pub is_new_professional: bool,
    pub place_size: Option<String>,
    pub cancel_reason: Option<String>,
}

impl Booking {
    /// Calendar date of the booking (time of day dropped).
    pub fn date(&self) -> NaiveDate {
        self.booking_date.date()
    }

    /// Build a booking from raw cell text.
    ///
    /// `cell` returns the text of a column for this row, `None` for a null
    /// cell. Empty strings count as null.
    pub fn from_cells<F>(mut cell: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut required = |col: &str| -> Result<String> {
            non_empty(cell(col)).with_context(|| format!("'{col}' is empty"))
        };
        let province = required(COL_PROVINCE)?;
        let booking_status = required(COL_STATUS)?;
        let date_text = required(COL_DATE)?;
        let price_text = required(COL_PRICE)?;
        let user_id = required(COL_USER)?;

        // A missing flag reads as "not new".
        let mut flag = |col: &str| -> Result<bool> {
            non_empty(cell(col))
                .map(|text| parse_flag(&text))
                .transpose()
                .with_context(|| format!("'{col}'"))
                .map(|v| v.unwrap_or(false))
        };
        let is_new_customer = flag(COL_NEW_CUSTOMER)?;
        let is_new_professional = flag(COL_NEW_PROFESSIONAL)?;

        let booking_date = parse_timestamp(&date_text)?;
        let total_price = price_text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .with_context(|| format!("'{COL_PRICE}': '{price_text}' is not a finite number"))?;

        Ok(Booking {
            province,
            booking_status,
            booking_date,
            total_price,
            user_id,
            is_new_customer,
            is_new_professional,
            place_size: non_empty(cell(COL_PLACE_SIZE)),
            cancel_reason: non_empty(cell(COL_CANCEL_REASON)),
        })
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// Parse a booking timestamp.  Offsets are dropped, keeping local wall-clock
/// time; a bare date means midnight.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    const FORMATS: [&str; 5] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let s = s.trim();
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    bail!("'{COL_DATE}': '{s}' is not a timestamp")
}

/// Parse a 0/1 flag.  Pandas writes integer columns with NaNs as floats,
/// so `1.0` is accepted too.
pub fn parse_flag(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Ok(true),
        "0" | "0.0" | "false" => Ok(false),
        other => bail!("'{other}' is not a 0/1 flag"),
    }
}

// ---------------------------------------------------------------------------
// BookingTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// An ordered table of bookings.  Immutable once built; filtering produces
/// a new table.
#[derive(Debug, Clone, Default)]
pub struct BookingTable {
    rows: Vec<Booking>,
    /// Distinct provinces in first-seen order.
    provinces: Vec<String>,
    /// Distinct booking statuses in first-seen order.
    statuses: Vec<String>,
}

impl PartialEq for BookingTable {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
    }
}

impl BookingTable {
    /// Build the table and its category indices.
    pub fn from_rows(rows: Vec<Booking>) -> Self {
        let mut provinces = Vec::new();
        let mut statuses = Vec::new();
        let mut seen_provinces = HashSet::new();
        let mut seen_statuses = HashSet::new();

        for row in &rows {
            if seen_provinces.insert(row.province.as_str()) {
                provinces.push(row.province.clone());
            }
            if seen_statuses.insert(row.booking_status.as_str()) {
                statuses.push(row.booking_status.clone());
            }
        }

        BookingTable {
            rows,
            provinces,
            statuses,
        }
    }

    pub fn rows(&self) -> &[Booking] {
        &self.rows
    }

    pub fn provinces(&self) -> &[String] {
        &self.provinces
    }

    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    /// First and last booking date, `None` for an empty table.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(Booking::date).min()?;
        let max = self.rows.iter().map(Booking::date).max()?;
        Some((min, max))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Test helper: a booking with sensible defaults.
    pub fn booking(province: &str, status: &str, date: &str, price: f64, user: &str) -> Booking {
        Booking {
            province: province.to_string(),
            booking_status: status.to_string(),
            booking_date: parse_timestamp(date).unwrap(),
            total_price: price,
            user_id: user.to_string(),
            is_new_customer: false,
            is_new_professional: false,
            place_size: None,
            cancel_reason: None,
        }
    }

    #[test]
    fn parses_supported_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-05 14:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-05T14:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-05 14:30").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-05T14:30:00+07:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-03-05").unwrap(),
            expected.date().and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("05/03/2024").is_err());
    }

    #[test]
    fn parses_flags() {
        assert!(parse_flag("1").unwrap());
        assert!(parse_flag("1.0").unwrap());
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("yes").is_err());
    }

    #[test]
    fn from_cells_treats_blank_optionals_as_null() {
        let cells = [
            (COL_PROVINCE, "Bangkok"),
            (COL_STATUS, "done"),
            (COL_DATE, "2024-01-01 09:00:00"),
            (COL_PRICE, "450.5"),
            (COL_USER, "u1"),
            (COL_NEW_CUSTOMER, "1"),
            (COL_NEW_PROFESSIONAL, "0"),
            (COL_PLACE_SIZE, "S"),
            (COL_CANCEL_REASON, "  "),
        ];
        let b = Booking::from_cells(|col| {
            cells
                .iter()
                .find(|(c, _)| *c == col)
                .map(|(_, v)| v.to_string())
        })
        .unwrap();
        assert_eq!(b.total_price, 450.5);
        assert!(b.is_new_customer);
        assert!(!b.is_new_professional);
        assert_eq!(b.place_size.as_deref(), Some("S"));
        assert_eq!(b.cancel_reason, None);
    }

    #[test]
    fn blank_flags_read_as_false() {
        let b = Booking::from_cells(|col| match col {
            COL_DATE => Some("2024-01-01 09:00:00".to_string()),
            COL_PRICE => Some("100".to_string()),
            COL_NEW_CUSTOMER => Some("1.0".to_string()),
            COL_NEW_PROFESSIONAL => Some(String::new()),
            COL_PLACE_SIZE | COL_CANCEL_REASON => None,
            _ => Some("x".to_string()),
        })
        .unwrap();
        assert!(b.is_new_customer);
        assert!(!b.is_new_professional);
    }

    #[test]
    fn non_finite_price_is_rejected() {
        for price in ["NaN", "inf", "-infinity"] {
            let err = Booking::from_cells(|col| match col {
                COL_DATE => Some("2024-01-01 09:00:00".to_string()),
                COL_PRICE => Some(price.to_string()),
                COL_NEW_CUSTOMER | COL_NEW_PROFESSIONAL => Some("0".to_string()),
                _ => Some("x".to_string()),
            })
            .unwrap_err();
            assert!(format!("{err:#}").contains(COL_PRICE), "{price}");
        }
    }

    #[test]
    fn from_cells_rejects_empty_required_column() {
        let err = Booking::from_cells(|col| {
            if col == COL_USER {
                None
            } else {
                Some("1".to_string())
            }
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains(COL_USER));
    }

    #[test]
    fn table_tracks_distinct_categories_and_span() {
        let table = BookingTable::from_rows(vec![
            booking("B", "done", "2024-02-10 10:00:00", 1.0, "u1"),
            booking("A", "cancelled", "2024-01-03 23:59:00", 1.0, "u2"),
            booking("B", "done", "2024-03-01 00:00:00", 1.0, "u1"),
        ]);
        assert_eq!(table.provinces(), ["B", "A"]);
        assert_eq!(table.statuses(), ["done", "cancelled"]);
        assert_eq!(
            table.date_span(),
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            ))
        );
        assert_eq!(BookingTable::default().date_span(), None);
    }
}
