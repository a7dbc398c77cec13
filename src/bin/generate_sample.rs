use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const N_BOOKINGS: usize = 2_000;
const N_USERS: u64 = 900;

const PROVINCES: [&str; 5] = ["กรุงเทพมหานคร", "นนทบุรี", "ปทุมธานี", "สมุทรปราการ", "ชลบุรี"];
const COMPLETED: &str = "เสร็จสิ้น";
const OTHER_STATUSES: [&str; 2] = ["ยกเลิก", "ลูกค้าไม่อยู่"];
const PLACE_SIZES: [&str; 4] = ["S", "M", "L", "XL"];
const CANCEL_REASONS: [&str; 5] = [
    "Customer changed plans",
    "No professional available",
    "Price too high",
    "Booked by mistake",
    "Weather",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

#[derive(Debug, Serialize)]
struct SampleBooking {
    booking_id: i64,
    province: String,
    booking_status: String,
    booking_date: String,
    total_price: f64,
    user_id: String,
    is_new_customer: i64,
    is_new_professional: i64,
    place_size: String,
    cancel_reason: Option<String>,
}

fn generate(rng: &mut SimpleRng) -> Vec<SampleBooking> {
    let start: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let mut seen_users = std::collections::HashSet::new();

    (0..N_BOOKINGS)
        .map(|i| {
            // Bookings cluster in working hours.
            let day = rng.below(365) as i64;
            let hour = 7 + rng.below(13) as i64;
            let minute = rng.below(60) as i64;
            let booking_date = start + Duration::days(day) + Duration::hours(hour)
                + Duration::minutes(minute);

            let user = rng.below(N_USERS);
            let is_new_customer = seen_users.insert(user);

            let completed = rng.chance(0.8);
            let booking_status = if completed {
                COMPLETED
            } else {
                rng.pick(&OTHER_STATUSES)
            };
            let cancel_reason = (!completed && rng.chance(0.9))
                .then(|| rng.pick(&CANCEL_REASONS).to_string());

            let place_size = rng.pick(&PLACE_SIZES);
            let base = match place_size {
                "S" => 450.0,
                "M" => 650.0,
                "L" => 900.0,
                _ => 1300.0,
            };
            let total_price = (base + rng.next_f64() * 300.0).round();

            SampleBooking {
                booking_id: i as i64,
                province: rng.pick(&PROVINCES).to_string(),
                booking_status: booking_status.to_string(),
                booking_date: booking_date.format("%Y-%m-%d %H:%M:%S").to_string(),
                total_price,
                user_id: format!("U{user:05}"),
                is_new_customer: i64::from(is_new_customer),
                is_new_professional: i64::from(rng.chance(0.05)),
                place_size: place_size.to_string(),
                cancel_reason,
            }
        })
        .collect()
}

fn write_csv(path: &str, bookings: &[SampleBooking]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for b in bookings {
        writer.serialize(b).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &str, bookings: &[SampleBooking]) -> Result<()> {
    let text = |f: fn(&SampleBooking) -> Option<&str>| -> ArrayRef {
        Arc::new(StringArray::from(bookings.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("booking_id", DataType::Int64, false),
        Field::new("province", DataType::Utf8, false),
        Field::new("booking_status", DataType::Utf8, false),
        Field::new("booking_date", DataType::Utf8, false),
        Field::new("total_price", DataType::Float64, false),
        Field::new("user_id", DataType::Utf8, false),
        Field::new("is_new_customer", DataType::Int64, false),
        Field::new("is_new_professional", DataType::Int64, false),
        Field::new("place_size", DataType::Utf8, true),
        Field::new("cancel_reason", DataType::Utf8, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(bookings.iter().map(|b| b.booking_id))),
        text(|b| Some(b.province.as_str())),
        text(|b| Some(b.booking_status.as_str())),
        text(|b| Some(b.booking_date.as_str())),
        Arc::new(Float64Array::from_iter_values(bookings.iter().map(|b| b.total_price))),
        text(|b| Some(b.user_id.as_str())),
        Arc::new(Int64Array::from_iter_values(bookings.iter().map(|b| b.is_new_customer))),
        Arc::new(Int64Array::from_iter_values(bookings.iter().map(|b| b.is_new_professional))),
        text(|b| Some(b.place_size.as_str())),
        text(|b| b.cancel_reason.as_deref()),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let bookings = generate(&mut rng);

    write_csv("booking_raw.csv", &bookings)?;
    write_parquet("booking_raw.parquet", &bookings)?;

    println!(
        "Wrote {} bookings to booking_raw.csv and booking_raw.parquet",
        bookings.len()
    );
    Ok(())
}
