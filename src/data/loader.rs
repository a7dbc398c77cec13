use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Booking, BookingTable, REQUIRED_COLUMNS};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a bookings table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the booking columns (recommended)
/// * `.parquet` – one column per booking field
/// * `.json`    – `[{ "province": ..., "booking_status": ..., ... }, ...]`
pub fn load_file(path: &Path) -> Result<BookingTable, DashboardError> {
    let rows = read_bookings(path).map_err(|e| DashboardError::data_source(path, &e))?;
    log::info!("Loaded {} bookings from {}", rows.len(), path.display());
    Ok(BookingTable::from_rows(rows))
}

fn read_bookings(path: &Path) -> Result<Vec<Booking>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with at least the nine booking columns, in any
/// order.  Extra columns are ignored.
fn load_csv(path: &Path) -> Result<Vec<Booking>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut index = HashMap::new();
    for col in REQUIRED_COLUMNS {
        let pos = headers
            .iter()
            .position(|h| h == col)
            .with_context(|| format!("CSV missing required column '{col}'"))?;
        index.insert(col, pos);
    }

    let mut bookings = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let booking = Booking::from_cells(|col| {
            index
                .get(col)
                .and_then(|&i| record.get(i))
                .map(str::to_string)
        })
        .with_context(|| format!("CSV row {row_no}"))?;
        bookings.push(booking);
    }

    Ok(bookings)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// Optional columns may be `null` but every key must be present.
fn load_json(path: &Path) -> Result<Vec<Booking>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut bookings = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !obj.contains_key(**c)) {
            bail!("Row {i}: missing required column '{missing}'");
        }

        let booking = Booking::from_cells(|col| obj.get(col).and_then(json_to_text))
            .with_context(|| format!("Row {i}"))?;
        bookings.push(booking);
    }

    Ok(bookings)
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per booking field.
///
/// Column types are flexible: strings, integers, floats, booleans and
/// timestamps are all rendered to text and validated like CSV cells, so
/// files written by both **Pandas** and **Polars** work.
fn load_parquet(path: &Path) -> Result<Vec<Booking>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    // A zero-row file yields no batches, so validate the file schema.
    let schema = builder.schema().clone();
    let mut index = HashMap::new();
    for col in REQUIRED_COLUMNS {
        let idx = schema
            .index_of(col)
            .map_err(|_| anyhow::anyhow!("Parquet file missing required column '{col}'"))?;
        index.insert(col, idx);
    }

    let reader = builder.build().context("building parquet reader")?;
    let mut bookings = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let row_no = bookings.len();
            let booking = Booking::from_cells(|col| {
                index
                    .get(col)
                    .and_then(|&i| cell_text(batch.column(i), row))
            })
            .with_context(|| format!("Parquet row {row_no}"))?;
            bookings.push(booking);
        }
    }

    Ok(bookings)
}

/// Render one Arrow cell as text, `None` for null.
fn cell_text(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|s| s.value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => array_value_to_string(col.as_ref(), row).ok(),
    }
}
