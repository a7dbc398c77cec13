/// Data layer: booking schema, loading, caching, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → BookingTable (schema checked once)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  Arc<BookingTable> per path, reused while mtime unchanged
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec → new filtered BookingTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  KpiSet + grouped summaries
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
