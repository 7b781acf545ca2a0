/// Data layer: core types, loading, caching and filtering.
///
/// Architecture:
/// ```text
///   .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → CustomerTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  Arc<CustomerTable>, reloaded on mtime change
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  dimension selections → WorkingSet
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
