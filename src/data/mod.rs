/// Data layer: tables, loading, cleaning, derivation, and filtering.
///
/// Architecture:
/// ```text
///  six .csv / .json / .parquet sources
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  DatasetSource → Table per dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  drop rows missing required values
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  metrics  │  profit/ha, margin, ROI, break-even on the company table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  selector predicates → filtered tables → scalars
///   └──────────┘
/// ```

pub mod clean;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod model;
