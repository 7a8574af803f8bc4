/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset  (memoized by cache)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Record>, label sets, date span
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec predicates → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  KPIs + grouped revenue
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;

pub use aggregate::{
    compute_kpis, group_by_category, group_by_date, group_by_region, summarize,
    DashboardSummary, GroupedSummary, KpiSummary,
};
pub use cache::DatasetCache;
pub use error::{LoadError, ParseError};
pub use filter::{filter, FilterSpec, FilteredView};
pub use loader::{load_csv_reader, load_file, LoadOptions};
pub use model::{DateRange, Dataset, LoadReport, Record};
