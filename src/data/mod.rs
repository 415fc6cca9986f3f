/// Data layer: core types, table I/O and the categorical transforms.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ObsTable (+ color sidecar)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ ObsTable  │  Index, named Series (categorical or plain)
///   └──────────┘
///        │
///        ├──► merge    update one categorical column with another
///        ├──► mapping  rename query categories after a reference
///        └──► filter   keep / combine categories by key groups
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  ObsTable → .csv / .json
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod mapping;
pub mod merge;
pub mod model;
pub mod writer;
