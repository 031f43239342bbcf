//! Polymorphic full-text search.
//!
//! The pipeline runs in four steps:
//!
//! 1. [`builder`] rewrites the query text for the configured [`mode`] and
//!    renders a parameterized SQL query through a [`dialect`].
//! 2. A [`source::RowSource`] executes it under one pagination strategy.
//! 3. [`assembler`] turns ranked `(type, id)` rows into records through the
//!    [`registry`], or returns the pairs as they are.
//! 4. [`engine::FulltextSearch`] wires the steps together behind a single
//!    `search` call driven by [`options::SearchOptions`].

pub mod assembler;
pub mod builder;
pub mod dialect;
pub mod engine;
pub mod mode;
pub mod options;
pub mod registry;
pub mod source;

pub use builder::{BuiltQuery, QueryBuilder};
pub use dialect::{Dialect, DialectKind};
pub use engine::{FulltextSearch, Hits, SearchOutcome};
pub use mode::SearchMode;
pub use options::{ParentFilter, SearchOptions};
pub use registry::{Record, RecordLookup, TypeRegistry};
pub use source::{RowPage, RowSource, SqliteRowSource};
