//! fulltext: polymorphic full-text search over one shared table.
//!
//! Records of many types contribute one searchable row each to a shared
//! table. Searches rank those rows by relevance and hand back either the
//! loaded records, in rank order, or their `(type, id)` pairs.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod observability;
pub mod search;
pub mod types;
