//! SQLite storage: schema and the write side of the searchable table.

pub mod schema;
pub mod store;
