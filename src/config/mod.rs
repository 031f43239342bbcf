//! YAML configuration with environment overrides.

pub mod schema;

pub use schema::FulltextConfig;
