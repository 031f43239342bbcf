//! Error type shared by every layer of the crate.

use thiserror::Error;

/// Boxed error returned by application-provided record lookups.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum FulltextError {
    /// Database failures (bad match syntax, connection problems) propagate unmodified.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// A registered record lookup failed.
    #[error("lookup for {owner_type} failed: {source}")]
    Lookup {
        owner_type: String,
        #[source]
        source: BoxError,
    },

    /// A search row names a type that has no lookup in the registry.
    #[error("no record lookup registered for type {0}")]
    UnregisteredType(String),

    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("invalid type name: {0:?}")]
    InvalidTypeName(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, FulltextError>;
