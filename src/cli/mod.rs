//! Command-line interface for the `fulltext` binary.
//!
//! Maintains a searchable table in a SQLite file and runs searches against
//! it. Output goes to the supplied writer as JSON; logs go to stderr.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use clap::{Args, Parser, Subcommand};
use serde_json::json;

use crate::config::FulltextConfig;
use crate::db::store::SearchTable;
use crate::error::{BoxError, FulltextError, Result};
use crate::search::builder::BuiltQuery;
use crate::search::dialect::DialectKind;
use crate::search::engine::FulltextSearch;
use crate::search::options::{ParentFilter, SearchOptions};
use crate::search::registry::TypeRegistry;
use crate::search::source::{RowPage, RowSource, SqliteRowSource};
use crate::types::{canonical_type_name, is_word, Pagination, SearchableRow};

// ============================================================================
// CLI argument types
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fulltext", version, about = "Polymorphic full-text search over one SQLite table", long_about = None)]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, default_value = "fulltext.db", env = "FULLTEXT_DB")]
    pub db: String,

    /// Path to a YAML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the searchable table and its full-text index.
    Init,

    /// Add or refresh the searchable row of one record.
    Index {
        owner_type: String,
        owner_id: i64,
        /// Indexable text for the record.
        text: String,
        /// Parent record id.
        #[arg(long)]
        parent: Option<i64>,
    },

    /// Remove the searchable row of one record.
    Remove { owner_type: String, owner_id: i64 },

    /// Search the table.
    Search(SearchArgs),
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    pub query: String,

    /// Maximum results; 0 for no limit.
    #[arg(long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub offset: Option<i64>,

    /// Page number; overrides --limit and --offset.
    #[arg(long, allow_negative_numbers = true)]
    pub page: Option<i64>,

    #[arg(long)]
    pub per_page: Option<u64>,

    /// Restrict to an owner type (repeatable).
    #[arg(long)]
    pub only: Vec<String>,

    /// Restrict to a parent id (repeatable).
    #[arg(long)]
    pub parent: Vec<i64>,

    /// Weighted exact/prefix scoring.
    #[arg(long)]
    pub advanced: bool,

    /// Require every word (with --advanced).
    #[arg(long = "and")]
    pub and_search: bool,

    /// Match the query as one phrase.
    #[arg(long)]
    pub phrase: bool,

    /// Print stored rows instead of (type, id) pairs.
    #[arg(long)]
    pub rows: bool,
}

// ============================================================================
// Dispatch
// ============================================================================

/// Resolve configuration: the YAML file when given, else defaults, then
/// environment overrides.
pub fn load_config(path: Option<&str>) -> Result<FulltextConfig> {
    match path {
        Some(path) => FulltextConfig::load(path),
        None => {
            let mut config = FulltextConfig::default();
            config.apply_env()?;
            Ok(config)
        }
    }
}

/// Execute one parsed command, writing its result to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Init => {
            let table = SearchTable::new(&cli.db, &config.table_name)?;
            tracing::info!(db = %cli.db, table = table.table(), "initialized");
            writeln!(out, "{}", json!({ "db": cli.db, "table": table.table() }))?;
        }
        Command::Index {
            owner_type,
            owner_id,
            text,
            parent,
        } => {
            let owner_type = owner_type_arg(&owner_type)?;
            let table = SearchTable::new(&cli.db, &config.table_name)?;
            let mut row = SearchableRow::new(owner_type, owner_id, text);
            row.parent_id = parent;
            table.upsert_row(&row)?;
            tracing::info!(owner_type = %row.owner_type, owner_id, "indexed");
            writeln!(out, "{}", serde_json::to_string(&row)?)?;
        }
        Command::Remove {
            owner_type,
            owner_id,
        } => {
            let owner_type = owner_type_arg(&owner_type)?;
            let table = SearchTable::new(&cli.db, &config.table_name)?;
            let removed = table.remove_row(&owner_type, owner_id)?;
            tracing::info!(%owner_type, owner_id, removed, "remove");
            writeln!(out, "{}", json!({ "removed": removed }))?;
        }
        Command::Search(args) => search(&cli.db, config, args, out)?,
    }
    Ok(())
}

fn owner_type_arg(raw: &str) -> Result<String> {
    let owner_type = canonical_type_name(raw);
    if !is_word(&owner_type) {
        return Err(FulltextError::InvalidTypeName(raw.to_string()));
    }
    Ok(owner_type)
}

fn parent_filter(ids: &[i64]) -> Option<ParentFilter> {
    match ids {
        [] => None,
        [one] => Some(ParentFilter::One(*one)),
        many => Some(ParentFilter::Many(many.to_vec())),
    }
}

fn search(db: &str, mut config: FulltextConfig, args: SearchArgs, out: &mut dyn Write) -> Result<()> {
    if config.dialect != DialectKind::Sqlite {
        return Err(FulltextError::Config(
            "the command line only searches SQLite databases".to_string(),
        ));
    }
    config.mode.advanced |= args.advanced;
    config.mode.and_search |= args.and_search;
    config.mode.phrase |= args.phrase;
    if let Some(per_page) = args.per_page {
        config.default_per_page = per_page.max(1);
    }

    let table = SharedTable::open(db, &config.table_name)?;
    let registry = if args.rows {
        row_registry(&table)?
    } else {
        TypeRegistry::new()
    };
    let engine = FulltextSearch::from_config(&config, table, registry)?;

    let options = SearchOptions {
        limit: args.limit,
        offset: args.offset,
        page: args.page,
        materialize: args.rows,
        only: args.only,
        parent: parent_filter(&args.parent),
        search_class: None,
    };
    let outcome = engine.search(&args.query, &options)?;
    tracing::info!(query = %args.query, hits = outcome.hits.len(), "search");
    writeln!(out, "{}", serde_json::to_string_pretty(&outcome)?)?;
    Ok(())
}

/// One open table shared by the row source and the row lookups.
#[derive(Debug, Clone)]
struct SharedTable(Arc<Mutex<SearchTable>>);

impl SharedTable {
    fn open(db: &str, table_name: &str) -> Result<Self> {
        Ok(Self::from_table(SearchTable::new(db, table_name)?))
    }

    fn from_table(table: SearchTable) -> Self {
        Self(Arc::new(Mutex::new(table)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, SearchTable>> {
        self.0
            .lock()
            .map_err(|_| FulltextError::Config("search table lock poisoned".to_string()))
    }
}

impl RowSource for SharedTable {
    fn fetch(&self, query: &BuiltQuery, pagination: &Pagination) -> Result<RowPage> {
        let table = self.lock()?;
        SqliteRowSource::new(&table.conn).fetch(query, pagination)
    }
}

/// A registry that loads stored rows back from the shared table, one
/// lookup per owner type currently present.
fn row_registry(table: &SharedTable) -> Result<TypeRegistry<SearchableRow>> {
    let mut registry = TypeRegistry::new();
    let owner_types = table.lock()?.owner_types()?;
    for owner_type in owner_types {
        let shared = table.clone();
        let kind = owner_type.clone();
        registry.register(&owner_type, move |ids: &[i64]| -> std::result::Result<Vec<SearchableRow>, BoxError> {
            Ok(shared.lock()?.get_rows(&kind, ids)?)
        })?;
    }
    Ok(registry)
}

// ============================================================================
// Tests
// ============================================================================
