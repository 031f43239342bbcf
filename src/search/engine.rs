//! The public search entry point.
//!
//! [`FulltextSearch`] ties the pipeline together: normalize options, build
//! the query, fetch rows through the injected [`RowSource`], then either
//! materialize records through the [`TypeRegistry`] or return bare pairs.

use serde::Serialize;

use crate::config::schema::FulltextConfig;
use crate::error::{FulltextError, Result};
use crate::search::assembler::{materialize, to_pairs};
use crate::search::builder::QueryBuilder;
use crate::search::options::{SearchOptions, DEFAULT_LIMIT, DEFAULT_PER_PAGE};
use crate::search::registry::{Record, TypeRegistry};
use crate::search::source::RowSource;
use crate::types::{canonical_type_name, OwnerRef, PageInfo, Pagination};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Search hits, either loaded records or `(type, id)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Hits<R> {
    Records(Vec<R>),
    Pairs(Vec<OwnerRef>),
}

impl<R> Hits<R> {
    pub fn len(&self) -> usize {
        match self {
            Hits::Records(records) => records.len(),
            Hits::Pairs(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Option<&[R]> {
        match self {
            Hits::Records(records) => Some(records),
            Hits::Pairs(_) => None,
        }
    }

    pub fn pairs(&self) -> Option<&[OwnerRef]> {
        match self {
            Hits::Pairs(pairs) => Some(pairs),
            Hits::Records(_) => None,
        }
    }
}

/// Hits plus pagination metadata when the call was page-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome<R> {
    pub hits: Hits<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageInfo>,
    /// Type filter entries dropped because they were not plain identifiers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected_types: Vec<String>,
}

// ---------------------------------------------------------------------------
// FulltextSearch
// ---------------------------------------------------------------------------

/// Search facade over one table, one mode, one row source and one registry.
pub struct FulltextSearch<R, S> {
    builder: QueryBuilder,
    source: S,
    registry: TypeRegistry<R>,
    default_limit: u64,
    default_per_page: u64,
}

impl<R, S: std::fmt::Debug> std::fmt::Debug for FulltextSearch<R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulltextSearch")
            .field("builder", &self.builder)
            .field("source", &self.source)
            .field("registry", &self.registry)
            .field("default_limit", &self.default_limit)
            .field("default_per_page", &self.default_per_page)
            .finish()
    }
}

impl<R, S: RowSource> FulltextSearch<R, S> {
    pub fn new(builder: QueryBuilder, source: S, registry: TypeRegistry<R>) -> Self {
        Self {
            builder,
            source,
            registry,
            default_limit: DEFAULT_LIMIT,
            default_per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Build the query builder and defaults from configuration.
    pub fn from_config(config: &FulltextConfig, source: S, registry: TypeRegistry<R>) -> Result<Self> {
        let builder = QueryBuilder::new(&config.table_name, config.mode, config.dialect.build())?;
        Ok(Self::new(builder, source, registry).with_defaults(config.default_limit, config.default_per_page))
    }

    /// Override the default limit and page size.
    pub fn with_defaults(mut self, default_limit: u64, default_per_page: u64) -> Self {
        self.default_limit = default_limit;
        self.default_per_page = default_per_page;
        self
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn registry(&self) -> &TypeRegistry<R> {
        &self.registry
    }

    /// Page size for a page-based search: the `search_class` type's
    /// registered size, else the configured default.
    fn per_page_for(&self, options: &SearchOptions) -> u64 {
        options
            .search_class
            .as_deref()
            .and_then(|class| self.registry.per_page(&canonical_type_name(class)))
            .unwrap_or(self.default_per_page)
    }

    /// Run a full-text search.
    ///
    /// Database errors propagate unmodified; everything else about the
    /// options is normalized rather than rejected.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchOutcome<R>>
    where
        R: Record,
    {
        let pagination = options.pagination(self.default_limit, self.per_page_for(options));
        let only = options.type_names();
        let built = self.builder.build(query, &only, options.parent.as_ref());

        let fetched = self.source.fetch(&built, &pagination)?;

        let page = match pagination {
            Pagination::Page { page, per_page } => Some(PageInfo {
                page,
                per_page,
                total_entries: fetched.total.ok_or_else(|| {
                    FulltextError::Config("row source returned no total for a paged fetch".to_string())
                })?,
            }),
            Pagination::Window { .. } => None,
        };

        let hits = if options.materialize {
            Hits::Records(materialize(&fetched.rows, &self.registry)?)
        } else {
            Hits::Pairs(to_pairs(&fetched.rows))
        };

        tracing::debug!(
            query,
            rows = fetched.rows.len(),
            hits = hits.len(),
            paged = page.is_some(),
            "search complete"
        );

        Ok(SearchOutcome {
            hits,
            page,
            rejected_types: built.rejected_types,
        })
    }
}
