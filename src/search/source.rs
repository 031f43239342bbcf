//! Row sources: execute a built query under one pagination strategy.
//!
//! A [`RowSource`] is the injected pagination capability. Given a query and
//! either a limit/offset window or a page number and size, it returns the
//! ranked rows plus the total match count when paging.

use rusqlite::{params_from_iter, Connection};

use crate::error::{FulltextError, Result};
use crate::search::builder::BuiltQuery;
use crate::search::dialect::{Dialect, Sqlite};
use crate::types::{Pagination, SearchRow};

/// Rows for one call, in relevance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPage {
    pub rows: Vec<SearchRow>,
    /// Total matching rows; present for page-based fetches.
    pub total: Option<u64>,
}

/// Executes built queries.
///
/// A page-based fetch must report `total`; searches fail without it.
pub trait RowSource {
    fn fetch(&self, query: &BuiltQuery, pagination: &Pagination) -> Result<RowPage>;
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// Runs queries built with the [`Sqlite`] dialect on a rusqlite connection.
pub struct SqliteRowSource<'a> {
    conn: &'a Connection,
}

impl std::fmt::Debug for SqliteRowSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRowSource").finish_non_exhaustive()
    }
}

impl<'a> SqliteRowSource<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn count(&self, query: &BuiltQuery) -> Result<u64> {
        let mut stmt = self.conn.prepare_cached(&query.count_sql())?;
        let total: i64 = stmt.query_row(params_from_iter(query.condition_params.iter()), |row| {
            row.get(0)
        })?;
        Ok(total.max(0) as u64)
    }
}

impl RowSource for SqliteRowSource<'_> {
    fn fetch(&self, query: &BuiltQuery, pagination: &Pagination) -> Result<RowPage> {
        if query.dialect != Sqlite.name() {
            return Err(FulltextError::Config(format!(
                "query was built for {}, not sqlite",
                query.dialect
            )));
        }

        // FTS5 has no "match nothing" syntax; answer empty expressions here.
        if query.matches_nothing() {
            return Ok(RowPage {
                rows: Vec::new(),
                total: pagination.is_paged().then_some(0),
            });
        }

        let (limit, offset) = pagination.limit_offset();
        let (limit_sql, limit_params) = Sqlite.limit_clause(limit, offset);
        let sql = format!("{} {}", query.select_sql(), limit_sql);
        let mut params = query.params();
        params.extend(limit_params);

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            Ok(SearchRow {
                owner_type: row.get(0)?,
                owner_id: row.get(1)?,
                relevancy: row.get(2)?,
            })
        })?;
        let rows = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        let total = if pagination.is_paged() {
            Some(self.count(query)?)
        } else {
            None
        };

        tracing::debug!(rows = rows.len(), ?total, "fetched search rows");
        Ok(RowPage { rows, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::initialize_database;
    use crate::db::store::SearchTable;
    use crate::search::builder::QueryBuilder;
    use crate::search::dialect::MySql;
    use crate::search::mode::SearchMode;
    use crate::search::options::ParentFilter;
    use crate::types::SearchableRow;
    use test_case::test_case;

    const TABLE: &str = "fulltext_rows";

    fn setup(rows: &[SearchableRow]) -> SearchTable {
        let conn = initialize_database(":memory:", TABLE).expect("schema init should succeed");
        let table = SearchTable::from_connection(conn, TABLE).unwrap();
        table.upsert_rows(rows).unwrap();
        table
    }

    fn window(limit: Option<u64>, offset: u64) -> Pagination {
        Pagination::Window { limit, offset }
    }

    fn ids(page: &RowPage) -> Vec<(String, i64)> {
        page.rows
            .iter()
            .map(|r| (r.owner_type.clone(), r.owner_id))
            .collect()
    }

    fn corpus() -> Vec<SearchableRow> {
        vec![
            SearchableRow::new("Article", 1, "rust ownership and borrowing").with_parent(10),
            SearchableRow::new("Article", 2, "python packaging").with_parent(10),
            SearchableRow::new("Comment", 3, "rustaceans love rust rust rust").with_parent(20),
            SearchableRow::new("Comment", 4, "unrelated chatter").with_parent(20),
            SearchableRow::new("Page", 5, "rusty nails and hammers"),
        ]
    }

    #[test]
    fn simple_search_matches_prefixes() {
        let table = setup(&corpus());
        let q = QueryBuilder::sqlite(TABLE, SearchMode::default())
            .unwrap()
            .build("rust", &[], None);
        let page = SqliteRowSource::new(&table.conn)
            .fetch(&q, &window(None, 0))
            .unwrap();
        let mut found = ids(&page);
        found.sort();
        assert_eq!(
            found,
            vec![
                ("Article".to_string(), 1),
                ("Comment".to_string(), 3),
                ("Page".to_string(), 5)
            ]
        );
        assert!(page.total.is_none());
        assert!(page.rows.iter().all(|r| r.relevancy > 0.0));
    }

    #[test]
    fn results_are_ordered_by_relevance() {
        let table = setup(&corpus());
        let q = QueryBuilder::sqlite(TABLE, SearchMode::default())
            .unwrap()
            .build("rust", &[], None);
        let page = SqliteRowSource::new(&table.conn)
            .fetch(&q, &window(None, 0))
            .unwrap();
        let scores: Vec<f64> = page.rows.iter().map(|r| r.relevancy).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
    }

    #[test]
    fn limit_and_offset_window_rows() {
        let table = setup(&corpus());
        let q = QueryBuilder::sqlite(TABLE, SearchMode::default())
            .unwrap()
            .build("rust", &[], None);
        let source = SqliteRowSource::new(&table.conn);
        let all = source.fetch(&q, &window(None, 0)).unwrap();
        let second = source.fetch(&q, &window(Some(1), 1)).unwrap();
        assert_eq!(second.rows.len(), 1);
        assert_eq!(second.rows[0], all.rows[1]);
    }

    #[test]
    fn page_fetch_reports_total() {
        let table = setup(&corpus());
        let q = QueryBuilder::sqlite(TABLE, SearchMode::default())
            .unwrap()
            .build("rust", &[], None);
        let page = SqliteRowSource::new(&table.conn)
            .fetch(
                &q,
                &Pagination::Page {
                    page: 2,
                    per_page: 2,
                },
            )
            .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.total, Some(3));
    }

    #[test]
    fn type_and_parent_filters_apply() {
        let table = setup(&corpus());
        let builder = QueryBuilder::sqlite(TABLE, SearchMode::default()).unwrap();
        let source = SqliteRowSource::new(&table.conn);

        let q = builder.build("rust", &["Comment".to_string()], None);
        assert_eq!(
            ids(&source.fetch(&q, &window(None, 0)).unwrap()),
            vec![("Comment".to_string(), 3)]
        );

        let q = builder.build("rust", &[], Some(&ParentFilter::One(10)));
        assert_eq!(
            ids(&source.fetch(&q, &window(None, 0)).unwrap()),
            vec![("Article".to_string(), 1)]
        );

        let q = builder.build("rust", &[], Some(&ParentFilter::Many(vec![10, 20])));
        assert_eq!(source.fetch(&q, &window(None, 0)).unwrap().rows.len(), 2);
    }

    #[test]
    fn phrase_mode_requires_adjacent_words() {
        let table = setup(&corpus());
        let builder = QueryBuilder::sqlite(TABLE, SearchMode::default().use_phrase_search()).unwrap();
        let source = SqliteRowSource::new(&table.conn);

        let hit = builder.build("ownership and borrowing", &[], None);
        assert_eq!(
            ids(&source.fetch(&hit, &window(None, 0)).unwrap()),
            vec![("Article".to_string(), 1)]
        );
        let miss = builder.build("borrowing ownership", &[], None);
        assert!(source.fetch(&miss, &window(None, 0)).unwrap().rows.is_empty());
    }

    #[test]
    fn advanced_and_requires_every_word() {
        let table = setup(&corpus());
        let mode = SearchMode::default().use_advanced_search().use_and_search();
        let builder = QueryBuilder::sqlite(TABLE, mode).unwrap();
        let q = builder.build("rust borrow", &[], None);
        let page = SqliteRowSource::new(&table.conn)
            .fetch(&q, &window(None, 0))
            .unwrap();
        assert_eq!(ids(&page), vec![("Article".to_string(), 1)]);
    }

    #[test]
    fn advanced_or_ranks_full_matches_first() {
        let table = setup(&corpus());
        let builder = QueryBuilder::sqlite(TABLE, SearchMode::default().use_advanced_search()).unwrap();
        let q = builder.build("rust borrowing", &[], None);
        let page = SqliteRowSource::new(&table.conn)
            .fetch(&q, &window(None, 0))
            .unwrap();
        assert_eq!(page.rows[0].owner_id, 1);
        assert_eq!(page.rows.len(), 2);
    }

    #[test]
    fn empty_query_returns_nothing() {
        let table = setup(&corpus());
        let q = QueryBuilder::sqlite(TABLE, SearchMode::default())
            .unwrap()
            .build("   ", &[], None);
        let page = SqliteRowSource::new(&table.conn)
            .fetch(
                &q,
                &Pagination::Page {
                    page: 1,
                    per_page: 10,
                },
            )
            .unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total, Some(0));
    }

    #[test_case(SearchMode::default() ; "simple")]
    #[test_case(SearchMode::default().use_phrase_search() ; "phrase")]
    #[test_case(SearchMode::default().use_advanced_search() ; "advanced or")]
    #[test_case(SearchMode::default().use_advanced_search().use_and_search() ; "advanced and")]
    fn nul_in_query_is_a_separator(mode: SearchMode) {
        let table = setup(&corpus());
        let q = QueryBuilder::sqlite(TABLE, mode)
            .unwrap()
            .build("rust\0ownership", &[], None);
        let page = SqliteRowSource::new(&table.conn)
            .fetch(&q, &window(None, 0))
            .unwrap();
        assert!(ids(&page).contains(&("Article".to_string(), 1)));
    }

    #[test]
    fn operator_characters_are_treated_as_text() {
        let table = setup(&corpus());
        let q = QueryBuilder::sqlite(TABLE, SearchMode::default())
            .unwrap()
            .build("rust\" OR NOT (python", &[], None);
        assert!(SqliteRowSource::new(&table.conn)
            .fetch(&q, &window(None, 0))
            .is_ok());
    }

    #[test]
    fn refuses_queries_for_other_dialects() {
        let table = setup(&[]);
        let q = QueryBuilder::new(TABLE, SearchMode::default(), Box::new(MySql))
            .unwrap()
            .build("rust", &[], None);
        let err = SqliteRowSource::new(&table.conn)
            .fetch(&q, &window(None, 0))
            .unwrap_err();
        assert!(matches!(err, FulltextError::Config(_)));
    }
}
