//! Property-based tests for fulltext using proptest.
//!
//! These tests verify invariants that must hold for all possible inputs:
//! option normalization, type filter sanitization, placeholder accounting
//! and the safety of arbitrary query text against a real FTS5 index.

use proptest::prelude::*;

use fulltext::db::store::SearchTable;
use fulltext::search::builder::{parent_condition, sanitize_type_filter};
use fulltext::search::options::{normalize_limit, normalize_offset, ParentFilter};
use fulltext::search::{QueryBuilder, RowSource, SearchMode, SqliteRowSource};
use fulltext::types::{canonical_type_name, is_word, Pagination, SearchableRow};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_mode() -> impl Strategy<Value = SearchMode> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(advanced, and_search, phrase, some_wildcard)| SearchMode {
            advanced,
            and_search,
            phrase,
            some_wildcard,
        },
    )
}

fn arb_type_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z][a-zA-Z0-9_]{0,12}",
        "[a-z_]{1,12}",
        "\\PC{0,16}",
    ]
}

fn count_placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn offset_is_never_negative(offset in proptest::option::of(any::<i64>())) {
        let normalized = normalize_offset(offset);
        match offset {
            Some(o) if o > 0 => prop_assert_eq!(normalized, o as u64),
            _ => prop_assert_eq!(normalized, 0),
        }
    }

    #[test]
    fn limit_is_default_unbounded_or_given(limit in proptest::option::of(any::<i64>()), default in 1u64..1000) {
        let normalized = normalize_limit(limit, default);
        match limit {
            None => prop_assert_eq!(normalized, Some(default)),
            Some(l) if l < 0 => prop_assert_eq!(normalized, Some(default)),
            Some(0) => prop_assert_eq!(normalized, None),
            Some(l) => prop_assert_eq!(normalized, Some(l as u64)),
        }
    }

    #[test]
    fn parent_coercion_never_panics(s in "\\PC{0,24}") {
        let _ = ParentFilter::coerce(&s);
    }

    #[test]
    fn parent_coercion_reads_integers(n in any::<i64>()) {
        prop_assert_eq!(ParentFilter::coerce(&n.to_string()), ParentFilter::One(n));
    }

    #[test]
    fn canonical_names_of_identifiers_stay_identifiers(name in "[a-z][a-z0-9]{0,8}(_[a-z0-9]{1,8}){0,3}") {
        let canonical = canonical_type_name(&name);
        prop_assert!(is_word(&canonical));
        prop_assert!(!canonical.contains('_'));
    }
}

// ---------------------------------------------------------------------------
// Type filter and placeholders
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn sanitized_types_are_words_without_duplicates(names in proptest::collection::vec(arb_type_name(), 0..12)) {
        let filter = sanitize_type_filter(&names);
        for accepted in &filter.accepted {
            prop_assert!(is_word(accepted));
        }
        for rejected in &filter.rejected {
            prop_assert!(!is_word(rejected));
        }
        let mut deduped = filter.accepted.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), filter.accepted.len());
    }

    #[test]
    fn parent_placeholders_match_params(ids in proptest::collection::vec(any::<i64>(), 0..20)) {
        let (sql, params) = parent_condition(&ParentFilter::Many(ids.clone()));
        prop_assert_eq!(count_placeholders(&sql), params.len());
        prop_assert_eq!(params.len(), ids.len());
    }

    #[test]
    fn built_query_placeholders_match_params(
        query in "\\PC{0,40}",
        mode in arb_mode(),
        only in proptest::collection::vec(arb_type_name(), 0..5),
        parents in proptest::collection::vec(any::<i64>(), 0..5),
    ) {
        let builder = QueryBuilder::sqlite("fulltext_rows", mode).unwrap();
        let built = builder.build(&query, &only, Some(&ParentFilter::Many(parents)));
        prop_assert_eq!(count_placeholders(&built.condition), built.condition_params.len());
        prop_assert_eq!(count_placeholders(&built.score), built.score_params.len());
    }

    #[test]
    fn mode_precedence(mode in arb_mode()) {
        use fulltext::search::mode::EffectiveMode;
        let effective = mode.effective();
        if mode.advanced {
            let is_advanced = matches!(effective, EffectiveMode::Advanced { .. });
            prop_assert!(is_advanced);
        } else if mode.phrase {
            prop_assert_eq!(effective, EffectiveMode::Phrase);
        } else {
            prop_assert_eq!(effective, EffectiveMode::Simple);
        }
    }
}

// ---------------------------------------------------------------------------
// Arbitrary text against a real index
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn arbitrary_query_text_never_breaks_fts5(query in "[a-zA-Z0-9 \\x00\\t\"'*+\\-():^.,;]{0,40}", mode in arb_mode()) {
        let table = SearchTable::new(":memory:", "fulltext_rows").unwrap();
        table
            .upsert_rows(&[
                SearchableRow::new("Article", 1, "rust ownership"),
                SearchableRow::new("Comment", 2, "python typing"),
            ])
            .unwrap();
        let built = QueryBuilder::sqlite("fulltext_rows", mode).unwrap().build(&query, &[], None);
        let page = SqliteRowSource::new(&table.conn)
            .fetch(&built, &Pagination::Page { page: 1, per_page: 10 })
            .unwrap();
        prop_assert!(page.rows.len() as u64 <= page.total.unwrap());
        prop_assert_eq!(table.row_count().unwrap(), 2);
    }
}
