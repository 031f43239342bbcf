//! Result assembler: flat ranked rows back into typed, ordered results.
//!
//! Rows arrive in global relevance order but may mix many owner types.
//! Materialization issues exactly one bulk lookup per distinct type and then
//! walks the input rows once more, so the output keeps the global order
//! no matter how each lookup orders its own records.

use std::collections::HashMap;

use crate::error::Result;
use crate::search::registry::{Record, TypeRegistry};
use crate::types::{OwnerRef, SearchRow};

/// Map rows straight to `(type, id)` pairs, preserving order. No lookups.
pub fn to_pairs(rows: &[SearchRow]) -> Vec<OwnerRef> {
    rows.iter().map(OwnerRef::from).collect()
}

/// Requested ids per owner type, types in first-seen order.
pub fn partition_by_type(rows: &[SearchRow]) -> Vec<(&str, Vec<i64>)> {
    let mut order: Vec<(&str, Vec<i64>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let slot = *index.entry(row.owner_type.as_str()).or_insert_with(|| {
            order.push((row.owner_type.as_str(), Vec::new()));
            order.len() - 1
        });
        order[slot].1.push(row.owner_id);
    }
    order
}

/// Load the records behind `rows` and return them in row order.
///
/// Records a lookup does not return (deleted after indexing, say) leave no
/// slot in the output; no placeholder is inserted and no error raised.
/// A row whose type has no registered lookup is an error.
pub fn materialize<R: Record>(rows: &[SearchRow], registry: &TypeRegistry<R>) -> Result<Vec<R>> {
    let requested = partition_by_type(rows);

    let mut fetched: HashMap<&str, HashMap<i64, R>> = HashMap::with_capacity(requested.len());
    for &(owner_type, ref ids) in &requested {
        let records = registry.find_all_by_id(owner_type, ids)?;
        tracing::debug!(
            owner_type,
            requested = ids.len(),
            found = records.len(),
            "loaded search hits"
        );
        let by_id: HashMap<i64, R> = records.into_iter().map(|r| (r.record_id(), r)).collect();
        fetched.insert(owner_type, by_id);
    }

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let record = fetched
            .get_mut(row.owner_type.as_str())
            .and_then(|bucket| bucket.remove(&row.owner_id));
        match record {
            Some(record) => out.push(record),
            None => tracing::debug!(
                owner_type = %row.owner_type,
                owner_id = row.owner_id,
                "indexed record no longer exists, skipping"
            ),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Hit {
        kind: &'static str,
        id: i64,
    }

    impl Record for Hit {
        fn record_id(&self) -> i64 {
            self.id
        }
    }

    fn row(owner_type: &str, owner_id: i64) -> SearchRow {
        SearchRow {
            owner_type: owner_type.to_string(),
            owner_id,
            relevancy: 1.0,
        }
    }

    fn hit(kind: &'static str, id: i64) -> Hit {
        Hit { kind, id }
    }

    /// Registry whose lookups return only `existing` ids, reversed, and
    /// count how often they are called.
    fn registry(existing: &[(&'static str, Vec<i64>)], calls: Arc<AtomicUsize>) -> TypeRegistry<Hit> {
        let mut registry = TypeRegistry::new();
        for (kind, ids) in existing {
            let kind: &'static str = *kind;
            let ids = ids.clone();
            let calls = Arc::clone(&calls);
            registry
                .register(kind, move |wanted: &[i64]| -> std::result::Result<Vec<Hit>, BoxError> {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let mut found: Vec<Hit> = wanted
                        .iter()
                        .filter(|id| ids.contains(id))
                        .map(|&id| hit(kind, id))
                        .collect();
                    found.reverse();
                    Ok(found)
                })
                .unwrap();
        }
        registry
    }

    #[test]
    fn preserves_global_order_across_types() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reg = registry(&[("A", vec![1, 3]), ("B", vec![2])], Arc::clone(&calls));
        let rows = vec![row("A", 1), row("B", 2), row("A", 3)];

        let out = materialize(&rows, &reg).unwrap();
        assert_eq!(out, vec![hit("A", 1), hit("B", 2), hit("A", 3)]);
        assert_eq!(calls.load(Ordering::SeqCst), 2, "one lookup per type");
    }

    #[test]
    fn missing_record_leaves_no_placeholder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reg = registry(&[("A", vec![1]), ("B", vec![2])], calls);
        let rows = vec![row("A", 1), row("B", 2), row("A", 3)];

        let out = materialize(&rows, &reg).unwrap();
        assert_eq!(out, vec![hit("A", 1), hit("B", 2)]);
    }

    #[test]
    fn missing_record_mid_sequence_does_not_shift_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reg = registry(&[("A", vec![1, 5]), ("B", vec![2])], calls);
        let rows = vec![row("A", 1), row("A", 3), row("B", 2), row("A", 5)];

        let out = materialize(&rows, &reg).unwrap();
        assert_eq!(out, vec![hit("A", 1), hit("B", 2), hit("A", 5)]);
    }

    #[test]
    fn pairs_need_no_lookups() {
        let rows = vec![row("A", 1), row("B", 2), row("A", 3)];
        assert_eq!(
            to_pairs(&rows),
            vec![
                OwnerRef::new("A", 1),
                OwnerRef::new("B", 2),
                OwnerRef::new("A", 3)
            ]
        );
    }

    #[test]
    fn partition_keeps_first_seen_type_order_and_duplicates() {
        let rows = vec![row("B", 9), row("A", 1), row("B", 4), row("B", 9)];
        let parts = partition_by_type(&rows);
        assert_eq!(parts, vec![("B", vec![9, 4, 9]), ("A", vec![1])]);
    }

    #[test]
    fn unregistered_type_propagates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reg = registry(&[("A", vec![1])], calls);
        let rows = vec![row("A", 1), row("Ghost", 2)];
        assert!(materialize(&rows, &reg).is_err());
    }

    #[test]
    fn empty_rows_make_no_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reg = registry(&[("A", vec![1])], Arc::clone(&calls));
        assert!(materialize(&[], &reg).unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
